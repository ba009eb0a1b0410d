//! Module: query
//! Responsibility: lazy reads over primary keys, index entries, ledger-native
//! queries and per-key history.
//! Does not own: buffering. Callers decide how much of a sequence to pull.
//! Boundary: every sequence owns its ledger cursor through a guard that
//! closes it on exhaustion, error or drop.

mod cursor;
mod history;
mod scan;
#[cfg(test)]
mod tests;

pub use history::{HistoryEntry, HistoryScan};
pub use scan::{FreeQuery, IndexScan, RecordScan};

use crate::{
    db::{Db, key::prefix_bounds, ledger::Ledger, query::cursor::CursorGuard},
    error::{ErrorOrigin, InternalError},
    model::record::Record,
    obs::sink::{OpKind, Span},
};
use std::marker::PhantomData;

///
/// Query
///
/// Read entrypoints for one record type. Obtained from [`Db::query`], which
/// replays any pending commit first.
///

pub struct Query<'a, L: Ledger, R: Record> {
    db: &'a Db<L>,
    _marker: PhantomData<R>,
}

impl<'a, L: Ledger, R: Record> Query<'a, L, R> {
    pub(crate) const fn new(db: &'a Db<L>) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn ledger(&self) -> &'a L {
        &self.db.ledger
    }

    /// Every record in ascending key order.
    pub fn scan_all(&self) -> Result<RecordScan<'a, R>, InternalError> {
        self.scan_range("", "")
    }

    /// Records with keys in `[start, end)`; an empty bound is open.
    pub fn scan_range(&self, start: &str, end: &str) -> Result<RecordScan<'a, R>, InternalError> {
        let span = Span::new(OpKind::Scan, R::PATH);
        let cursor = self.db.ledger.state_by_range(start, end)?;

        Ok(RecordScan::new(CursorGuard::new(cursor), span))
    }

    /// Records whose index entries under `index_name` start with `prefix`.
    ///
    /// `index_name` may be a query name (`AssetType`), the physical index
    /// name (`DemoAsset~Type`) or the attribute an index reads (`type`) when
    /// only one index reads it.
    pub fn scan_by_index<S: AsRef<str>>(
        &self,
        index_name: &str,
        prefix: &[S],
    ) -> Result<IndexScan<'a, L, R>, InternalError> {
        let Some(decl) = self.db.indexes.resolve(index_name) else {
            return Err(InternalError::validation(
                ErrorOrigin::Query,
                format!("no index declared as '{index_name}'"),
            ));
        };

        let (start, _) = prefix_bounds(&decl.index, prefix)?;
        let span = Span::new(OpKind::IndexScan, R::PATH);
        let ledger = &self.db.ledger;
        let cursor = ledger.state_by_partial_composite_key(&start)?;

        Ok(IndexScan::new(ledger, CursorGuard::new(cursor), span))
    }

    /// Run a ledger-native query expression; rows come back with their keys
    /// as the ledger returned them, payloads decoded as `R`.
    pub fn free_query(&self, expression: &str) -> Result<FreeQuery<'a, R>, InternalError> {
        let span = Span::new(OpKind::FreeQuery, R::PATH);
        let cursor = self.db.ledger.query_result(expression)?;

        Ok(FreeQuery::new(CursorGuard::new(cursor), span))
    }

    /// Change log of one record id.
    pub fn history(&self, id: &str) -> Result<HistoryScan<'a>, InternalError> {
        let span = Span::new(OpKind::History, R::PATH);
        let cursor = self.db.ledger.history_for_key(id)?;

        Ok(HistoryScan::new(CursorGuard::new(cursor), span))
    }
}
