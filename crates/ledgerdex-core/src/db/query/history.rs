use crate::{
    db::{
        ledger::{KeyModification, LedgerTimestamp},
        query::cursor::CursorGuard,
    },
    error::InternalError,
    model::record::Record,
    obs::sink::Span,
    serialize::deserialize,
};
use std::iter::FusedIterator;

///
/// HistoryEntry
///
/// One change to a record id as the ledger reports it. Deletions carry no
/// value and have `is_delete` set.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HistoryEntry {
    pub tx_id: String,
    pub value: Option<Vec<u8>>,
    pub timestamp: LedgerTimestamp,
    pub is_delete: bool,
}

impl HistoryEntry {
    /// Decode the snapshot written by this change; `None` for a tombstone.
    pub fn record<R: Record>(&self) -> Result<Option<R>, InternalError> {
        match &self.value {
            Some(bytes) => Ok(Some(deserialize(bytes)?)),
            None => Ok(None),
        }
    }
}

impl From<KeyModification> for HistoryEntry {
    fn from(modification: KeyModification) -> Self {
        let value = (!modification.is_delete).then_some(modification.value);

        Self {
            tx_id: modification.tx_id,
            value,
            timestamp: modification.timestamp,
            is_delete: modification.is_delete,
        }
    }
}

///
/// HistoryScan
///
/// Lazy change log of one key, in ledger order.
///

pub struct HistoryScan<'a> {
    cursor: CursorGuard<'a, KeyModification>,
    span: Span,
}

impl<'a> HistoryScan<'a> {
    pub(crate) const fn new(cursor: CursorGuard<'a, KeyModification>, span: Span) -> Self {
        Self { cursor, span }
    }

    pub fn close(&mut self) -> Result<(), InternalError> {
        self.cursor.close()
    }
}

impl Iterator for HistoryScan<'_> {
    type Item = Result<HistoryEntry, InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.cursor.next_item()?;
        if item.is_ok() {
            self.span.add_row();
        }

        Some(item.map(HistoryEntry::from))
    }
}

impl FusedIterator for HistoryScan<'_> {}
