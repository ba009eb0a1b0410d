//! Module: db
//! Responsibility: the engine handle tying a ledger, its configuration and the
//! index manager together.
//! Does not own: physical storage, which stays behind [`ledger::Ledger`].
//! Boundary: record, query and private accessors are all borrowed from [`Db`].

pub mod commit;
pub mod index;
pub mod key;
pub mod ledger;
pub mod private;
pub mod query;
pub mod record;

use crate::{
    config::EngineConfig,
    db::{
        index::IndexManager, ledger::Ledger, private::PrivateStore, query::Query,
        record::RecordStore,
    },
    error::InternalError,
    model::record::Record,
};

///
/// Db
///
/// Owns a ledger and the configuration every accessor runs under.
///
/// Accessors borrow the handle for their lifetime; lazy query results keep
/// that borrow until they are dropped.
///

#[derive(Debug)]
pub struct Db<L: Ledger> {
    ledger: L,
    config: EngineConfig,
    indexes: IndexManager,
}

impl<L: Ledger> Db<L> {
    /// Build a handle, validating the index table first.
    pub fn new(ledger: L, config: EngineConfig) -> Result<Self, InternalError> {
        config.validate()?;
        let indexes = IndexManager::new(config.indexes.clone());

        Ok(Self {
            ledger,
            config,
            indexes,
        })
    }

    /// Handle over the default asset configuration.
    #[must_use]
    pub fn with_defaults(ledger: L) -> Self {
        let config = EngineConfig::default();
        let indexes = IndexManager::new(config.indexes.clone());

        Self {
            ledger,
            config,
            indexes,
        }
    }

    #[must_use]
    pub const fn ledger(&self) -> &L {
        &self.ledger
    }

    pub const fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    #[must_use]
    pub fn into_inner(self) -> L {
        self.ledger
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn indexes(&self) -> &IndexManager {
        &self.indexes
    }

    /// Mutations for one record type.
    pub const fn records<R: Record>(&mut self) -> RecordStore<'_, L, R> {
        RecordStore::new(self)
    }

    /// Reads for one record type. Pending commits are replayed first.
    pub fn query<R: Record>(&mut self) -> Result<Query<'_, L, R>, InternalError> {
        self.ensure_recovered()?;

        Ok(Query::new(self))
    }

    /// Private partition access. Never indexed, never visible to queries.
    pub const fn private(&mut self) -> PrivateStore<'_, L> {
        PrivateStore::new(self)
    }

    /// Replay a commit left behind by an interrupted mutation, if any.
    ///
    /// A no-op when commit markers are disabled.
    pub fn ensure_recovered(&mut self) -> Result<(), InternalError> {
        if !self.config.commit_markers {
            return Ok(());
        }

        commit::ensure_recovered(&mut self.ledger)
    }

    pub(crate) fn debug_log(&self, s: impl Into<String>) {
        if self.config.debug {
            tracing::debug!(target: "ledgerdex", "{}", s.into());
        }
    }
}
