//! Module: ledger
//! Responsibility: the external ordered key-value ledger seen from this layer.
//! Does not own: ordering, commit, validation or durability of writes.
//! Boundary: every physical read and write in the crate goes through [`Ledger`].

mod memory;

pub use memory::MemoryLedger;

use crate::db::key::CompositeKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

///
/// LedgerError
///
/// Failure reported by the ledger itself. Carried verbatim to callers.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct LedgerError {
    message: String,
}

impl LedgerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

///
/// KeyValue
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

///
/// LedgerTimestamp
///
/// Seconds + nanoseconds since the Unix epoch, as ledgers report commit time.
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct LedgerTimestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl LedgerTimestamp {
    #[must_use]
    pub const fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    /// RFC 3339 rendering, or `None` when outside the representable range.
    #[must_use]
    pub fn to_rfc3339(&self) -> Option<String> {
        let nanos = i128::from(self.seconds) * 1_000_000_000 + i128::from(self.nanos);
        let at = OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()?;

        at.format(&Rfc3339).ok()
    }
}

impl fmt::Display for LedgerTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Some(text) => f.write_str(&text),
            None => write!(f, "{}.{:09}", self.seconds, self.nanos),
        }
    }
}

///
/// KeyModification
///
/// One entry of a key's change log.
/// For deletions `is_delete` is set and `value` is empty.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyModification {
    pub tx_id: String,
    pub value: Vec<u8>,
    pub timestamp: LedgerTimestamp,
    pub is_delete: bool,
}

///
/// LedgerCursor
///
/// Store-side iteration state. Must be closed exactly once by its consumer;
/// dropping without `close` leaks whatever the ledger holds for it.
///

pub trait LedgerCursor<T>: Iterator<Item = Result<T, LedgerError>> {
    fn close(&mut self) -> Result<(), LedgerError>;
}

pub type StateCursor<'a> = Box<dyn LedgerCursor<KeyValue> + 'a>;
pub type HistoryCursor<'a> = Box<dyn LedgerCursor<KeyModification> + 'a>;

///
/// Ledger
///
/// The operations this layer consumes from the external store.
///
/// Range semantics: `[start, end)`; an empty `start` or `end` leaves that
/// side unbounded.
///

pub trait Ledger {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError>;

    fn del_state(&mut self, key: &str) -> Result<(), LedgerError>;

    fn state_by_range(&self, start: &str, end: &str) -> Result<StateCursor<'_>, LedgerError>;

    /// Scan every key extending an encoded composite-key prefix.
    fn state_by_partial_composite_key(
        &self,
        prefix: &CompositeKey,
    ) -> Result<StateCursor<'_>, LedgerError> {
        self.state_by_range(prefix.as_str(), &prefix.range_end())
    }

    fn history_for_key(&self, key: &str) -> Result<HistoryCursor<'_>, LedgerError>;

    /// Run a ledger-native query expression. This layer never inspects it.
    fn query_result(&self, expression: &str) -> Result<StateCursor<'_>, LedgerError>;

    fn get_private_data(&self, partition: &str, key: &str)
    -> Result<Option<Vec<u8>>, LedgerError>;

    fn put_private_data(
        &mut self,
        partition: &str,
        key: &str,
        value: &[u8],
    ) -> Result<(), LedgerError>;
}
