use crate::db::{
    key::is_composite,
    ledger::{
        HistoryCursor, KeyModification, KeyValue, Ledger, LedgerCursor, LedgerError,
        LedgerTimestamp, StateCursor,
    },
};
use serde_json::{Map, Value};
use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Commit time of the first transaction unless overridden.
const GENESIS_SECONDS: i64 = 1_502_688_979;

///
/// MemoryLedger
///
/// Ordered in-memory ledger with per-key history and private partitions.
///
/// Reads see writes immediately. Transactions are labels only: `begin_tx`
/// stamps subsequent writes with a tx id and advances the clock one second.
/// Cursors are counted from open to `close`, so tests can prove release.
///

#[derive(Debug)]
pub struct MemoryLedger {
    state: BTreeMap<String, Vec<u8>>,
    history: HashMap<String, Vec<KeyModification>>,
    private: HashMap<String, BTreeMap<String, Vec<u8>>>,
    tx_id: String,
    tx_seq: u64,
    timestamp: LedgerTimestamp,
    open_cursors: Arc<AtomicUsize>,
    faults: Faults,
}

///
/// Faults
///

#[derive(Clone, Copy, Debug, Default)]
struct Faults {
    writes_remaining: Option<usize>,
    fail_reads: bool,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: BTreeMap::new(),
            history: HashMap::new(),
            private: HashMap::new(),
            tx_id: "tx-000000".to_string(),
            tx_seq: 0,
            timestamp: LedgerTimestamp::new(GENESIS_SECONDS, 0),
            open_cursors: Arc::new(AtomicUsize::new(0)),
            faults: Faults::default(),
        }
    }

    // ======================================================================
    // Transaction labelling
    // ======================================================================

    /// Start a new transaction with an explicit id.
    pub fn begin_tx(&mut self, tx_id: impl Into<String>) {
        self.tx_seq = self.tx_seq.saturating_add(1);
        self.tx_id = tx_id.into();
        self.timestamp.seconds = self.timestamp.seconds.saturating_add(1);
    }

    /// Start a new transaction with a generated id; returns the id.
    pub fn next_tx(&mut self) -> String {
        let tx_id = format!("tx-{:06}", self.tx_seq.saturating_add(1));
        self.begin_tx(tx_id.clone());

        tx_id
    }

    /// Override the commit time stamped on subsequent writes.
    pub const fn set_timestamp(&mut self, timestamp: LedgerTimestamp) {
        self.timestamp = timestamp;
    }

    #[must_use]
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    // ======================================================================
    // Fault injection
    // ======================================================================

    /// Let `n` more writes (puts or deletes) succeed, then fail every write.
    pub const fn fail_writes_after(&mut self, n: usize) {
        self.faults.writes_remaining = Some(n);
    }

    /// Fail every point read and scan while set.
    pub const fn fail_reads(&mut self, fail: bool) {
        self.faults.fail_reads = fail;
    }

    pub const fn clear_faults(&mut self) {
        self.faults = Faults {
            writes_remaining: None,
            fail_reads: false,
        };
    }

    // ======================================================================
    // Diagnostics
    // ======================================================================

    /// Cursors opened and not yet closed.
    #[must_use]
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.state.contains_key(key)
    }

    /// Every live key in ledger order, composite keys included.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.state.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    // ======================================================================
    // Internals
    // ======================================================================

    fn check_read(&self) -> Result<(), LedgerError> {
        if self.faults.fail_reads {
            return Err(LedgerError::new("ledger read failed: injected fault"));
        }

        Ok(())
    }

    fn check_write(&mut self) -> Result<(), LedgerError> {
        match self.faults.writes_remaining {
            Some(0) => Err(LedgerError::new("ledger write failed: injected fault")),
            Some(n) => {
                self.faults.writes_remaining = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn record_history(&mut self, key: &str, value: Vec<u8>, is_delete: bool) {
        let entry = KeyModification {
            tx_id: self.tx_id.clone(),
            value,
            timestamp: self.timestamp,
            is_delete,
        };
        self.history.entry(key.to_string()).or_default().push(entry);
    }

    fn cursor<T, I>(&self, inner: I) -> Box<dyn LedgerCursor<T> + '_>
    where
        T: 'static,
        I: Iterator<Item = T> + 'static,
    {
        self.open_cursors.fetch_add(1, Ordering::SeqCst);

        Box::new(MemoryCursor {
            inner,
            open: Arc::clone(&self.open_cursors),
            closed: false,
        })
    }
}

impl Ledger for MemoryLedger {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        self.check_read()?;

        Ok(self.state.get(key).cloned())
    }

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        if key.is_empty() {
            return Err(LedgerError::new("ledger write failed: empty key"));
        }
        self.check_write()?;

        self.state.insert(key.to_string(), value.to_vec());
        self.record_history(key, value.to_vec(), false);

        Ok(())
    }

    fn del_state(&mut self, key: &str) -> Result<(), LedgerError> {
        self.check_write()?;

        if self.state.remove(key).is_some() {
            self.record_history(key, Vec::new(), true);
        }

        Ok(())
    }

    fn state_by_range(&self, start: &str, end: &str) -> Result<StateCursor<'_>, LedgerError> {
        self.check_read()?;

        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start)
        };
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };

        // BTreeMap::range panics on inverted bounds; an inverted range is empty.
        let inverted = !start.is_empty() && !end.is_empty() && start > end;
        let entries: Vec<KeyValue> = if inverted {
            Vec::new()
        } else {
            self.state
                .range::<str, _>((lower, upper))
                .map(|(key, value)| KeyValue {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect()
        };

        Ok(self.cursor(entries.into_iter()))
    }

    fn history_for_key(&self, key: &str) -> Result<HistoryCursor<'_>, LedgerError> {
        self.check_read()?;

        let entries = self.history.get(key).cloned().unwrap_or_default();

        Ok(self.cursor(entries.into_iter()))
    }

    fn query_result(&self, expression: &str) -> Result<StateCursor<'_>, LedgerError> {
        self.check_read()?;

        let selector = parse_selector(expression)?;
        let entries: Vec<KeyValue> = self
            .state
            .iter()
            .filter(|(key, _)| !is_composite(key))
            .filter(|(_, value)| selector_matches(&selector, value))
            .map(|(key, value)| KeyValue {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();

        Ok(self.cursor(entries.into_iter()))
    }

    fn get_private_data(
        &self,
        partition: &str,
        key: &str,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        self.check_read()?;

        Ok(self
            .private
            .get(partition)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    fn put_private_data(
        &mut self,
        partition: &str,
        key: &str,
        value: &[u8],
    ) -> Result<(), LedgerError> {
        self.check_write()?;

        self.private
            .entry(partition.to_string())
            .or_default()
            .insert(key.to_string(), value.to_vec());

        Ok(())
    }
}

///
/// MemoryCursor
///
/// Iterates a materialized snapshot. Deliberately has no `Drop`: an unclosed
/// cursor stays counted, the way a remote ledger would keep its iterator.
///

struct MemoryCursor<I> {
    inner: I,
    open: Arc<AtomicUsize>,
    closed: bool,
}

impl<T, I: Iterator<Item = T>> Iterator for MemoryCursor<I> {
    type Item = Result<T, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }

        self.inner.next().map(Ok)
    }
}

impl<T, I: Iterator<Item = T>> LedgerCursor<T> for MemoryCursor<I> {
    fn close(&mut self) -> Result<(), LedgerError> {
        if !self.closed {
            self.closed = true;
            self.open.fetch_sub(1, Ordering::SeqCst);
        }

        Ok(())
    }
}

// Supports the equality subset of CouchDB selectors: {"selector": {field: value}}.
fn parse_selector(expression: &str) -> Result<Map<String, Value>, LedgerError> {
    let parsed: Value = serde_json::from_str(expression)
        .map_err(|err| LedgerError::new(format!("rich query failed: {err}")))?;

    match parsed.get("selector") {
        Some(Value::Object(selector)) => Ok(selector.clone()),
        _ => Err(LedgerError::new(
            "rich query failed: expected an object under \"selector\"",
        )),
    }
}

fn selector_matches(selector: &Map<String, Value>, value: &[u8]) -> bool {
    let Ok(Value::Object(doc)) = serde_json::from_slice::<Value>(value) else {
        return false;
    };

    selector
        .iter()
        .all(|(field, expected)| doc.get(field) == Some(expected))
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mut cursor: StateCursor<'_>) -> Vec<String> {
        let keys = cursor
            .by_ref()
            .map(|kv| kv.expect("memory cursor should not fail").key)
            .collect();
        cursor.close().expect("close should succeed");

        keys
    }

    #[test]
    fn range_is_half_open_and_empty_bounds_are_unbounded() {
        let mut ledger = MemoryLedger::new();
        for key in ["a", "b", "c"] {
            ledger.put_state(key, b"1").expect("put should succeed");
        }

        assert_eq!(drain(ledger.state_by_range("a", "c").unwrap()), ["a", "b"]);
        assert_eq!(drain(ledger.state_by_range("", "").unwrap()), ["a", "b", "c"]);
        assert_eq!(drain(ledger.state_by_range("b", "").unwrap()), ["b", "c"]);
        assert!(drain(ledger.state_by_range("c", "a").unwrap()).is_empty());
    }

    #[test]
    fn cursors_are_counted_until_closed() {
        let mut ledger = MemoryLedger::new();
        ledger.put_state("a", b"1").expect("put should succeed");

        let mut cursor = ledger.state_by_range("", "").expect("scan should open");
        assert_eq!(ledger.open_cursors(), 1);
        cursor.close().expect("close should succeed");
        cursor.close().expect("double close is a no-op");
        assert_eq!(ledger.open_cursors(), 0);
        assert!(cursor.next().is_none());
    }

    #[test]
    fn history_records_writes_and_tombstones_in_order() {
        let mut ledger = MemoryLedger::new();
        ledger.begin_tx("t1");
        ledger.put_state("k", b"v1").expect("put should succeed");
        ledger.begin_tx("t2");
        ledger.del_state("k").expect("delete should succeed");

        let mut cursor = ledger.history_for_key("k").expect("history should open");
        let entries: Vec<_> = cursor.by_ref().map(Result::unwrap).collect();
        cursor.close().expect("close should succeed");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tx_id, "t1");
        assert!(!entries[0].is_delete);
        assert_eq!(entries[1].tx_id, "t2");
        assert!(entries[1].is_delete);
        assert!(entries[0].timestamp < entries[1].timestamp);
    }

    #[test]
    fn injected_write_fault_trips_after_budget() {
        let mut ledger = MemoryLedger::new();
        ledger.fail_writes_after(1);

        ledger.put_state("a", b"1").expect("first write is within budget");
        assert!(ledger.put_state("b", b"1").is_err());
        assert!(ledger.del_state("a").is_err());

        ledger.clear_faults();
        ledger.put_state("b", b"1").expect("faults cleared");
    }

    #[test]
    fn selector_query_matches_top_level_equality_and_skips_composites() {
        let mut ledger = MemoryLedger::new();
        ledger
            .put_state("001", br#"{"type":"FOOD","owner":"cathy"}"#)
            .unwrap();
        ledger
            .put_state("002", br#"{"type":"DRINK","owner":"cathy"}"#)
            .unwrap();
        ledger.put_state("\u{0}idx\u{0}", br#"{"type":"FOOD"}"#).unwrap();

        let cursor = ledger
            .query_result(r#"{"selector":{"type":"FOOD"}}"#)
            .expect("query should run");
        assert_eq!(drain(cursor), ["001"]);

        assert!(ledger.query_result("not json").is_err());
        assert!(ledger.query_result(r#"{"fields":[]}"#).is_err());
    }

    #[test]
    fn private_partitions_are_isolated_from_state() {
        let mut ledger = MemoryLedger::new();
        ledger
            .put_private_data("collectionMarbles", "m_001", b"{}")
            .expect("private put should succeed");

        assert!(ledger.get_state("m_001").unwrap().is_none());
        assert!(
            ledger
                .get_private_data("other", "m_001")
                .unwrap()
                .is_none()
        );
        assert_eq!(
            ledger
                .get_private_data("collectionMarbles", "m_001")
                .unwrap(),
            Some(b"{}".to_vec())
        );
    }
}
