use crate::{
    config::EngineConfig,
    db::{
        Db,
        key::encode,
        ledger::{
            HistoryCursor, Ledger, LedgerError, LedgerTimestamp, MemoryLedger, StateCursor,
        },
    },
    model::asset::Asset,
    obs::{metrics_report, metrics_reset_all},
    serialize::serialize,
};

///
/// SplitLedger
///
/// Wraps a memory ledger: point reads can fail on their own, and a
/// ledger-native query returns every stored row, composite keys included.
///

struct SplitLedger {
    inner: MemoryLedger,
    fail_gets: bool,
}

impl Ledger for SplitLedger {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        if self.fail_gets {
            return Err(LedgerError::new("point read failed"));
        }

        self.inner.get_state(key)
    }

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        self.inner.put_state(key, value)
    }

    fn del_state(&mut self, key: &str) -> Result<(), LedgerError> {
        self.inner.del_state(key)
    }

    fn state_by_range(&self, start: &str, end: &str) -> Result<StateCursor<'_>, LedgerError> {
        self.inner.state_by_range(start, end)
    }

    fn history_for_key(&self, key: &str) -> Result<HistoryCursor<'_>, LedgerError> {
        self.inner.history_for_key(key)
    }

    fn query_result(&self, _expression: &str) -> Result<StateCursor<'_>, LedgerError> {
        self.inner.state_by_range("", "")
    }

    fn get_private_data(
        &self,
        partition: &str,
        key: &str,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        self.inner.get_private_data(partition, key)
    }

    fn put_private_data(
        &mut self,
        partition: &str,
        key: &str,
        value: &[u8],
    ) -> Result<(), LedgerError> {
        self.inner.put_private_data(partition, key, value)
    }
}

fn split(inner: MemoryLedger, fail_gets: bool) -> Db<SplitLedger> {
    Db::new(
        SplitLedger { inner, fail_gets },
        EngineConfig::default().with_commit_markers(false),
    )
    .expect("config should validate")
}

fn asset(id: &str, kind: &str, owner: &str) -> Asset {
    Asset::new(id, "test", kind, owner, true, "2018-05-25", 1_502_688_979)
}

fn seeded() -> Db<MemoryLedger> {
    let mut db =
        Db::new(MemoryLedger::new(), EngineConfig::default()).expect("config should validate");
    for (id, kind, owner) in [
        ("001", "food", "cathy"),
        ("002", "food", "bob"),
        ("003", "drink", "cathy"),
    ] {
        db.records::<Asset>()
            .create(asset(id, kind, owner))
            .expect("create should succeed");
    }

    db
}

#[test]
fn scan_all_yields_records_in_key_order_without_index_entries() {
    let mut db = seeded();
    let query = db.query::<Asset>().expect("query should open");

    let rows: Vec<(String, Asset)> = query
        .scan_all()
        .expect("scan should open")
        .collect::<Result<_, _>>()
        .expect("scan should succeed");

    let keys: Vec<_> = rows.iter().map(|(key, _)| key.as_str()).collect();
    assert_eq!(keys, ["001", "002", "003"]);
    assert_eq!(rows[2].1.kind, "DRINK");
}

#[test]
fn scan_range_is_half_open() {
    let mut db = seeded();
    let query = db.query::<Asset>().expect("query should open");

    let ids: Vec<String> = query
        .scan_range("001", "003")
        .expect("scan should open")
        .map(|row| row.map(|(key, _)| key))
        .collect::<Result<_, _>>()
        .expect("scan should succeed");

    assert_eq!(ids, ["001", "002"]);
}

#[test]
fn scan_by_index_accepts_query_and_index_names() {
    let mut db = seeded();
    let query = db.query::<Asset>().expect("query should open");

    let by_query: Vec<Asset> = query
        .scan_by_index("AssetType", &["FOOD"])
        .expect("scan should open")
        .collect::<Result<_, _>>()
        .expect("scan should succeed");
    let by_index: Vec<Asset> = query
        .scan_by_index("DemoAsset~Type", &["FOOD"])
        .expect("scan should open")
        .collect::<Result<_, _>>()
        .expect("scan should succeed");

    let ids: Vec<_> = by_query.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["001", "002"]);
    assert_eq!(by_query, by_index);
}

#[test]
fn scan_by_index_accepts_the_indexed_attribute_name() {
    let mut db = seeded();
    let query = db.query::<Asset>().expect("query should open");

    let ids: Vec<String> = query
        .scan_by_index("type", &["FOOD"])
        .expect("scan should open")
        .map(|row| row.map(|a| a.id))
        .collect::<Result<_, _>>()
        .expect("scan should succeed");

    assert_eq!(ids, ["001", "002"]);
}

#[test]
fn scan_by_index_with_empty_prefix_covers_the_whole_index() {
    let mut db = seeded();
    let query = db.query::<Asset>().expect("query should open");

    let owners: Vec<String> = query
        .scan_by_index::<&str>("AssetOwner", &[])
        .expect("scan should open")
        .map(|row| row.map(|a| a.owner))
        .collect::<Result<_, _>>()
        .expect("scan should succeed");

    assert_eq!(owners, ["bob", "cathy", "cathy"]);
}

#[test]
fn unknown_index_name_is_a_validation_error() {
    let mut db = seeded();
    let query = db.query::<Asset>().expect("query should open");

    let err = query
        .scan_by_index("AssetColor", &["RED"])
        .err()
        .expect("unknown index should fail");

    assert!(err.is_validation());
}

#[test]
fn dangling_index_entries_are_skipped() {
    metrics_reset_all();
    let mut db = seeded();
    let dangling = encode("DemoAsset~Type", &["FOOD", "009"]).expect("key should encode");
    db.ledger_mut()
        .put_state(dangling.as_str(), &[0])
        .expect("seed should write");

    let ids: Vec<String> = db
        .query::<Asset>()
        .expect("query should open")
        .scan_by_index("AssetType", &["FOOD"])
        .expect("scan should open")
        .map(|row| row.map(|a| a.id))
        .collect::<Result<_, _>>()
        .expect("scan should succeed");

    assert_eq!(ids, ["001", "002"]);
    assert_eq!(metrics_report().ops.dangling_index_skips, 1);
}

#[test]
fn short_index_entries_are_malformed_items() {
    let mut db = seeded();
    let short = encode("DemoAsset~Type", &["FOOD"]).expect("key should encode");
    db.ledger_mut()
        .put_state(short.as_str(), &[0])
        .expect("seed should write");

    let results: Vec<_> = db
        .query::<Asset>()
        .expect("query should open")
        .scan_by_index("AssetType", &["FOOD"])
        .expect("scan should open")
        .collect();

    assert_eq!(results.len(), 3);
    let err = results[0].as_ref().expect_err("short entry should fail");
    assert!(err.is_malformed_key());
    assert!(results[1].is_ok() && results[2].is_ok());
}

#[test]
fn cursor_is_released_after_full_iteration() {
    let mut db = seeded();
    {
        let query = db.query::<Asset>().expect("query should open");
        let mut scan = query.scan_all().expect("scan should open");
        assert_eq!(db_open_cursors(&query), 1);

        while scan.next().is_some() {}
        assert_eq!(db_open_cursors(&query), 0);
    }

    assert_eq!(db.ledger().open_cursors(), 0);
}

#[test]
fn cursor_is_released_on_early_drop() {
    let mut db = seeded();
    {
        let query = db.query::<Asset>().expect("query should open");
        let mut scan = query
            .scan_by_index("AssetOwner", &["cathy"])
            .expect("scan should open");
        scan.next()
            .expect("one row")
            .expect("row should decode");
    }

    assert_eq!(db.ledger().open_cursors(), 0);
}

#[test]
fn cursor_is_released_on_explicit_close() {
    let mut db = seeded();
    let query = db.query::<Asset>().expect("query should open");
    let mut history = query.history("001").expect("history should open");

    history.close().expect("close should succeed");
    history.close().expect("second close is a no-op");

    assert!(history.next().is_none());
    assert_eq!(db_open_cursors(&query), 0);
}

#[test]
fn cursor_is_released_when_collect_stops_at_an_error() {
    let mut db = seeded();
    db.ledger_mut()
        .put_state("000", b"{not json")
        .expect("seed should write");

    let result: Result<Vec<(String, Asset)>, _> = db
        .query::<Asset>()
        .expect("query should open")
        .scan_all()
        .expect("scan should open")
        .collect();

    assert!(result.expect_err("bad payload should fail").is_corruption());
    assert_eq!(db.ledger().open_cursors(), 0);
}

#[test]
fn failed_open_leaks_nothing() {
    let mut db = seeded();
    db.ledger_mut().fail_reads(true);

    let err = db.query::<Asset>().err().expect("recovery read should fail");

    assert!(err.is_store_unavailable());
    assert_eq!(db.ledger().open_cursors(), 0);
}

#[test]
fn free_query_filters_by_selector() {
    let mut db = seeded();

    let ids: Vec<String> = db
        .query::<Asset>()
        .expect("query should open")
        .free_query(r#"{"selector":{"owner":"cathy"}}"#)
        .expect("query should run")
        .map(|row| row.map(|(key, _)| key))
        .collect::<Result<_, _>>()
        .expect("rows should decode");

    assert_eq!(ids, ["001", "003"]);
}

#[test]
fn free_query_passes_keys_through_unfiltered() {
    let composite = encode("Mirror", &["001"]).expect("key should encode");
    let payload = serialize(&asset("001", "food", "cathy")).expect("asset should encode");
    let mut inner = MemoryLedger::new();
    inner
        .put_state(composite.as_str(), &payload)
        .expect("seed should write");
    inner.put_state("001", &payload).expect("seed should write");
    let mut db = split(inner, false);

    let keys: Vec<String> = db
        .query::<Asset>()
        .expect("query should open")
        .free_query("{}")
        .expect("query should run")
        .map(|row| row.map(|(key, _)| key))
        .collect::<Result<_, _>>()
        .expect("rows should decode");

    assert_eq!(keys, [composite.into_string(), "001".to_string()]);
}

#[test]
fn ledger_failure_while_resolving_ends_the_index_scan() {
    let mut db = split(seeded().into_inner(), true);

    {
        let results: Vec<_> = db
            .query::<Asset>()
            .expect("query should open")
            .scan_by_index("AssetType", &["FOOD"])
            .expect("scan should open")
            .collect();

        assert_eq!(results.len(), 1);
        let err = results[0].as_ref().expect_err("point read should fail");
        assert!(err.is_store_unavailable());
    }

    assert_eq!(db.ledger().inner.open_cursors(), 0);
}

#[test]
fn bad_free_query_expression_is_store_unavailable() {
    let mut db = seeded();
    let query = db.query::<Asset>().expect("query should open");

    let err = query
        .free_query("owner = cathy")
        .err()
        .expect("bad expression should fail");

    assert!(err.is_store_unavailable());
}

#[test]
fn history_lists_writes_then_tombstone() {
    let mut db =
        Db::new(MemoryLedger::new(), EngineConfig::default()).expect("config should validate");

    db.ledger_mut().begin_tx("tx-a");
    db.records::<Asset>()
        .create(asset("001", "food", "cathy"))
        .expect("create should succeed");
    db.ledger_mut().begin_tx("tx-b");
    db.records::<Asset>()
        .update(asset("001", "food", "bob"))
        .expect("update should succeed");
    db.ledger_mut().begin_tx("tx-c");
    db.ledger_mut().set_timestamp(LedgerTimestamp::new(1_600_000_000, 5));
    db.records::<Asset>()
        .delete("001")
        .expect("delete should succeed");

    let entries: Vec<_> = db
        .query::<Asset>()
        .expect("query should open")
        .history("001")
        .expect("history should open")
        .collect::<Result<_, _>>()
        .expect("history should read");

    let tx_ids: Vec<_> = entries.iter().map(|e| e.tx_id.as_str()).collect();
    assert_eq!(tx_ids, ["tx-a", "tx-b", "tx-c"]);

    let second: Asset = entries[1]
        .record()
        .expect("snapshot should decode")
        .expect("write carries a value");
    assert_eq!(second.owner, "bob");

    let last = &entries[2];
    assert!(last.is_delete);
    assert_eq!(last.value, None);
    assert_eq!(last.timestamp, LedgerTimestamp::new(1_600_000_000, 5));
    assert!(last.record::<Asset>().expect("tombstone decodes").is_none());
}

#[test]
fn scans_report_rows() {
    metrics_reset_all();
    let mut db = seeded();

    let count = db
        .query::<Asset>()
        .expect("query should open")
        .scan_by_index("AssetType", &["FOOD"])
        .expect("scan should open")
        .count();

    assert_eq!(count, 2);
    assert_eq!(metrics_report().ops.index_scan_calls, 1);
    assert_eq!(metrics_report().ops.rows_scanned, 2);
}

fn db_open_cursors(query: &crate::db::query::Query<'_, MemoryLedger, Asset>) -> usize {
    query.ledger().open_cursors()
}
