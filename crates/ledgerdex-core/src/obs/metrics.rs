use crate::obs::sink::OpKind;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventReport
/// Ephemeral, per-thread operation counters.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub ops: OpCounters,
    pub records: BTreeMap<String, RecordCounters>,
}

///
/// OpCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OpCounters {
    // Entrypoints
    pub create_calls: u64,
    pub update_calls: u64,
    pub get_calls: u64,
    pub delete_calls: u64,
    pub scan_calls: u64,
    pub index_scan_calls: u64,
    pub free_query_calls: u64,
    pub history_calls: u64,
    pub private_get_calls: u64,
    pub private_put_calls: u64,

    // Rows touched
    pub rows_written: u64,
    pub rows_loaded: u64,
    pub rows_scanned: u64,
    pub rows_deleted: u64,

    // Index maintenance
    pub index_inserts: u64,
    pub index_removes: u64,
    pub dangling_index_skips: u64,

    // Recovery
    pub commit_replays: u64,
    pub commit_replayed_ops: u64,
}

///
/// RecordCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RecordCounters {
    pub create_calls: u64,
    pub update_calls: u64,
    pub get_calls: u64,
    pub delete_calls: u64,
    pub scan_calls: u64,
    pub index_scan_calls: u64,
    pub free_query_calls: u64,
    pub history_calls: u64,
    pub private_get_calls: u64,
    pub private_put_calls: u64,
    pub rows_written: u64,
    pub rows_loaded: u64,
    pub rows_scanned: u64,
    pub rows_deleted: u64,
    pub index_inserts: u64,
    pub index_removes: u64,
    pub dangling_index_skips: u64,
}

macro_rules! impl_op_counters {
    ($ty:ty) => {
        impl $ty {
            pub(crate) const fn bump_calls(&mut self, kind: OpKind) {
                let slot = match kind {
                    OpKind::Create => &mut self.create_calls,
                    OpKind::Update => &mut self.update_calls,
                    OpKind::Get => &mut self.get_calls,
                    OpKind::Delete => &mut self.delete_calls,
                    OpKind::Scan => &mut self.scan_calls,
                    OpKind::IndexScan => &mut self.index_scan_calls,
                    OpKind::FreeQuery => &mut self.free_query_calls,
                    OpKind::History => &mut self.history_calls,
                    OpKind::PrivateGet => &mut self.private_get_calls,
                    OpKind::PrivatePut => &mut self.private_put_calls,
                };
                *slot = slot.saturating_add(1);
            }

            pub(crate) const fn add_rows(&mut self, kind: OpKind, rows: u64) {
                let slot = match kind {
                    OpKind::Create | OpKind::Update | OpKind::PrivatePut => &mut self.rows_written,
                    OpKind::Get | OpKind::PrivateGet => &mut self.rows_loaded,
                    OpKind::Delete => &mut self.rows_deleted,
                    OpKind::Scan | OpKind::IndexScan | OpKind::FreeQuery | OpKind::History => {
                        &mut self.rows_scanned
                    }
                };
                *slot = slot.saturating_add(rows);
            }
        }
    };
}

impl_op_counters!(OpCounters);
impl_op_counters!(RecordCounters);

thread_local! {
    static EVENT_STATE: RefCell<EventReport> = RefCell::new(EventReport::default());
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventReport) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

pub(crate) fn report() -> EventReport {
    EVENT_STATE.with(|m| m.borrow().clone())
}

pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventReport::default());
}

///
/// TESTS
///
