//! Metrics sink boundary.
//!
//! All instrumentation flows through `MetricsEvent` and `MetricsSink`.
//! This module is the only bridge between execution logic and the
//! process-local counter state.

use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// OpKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpKind {
    Create,
    Update,
    Get,
    Delete,
    Scan,
    IndexScan,
    FreeQuery,
    History,
    PrivateGet,
    PrivatePut,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    OpStart {
        kind: OpKind,
        record_path: &'static str,
    },
    OpFinish {
        kind: OpKind,
        record_path: &'static str,
        rows: u64,
    },
    IndexDelta {
        record_path: &'static str,
        inserts: u64,
        removes: u64,
    },
    DanglingIndexSkipped {
        record_path: &'static str,
    },
    CommitReplayed {
        ops: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// Default sink: writes into the thread's counter state.
pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::OpStart { kind, record_path } => {
                metrics::with_state_mut(|m| {
                    m.ops.bump_calls(kind);
                    m.records
                        .entry(record_path.to_string())
                        .or_default()
                        .bump_calls(kind);
                });
            }

            MetricsEvent::OpFinish {
                kind,
                record_path,
                rows,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.add_rows(kind, rows);
                    m.records
                        .entry(record_path.to_string())
                        .or_default()
                        .add_rows(kind, rows);
                });
            }

            MetricsEvent::IndexDelta {
                record_path,
                inserts,
                removes,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.index_inserts = m.ops.index_inserts.saturating_add(inserts);
                    m.ops.index_removes = m.ops.index_removes.saturating_add(removes);
                    let entry = m.records.entry(record_path.to_string()).or_default();
                    entry.index_inserts = entry.index_inserts.saturating_add(inserts);
                    entry.index_removes = entry.index_removes.saturating_add(removes);
                });
            }

            MetricsEvent::DanglingIndexSkipped { record_path } => {
                metrics::with_state_mut(|m| {
                    m.ops.dangling_index_skips = m.ops.dangling_index_skips.saturating_add(1);
                    let entry = m.records.entry(record_path.to_string()).or_default();
                    entry.dangling_index_skips = entry.dangling_index_skips.saturating_add(1);
                });
            }

            MetricsEvent::CommitReplayed { ops } => {
                metrics::with_state_mut(|m| {
                    m.ops.commit_replays = m.ops.commit_replays.saturating_add(1);
                    m.ops.commit_replayed_ops = m.ops.commit_replayed_ops.saturating_add(ops);
                });
            }
        }
    }
}

pub(crate) fn record(event: MetricsEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GlobalMetricsSink.record(event),
    }
}

/// Snapshot the current thread's counters.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset the current thread's counters.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary sink override; the previous sink is
/// restored on every exit, unwinding included.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// Span
///
/// RAII guard emitting start/finish events for one operation.
/// Finish accounting happens on every exit path.
///

pub(crate) struct Span {
    kind: OpKind,
    record_path: &'static str,
    rows: u64,
}

impl Span {
    #[must_use]
    pub(crate) fn new(kind: OpKind, record_path: &'static str) -> Self {
        record(MetricsEvent::OpStart { kind, record_path });

        Self {
            kind,
            record_path,
            rows: 0,
        }
    }

    pub(crate) const fn set_rows(&mut self, rows: u64) {
        self.rows = rows;
    }

    pub(crate) const fn add_row(&mut self) {
        self.rows = self.rows.saturating_add(1);
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        record(MetricsEvent::OpFinish {
            kind: self.kind,
            record_path: self.record_path,
            rows: self.rows,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        cell::Cell,
        panic::{AssertUnwindSafe, catch_unwind},
    };

    #[derive(Default)]
    struct CountingSink {
        calls: Cell<usize>,
    }

    impl MetricsSink for CountingSink {
        fn record(&self, _: MetricsEvent) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    #[test]
    fn with_metrics_sink_routes_and_restores_nested_overrides() {
        let outer = Rc::new(CountingSink::default());
        let inner = Rc::new(CountingSink::default());

        with_metrics_sink(outer.clone(), || {
            record(MetricsEvent::CommitReplayed { ops: 1 });
            with_metrics_sink(inner.clone(), || {
                record(MetricsEvent::CommitReplayed { ops: 1 });
                record(MetricsEvent::CommitReplayed { ops: 1 });
            });
            record(MetricsEvent::CommitReplayed { ops: 1 });
        });

        assert_eq!(outer.calls.get(), 2);
        assert_eq!(inner.calls.get(), 2);
        assert!(SINK_OVERRIDE.with(|cell| cell.borrow().is_none()));
    }

    #[test]
    fn with_metrics_sink_restores_on_panic() {
        let sink = Rc::new(CountingSink::default());

        let result = catch_unwind(AssertUnwindSafe(|| {
            with_metrics_sink::<()>(sink.clone(), || panic!("boom"));
        }));

        assert!(result.is_err());
        assert!(SINK_OVERRIDE.with(|cell| cell.borrow().is_none()));
    }

    #[test]
    fn span_emits_start_and_finish() {
        let sink = Rc::new(CountingSink::default());

        with_metrics_sink(sink.clone(), || {
            let mut span = Span::new(OpKind::Get, "Probe");
            span.set_rows(1);
        });

        assert_eq!(sink.calls.get(), 2);
    }

    #[test]
    fn global_sink_accumulates_counters() {
        metrics_reset_all();

        {
            let mut span = Span::new(OpKind::Scan, "Probe");
            span.add_row();
            span.add_row();
        }
        record(MetricsEvent::DanglingIndexSkipped {
            record_path: "Probe",
        });

        let report = metrics_report();
        assert_eq!(report.ops.scan_calls, 1);
        assert_eq!(report.ops.rows_scanned, 2);
        assert_eq!(report.ops.dangling_index_skips, 1);
        assert_eq!(report.records["Probe"].rows_scanned, 2);
    }
}
