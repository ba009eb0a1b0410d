//! Observability: operation counters and the sink they flow through.
//!
//! Core DB logic emits [`MetricsEvent`]s only; it never touches counter
//! state directly.

mod metrics;
pub mod sink;

pub use metrics::{EventReport, OpCounters, RecordCounters};
pub use sink::{
    MetricsEvent, MetricsSink, OpKind, metrics_report, metrics_reset_all, with_metrics_sink,
};
