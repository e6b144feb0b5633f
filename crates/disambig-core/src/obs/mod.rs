//! Observability: in-memory metrics state and the sink boundary the
//! engine and session report through.

pub mod metrics;
pub mod sink;

pub use sink::{ExecKind, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink};
