//! Prometheus counters for harness runs: packets generated, verified per
//! lane, broken and misrouted, plus one verdict and duration per run.

pub mod error;
pub mod exporter;
pub mod recorder;

pub use error::{MetricsError, MetricsResult};
pub use exporter::{render_metrics, serve_metrics};
pub use recorder::{
    init_metrics, record_packet_broken, record_packet_generated, record_packet_misrouted,
    record_packet_verified, RunMetrics,
};
