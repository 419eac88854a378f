use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Failed to build Prometheus exporter: {0}")]
    Build(#[from] BuildError),

    #[error("Another metrics recorder is already installed")]
    RecorderInstalled,
}

pub type MetricsResult<T> = Result<T, MetricsError>;
