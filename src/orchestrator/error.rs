use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Mode error: {0}")]
    Mode(#[from] crate::mode::ModeError),

    #[error("Rule set error: {0}")]
    Rules(#[from] crate::classifier::ClassifierError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("Statistics error: {0}")]
    Stats(#[from] crate::stats::StatsError),

    #[error("Packet budget not reached within {0:?}")]
    Timeout(Duration),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
