use crate::packet::PacketError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unknown flow {0}")]
    UnknownFlow(usize),

    #[error("Flow {0} already has a consumer")]
    FlowAlreadyConsumed(usize),

    #[error("Flow {0} has no consumer; attach a handler or sink")]
    UnterminatedFlow(usize),

    #[error("Classifier '{0}' declares no outputs")]
    EmptyClassifier(&'static str),

    #[error("Channel capacity must be non-zero")]
    ZeroCapacity,

    #[error("Pipeline must be started from within a tokio runtime")]
    NoRuntime,

    #[error("Generator failed: {0}")]
    GeneratorFailed(#[from] PacketError),

    #[error("Stage task panicked: {0}")]
    StagePanicked(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
