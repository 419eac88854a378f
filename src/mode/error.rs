use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModeError {
    #[error("Unknown test mode '{0}' (expected separate/0, split/1 or partition/2)")]
    UnknownMode(String),

    #[error("Expected percentage {0} is above 100")]
    PercentOutOfRange(u32),
}

pub type ModeResult<T> = Result<T, ModeError>;
