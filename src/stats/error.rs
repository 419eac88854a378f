use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("No packets were counted as sent after warm-up; delivery ratio is undefined")]
    NothingSent,
}

pub type StatsResult<T> = Result<T, StatsError>;
