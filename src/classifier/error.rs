use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Failed to read rule file {path}: {source}")]
    RuleFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rule syntax error on line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    #[error("Rule set contains no rules")]
    EmptyRuleSet,

    #[error("Partition weights must not both be zero")]
    InvalidWeights,

    #[error("Splitter needs at least {min} outputs, got {requested}")]
    TooFewOutputs { min: usize, requested: usize },
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;
