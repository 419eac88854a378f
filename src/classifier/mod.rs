pub mod classifier;
pub mod error;
pub mod rules;
pub mod types;

pub use classifier::{Classifier, Partitioner, Separator, Splitter};
pub use error::{ClassifierError, ClassifierResult};
pub use rules::{Rule, RuleAction, RuleSet};
pub use types::{Lane, Output};
