//! In-process packet pipeline: a generator feeding classifier, handler and
//! sink stages over bounded channels, one tokio task per stage. Delivery is
//! in order within a flow and every handler sees each packet exactly once.

pub mod engine;
pub mod error;
mod stage;

pub use engine::{FlowId, GenerateFn, HandleFn, Pipeline, RunningPipeline};
pub use error::{PipelineError, PipelineResult};
