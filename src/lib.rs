//! Traffic distribution harness: generates tagged packets, pushes them
//! through a classifier, and checks that the two observed lanes receive the
//! expected share with integrity intact.

pub mod classifier;
pub mod config;
pub mod generator;
pub mod metrics;
pub mod mode;
pub mod orchestrator;
pub mod packet;
pub mod pipeline;
pub mod rendezvous;
pub mod stats;
pub mod verifier;

pub use config::HarnessConfig;
pub use orchestrator::{Harness, HarnessError, HarnessResult};
pub use stats::Report;
