//! Drives one run from configuration to verdict

pub mod error;
pub mod harness;
pub mod state_machine;
pub mod types;

pub use error::{HarnessError, HarnessResult};
pub use harness::Harness;
pub use state_machine::RunStateMachine;
pub use types::{RunEvent, RunState};
