use crate::orchestrator::error::{HarnessError, HarnessResult};
use crate::orchestrator::types::{RunEvent, RunState};
use parking_lot::RwLock;
use std::sync::Arc;

/// Lifecycle of a single run. Shared handles observe the same state.
#[derive(Clone)]
pub struct RunStateMachine {
    state: Arc<RwLock<RunState>>,
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStateMachine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(RunState::Configuring)),
        }
    }

    /// Get current state
    pub fn current_state(&self) -> RunState {
        self.state.read().clone()
    }

    /// Transition state based on event
    pub fn transition(&self, event: RunEvent) -> HarnessResult<RunState> {
        let mut state = self.state.write();

        let new_state = match (&*state, &event) {
            (RunState::Configuring, RunEvent::Configured) => RunState::PipelineBuilding,

            (RunState::PipelineBuilding, RunEvent::Started) => RunState::Running,

            (RunState::Running, RunEvent::Waiting) => RunState::AwaitingCompletion,

            (RunState::AwaitingCompletion, RunEvent::BudgetReached) => RunState::Judging,

            (RunState::Judging, RunEvent::Judged { passed }) => RunState::Done { passed: *passed },

            // Any fault before the verdict ends the run
            (current, RunEvent::Fault { reason }) if !current.is_terminal() => RunState::Failed {
                error: reason.clone(),
            },

            // Invalid transition
            _ => {
                return Err(HarnessError::InvalidStateTransition(format!(
                    "Cannot handle {:?} in state {:?}",
                    event, *state
                )));
            }
        };

        tracing::info!(from = %*state, to = %new_state, "Run state changed");
        *state = new_state.clone();
        Ok(new_state)
    }
}
