use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Configuring,
    PipelineBuilding,
    Running,
    AwaitingCompletion,
    Judging,
    Done { passed: bool },
    Failed { error: String },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done { .. } | RunState::Failed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunState::Configuring => "configuring",
            RunState::PipelineBuilding => "pipeline-building",
            RunState::Running => "running",
            RunState::AwaitingCompletion => "awaiting-completion",
            RunState::Judging => "judging",
            RunState::Done { .. } => "done",
            RunState::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub enum RunEvent {
    /// Mode resolved and rule set loaded
    Configured,
    /// Pipeline wired and started, run clock marked
    Started,
    /// Orchestrator is now blocked on the completion rendezvous
    Waiting,
    BudgetReached,
    Judged { passed: bool },
    Fault { reason: String },
}
