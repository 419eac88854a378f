//! Shared run counters and the pass/fail judgement computed from them.

pub mod clock;
pub mod counters;
pub mod error;
pub mod judge;
pub mod report;

pub use clock::RunClock;
pub use counters::{PassFlag, Snapshot, Stats};
pub use error::{StatsError, StatsResult};
pub use judge::{judge, Judgement, Violation};
pub use report::Report;
