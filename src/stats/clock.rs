use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Start timestamp plus the warm-up window every stage gates on.
///
/// Until [`RunClock::mark_started`] is called the run counts as warming up.
#[derive(Debug)]
pub struct RunClock {
    started: OnceLock<Instant>,
    warmup: Duration,
}

impl RunClock {
    pub fn new(warmup: Duration) -> Self {
        Self {
            started: OnceLock::new(),
            warmup,
        }
    }

    /// Record the start timestamp; later calls keep the first one
    pub fn mark_started(&self) -> Instant {
        *self.started.get_or_init(Instant::now)
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.started.get().map(|start| start.elapsed())
    }

    pub fn warmup(&self) -> Duration {
        self.warmup
    }

    pub fn in_warmup(&self) -> bool {
        match self.elapsed() {
            Some(elapsed) => elapsed < self.warmup,
            None => true,
        }
    }
}
