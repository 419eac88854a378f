use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// One-shot rendezvous between the lane verifiers and the orchestrator.
///
/// Signalling is idempotent: only the first call has an effect. A signal sent
/// before anyone waits is not lost.
#[derive(Debug, Default)]
pub struct Completion {
    fired: AtomicBool,
    notify: Notify,
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true for the call that delivered the signal
    pub fn signal(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.notify.notify_one();
        true
    }

    pub fn is_signaled(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_signaled() {
                return;
            }
            notified.await;
        }
    }
}
