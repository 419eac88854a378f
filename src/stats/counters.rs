use crate::classifier::Lane;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Sticky pass flag: starts set and can only ever be cleared
#[derive(Debug)]
pub struct PassFlag(AtomicBool);

impl Default for PassFlag {
    fn default() -> Self {
        Self(AtomicBool::new(true))
    }
}

impl PassFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true for the call that actually flipped the flag
    pub fn clear(&self) -> bool {
        self.0
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Counters shared by the generator and every lane verifier for one run
#[derive(Debug, Default)]
pub struct Stats {
    generated: AtomicU64,
    counted_sent: AtomicU64,
    received: AtomicU64,
    first_lane: AtomicU64,
    second_lane: AtomicU64,
    broken: AtomicU64,
    misrouted: AtomicU64,
    passed: PassFlag,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a generated packet; returns its zero-based sequence number
    pub fn record_generated(&self) -> u64 {
        self.generated.fetch_add(1, Ordering::Relaxed)
    }

    pub fn record_counted_sent(&self) {
        self.counted_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a packet observed after warm-up; returns the new total
    pub fn record_received(&self) -> u64 {
        self.received.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn record_lane(&self, lane: Lane) {
        match lane {
            Lane::First => self.first_lane.fetch_add(1, Ordering::Relaxed),
            Lane::Second => self.second_lane.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_broken(&self) {
        self.broken.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a misrouted packet and clear the pass flag for good
    pub fn record_misrouted(&self) {
        self.misrouted.fetch_add(1, Ordering::Relaxed);
        self.passed.clear();
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Acquire)
    }

    pub fn pass_flag(&self) -> &PassFlag {
        &self.passed
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            generated: self.generated.load(Ordering::Relaxed),
            sent: self.counted_sent.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Acquire),
            first_lane: self.first_lane.load(Ordering::Relaxed),
            second_lane: self.second_lane.load(Ordering::Relaxed),
            broken: self.broken.load(Ordering::Relaxed),
            misrouted: self.misrouted.load(Ordering::Relaxed),
            pass_flag: self.passed.is_set(),
        }
    }
}

/// Point-in-time copy of every counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Every packet the generator produced, warm-up included
    pub generated: u64,
    /// Packets generated after warm-up while the budget was still open
    pub sent: u64,
    /// Raw receive-side total driving the budget
    pub received: u64,
    pub first_lane: u64,
    pub second_lane: u64,
    pub broken: u64,
    pub misrouted: u64,
    pub pass_flag: bool,
}

impl Snapshot {
    pub fn delivered(&self) -> u64 {
        self.first_lane + self.second_lane
    }
}
