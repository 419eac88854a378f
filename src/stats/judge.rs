use crate::mode::{Bounds, ModeProfile};
use crate::stats::counters::Snapshot;
use crate::stats::error::{StatsError, StatsResult};
use serde::Serialize;
use std::fmt;

/// A single failed pass condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    PassFlagCleared { misrouted: u64 },
    FirstLaneOutOfBounds { percent: u32, bounds: Bounds },
    SecondLaneOutOfBounds { percent: u32, bounds: Bounds },
    DeliveryTooLow { percent: u64, limit: u64 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::PassFlagCleared { misrouted } => {
                write!(f, "{misrouted} packet(s) arrived on the wrong lane")
            }
            Violation::FirstLaneOutOfBounds { percent, bounds } => write!(
                f,
                "first lane share {percent}% outside [{}, {}]",
                bounds.low, bounds.high
            ),
            Violation::SecondLaneOutOfBounds { percent, bounds } => write!(
                f,
                "second lane share {percent}% outside [{}, {}]",
                bounds.low, bounds.high
            ),
            Violation::DeliveryTooLow { percent, limit } => {
                write!(f, "delivery ratio {percent}% not above {limit}%")
            }
        }
    }
}

/// Ratios derived from a final snapshot plus every violated condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Judgement {
    pub snapshot: Snapshot,
    pub received: u64,
    pub first_percent: u32,
    pub second_percent: u32,
    pub delivery_percent: u64,
    pub first_bounds: Bounds,
    pub second_bounds: Bounds,
    pub passed_limit: u64,
    pub violations: Vec<Violation>,
}

impl Judgement {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Apply the tolerance bounds and the delivery floor to a final snapshot.
///
/// Percentages use integer division. A snapshot with nothing counted as sent
/// is a harness fault rather than a zero ratio.
pub fn judge(snapshot: &Snapshot, profile: &ModeProfile, passed_limit: u64) -> StatsResult<Judgement> {
    if snapshot.sent == 0 {
        return Err(StatsError::NothingSent);
    }

    let received = snapshot.delivered();
    let (first_percent, second_percent) = if received == 0 {
        (0, 0)
    } else {
        (
            (snapshot.first_lane * 100 / received) as u32,
            (snapshot.second_lane * 100 / received) as u32,
        )
    };
    let delivery_percent = received * 100 / snapshot.sent;

    let first_bounds = profile.first_lane_bounds();
    let second_bounds = profile.second_lane_bounds();

    let mut violations = Vec::new();
    if !snapshot.pass_flag {
        violations.push(Violation::PassFlagCleared {
            misrouted: snapshot.misrouted,
        });
    }
    if !first_bounds.contains(first_percent) {
        violations.push(Violation::FirstLaneOutOfBounds {
            percent: first_percent,
            bounds: first_bounds,
        });
    }
    if !second_bounds.contains(second_percent) {
        violations.push(Violation::SecondLaneOutOfBounds {
            percent: second_percent,
            bounds: second_bounds,
        });
    }
    if delivery_percent <= passed_limit {
        violations.push(Violation::DeliveryTooLow {
            percent: delivery_percent,
            limit: passed_limit,
        });
    }

    Ok(Judgement {
        snapshot: *snapshot,
        received,
        first_percent,
        second_percent,
        delivery_percent,
        first_bounds,
        second_bounds,
        passed_limit,
        violations,
    })
}
