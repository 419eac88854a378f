use crate::classifier::Lane;
use crate::metrics;
use crate::mode::ModeProfile;
use crate::packet::{IntegrityOracle, Packet, SkipPredicate};
use crate::rendezvous::Completion;
use crate::stats::{RunClock, Stats};
use std::sync::Arc;

/// What a lane verifier did with one packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneOutcome {
    /// Arrived before warm-up ended, nothing counted
    WarmingUp,
    /// Control traffic, nothing counted
    Skipped,
    /// Budget already used up; the packet that crossed it signalled completion
    OverBudget,
    Broken,
    Misrouted,
    Accepted,
}

/// Shared run state every lane verifier works against
#[derive(Clone)]
pub struct LaneContext {
    pub profile: Arc<ModeProfile>,
    pub stats: Arc<Stats>,
    pub clock: Arc<RunClock>,
    pub completion: Arc<Completion>,
    pub skip: Arc<dyn SkipPredicate>,
    pub budget: u64,
}

pub struct LaneVerifier {
    lane: Lane,
    ctx: LaneContext,
}

impl LaneVerifier {
    pub fn new(lane: Lane, ctx: LaneContext) -> Self {
        Self { lane, ctx }
    }

    pub fn lane(&self) -> Lane {
        self.lane
    }

    pub fn verify(&self, packet: &Packet) -> LaneOutcome {
        if self.ctx.clock.in_warmup() {
            return LaneOutcome::WarmingUp;
        }
        if self.ctx.skip.should_skip(packet) {
            return LaneOutcome::Skipped;
        }

        let total = self.ctx.stats.record_received();
        if total > self.ctx.budget {
            // only the increment that moved the total past the budget signals
            if total == self.ctx.budget + 1 && self.ctx.completion.signal() {
                tracing::info!(lane = %self.lane, budget = self.ctx.budget, "Packet budget reached");
            }
            return LaneOutcome::OverBudget;
        }

        let status = IntegrityOracle::inspect(packet);
        if !status.is_intact() {
            tracing::debug!(lane = %self.lane, ?status, "Broken packet");
            self.ctx.stats.record_broken();
            metrics::record_packet_broken(self.lane);
            return LaneOutcome::Broken;
        }

        if !self.ctx.profile.accepts(self.lane, packet.tag()) {
            tracing::warn!(
                lane = %self.lane,
                tag = packet.tag(),
                mode = %self.ctx.profile.mode(),
                "Unexpected packet on {}, test marked as failed",
                self.lane
            );
            self.ctx.stats.record_misrouted();
            metrics::record_packet_misrouted(self.lane);
            return LaneOutcome::Misrouted;
        }

        self.ctx.stats.record_lane(self.lane);
        metrics::record_packet_verified(self.lane);
        LaneOutcome::Accepted
    }
}
