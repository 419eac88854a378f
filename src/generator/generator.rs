use crate::metrics;
use crate::mode::ModeProfile;
use crate::packet::{IntegrityOracle, MacRewrite, Packet, PacketResult};
use crate::stats::{RunClock, Stats};
use std::net::Ipv4Addr;
use std::sync::Arc;

const SRC_ADDR: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 1);
const DST_ADDR: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 2);
const SRC_PORT: u16 = 1234;

/// Synthesizes one test packet per call. Pacing is the pipeline's job.
pub struct Generator {
    profile: Arc<ModeProfile>,
    stats: Arc<Stats>,
    clock: Arc<RunClock>,
    egress: MacRewrite,
    payload_size: usize,
    budget: u64,
}

impl Generator {
    pub fn new(
        profile: Arc<ModeProfile>,
        stats: Arc<Stats>,
        clock: Arc<RunClock>,
        egress: MacRewrite,
        payload_size: usize,
        budget: u64,
    ) -> Self {
        Self {
            profile,
            stats,
            clock,
            egress,
            payload_size,
            budget,
        }
    }

    /// Build, tag, stamp and address the next packet.
    ///
    /// A packet only counts towards the sent total once warm-up is over and the
    /// receive side has not yet used up the budget, so the denominator freezes
    /// when measurement ends.
    pub fn generate(&self) -> PacketResult<Packet> {
        let mut packet = Packet::new_ipv4_udp(self.payload_size)?;
        packet.ipv4.src_addr = SRC_ADDR;
        packet.ipv4.dst_addr = DST_ADDR;
        packet.udp.src_port = SRC_PORT;

        let seq = self.stats.record_generated();
        packet.ipv4.identification = seq as u16;
        packet.set_tag(self.profile.tag_for(seq));

        IntegrityOracle::stamp(&mut packet);
        self.egress.apply(&mut packet);
        metrics::record_packet_generated();

        if !self.clock.in_warmup() && self.stats.received() < self.budget {
            self.stats.record_counted_sent();
        }

        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::TestMode;
    use crate::packet::{PacketError, MAX_PAYLOAD};
    use std::time::Duration;

    fn generator(mode: TestMode, warmup: Duration, budget: u64) -> (Generator, Arc<Stats>, Arc<RunClock>) {
        let stats = Arc::new(Stats::new());
        let clock = Arc::new(RunClock::new(warmup));
        let gen = Generator::new(
            Arc::new(ModeProfile::with_defaults(mode)),
            stats.clone(),
            clock.clone(),
            MacRewrite::Passthrough,
            16,
            budget,
        );
        (gen, stats, clock)
    }

    #[test]
    fn test_packets_are_intact_and_tagged() {
        let (gen, _, clock) = generator(TestMode::Separate, Duration::ZERO, 100);
        clock.mark_started();

        let tags: Vec<u16> = (0..6)
            .map(|_| {
                let pkt = gen.generate().unwrap();
                assert!(IntegrityOracle::check(&pkt));
                pkt.tag()
            })
            .collect();

        assert_eq!(tags, vec![111, 222, 333, 111, 222, 333]);
    }

    #[test]
    fn test_warmup_excludes_sent() {
        let (gen, stats, clock) = generator(TestMode::Split, Duration::from_secs(3600), 100);
        clock.mark_started();

        for _ in 0..50 {
            gen.generate().unwrap();
        }

        let snap = stats.snapshot();
        assert_eq!(snap.generated, 50);
        assert_eq!(snap.sent, 0);
    }

    #[test]
    fn test_sent_freezes_once_budget_reached() {
        let (gen, stats, clock) = generator(TestMode::Partition, Duration::ZERO, 3);
        clock.mark_started();

        gen.generate().unwrap();
        gen.generate().unwrap();
        for _ in 0..3 {
            stats.record_received();
        }
        gen.generate().unwrap();

        let snap = stats.snapshot();
        assert_eq!(snap.generated, 3);
        assert_eq!(snap.sent, 2);
    }

    #[test]
    fn test_egress_mac_applied() {
        let stats = Arc::new(Stats::new());
        let clock = Arc::new(RunClock::new(Duration::ZERO));
        let src = "02:00:00:00:00:0a".parse().unwrap();
        let dst = "02:00:00:00:00:0b".parse().unwrap();
        let gen = Generator::new(
            Arc::new(ModeProfile::with_defaults(TestMode::Separate)),
            stats,
            clock,
            MacRewrite::Rewrite { src, dst },
            16,
            10,
        );

        let pkt = gen.generate().unwrap();
        assert_eq!(pkt.ether.src, src);
        assert_eq!(pkt.ether.dst, dst);
        assert!(IntegrityOracle::check(&pkt));
    }

    #[test]
    fn test_oversized_payload_is_fatal() {
        let gen = Generator::new(
            Arc::new(ModeProfile::with_defaults(TestMode::Separate)),
            Arc::new(Stats::new()),
            Arc::new(RunClock::new(Duration::ZERO)),
            MacRewrite::Passthrough,
            MAX_PAYLOAD + 1,
            10,
        );

        assert!(matches!(gen.generate(), Err(PacketError::PayloadTooLarge { .. })));
    }
}
