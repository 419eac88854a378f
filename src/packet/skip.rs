use crate::packet::types::Packet;

/// Decides whether a packet is non-test control traffic that must be left out
/// of every measurement.
pub trait SkipPredicate: Send + Sync {
    fn should_skip(&self, packet: &Packet) -> bool;
}

/// Skips frames that do not carry IPv4 (ARP, LLDP and friends). Anything
/// inside an IPv4 frame is left for the integrity check to judge.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonTestTraffic;

impl SkipPredicate for NonTestTraffic {
    fn should_skip(&self, packet: &Packet) -> bool {
        !packet.is_ipv4()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverSkip;

impl SkipPredicate for NeverSkip {
    fn should_skip(&self, _packet: &Packet) -> bool {
        false
    }
}
