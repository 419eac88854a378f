use crate::packet::types::{Ipv4Header, Packet, UdpHeader, DIGEST_LEN, IPPROTO_UDP};
use blake3::Hasher;
use serde::Serialize;

/// Outcome of re-computing every integrity code on a received packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntegrityStatus {
    pub header_ok: bool,
    pub datagram_ok: bool,
    pub digest_ok: bool,
}

impl IntegrityStatus {
    pub fn is_intact(&self) -> bool {
        self.header_ok && self.datagram_ok && self.digest_ok
    }
}

/// RFC 1071 one's-complement sum that tolerates odd-length slices being fed
/// one after another.
#[derive(Default)]
struct InternetChecksum {
    sum: u64,
    pending: Option<u8>,
}

impl InternetChecksum {
    fn update(&mut self, mut data: &[u8]) {
        if let Some(hi) = self.pending.take() {
            match data.split_first() {
                Some((lo, rest)) => {
                    self.sum += u16::from_be_bytes([hi, *lo]) as u64;
                    data = rest;
                }
                None => {
                    self.pending = Some(hi);
                    return;
                }
            }
        }

        let mut words = data.chunks_exact(2);
        for word in &mut words {
            self.sum += u16::from_be_bytes([word[0], word[1]]) as u64;
        }
        if let [odd] = words.remainder() {
            self.pending = Some(*odd);
        }
    }

    fn finish(mut self) -> u16 {
        if let Some(hi) = self.pending.take() {
            self.sum += u16::from_be_bytes([hi, 0]) as u64;
        }
        while self.sum >> 16 != 0 {
            self.sum = (self.sum & 0xFFFF) + (self.sum >> 16);
        }
        !(self.sum as u16)
    }
}

/// Deterministic stamping and checking of the integrity codes a test packet carries:
/// the IPv4 header checksum, the UDP checksum and a BLAKE3 digest of both
/// headers written to the front of the payload.
pub struct IntegrityOracle;

impl IntegrityOracle {
    /// IPv4 header checksum over the header with its checksum field zeroed
    pub fn ipv4_checksum(ipv4: &Ipv4Header) -> u16 {
        let mut hdr = *ipv4;
        hdr.checksum = 0;
        let mut acc = InternetChecksum::default();
        acc.update(&hdr.to_bytes());
        acc.finish()
    }

    /// UDP checksum including the IPv4 pseudo-header
    pub fn udp_checksum(ipv4: &Ipv4Header, udp: &UdpHeader, payload: &[u8]) -> u16 {
        let mut hdr = *udp;
        hdr.checksum = 0;

        let mut acc = InternetChecksum::default();
        acc.update(&ipv4.src_addr.octets());
        acc.update(&ipv4.dst_addr.octets());
        acc.update(&[0, IPPROTO_UDP]);
        acc.update(&udp.length.to_be_bytes());
        acc.update(&hdr.to_bytes());
        acc.update(payload);

        match acc.finish() {
            // zero means "no checksum" on the wire
            0 => 0xFFFF,
            sum => sum,
        }
    }

    /// Digest of both headers with checksum fields zeroed
    pub fn header_digest(ipv4: &Ipv4Header, udp: &UdpHeader) -> [u8; DIGEST_LEN] {
        let mut ip = *ipv4;
        ip.checksum = 0;
        let mut dgram = *udp;
        dgram.checksum = 0;

        let mut hasher = Hasher::new();
        hasher.update(&ip.to_bytes());
        hasher.update(&dgram.to_bytes());

        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&hasher.finalize().as_bytes()[..DIGEST_LEN]);
        out
    }

    /// Write every integrity code into the packet. Order matters: the digest is
    /// part of the payload the UDP checksum covers.
    pub fn stamp(packet: &mut Packet) {
        let digest = Self::header_digest(&packet.ipv4, &packet.udp);
        packet.payload[..DIGEST_LEN].copy_from_slice(&digest);

        packet.ipv4.checksum = Self::ipv4_checksum(&packet.ipv4);
        packet.udp.checksum = Self::udp_checksum(&packet.ipv4, &packet.udp, &packet.payload);
    }

    /// Recompute every code and report which ones match
    pub fn inspect(packet: &Packet) -> IntegrityStatus {
        if !packet.is_ipv4_udp() || packet.payload.len() < DIGEST_LEN {
            return IntegrityStatus {
                header_ok: false,
                datagram_ok: false,
                digest_ok: false,
            };
        }

        let digest = Self::header_digest(&packet.ipv4, &packet.udp);

        IntegrityStatus {
            header_ok: Self::ipv4_checksum(&packet.ipv4) == packet.ipv4.checksum,
            datagram_ok: Self::udp_checksum(&packet.ipv4, &packet.udp, &packet.payload)
                == packet.udp.checksum,
            digest_ok: packet.payload[..DIGEST_LEN] == digest,
        }
    }

    pub fn check(packet: &Packet) -> bool {
        Self::inspect(packet).is_intact()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn stamped(payload_size: usize, tag: u16) -> Packet {
        let mut pkt = Packet::new_ipv4_udp(payload_size).unwrap();
        pkt.ipv4.src_addr = Ipv4Addr::new(10, 0, 0, 1);
        pkt.ipv4.dst_addr = Ipv4Addr::new(10, 0, 0, 2);
        pkt.udp.src_port = 4000;
        pkt.set_tag(tag);
        for (i, b) in pkt.payload.iter_mut().enumerate() {
            *b = i as u8;
        }
        IntegrityOracle::stamp(&mut pkt);
        pkt
    }

    #[test]
    fn test_known_ipv4_checksum() {
        // Classic worked example from RFC 1071 discussions
        let hdr = Ipv4Header {
            version_ihl: 0x45,
            tos: 0,
            total_length: 0x0073,
            identification: 0,
            flags_fragment: 0x4000,
            ttl: 0x40,
            protocol: 0x11,
            checksum: 0,
            src_addr: Ipv4Addr::new(192, 168, 0, 1),
            dst_addr: Ipv4Addr::new(192, 168, 0, 199),
        };
        assert_eq!(IntegrityOracle::ipv4_checksum(&hdr), 0xB861);
    }

    #[test]
    fn test_odd_chunks_match_contiguous() {
        let data: Vec<u8> = (0..33u8).collect();

        let mut whole = InternetChecksum::default();
        whole.update(&data);

        let mut split = InternetChecksum::default();
        split.update(&data[..5]);
        split.update(&data[5..6]);
        split.update(&[]);
        split.update(&data[6..]);

        assert_eq!(whole.finish(), split.finish());
    }

    #[test]
    fn test_stamp_then_check() {
        for size in [16, 17, 64, 1472] {
            let pkt = stamped(size, 111);
            assert!(IntegrityOracle::check(&pkt), "size {size}");
        }
    }

    #[test]
    fn test_stamp_is_deterministic() {
        assert_eq!(stamped(32, 333), stamped(32, 333));
    }

    #[test]
    fn test_every_single_byte_mutation_detected() {
        let pkt = stamped(40, 222);
        let frame = pkt.to_bytes();

        // MAC addresses are rewritten in flight and sit outside integrity coverage
        for idx in 12..frame.len() {
            for delta in [1u8, 0x80, 0xFF] {
                let mut corrupted = frame.clone();
                corrupted[idx] = corrupted[idx].wrapping_add(delta);
                let parsed = Packet::from_bytes(&corrupted).unwrap();
                assert!(
                    !IntegrityOracle::check(&parsed),
                    "mutation at byte {idx} (+{delta:#x}) went undetected"
                );
            }
        }
    }

    #[test]
    fn test_mac_rewrite_keeps_integrity() {
        let mut pkt = stamped(16, 111);
        pkt.ether.dst = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert!(IntegrityOracle::check(&pkt));
    }

    #[test]
    fn test_inspect_reports_failed_code() {
        let mut pkt = stamped(16, 111);
        pkt.payload[0] ^= 0x01;

        let status = IntegrityOracle::inspect(&pkt);
        assert!(status.header_ok);
        assert!(!status.datagram_ok);
        assert!(!status.digest_ok);
        assert!(!status.is_intact());
    }

    #[test]
    fn test_non_udp_is_never_intact() {
        let mut pkt = stamped(16, 111);
        pkt.ether.ether_type = crate::packet::types::ETHER_TYPE_ARP;
        assert!(!IntegrityOracle::check(&pkt));
    }
}
