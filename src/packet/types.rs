use crate::packet::error::{PacketError, PacketResult};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

pub const ETHER_TYPE_IPV4: u16 = 0x0800;
pub const ETHER_TYPE_ARP: u16 = 0x0806;

pub const IPPROTO_ICMP: u8 = 1;
pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;

pub const ETHER_HEADER_LEN: usize = 14;
pub const IPV4_HEADER_LEN: usize = 20;
pub const UDP_HEADER_LEN: usize = 8;

/// Bytes at the front of the payload reserved for the header digest
pub const DIGEST_LEN: usize = 16;

/// Largest UDP payload that fits a 1500-byte MTU
pub const MAX_PAYLOAD: usize = 1500 - IPV4_HEADER_LEN - UDP_HEADER_LEN;

const DEFAULT_TTL: u8 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddr(pub [u8; 6]);

impl FromStr for MacAddr {
    type Err = PacketError;

    fn from_str(s: &str) -> PacketResult<Self> {
        let mut octets = [0u8; 6];
        let mut parts = s.trim().split(':');

        for octet in octets.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| PacketError::InvalidMac(s.to_string()))?;
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| PacketError::InvalidMac(s.to_string()))?;
        }

        if parts.next().is_some() {
            return Err(PacketError::InvalidMac(s.to_string()));
        }

        Ok(MacAddr(octets))
    }
}

impl TryFrom<String> for MacAddr {
    type Error = PacketError;

    fn try_from(value: String) -> PacketResult<Self> {
        value.parse()
    }
}

impl From<MacAddr> for String {
    fn from(mac: MacAddr) -> Self {
        mac.to_string()
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EtherHeader {
    pub dst: MacAddr,
    pub src: MacAddr,
    pub ether_type: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    pub version_ihl: u8,
    pub tos: u8,
    pub total_length: u16,
    pub identification: u16,
    pub flags_fragment: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
}

impl Ipv4Header {
    pub fn to_bytes(&self) -> [u8; IPV4_HEADER_LEN] {
        let mut out = [0u8; IPV4_HEADER_LEN];
        out[0] = self.version_ihl;
        out[1] = self.tos;
        out[2..4].copy_from_slice(&self.total_length.to_be_bytes());
        out[4..6].copy_from_slice(&self.identification.to_be_bytes());
        out[6..8].copy_from_slice(&self.flags_fragment.to_be_bytes());
        out[8] = self.ttl;
        out[9] = self.protocol;
        out[10..12].copy_from_slice(&self.checksum.to_be_bytes());
        out[12..16].copy_from_slice(&self.src_addr.octets());
        out[16..20].copy_from_slice(&self.dst_addr.octets());
        out
    }

    fn from_bytes(b: &[u8]) -> Self {
        Self {
            version_ihl: b[0],
            tos: b[1],
            total_length: u16::from_be_bytes([b[2], b[3]]),
            identification: u16::from_be_bytes([b[4], b[5]]),
            flags_fragment: u16::from_be_bytes([b[6], b[7]]),
            ttl: b[8],
            protocol: b[9],
            checksum: u16::from_be_bytes([b[10], b[11]]),
            src_addr: Ipv4Addr::new(b[12], b[13], b[14], b[15]),
            dst_addr: Ipv4Addr::new(b[16], b[17], b[18], b[19]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub length: u16,
    pub checksum: u16,
}

impl UdpHeader {
    pub fn to_bytes(&self) -> [u8; UDP_HEADER_LEN] {
        let mut out = [0u8; UDP_HEADER_LEN];
        out[0..2].copy_from_slice(&self.src_port.to_be_bytes());
        out[2..4].copy_from_slice(&self.dst_port.to_be_bytes());
        out[4..6].copy_from_slice(&self.length.to_be_bytes());
        out[6..8].copy_from_slice(&self.checksum.to_be_bytes());
        out
    }

    fn from_bytes(b: &[u8]) -> Self {
        Self {
            src_port: u16::from_be_bytes([b[0], b[1]]),
            dst_port: u16::from_be_bytes([b[2], b[3]]),
            length: u16::from_be_bytes([b[4], b[5]]),
            checksum: u16::from_be_bytes([b[6], b[7]]),
        }
    }
}

/// A single Ethernet/IPv4/UDP frame owned by whichever stage is handling it.
///
/// The UDP destination port doubles as the lane-discriminating tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub ether: EtherHeader,
    pub ipv4: Ipv4Header,
    pub udp: UdpHeader,
    pub payload: BytesMut,
}

impl Packet {
    /// Build an empty IPv4/UDP packet with a zeroed payload of `payload_size` bytes.
    pub fn new_ipv4_udp(payload_size: usize) -> PacketResult<Self> {
        if payload_size > MAX_PAYLOAD {
            return Err(PacketError::PayloadTooLarge {
                size: payload_size,
                max: MAX_PAYLOAD,
            });
        }
        if payload_size < DIGEST_LEN {
            return Err(PacketError::PayloadTooSmall {
                size: payload_size,
                min: DIGEST_LEN,
            });
        }

        let udp_len = (UDP_HEADER_LEN + payload_size) as u16;

        Ok(Self {
            ether: EtherHeader {
                dst: MacAddr::default(),
                src: MacAddr::default(),
                ether_type: ETHER_TYPE_IPV4,
            },
            ipv4: Ipv4Header {
                version_ihl: 0x45,
                tos: 0,
                total_length: IPV4_HEADER_LEN as u16 + udp_len,
                identification: 0,
                flags_fragment: 0,
                ttl: DEFAULT_TTL,
                protocol: IPPROTO_UDP,
                checksum: 0,
                src_addr: Ipv4Addr::UNSPECIFIED,
                dst_addr: Ipv4Addr::UNSPECIFIED,
            },
            udp: UdpHeader {
                src_port: 0,
                dst_port: 0,
                length: udp_len,
                checksum: 0,
            },
            payload: BytesMut::zeroed(payload_size),
        })
    }

    /// Lane-discriminating tag carried by the packet
    pub fn tag(&self) -> u16 {
        self.udp.dst_port
    }

    pub fn set_tag(&mut self, tag: u16) {
        self.udp.dst_port = tag;
    }

    pub fn is_ipv4(&self) -> bool {
        self.ether.ether_type == ETHER_TYPE_IPV4
    }

    pub fn is_ipv4_udp(&self) -> bool {
        self.ether.ether_type == ETHER_TYPE_IPV4 && self.ipv4.protocol == IPPROTO_UDP
    }

    /// Serialize to wire bytes (network byte order)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(ETHER_HEADER_LEN + IPV4_HEADER_LEN + UDP_HEADER_LEN + self.payload.len());
        out.extend_from_slice(&self.ether.dst.0);
        out.extend_from_slice(&self.ether.src.0);
        out.extend_from_slice(&self.ether.ether_type.to_be_bytes());
        out.extend_from_slice(&self.ipv4.to_bytes());
        out.extend_from_slice(&self.udp.to_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parse wire bytes produced by [`Packet::to_bytes`]. Field values are taken
    /// as-is; use the integrity oracle to decide whether they are consistent.
    pub fn from_bytes(frame: &[u8]) -> PacketResult<Self> {
        let needed = ETHER_HEADER_LEN + IPV4_HEADER_LEN + UDP_HEADER_LEN;
        if frame.len() < needed {
            return Err(PacketError::Truncated {
                needed,
                actual: frame.len(),
            });
        }

        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        dst.copy_from_slice(&frame[0..6]);
        src.copy_from_slice(&frame[6..12]);
        let ether_type = u16::from_be_bytes([frame[12], frame[13]]);

        let ip_start = ETHER_HEADER_LEN;
        let udp_start = ip_start + IPV4_HEADER_LEN;
        let payload_start = udp_start + UDP_HEADER_LEN;

        Ok(Self {
            ether: EtherHeader {
                dst: MacAddr(dst),
                src: MacAddr(src),
                ether_type,
            },
            ipv4: Ipv4Header::from_bytes(&frame[ip_start..udp_start]),
            udp: UdpHeader::from_bytes(&frame[udp_start..payload_start]),
            payload: BytesMut::from(&frame[payload_start..]),
        })
    }
}
