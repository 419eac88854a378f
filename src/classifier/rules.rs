//! L3 access-control rules in the plain-text "ORIG" layout:
//!
//! ```text
//! # Source address, Destination address, L4 protocol ID, Source port, Destination port, Output port
//! ANY              ANY                  udp             ANY          111               Accept
//! 10.0.0.0/8       ANY                  ANY             ANY          1000:2000         2
//! ```
//!
//! Rules are evaluated top to bottom and the first match decides.

use crate::classifier::error::{ClassifierError, ClassifierResult};
use crate::packet::types::{Packet, IPPROTO_ICMP, IPPROTO_TCP, IPPROTO_UDP};
use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;

const FIELDS_PER_RULE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMatch {
    Any,
    Prefix { network: u32, mask: u32 },
}

impl AddrMatch {
    fn matches(&self, addr: Ipv4Addr) -> bool {
        match self {
            AddrMatch::Any => true,
            AddrMatch::Prefix { network, mask } => u32::from(addr) & mask == *network,
        }
    }

    fn parse(field: &str) -> Result<Self, String> {
        if field.eq_ignore_ascii_case("ANY") {
            return Ok(AddrMatch::Any);
        }

        let (addr, len) = match field.split_once('/') {
            Some((addr, len)) => {
                let len: u32 = len
                    .parse()
                    .map_err(|_| format!("invalid prefix length in '{field}'"))?;
                if len > 32 {
                    return Err(format!("prefix length {len} out of range"));
                }
                (addr, len)
            }
            None => (field, 32),
        };

        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| format!("invalid IPv4 address '{addr}'"))?;
        let mask = if len == 0 { 0 } else { u32::MAX << (32 - len) };

        Ok(AddrMatch::Prefix {
            network: u32::from(addr) & mask,
            mask,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtoMatch {
    Any,
    Proto(u8),
}

impl ProtoMatch {
    fn parse(field: &str) -> Result<Self, String> {
        match field.to_ascii_lowercase().as_str() {
            "any" => Ok(ProtoMatch::Any),
            "udp" => Ok(ProtoMatch::Proto(IPPROTO_UDP)),
            "tcp" => Ok(ProtoMatch::Proto(IPPROTO_TCP)),
            "icmp" => Ok(ProtoMatch::Proto(IPPROTO_ICMP)),
            other => Err(format!("unknown protocol '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub min: u16,
    pub max: u16,
}

impl PortRange {
    pub const ANY: PortRange = PortRange {
        min: 0,
        max: u16::MAX,
    };

    fn contains(&self, port: u16) -> bool {
        (self.min..=self.max).contains(&port)
    }

    fn parse(field: &str) -> Result<Self, String> {
        if field.eq_ignore_ascii_case("ANY") {
            return Ok(PortRange::ANY);
        }

        let parse_port =
            |s: &str| s.parse::<u16>().map_err(|_| format!("invalid port '{s}'"));

        let (min, max) = match field.split_once(':') {
            Some((lo, hi)) => (parse_port(lo)?, parse_port(hi)?),
            None => {
                let port = parse_port(field)?;
                (port, port)
            }
        };

        if min > max {
            return Err(format!("empty port range '{field}'"));
        }
        Ok(PortRange { min, max })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    Accept,
    Reject,
    Output(usize),
}

impl RuleAction {
    fn parse(field: &str) -> Result<Self, String> {
        if field.eq_ignore_ascii_case("Accept") {
            Ok(RuleAction::Accept)
        } else if field.eq_ignore_ascii_case("Reject") {
            Ok(RuleAction::Reject)
        } else {
            field
                .parse::<usize>()
                .map(RuleAction::Output)
                .map_err(|_| format!("invalid output '{field}'"))
        }
    }

    fn output_index(&self) -> usize {
        match self {
            RuleAction::Accept => 1,
            RuleAction::Reject => 0,
            RuleAction::Output(n) => *n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub src_addr: AddrMatch,
    pub dst_addr: AddrMatch,
    pub proto: ProtoMatch,
    pub src_port: PortRange,
    pub dst_port: PortRange,
    pub action: RuleAction,
}

impl Rule {
    pub fn matches(&self, packet: &Packet) -> bool {
        let proto_ok = match self.proto {
            ProtoMatch::Any => true,
            ProtoMatch::Proto(p) => packet.ipv4.protocol == p,
        };

        proto_ok
            && self.src_addr.matches(packet.ipv4.src_addr)
            && self.dst_addr.matches(packet.ipv4.dst_addr)
            && self.src_port.contains(packet.udp.src_port)
            && self.dst_port.contains(packet.udp.dst_port)
    }
}

/// Immutable, ordered rule table shared read-only by every classifier call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn load(path: &Path) -> ClassifierResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ClassifierError::RuleFile {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn first_match(&self, packet: &Packet) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(packet))
    }

    /// Binary decision: accepted unless the first matching rule rejects it
    /// (or sends it to output 0). Unmatched packets are rejected.
    pub fn permit(&self, packet: &Packet) -> bool {
        self.first_match(packet)
            .map(|rule| rule.action.output_index() != 0)
            .unwrap_or(false)
    }

    /// Output index of the first matching rule; unmatched packets go to 0
    pub fn output(&self, packet: &Packet) -> usize {
        self.first_match(packet)
            .map(|rule| rule.action.output_index())
            .unwrap_or(0)
    }
}

impl FromStr for RuleSet {
    type Err = ClassifierError;

    fn from_str(text: &str) -> ClassifierResult<Self> {
        let mut rules = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let syntax = |reason: String| ClassifierError::Syntax {
                line: idx + 1,
                reason,
            };

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != FIELDS_PER_RULE {
                return Err(syntax(format!(
                    "expected {FIELDS_PER_RULE} fields, found {}",
                    fields.len()
                )));
            }

            rules.push(Rule {
                src_addr: AddrMatch::parse(fields[0]).map_err(syntax)?,
                dst_addr: AddrMatch::parse(fields[1]).map_err(syntax)?,
                proto: ProtoMatch::parse(fields[2]).map_err(syntax)?,
                src_port: PortRange::parse(fields[3]).map_err(syntax)?,
                dst_port: PortRange::parse(fields[4]).map_err(syntax)?,
                action: RuleAction::parse(fields[5]).map_err(syntax)?,
            });
        }

        if rules.is_empty() {
            return Err(ClassifierError::EmptyRuleSet);
        }

        Ok(RuleSet { rules })
    }
}
