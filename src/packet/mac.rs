use crate::classifier::Lane;
use crate::packet::types::{MacAddr, Packet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of the configured MAC rewrite table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacEntry {
    pub port: u16,
    pub src: MacAddr,
    pub dst: MacAddr,
}

/// Per-output-port Ethernet address fix-up applied before a packet egresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MacRewrite {
    #[default]
    Passthrough,
    Rewrite { src: MacAddr, dst: MacAddr },
}

impl MacRewrite {
    pub fn apply(&self, packet: &mut Packet) {
        if let MacRewrite::Rewrite { src, dst } = self {
            packet.ether.src = *src;
            packet.ether.dst = *dst;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MacTable {
    entries: HashMap<u16, MacRewrite>,
}

impl MacTable {
    pub fn from_entries(entries: &[MacEntry]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|e| {
                    (
                        e.port,
                        MacRewrite::Rewrite {
                            src: e.src,
                            dst: e.dst,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Ports without an entry leave addresses untouched
    pub fn resolve(&self, port: u16) -> MacRewrite {
        self.entries.get(&port).copied().unwrap_or_default()
    }

    /// Resolve the generator egress rewrite and the per-lane rewrites once, up front
    pub fn lane_effects(&self, outport1: u16, outport2: u16) -> LaneEffects {
        LaneEffects {
            egress: self.resolve(outport1),
            first: self.resolve(outport1),
            second: self.resolve(outport2),
        }
    }
}

/// MAC rewrites keyed by logical output lane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneEffects {
    pub egress: MacRewrite,
    first: MacRewrite,
    second: MacRewrite,
}

impl LaneEffects {
    pub fn for_lane(&self, lane: Lane) -> MacRewrite {
        match lane {
            Lane::First => self.first,
            Lane::Second => self.second,
        }
    }
}
