use crate::mode::{TagPorts, TestMode};
use crate::packet::MacEntry;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Logical port numbers of the two observed lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    /// Port the generator and the first lane egress on
    pub outport1: u16,
    pub outport2: u16,
    /// Port labels used in the report
    pub inport1: u16,
    pub inport2: u16,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            outport1: 0,
            outport2: 1,
            inport1: 0,
            inport2: 1,
        }
    }
}

/// Weights for partition mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    pub first: u32,
    pub second: u32,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            first: 100,
            second: 1000,
            seed: None,
        }
    }
}

/// Everything one run needs, fixed before the pipeline is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub mode: TestMode,

    /// Target packets per second (0 = unlimited)
    pub speed: u64,

    /// Packet budget
    pub number: u64,

    pub warmup_ms: u64,

    /// Minimum delivery percentage; the run must exceed it
    pub passed_limit: u64,

    /// Tolerance override; the mode default applies when unset
    pub epsilon: Option<u32>,

    /// First lane share override
    pub expected_percent: Option<u32>,

    pub payload_size: usize,

    /// Rule file; each rule-driven mode has a default
    pub rules: Option<PathBuf>,

    pub ports: PortConfig,
    pub tags: TagPorts,
    pub partition: PartitionConfig,

    /// MAC rewrite table keyed by output port
    pub macs: Vec<MacEntry>,

    /// Per-flow queue depth inside the pipeline
    pub channel_capacity: usize,

    /// Give up waiting for the budget after this long
    pub deadline_ms: Option<u64>,

    pub metrics_addr: Option<SocketAddr>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            mode: TestMode::Separate,
            speed: 1_000_000,
            number: 10_000_000,
            warmup_ms: 10_000,
            passed_limit: 85,
            epsilon: None,
            expected_percent: None,
            payload_size: 16,
            rules: None,
            ports: PortConfig::default(),
            tags: TagPorts::default(),
            partition: PartitionConfig::default(),
            macs: Vec::new(),
            channel_capacity: 4096,
            deadline_ms: None,
            metrics_addr: None,
        }
    }
}
