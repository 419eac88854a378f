use crate::mode::error::ModeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    /// Binary accept/reject on the rule set
    Separate,
    /// Multi-way split on the rule set, output 0 dropped
    Split,
    /// Weighted random partition, independent of packet content
    Partition,
}

impl TestMode {
    pub const ALL: [TestMode; 3] = [TestMode::Separate, TestMode::Split, TestMode::Partition];

    /// Share of traffic the first lane should see
    pub fn expected_percent(&self) -> u32 {
        match self {
            TestMode::Separate => 33,
            TestMode::Split => 20,
            TestMode::Partition => 10,
        }
    }

    /// Empirically tuned tolerance per mode
    pub fn default_epsilon(&self) -> u32 {
        match self {
            TestMode::Separate => 2,
            TestMode::Split => 4,
            TestMode::Partition => 3,
        }
    }

    pub fn requires_rules(&self) -> bool {
        !matches!(self, TestMode::Partition)
    }

    pub fn default_rules_path(&self) -> Option<&'static str> {
        match self {
            TestMode::Separate => Some("rules/separate.conf"),
            TestMode::Split => Some("rules/split.conf"),
            TestMode::Partition => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TestMode::Separate => "separate",
            TestMode::Split => "split",
            TestMode::Partition => "partition",
        }
    }
}

impl FromStr for TestMode {
    type Err = ModeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "0" | "separate" => Ok(TestMode::Separate),
            "1" | "split" => Ok(TestMode::Split),
            "2" | "partition" => Ok(TestMode::Partition),
            other => Err(ModeError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UDP destination ports used as lane-discriminating tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagPorts {
    pub group1: u16,
    pub group2: u16,
    pub group3: u16,
}

impl Default for TagPorts {
    fn default() -> Self {
        Self {
            group1: 111,
            group2: 222,
            group3: 333,
        }
    }
}
