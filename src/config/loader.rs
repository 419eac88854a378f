use crate::config::error::{ConfigError, ConfigResult};
use crate::config::types::HarnessConfig;
use crate::mode::{ModeProfile, ModeResult, TestMode};
use crate::packet::{DIGEST_LEN, MAX_PAYLOAD};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command-line values that win over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub mode: Option<TestMode>,
    pub speed: Option<u64>,
    pub number: Option<u64>,
    pub warmup_ms: Option<u64>,
    pub passed_limit: Option<u64>,
    pub epsilon: Option<u32>,
    pub outport1: Option<u16>,
    pub outport2: Option<u16>,
    pub inport1: Option<u16>,
    pub inport2: Option<u16>,
    pub rules: Option<PathBuf>,
}

impl HarnessConfig {
    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        let config: HarnessConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Apply overrides, then re-validate the result
    pub fn apply(mut self, overrides: Overrides) -> ConfigResult<Self> {
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if let Some(speed) = overrides.speed {
            self.speed = speed;
        }
        if let Some(number) = overrides.number {
            self.number = number;
        }
        if let Some(warmup_ms) = overrides.warmup_ms {
            self.warmup_ms = warmup_ms;
        }
        if let Some(passed_limit) = overrides.passed_limit {
            self.passed_limit = passed_limit;
        }
        if overrides.epsilon.is_some() {
            self.epsilon = overrides.epsilon;
        }
        if let Some(port) = overrides.outport1 {
            self.ports.outport1 = port;
        }
        if let Some(port) = overrides.outport2 {
            self.ports.outport2 = port;
        }
        if let Some(port) = overrides.inport1 {
            self.ports.inport1 = port;
        }
        if let Some(port) = overrides.inport2 {
            self.ports.inport2 = port;
        }
        if overrides.rules.is_some() {
            self.rules = overrides.rules;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.number == 0 {
            return Err(ConfigError::invalid("number", "packet budget must be positive"));
        }
        if self.passed_limit > 100 {
            return Err(ConfigError::invalid(
                "passed_limit",
                format!("{} is not a percentage", self.passed_limit),
            ));
        }
        if let Some(epsilon) = self.epsilon {
            if epsilon > 100 {
                return Err(ConfigError::invalid(
                    "epsilon",
                    format!("{epsilon} is not a percentage"),
                ));
            }
        }
        if let Some(expected) = self.expected_percent {
            if expected > 100 {
                return Err(ConfigError::invalid(
                    "expected_percent",
                    format!("{expected} is not a percentage"),
                ));
            }
        }
        if !(DIGEST_LEN..=MAX_PAYLOAD).contains(&self.payload_size) {
            return Err(ConfigError::invalid(
                "payload_size",
                format!(
                    "{} outside {}..={}",
                    self.payload_size, DIGEST_LEN, MAX_PAYLOAD
                ),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::invalid("channel_capacity", "must be positive"));
        }
        if self.deadline_ms == Some(0) {
            return Err(ConfigError::invalid("deadline_ms", "must be positive when set"));
        }
        if self.mode == TestMode::Partition
            && self.partition.first.saturating_add(self.partition.second) == 0
        {
            return Err(ConfigError::invalid("partition", "weights sum to zero"));
        }
        if self.ports.outport1 == self.ports.outport2 {
            tracing::warn!(
                port = self.ports.outport1,
                "Both lanes egress on the same output port"
            );
        }
        Ok(())
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    /// Rule file for rule-driven modes; `None` for partition mode
    pub fn rules_path(&self) -> Option<PathBuf> {
        if !self.mode.requires_rules() {
            return None;
        }
        self.rules
            .clone()
            .or_else(|| self.mode.default_rules_path().map(PathBuf::from))
    }

    pub fn mode_profile(&self) -> ModeResult<ModeProfile> {
        ModeProfile::new(self.mode, self.tags, self.expected_percent, self.epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        config.validate().unwrap();

        assert_eq!(config.mode, TestMode::Separate);
        assert_eq!(config.speed, 1_000_000);
        assert_eq!(config.number, 10_000_000);
        assert_eq!(config.warmup(), Duration::from_secs(10));
        assert_eq!(config.passed_limit, 85);
        assert_eq!(config.tags.group2, 222);
        assert_eq!(config.deadline(), None);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            mode = "partition"
            speed = 0
            number = 50000
            warmup_ms = 0
            epsilon = 5

            [partition]
            first = 1
            second = 3
            seed = 7

            [ports]
            inport1 = 4

            [[macs]]
            port = 1
            src = "02:00:00:00:00:01"
            dst = "02:00:00:00:00:02"
        "#;

        let config = HarnessConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.mode, TestMode::Partition);
        assert_eq!(config.speed, 0);
        assert_eq!(config.partition.seed, Some(7));
        assert_eq!(config.ports.inport1, 4);
        assert_eq!(config.ports.outport2, 1);
        assert_eq!(config.macs.len(), 1);
        assert_eq!(config.rules_path(), None);

        let profile = config.mode_profile().unwrap();
        assert_eq!(profile.epsilon(), 5);
        assert_eq!(profile.expected_percent(), 10);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let err = HarnessConfig::from_toml_str(r#"mode = "shuffle""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            ("number = 0", "number"),
            ("passed_limit = 101", "passed_limit"),
            ("payload_size = 8", "payload_size"),
            ("channel_capacity = 0", "channel_capacity"),
            ("deadline_ms = 0", "deadline_ms"),
        ];

        for (toml, field) in cases {
            match HarnessConfig::from_toml_str(toml) {
                Err(ConfigError::Invalid { field: f, .. }) => assert_eq!(f, field),
                other => panic!("{toml}: expected invalid {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_overrides_win() {
        let config = HarnessConfig::default()
            .apply(Overrides {
                mode: Some(TestMode::Split),
                number: Some(1000),
                epsilon: Some(6),
                outport2: Some(3),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(config.mode, TestMode::Split);
        assert_eq!(config.number, 1000);
        assert_eq!(config.epsilon, Some(6));
        assert_eq!(config.ports.outport2, 3);
        assert_eq!(config.rules_path(), Some(PathBuf::from("rules/split.conf")));
    }

    #[test]
    fn test_override_revalidates() {
        let result = HarnessConfig::default().apply(Overrides {
            passed_limit: Some(200),
            ..Default::default()
        });
        assert!(matches!(result, Err(ConfigError::Invalid { field: "passed_limit", .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "mode = \"split\"\nrules = \"/etc/lanecheck/split.conf\"").unwrap();

        let config = HarnessConfig::load(file.path()).unwrap();
        assert_eq!(
            config.rules_path(),
            Some(PathBuf::from("/etc/lanecheck/split.conf"))
        );

        let missing = HarnessConfig::load(Path::new("/nonexistent/lanecheck.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
