use crate::classifier::Lane;
use crate::mode::error::{ModeError, ModeResult};
use crate::mode::types::{TagPorts, TestMode};
use serde::Serialize;

/// Inclusive percentage window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub low: u32,
    pub high: u32,
}

impl Bounds {
    fn around(center: u32, epsilon: u32) -> Self {
        Self {
            low: center.saturating_sub(epsilon),
            high: center + epsilon,
        }
    }

    pub fn contains(&self, percent: u32) -> bool {
        (self.low..=self.high).contains(&percent)
    }
}

/// Mode-dependent behavior resolved once at configuration time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeProfile {
    mode: TestMode,
    expected_percent: u32,
    epsilon: u32,
    tags: TagPorts,
}

impl ModeProfile {
    pub fn new(
        mode: TestMode,
        tags: TagPorts,
        expected_percent: Option<u32>,
        epsilon: Option<u32>,
    ) -> ModeResult<Self> {
        let expected_percent = expected_percent.unwrap_or_else(|| mode.expected_percent());
        if expected_percent > 100 {
            return Err(ModeError::PercentOutOfRange(expected_percent));
        }

        Ok(Self {
            mode,
            expected_percent,
            epsilon: epsilon.unwrap_or_else(|| mode.default_epsilon()),
            tags,
        })
    }

    pub fn with_defaults(mode: TestMode) -> Self {
        Self {
            mode,
            expected_percent: mode.expected_percent(),
            epsilon: mode.default_epsilon(),
            tags: TagPorts::default(),
        }
    }

    pub fn mode(&self) -> TestMode {
        self.mode
    }

    pub fn expected_percent(&self) -> u32 {
        self.expected_percent
    }

    pub fn epsilon(&self) -> u32 {
        self.epsilon
    }

    pub fn tags(&self) -> TagPorts {
        self.tags
    }

    /// Tag for the `seq`-th generated packet.
    ///
    /// Separate cycles evenly through three groups, split sends one in five to
    /// the first group, partition tags everything identically.
    pub fn tag_for(&self, seq: u64) -> u16 {
        match self.mode {
            TestMode::Separate => match seq % 3 {
                0 => self.tags.group1,
                1 => self.tags.group2,
                _ => self.tags.group3,
            },
            TestMode::Split => {
                if seq % 5 == 0 {
                    self.tags.group1
                } else {
                    self.tags.group2
                }
            }
            TestMode::Partition => self.tags.group1,
        }
    }

    /// Whether a packet tagged `tag` may legitimately arrive on `lane`
    pub fn accepts(&self, lane: Lane, tag: u16) -> bool {
        match (lane, self.mode) {
            (Lane::First, _) => tag == self.tags.group1,
            (Lane::Second, TestMode::Separate) => {
                tag == self.tags.group2 || tag == self.tags.group3
            }
            (Lane::Second, TestMode::Split) => tag == self.tags.group2,
            (Lane::Second, TestMode::Partition) => tag == self.tags.group1,
        }
    }

    pub fn first_lane_bounds(&self) -> Bounds {
        Bounds::around(self.expected_percent, self.epsilon)
    }

    pub fn second_lane_bounds(&self) -> Bounds {
        Bounds::around(100 - self.expected_percent, self.epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separate_tag_cycle() {
        let profile = ModeProfile::with_defaults(TestMode::Separate);
        let tags: Vec<u16> = (0..6).map(|seq| profile.tag_for(seq)).collect();
        assert_eq!(tags, vec![111, 222, 333, 111, 222, 333]);
    }

    #[test]
    fn test_split_tag_skew() {
        let profile = ModeProfile::with_defaults(TestMode::Split);
        let first = (0..5000).filter(|&seq| profile.tag_for(seq) == 111).count();
        assert_eq!(first, 1000);
        assert!((0..5000).all(|seq| matches!(profile.tag_for(seq), 111 | 222)));
    }

    #[test]
    fn test_partition_uniform_tag() {
        let profile = ModeProfile::with_defaults(TestMode::Partition);
        assert!((0..100).all(|seq| profile.tag_for(seq) == 111));
    }

    #[test]
    fn test_lane_acceptance() {
        let sep = ModeProfile::with_defaults(TestMode::Separate);
        assert!(sep.accepts(Lane::First, 111));
        assert!(!sep.accepts(Lane::First, 222));
        assert!(sep.accepts(Lane::Second, 222));
        assert!(sep.accepts(Lane::Second, 333));
        assert!(!sep.accepts(Lane::Second, 111));

        let split = ModeProfile::with_defaults(TestMode::Split);
        assert!(split.accepts(Lane::First, 111));
        assert!(split.accepts(Lane::Second, 222));
        assert!(!split.accepts(Lane::Second, 333));

        let part = ModeProfile::with_defaults(TestMode::Partition);
        assert!(part.accepts(Lane::First, 111));
        assert!(part.accepts(Lane::Second, 111));
        assert!(!part.accepts(Lane::Second, 222));
    }

    #[test]
    fn test_bounds() {
        let sep = ModeProfile::with_defaults(TestMode::Separate);
        assert_eq!(sep.first_lane_bounds(), Bounds { low: 31, high: 35 });
        assert_eq!(sep.second_lane_bounds(), Bounds { low: 65, high: 69 });

        let wide = ModeProfile::new(TestMode::Partition, TagPorts::default(), Some(2), Some(5))
            .unwrap();
        assert_eq!(wide.first_lane_bounds(), Bounds { low: 0, high: 7 });
        assert!(wide.first_lane_bounds().contains(0));
    }

    #[test]
    fn test_overrides() {
        let profile = ModeProfile::new(TestMode::Split, TagPorts::default(), None, Some(1)).unwrap();
        assert_eq!(profile.expected_percent(), 20);
        assert_eq!(profile.epsilon(), 1);

        assert_eq!(
            ModeProfile::new(TestMode::Split, TagPorts::default(), Some(101), None),
            Err(ModeError::PercentOutOfRange(101))
        );
    }
}
