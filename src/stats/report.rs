use crate::mode::TestMode;
use crate::stats::judge::Judgement;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Final outcome of one run, as printed or serialized for the caller
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub run_id: Uuid,
    pub mode: TestMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub inport1: u16,
    pub inport2: u16,
    pub passed: bool,
    pub judgement: Judgement,
}

impl Report {
    pub fn new(
        run_id: Uuid,
        mode: TestMode,
        started_at: DateTime<Utc>,
        inports: (u16, u16),
        judgement: Judgement,
    ) -> Self {
        Self {
            run_id,
            mode,
            started_at,
            finished_at: Utc::now(),
            inport1: inports.0,
            inport2: inports.1,
            passed: judgement.passed(),
            judgement,
        }
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let j = &self.judgement;
        let snap = &j.snapshot;

        writeln!(f, "Sent {} packets", snap.sent)?;
        writeln!(f, "Received {} packets", j.received)?;
        writeln!(f, "Ratio = {} %", j.delivery_percent)?;
        writeln!(f, "On port {} received= {} packets", self.inport1, snap.first_lane)?;
        writeln!(f, "On port {} received= {} packets", self.inport2, snap.second_lane)?;
        writeln!(
            f,
            "Proportion of packets received on {} port = {} %",
            self.inport1, j.first_percent
        )?;
        writeln!(
            f,
            "Proportion of packets received on {} port = {} %",
            self.inport2, j.second_percent
        )?;
        writeln!(f, "Broken = {} packets", snap.broken)?;

        for violation in &j.violations {
            writeln!(f, "  - {violation}")?;
        }

        if self.passed {
            write!(f, "TEST PASSED")
        } else {
            write!(f, "TEST FAILED")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::ModeProfile;
    use crate::stats::{judge, Snapshot};

    fn report(first: u64, second: u64, pass_flag: bool) -> Report {
        let snap = Snapshot {
            generated: 3100,
            sent: 3000,
            received: first + second,
            first_lane: first,
            second_lane: second,
            broken: 2,
            misrouted: u64::from(!pass_flag),
            pass_flag,
        };
        let judgement = judge(&snap, &ModeProfile::with_defaults(TestMode::Separate), 85).unwrap();
        Report::new(Uuid::new_v4(), TestMode::Separate, Utc::now(), (0, 1), judgement)
    }

    #[test]
    fn test_text_block() {
        let text = report(1000, 2000, true).to_string();

        assert!(text.starts_with("Sent 3000 packets\n"));
        assert!(text.contains("Received 3000 packets"));
        assert!(text.contains("Ratio = 100 %"));
        assert!(text.contains("On port 0 received= 1000 packets"));
        assert!(text.contains("Proportion of packets received on 1 port = 66 %"));
        assert!(text.contains("Broken = 2 packets"));
        assert!(text.ends_with("TEST PASSED"));
    }

    #[test]
    fn test_failure_lists_violations() {
        let report = report(1000, 2000, false);
        assert!(!report.passed());

        let text = report.to_string();
        assert!(text.contains("arrived on the wrong lane"));
        assert!(text.ends_with("TEST FAILED"));
    }

    #[test]
    fn test_json() {
        let report = report(1000, 2000, true);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["mode"], "separate");
        assert_eq!(value["passed"], true);
        assert_eq!(value["judgement"]["first_percent"], 33);
        assert_eq!(value["judgement"]["snapshot"]["broken"], 2);
        assert_eq!(value["run_id"], report.run_id.to_string());
    }
}
