//! Metrics recorder for harness runs
//!
//! Records per-packet outcomes and per-run verdicts.

use crate::classifier::Lane;
use crate::mode::TestMode;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::{Duration, Instant};

/// Publish metric descriptions to the installed recorder.
///
/// Descriptions sent before a recorder is installed are lost, so call this
/// after installing one. Repeated calls overwrite the same text.
pub fn init_metrics() {
    describe_counter!(
        "lanecheck_packets_generated_total",
        "Total number of packets produced by the generator"
    );
    describe_counter!(
        "lanecheck_packets_received_total",
        "Packets that passed every check, per lane"
    );
    describe_counter!(
        "lanecheck_packets_broken_total",
        "Packets that failed the integrity check"
    );
    describe_counter!(
        "lanecheck_packets_misrouted_total",
        "Packets whose tag did not belong on the lane they arrived on"
    );
    describe_counter!("lanecheck_runs_total", "Completed runs by verdict");
    describe_histogram!(
        "lanecheck_run_duration_seconds",
        "Wall-clock time from pipeline start to verdict"
    );
}

fn lane_label(lane: Lane) -> &'static str {
    match lane {
        Lane::First => "1",
        Lane::Second => "2",
    }
}

// ============== Packet Outcomes ==============

pub fn record_packet_generated() {
    counter!("lanecheck_packets_generated_total").increment(1);
}

pub fn record_packet_verified(lane: Lane) {
    counter!("lanecheck_packets_received_total", "lane" => lane_label(lane)).increment(1);
}

pub fn record_packet_broken(lane: Lane) {
    counter!("lanecheck_packets_broken_total", "lane" => lane_label(lane)).increment(1);
}

pub fn record_packet_misrouted(lane: Lane) {
    counter!("lanecheck_packets_misrouted_total", "lane" => lane_label(lane)).increment(1);
}

// ============== Run Outcomes ==============

/// Times one run and records its verdict
pub struct RunMetrics {
    mode: TestMode,
    start_time: Instant,
}

impl RunMetrics {
    pub fn start(mode: TestMode) -> Self {
        Self {
            mode,
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn finish(self, passed: bool) {
        let verdict = if passed { "pass" } else { "fail" };
        counter!("lanecheck_runs_total", "mode" => self.mode.as_str(), "verdict" => verdict)
            .increment(1);
        histogram!("lanecheck_run_duration_seconds", "mode" => self.mode.as_str())
            .record(self.start_time.elapsed().as_secs_f64());
    }

    pub fn fail(self) {
        counter!("lanecheck_runs_total", "mode" => self.mode.as_str(), "verdict" => "error")
            .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics() {
        // Should not panic when called multiple times
        init_metrics();
        init_metrics();
    }

    #[test]
    fn test_recording_without_exporter() {
        record_packet_generated();
        record_packet_verified(Lane::First);
        record_packet_broken(Lane::Second);
        record_packet_misrouted(Lane::Second);
    }

    #[test]
    fn test_run_metrics() {
        let run = RunMetrics::start(TestMode::Split);
        std::thread::sleep(Duration::from_millis(5));
        assert!(run.elapsed() >= Duration::from_millis(5));
        run.finish(true);

        RunMetrics::start(TestMode::Partition).fail();
    }
}
