//! End-to-end runs of every mode through the in-process pipeline
//!
//! Run with: cargo test --test distribution_tests -- --nocapture

mod common;

use common::{fast_config, repo_path, BUDGET};
use lanecheck::config::HarnessConfig;
use lanecheck::mode::TestMode;
use lanecheck::orchestrator::RunState;
use lanecheck::packet::MacEntry;
use lanecheck::Harness;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_separate_mode_passes() {
    let harness = Harness::new(fast_config(TestMode::Separate));
    let report = harness.run().await.unwrap();
    println!("{report}");

    assert!(report.passed(), "{report}");
    assert!((32..=34).contains(&report.judgement.first_percent));
    assert!((65..=69).contains(&report.judgement.second_percent));
    assert_eq!(harness.current_state(), RunState::Done { passed: true });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_split_mode_passes() {
    let report = Harness::new(fast_config(TestMode::Split)).run().await.unwrap();
    println!("{report}");

    assert!(report.passed(), "{report}");
    assert!((19..=21).contains(&report.judgement.first_percent));
    assert!((79..=81).contains(&report.judgement.second_percent));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_partition_mode_passes() {
    let report = Harness::new(fast_config(TestMode::Partition)).run().await.unwrap();
    println!("{report}");

    // 100:1000 weights land near 9%
    assert!(report.passed(), "{report}");
    assert!((8..=10).contains(&report.judgement.first_percent));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_lane_totals_equal_budget() {
    for mode in TestMode::ALL {
        let report = Harness::new(fast_config(mode)).run().await.unwrap();
        let snap = report.judgement.snapshot;

        assert_eq!(snap.broken, 0, "{mode}");
        assert_eq!(snap.misrouted, 0, "{mode}");
        assert_eq!(snap.first_lane + snap.second_lane, BUDGET, "{mode}");
        assert!(snap.received > BUDGET, "{mode}");
        assert!(snap.sent >= BUDGET, "{mode}");
        assert!(snap.generated >= snap.sent, "{mode}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mac_rewrite_keeps_integrity() {
    let mut config = fast_config(TestMode::Separate);
    config.macs = vec![
        MacEntry {
            port: 0,
            src: "02:00:00:00:00:01".parse().unwrap(),
            dst: "02:00:00:00:00:02".parse().unwrap(),
        },
        MacEntry {
            port: 1,
            src: "02:00:00:00:00:03".parse().unwrap(),
            dst: "02:00:00:00:00:04".parse().unwrap(),
        },
    ];

    let report = Harness::new(config).run().await.unwrap();
    assert!(report.passed(), "{report}");
    assert_eq!(report.judgement.snapshot.broken, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_warmup_traffic_not_counted_as_sent() {
    let config = HarnessConfig {
        warmup_ms: 300,
        ..fast_config(TestMode::Separate)
    };

    let report = Harness::new(config).run().await.unwrap();
    let snap = report.judgement.snapshot;

    assert!(report.passed(), "{report}");
    assert!(snap.generated > snap.sent);
    assert_eq!(snap.first_lane + snap.second_lane, BUDGET);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_report_formats() {
    let harness = Harness::new(fast_config(TestMode::Split));
    let report = harness.run().await.unwrap();

    let text = report.to_string();
    assert!(text.contains("On port 0 received="));
    assert!(text.contains("On port 1 received="));
    assert!(text.ends_with("TEST PASSED"));

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["mode"], "split");
    assert_eq!(json["run_id"], harness.run_id().to_string());
}

#[test]
fn test_sample_config_loads() {
    let config = HarnessConfig::load(&repo_path("lanecheck.toml")).unwrap();

    assert_eq!(config, HarnessConfig::default());
}
