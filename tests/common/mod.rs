//! Shared helpers for harness integration tests

#![allow(dead_code)]

use lanecheck::config::{HarnessConfig, PartitionConfig};
use lanecheck::mode::TestMode;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const BUDGET: u64 = 30_000;

pub fn repo_path(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

/// No warm-up, no pacing, small queues so little is in flight at the budget
pub fn fast_config(mode: TestMode) -> HarnessConfig {
    HarnessConfig {
        mode,
        speed: 0,
        number: BUDGET,
        warmup_ms: 0,
        rules: mode.default_rules_path().map(repo_path),
        partition: PartitionConfig {
            seed: Some(42),
            ..PartitionConfig::default()
        },
        channel_capacity: 64,
        deadline_ms: Some(60_000),
        ..HarnessConfig::default()
    }
}

pub fn rules_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
