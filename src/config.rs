//! Verifier configuration
//!
//! Defaults reproduce the stock run: five regions probed by five workers,
//! a two second pause between passing stages, reports in the working
//! directory. The CLI overrides any of these from flags or env vars.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, VerifyError};

/// Regions swept by the comprehensive stage
pub const DEFAULT_REGIONS: [&str; 5] = [
    "ap-northeast-1",
    "us-east-1",
    "eu-west-1",
    "ap-southeast-1",
    "us-west-2",
];

/// Concurrent region probes
pub const DEFAULT_WORKERS: usize = 5;

/// VPC count at which the service-limit probe reports "near limit".
///
/// Placeholder value, not derived from the account's real VPC quota.
pub const DEFAULT_VPC_WARNING_THRESHOLD: usize = 5;

/// Bucket name the negative-control probe expects to be missing
pub const DEFAULT_PROBE_BUCKET: &str = "non-existent-bucket-12345-test";

/// Error codes that count as "bucket does not exist"
pub const DEFAULT_NOT_FOUND_CODES: [&str; 2] = ["404", "NoSuchBucket"];

pub const DEFAULT_STAGE_DELAY_SECS: u64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Regions probed concurrently in the comprehensive stage
    pub regions: Vec<String>,
    /// Worker pool size for the region sweep
    pub workers: usize,
    /// Directory receiving the comprehensive report
    pub report_dir: PathBuf,
    pub vpc_warning_threshold: usize,
    /// Bucket used by the negative-control probe
    pub probe_bucket: String,
    pub not_found_codes: Vec<String>,
    /// Pause after a passing stage in a full run
    pub stage_delay_secs: u64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            regions: DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect(),
            workers: DEFAULT_WORKERS,
            report_dir: PathBuf::from("."),
            vpc_warning_threshold: DEFAULT_VPC_WARNING_THRESHOLD,
            probe_bucket: DEFAULT_PROBE_BUCKET.to_string(),
            not_found_codes: DEFAULT_NOT_FOUND_CODES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            stage_delay_secs: DEFAULT_STAGE_DELAY_SECS,
        }
    }
}

impl VerifyConfig {
    pub fn with_regions(mut self, regions: Vec<String>) -> Self {
        self.regions = regions;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = dir.into();
        self
    }

    pub fn with_vpc_warning_threshold(mut self, threshold: usize) -> Self {
        self.vpc_warning_threshold = threshold;
        self
    }

    pub fn with_probe_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.probe_bucket = bucket.into();
        self
    }

    pub fn with_stage_delay_secs(mut self, secs: u64) -> Self {
        self.stage_delay_secs = secs;
        self
    }

    pub fn stage_delay(&self) -> Duration {
        Duration::from_secs(self.stage_delay_secs)
    }

    /// Reject settings that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(VerifyError::InvalidConfig(
                "worker pool size must be at least 1".to_string(),
            ));
        }
        if self.regions.is_empty() {
            return Err(VerifyError::InvalidConfig(
                "at least one region is required".to_string(),
            ));
        }
        if self.regions.iter().any(|r| r.trim().is_empty()) {
            return Err(VerifyError::InvalidConfig(
                "region names must not be empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.regions.iter().find(|r| !seen.insert(r.as_str())) {
            return Err(VerifyError::InvalidConfig(format!(
                "region {} is listed more than once",
                dup
            )));
        }
        if self.probe_bucket.trim().is_empty() {
            return Err(VerifyError::InvalidConfig(
                "negative-control bucket name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
