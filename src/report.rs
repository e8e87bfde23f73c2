//! Result aggregation and reporting.
//!
//! The aggregator owns the run's `VerificationReport`: outcomes are appended
//! in execution order and echoed to the console as they arrive, the summary
//! is computed once at `finalize()`, and the finished report is written as
//! JSON named after the run's start time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::console::{glyph, Console};
use crate::error::{Result, VerifyError};
use crate::probes::ProbeOutcome;

const REPORT_FILE_PREFIX: &str = "aws_verification_report";

/// Totals derived from the recorded outcomes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total_tests: usize,
    pub successful_tests: usize,
    /// `"<successful>/<total>"`
    pub success_rate: String,
    pub overall_success: bool,
}

impl ReportSummary {
    /// An empty run counts as successful (0 of 0)
    pub fn from_outcomes(outcomes: &[ProbeOutcome]) -> Self {
        let total_tests = outcomes.len();
        let successful_tests = outcomes.iter().filter(|o| o.success()).count();

        Self {
            total_tests,
            successful_tests,
            success_rate: format!("{}/{}", successful_tests, total_tests),
            overall_success: successful_tests == total_tests,
        }
    }
}

/// Everything one run recorded
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub timestamp: DateTime<Utc>,
    pub tests: Vec<ProbeOutcome>,
    /// `None` until the report is finalized
    pub summary: Option<ReportSummary>,
}

impl VerificationReport {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            tests: Vec::new(),
            summary: None,
        }
    }
}

/// Writes finalized reports into a directory
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `aws_verification_report_<YYYYmmdd_HHMMSS>.json` for the run start
    pub fn path_for(&self, started_at: DateTime<Utc>) -> PathBuf {
        self.dir.join(format!(
            "{}_{}.json",
            REPORT_FILE_PREFIX,
            started_at.format("%Y%m%d_%H%M%S")
        ))
    }

    pub fn persist(&self, report: &VerificationReport) -> Result<PathBuf> {
        let path = self.path_for(report.timestamp);
        let json = serde_json::to_string_pretty(report)?;

        fs::create_dir_all(&self.dir).map_err(|source| VerifyError::ReportWrite {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| VerifyError::ReportWrite {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), tests = report.tests.len(), "Report written");
        Ok(path)
    }
}

/// Collects outcomes for one run.
///
/// Recording after `finalize()` is a usage error and is not guarded.
pub struct ResultAggregator {
    report: VerificationReport,
    console: Console,
    store: Option<ReportStore>,
    report_path: Option<PathBuf>,
}

impl ResultAggregator {
    pub fn new(started_at: DateTime<Utc>, console: Console) -> Self {
        Self {
            report: VerificationReport::new(started_at),
            console,
            store: None,
            report_path: None,
        }
    }

    /// Persist the report at finalize time
    pub fn with_store(mut self, store: ReportStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Append an outcome and print it
    pub fn record(&mut self, outcome: ProbeOutcome) {
        self.print_outcome(&outcome);
        self.report.tests.push(outcome);
    }

    fn print_outcome(&self, outcome: &ProbeOutcome) {
        self.console
            .line(format!("{} {}", glyph(outcome.success()), outcome.test_name()));
        for (key, value) in outcome.details() {
            self.console.line(format!("    {}: {}", key, render_value(value)));
        }
        if let Some(error) = outcome.error() {
            self.console.line(format!("    error: {}", error));
        }
    }

    pub fn outcomes(&self) -> &[ProbeOutcome] {
        &self.report.tests
    }

    pub fn report(&self) -> &VerificationReport {
        &self.report
    }

    /// Summary, once finalized
    pub fn summary(&self) -> Option<&ReportSummary> {
        self.report.summary.as_ref()
    }

    /// Where the report was written, if it was
    pub fn report_path(&self) -> Option<&Path> {
        self.report_path.as_deref()
    }

    /// Freeze the summary, print it, write the report; returns overall success.
    ///
    /// Later calls return the frozen result without writing again.
    pub fn finalize(&mut self) -> bool {
        if let Some(summary) = &self.report.summary {
            return summary.overall_success;
        }

        let summary = ReportSummary::from_outcomes(&self.report.tests);
        let overall_success = summary.overall_success;
        self.report.summary = Some(summary);
        self.print_summary();

        if let Some(store) = &self.store {
            match store.persist(&self.report) {
                Ok(path) => {
                    self.console
                        .line(format!("Detailed report: {}", path.display()));
                    self.report_path = Some(path);
                }
                Err(e) => {
                    error!(error = %e, "Failed to persist verification report");
                    self.console.line(format!("⚠️  Report not saved: {}", e));
                }
            }
        }

        overall_success
    }

    fn print_summary(&self) {
        let Some(summary) = &self.report.summary else {
            return;
        };

        self.console.blank();
        self.console.line("=== Verification Report ===");
        self.console
            .line(format!("Started: {}", self.report.timestamp.to_rfc3339()));
        self.console
            .line(format!("Total tests: {}", summary.total_tests));
        self.console
            .line(format!("Successful tests: {}", summary.successful_tests));
        self.console
            .line(format!("Success rate: {}", summary.success_rate));
        self.console.line(format!(
            "Overall result: {} {}",
            glyph(summary.overall_success),
            if summary.overall_success {
                "all checks passed"
            } else {
                "some checks failed"
            }
        ));
    }
}

/// Strings print bare; everything else prints as compact JSON
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
