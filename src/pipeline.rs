//! Verification Pipeline
//!
//! Three stages of increasing depth, each runnable on its own:
//!
//! 1. **Basic auth**: can the credentials identify a principal?
//! 2. **Service connection**: storage, compute and region listings all work.
//! 3. **Comprehensive**: IAM visibility, a concurrent multi-region sweep,
//!    service limits and a negative-control probe, aggregated into a
//!    persisted report.
//!
//! `run_all` chains the three, never stopping on a failed stage, and
//! reports a scoreboard. Failures only ever show up as `false` results.

use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::clock::{Clock, Sleeper, SystemClock, TokioSleeper};
use crate::config::VerifyConfig;
use crate::console::{glyph, Console};
use crate::fanout::{RegionFanOut, RegionSweep};
use crate::probes::{self, ProbeOutcome, RegionProbeResult};
use crate::provider::CloudProvider;
use crate::report::{ReportStore, ResultAggregator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    BasicAuth,
    ServiceConnection,
    Comprehensive,
}

impl Stage {
    /// Execution order of a full run
    pub const ALL: [Stage; 3] = [Stage::BasicAuth, Stage::ServiceConnection, Stage::Comprehensive];

    pub fn number(&self) -> usize {
        match self {
            Stage::BasicAuth => 1,
            Stage::ServiceConnection => 2,
            Stage::Comprehensive => 3,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Stage::BasicAuth => "basic authentication",
            Stage::ServiceConnection => "service connection",
            Stage::Comprehensive => "comprehensive verification",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stage {}: {}", self.number(), self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageResult {
    pub stage: Stage,
    pub passed: bool,
}

/// Outcome of a full run, one entry per stage in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scoreboard {
    pub stages: Vec<StageResult>,
}

impl Scoreboard {
    pub fn passed_count(&self) -> usize {
        self.stages.iter().filter(|s| s.passed).count()
    }

    pub fn total(&self) -> usize {
        self.stages.len()
    }

    pub fn all_passed(&self) -> bool {
        self.passed_count() == self.total()
    }

    pub fn passed(&self, stage: Stage) -> Option<bool> {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.passed)
    }
}

impl fmt::Display for Scoreboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.stages {
            writeln!(
                f,
                "{} {}: {}",
                glyph(result.passed),
                result.stage,
                if result.passed { "passed" } else { "failed" }
            )?;
        }
        write!(
            f,
            "Overall: {}/{} stages passed",
            self.passed_count(),
            self.total()
        )
    }
}

/// Runs verification stages against one provider
pub struct VerificationPipeline {
    provider: Arc<dyn CloudProvider>,
    config: VerifyConfig,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    console: Console,
}

impl VerificationPipeline {
    pub fn new(provider: Arc<dyn CloudProvider>, config: VerifyConfig) -> Self {
        Self {
            provider,
            config,
            clock: Arc::new(SystemClock),
            sleeper: Arc::new(TokioSleeper),
            console: Console::stdout(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    pub async fn run_stage(&self, stage: Stage) -> bool {
        match stage {
            Stage::BasicAuth => self.basic_auth().await,
            Stage::ServiceConnection => self.service_connection().await,
            Stage::Comprehensive => self.comprehensive().await,
        }
    }

    fn aggregator(&self) -> ResultAggregator {
        ResultAggregator::new(self.clock.now(), self.console.clone())
    }

    fn section(&self, title: &str) {
        self.console.blank();
        self.console.line(format!("--- {} ---", title));
    }

    /// Stage 1: a single identity lookup
    pub async fn basic_auth(&self) -> bool {
        self.console.line(format!("=== {} ===", Stage::BasicAuth));

        let mut aggregator = self.aggregator();
        let outcome = probes::basic_auth_probe(self.provider.as_ref(), self.clock.as_ref()).await;
        let passed = outcome.success();
        aggregator.record(outcome);

        info!(passed, "Basic authentication stage finished");
        passed
    }

    /// Stage 2: all three service probes must pass
    pub async fn service_connection(&self) -> bool {
        self.console.line(format!("=== {} ===", Stage::ServiceConnection));

        let provider = self.provider.as_ref();
        let clock = self.clock.as_ref();
        let mut aggregator = self.aggregator();

        self.section("Storage");
        aggregator.record(probes::storage_probe(provider, clock).await);
        self.section("Compute");
        aggregator.record(probes::compute_probe(provider, clock).await);
        self.section("Regions");
        aggregator.record(probes::region_enumeration_probe(provider, clock).await);

        let outcomes = aggregator.outcomes();
        let passed_count = outcomes.iter().filter(|o| o.success()).count();
        let passed = outcomes.iter().all(ProbeOutcome::success);

        self.console.blank();
        self.console.line(format!(
            "=== Result: {}/{} checks passed ===",
            passed_count,
            outcomes.len()
        ));

        info!(passed, passed_count, "Service connection stage finished");
        passed
    }

    /// Stage 3: recorded, finalized and persisted run
    pub async fn comprehensive(&self) -> bool {
        let mut aggregator = self.comprehensive_run().await;
        aggregator.finalize()
    }

    /// Stage 3 with access to the finalized aggregator
    pub async fn comprehensive_run(&self) -> ResultAggregator {
        self.console.line(format!("=== {} ===", Stage::Comprehensive));

        let provider = self.provider.as_ref();
        let clock = self.clock.as_ref();
        let mut aggregator = self
            .aggregator()
            .with_store(ReportStore::new(&self.config.report_dir));

        self.section("IAM permissions");
        aggregator.record(probes::iam_permissions_probe(provider, clock).await);

        self.section("Multi-region connectivity");
        let sweep = self.sweep_regions().await;
        aggregator.record(probes::multi_region_outcome(&sweep, clock));

        self.section("Service limits");
        aggregator.record(
            probes::service_limits_probe(provider, clock, self.config.vpc_warning_threshold).await,
        );

        self.section("Error handling");
        aggregator.record(
            probes::error_handling_probe(
                provider,
                clock,
                &self.config.probe_bucket,
                &self.config.not_found_codes,
            )
            .await,
        );

        aggregator.finalize();
        aggregator
    }

    /// Region lines are printed in completion order, as each region resolves
    async fn sweep_regions(&self) -> RegionSweep {
        let provider = self.provider.clone();

        RegionFanOut::new(self.config.workers)
            .run_with(
                &self.config.regions,
                move |region| {
                    let provider = provider.clone();
                    async move { probes::region_connectivity(provider.as_ref(), &region).await }
                },
                |result| self.print_region(result),
            )
            .await
    }

    fn print_region(&self, result: &RegionProbeResult) {
        match (result.availability_zones, result.error.as_deref()) {
            (Some(zones), _) if result.success => self.console.line(format!(
                "  {} {}: {} availability zones",
                glyph(true),
                result.region,
                zones
            )),
            (_, error) => self.console.line(format!(
                "  {} {}: {}",
                glyph(false),
                result.region,
                error.unwrap_or("unknown error")
            )),
        }
    }

    /// All stages in order; a failed stage never stops the run
    pub async fn run_all(&self) -> Scoreboard {
        self.console.line("Cloud access verification: full run");
        self.console
            .line(format!("Started: {}", self.clock.now().to_rfc3339()));

        let mut scoreboard = Scoreboard::default();
        let delay = self.config.stage_delay();

        for (i, stage) in Stage::ALL.iter().enumerate() {
            self.console.blank();
            self.console.line("=".repeat(50));
            self.console.line(format!("Running {}", stage));
            self.console.line("=".repeat(50));

            let passed = self.run_stage(*stage).await;
            scoreboard.stages.push(StageResult {
                stage: *stage,
                passed,
            });

            self.console.line(format!(
                "{} {} - {}",
                glyph(passed),
                stage,
                if passed { "passed" } else { "failed" }
            ));

            if i + 1 == Stage::ALL.len() {
                break;
            }
            if passed {
                self.console.line(format!(
                    "Waiting {}s before the next stage...",
                    delay.as_secs()
                ));
                self.sleeper.sleep(delay).await;
            } else {
                self.console.line("Continuing with the next stage despite the failure...");
            }
        }

        self.console.blank();
        self.console.line("=".repeat(60));
        self.console.line("Final summary");
        self.console.line("=".repeat(60));
        self.console.line(scoreboard.to_string());

        info!(
            passed = scoreboard.passed_count(),
            total = scoreboard.total(),
            "Full verification run finished"
        );
        scoreboard
    }
}
