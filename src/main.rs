//! Cloud Access Verifier CLI
//!
//! # Usage
//! ```bash
//! # Stage 1 only
//! cloud-verify auth
//!
//! # Stage 3 against two regions, report into ./reports
//! cloud-verify --regions us-east-1,eu-west-1 --report-dir reports comprehensive
//!
//! # Everything, with JSON logs on stderr
//! cloud-verify --json-logs all
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cloud_verify::config::{
    DEFAULT_PROBE_BUCKET, DEFAULT_STAGE_DELAY_SECS, DEFAULT_VPC_WARNING_THRESHOLD,
    DEFAULT_WORKERS,
};
use cloud_verify::{AwsCliProvider, CloudProvider, Stage, VerificationPipeline, VerifyConfig};

// ============================================================
// CLI Definition
// ============================================================

#[derive(Parser)]
#[command(name = "cloud-verify")]
#[command(about = "Verify cloud credentials, permissions and regional reachability", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Default region for non-regional calls
    #[arg(long, env = "AWS_REGION", global = true)]
    region: Option<String>,

    /// Named credentials profile
    #[arg(long, env = "AWS_PROFILE", global = true)]
    profile: Option<String>,

    /// Path to the aws CLI executable
    #[arg(long, env = "AWS_CLI_PATH", default_value = "aws", global = true)]
    aws_cli: String,

    /// Regions swept by the comprehensive stage (comma separated)
    #[arg(long, value_delimiter = ',', global = true)]
    regions: Vec<String>,

    /// Concurrent region probes
    #[arg(long, default_value_t = DEFAULT_WORKERS, global = true)]
    workers: usize,

    /// Directory for the comprehensive report
    #[arg(long, default_value = ".", global = true)]
    report_dir: PathBuf,

    /// VPC count reported as "near limit"
    #[arg(long, default_value_t = DEFAULT_VPC_WARNING_THRESHOLD, global = true)]
    vpc_threshold: usize,

    /// Bucket the negative-control probe expects to be missing
    #[arg(long, default_value = DEFAULT_PROBE_BUCKET, global = true)]
    probe_bucket: String,

    /// Pause after a passing stage in a full run
    #[arg(long, default_value_t = DEFAULT_STAGE_DELAY_SECS, global = true)]
    stage_delay_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage 1: resolve the caller identity
    Auth,

    /// Stage 2: storage, compute and region listings
    Services,

    /// Stage 3: IAM, multi-region sweep, limits and negative control, with report
    Comprehensive,

    /// All three stages in order
    All,
}

impl Cli {
    fn config(&self) -> VerifyConfig {
        let mut config = VerifyConfig::default()
            .with_workers(self.workers)
            .with_report_dir(&self.report_dir)
            .with_vpc_warning_threshold(self.vpc_threshold)
            .with_probe_bucket(&self.probe_bucket)
            .with_stage_delay_secs(self.stage_delay_secs);

        if !self.regions.is_empty() {
            config = config.with_regions(
                self.regions
                    .iter()
                    .map(|r| r.trim().to_string())
                    .collect(),
            );
        }
        config
    }
}

fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

// ============================================================
// Main Entry Point
// ============================================================

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<bool> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs)?;

    let config = cli.config();
    config.validate().context("Refusing to start verification")?;

    let provider = AwsCliProvider::new()
        .with_program(&cli.aws_cli)
        .with_profile(cli.profile.clone())
        .with_region(cli.region.clone());
    info!(
        provider = provider.name(),
        regions = config.regions.len(),
        workers = config.workers,
        "Cloud access verification starting"
    );

    let pipeline = VerificationPipeline::new(Arc::new(provider), config);

    let passed = match cli.command {
        Commands::Auth => pipeline.run_stage(Stage::BasicAuth).await,
        Commands::Services => pipeline.run_stage(Stage::ServiceConnection).await,
        Commands::Comprehensive => pipeline.run_stage(Stage::Comprehensive).await,
        Commands::All => pipeline.run_all().await.all_passed(),
    };

    info!(passed, "Verification finished");
    Ok(passed)
}
