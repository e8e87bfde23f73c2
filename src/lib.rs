//! Cloud Access Verifier
//!
//! Checks that a set of cloud credentials actually works: identity lookup,
//! read access to storage and compute, region visibility, and a
//! comprehensive run with a concurrent multi-region sweep whose results are
//! written to a JSON report.

pub mod clock;
pub mod config;
pub mod console;
pub mod error;
pub mod fanout;
pub mod pipeline;
pub mod probes;
pub mod provider;
pub mod report;

pub use clock::{Clock, Sleeper, SystemClock, TokioSleeper};
pub use config::VerifyConfig;
pub use console::Console;
pub use error::{Result, VerifyError};
pub use fanout::{RegionFanOut, RegionSweep};
pub use pipeline::{Scoreboard, Stage, StageResult, VerificationPipeline};
pub use probes::{ProbeOutcome, RegionProbeResult};
pub use provider::{AwsCliProvider, CloudProvider, ProviderError, ProviderResult};
pub use report::{ReportStore, ReportSummary, ResultAggregator, VerificationReport};
