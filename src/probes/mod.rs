//! Verification Probes
//!
//! Each probe is a read-only query against one provider capability. Probe
//! bodies return `ProviderResult<ProbeVerdict>`; `conclude` is the single
//! failure boundary that turns that into a timestamped `ProbeOutcome`, so no
//! provider error travels past a probe.
//!
//! - `identity`: caller identity and IAM policy visibility
//! - `services`: storage, compute and region enumeration
//! - `limits`: service-limit check and the negative-control probe
//! - `region`: per-region connectivity used by the fan-out

pub mod identity;
pub mod limits;
pub mod outcome;
pub mod region;
pub mod services;

pub use identity::{basic_auth_probe, iam_permissions_probe};
pub use limits::{error_handling_probe, service_limits_probe};
pub use outcome::{Details, ProbeOutcome, ProbeVerdict, RegionProbeResult};
pub use region::{multi_region_outcome, region_connectivity};
pub use services::{compute_probe, region_enumeration_probe, storage_probe};

use tracing::{debug, warn};

use crate::clock::Clock;
use crate::provider::{ProviderError, ProviderResult};

pub const BASIC_AUTH: &str = "basic authentication";
pub const STORAGE_CONNECTION: &str = "storage connection";
pub const COMPUTE_CONNECTION: &str = "compute connection";
pub const REGION_ENUMERATION: &str = "region enumeration";
pub const IAM_PERMISSIONS: &str = "IAM permissions";
pub const MULTI_REGION_CONNECTIVITY: &str = "multi-region connectivity";
pub const SERVICE_LIMITS: &str = "service limits";
pub const ERROR_HANDLING: &str = "error handling";

const MISSING_CREDENTIALS_HINT: &str =
    "no credentials found; configure them (e.g. `aws configure`) and retry";

/// Stamp a probe body's result into an outcome
pub(crate) fn conclude(
    test_name: &str,
    clock: &dyn Clock,
    result: ProviderResult<ProbeVerdict>,
) -> ProbeOutcome {
    let timestamp = clock.now();

    match result {
        Ok(verdict) if verdict.success => {
            debug!(probe = test_name, "Probe passed");
            ProbeOutcome::passed(test_name, verdict.details, timestamp)
        }
        Ok(verdict) => {
            debug!(probe = test_name, "Probe check failed");
            ProbeOutcome::failed(test_name, verdict.details, timestamp)
        }
        Err(e) => {
            warn!(probe = test_name, error = %e, "Probe errored");
            ProbeOutcome::errored(test_name, error_details(&e), &e, timestamp)
        }
    }
}

fn error_details(error: &ProviderError) -> Details {
    let mut details = Details::new();
    if error.is_missing_credentials() {
        details.insert("hint".to_string(), MISSING_CREDENTIALS_HINT.into());
    }
    if let Some(code) = error.code() {
        details.insert("error_code".to_string(), code.into());
    }
    details
}
