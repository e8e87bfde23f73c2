//! Service-limit and negative-control probes.

use tracing::{info, warn};

use super::{conclude, ProbeOutcome, ProbeVerdict, ERROR_HANDLING, SERVICE_LIMITS};
use crate::clock::Clock;
use crate::details;
use crate::provider::{CloudProvider, ProviderError, ProviderResult};

pub const VPC_LIMIT_OK: &str = "OK";
pub const VPC_LIMIT_NEAR: &str = "near limit";

/// VPC and security-group counts in the default region.
///
/// `vpc_warning_threshold` is a fixed placeholder, not the account quota;
/// the probe passes whenever both listings succeed.
pub async fn service_limits_probe(
    provider: &dyn CloudProvider,
    clock: &dyn Clock,
    vpc_warning_threshold: usize,
) -> ProbeOutcome {
    conclude(
        SERVICE_LIMITS,
        clock,
        check_service_limits(provider, vpc_warning_threshold).await,
    )
}

async fn check_service_limits(
    provider: &dyn CloudProvider,
    vpc_warning_threshold: usize,
) -> ProviderResult<ProbeVerdict> {
    let vpcs = provider.list_vpcs(None).await?;
    let security_groups = provider.list_security_groups(None).await?;

    let limit_check = if vpcs.len() < vpc_warning_threshold {
        VPC_LIMIT_OK
    } else {
        warn!(vpcs = vpcs.len(), threshold = vpc_warning_threshold, "VPC count near limit");
        VPC_LIMIT_NEAR
    };

    Ok(ProbeVerdict::pass(details! {
        "vpc_count" => vpcs.len(),
        "security_group_count" => security_groups.len(),
        "vpc_limit_check" => limit_check,
        "vpc_warning_threshold" => vpc_warning_threshold,
    }))
}

/// Ask for a bucket that must not exist and expect a not-found code back.
///
/// Both an unexpected success and an unexpected error code fail the probe
/// without setting `error`; calls that never reach the service set it.
pub async fn error_handling_probe(
    provider: &dyn CloudProvider,
    clock: &dyn Clock,
    bucket: &str,
    expected_codes: &[String],
) -> ProbeOutcome {
    conclude(
        ERROR_HANDLING,
        clock,
        check_error_handling(provider, bucket, expected_codes).await,
    )
}

async fn check_error_handling(
    provider: &dyn CloudProvider,
    bucket: &str,
    expected_codes: &[String],
) -> ProviderResult<ProbeVerdict> {
    match provider.head_bucket(bucket).await {
        Ok(()) => {
            warn!(bucket, "Negative-control bucket unexpectedly exists");
            Ok(ProbeVerdict::fail(details! {
                "error_handling" => "unexpected success",
                "bucket" => bucket,
            }))
        }
        Err(ProviderError::Service { code, .. }) if expected_codes.contains(&code) => {
            info!(code = %code, "Negative-control probe got expected error");
            Ok(ProbeVerdict::pass(details! {
                "error_handling" => "expected error caught",
                "error_code" => code,
            }))
        }
        Err(ProviderError::Service { code, .. }) => Ok(ProbeVerdict::fail(details! {
            "error_handling" => "unexpected error",
            "error_code" => code,
        })),
        Err(other) => Err(other),
    }
}
