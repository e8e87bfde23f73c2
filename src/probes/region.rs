//! Per-region connectivity and the sweep summary outcome.

use std::collections::BTreeMap;
use tracing::debug;

use super::{ProbeOutcome, RegionProbeResult, MULTI_REGION_CONNECTIVITY};
use crate::clock::Clock;
use crate::details;
use crate::fanout::RegionSweep;
use crate::provider::CloudProvider;

/// Reach one region by listing its availability zones
pub async fn region_connectivity(provider: &dyn CloudProvider, region: &str) -> RegionProbeResult {
    match provider.availability_zones(region).await {
        Ok(zones) => {
            debug!(region, zones = zones.len(), "Region reachable");
            RegionProbeResult::reachable(region, zones.len())
        }
        Err(e) => RegionProbeResult::unreachable(region, e),
    }
}

/// Fold a sweep into one outcome; passes when at least one region answered
pub fn multi_region_outcome(sweep: &RegionSweep, clock: &dyn Clock) -> ProbeOutcome {
    let successful = sweep.success_count();
    let tested = sweep.len();

    let failed_regions: BTreeMap<&str, &str> = sweep
        .failed()
        .map(|r| (r.region.as_str(), r.error.as_deref().unwrap_or("unknown error")))
        .collect();

    let mut details = details! {
        "tested_regions" => tested,
        "successful_regions" => successful,
        "success_rate" => format!("{}/{}", successful, tested),
    };
    if !failed_regions.is_empty() {
        details.insert(
            "failed_regions".to_string(),
            serde_json::json!(failed_regions),
        );
    }

    if successful > 0 {
        ProbeOutcome::passed(MULTI_REGION_CONNECTIVITY, details, clock.now())
    } else {
        ProbeOutcome::failed(MULTI_REGION_CONNECTIVITY, details, clock.now())
    }
}
