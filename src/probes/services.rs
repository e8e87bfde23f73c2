//! Storage, compute and region enumeration probes.

use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;

use super::{
    conclude, ProbeOutcome, ProbeVerdict, COMPUTE_CONNECTION, REGION_ENUMERATION,
    STORAGE_CONNECTION,
};
use crate::clock::Clock;
use crate::details;
use crate::provider::{CloudProvider, ProviderResult};

/// Buckets echoed back as samples
pub const BUCKET_SAMPLE_SIZE: usize = 5;

pub async fn storage_probe(provider: &dyn CloudProvider, clock: &dyn Clock) -> ProbeOutcome {
    conclude(STORAGE_CONNECTION, clock, check_storage(provider).await)
}

async fn check_storage(provider: &dyn CloudProvider) -> ProviderResult<ProbeVerdict> {
    let buckets = provider.list_buckets().await?;
    info!(count = buckets.len(), "Listed buckets");

    let samples: Vec<_> = buckets
        .iter()
        .take(BUCKET_SAMPLE_SIZE)
        .map(|b| {
            json!({
                "name": b.name,
                "created": b
                    .created
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            })
        })
        .collect();

    let mut details = details! {
        "bucket_count" => buckets.len(),
        "sample_buckets" => samples,
    };
    if buckets.len() > BUCKET_SAMPLE_SIZE {
        details.insert(
            "remaining_buckets".to_string(),
            (buckets.len() - BUCKET_SAMPLE_SIZE).into(),
        );
    }

    Ok(ProbeVerdict::pass(details))
}

pub async fn compute_probe(provider: &dyn CloudProvider, clock: &dyn Clock) -> ProbeOutcome {
    conclude(COMPUTE_CONNECTION, clock, check_compute(provider).await)
}

async fn check_compute(provider: &dyn CloudProvider) -> ProviderResult<ProbeVerdict> {
    let instances = provider.list_instances(None).await?;

    let mut states: BTreeMap<String, usize> = BTreeMap::new();
    for instance in &instances {
        *states.entry(instance.state.clone()).or_insert(0) += 1;
    }
    info!(count = instances.len(), "Listed instances");

    Ok(ProbeVerdict::pass(details! {
        "instance_count" => instances.len(),
        "instance_states" => states,
    }))
}

/// Addressable regions plus the region the provider currently defaults to
pub async fn region_enumeration_probe(
    provider: &dyn CloudProvider,
    clock: &dyn Clock,
) -> ProbeOutcome {
    conclude(REGION_ENUMERATION, clock, check_regions(provider).await)
}

async fn check_regions(provider: &dyn CloudProvider) -> ProviderResult<ProbeVerdict> {
    let regions = provider.list_regions(None).await?;
    let current = provider.default_region().await;

    Ok(ProbeVerdict::pass(details! {
        "region_count" => regions.len(),
        "current_region" => current.unwrap_or_else(|| "not configured".to_string()),
    }))
}
