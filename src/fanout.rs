//! Region Fan-Out
//!
//! Runs one probe per region on a bounded worker pool and collects the
//! results as they complete. Every submitted region yields exactly one
//! `RegionProbeResult`; a failing or panicking region never affects the
//! others. There is no retry, timeout or cancellation: the sweep returns
//! once every region has resolved.

use futures::FutureExt;
use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::DEFAULT_WORKERS;
use crate::probes::RegionProbeResult;

/// Bounded concurrent executor for per-region probes
#[derive(Debug, Clone, Copy)]
pub struct RegionFanOut {
    workers: usize,
}

impl Default for RegionFanOut {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl RegionFanOut {
    /// Pool of `workers` concurrent probes (at least one)
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Probe every region, at most `workers` at a time.
    ///
    /// Results come back in completion order.
    pub async fn run<F, Fut>(&self, regions: &[String], probe: F) -> RegionSweep
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RegionProbeResult> + Send + 'static,
    {
        self.run_with(regions, probe, |_| {}).await
    }

    /// Like `run`, calling `on_result` for each region as soon as it resolves
    pub async fn run_with<F, Fut, R>(
        &self,
        regions: &[String],
        probe: F,
        mut on_result: R,
    ) -> RegionSweep
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RegionProbeResult> + Send + 'static,
        R: FnMut(&RegionProbeResult),
    {
        info!(
            regions = regions.len(),
            workers = self.workers,
            "Starting region sweep"
        );

        let sem = Arc::new(Semaphore::new(self.workers));
        let probe = Arc::new(probe);
        let mut join_set: JoinSet<RegionProbeResult> = JoinSet::new();

        for region in regions {
            let sem = sem.clone();
            let probe = probe.clone();
            let region = region.clone();

            join_set.spawn(async move {
                let _permit = match sem.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return RegionProbeResult::unreachable(region, e),
                };

                let call = AssertUnwindSafe(async { probe(region.clone()).await });
                match call.catch_unwind().await {
                    Ok(result) => result,
                    Err(panic) => RegionProbeResult::unreachable(
                        &region,
                        format!("probe panicked: {}", panic_message(panic.as_ref())),
                    ),
                }
            });
        }

        let mut results = Vec::with_capacity(regions.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(result) => {
                    if result.success {
                        info!(region = %result.region, zones = ?result.availability_zones, "Region probe succeeded");
                    } else {
                        warn!(region = %result.region, error = ?result.error, "Region probe failed");
                    }
                    on_result(&result);
                    results.push(result);
                }
                Err(e) => warn!(error = %e, "Region worker did not complete"),
            }
        }

        // A worker that never reported still owes its region a result
        let reported: HashSet<String> = results.iter().map(|r| r.region.clone()).collect();
        for region in regions {
            if !reported.contains(region) {
                let missing =
                    RegionProbeResult::unreachable(region, "region worker did not report a result");
                on_result(&missing);
                results.push(missing);
            }
        }

        RegionSweep::from_results(results)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Results of one sweep, in completion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionSweep {
    results: Vec<RegionProbeResult>,
}

impl RegionSweep {
    pub fn from_results(results: Vec<RegionProbeResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[RegionProbeResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result for one region, independent of completion order
    pub fn get(&self, region: &str) -> Option<&RegionProbeResult> {
        self.results.iter().find(|r| r.region == region)
    }

    pub fn by_region(&self) -> BTreeMap<&str, &RegionProbeResult> {
        self.results
            .iter()
            .map(|r| (r.region.as_str(), r))
            .collect()
    }

    pub fn successful(&self) -> impl Iterator<Item = &RegionProbeResult> {
        self.results.iter().filter(|r| r.success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &RegionProbeResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn success_count(&self) -> usize {
        self.successful().count()
    }
}
