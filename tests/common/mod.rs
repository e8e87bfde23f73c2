#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cloud_verify::console::CaptureBuffer;
use cloud_verify::provider::{Bucket, CallerIdentity, Instance, SecurityGroup, Vpc};
use cloud_verify::{
    Clock, CloudProvider, Console, ProviderError, ProviderResult, Sleeper, VerificationPipeline,
    VerifyConfig,
};

pub const ACCOUNT: &str = "210987654321";
pub const USER_ARN: &str = "arn:aws:iam::210987654321:user/deploy";

/// Account state a test wants the provider to report
pub struct ScriptedCloud {
    pub identity: ProviderResult<CallerIdentity>,
    pub buckets: ProviderResult<Vec<Bucket>>,
    pub instances: ProviderResult<Vec<Instance>>,
    pub regions: ProviderResult<Vec<String>>,
    pub failing_regions: HashMap<String, ProviderError>,
    pub hanging_regions: Vec<String>,
    pub vpcs: usize,
    pub policies_denied: bool,
    pub head_bucket: ProviderResult<()>,
}

impl Default for ScriptedCloud {
    fn default() -> Self {
        Self {
            identity: Ok(CallerIdentity {
                user_id: "AIDADEPLOY".to_string(),
                account: ACCOUNT.to_string(),
                arn: USER_ARN.to_string(),
            }),
            buckets: Ok(vec![Bucket {
                name: "artifacts".to_string(),
                created: Some(Utc.with_ymd_and_hms(2023, 3, 14, 0, 0, 0).unwrap()),
            }]),
            instances: Ok(vec![Instance {
                id: "i-0abc".to_string(),
                state: "running".to_string(),
            }]),
            regions: Ok(vec!["us-east-1".to_string(), "us-west-2".to_string()]),
            failing_regions: HashMap::new(),
            hanging_regions: Vec::new(),
            vpcs: 2,
            policies_denied: false,
            head_bucket: Err(ProviderError::service("NoSuchBucket", "bucket missing")),
        }
    }
}

impl ScriptedCloud {
    pub fn fail_region(mut self, region: &str, error: ProviderError) -> Self {
        self.failing_regions.insert(region.to_string(), error);
        self
    }

    /// The region's AZ lookup never returns
    pub fn hang_region(mut self, region: &str) -> Self {
        self.hanging_regions.push(region.to_string());
        self
    }
}

#[async_trait]
impl CloudProvider for ScriptedCloud {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn caller_identity(&self) -> ProviderResult<CallerIdentity> {
        self.identity.clone()
    }

    async fn list_buckets(&self) -> ProviderResult<Vec<Bucket>> {
        self.buckets.clone()
    }

    async fn list_instances(&self, _region: Option<&str>) -> ProviderResult<Vec<Instance>> {
        self.instances.clone()
    }

    async fn list_regions(&self, _region: Option<&str>) -> ProviderResult<Vec<String>> {
        self.regions.clone()
    }

    async fn default_region(&self) -> Option<String> {
        Some("us-east-1".to_string())
    }

    async fn availability_zones(&self, region: &str) -> ProviderResult<Vec<String>> {
        if self.hanging_regions.iter().any(|r| r == region) {
            futures::future::pending::<()>().await;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        match self.failing_regions.get(region) {
            Some(error) => Err(error.clone()),
            None => Ok(vec![format!("{}a", region), format!("{}b", region)]),
        }
    }

    async fn list_vpcs(&self, _region: Option<&str>) -> ProviderResult<Vec<Vpc>> {
        Ok((0..self.vpcs)
            .map(|i| Vpc {
                id: format!("vpc-{:04}", i),
            })
            .collect())
    }

    async fn list_security_groups(
        &self,
        _region: Option<&str>,
    ) -> ProviderResult<Vec<SecurityGroup>> {
        Ok(vec![SecurityGroup {
            id: "sg-1".to_string(),
            name: "default".to_string(),
        }])
    }

    async fn list_attached_user_policies(&self, _user_name: &str) -> ProviderResult<Vec<String>> {
        if self.policies_denied {
            return Err(ProviderError::service("AccessDenied", "not authorized"));
        }
        Ok(vec!["ReadOnlyAccess".to_string()])
    }

    async fn list_user_policies(&self, _user_name: &str) -> ProviderResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn head_bucket(&self, _bucket: &str) -> ProviderResult<()> {
        self.head_bucket.clone()
    }
}

pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 2, 8, 5, 9).unwrap()
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

pub struct Harness {
    pub pipeline: VerificationPipeline,
    pub sleeper: Arc<RecordingSleeper>,
    pub output: CaptureBuffer,
}

pub fn harness(cloud: ScriptedCloud, config: VerifyConfig) -> Harness {
    let (console, output) = Console::capture();
    let sleeper = Arc::new(RecordingSleeper::default());
    let pipeline = VerificationPipeline::new(Arc::new(cloud), config)
        .with_clock(Arc::new(FixedClock))
        .with_sleeper(sleeper.clone())
        .with_console(console);

    Harness {
        pipeline,
        sleeper,
        output,
    }
}
