//! Scripted provider for unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::types::{Bucket, CallerIdentity, Instance, SecurityGroup, Vpc};
use super::{CloudProvider, ProviderError, ProviderResult};

pub(crate) const USER_ARN: &str = "arn:aws:iam::123456789012:user/alice";
pub(crate) const ROLE_ARN: &str = "arn:aws:sts::123456789012:assumed-role/ci/runner";

/// Every call answers from a field; unset region AZ lookups return three zones.
pub(crate) struct FakeCloud {
    pub identity: ProviderResult<CallerIdentity>,
    pub buckets: ProviderResult<Vec<Bucket>>,
    pub instances: ProviderResult<Vec<Instance>>,
    pub regions: ProviderResult<Vec<String>>,
    pub default_region: Option<String>,
    pub zones: HashMap<String, ProviderResult<Vec<String>>>,
    pub vpcs: ProviderResult<Vec<Vpc>>,
    pub security_groups: ProviderResult<Vec<SecurityGroup>>,
    pub attached_policies: ProviderResult<Vec<String>>,
    pub inline_policies: ProviderResult<Vec<String>>,
    pub head_bucket: ProviderResult<()>,
    pub calls: Mutex<Vec<String>>,
}

impl Default for FakeCloud {
    fn default() -> Self {
        Self {
            identity: Ok(identity(ROLE_ARN)),
            buckets: Ok(Vec::new()),
            instances: Ok(Vec::new()),
            regions: Ok(vec!["us-east-1".to_string(), "eu-west-1".to_string()]),
            default_region: Some("us-east-1".to_string()),
            zones: HashMap::new(),
            vpcs: Ok(vec![Vpc {
                id: "vpc-1".to_string(),
            }]),
            security_groups: Ok(Vec::new()),
            attached_policies: Ok(Vec::new()),
            inline_policies: Ok(Vec::new()),
            head_bucket: Err(ProviderError::service("404", "Not Found")),
            calls: Mutex::new(Vec::new()),
        }
    }
}

pub(crate) fn identity(arn: &str) -> CallerIdentity {
    CallerIdentity {
        user_id: "AIDAEXAMPLE".to_string(),
        account: "123456789012".to_string(),
        arn: arn.to_string(),
    }
}

impl FakeCloud {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl CloudProvider for FakeCloud {
    fn name(&self) -> &str {
        "fake"
    }

    async fn caller_identity(&self) -> ProviderResult<CallerIdentity> {
        self.record("caller_identity");
        self.identity.clone()
    }

    async fn list_buckets(&self) -> ProviderResult<Vec<Bucket>> {
        self.record("list_buckets");
        self.buckets.clone()
    }

    async fn list_instances(&self, _region: Option<&str>) -> ProviderResult<Vec<Instance>> {
        self.record("list_instances");
        self.instances.clone()
    }

    async fn list_regions(&self, _region: Option<&str>) -> ProviderResult<Vec<String>> {
        self.record("list_regions");
        self.regions.clone()
    }

    async fn default_region(&self) -> Option<String> {
        self.default_region.clone()
    }

    async fn availability_zones(&self, region: &str) -> ProviderResult<Vec<String>> {
        self.record(&format!("availability_zones:{}", region));
        self.zones.get(region).cloned().unwrap_or_else(|| {
            Ok(["a", "b", "c"]
                .iter()
                .map(|z| format!("{}{}", region, z))
                .collect())
        })
    }

    async fn list_vpcs(&self, _region: Option<&str>) -> ProviderResult<Vec<Vpc>> {
        self.record("list_vpcs");
        self.vpcs.clone()
    }

    async fn list_security_groups(
        &self,
        _region: Option<&str>,
    ) -> ProviderResult<Vec<SecurityGroup>> {
        self.record("list_security_groups");
        self.security_groups.clone()
    }

    async fn list_attached_user_policies(&self, user_name: &str) -> ProviderResult<Vec<String>> {
        self.record(&format!("list_attached_user_policies:{}", user_name));
        self.attached_policies.clone()
    }

    async fn list_user_policies(&self, user_name: &str) -> ProviderResult<Vec<String>> {
        self.record(&format!("list_user_policies:{}", user_name));
        self.inline_policies.clone()
    }

    async fn head_bucket(&self, bucket: &str) -> ProviderResult<()> {
        self.record(&format!("head_bucket:{}", bucket));
        self.head_bucket.clone()
    }
}
