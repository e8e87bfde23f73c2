//! AWS CLI Provider
//!
//! Drives the `aws` command line tool with `--output json` and maps its
//! responses onto the provider types. Credential discovery (env vars,
//! profiles, SSO, instance roles) is left entirely to the CLI.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::env;
use tokio::process::Command;
use tracing::{debug, warn};

use super::types::{Bucket, CallerIdentity, Instance, SecurityGroup, Vpc};
use super::{CloudProvider, ProviderError, ProviderResult};

const DEFAULT_PROGRAM: &str = "aws";

/// Prefix the CLI uses for service errors: `An error occurred (Code) when ...`
const SERVICE_ERROR_PREFIX: &str = "An error occurred (";

/// Messages the CLI prints when it has nothing to sign requests with
const MISSING_CREDENTIAL_MARKERS: &[&str] = &[
    "Unable to locate credentials",
    "could not be found",
    "Error loading SSO Token",
];

// ============================================================
// Wire Types
// ============================================================

#[derive(Debug, Deserialize)]
struct CallerIdentityResponse {
    #[serde(rename = "UserId")]
    user_id: String,
    #[serde(rename = "Account")]
    account: String,
    #[serde(rename = "Arn")]
    arn: String,
}

#[derive(Debug, Deserialize)]
struct ListBucketsResponse {
    #[serde(rename = "Buckets", default)]
    buckets: Vec<BucketEntry>,
}

#[derive(Debug, Deserialize)]
struct BucketEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "CreationDate")]
    creation_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DescribeInstancesResponse {
    #[serde(rename = "Reservations", default)]
    reservations: Vec<Reservation>,
}

#[derive(Debug, Deserialize)]
struct Reservation {
    #[serde(rename = "Instances", default)]
    instances: Vec<InstanceEntry>,
}

#[derive(Debug, Deserialize)]
struct InstanceEntry {
    #[serde(rename = "InstanceId")]
    instance_id: String,
    #[serde(rename = "State")]
    state: InstanceState,
}

#[derive(Debug, Deserialize)]
struct InstanceState {
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct DescribeRegionsResponse {
    #[serde(rename = "Regions", default)]
    regions: Vec<RegionEntry>,
}

#[derive(Debug, Deserialize)]
struct RegionEntry {
    #[serde(rename = "RegionName")]
    region_name: String,
}

#[derive(Debug, Deserialize)]
struct DescribeAvailabilityZonesResponse {
    #[serde(rename = "AvailabilityZones", default)]
    availability_zones: Vec<ZoneEntry>,
}

#[derive(Debug, Deserialize)]
struct ZoneEntry {
    #[serde(rename = "ZoneName")]
    zone_name: String,
}

#[derive(Debug, Deserialize)]
struct DescribeVpcsResponse {
    #[serde(rename = "Vpcs", default)]
    vpcs: Vec<VpcEntry>,
}

#[derive(Debug, Deserialize)]
struct VpcEntry {
    #[serde(rename = "VpcId")]
    vpc_id: String,
}

#[derive(Debug, Deserialize)]
struct DescribeSecurityGroupsResponse {
    #[serde(rename = "SecurityGroups", default)]
    security_groups: Vec<SecurityGroupEntry>,
}

#[derive(Debug, Deserialize)]
struct SecurityGroupEntry {
    #[serde(rename = "GroupId")]
    group_id: String,
    #[serde(rename = "GroupName", default)]
    group_name: String,
}

#[derive(Debug, Deserialize)]
struct ListAttachedUserPoliciesResponse {
    #[serde(rename = "AttachedPolicies", default)]
    attached_policies: Vec<AttachedPolicy>,
}

#[derive(Debug, Deserialize)]
struct AttachedPolicy {
    #[serde(rename = "PolicyName")]
    policy_name: String,
}

#[derive(Debug, Deserialize)]
struct ListUserPoliciesResponse {
    #[serde(rename = "PolicyNames", default)]
    policy_names: Vec<String>,
}

// ============================================================
// Provider Implementation
// ============================================================

/// `CloudProvider` backed by the AWS CLI
#[derive(Debug, Clone)]
pub struct AwsCliProvider {
    /// CLI executable (name on PATH or absolute path)
    program: String,
    /// Named profile passed as `--profile`
    profile: Option<String>,
    /// Region override; `None` lets the CLI resolve its own default
    region: Option<String>,
}

impl Default for AwsCliProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AwsCliProvider {
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            profile: None,
            region: None,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    fn command(&self, args: &[&str], region: Option<&str>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args).args(["--output", "json"]).env("AWS_PAGER", "");

        if let Some(profile) = &self.profile {
            cmd.args(["--profile", profile.as_str()]);
        }
        if let Some(region) = region.or(self.region.as_deref()) {
            cmd.args(["--region", region]);
        }
        cmd
    }

    /// Run one CLI call and return its stdout
    async fn run(&self, args: &[&str], region: Option<&str>) -> ProviderResult<String> {
        debug!(program = %self.program, ?args, ?region, "Running provider call");

        let output = self
            .command(args, region)
            .output()
            .await
            .map_err(|e| {
                ProviderError::Transport(format!("failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(parse_cli_error(&stderr));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| ProviderError::Transport(format!("non UTF-8 output: {}", e)))
    }

    async fn run_json<T: DeserializeOwned>(
        &self,
        args: &[&str],
        region: Option<&str>,
    ) -> ProviderResult<T> {
        let body = self.run(args, region).await?;
        serde_json::from_str(&body).map_err(|e| {
            ProviderError::Transport(format!("failed to parse `{}` response: {}", args.join(" "), e))
        })
    }
}

#[async_trait]
impl CloudProvider for AwsCliProvider {
    fn name(&self) -> &str {
        "aws"
    }

    async fn caller_identity(&self) -> ProviderResult<CallerIdentity> {
        let resp: CallerIdentityResponse =
            self.run_json(&["sts", "get-caller-identity"], None).await?;

        Ok(CallerIdentity {
            user_id: resp.user_id,
            account: resp.account,
            arn: resp.arn,
        })
    }

    async fn list_buckets(&self) -> ProviderResult<Vec<Bucket>> {
        let resp: ListBucketsResponse = self.run_json(&["s3api", "list-buckets"], None).await?;

        Ok(resp
            .buckets
            .into_iter()
            .map(|b| Bucket {
                created: b.creation_date.as_deref().and_then(parse_timestamp),
                name: b.name,
            })
            .collect())
    }

    async fn list_instances(&self, region: Option<&str>) -> ProviderResult<Vec<Instance>> {
        let resp: DescribeInstancesResponse =
            self.run_json(&["ec2", "describe-instances"], region).await?;

        Ok(resp
            .reservations
            .into_iter()
            .flat_map(|r| r.instances)
            .map(|i| Instance {
                id: i.instance_id,
                state: i.state.name,
            })
            .collect())
    }

    async fn list_regions(&self, region: Option<&str>) -> ProviderResult<Vec<String>> {
        let resp: DescribeRegionsResponse =
            self.run_json(&["ec2", "describe-regions"], region).await?;

        Ok(resp.regions.into_iter().map(|r| r.region_name).collect())
    }

    async fn default_region(&self) -> Option<String> {
        if let Some(region) = &self.region {
            return Some(region.clone());
        }

        for var in ["AWS_REGION", "AWS_DEFAULT_REGION"] {
            if let Ok(region) = env::var(var) {
                if !region.trim().is_empty() {
                    return Some(region.trim().to_string());
                }
            }
        }

        // `configure get` prints plain text, so skip the json helper
        let mut cmd = Command::new(&self.program);
        cmd.args(["configure", "get", "region"]);
        if let Some(profile) = &self.profile {
            cmd.args(["--profile", profile.as_str()]);
        }

        match cmd.output().await {
            Ok(output) if output.status.success() => {
                let region = String::from_utf8_lossy(&output.stdout).trim().to_string();
                (!region.is_empty()).then_some(region)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to resolve default region from {}: {}", self.program, e);
                None
            }
        }
    }

    async fn availability_zones(&self, region: &str) -> ProviderResult<Vec<String>> {
        let resp: DescribeAvailabilityZonesResponse = self
            .run_json(&["ec2", "describe-availability-zones"], Some(region))
            .await?;

        Ok(resp
            .availability_zones
            .into_iter()
            .map(|z| z.zone_name)
            .collect())
    }

    async fn list_vpcs(&self, region: Option<&str>) -> ProviderResult<Vec<Vpc>> {
        let resp: DescribeVpcsResponse = self.run_json(&["ec2", "describe-vpcs"], region).await?;

        Ok(resp.vpcs.into_iter().map(|v| Vpc { id: v.vpc_id }).collect())
    }

    async fn list_security_groups(
        &self,
        region: Option<&str>,
    ) -> ProviderResult<Vec<SecurityGroup>> {
        let resp: DescribeSecurityGroupsResponse = self
            .run_json(&["ec2", "describe-security-groups"], region)
            .await?;

        Ok(resp
            .security_groups
            .into_iter()
            .map(|g| SecurityGroup {
                id: g.group_id,
                name: g.group_name,
            })
            .collect())
    }

    async fn list_attached_user_policies(&self, user_name: &str) -> ProviderResult<Vec<String>> {
        let resp: ListAttachedUserPoliciesResponse = self
            .run_json(
                &["iam", "list-attached-user-policies", "--user-name", user_name],
                None,
            )
            .await?;

        Ok(resp
            .attached_policies
            .into_iter()
            .map(|p| p.policy_name)
            .collect())
    }

    async fn list_user_policies(&self, user_name: &str) -> ProviderResult<Vec<String>> {
        let resp: ListUserPoliciesResponse = self
            .run_json(&["iam", "list-user-policies", "--user-name", user_name], None)
            .await?;

        Ok(resp.policy_names)
    }

    async fn head_bucket(&self, bucket: &str) -> ProviderResult<()> {
        self.run(&["s3api", "head-bucket", "--bucket", bucket], None)
            .await
            .map(|_| ())
    }
}

/// Map CLI stderr onto a `ProviderError`.
///
/// Service errors look like
/// `An error occurred (AccessDenied) when calling the ListUsers operation: ...`.
fn parse_cli_error(stderr: &str) -> ProviderError {
    let stderr = stderr.trim();

    if let Some(start) = stderr.find(SERVICE_ERROR_PREFIX) {
        let rest = &stderr[start + SERVICE_ERROR_PREFIX.len()..];
        if let Some(end) = rest.find(')') {
            let code = &rest[..end];
            let message = rest[end + 1..]
                .split_once(": ")
                .map(|(_, msg)| msg.trim())
                .unwrap_or(stderr);
            return ProviderError::service(code, message);
        }
    }

    if MISSING_CREDENTIAL_MARKERS.iter().any(|m| stderr.contains(m)) {
        return ProviderError::MissingCredentials(stderr.to_string());
    }

    ProviderError::Transport(stderr.to_string())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
}
