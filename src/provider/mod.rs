//! Cloud Provider Capability
//!
//! Trait-based abstraction over the read-only calls the verifier needs.
//! Credential discovery and the SDK itself live behind the implementation;
//! the probes only see typed results and `ProviderError`.

pub mod aws_cli;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use thiserror::Error;

pub use aws_cli::AwsCliProvider;
pub use types::{Bucket, CallerIdentity, Instance, SecurityGroup, Vpc};

/// Error codes the provider uses for "you are not allowed to do this"
const PERMISSION_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
    "AuthorizationError",
    "403",
];

/// Errors surfaced by a provider call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// No usable credentials were found by the provider
    #[error("Credentials not found: {0}")]
    MissingCredentials(String),

    /// The service answered with a machine-readable error code
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// The call never produced a service answer (network, process, parse)
    #[error("Provider call failed: {0}")]
    Transport(String),
}

impl ProviderError {
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Machine-readable error code, when the service returned one
    pub fn code(&self) -> Option<&str> {
        match self {
            ProviderError::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        self.code()
            .map(|c| PERMISSION_DENIED_CODES.contains(&c))
            .unwrap_or(false)
    }

    pub fn is_missing_credentials(&self) -> bool {
        matches!(self, ProviderError::MissingCredentials(_))
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Read-only cloud provider calls used by the probes.
///
/// Region-scoped calls take `Option<&str>`: `None` means whatever default
/// region the provider resolved from its own configuration.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Short provider label used in logs
    fn name(&self) -> &str;

    /// Identity of the principal the credentials belong to
    async fn caller_identity(&self) -> ProviderResult<CallerIdentity>;

    async fn list_buckets(&self) -> ProviderResult<Vec<Bucket>>;

    async fn list_instances(&self, region: Option<&str>) -> ProviderResult<Vec<Instance>>;

    /// Every region the account can address
    async fn list_regions(&self, region: Option<&str>) -> ProviderResult<Vec<String>>;

    /// Region the provider falls back to when none is given
    async fn default_region(&self) -> Option<String>;

    /// Availability zone names of one region
    async fn availability_zones(&self, region: &str) -> ProviderResult<Vec<String>>;

    async fn list_vpcs(&self, region: Option<&str>) -> ProviderResult<Vec<Vpc>>;

    async fn list_security_groups(&self, region: Option<&str>)
        -> ProviderResult<Vec<SecurityGroup>>;

    /// Managed policy names attached to an IAM user
    async fn list_attached_user_policies(&self, user_name: &str) -> ProviderResult<Vec<String>>;

    /// Inline policy names of an IAM user
    async fn list_user_policies(&self, user_name: &str) -> ProviderResult<Vec<String>>;

    /// Succeeds when the bucket exists and is reachable
    async fn head_bucket(&self, bucket: &str) -> ProviderResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_classification() {
        assert!(ProviderError::service("AccessDenied", "nope").is_permission_denied());
        assert!(ProviderError::service("UnauthorizedOperation", "nope").is_permission_denied());
        assert!(!ProviderError::service("NoSuchBucket", "gone").is_permission_denied());
        assert!(!ProviderError::Transport("AccessDenied".to_string()).is_permission_denied());
    }

    #[test]
    fn test_error_display_keeps_code_and_message() {
        let err = ProviderError::service("404", "Not Found");
        assert_eq!(err.to_string(), "404: Not Found");
        assert_eq!(err.code(), Some("404"));
        assert_eq!(ProviderError::Transport("boom".into()).code(), None);
    }
}
