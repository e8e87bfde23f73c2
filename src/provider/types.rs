//! Provider Result Types
//!
//! Domain shapes returned by `CloudProvider` calls, independent of the
//! wire format of any concrete provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Path segment that marks an IAM user principal in an ARN
const USER_PRINCIPAL_MARKER: &str = ":user/";

/// Principal behind the active credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: String,
    pub account: String,
    pub arn: String,
}

impl CallerIdentity {
    /// Whether the principal is an IAM user (as opposed to a role/session)
    pub fn is_user(&self) -> bool {
        self.arn.contains(USER_PRINCIPAL_MARKER)
    }

    /// IAM user name, taken from the last path segment of a user ARN
    pub fn user_name(&self) -> Option<&str> {
        if !self.is_user() {
            return None;
        }
        self.arn.rsplit('/').next().filter(|name| !name.is_empty())
    }
}

/// Storage bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub created: Option<DateTime<Utc>>,
}

/// Compute instance with its lifecycle state label (e.g. "running")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub state: String,
}

/// Virtual network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vpc {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
}
