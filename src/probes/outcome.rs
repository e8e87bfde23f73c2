//! Probe Outcome Types
//!
//! `ProbeOutcome` is what the aggregator records; `ProbeVerdict` is what a
//! probe body returns before the boundary stamps it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Probe details, keyed by name. Key order carries no meaning.
pub type Details = BTreeMap<String, Value>;

/// Recorded result of one probe. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeOutcome {
    test_name: String,
    success: bool,
    timestamp: DateTime<Utc>,
    details: Details,
    error: Option<String>,
}

impl ProbeOutcome {
    pub fn passed(test_name: impl Into<String>, details: Details, timestamp: DateTime<Utc>) -> Self {
        Self {
            test_name: test_name.into(),
            success: true,
            timestamp,
            details,
            error: None,
        }
    }

    /// Semantically failed check: the call worked but the answer was wrong
    pub fn failed(test_name: impl Into<String>, details: Details, timestamp: DateTime<Utc>) -> Self {
        Self {
            test_name: test_name.into(),
            success: false,
            timestamp,
            details,
            error: None,
        }
    }

    /// Check that could not complete; always unsuccessful
    pub fn errored(
        test_name: impl Into<String>,
        details: Details,
        error: impl fmt::Display,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            success: false,
            timestamp,
            details,
            error: Some(error.to_string()),
        }
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Pass/fail decision plus details, before timestamping
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeVerdict {
    pub success: bool,
    pub details: Details,
}

impl ProbeVerdict {
    pub fn pass(details: Details) -> Self {
        Self {
            success: true,
            details,
        }
    }

    pub fn fail(details: Details) -> Self {
        Self {
            success: false,
            details,
        }
    }
}

/// Connectivity result for one region of a sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionProbeResult {
    pub region: String,
    pub success: bool,
    pub availability_zones: Option<usize>,
    pub error: Option<String>,
}

impl RegionProbeResult {
    pub fn reachable(region: impl Into<String>, availability_zones: usize) -> Self {
        Self {
            region: region.into(),
            success: true,
            availability_zones: Some(availability_zones),
            error: None,
        }
    }

    pub fn unreachable(region: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            region: region.into(),
            success: false,
            availability_zones: None,
            error: Some(error.to_string()),
        }
    }
}

/// Shorthand for building `Details` from literal pairs
#[macro_export]
macro_rules! details {
    () => { $crate::probes::Details::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut details = $crate::probes::Details::new();
        $( details.insert($key.to_string(), ::serde_json::json!($value)); )+
        details
    }};
}
