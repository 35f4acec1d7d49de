//! Error types for the aggregation core.
//!
//! Adapter failures are recoverable and scoped to one source; they are
//! collected into the cycle outcome instead of aborting it. Merge errors
//! signal a broken identity invariant and are returned to the caller.

use crate::models::SourceKind;
use thiserror::Error;

/// Failure of one source adapter to produce observations.
#[derive(Debug, Error)]
pub enum AdapterFetchError {
    #[error("I/O error reading {source_kind} export: {message}")]
    Io {
        source_kind: SourceKind,
        message: String,
    },

    #[error("failed to parse {source_kind} export: {message}")]
    Parse {
        source_kind: SourceKind,
        message: String,
    },

    #[error("permission denied for {source_kind}: {message}")]
    PermissionDenied {
        source_kind: SourceKind,
        message: String,
    },

    #[error("{source_kind} fetch timed out after {millis}ms")]
    Timeout { source_kind: SourceKind, millis: u64 },

    #[error("{source_kind} is unavailable: {message}")]
    Unavailable {
        source_kind: SourceKind,
        message: String,
    },
}

impl AdapterFetchError {
    /// Source the failure is scoped to.
    pub fn source_kind(&self) -> SourceKind {
        match self {
            Self::Io { source_kind, .. }
            | Self::Parse { source_kind, .. }
            | Self::PermissionDenied { source_kind, .. }
            | Self::Timeout { source_kind, .. }
            | Self::Unavailable { source_kind, .. } => *source_kind,
        }
    }

    /// Whether the failure reflects a permission or scope limitation
    /// rather than a hard failure.
    ///
    /// Only the upstream message is inspected. Context such as file paths
    /// never reaches the check.
    pub fn is_permission_limited(&self) -> bool {
        match self {
            Self::PermissionDenied { .. } => true,
            Self::Io { message, .. } | Self::Unavailable { message, .. } => {
                mentions_permission(message)
            }
            Self::Parse { .. } | Self::Timeout { .. } => false,
        }
    }
}

fn mentions_permission(message: &str) -> bool {
    let message = message.to_lowercase();
    ["scope", "permission", "forbidden", "not allowed", "not_allowed"]
        .iter()
        .any(|needle| message.contains(needle))
}

/// Broken identity invariant found while merging observations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("{source_kind} observation {platform_id} has key '{found}', expected '{expected}'")]
    InconsistentKey {
        source_kind: SourceKind,
        platform_id: String,
        found: String,
        expected: String,
    },
}
