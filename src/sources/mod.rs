//! Source adapters and the best-effort fan-in.
//!
//! Every adapter is fetched concurrently under a shared timeout. A failing
//! or slow adapter only loses its own batch; the cycle continues with
//! whatever succeeded and reports the rest as [`SourceError`]s.

pub mod file;

pub use file::JsonFileAdapter;

use crate::error::AdapterFetchError;
use crate::models::{RawSignals, SourceKind};
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A platform-specific producer of normalized person signals.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Source this adapter reads from.
    fn kind(&self) -> SourceKind;

    /// Fetch one batch of normalized signals.
    async fn fetch(&self) -> Result<Vec<RawSignals>, AdapterFetchError>;
}

/// How loudly a source failure should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Partial access, e.g. a missing scope.
    Warning,
    Error,
}

impl ErrorSeverity {
    pub fn emoji(&self) -> &'static str {
        match self {
            ErrorSeverity::Warning => "⚠️",
            ErrorSeverity::Error => "❌",
        }
    }
}

/// One source's failure in a cycle, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceError {
    pub source: SourceKind,
    pub message: String,
    pub severity: ErrorSeverity,
}

impl SourceError {
    /// Classify an adapter failure.
    pub fn from_fetch_error(error: &AdapterFetchError) -> Self {
        let severity = if error.is_permission_limited() {
            ErrorSeverity::Warning
        } else {
            ErrorSeverity::Error
        };

        Self {
            source: error.source_kind(),
            message: error.to_string(),
            severity,
        }
    }
}

impl From<AdapterFetchError> for SourceError {
    fn from(error: AdapterFetchError) -> Self {
        Self::from_fetch_error(&error)
    }
}

/// Successful batches in adapter order, plus one error per failed adapter.
pub type CollectedSignals = (Vec<(SourceKind, Vec<RawSignals>)>, Vec<SourceError>);

/// Fetch every adapter concurrently, each bounded by `timeout`.
///
/// Never fails as a whole. Output order follows `adapters`, not completion
/// order.
pub async fn collect_signals(
    adapters: &[Box<dyn SourceAdapter>],
    timeout: Duration,
) -> CollectedSignals {
    info!("Fetching from {} source adapters", adapters.len());

    let fetches = adapters.iter().map(|adapter| async move {
        let kind = adapter.kind();
        let result = match tokio::time::timeout(timeout, adapter.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(AdapterFetchError::Timeout {
                source_kind: kind,
                millis: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };
        (kind, result)
    });

    let mut batches = Vec::new();
    let mut errors = Vec::new();

    for (kind, result) in join_all(fetches).await {
        match result {
            Ok(signals) => {
                debug!("{}: {} signals", kind, signals.len());
                batches.push((kind, signals));
            }
            Err(e) => {
                let error = SourceError::from(e);
                warn!("{} {}", error.severity.emoji(), error.message);
                errors.push(error);
            }
        }
    }

    info!(
        "Collected {} batches, {} source errors",
        batches.len(),
        errors.len()
    );

    (batches, errors)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Adapter returning a canned result after an optional delay.
    pub struct StubAdapter {
        pub kind: SourceKind,
        pub delay: Option<Duration>,
        pub outcome: Result<Vec<RawSignals>, fn(SourceKind) -> AdapterFetchError>,
    }

    impl StubAdapter {
        pub fn ok(kind: SourceKind, signals: Vec<RawSignals>) -> Self {
            Self {
                kind,
                delay: None,
                outcome: Ok(signals),
            }
        }

        pub fn failing(kind: SourceKind, error: fn(SourceKind) -> AdapterFetchError) -> Self {
            Self {
                kind,
                delay: None,
                outcome: Err(error),
            }
        }

        pub fn slow(kind: SourceKind, delay: Duration) -> Self {
            Self {
                kind,
                delay: Some(delay),
                outcome: Ok(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SourceAdapter for StubAdapter {
        fn kind(&self) -> SourceKind {
            self.kind
        }

        async fn fetch(&self) -> Result<Vec<RawSignals>, AdapterFetchError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.outcome {
                Ok(signals) => Ok(signals.clone()),
                Err(error) => Err(error(self.kind)),
            }
        }
    }
}
