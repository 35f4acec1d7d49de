//! File-backed source adapter.
//!
//! Reads a platform export written as a JSON array of [`RawSignals`] from
//! `<dir>/<source id>.json`.

use super::SourceAdapter;
use crate::error::AdapterFetchError;
use crate::models::{RawSignals, SourceKind};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Adapter over one per-source JSON export file.
#[derive(Debug, Clone)]
pub struct JsonFileAdapter {
    kind: SourceKind,
    path: PathBuf,
}

impl JsonFileAdapter {
    /// Adapter for `kind`, reading `<dir>/<kind id>.json`.
    pub fn new(dir: &Path, kind: SourceKind) -> Self {
        Self {
            kind,
            path: dir.join(format!("{}.json", kind.id())),
        }
    }

    /// One boxed adapter per requested source, in the given order.
    pub fn for_sources(dir: &Path, kinds: &[SourceKind]) -> Vec<Box<dyn SourceAdapter>> {
        kinds
            .iter()
            .map(|kind| Box::new(Self::new(dir, *kind)) as Box<dyn SourceAdapter>)
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, content: &str) -> Result<Vec<RawSignals>, AdapterFetchError> {
        serde_json::from_str(content).map_err(|e| AdapterFetchError::Parse {
            source_kind: self.kind,
            message: format!("{}: {}", self.path.display(), e),
        })
    }
}

#[async_trait]
impl SourceAdapter for JsonFileAdapter {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self) -> Result<Vec<RawSignals>, AdapterFetchError> {
        debug!("Reading {} export from {}", self.kind, self.path.display());

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| {
                debug!("Failed to read {}: {}", self.path.display(), e);
                // The path stays out of the message: permission detection reads it.
                let message = e.to_string();
                match e.kind() {
                    ErrorKind::NotFound => AdapterFetchError::Unavailable {
                        source_kind: self.kind,
                        message: format!("{}.json not found", self.kind.id()),
                    },
                    ErrorKind::PermissionDenied => AdapterFetchError::PermissionDenied {
                        source_kind: self.kind,
                        message,
                    },
                    _ => AdapterFetchError::Io {
                        source_kind: self.kind,
                        message,
                    },
                }
            })?;

        self.parse(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RelationshipType;
    use crate::sources::{ErrorSeverity, SourceError};
    use std::fs;
    use tempfile::TempDir;

    fn fixtures_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/exports")
    }

    #[test]
    fn test_path_uses_source_id() {
        let adapter = JsonFileAdapter::new(Path::new("/data"), SourceKind::MicrosoftTeams);
        assert_eq!(adapter.path(), Path::new("/data/microsoft_teams.json"));
        assert_eq!(adapter.kind(), SourceKind::MicrosoftTeams);
    }

    #[tokio::test]
    async fn test_reads_fixture_export() {
        let adapter = JsonFileAdapter::new(&fixtures_dir(), SourceKind::Slack);
        let signals = adapter.fetch().await.unwrap();

        assert!(!signals.is_empty());
        let ana = signals.iter().find(|s| s.platform_id == "U001").unwrap();
        assert_eq!(ana.email.as_deref(), Some("ana@acme.io"));
        assert_eq!(ana.relationship_type, RelationshipType::Friend);
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let adapter = JsonFileAdapter::new(dir.path(), SourceKind::Zoom);

        let err = adapter.fetch().await.unwrap_err();
        assert!(matches!(err, AdapterFetchError::Unavailable { .. }));
        assert_eq!(err.source_kind(), SourceKind::Zoom);
    }

    #[tokio::test]
    async fn test_missing_file_under_suggestive_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let exports = dir.path().join("telescope-exports");
        fs::create_dir(&exports).unwrap();
        let adapter = JsonFileAdapter::new(&exports, SourceKind::Slack);

        let err = adapter.fetch().await.unwrap_err();
        assert!(!err.to_string().contains("telescope"));
        assert!(!err.is_permission_limited());
        assert_eq!(SourceError::from(err).severity, ErrorSeverity::Error);

        let nested = dir.path().join("x").join("telescope");
        fs::create_dir_all(&nested).unwrap();
        let adapter = JsonFileAdapter::new(&nested, SourceKind::MicrosoftTeams);
        let err = adapter.fetch().await.unwrap_err();
        assert_eq!(SourceError::from(err).severity, ErrorSeverity::Error);
    }

    #[tokio::test]
    async fn test_malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("discord.json"), "{ not json").unwrap();
        let adapter = JsonFileAdapter::new(dir.path(), SourceKind::Discord);

        let err = adapter.fetch().await.unwrap_err();
        assert!(matches!(err, AdapterFetchError::Parse { .. }));
        assert!(!err.is_permission_limited());
    }

    #[tokio::test]
    async fn test_minimal_records_use_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("zoom.json"),
            r#"[{"platform_id": "Z1", "display_name": "Kim", "interactions": {"meetings": 4}}]"#,
        )
        .unwrap();

        let adapters = JsonFileAdapter::for_sources(dir.path(), &[SourceKind::Zoom]);
        let signals = adapters[0].fetch().await.unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].interactions.meetings, 4);
        assert_eq!(signals[0].interactions.direct_messages, 0);
        assert!(signals[0].email.is_none());
    }
}
