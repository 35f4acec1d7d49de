//! Identity resolution and cross-source merging.
//!
//! Observations of the same person from different sources are grouped by
//! person key and folded into one [`UnifiedPerson`].

pub mod merge;

pub use merge::{IdentityMerger, SourcePrecedence};

use crate::models::SourceKind;

/// Normalize an email address for use as an identity key.
///
/// Returns `None` for empty values and values without an `@`.
pub fn normalize_email(email: Option<&str>) -> Option<String> {
    let trimmed = email?.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Compute the stable identity key for one platform account.
///
/// A normalized email wins. Without one the key is scoped to the source,
/// so accounts of the same person on two platforms without a shared email
/// are never merged.
pub fn resolve_person_key(source: SourceKind, email: Option<&str>, platform_id: &str) -> String {
    match normalize_email(email) {
        Some(email) => email,
        None => format!("{}:{}", source.id(), platform_id.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email(Some("  Ada@Example.COM ")),
            Some("ada@example.com".to_string())
        );
        assert_eq!(normalize_email(Some("")), None);
        assert_eq!(normalize_email(Some("not-an-email")), None);
        assert_eq!(normalize_email(None), None);
    }

    #[test]
    fn test_key_prefers_email() {
        let key = resolve_person_key(SourceKind::Slack, Some("A@X.com"), "U1");
        assert_eq!(key, "a@x.com");
    }

    #[test]
    fn test_key_falls_back_to_source_scoped_id() {
        assert_eq!(
            resolve_person_key(SourceKind::Discord, None, "1234"),
            "discord:1234"
        );
        assert_eq!(
            resolve_person_key(SourceKind::MicrosoftTeams, Some(" "), "abc"),
            "microsoft_teams:abc"
        );
        assert_ne!(
            resolve_person_key(SourceKind::Slack, None, "1234"),
            resolve_person_key(SourceKind::Discord, None, "1234")
        );
    }
}
