//! Data models for the aggregation core.
//!
//! This module contains the core data structures used throughout
//! the application for representing raw source signals, scored
//! observations and merged identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Communication platform a signal was gathered from.
///
/// Declaration order is the default adapter order used when merging
/// position-sensitive identity fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Slack,
    Discord,
    MicrosoftTeams,
    GoogleWorkspace,
    Zoom,
}

impl SourceKind {
    /// Every supported source, in declaration order.
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Slack,
        SourceKind::Discord,
        SourceKind::MicrosoftTeams,
        SourceKind::GoogleWorkspace,
        SourceKind::Zoom,
    ];

    /// Stable identifier used in person keys, file names and configuration.
    pub fn id(&self) -> &'static str {
        match self {
            SourceKind::Slack => "slack",
            SourceKind::Discord => "discord",
            SourceKind::MicrosoftTeams => "microsoft_teams",
            SourceKind::GoogleWorkspace => "google_workspace",
            SourceKind::Zoom => "zoom",
        }
    }

    /// Parse a source identifier (case-insensitive, `-` and `_` interchangeable).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "slack" => Some(SourceKind::Slack),
            "discord" => Some(SourceKind::Discord),
            "microsoft_teams" | "teams" => Some(SourceKind::MicrosoftTeams),
            "google_workspace" | "google" | "gmail" => Some(SourceKind::GoogleWorkspace),
            "zoom" => Some(SourceKind::Zoom),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Slack => write!(f, "Slack"),
            SourceKind::Discord => write!(f, "Discord"),
            SourceKind::MicrosoftTeams => write!(f, "Microsoft Teams"),
            SourceKind::GoogleWorkspace => write!(f, "Google Workspace"),
            SourceKind::Zoom => write!(f, "Zoom"),
        }
    }
}

/// Kind of interaction channel counted per person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    DirectMessage,
    Group,
    Meeting,
    Email,
    FileShare,
}

/// Closeness classification between the observing user and a person.
///
/// Declaration order is the merge priority: `Contact` is lowest and
/// `SelfProfile` highest, so the derived `Ord` picks the winner with `max`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    #[default]
    Contact,
    Teammate,
    FrequentContact,
    Friend,
    #[serde(rename = "self")]
    SelfProfile,
}

impl RelationshipType {
    /// Every relationship type, lowest priority first.
    pub const ALL: [RelationshipType; 5] = [
        RelationshipType::Contact,
        RelationshipType::Teammate,
        RelationshipType::FrequentContact,
        RelationshipType::Friend,
        RelationshipType::SelfProfile,
    ];
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationshipType::Contact => write!(f, "Contact"),
            RelationshipType::Teammate => write!(f, "Teammate"),
            RelationshipType::FrequentContact => write!(f, "Frequent Contact"),
            RelationshipType::Friend => write!(f, "Friend"),
            RelationshipType::SelfProfile => write!(f, "Self"),
        }
    }
}

/// Isolation risk tier derived from a score pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationRisk {
    /// Average score of 80 or more.
    Low,
    /// Average score between 60 and 80.
    Medium,
    /// Average score below 60.
    High,
}

impl fmt::Display for IsolationRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsolationRisk::Low => write!(f, "Low"),
            IsolationRisk::Medium => write!(f, "Medium"),
            IsolationRisk::High => write!(f, "High"),
        }
    }
}

impl IsolationRisk {
    /// Returns an emoji representation of the risk tier.
    pub fn emoji(&self) -> &'static str {
        match self {
            IsolationRisk::Low => "🟢",
            IsolationRisk::Medium => "🟡",
            IsolationRisk::High => "🔴",
        }
    }
}

/// Profile-completeness signals reported by a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSignals {
    pub has_avatar: bool,
    pub has_real_name: bool,
    pub has_title: bool,
    pub has_status: bool,
    pub is_verified: bool,
}

/// Interaction counts per channel kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelCounts {
    pub direct_messages: u32,
    pub group_messages: u32,
    pub meetings: u32,
    pub emails: u32,
    pub file_shares: u32,
}

impl ChannelCounts {
    /// Counts paired with their channel kind.
    pub fn by_channel(&self) -> [(ChannelKind, u32); 5] {
        [
            (ChannelKind::DirectMessage, self.direct_messages),
            (ChannelKind::Group, self.group_messages),
            (ChannelKind::Meeting, self.meetings),
            (ChannelKind::Email, self.emails),
            (ChannelKind::FileShare, self.file_shares),
        ]
    }

    /// True when no channel has any interaction.
    pub fn is_silent(&self) -> bool {
        self.by_channel().iter().all(|(_, count)| *count == 0)
    }
}

/// One platform's normalized view of one person, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSignals {
    /// Platform-local user id.
    pub platform_id: String,
    /// Name shown on the platform.
    #[serde(default)]
    pub display_name: String,
    /// Email address, if the platform exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub profile: ProfileSignals,
    /// Most recent activity seen on the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub interactions: ChannelCounts,
    #[serde(default)]
    pub relationship_type: RelationshipType,
    /// Relationship strength, clamped to 0-100 when observed.
    #[serde(default)]
    pub relationship_strength: u32,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl RawSignals {
    /// Creates a bare signal bundle with only an id and a name.
    pub fn new(platform_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            platform_id: platform_id.into(),
            display_name: display_name.into(),
            email: None,
            avatar: None,
            profile: ProfileSignals::default(),
            last_activity: None,
            interactions: ChannelCounts::default(),
            relationship_type: RelationshipType::Contact,
            relationship_strength: 0,
            metadata: BTreeMap::new(),
        }
    }
}

/// Activity and communication scores, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePair {
    pub activity: u8,
    pub communication: u8,
}

/// One source's scored view of one person in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceObservation {
    /// Source the observation came from.
    pub source: SourceKind,
    /// Platform-local user id.
    pub platform_id: String,
    /// Stable identity key (normalized email or `source:platform_id`).
    pub person_key: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub profile: ProfileSignals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    pub interactions: ChannelCounts,
    pub activity_score: u8,
    pub communication_score: u8,
    pub isolation_risk: IsolationRisk,
    pub relationship_type: RelationshipType,
    pub relationship_strength: u8,
    pub metadata: BTreeMap<String, String>,
}

/// The merged identity of one person across every contributing source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedPerson {
    pub person_key: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Sources that contributed at least one observation.
    pub sources: BTreeSet<SourceKind>,
    pub activity_score: u8,
    pub communication_score: u8,
    pub isolation_risk: IsolationRisk,
    pub relationship_type: RelationshipType,
    pub relationship_strength: u8,
    /// Latest activity across all sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active: Option<DateTime<Utc>>,
    pub metadata: BTreeMap<String, String>,
}

impl UnifiedPerson {
    /// Average of the activity and communication scores.
    pub fn average_score(&self) -> f64 {
        (f64::from(self.activity_score) + f64::from(self.communication_score)) / 2.0
    }
}
