//! Risk analysis: population partitioning, recommendations and insights.
//!
//! Everything here is a structured fact (kinds, counts, rates, person
//! references). Prose lives in [`super::messages`].

use super::aggregator::{
    distinct_relationship_types, group_by_relationship, group_by_risk, group_by_source,
    percentage, ratio, strong_relationship_count,
};
use super::health::RiskHistogram;
use crate::models::{IsolationRisk, RelationshipType, SourceKind, UnifiedPerson};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Relationship strength below which an at-risk person counts as isolated.
pub const ISOLATED_STRENGTH_THRESHOLD: u8 = 50;

/// Relationship strength below which a relationship counts as weak.
pub const WEAK_STRENGTH_THRESHOLD: u8 = 40;

/// High-risk share above which a source is flagged.
pub const SOURCE_CONCENTRATION_THRESHOLD: f64 = 0.3;

/// A source must have more members than this to be flagged.
pub const SOURCE_CONCENTRATION_MIN_MEMBERS: usize = 3;

/// Priority of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
            Priority::Critical => write!(f, "Critical"),
        }
    }
}

/// Suggested time frame for acting on a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeline {
    Within48Hours,
    ThisWeek,
    WithinTwoWeeks,
    ThisMonth,
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeline::Within48Hours => write!(f, "within 48 hours"),
            Timeline::ThisWeek => write!(f, "this week"),
            Timeline::WithinTwoWeeks => write!(f, "within two weeks"),
            Timeline::ThisMonth => write!(f, "this month"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ImmediateCheckIn,
    ReconnectWithFriends,
    SupportTeammates,
    ReachOutToContacts,
    MaintainFrequentContacts,
    CheckInMediumRisk,
    BuildRelationships,
}

/// Reference to a person affected by a recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub person_key: String,
    pub display_name: String,
}

impl From<&UnifiedPerson> for PersonRef {
    fn from(person: &UnifiedPerson) -> Self {
        Self {
            person_key: person.person_key.clone(),
            display_name: person.display_name.clone(),
        }
    }
}

/// A structured, prioritized recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub timeline: Timeline,
    /// Risk tier the rule selected on, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_tier: Option<IsolationRisk>,
    /// Relationship types present among the affected persons.
    pub relationship_types: Vec<RelationshipType>,
    pub persons: Vec<PersonRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    IsolationRate,
    SourceRiskConcentration,
    RelationshipDiversity,
    StrongRelationshipRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSeverity {
    Success,
    Info,
    Warning,
    Critical,
}

impl InsightSeverity {
    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            InsightSeverity::Success => "✅",
            InsightSeverity::Info => "ℹ️",
            InsightSeverity::Warning => "⚠️",
            InsightSeverity::Critical => "🚨",
        }
    }
}

/// A population-level finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub severity: InsightSeverity,
    /// Source the insight is scoped to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceKind>,
    /// Number of persons (or types) the insight counts.
    pub count: usize,
    /// Size of the population the rate is computed over.
    pub population: usize,
    /// `count` as a percentage of `population`, one decimal.
    pub rate: f64,
    pub action_required: bool,
}

/// Headline counts of the risk analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total_persons: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    pub isolated: usize,
    pub weak_relationships: usize,
    pub strong_relationships: usize,
    pub isolation_rate: f64,
    pub strong_relationship_rate: f64,
}

/// Risk breakdown for one relationship type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRisk {
    pub total: usize,
    pub histogram: RiskHistogram,
    pub average_strength: f64,
}

/// The complete risk analysis of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysisReport {
    pub summary: RiskSummary,
    pub by_relationship: BTreeMap<RelationshipType, RelationshipRisk>,
    pub recommendations: Vec<Recommendation>,
    pub critical_insights: Vec<Insight>,
}

/// High risk, weak relationship, and not the observing user.
pub fn is_isolated(person: &UnifiedPerson) -> bool {
    person.isolation_risk == IsolationRisk::High
        && person.relationship_strength < ISOLATED_STRENGTH_THRESHOLD
        && person.relationship_type != RelationshipType::SelfProfile
}

/// Weak relationship with someone other than the observing user.
pub fn is_weak_relationship(person: &UnifiedPerson) -> bool {
    person.relationship_strength < WEAK_STRENGTH_THRESHOLD
        && person.relationship_type != RelationshipType::SelfProfile
}

/// Persons per isolation risk tier, each tier ordered by person key.
type RiskTiers<'a> = BTreeMap<IsolationRisk, Vec<&'a UnifiedPerson>>;

fn tier<'m, 'a>(tiers: &'m RiskTiers<'a>, risk: IsolationRisk) -> &'m [&'a UnifiedPerson] {
    tiers.get(&risk).map(Vec::as_slice).unwrap_or_default()
}

/// Analyze the merged population.
pub fn analyze_risk(persons: &[UnifiedPerson]) -> RiskAnalysisReport {
    let mut ordered: Vec<&UnifiedPerson> = persons.iter().collect();
    ordered.sort_by(|a, b| a.person_key.cmp(&b.person_key));

    let mut tiers = group_by_risk(persons);
    for members in tiers.values_mut() {
        members.sort_by(|a, b| a.person_key.cmp(&b.person_key));
    }

    let isolated: Vec<&UnifiedPerson> = tier(&tiers, IsolationRisk::High)
        .iter()
        .copied()
        .filter(|p| is_isolated(p))
        .collect();
    let weak: Vec<&UnifiedPerson> = ordered
        .iter()
        .copied()
        .filter(|p| is_weak_relationship(p))
        .collect();

    RiskAnalysisReport {
        summary: summarize(persons, isolated.len(), weak.len()),
        by_relationship: relationship_breakdown(persons),
        recommendations: recommendations(&tiers, &isolated, &weak),
        critical_insights: insights(persons, isolated.len()),
    }
}

fn summarize(persons: &[UnifiedPerson], isolated: usize, weak: usize) -> RiskSummary {
    let histogram = RiskHistogram::from_persons(persons);
    let strong = strong_relationship_count(persons);

    RiskSummary {
        total_persons: persons.len(),
        high_risk: histogram.high,
        medium_risk: histogram.medium,
        low_risk: histogram.low,
        isolated,
        weak_relationships: weak,
        strong_relationships: strong,
        isolation_rate: percentage(isolated, persons.len()),
        strong_relationship_rate: percentage(strong, persons.len()),
    }
}

fn relationship_breakdown(
    persons: &[UnifiedPerson],
) -> BTreeMap<RelationshipType, RelationshipRisk> {
    group_by_relationship(persons)
        .into_iter()
        .map(|(relationship, members)| {
            let strength: u32 = members
                .iter()
                .map(|p| u32::from(p.relationship_strength))
                .sum();
            let average_strength = if members.is_empty() {
                0.0
            } else {
                (f64::from(strength) / members.len() as f64 * 10.0).round() / 10.0
            };
            let breakdown = RelationshipRisk {
                total: members.len(),
                histogram: RiskHistogram::from_persons(members.iter().copied()),
                average_strength,
            };
            (relationship, breakdown)
        })
        .collect()
}

fn recommendation(
    kind: RecommendationKind,
    priority: Priority,
    timeline: Timeline,
    risk_tier: Option<IsolationRisk>,
    persons: &[&UnifiedPerson],
) -> Option<Recommendation> {
    if persons.is_empty() {
        return None;
    }

    let mut relationship_types: Vec<RelationshipType> =
        persons.iter().map(|p| p.relationship_type).collect();
    relationship_types.sort();
    relationship_types.dedup();

    Some(Recommendation {
        kind,
        priority,
        timeline,
        risk_tier,
        relationship_types,
        persons: persons.iter().map(|p| PersonRef::from(*p)).collect(),
    })
}

fn select<'a>(
    members: &[&'a UnifiedPerson],
    relationship: fn(RelationshipType) -> bool,
) -> Vec<&'a UnifiedPerson> {
    members
        .iter()
        .copied()
        .filter(|p| relationship(p.relationship_type))
        .collect()
}

/// Rules fire independently; a person may appear under several of them.
fn recommendations(
    tiers: &RiskTiers<'_>,
    isolated: &[&UnifiedPerson],
    weak: &[&UnifiedPerson],
) -> Vec<Recommendation> {
    let high = tier(tiers, IsolationRisk::High);
    let medium = tier(tiers, IsolationRisk::Medium);

    let high_friends = select(high, |r| r == RelationshipType::Friend);
    let high_teammates = select(high, |r| r == RelationshipType::Teammate);
    let high_others = select(high, |r| {
        matches!(r, RelationshipType::FrequentContact | RelationshipType::Contact)
    });
    let medium_frequent = select(medium, |r| r == RelationshipType::FrequentContact);
    let medium_others = select(medium, |r| {
        matches!(
            r,
            RelationshipType::Friend | RelationshipType::Teammate | RelationshipType::Contact
        )
    });

    [
        recommendation(
            RecommendationKind::ImmediateCheckIn,
            Priority::Critical,
            Timeline::Within48Hours,
            Some(IsolationRisk::High),
            isolated,
        ),
        recommendation(
            RecommendationKind::ReconnectWithFriends,
            Priority::High,
            Timeline::ThisWeek,
            Some(IsolationRisk::High),
            &high_friends,
        ),
        recommendation(
            RecommendationKind::SupportTeammates,
            Priority::High,
            Timeline::ThisWeek,
            Some(IsolationRisk::High),
            &high_teammates,
        ),
        recommendation(
            RecommendationKind::ReachOutToContacts,
            Priority::High,
            Timeline::ThisWeek,
            Some(IsolationRisk::High),
            &high_others,
        ),
        recommendation(
            RecommendationKind::MaintainFrequentContacts,
            Priority::Medium,
            Timeline::WithinTwoWeeks,
            Some(IsolationRisk::Medium),
            &medium_frequent,
        ),
        recommendation(
            RecommendationKind::CheckInMediumRisk,
            Priority::Medium,
            Timeline::WithinTwoWeeks,
            Some(IsolationRisk::Medium),
            &medium_others,
        ),
        recommendation(
            RecommendationKind::BuildRelationships,
            Priority::Low,
            Timeline::ThisMonth,
            None,
            weak,
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn insights(persons: &[UnifiedPerson], isolated: usize) -> Vec<Insight> {
    let total = persons.len();
    let mut insights = Vec::new();

    if isolated > 0 {
        insights.push(Insight {
            kind: InsightKind::IsolationRate,
            severity: InsightSeverity::Critical,
            source: None,
            count: isolated,
            population: total,
            rate: percentage(isolated, total),
            action_required: true,
        });
    }

    for (source, members) in group_by_source(persons) {
        let high = members
            .iter()
            .filter(|p| p.isolation_risk == IsolationRisk::High)
            .count();
        if members.len() > SOURCE_CONCENTRATION_MIN_MEMBERS
            && ratio(high, members.len()) > SOURCE_CONCENTRATION_THRESHOLD
        {
            insights.push(Insight {
                kind: InsightKind::SourceRiskConcentration,
                severity: InsightSeverity::Warning,
                source: Some(source),
                count: high,
                population: members.len(),
                rate: percentage(high, members.len()),
                action_required: true,
            });
        }
    }

    if total == 0 {
        return insights;
    }

    let distinct = distinct_relationship_types(persons);
    if distinct <= 2 {
        insights.push(Insight {
            kind: InsightKind::RelationshipDiversity,
            severity: InsightSeverity::Warning,
            source: None,
            count: distinct,
            population: total,
            rate: percentage(distinct, RelationshipType::ALL.len()),
            action_required: false,
        });
    }

    let strong = strong_relationship_count(persons);
    let strong_share = ratio(strong, total);
    let strong_insight = |severity, action_required| Insight {
        kind: InsightKind::StrongRelationshipRate,
        severity,
        source: None,
        count: strong,
        population: total,
        rate: percentage(strong, total),
        action_required,
    };
    if strong_share > 0.5 {
        insights.push(strong_insight(InsightSeverity::Success, false));
    } else if strong_share < 0.2 {
        insights.push(strong_insight(InsightSeverity::Warning, true));
    }

    insights
}
