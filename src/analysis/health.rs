//! Team health snapshot.
//!
//! Rolls the merged population up into organization-level statistics.

use super::aggregator::{
    distinct_relationship_types, ratio, relationship_distribution, service_participation,
    strong_relationship_count,
};
use crate::models::{IsolationRisk, RelationshipType, SourceKind, UnifiedPerson};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default window for counting a member as active.
pub const DEFAULT_ACTIVE_WINDOW_DAYS: u32 = 30;

/// Persons per isolation risk tier. Tiers are disjoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskHistogram {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl RiskHistogram {
    /// Count persons into their tiers.
    pub fn from_persons<'a>(persons: impl IntoIterator<Item = &'a UnifiedPerson>) -> Self {
        let mut histogram = Self::default();
        for person in persons {
            histogram.record(person.isolation_risk);
        }
        histogram
    }

    pub fn record(&mut self, risk: IsolationRisk) {
        match risk {
            IsolationRisk::Low => self.low += 1,
            IsolationRisk::Medium => self.medium += 1,
            IsolationRisk::High => self.high += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}

/// Organization-level statistics for one aggregation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamHealthSnapshot {
    pub total_members: usize,
    /// Members active within the configured window.
    pub active_members: usize,
    /// Overall health score in [0, 100].
    pub health_score: u8,
    pub risk_histogram: RiskHistogram,
    /// Members per source. A member can count under several sources.
    pub service_participation: BTreeMap<SourceKind, usize>,
    /// Members per relationship type. Disjoint.
    pub relationship_distribution: BTreeMap<RelationshipType, usize>,
    pub generated_at: DateTime<Utc>,
}

/// Compute the health snapshot for a merged population.
pub fn compute_team_health(
    persons: &[UnifiedPerson],
    as_of: DateTime<Utc>,
    active_window_days: u32,
) -> TeamHealthSnapshot {
    // A window reaching past the earliest representable instant covers everyone.
    let window_start = as_of.checked_sub_signed(Duration::days(i64::from(active_window_days)));
    let active_members = persons
        .iter()
        .filter_map(|p| p.last_active)
        .filter(|last| match window_start {
            Some(start) => *last >= start,
            None => true,
        })
        .count();

    TeamHealthSnapshot {
        total_members: persons.len(),
        active_members,
        health_score: health_score(persons),
        risk_histogram: RiskHistogram::from_persons(persons),
        service_participation: service_participation(persons),
        relationship_distribution: relationship_distribution(persons),
        generated_at: as_of,
    }
}

/// Mean activity plus diversity and strong-relationship bonuses, clamped.
pub fn health_score(persons: &[UnifiedPerson]) -> u8 {
    if persons.is_empty() {
        return 0;
    }

    let total: u32 = persons.iter().map(|p| u32::from(p.activity_score)).sum();
    let mut score = (f64::from(total) / persons.len() as f64).round() as i64;

    score += match distinct_relationship_types(persons) {
        n if n >= 4 => 5,
        3 => 3,
        _ => 0,
    };

    let strong_share = ratio(strong_relationship_count(persons), persons.len());
    if strong_share > 0.3 {
        score += 5;
    } else if strong_share > 0.2 {
        score += 3;
    }

    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::test_support::person;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_population() {
        let snapshot = compute_team_health(&[], as_of(), DEFAULT_ACTIVE_WINDOW_DAYS);
        assert_eq!(snapshot.total_members, 0);
        assert_eq!(snapshot.active_members, 0);
        assert_eq!(snapshot.health_score, 0);
        assert_eq!(snapshot.risk_histogram, RiskHistogram::default());
        assert!(snapshot.service_participation.is_empty());
        assert!(snapshot.relationship_distribution.is_empty());
    }

    #[test]
    fn test_mean_without_bonuses() {
        let persons = vec![
            person("a", (61, 50), RelationshipType::Teammate, 10, &[SourceKind::Slack]),
            person("b", (70, 50), RelationshipType::Teammate, 10, &[SourceKind::Slack]),
        ];
        // mean 65.5 rounds to 66
        assert_eq!(health_score(&persons), 66);
    }

    #[test]
    fn test_diversity_and_strength_bonuses() {
        let persons = vec![
            person("a", (60, 60), RelationshipType::Contact, 80, &[SourceKind::Slack]),
            person("b", (60, 60), RelationshipType::Teammate, 80, &[SourceKind::Slack]),
            person("c", (60, 60), RelationshipType::Friend, 10, &[SourceKind::Slack]),
            person("d", (60, 60), RelationshipType::FrequentContact, 10, &[SourceKind::Slack]),
        ];
        // 4 types: +5, strong share 50%: +5
        assert_eq!(health_score(&persons), 70);

        let three_types = &persons[..3];
        // 3 types: +3, strong share 66%: +5
        assert_eq!(health_score(three_types), 68);
    }

    #[test]
    fn test_strength_bonus_tiers() {
        let mut persons: Vec<UnifiedPerson> = (0..10)
            .map(|i| {
                person(
                    &format!("p{i}"),
                    (50, 50),
                    RelationshipType::Contact,
                    10,
                    &[SourceKind::Slack],
                )
            })
            .collect();
        persons[0].relationship_strength = 90;
        persons[1].relationship_strength = 90;
        // exactly 20% is not more than 20%
        assert_eq!(health_score(&persons), 50);
        persons[2].relationship_strength = 71;
        assert_eq!(health_score(&persons), 53);
        persons[3].relationship_strength = 71;
        assert_eq!(health_score(&persons), 55);
    }

    #[test]
    fn test_score_is_clamped() {
        let persons = vec![
            person("a", (100, 100), RelationshipType::Contact, 100, &[SourceKind::Slack]),
            person("b", (100, 100), RelationshipType::Teammate, 100, &[SourceKind::Slack]),
            person("c", (100, 100), RelationshipType::Friend, 100, &[SourceKind::Slack]),
            person("d", (100, 100), RelationshipType::SelfProfile, 100, &[SourceKind::Slack]),
        ];
        assert_eq!(health_score(&persons), 100);
    }

    #[test]
    fn test_active_members_window() {
        let mut recent = person("a", (80, 80), RelationshipType::Friend, 50, &[SourceKind::Slack]);
        recent.last_active = Some(as_of() - Duration::days(3));
        let mut stale = person("b", (80, 80), RelationshipType::Friend, 50, &[SourceKind::Zoom]);
        stale.last_active = Some(as_of() - Duration::days(45));
        let unknown = person("c", (80, 80), RelationshipType::Friend, 50, &[SourceKind::Zoom]);

        let snapshot = compute_team_health(&[recent, stale, unknown], as_of(), 30);
        assert_eq!(snapshot.total_members, 3);
        assert_eq!(snapshot.active_members, 1);
        assert_eq!(snapshot.risk_histogram.low, 3);
        assert_eq!(snapshot.service_participation[&SourceKind::Zoom], 2);
        assert_eq!(snapshot.generated_at, as_of());
    }

    #[test]
    fn test_huge_active_window_does_not_overflow() {
        let snapshot = compute_team_health(&[], as_of(), u32::MAX);
        assert_eq!(snapshot.active_members, 0);

        let mut ancient = person("a", (80, 80), RelationshipType::Friend, 50, &[SourceKind::Slack]);
        ancient.last_active = Some(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap());
        let unknown = person("b", (80, 80), RelationshipType::Friend, 50, &[SourceKind::Slack]);

        let snapshot = compute_team_health(&[ancient, unknown], as_of(), u32::MAX);
        assert_eq!(snapshot.total_members, 2);
        assert_eq!(snapshot.active_members, 1);
    }

    proptest! {
        #[test]
        fn health_score_is_bounded(
            entries in proptest::collection::vec(
                (0u8..=100, 0u8..=100, 0usize..5, 0u8..=100),
                0..40,
            )
        ) {
            let persons: Vec<UnifiedPerson> = entries
                .iter()
                .enumerate()
                .map(|(i, (a, c, rel, strength))| {
                    person(
                        &format!("p{i}"),
                        (*a, *c),
                        RelationshipType::ALL[*rel],
                        *strength,
                        &[SourceKind::Slack],
                    )
                })
                .collect();
            let snapshot = compute_team_health(&persons, as_of(), DEFAULT_ACTIVE_WINDOW_DAYS);
            prop_assert!(snapshot.health_score <= 100);
            prop_assert_eq!(snapshot.risk_histogram.total(), persons.len());
            let distributed: usize = snapshot.relationship_distribution.values().sum();
            prop_assert_eq!(distributed, persons.len());
        }
    }
}
