//! Population grouping and statistics.
//!
//! This module provides utilities for partitioning the merged population
//! and computing the distributions the health snapshot and the risk
//! analysis are built from.

use crate::models::{IsolationRisk, RelationshipType, SourceKind, UnifiedPerson};
use std::collections::{BTreeMap, BTreeSet};

/// Relationship strength above which a relationship counts as strong.
pub const STRONG_RELATIONSHIP_THRESHOLD: u8 = 70;

/// Share of `part` in `whole`, as a fraction. Zero when `whole` is zero.
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64
}

/// Share of `part` in `whole` as a percentage rounded to one decimal.
pub fn percentage(part: usize, whole: usize) -> f64 {
    (ratio(part, whole) * 1000.0).round() / 10.0
}

/// Group persons by isolation risk tier.
pub fn group_by_risk(persons: &[UnifiedPerson]) -> BTreeMap<IsolationRisk, Vec<&UnifiedPerson>> {
    let mut grouped: BTreeMap<IsolationRisk, Vec<&UnifiedPerson>> = BTreeMap::new();

    for person in persons {
        grouped.entry(person.isolation_risk).or_default().push(person);
    }

    grouped
}

/// Group persons by relationship type.
pub fn group_by_relationship(
    persons: &[UnifiedPerson],
) -> BTreeMap<RelationshipType, Vec<&UnifiedPerson>> {
    let mut grouped: BTreeMap<RelationshipType, Vec<&UnifiedPerson>> = BTreeMap::new();

    for person in persons {
        grouped
            .entry(person.relationship_type)
            .or_default()
            .push(person);
    }

    grouped
}

/// Group persons by every source they appear in.
///
/// A person with several sources appears in several groups, so the groups
/// are not a partition of the population.
pub fn group_by_source(persons: &[UnifiedPerson]) -> BTreeMap<SourceKind, Vec<&UnifiedPerson>> {
    let mut grouped: BTreeMap<SourceKind, Vec<&UnifiedPerson>> = BTreeMap::new();

    for person in persons {
        for source in &person.sources {
            grouped.entry(*source).or_default().push(person);
        }
    }

    grouped
}

/// Count persons per relationship type.
pub fn relationship_distribution(persons: &[UnifiedPerson]) -> BTreeMap<RelationshipType, usize> {
    let mut dist: BTreeMap<RelationshipType, usize> = BTreeMap::new();

    for person in persons {
        *dist.entry(person.relationship_type).or_default() += 1;
    }

    dist
}

/// Count persons per source (non-disjoint).
pub fn service_participation(persons: &[UnifiedPerson]) -> BTreeMap<SourceKind, usize> {
    let mut dist: BTreeMap<SourceKind, usize> = BTreeMap::new();

    for person in persons {
        for source in &person.sources {
            *dist.entry(*source).or_default() += 1;
        }
    }

    dist
}

/// Number of distinct relationship types present.
pub fn distinct_relationship_types(persons: &[UnifiedPerson]) -> usize {
    persons
        .iter()
        .map(|p| p.relationship_type)
        .collect::<BTreeSet<_>>()
        .len()
}

/// Number of persons with a strong relationship.
pub fn strong_relationship_count(persons: &[UnifiedPerson]) -> usize {
    persons
        .iter()
        .filter(|p| p.relationship_strength > STRONG_RELATIONSHIP_THRESHOLD)
        .count()
}

/// Identify the most at-risk persons (lowest average score first).
pub fn most_at_risk(persons: &[UnifiedPerson], n: usize) -> Vec<&UnifiedPerson> {
    let mut sorted: Vec<&UnifiedPerson> = persons
        .iter()
        .filter(|p| p.isolation_risk != IsolationRisk::Low)
        .collect();

    sorted.sort_by(|a, b| {
        b.isolation_risk
            .cmp(&a.isolation_risk)
            .then_with(|| a.average_score().total_cmp(&b.average_score()))
            .then_with(|| a.person_key.cmp(&b.person_key))
    });
    sorted.truncate(n);

    sorted
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{IsolationRisk, RelationshipType, SourceKind, UnifiedPerson};
    use crate::risk::classify_isolation;
    use std::collections::{BTreeMap, BTreeSet};

    /// Build a merged person for analysis tests.
    pub fn person(
        key: &str,
        scores: (u8, u8),
        relationship_type: RelationshipType,
        strength: u8,
        sources: &[SourceKind],
    ) -> UnifiedPerson {
        UnifiedPerson {
            person_key: key.to_string(),
            display_name: key.to_string(),
            email: None,
            avatar: None,
            sources: sources.iter().copied().collect::<BTreeSet<_>>(),
            activity_score: scores.0,
            communication_score: scores.1,
            isolation_risk: classify_isolation(scores.0, scores.1),
            relationship_type,
            relationship_strength: strength,
            last_active: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn high_risk(
        key: &str,
        relationship_type: RelationshipType,
        strength: u8,
    ) -> UnifiedPerson {
        let p = person(key, (30, 30), relationship_type, strength, &[SourceKind::Slack]);
        debug_assert_eq!(p.isolation_risk, IsolationRisk::High);
        p
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::person;
    use super::*;

    fn population() -> Vec<UnifiedPerson> {
        vec![
            person(
                "a",
                (90, 90),
                RelationshipType::Friend,
                80,
                &[SourceKind::Slack, SourceKind::Zoom],
            ),
            person("b", (65, 65), RelationshipType::Teammate, 50, &[SourceKind::Slack]),
            person("c", (30, 40), RelationshipType::Teammate, 20, &[SourceKind::Discord]),
            person("d", (20, 20), RelationshipType::Contact, 75, &[SourceKind::Zoom]),
        ]
    }

    #[test]
    fn test_ratio_guards_division_by_zero() {
        assert_eq!(ratio(3, 0), 0.0);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(2, 10), 20.0);
        assert_eq!(percentage(1, 3), 33.3);
    }

    #[test]
    fn test_group_by_risk_is_a_partition() {
        let persons = population();
        let grouped = group_by_risk(&persons);
        let total: usize = grouped.values().map(Vec::len).sum();
        assert_eq!(total, persons.len());
        assert_eq!(grouped[&IsolationRisk::High].len(), 2);
        assert_eq!(grouped[&IsolationRisk::Medium].len(), 1);
        assert_eq!(grouped[&IsolationRisk::Low].len(), 1);
    }

    #[test]
    fn test_service_participation_overlaps() {
        let persons = population();
        let participation = service_participation(&persons);
        assert_eq!(participation[&SourceKind::Slack], 2);
        assert_eq!(participation[&SourceKind::Zoom], 2);
        assert_eq!(participation[&SourceKind::Discord], 1);
        let total: usize = participation.values().sum();
        assert!(total > persons.len());
        assert_eq!(group_by_source(&persons)[&SourceKind::Zoom].len(), 2);
    }

    #[test]
    fn test_relationship_statistics() {
        let persons = population();
        assert_eq!(distinct_relationship_types(&persons), 3);
        assert_eq!(strong_relationship_count(&persons), 2);
        let dist = relationship_distribution(&persons);
        assert_eq!(dist[&RelationshipType::Teammate], 2);
        assert_eq!(group_by_relationship(&persons)[&RelationshipType::Contact].len(), 1);
    }

    #[test]
    fn test_most_at_risk() {
        let persons = population();
        let top = most_at_risk(&persons, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].person_key, "d");
        assert_eq!(top[1].person_key, "c");
    }
}
