//! Merging of same-person observations into unified identities.
//!
//! Scores, relationship strength and last activity take the maximum, source
//! sets are unioned, and relationship type only moves up its priority order.
//! These folds are order-independent. Display name, email, avatar and
//! metadata are position-sensitive: observations are applied in source
//! precedence order and a later non-empty value overwrites an earlier one.

use crate::error::MergeError;
use crate::identity::resolve_person_key;
use crate::models::{ServiceObservation, SourceKind, UnifiedPerson};
use crate::risk::classify_isolation;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Explicit adapter ordering for position-sensitive identity fields.
///
/// Sources later in the order overwrite identity fields set by earlier ones.
/// Sources missing from the order rank after every listed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePrecedence {
    order: Vec<SourceKind>,
}

impl SourcePrecedence {
    /// Build a precedence from an ordering, dropping duplicates.
    pub fn new(order: impl IntoIterator<Item = SourceKind>) -> Self {
        let mut seen = BTreeSet::new();
        let order = order.into_iter().filter(|kind| seen.insert(*kind)).collect();
        Self { order }
    }

    /// The configured ordering.
    pub fn order(&self) -> &[SourceKind] {
        &self.order
    }

    /// Position of a source; unlisted sources follow in declaration order.
    pub fn rank(&self, kind: SourceKind) -> usize {
        match self.order.iter().position(|k| *k == kind) {
            Some(position) => position,
            None => {
                let declared = SourceKind::ALL
                    .iter()
                    .position(|k| *k == kind)
                    .unwrap_or(SourceKind::ALL.len());
                self.order.len() + declared
            }
        }
    }
}

impl Default for SourcePrecedence {
    fn default() -> Self {
        Self::new(SourceKind::ALL)
    }
}

/// Folds observations into one [`UnifiedPerson`] per person key.
#[derive(Debug, Clone, Default)]
pub struct IdentityMerger {
    precedence: SourcePrecedence,
}

impl IdentityMerger {
    pub fn new(precedence: SourcePrecedence) -> Self {
        Self { precedence }
    }

    /// Merge a cycle's complete, unordered observation list.
    ///
    /// The output is sorted by person key and identical for every
    /// permutation of the input.
    pub fn merge(
        &self,
        observations: &[ServiceObservation],
    ) -> Result<Vec<UnifiedPerson>, MergeError> {
        let mut groups: BTreeMap<&str, Vec<&ServiceObservation>> = BTreeMap::new();

        for observation in observations {
            verify_key(observation)?;
            groups
                .entry(observation.person_key.as_str())
                .or_default()
                .push(observation);
        }

        debug!(
            "Merging {} observations into {} identities",
            observations.len(),
            groups.len()
        );

        let persons = groups
            .into_values()
            .map(|mut group| {
                group.sort_by(|a, b| self.apply_order(a, b));
                fold_group(&group)
            })
            .collect();

        Ok(persons)
    }

    /// Total order in which observations are applied within a group.
    fn apply_order(&self, a: &ServiceObservation, b: &ServiceObservation) -> std::cmp::Ordering {
        self.precedence
            .rank(a.source)
            .cmp(&self.precedence.rank(b.source))
            .then_with(|| a.platform_id.cmp(&b.platform_id))
            .then_with(|| a.display_name.cmp(&b.display_name))
            .then_with(|| a.email.cmp(&b.email))
            .then_with(|| a.avatar.cmp(&b.avatar))
            .then_with(|| a.metadata.cmp(&b.metadata))
    }
}

fn verify_key(observation: &ServiceObservation) -> Result<(), MergeError> {
    let expected = resolve_person_key(
        observation.source,
        observation.email.as_deref(),
        &observation.platform_id,
    );
    if expected != observation.person_key {
        return Err(MergeError::InconsistentKey {
            source_kind: observation.source,
            platform_id: observation.platform_id.clone(),
            found: observation.person_key.clone(),
            expected,
        });
    }
    Ok(())
}

/// Fold an ordered, non-empty group of same-key observations.
fn fold_group(group: &[&ServiceObservation]) -> UnifiedPerson {
    let first = group[0];
    let mut person = UnifiedPerson {
        person_key: first.person_key.clone(),
        display_name: String::new(),
        email: None,
        avatar: None,
        sources: BTreeSet::new(),
        activity_score: 0,
        communication_score: 0,
        isolation_risk: first.isolation_risk,
        relationship_type: first.relationship_type,
        relationship_strength: 0,
        last_active: None,
        metadata: BTreeMap::new(),
    };

    for observation in group {
        absorb(&mut person, observation);
        overlay(&mut person, observation);
    }

    if person.display_name.is_empty() {
        person.display_name = person.person_key.clone();
    }
    person.isolation_risk = classify_isolation(person.activity_score, person.communication_score);
    person
}

/// Order-independent fields.
fn absorb(person: &mut UnifiedPerson, observation: &ServiceObservation) {
    person.activity_score = person.activity_score.max(observation.activity_score);
    person.communication_score = person
        .communication_score
        .max(observation.communication_score);
    person.relationship_strength = person
        .relationship_strength
        .max(observation.relationship_strength);
    person.relationship_type = person.relationship_type.max(observation.relationship_type);
    person.last_active = person.last_active.max(observation.last_activity);
    person.sources.insert(observation.source);
}

/// Position-sensitive fields: later non-empty values win.
fn overlay(person: &mut UnifiedPerson, observation: &ServiceObservation) {
    if !observation.display_name.trim().is_empty() {
        person.display_name = observation.display_name.clone();
    }
    if let Some(email) = non_empty(&observation.email) {
        person.email = Some(email);
    }
    if let Some(avatar) = non_empty(&observation.avatar) {
        person.avatar = Some(avatar);
    }
    for (key, value) in &observation.metadata {
        if !value.is_empty() {
            person.metadata.insert(key.clone(), value.clone());
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
