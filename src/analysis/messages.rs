//! Prose for recommendations and insights.
//!
//! Kept apart from fact detection so the analysis can be asserted on
//! structurally and the wording can change without touching the rules.

use super::insights::{Insight, InsightKind, InsightSeverity, Recommendation, RecommendationKind};

/// Rendered text of one recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationText {
    pub title: String,
    pub description: String,
    pub actions: Vec<String>,
}

fn names(rec: &Recommendation, limit: usize) -> String {
    let mut listed: Vec<String> = rec
        .persons
        .iter()
        .take(limit)
        .map(|p| p.display_name.clone())
        .collect();
    let rest = rec.persons.len().saturating_sub(limit);
    if rest > 0 {
        listed.push(format!("{} more", rest));
    }
    listed.join(", ")
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

/// Render the title, description and suggested actions of a recommendation.
pub fn recommendation_text(rec: &Recommendation) -> RecommendationText {
    let count = rec.persons.len();
    let who = names(rec, 5);

    let (title, description, actions) = match rec.kind {
        RecommendationKind::ImmediateCheckIn => (
            "Schedule immediate 1:1 check-ins".to_string(),
            format!(
                "{} at high isolation risk with weak connections: {}.",
                plural(count, "person is", "people are"),
                who
            ),
            vec![
                "Book a private 1:1 conversation".to_string(),
                "Ask open questions about workload and wellbeing".to_string(),
                "Agree on a follow-up date".to_string(),
            ],
        ),
        RecommendationKind::ReconnectWithFriends => (
            "Reconnect with friends who have gone quiet".to_string(),
            format!(
                "{} you are close to show high isolation risk: {}.",
                plural(count, "friend", "friends"),
                who
            ),
            vec![
                "Send a personal message".to_string(),
                "Suggest an informal call or coffee".to_string(),
            ],
        ),
        RecommendationKind::SupportTeammates => (
            "Support teammates at risk".to_string(),
            format!(
                "{} at high isolation risk: {}.",
                plural(count, "teammate is", "teammates are"),
                who
            ),
            vec![
                "Invite them into pairing or review sessions".to_string(),
                "Check that they are included in team rituals".to_string(),
            ],
        ),
        RecommendationKind::ReachOutToContacts => (
            "Reach out to disengaged contacts".to_string(),
            format!(
                "{} at high isolation risk: {}.",
                plural(count, "contact is", "contacts are"),
                who
            ),
            vec!["Send a short check-in message".to_string()],
        ),
        RecommendationKind::MaintainFrequentContacts => (
            "Keep frequent contacts engaged".to_string(),
            format!(
                "{} showing early signs of disengagement: {}.",
                plural(count, "frequent contact is", "frequent contacts are"),
                who
            ),
            vec![
                "Keep the regular cadence of conversations".to_string(),
                "Share something relevant to their work".to_string(),
            ],
        ),
        RecommendationKind::CheckInMediumRisk => (
            "Check in with people at moderate risk".to_string(),
            format!(
                "{} at medium isolation risk: {}.",
                plural(count, "person is", "people are"),
                who
            ),
            vec!["Include them in the next group activity".to_string()],
        ),
        RecommendationKind::BuildRelationships => (
            "Build stronger relationships".to_string(),
            format!(
                "{} weak: {}.",
                plural(count, "relationship is", "relationships are"),
                who
            ),
            vec![
                "Set up recurring informal touchpoints".to_string(),
                "Pair on a shared project".to_string(),
            ],
        ),
    };

    RecommendationText {
        title,
        description: format!("{} Timeline: {}.", description, rec.timeline),
        actions,
    }
}

/// Render a one-line message for an insight.
pub fn insight_message(insight: &Insight) -> String {
    match insight.kind {
        InsightKind::IsolationRate => format!(
            "{} of {} members ({:.1}%) are isolated and need attention.",
            insight.count, insight.population, insight.rate
        ),
        InsightKind::SourceRiskConcentration => {
            let source = insight
                .source
                .map(|s| s.to_string())
                .unwrap_or_else(|| "One source".to_string());
            format!(
                "{}: {} of {} members ({:.1}%) are at high isolation risk.",
                source, insight.count, insight.population, insight.rate
            )
        }
        InsightKind::RelationshipDiversity => format!(
            "Only {} relationship {} present; the network lacks diversity.",
            insight.count,
            if insight.count == 1 { "type is" } else { "types are" }
        ),
        InsightKind::StrongRelationshipRate => match insight.severity {
            InsightSeverity::Success => format!(
                "{:.1}% of relationships are strong. Keep it up.",
                insight.rate
            ),
            _ => format!(
                "Only {:.1}% of relationships are strong; invest in deeper connections.",
                insight.rate
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::insights::{PersonRef, Priority, Timeline};
    use crate::models::{IsolationRisk, SourceKind};

    fn rec(kind: RecommendationKind, people: usize) -> Recommendation {
        Recommendation {
            kind,
            priority: Priority::Critical,
            timeline: Timeline::Within48Hours,
            risk_tier: Some(IsolationRisk::High),
            relationship_types: vec![],
            persons: (0..people)
                .map(|i| PersonRef {
                    person_key: format!("p{i}@x.com"),
                    display_name: format!("Person {i}"),
                })
                .collect(),
        }
    }

    #[test]
    fn test_immediate_check_in_text() {
        let text = recommendation_text(&rec(RecommendationKind::ImmediateCheckIn, 2));
        assert_eq!(text.title, "Schedule immediate 1:1 check-ins");
        assert!(text.description.starts_with("2 people are"));
        assert!(text.description.contains("Person 0, Person 1"));
        assert!(text.description.ends_with("Timeline: within 48 hours."));
        assert!(!text.actions.is_empty());
    }

    #[test]
    fn test_long_person_lists_are_truncated() {
        let text = recommendation_text(&rec(RecommendationKind::BuildRelationships, 8));
        assert!(text.description.contains("Person 4, 3 more"));
        assert!(!text.description.contains("Person 5"));
    }

    #[test]
    fn test_singular_wording() {
        let text = recommendation_text(&rec(RecommendationKind::SupportTeammates, 1));
        assert!(text.description.starts_with("1 teammate is"));
    }

    #[test]
    fn test_insight_messages() {
        let isolation = Insight {
            kind: InsightKind::IsolationRate,
            severity: InsightSeverity::Critical,
            source: None,
            count: 2,
            population: 10,
            rate: 20.0,
            action_required: true,
        };
        assert_eq!(
            insight_message(&isolation),
            "2 of 10 members (20.0%) are isolated and need attention."
        );

        let concentration = Insight {
            kind: InsightKind::SourceRiskConcentration,
            source: Some(SourceKind::Discord),
            count: 3,
            population: 5,
            rate: 60.0,
            ..isolation
        };
        assert!(insight_message(&concentration).starts_with("Discord: 3 of 5"));
    }
}
