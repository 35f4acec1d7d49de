//! Markdown report generation.
//!
//! This module renders a cycle outcome as a Markdown team health report
//! or as pretty-printed JSON.

use crate::analysis::health::TeamHealthSnapshot;
use crate::analysis::insights::{Insight, Recommendation, RelationshipRisk, RiskSummary};
use crate::analysis::messages::{insight_message, recommendation_text};
use crate::analysis::most_at_risk;
use crate::models::{IsolationRisk, RelationshipType, UnifiedPerson};
use crate::pipeline::CycleOutcome;
use crate::sources::SourceError;
use anyhow::Result;
use std::collections::BTreeMap;

/// Rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Include the full member table.
    pub include_persons: bool,
    /// Maximum rows in the attention and member tables.
    pub max_listed_persons: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_persons: true,
            max_listed_persons: 50,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(outcome: &CycleOutcome, options: &ReportOptions) -> String {
    let report = &outcome.report;
    let mut output = String::new();

    // Title
    output.push_str("# TeamPulse Report\n\n");

    output.push_str(&generate_metadata_section(outcome));
    output.push_str(&generate_table_of_contents(outcome, options));
    output.push_str(&generate_summary_section(
        &report.team_health,
        &report.risk_analysis.summary,
    ));
    output.push_str(&generate_relationship_section(
        &report.risk_analysis.by_relationship,
    ));
    output.push_str(&generate_attention_section(
        &report.persons,
        options.max_listed_persons,
    ));
    output.push_str(&generate_recommendations_section(
        &report.risk_analysis.recommendations,
    ));
    output.push_str(&generate_insights_section(
        &report.risk_analysis.critical_insights,
    ));

    if options.include_persons {
        output.push_str(&generate_members_section(
            &report.persons,
            options.max_listed_persons,
        ));
    }

    output.push_str(&generate_source_errors_section(&outcome.errors));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(outcome: &CycleOutcome) -> String {
    let mut section = String::new();
    let health = &outcome.report.team_health;

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Organization:** {}\n", outcome.organization));
    section.push_str(&format!(
        "- **As Of:** {}\n",
        health.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    let sources: Vec<String> = outcome.sources.iter().map(|s| s.to_string()).collect();
    if sources.is_empty() {
        section.push_str("- **Sources:** none\n");
    } else {
        section.push_str(&format!("- **Sources:** {}\n", sources.join(", ")));
    }
    if !outcome.errors.is_empty() {
        section.push_str(&format!("- **Failed Sources:** {}\n", outcome.errors.len()));
    }
    section.push_str(&format!("- **Observations:** {}\n", outcome.observations));
    section.push_str(&format!("- **Members:** {}\n", health.total_members));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(outcome: &CycleOutcome, options: &ReportOptions) -> String {
    let analysis = &outcome.report.risk_analysis;
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Summary](#summary)\n");

    if !analysis.by_relationship.is_empty() {
        toc.push_str("- [Risk by Relationship](#risk-by-relationship)\n");
    }
    if outcome
        .report
        .persons
        .iter()
        .any(|p| p.isolation_risk != IsolationRisk::Low)
    {
        toc.push_str("- [Members Needing Attention](#members-needing-attention)\n");
    }
    if !analysis.recommendations.is_empty() {
        toc.push_str("- [Recommendations](#recommendations)\n");
    }
    if !analysis.critical_insights.is_empty() {
        toc.push_str("- [Insights](#insights)\n");
    }
    if options.include_persons && !outcome.report.persons.is_empty() {
        toc.push_str("- [Members](#members)\n");
    }
    if !outcome.errors.is_empty() {
        toc.push_str("- [Source Errors](#source-errors)\n");
    }

    toc.push('\n');

    toc
}

/// Generate the summary section.
fn generate_summary_section(health: &TeamHealthSnapshot, summary: &RiskSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!(
        "**Team Health Score:** {}/100\n\n",
        health.health_score
    ));
    section.push_str(&format!(
        "- **Active Members:** {} of {}\n",
        health.active_members, health.total_members
    ));
    section.push_str(&format!(
        "- **Isolated:** {} ({:.1}%)\n",
        summary.isolated, summary.isolation_rate
    ));
    section.push_str(&format!(
        "- **Strong Relationships:** {} ({:.1}%)\n",
        summary.strong_relationships, summary.strong_relationship_rate
    ));
    section.push_str(&format!(
        "- **Weak Relationships:** {}\n\n",
        summary.weak_relationships
    ));

    // Risk histogram
    section.push_str("### Isolation Risk\n\n");
    section.push_str(&format!(
        "| {} High | {} Medium | {} Low | **Total** |\n",
        IsolationRisk::High.emoji(),
        IsolationRisk::Medium.emoji(),
        IsolationRisk::Low.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** |\n\n",
        health.risk_histogram.high,
        health.risk_histogram.medium,
        health.risk_histogram.low,
        health.risk_histogram.total()
    ));

    if !health.service_participation.is_empty() {
        section.push_str("### Members by Source\n\n");
        section.push_str("| Source | Members |\n");
        section.push_str("|:---|:---:|\n");

        let mut sources: Vec<_> = health.service_participation.iter().collect();
        sources.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

        for (source, count) in sources {
            section.push_str(&format!("| {} | {} |\n", source, count));
        }
        section.push('\n');
    }

    if !health.relationship_distribution.is_empty() {
        section.push_str("### Relationship Types\n\n");
        section.push_str("| Type | Members |\n");
        section.push_str("|:---|:---:|\n");

        for (relationship, count) in health.relationship_distribution.iter().rev() {
            section.push_str(&format!("| {} | {} |\n", relationship, count));
        }
        section.push('\n');
    }

    section
}

/// Generate the per-relationship risk breakdown.
fn generate_relationship_section(
    by_relationship: &BTreeMap<RelationshipType, RelationshipRisk>,
) -> String {
    if by_relationship.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Risk by Relationship\n\n");
    section.push_str("| Type | Members | High | Medium | Low | Avg. Strength |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|\n");

    for (relationship, risk) in by_relationship.iter().rev() {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {:.1} |\n",
            relationship,
            risk.total,
            risk.histogram.high,
            risk.histogram.medium,
            risk.histogram.low,
            risk.average_strength
        ));
    }
    section.push('\n');

    section
}

/// Generate the list of the most at-risk members.
fn generate_attention_section(persons: &[UnifiedPerson], limit: usize) -> String {
    let at_risk = most_at_risk(persons, limit);
    if at_risk.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Members Needing Attention\n\n");
    section.push_str("| Risk | Name | Relationship | Activity | Communication | Sources |\n");
    section.push_str("|:---:|:---|:---|:---:|:---:|:---|\n");

    for person in at_risk {
        section.push_str(&person_row(person));
    }
    section.push('\n');

    section
}

fn person_row(person: &UnifiedPerson) -> String {
    let sources: Vec<String> = person.sources.iter().map(|s| s.to_string()).collect();
    format!(
        "| {} | {} | {} | {} | {} | {} |\n",
        person.isolation_risk.emoji(),
        person.display_name,
        person.relationship_type,
        person.activity_score,
        person.communication_score,
        sources.join(", ")
    )
}

/// Generate the recommendations section.
fn generate_recommendations_section(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Recommendations\n\n");

    for (i, rec) in recommendations.iter().enumerate() {
        let text = recommendation_text(rec);
        section.push_str(&format!(
            "### {}. {} ({} priority)\n\n",
            i + 1,
            text.title,
            rec.priority
        ));
        section.push_str(&format!("{}\n\n", text.description));
        for action in &text.actions {
            section.push_str(&format!("- {}\n", action));
        }
        section.push('\n');
    }

    section
}

/// Generate the insights section.
fn generate_insights_section(insights: &[Insight]) -> String {
    if insights.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Insights\n\n");
    for insight in insights {
        let action = if insight.action_required {
            " **Action required.**"
        } else {
            ""
        };
        section.push_str(&format!(
            "- {} {}{}\n",
            insight.severity.emoji(),
            insight_message(insight),
            action
        ));
    }
    section.push('\n');

    section
}

/// Generate the full member table.
fn generate_members_section(persons: &[UnifiedPerson], limit: usize) -> String {
    if persons.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Members\n\n");
    section.push_str("| Risk | Name | Relationship | Activity | Communication | Sources |\n");
    section.push_str("|:---:|:---|:---|:---:|:---:|:---|\n");

    for person in persons.iter().take(limit) {
        section.push_str(&person_row(person));
    }
    if persons.len() > limit {
        section.push_str(&format!(
            "\n*{} more members not shown.*\n",
            persons.len() - limit
        ));
    }
    section.push('\n');

    section
}

/// Generate the source errors section.
fn generate_source_errors_section(errors: &[SourceError]) -> String {
    if errors.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Source Errors\n\n");
    section.push_str("The report was built from the remaining sources.\n\n");
    for error in errors {
        section.push_str(&format!(
            "- {} **{}:** {}\n",
            error.severity.emoji(),
            error.source,
            error.message
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by TeamPulse*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(outcome: &CycleOutcome) -> Result<String> {
    serde_json::to_string_pretty(outcome).map_err(Into::into)
}
