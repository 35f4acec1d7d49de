//! Population analysis modules.
//!
//! Team health statistics and risk insights computed over the merged
//! population of one aggregation cycle.

pub mod aggregator;
pub mod health;
pub mod insights;
pub mod messages;

pub use aggregator::*;
pub use health::{compute_team_health, RiskHistogram, TeamHealthSnapshot};
pub use insights::{analyze_risk, Insight, Recommendation, RiskAnalysisReport};
pub use messages::{insight_message, recommendation_text};
