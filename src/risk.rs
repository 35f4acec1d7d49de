//! Isolation risk classification.
//!
//! A pure mapping from a score pair to a coarse risk tier, applied the
//! same way to single observations and merged persons.

use crate::models::IsolationRisk;

/// Average score at or above which a person is low risk.
pub const LOW_RISK_THRESHOLD: f64 = 80.0;

/// Average score at or above which a person is medium risk.
pub const MEDIUM_RISK_THRESHOLD: f64 = 60.0;

/// Classify isolation risk from an activity and a communication score.
pub fn classify_isolation(activity_score: u8, communication_score: u8) -> IsolationRisk {
    let average = (f64::from(activity_score) + f64::from(communication_score)) / 2.0;

    match average {
        a if a >= LOW_RISK_THRESHOLD => IsolationRisk::Low,
        a if a >= MEDIUM_RISK_THRESHOLD => IsolationRisk::Medium,
        _ => IsolationRisk::High,
    }
}
