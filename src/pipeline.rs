//! Aggregation pipeline.
//!
//! `aggregate` is the pure core: one synchronous pass from a cycle's
//! observations to merged persons, team health and risk analysis.
//! `run_cycle` wraps it with the concurrent adapter fan-in.

use crate::analysis::health::{compute_team_health, TeamHealthSnapshot, DEFAULT_ACTIVE_WINDOW_DAYS};
use crate::analysis::insights::{analyze_risk, RiskAnalysisReport};
use crate::error::MergeError;
use crate::identity::{resolve_person_key, IdentityMerger, SourcePrecedence};
use crate::models::{RawSignals, ServiceObservation, SourceKind, UnifiedPerson};
use crate::risk::classify_isolation;
use crate::scoring::ScoringRegistry;
use crate::sources::{collect_signals, SourceAdapter, SourceError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Default per-adapter fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Score one source's signals and attach the identity key.
pub fn observe(
    kind: SourceKind,
    signals: RawSignals,
    registry: &ScoringRegistry,
    as_of: DateTime<Utc>,
) -> ServiceObservation {
    let scores = registry.score(kind, &signals, as_of);
    let person_key = resolve_person_key(kind, signals.email.as_deref(), &signals.platform_id);

    ServiceObservation {
        source: kind,
        person_key,
        isolation_risk: classify_isolation(scores.activity, scores.communication),
        activity_score: scores.activity,
        communication_score: scores.communication,
        relationship_strength: signals.relationship_strength.min(100) as u8,
        relationship_type: signals.relationship_type,
        platform_id: signals.platform_id,
        display_name: signals.display_name,
        email: signals.email,
        avatar: signals.avatar,
        profile: signals.profile,
        last_activity: signals.last_activity,
        interactions: signals.interactions,
        metadata: signals.metadata,
    }
}

/// Parameters of one `aggregate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Instant the cycle is evaluated at.
    pub as_of: DateTime<Utc>,
    pub precedence: SourcePrecedence,
    pub active_window_days: u32,
}

impl AggregateOptions {
    pub fn new(as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            precedence: SourcePrecedence::default(),
            active_window_days: DEFAULT_ACTIVE_WINDOW_DAYS,
        }
    }

    pub fn with_precedence(mut self, precedence: SourcePrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_active_window_days(mut self, days: u32) -> Self {
        self.active_window_days = days;
        self
    }
}

/// Everything the core produces for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Merged persons, sorted by person key.
    pub persons: Vec<UnifiedPerson>,
    pub team_health: TeamHealthSnapshot,
    pub risk_analysis: RiskAnalysisReport,
}

/// Merge, roll up and analyze a cycle's complete observation list.
///
/// The result depends only on the arguments: repeated calls with the same
/// input serialize to identical bytes.
pub fn aggregate(
    observations: &[ServiceObservation],
    options: &AggregateOptions,
) -> Result<AggregateReport, MergeError> {
    let merger = IdentityMerger::new(options.precedence.clone());
    let persons = merger.merge(observations)?;

    let team_health = compute_team_health(&persons, options.as_of, options.active_window_days);
    let risk_analysis = analyze_risk(&persons);

    debug!(
        "Aggregated {} observations into {} persons (health {})",
        observations.len(),
        persons.len(),
        team_health.health_score
    );

    Ok(AggregateReport {
        persons,
        team_health,
        risk_analysis,
    })
}

/// Explicit per-cycle context: which adapters to ask and how to score.
pub struct AggregationContext {
    pub organization: String,
    pub adapters: Vec<Box<dyn SourceAdapter>>,
    pub registry: ScoringRegistry,
    pub precedence: SourcePrecedence,
    /// Per-adapter fetch timeout.
    pub timeout: Duration,
    pub as_of: DateTime<Utc>,
    pub active_window_days: u32,
}

impl AggregationContext {
    /// Context with default scoring, precedence, timeout and window.
    pub fn new(
        organization: impl Into<String>,
        adapters: Vec<Box<dyn SourceAdapter>>,
        as_of: DateTime<Utc>,
    ) -> Self {
        Self {
            organization: organization.into(),
            adapters,
            registry: ScoringRegistry::with_defaults(),
            precedence: SourcePrecedence::default(),
            timeout: DEFAULT_FETCH_TIMEOUT,
            as_of,
            active_window_days: DEFAULT_ACTIVE_WINDOW_DAYS,
        }
    }

    fn options(&self) -> AggregateOptions {
        AggregateOptions {
            as_of: self.as_of,
            precedence: self.precedence.clone(),
            active_window_days: self.active_window_days,
        }
    }
}

/// Result of one full cycle: the best-effort report plus every source
/// failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleOutcome {
    pub organization: String,
    /// Sources that returned a batch, in adapter order.
    pub sources: Vec<SourceKind>,
    pub observations: usize,
    pub report: AggregateReport,
    pub errors: Vec<SourceError>,
}

impl CycleOutcome {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Fetch every adapter, score the results and aggregate them.
pub async fn run_cycle(ctx: &AggregationContext) -> Result<CycleOutcome, MergeError> {
    info!("Starting aggregation cycle for {}", ctx.organization);

    let (batches, errors) = collect_signals(&ctx.adapters, ctx.timeout).await;

    let sources: Vec<SourceKind> = batches.iter().map(|(kind, _)| *kind).collect();
    let observations: Vec<ServiceObservation> = batches
        .into_iter()
        .flat_map(|(kind, signals)| {
            signals
                .into_iter()
                .map(move |s| observe(kind, s, &ctx.registry, ctx.as_of))
        })
        .collect();

    let report = aggregate(&observations, &ctx.options())?;

    info!(
        "Cycle for {} complete: {} persons, {} source errors",
        ctx.organization,
        report.persons.len(),
        errors.len()
    );

    Ok(CycleOutcome {
        organization: ctx.organization.clone(),
        sources,
        observations: observations.len(),
        report,
        errors,
    })
}

/// Serializes cycles per organization.
///
/// Two cycles for the same organization never overlap; cycles for
/// different organizations run in parallel.
#[derive(Debug, Clone, Default)]
pub struct CycleLocks {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl CycleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock_for(&self, organization: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(organization.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run a cycle once no other cycle for the same organization is running.
    pub async fn run(&self, ctx: &AggregationContext) -> Result<CycleOutcome, MergeError> {
        let lock = self.lock_for(&ctx.organization).await;
        let _guard = lock.lock().await;
        run_cycle(ctx).await
    }
}
