//! Activity and communication scoring.
//!
//! Every source is scored by the same generic engine, parameterized by a
//! per-source [`ScoringProfile`]. Sources register a strategy function in
//! a [`ScoringRegistry`] instead of branching on the source type at call sites.

pub mod strategies;

use crate::models::{ChannelKind, RawSignals, ScorePair, SourceKind};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Score every activity and communication computation starts from.
pub const BASE_SCORE: i32 = 50;

/// Scoring strategy for one source type.
pub type ScoreFn = fn(&RawSignals, DateTime<Utc>) -> ScorePair;

/// Bonus points for each present profile-completeness signal.
#[derive(Debug, Clone, Copy)]
pub struct ProfileWeights {
    pub avatar: i32,
    pub real_name: i32,
    pub title: i32,
    pub status: i32,
    pub verified: i32,
}

/// Step function over days since the last activity.
#[derive(Debug, Clone, Copy)]
pub struct RecencySteps {
    /// Active within the last 7 days.
    pub within_week: i32,
    /// Active within the last 30 days.
    pub within_month: i32,
    /// Active within the last 90 days.
    pub within_quarter: i32,
    /// Last active more than 90 days ago.
    pub stale: i32,
    /// No activity timestamp at all.
    pub unknown: i32,
}

impl RecencySteps {
    /// Bonus (or penalty) for the given activity timestamp.
    pub fn bonus(&self, last_activity: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i32 {
        let Some(last) = last_activity else {
            return self.unknown;
        };
        // Future timestamps count as active today.
        let days = (now - last).num_days().max(0);

        match days {
            d if d <= 7 => self.within_week,
            d if d <= 30 => self.within_month,
            d if d <= 90 => self.within_quarter,
            _ => self.stale,
        }
    }
}

/// Parameters of the generic scoring engine for one source.
#[derive(Debug, Clone, Copy)]
pub struct ScoringProfile {
    pub base: i32,
    pub profile: ProfileWeights,
    pub recency: RecencySteps,
    /// Flat bonus for each channel kind with any interaction.
    pub channel_bonus: i32,
    /// Volume points per interaction, per channel kind.
    pub volume_weights: &'static [(ChannelKind, f64)],
    /// Maximum volume points a single channel can contribute.
    pub volume_cap: f64,
    /// Applied to communication when no channel has any interaction.
    pub silent_penalty: i32,
}

impl ScoringProfile {
    fn volume_weight(&self, channel: ChannelKind) -> f64 {
        self.volume_weights
            .iter()
            .find(|(kind, _)| *kind == channel)
            .map(|(_, weight)| *weight)
            .unwrap_or(0.0)
    }

    /// Activity score: base, profile completeness and recency.
    pub fn activity(&self, signals: &RawSignals, now: DateTime<Utc>) -> u8 {
        let p = &signals.profile;
        let w = &self.profile;
        let mut score = self.base;

        if p.has_avatar {
            score += w.avatar;
        }
        if p.has_real_name {
            score += w.real_name;
        }
        if p.has_title {
            score += w.title;
        }
        if p.has_status {
            score += w.status;
        }
        if p.is_verified {
            score += w.verified;
        }

        score += self.recency.bonus(signals.last_activity, now);
        clamp_score(f64::from(score))
    }

    /// Communication score: base, per-channel flat bonus and capped volume bonus.
    pub fn communication(&self, signals: &RawSignals) -> u8 {
        if signals.interactions.is_silent() {
            return clamp_score(f64::from(self.base + self.silent_penalty));
        }

        let mut score = f64::from(self.base);
        for (channel, count) in signals.interactions.by_channel() {
            if count == 0 {
                continue;
            }
            score += f64::from(self.channel_bonus);
            let volume = f64::from(count) * self.volume_weight(channel);
            score += volume.min(self.volume_cap);
        }

        clamp_score(score)
    }
}

/// Score a signal bundle with the given profile.
pub fn score_with(profile: &ScoringProfile, signals: &RawSignals, now: DateTime<Utc>) -> ScorePair {
    ScorePair {
        activity: profile.activity(signals, now),
        communication: profile.communication(signals),
    }
}

/// Round and clamp a raw score into [0, 100].
pub fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

/// Map from source type to scoring strategy.
#[derive(Clone)]
pub struct ScoringRegistry {
    strategies: HashMap<SourceKind, ScoreFn>,
    fallback: ScoreFn,
}

impl ScoringRegistry {
    /// An empty registry; every source falls back to the generic strategy.
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
            fallback: strategies::generic,
        }
    }

    /// A registry with the built-in strategy for every supported source.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(SourceKind::Slack, strategies::slack);
        registry.register(SourceKind::Discord, strategies::discord);
        registry.register(SourceKind::MicrosoftTeams, strategies::microsoft_teams);
        registry.register(SourceKind::GoogleWorkspace, strategies::google_workspace);
        registry.register(SourceKind::Zoom, strategies::zoom);
        registry
    }

    /// Register (or replace) the strategy for a source.
    pub fn register(&mut self, kind: SourceKind, strategy: ScoreFn) {
        self.strategies.insert(kind, strategy);
    }

    /// Whether a dedicated strategy is registered for the source.
    pub fn has_strategy(&self, kind: SourceKind) -> bool {
        self.strategies.contains_key(&kind)
    }

    /// Score one source's signal bundle.
    pub fn score(&self, kind: SourceKind, signals: &RawSignals, now: DateTime<Utc>) -> ScorePair {
        let strategy = match self.strategies.get(&kind) {
            Some(strategy) => *strategy,
            None => {
                debug!("No scoring strategy for {}, using generic", kind);
                self.fallback
            }
        };
        strategy(signals, now)
    }
}

impl fmt::Debug for ScoringRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.strategies.keys().collect();
        kinds.sort();
        f.debug_struct("ScoringRegistry")
            .field("strategies", &kinds)
            .finish()
    }
}

impl Default for ScoringRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelCounts, ProfileSignals};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    const FLAT: ScoringProfile = ScoringProfile {
        base: BASE_SCORE,
        profile: ProfileWeights {
            avatar: 5,
            real_name: 5,
            title: 5,
            status: 5,
            verified: 5,
        },
        recency: RecencySteps {
            within_week: 20,
            within_month: 10,
            within_quarter: 5,
            stale: -15,
            unknown: -25,
        },
        channel_bonus: 5,
        volume_weights: &[(ChannelKind::DirectMessage, 0.5), (ChannelKind::Meeting, 2.0)],
        volume_cap: 10.0,
        silent_penalty: -20,
    };

    fn signals() -> RawSignals {
        RawSignals::new("U1", "Ada")
    }

    #[test]
    fn test_recency_steps() {
        let steps = FLAT.recency;
        let n = now();
        assert_eq!(steps.bonus(Some(n - Duration::days(3)), n), 20);
        assert_eq!(steps.bonus(Some(n - Duration::days(7)), n), 20);
        assert_eq!(steps.bonus(Some(n - Duration::days(8)), n), 10);
        assert_eq!(steps.bonus(Some(n - Duration::days(45)), n), 5);
        assert_eq!(steps.bonus(Some(n - Duration::days(120)), n), -15);
        assert_eq!(steps.bonus(None, n), -25);
        assert_eq!(steps.bonus(Some(n + Duration::days(2)), n), 20);
    }

    #[test]
    fn test_activity_profile_bonuses() {
        let mut s = signals();
        s.last_activity = Some(now() - Duration::days(1));
        assert_eq!(FLAT.activity(&s, now()), 70);

        s.profile = ProfileSignals {
            has_avatar: true,
            has_real_name: true,
            has_title: true,
            has_status: false,
            is_verified: false,
        };
        assert_eq!(FLAT.activity(&s, now()), 85);
    }

    #[test]
    fn test_activity_is_clamped() {
        let mut s = signals();
        s.profile = ProfileSignals {
            has_avatar: true,
            has_real_name: true,
            has_title: true,
            has_status: true,
            is_verified: true,
        };
        s.last_activity = Some(now());
        assert_eq!(FLAT.activity(&s, now()), 95);

        let generous = ScoringProfile { base: 90, ..FLAT };
        assert_eq!(generous.activity(&s, now()), 100);
    }

    #[test]
    fn test_communication_volume_is_capped_per_channel() {
        let mut s = signals();
        s.interactions = ChannelCounts {
            direct_messages: 1_000,
            ..ChannelCounts::default()
        };
        // base + flat bonus + capped volume
        assert_eq!(FLAT.communication(&s), 65);

        s.interactions.meetings = 2;
        // + flat bonus + 4 volume points
        assert_eq!(FLAT.communication(&s), 74);
    }

    #[test]
    fn test_channel_without_weight_earns_flat_bonus_only() {
        let mut s = signals();
        s.interactions.emails = 500;
        assert_eq!(FLAT.communication(&s), 55);
    }

    #[test]
    fn test_silent_penalty() {
        assert_eq!(FLAT.communication(&signals()), 30);
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-12.0), 0);
        assert_eq!(clamp_score(150.0), 100);
        assert_eq!(clamp_score(49.5), 50);
        assert_eq!(clamp_score(f64::NAN), 0);
    }

    #[test]
    fn test_registry_dispatch_and_fallback() {
        fn fixed(_: &RawSignals, _: DateTime<Utc>) -> ScorePair {
            ScorePair {
                activity: 1,
                communication: 2,
            }
        }

        let mut registry = ScoringRegistry::new();
        assert!(!registry.has_strategy(SourceKind::Zoom));
        let generic = registry.score(SourceKind::Zoom, &signals(), now());
        assert_eq!(generic, strategies::generic(&signals(), now()));

        registry.register(SourceKind::Zoom, fixed);
        let pair = registry.score(SourceKind::Zoom, &signals(), now());
        assert_eq!(pair.activity, 1);
        assert_eq!(pair.communication, 2);
    }

    #[test]
    fn test_default_registry_covers_all_sources() {
        let registry = ScoringRegistry::with_defaults();
        for kind in SourceKind::ALL {
            assert!(registry.has_strategy(kind), "missing strategy for {kind}");
        }
    }

    fn arb_signals() -> impl Strategy<Value = RawSignals> {
        (
            any::<[bool; 5]>(),
            proptest::option::of(-400i64..400),
            any::<[u32; 5]>(),
        )
            .prop_map(|(flags, days_ago, counts)| {
                let mut s = RawSignals::new("U", "Prop");
                s.profile = ProfileSignals {
                    has_avatar: flags[0],
                    has_real_name: flags[1],
                    has_title: flags[2],
                    has_status: flags[3],
                    is_verified: flags[4],
                };
                s.last_activity = days_ago.map(|d| now() - Duration::days(d));
                s.interactions = ChannelCounts {
                    direct_messages: counts[0],
                    group_messages: counts[1],
                    meetings: counts[2],
                    emails: counts[3],
                    file_shares: counts[4],
                };
                s
            })
    }

    proptest! {
        #[test]
        fn scores_stay_within_bounds(s in arb_signals()) {
            let registry = ScoringRegistry::with_defaults();
            for kind in SourceKind::ALL {
                let pair = registry.score(kind, &s, now());
                prop_assert!(pair.activity <= 100);
                prop_assert!(pair.communication <= 100);
            }
        }
    }
}
