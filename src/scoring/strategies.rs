//! Built-in scoring strategies, one per supported source.
//!
//! Each strategy runs the generic engine with weights tuned to what the
//! platform actually exposes: chat platforms weigh messages, calendar and
//! mail platforms weigh meetings and email.

use super::{score_with, ProfileWeights, RecencySteps, ScoringProfile, BASE_SCORE};
use crate::models::{ChannelKind, RawSignals, ScorePair};
use chrono::{DateTime, Utc};

const STANDARD_PROFILE: ProfileWeights = ProfileWeights {
    avatar: 5,
    real_name: 5,
    title: 3,
    status: 3,
    verified: 4,
};

const STANDARD_RECENCY: RecencySteps = RecencySteps {
    within_week: 20,
    within_month: 10,
    within_quarter: 3,
    stale: -15,
    unknown: -25,
};

const VOLUME_CAP: f64 = 10.0;

/// Used for sources without a dedicated strategy.
pub const GENERIC: ScoringProfile = ScoringProfile {
    base: BASE_SCORE,
    profile: STANDARD_PROFILE,
    recency: STANDARD_RECENCY,
    channel_bonus: 5,
    volume_weights: &[
        (ChannelKind::DirectMessage, 0.5),
        (ChannelKind::Group, 0.25),
        (ChannelKind::Meeting, 2.0),
        (ChannelKind::Email, 0.5),
        (ChannelKind::FileShare, 1.0),
    ],
    volume_cap: VOLUME_CAP,
    silent_penalty: -20,
};

pub const SLACK: ScoringProfile = ScoringProfile {
    profile: ProfileWeights {
        status: 5,
        ..STANDARD_PROFILE
    },
    volume_weights: &[
        (ChannelKind::DirectMessage, 0.5),
        (ChannelKind::Group, 0.2),
        (ChannelKind::Meeting, 2.0),
        (ChannelKind::FileShare, 1.0),
    ],
    ..GENERIC
};

pub const DISCORD: ScoringProfile = ScoringProfile {
    profile: ProfileWeights {
        title: 0,
        verified: 2,
        ..STANDARD_PROFILE
    },
    recency: RecencySteps {
        within_week: 25,
        within_month: 10,
        within_quarter: 0,
        stale: -20,
        unknown: -25,
    },
    volume_weights: &[
        (ChannelKind::DirectMessage, 0.5),
        (ChannelKind::Group, 0.1),
        (ChannelKind::Meeting, 1.5),
    ],
    ..GENERIC
};

pub const MICROSOFT_TEAMS: ScoringProfile = ScoringProfile {
    profile: ProfileWeights {
        title: 5,
        ..STANDARD_PROFILE
    },
    volume_weights: &[
        (ChannelKind::DirectMessage, 0.5),
        (ChannelKind::Group, 0.25),
        (ChannelKind::Meeting, 2.5),
        (ChannelKind::Email, 0.25),
        (ChannelKind::FileShare, 1.0),
    ],
    ..GENERIC
};

pub const GOOGLE_WORKSPACE: ScoringProfile = ScoringProfile {
    profile: ProfileWeights {
        status: 0,
        title: 5,
        ..STANDARD_PROFILE
    },
    volume_weights: &[
        (ChannelKind::Meeting, 2.0),
        (ChannelKind::Email, 0.5),
        (ChannelKind::FileShare, 1.5),
    ],
    ..GENERIC
};

pub const ZOOM: ScoringProfile = ScoringProfile {
    profile: ProfileWeights {
        title: 2,
        status: 2,
        ..STANDARD_PROFILE
    },
    channel_bonus: 4,
    volume_weights: &[
        (ChannelKind::DirectMessage, 0.25),
        (ChannelKind::Group, 0.1),
        (ChannelKind::Meeting, 3.0),
    ],
    ..GENERIC
};

pub fn generic(signals: &RawSignals, now: DateTime<Utc>) -> ScorePair {
    score_with(&GENERIC, signals, now)
}

pub fn slack(signals: &RawSignals, now: DateTime<Utc>) -> ScorePair {
    score_with(&SLACK, signals, now)
}

pub fn discord(signals: &RawSignals, now: DateTime<Utc>) -> ScorePair {
    score_with(&DISCORD, signals, now)
}

pub fn microsoft_teams(signals: &RawSignals, now: DateTime<Utc>) -> ScorePair {
    score_with(&MICROSOFT_TEAMS, signals, now)
}

pub fn google_workspace(signals: &RawSignals, now: DateTime<Utc>) -> ScorePair {
    score_with(&GOOGLE_WORKSPACE, signals, now)
}

pub fn zoom(signals: &RawSignals, now: DateTime<Utc>) -> ScorePair {
    score_with(&ZOOM, signals, now)
}
