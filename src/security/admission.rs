//! Waiting-room admission and co-host promotion policy.
//!
//! Both evaluators are pure: they look at a participant snapshot and a
//! context and return a decision. Acting on it (and re-checking the live
//! status first) is the caller's job.

use crate::state::names::normalize;
use crate::state::{ModeFlags, Participant, ParticipantId, TrustLevel};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::collections::HashSet;

/// Participants a co-host removed this session.
///
/// Matched by id or by normalized name, so rejoining under a new id does
/// not get around it.
#[derive(Debug, Default, Clone)]
pub struct BadUsers {
    ids: HashSet<ParticipantId>,
    names: HashSet<String>,
}

impl BadUsers {
    pub fn insert(&mut self, participant: &Participant) {
        self.ids.insert(participant.id);
        self.names.insert(normalize(&participant.name));
    }

    pub fn contains(&self, participant: &Participant) -> bool {
        self.ids.contains(&participant.id) || self.names.contains(&normalize(&participant.name))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Why an admission was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitKind {
    /// Trust list says at least Known.
    Known,
    /// Waited long enough and the throttle allowed it.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    Admit(AdmitKind),
    Defer,
    /// Never admit; carries a human-readable reason for the log.
    Block(String),
}

/// Everything admission needs besides the participant.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionContext<'a> {
    pub flags: &'a ModeFlags,
    pub bad_users: &'a BadUsers,
    pub bad_name: Option<&'a Regex>,
    pub trust: TrustLevel,
    pub now: DateTime<Utc>,
    pub last_unknown_admit: Option<DateTime<Utc>>,
    pub unknown_wait: Duration,
    pub unknown_throttle: Duration,
}

/// Decide what to do with a participant in the waiting room.
pub fn evaluate_admission(p: &Participant, ctx: &AdmissionContext<'_>) -> AdmissionDecision {
    if p.is_self || !ctx.flags.process_participants || ctx.flags.is_passive() {
        return AdmissionDecision::Defer;
    }

    if ctx.bad_users.contains(p) {
        return AdmissionDecision::Block(format!(
            "{} was removed by a co-host and will not be admitted",
            p.name
        ));
    }
    if let Some(pattern) = ctx.bad_name
        && pattern.is_match(&p.name)
    {
        return AdmissionDecision::Block(format!(
            "{} matches the blocked name pattern and will not be admitted",
            p.name
        ));
    }

    if ctx.trust >= TrustLevel::Known && ctx.flags.admit_known {
        return AdmissionDecision::Admit(AdmitKind::Known);
    }

    if !ctx.flags.admit_others {
        return AdmissionDecision::Defer;
    }

    let Some(since) = p.waiting_since else {
        return AdmissionDecision::Defer;
    };
    let waited_enough = ctx.now - since > ctx.unknown_wait;
    let throttle_clear = ctx
        .last_unknown_admit
        .is_none_or(|last| ctx.now - last > ctx.unknown_throttle);

    if waited_enough && throttle_clear {
        AdmissionDecision::Admit(AdmitKind::Unknown)
    } else {
        AdmissionDecision::Defer
    }
}

/// Why a promotion was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotEligible,
    NotTrusted,
    Disabled,
    Removed,
    /// The bot is neither host nor co-host.
    NotPrivileged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionDecision {
    Promote,
    Skip(SkipReason),
}

/// Everything promotion needs besides the participant.
#[derive(Debug, Clone, Copy)]
pub struct PromotionContext<'a> {
    pub flags: &'a ModeFlags,
    pub bad_users: &'a BadUsers,
    pub trust: TrustLevel,
    pub bot_privileged: bool,
}

/// Decide whether an attending participant should be made co-host.
pub fn evaluate_promotion(p: &Participant, ctx: &PromotionContext<'_>) -> PromotionDecision {
    if !p.is_attending() || p.is_self || p.is_privileged() {
        return PromotionDecision::Skip(SkipReason::NotEligible);
    }
    if ctx.trust < TrustLevel::AutoCoHost {
        return PromotionDecision::Skip(SkipReason::NotTrusted);
    }
    if !ctx.flags.cohost_known {
        return PromotionDecision::Skip(SkipReason::Disabled);
    }
    if ctx.bad_users.contains(p) {
        return PromotionDecision::Skip(SkipReason::Removed);
    }
    if !ctx.bot_privileged {
        return PromotionDecision::Skip(SkipReason::NotPrivileged);
    }
    PromotionDecision::Promote
}
