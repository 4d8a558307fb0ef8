//! Status validator: pure checks on requested status periods.
//!
//! Every check returns a [`Violation`] that names the offending field, so a
//! caller can surface it verbatim as a client error.

use serde::{Deserialize, Serialize};

use super::record::StatusPeriod;
use super::state::UserState;
use super::time::{DAY_MS, Timestamp, start_of_day, start_of_tomorrow};

/// A rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("from: a status cannot start before the start of today ({today})")]
    BackDated { from: Timestamp, today: Timestamp },

    #[error("until: must not be earlier than from")]
    UntilBeforeFrom { from: Timestamp, until: Timestamp },

    #[error("until: an OOO status requires an end date")]
    MissingUntil,

    #[error("until: only an OOO status can have an end date, not {state}")]
    UnexpectedUntil { state: UserState },

    #[error("message: a reason is required for an OOO status longer than {threshold_days} days")]
    MissingOooMessage { threshold_days: i64 },

    #[error("from: {state} cannot be scheduled for a future date")]
    Unschedulable { state: UserState },

    #[error("{field}: cannot be changed through a status edit, only message can be updated")]
    FieldNotEditable { field: &'static str },

    #[error("state: {state} is not derived from tasks, expected ACTIVE or IDLE")]
    NotABaseline { state: UserState },

    #[error("monthlyHours.committed: must be a non-negative number")]
    InvalidCommittedHours,

    #[error("request must contain currentStatus or monthlyHours")]
    EmptyUpdate,
}

impl Violation {
    /// Request field the violation is about.
    pub fn field(&self) -> &'static str {
        match self {
            Violation::BackDated { .. } | Violation::Unschedulable { .. } => "from",
            Violation::UntilBeforeFrom { .. }
            | Violation::MissingUntil
            | Violation::UnexpectedUntil { .. } => "until",
            Violation::MissingOooMessage { .. } => "message",
            Violation::FieldNotEditable { field } => *field,
            Violation::NotABaseline { .. } => "state",
            Violation::InvalidCommittedHours => "monthlyHours",
            Violation::EmptyUpdate => "body",
        }
    }
}

/// Tunables for the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// OOO periods longer than this many days need a message.
    pub ooo_message_threshold_days: i64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            ooo_message_threshold_days: 3,
        }
    }
}

impl ValidationPolicy {
    fn threshold_ms(&self) -> Timestamp {
        self.ooo_message_threshold_days * DAY_MS
    }
}

/// Validate a requested period against `now`.
pub fn validate_period(
    period: &StatusPeriod,
    now: Timestamp,
    policy: &ValidationPolicy,
) -> Result<(), Violation> {
    let today = start_of_day(now);
    if period.from < today {
        return Err(Violation::BackDated {
            from: period.from,
            today,
        });
    }

    match (period.state, period.until) {
        (UserState::Ooo, None) => return Err(Violation::MissingUntil),
        (UserState::Ooo, Some(until)) if until < period.from => {
            return Err(Violation::UntilBeforeFrom {
                from: period.from,
                until,
            });
        }
        (state, Some(_)) if state != UserState::Ooo => {
            return Err(Violation::UnexpectedUntil { state });
        }
        _ => {}
    }

    if period.state == UserState::Onboarding && period.from >= start_of_tomorrow(now) {
        return Err(Violation::Unschedulable {
            state: period.state,
        });
    }

    check_ooo_message(period, policy)
}

/// Long OOO windows must say why.
pub fn check_ooo_message(period: &StatusPeriod, policy: &ValidationPolicy) -> Result<(), Violation> {
    let too_long = period
        .span()
        .is_some_and(|span| span > policy.threshold_ms());
    if period.state.is_ooo() && too_long && period.message.trim().is_empty() {
        return Err(Violation::MissingOooMessage {
            threshold_days: policy.ooo_message_threshold_days,
        });
    }
    Ok(())
}

/// Self-service edits may only touch the message.
pub fn validate_restricted_edit(
    existing: &StatusPeriod,
    requested: &StatusPeriod,
    policy: &ValidationPolicy,
) -> Result<(), Violation> {
    if requested.state != existing.state {
        return Err(Violation::FieldNotEditable { field: "state" });
    }
    if requested.until != existing.until {
        return Err(Violation::FieldNotEditable { field: "until" });
    }
    let edited = existing.clone().with_message(requested.message.clone());
    check_ooo_message(&edited, policy)
}

/// Task-derived updates only ever carry ACTIVE or IDLE.
pub fn validate_baseline(state: UserState) -> Result<(), Violation> {
    if state.is_baseline() {
        Ok(())
    } else {
        Err(Violation::NotABaseline { state })
    }
}

pub fn validate_committed_hours(committed: f64) -> Result<(), Violation> {
    if committed.is_finite() && committed >= 0.0 {
        Ok(())
    } else {
        Err(Violation::InvalidCommittedHours)
    }
}
