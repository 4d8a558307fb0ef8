//! Status transition engine.
//!
//! Every function here is pure: given the stored record (if any), the request
//! and `now`, it returns the record to persist. Reading and writing the store is
//! left to the application layer, so the rules can be tested without one.
//!
//! State machine of one record:
//! - manual change: today-or-earlier requests replace `currentStatus`,
//!   later ones replace `futureStatus`
//! - cancel OOO: OOO -> baseline (ACTIVE/IDLE)
//! - task events: baseline applied now, or queued behind a running OOO
//! - advance time: due `futureStatus` is promoted or, for an elapsed OOO
//!   window, dropped

use super::ids::UserId;
use super::record::{StatusPeriod, StatusRecord};
use super::state::UserState;
use super::time::{Timestamp, start_of_tomorrow};
use super::validation::{
    ValidationPolicy, Violation, validate_baseline, validate_period, validate_restricted_edit,
};
use crate::error::StatusError;

/// Result of [`apply_manual_change`].
#[derive(Debug, Clone, PartialEq)]
pub struct ManualChange {
    pub record: StatusRecord,
    /// No record existed before this change.
    pub created: bool,
}

/// Apply a manually requested status.
pub fn apply_manual_change(
    existing: Option<&StatusRecord>,
    user_id: &UserId,
    requested: StatusPeriod,
    now: Timestamp,
    policy: &ValidationPolicy,
) -> Result<ManualChange, Violation> {
    validate_period(&requested, now, policy)?;
    let requested = requested.updated(now);
    let immediate = requested.from < start_of_tomorrow(now);

    let Some(existing) = existing else {
        let record = if immediate {
            StatusRecord::new(user_id.clone(), requested)
        } else {
            StatusRecord::new(user_id.clone(), StatusPeriod::new(UserState::Active, now))
                .with_future(requested)
        };
        return Ok(ManualChange {
            record,
            created: true,
        });
    };

    let mut record = existing.clone();
    if !immediate {
        record.future_status = Some(requested);
        return Ok(ManualChange {
            record,
            created: false,
        });
    }

    // Where to go back to once a new OOO ends: the state being left, or the
    // pending return of the OOO being replaced.
    let resume = match existing.current_state() {
        UserState::Ooo => existing.future_state().filter(|state| state.is_baseline()),
        state => resume_state(state),
    };

    if record.has_return_placeholder() {
        record.future_status = None;
    }
    if requested.state.is_ooo() && record.future_status.is_none() {
        if let (Some(state), Some(until)) = (resume, requested.until) {
            record.future_status = Some(StatusPeriod::new(state, until).updated(now));
        }
    }
    record.current_status = requested;

    Ok(ManualChange {
        record,
        created: false,
    })
}

/// Message-only edit of the current period (self-service path).
pub fn apply_restricted_edit(
    existing: &StatusRecord,
    requested: &StatusPeriod,
    now: Timestamp,
    policy: &ValidationPolicy,
) -> Result<StatusRecord, Violation> {
    validate_restricted_edit(&existing.current_status, requested, policy)?;
    let mut record = existing.clone();
    record.current_status.message = requested.message.clone();
    record.current_status.updated_at = now;
    Ok(record)
}

/// End an OOO period early and fall back to `baseline`.
///
/// A scheduled OOO stays scheduled; a pending "resume" placeholder is
/// dropped because the baseline is being applied right now.
pub fn cancel_ooo(
    existing: Option<&StatusRecord>,
    user_id: &UserId,
    baseline: UserState,
    now: Timestamp,
) -> Result<StatusRecord, StatusError> {
    let existing = existing.ok_or_else(|| StatusError::status_not_found(user_id))?;
    let state = existing.current_state();
    if !state.is_ooo() {
        return Err(StatusError::Forbidden {
            message: format!(
                "The OOO Status cannot be canceled because the current status is {state}."
            ),
        });
    }

    let mut record = existing.clone();
    record.current_status = StatusPeriod::new(baseline, now).updated(now);
    if record.has_return_placeholder() {
        record.future_status = None;
    }
    Ok(record)
}

/// Result of [`advance_time`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Unchanged,
    Advanced(StatusRecord),
}

impl Advance {
    pub fn is_altered(&self) -> bool {
        matches!(self, Advance::Advanced(_))
    }
}

/// Promote or expire the scheduled period of `record` as of `now`.
///
/// Steps are applied until nothing changes, so the result is a fixed point:
/// `advance_time(advance_time(r, t), t)` is always `Unchanged`.
pub fn advance_time(record: &StatusRecord, now: Timestamp) -> Advance {
    let Some(mut current) = advance_step(record, now) else {
        return Advance::Unchanged;
    };
    while let Some(next) = advance_step(&current, now) {
        current = next;
    }
    Advance::Advanced(current)
}

fn advance_step(record: &StatusRecord, now: Timestamp) -> Option<StatusRecord> {
    let future = record.future_status.as_ref()?;
    match future.state {
        UserState::Active | UserState::Idle if now >= future.from => {
            let mut next = record.clone();
            let mut promoted = future.clone().updated(now);
            promoted.until = None;
            next.current_status = promoted;
            next.future_status = None;
            Some(next)
        }
        UserState::Ooo => {
            if future.until.is_some_and(|until| now > until) {
                let mut next = record.clone();
                next.future_status = None;
                return Some(next);
            }
            if now < future.from {
                return None;
            }

            let mut next = record.clone();
            let previous = record.current_status.state;
            next.current_status = future.clone().updated(now);
            next.future_status = match (resume_state(previous), future.until) {
                (Some(state), Some(until)) => Some(StatusPeriod::new(state, until).updated(now)),
                _ => None,
            };
            Some(next)
        }
        _ => None,
    }
}

/// State to return to when an OOO window that interrupts `previous` ends.
///
/// Only ACTIVE/IDLE are ever promoted from `futureStatus`, so ONBOARDING
/// resumes as ACTIVE.
fn resume_state(previous: UserState) -> Option<UserState> {
    match previous {
        UserState::Active | UserState::Idle => Some(previous),
        UserState::Onboarding => Some(UserState::Active),
        UserState::Ooo => None,
    }
}

/// What caused a baseline recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineTrigger {
    TaskCompleted,
    TaskAssigned,
    Sync,
}

impl BaselineTrigger {
    pub fn future_message(self) -> &'static str {
        match self {
            BaselineTrigger::TaskCompleted => "future status updated due to task completion",
            BaselineTrigger::TaskAssigned => "future status updated due to task assignment",
            BaselineTrigger::Sync => "future status updated due to status sync",
        }
    }
}

/// Result of [`apply_baseline`].
#[derive(Debug, Clone, PartialEq)]
pub enum BaselineChange {
    /// No record existed; one was created at the baseline.
    Created(StatusRecord),
    /// The member is OOO; the baseline waits in `futureStatus`.
    FutureUpdated(StatusRecord),
    /// Already in the baseline state.
    Unchanged { state: UserState },
    Changed {
        previous: UserState,
        record: StatusRecord,
    },
}

impl BaselineChange {
    /// Record to persist, if anything changed.
    pub fn record(&self) -> Option<&StatusRecord> {
        match self {
            BaselineChange::Created(record)
            | BaselineChange::FutureUpdated(record)
            | BaselineChange::Changed { record, .. } => Some(record),
            BaselineChange::Unchanged { .. } => None,
        }
    }
}

/// Apply a task-derived ACTIVE/IDLE state.
pub fn apply_baseline(
    existing: Option<&StatusRecord>,
    user_id: &UserId,
    baseline: UserState,
    trigger: BaselineTrigger,
    now: Timestamp,
) -> Result<BaselineChange, Violation> {
    validate_baseline(baseline)?;

    let Some(existing) = existing else {
        return Ok(BaselineChange::Created(StatusRecord::new(
            user_id.clone(),
            StatusPeriod::new(baseline, now),
        )));
    };

    let current = &existing.current_status;
    if current.state.is_ooo() {
        let mut record = existing.clone();
        let resume_at = current.until.unwrap_or(now);
        record.future_status = Some(
            StatusPeriod::new(baseline, resume_at)
                .with_message(trigger.future_message())
                .updated(now),
        );
        return Ok(BaselineChange::FutureUpdated(record));
    }

    if current.state == baseline {
        return Ok(BaselineChange::Unchanged { state: baseline });
    }

    let mut record = existing.clone();
    record.current_status = StatusPeriod::new(baseline, now);
    if record.has_return_placeholder() {
        record.future_status = None;
    }
    Ok(BaselineChange::Changed {
        previous: current.state,
        record,
    })
}
