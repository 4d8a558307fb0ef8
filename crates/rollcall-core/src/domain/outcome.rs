//! Outcome model: results reported back to callers.
//!
//! Task-linked updates never fail with an `Err`: the caller attaches their
//! outcome to its own response, downgrading errors to warnings. Batch runs
//! report counters.

use serde::{Deserialize, Serialize};

use super::state::UserState;
use super::transition::BaselineChange;
use crate::error::StatusError;

/// States involved in a task-linked update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<UserState>,
    pub current_status: UserState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub future_status: Option<UserState>,
}

/// Result of a task-linked status update.
///
/// Serialized with a `status` tag: `"success"` or `"error"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskLinkedOutcome {
    Success {
        message: String,
        data: OutcomeData,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        status_code: u16,
        error: String,
        message: String,
    },
}

impl TaskLinkedOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskLinkedOutcome::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            TaskLinkedOutcome::Success { message, .. } | TaskLinkedOutcome::Error { message, .. } => {
                message
            }
        }
    }

    pub fn from_change(change: &BaselineChange, baseline: UserState) -> Self {
        match change {
            BaselineChange::Created(record) => TaskLinkedOutcome::Success {
                message: format!(
                    "UserStatus Document did not previously exist, New UserStatus Document created and updated to an {baseline} status."
                ),
                data: OutcomeData {
                    previous_status: None,
                    current_status: record.current_state(),
                    future_status: None,
                },
            },
            BaselineChange::FutureUpdated(record) => TaskLinkedOutcome::Success {
                message: format!(
                    "As the user is currently OOO, the future status has been updated to {baseline}."
                ),
                data: OutcomeData {
                    previous_status: None,
                    current_status: record.current_state(),
                    future_status: record.future_state(),
                },
            },
            BaselineChange::Unchanged { state } => TaskLinkedOutcome::Success {
                message: format!("The status is already {state}."),
                data: OutcomeData {
                    previous_status: None,
                    current_status: *state,
                    future_status: None,
                },
            },
            BaselineChange::Changed { previous, record } => TaskLinkedOutcome::Success {
                message: format!("The status has been updated to {baseline}."),
                data: OutcomeData {
                    previous_status: Some(*previous),
                    current_status: record.current_state(),
                    future_status: record.future_state(),
                },
            },
        }
    }
}

impl From<&StatusError> for TaskLinkedOutcome {
    fn from(err: &StatusError) -> Self {
        let kind = err.kind();
        TaskLinkedOutcome::Error {
            status_code: kind.status_code(),
            error: kind.as_str().to_string(),
            message: err.to_string(),
        }
    }
}

/// Counters of one reconcile run, bucketed by the resulting current state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    pub users_count: usize,
    pub ooo_users_altered: usize,
    pub ooo_users_unaltered: usize,
    pub non_ooo_users_altered: usize,
    pub non_ooo_users_unaltered: usize,
}

/// Counters of one baseline sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub users_count: usize,
    pub unprocessed_users: usize,
    pub active_users_altered: usize,
    pub idle_users_altered: usize,
    pub future_status_updated: usize,
    pub users_unaltered: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::UserId;
    use crate::domain::record::{StatusPeriod, StatusRecord};
    use crate::domain::validation::Violation;
    use serde_json::json;

    #[test]
    fn test_success_outcome_shape() {
        let record = StatusRecord::new(UserId::new("u1"), StatusPeriod::new(UserState::Idle, 5));
        let change = BaselineChange::Changed {
            previous: UserState::Active,
            record,
        };

        let outcome = TaskLinkedOutcome::from_change(&change, UserState::Idle);
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "status": "success",
                "message": "The status has been updated to IDLE.",
                "data": { "previousStatus": "ACTIVE", "currentStatus": "IDLE" }
            })
        );
    }

    #[test]
    fn test_ooo_outcome_reports_future() {
        let record = StatusRecord::new(UserId::new("u1"), StatusPeriod::ooo(0, 10, ""))
            .with_future(StatusPeriod::new(UserState::Active, 10));
        let outcome =
            TaskLinkedOutcome::from_change(&BaselineChange::FutureUpdated(record), UserState::Active);

        assert_eq!(
            outcome.message(),
            "As the user is currently OOO, the future status has been updated to ACTIVE."
        );
        let TaskLinkedOutcome::Success { data, .. } = outcome else {
            panic!("expected success");
        };
        assert_eq!(data.current_status, UserState::Ooo);
        assert_eq!(data.future_status, Some(UserState::Active));
    }

    #[test]
    fn test_changed_outcome_keeps_scheduled_ooo() {
        let record = StatusRecord::new(UserId::new("u1"), StatusPeriod::new(UserState::Active, 5))
            .with_future(StatusPeriod::ooo(20, 30, ""));
        let change = BaselineChange::Changed {
            previous: UserState::Idle,
            record,
        };

        let TaskLinkedOutcome::Success { data, .. } =
            TaskLinkedOutcome::from_change(&change, UserState::Active)
        else {
            panic!("expected success");
        };
        assert_eq!(data.previous_status, Some(UserState::Idle));
        assert_eq!(data.future_status, Some(UserState::Ooo));
    }

    #[test]
    fn test_error_outcome_shape() {
        let err = StatusError::from(Violation::NotABaseline {
            state: UserState::Ooo,
        });
        let outcome = TaskLinkedOutcome::from(&err);

        assert!(!outcome.is_success());
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["statusCode"], 400);
        assert_eq!(value["error"], "Bad Request");
    }

    #[test]
    fn test_summary_field_names() {
        let value = serde_json::to_value(ReconcileSummary::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "usersCount": 0,
                "oooUsersAltered": 0,
                "oooUsersUnaltered": 0,
                "nonOooUsersAltered": 0,
                "nonOooUsersUnaltered": 0
            })
        );
    }
}
