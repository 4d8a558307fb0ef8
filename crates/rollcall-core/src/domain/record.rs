//! Status record and status period.
//!
//! A `StatusRecord` is the single source of truth for one member's
//! availability. It is only ever replaced as a whole by the transition
//! functions in [`crate::domain::transition`].

use serde::{Deserialize, Serialize};

use super::ids::UserId;
use super::state::UserState;
use super::time::Timestamp;

/// One state over a time range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPeriod {
    pub state: UserState,

    /// When the period begins (or began).
    pub from: Timestamp,

    /// End of an OOO window. `None` for open-ended periods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<Timestamp>,

    #[serde(default)]
    pub message: String,

    /// Time of the write that produced this period.
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl StatusPeriod {
    pub fn new(state: UserState, from: Timestamp) -> Self {
        Self {
            state,
            from,
            until: None,
            message: String::new(),
            updated_at: from,
        }
    }

    pub fn ooo(from: Timestamp, until: Timestamp, message: impl Into<String>) -> Self {
        Self {
            until: Some(until),
            message: message.into(),
            ..Self::new(UserState::Ooo, from)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_until(mut self, until: Timestamp) -> Self {
        self.until = Some(until);
        self
    }

    pub fn updated(mut self, at: Timestamp) -> Self {
        self.updated_at = at;
        self
    }

    /// Length of the window, when it has an end.
    pub fn span(&self) -> Option<Timestamp> {
        self.until.map(|until| until - self.from)
    }
}

/// Committed monthly hours. Stored alongside the status, not part of the
/// state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyHours {
    pub committed: f64,
    pub updated_at: Timestamp,
}

/// Status of one member: what holds now and what is scheduled next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub user_id: UserId,
    pub current_status: StatusPeriod,

    /// At most one scheduled change. A newer request replaces it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub future_status: Option<StatusPeriod>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_hours: Option<MonthlyHours>,
}

impl StatusRecord {
    pub fn new(user_id: UserId, current_status: StatusPeriod) -> Self {
        Self {
            user_id,
            current_status,
            future_status: None,
            monthly_hours: None,
        }
    }

    pub fn with_future(mut self, future_status: StatusPeriod) -> Self {
        self.future_status = Some(future_status);
        self
    }

    pub fn current_state(&self) -> UserState {
        self.current_status.state
    }

    pub fn future_state(&self) -> Option<UserState> {
        self.future_status.as_ref().map(|period| period.state)
    }

    /// A future ACTIVE/IDLE period is a "resume after OOO" placeholder.
    pub fn has_return_placeholder(&self) -> bool {
        self.future_state().is_some_and(UserState::is_baseline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_camel_case_fields() {
        let record = StatusRecord::new(
            UserId::new("u1"),
            StatusPeriod::ooo(1_000, 2_000, "trip").updated(500),
        )
        .with_future(StatusPeriod::new(UserState::Active, 2_000));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "userId": "u1",
                "currentStatus": {
                    "state": "OOO",
                    "from": 1000,
                    "until": 2000,
                    "message": "trip",
                    "updatedAt": 500
                },
                "futureStatus": {
                    "state": "ACTIVE",
                    "from": 2000,
                    "message": "",
                    "updatedAt": 2000
                }
            })
        );
    }

    #[test]
    fn return_placeholder_is_a_baseline_future() {
        let base = StatusRecord::new(UserId::new("u1"), StatusPeriod::ooo(0, 10, ""));
        assert!(!base.has_return_placeholder());
        assert!(
            base.clone()
                .with_future(StatusPeriod::new(UserState::Idle, 10))
                .has_return_placeholder()
        );
        assert!(
            !base
                .with_future(StatusPeriod::ooo(20, 30, ""))
                .has_return_placeholder()
        );
    }

    #[test]
    fn span_is_none_for_open_periods() {
        assert_eq!(StatusPeriod::new(UserState::Idle, 5).span(), None);
        assert_eq!(StatusPeriod::ooo(5, 25, "").span(), Some(20));
    }
}
