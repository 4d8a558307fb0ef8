//! User status states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Availability state of a member.
///
/// Closed set: anything else read from storage is rejected at decode time
/// (see [`crate::domain::document`]) instead of being mapped to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserState {
    /// Working on at least one task.
    Active,

    /// No assigned task.
    Idle,

    /// Out of office for a bounded window.
    Ooo,

    /// Newly joined, not yet working on tasks.
    Onboarding,
}

impl UserState {
    pub const ALL: [UserState; 4] = [
        UserState::Active,
        UserState::Idle,
        UserState::Ooo,
        UserState::Onboarding,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UserState::Active => "ACTIVE",
            UserState::Idle => "IDLE",
            UserState::Ooo => "OOO",
            UserState::Onboarding => "ONBOARDING",
        }
    }

    /// ACTIVE or IDLE: the states derived from task assignments.
    pub fn is_baseline(self) -> bool {
        matches!(self, UserState::Active | UserState::Idle)
    }

    pub fn is_ooo(self) -> bool {
        self == UserState::Ooo
    }
}

impl fmt::Display for UserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the four states.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown user state '{0}'")]
pub struct UnknownState(pub String);

impl FromStr for UserState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}
