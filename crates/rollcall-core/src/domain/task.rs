//! Tasks as seen by the status engine (read-only, owned by the task tracker).

use serde::{Deserialize, Serialize};

use super::ids::{TaskId, UserId};

/// Task lifecycle status in the external tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Available,
    Assigned,
    InProgress,
    Blocked,
    NeedsReview,
    InReview,
    Approved,
    Completed,
    Done,
    Verified,
}

impl TaskStatus {
    /// Is this a terminal status (work on the task is over)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Done | TaskStatus::Verified
        )
    }
}

/// A task and its assignee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssignment {
    pub id: TaskId,
    #[serde(default)]
    pub assignee: Option<UserId>,
    pub status: TaskStatus,
}

impl TaskAssignment {
    /// Counts towards the assignee being ACTIVE.
    pub fn keeps_assignee_active(&self) -> bool {
        self.assignee.is_some() && !self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::completed(TaskStatus::Completed, true)]
    #[case::done(TaskStatus::Done, true)]
    #[case::verified(TaskStatus::Verified, true)]
    #[case::assigned(TaskStatus::Assigned, false)]
    #[case::in_progress(TaskStatus::InProgress, false)]
    #[case::blocked(TaskStatus::Blocked, false)]
    fn terminal_statuses(#[case] status: TaskStatus, #[case] terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[test]
    fn unassigned_tasks_do_not_count() {
        let task = TaskAssignment {
            id: TaskId::new("t1"),
            assignee: None,
            status: TaskStatus::Available,
        };
        assert!(!task.keeps_assignee_active());

        let task = TaskAssignment {
            assignee: Some(UserId::new("u1")),
            status: TaskStatus::InProgress,
            ..task
        };
        assert!(task.keeps_assignee_active());
    }

    #[test]
    fn status_uses_tracker_spelling() {
        let json = serde_json::json!({ "id": "t1", "assignee": "u1", "status": "IN_PROGRESS" });
        let task: TaskAssignment = serde_json::from_value(json).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
    }
}
