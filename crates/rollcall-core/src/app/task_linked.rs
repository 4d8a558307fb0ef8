//! TaskLinkedUpdater - タスクの割り当て・完了からステータスを導出
//!
//! # フロー
//! 1. TaskLookup で baseline（ACTIVE / IDLE）を決める
//! 2. 既存文書を version 付きで読む
//! 3. `apply_baseline` で遷移を計算
//! 4. 変化があれば CAS 付きで書く
//!
//! 失敗は `Err` ではなく [`TaskLinkedOutcome::Error`] として返す。
//! 呼び出し側（タスク API）は自分のレスポンスに warning として添付する。

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::ids::UserId;
use crate::domain::outcome::TaskLinkedOutcome;
use crate::domain::state::UserState;
use crate::domain::transition::{BaselineChange, BaselineTrigger, apply_baseline};
use crate::error::StatusError;
use crate::ports::{Clock, Precondition, StatusStore, TaskLookup, UserDirectory, Write};

pub struct TaskLinkedUpdater {
    store: Arc<dyn StatusStore>,
    tasks: Arc<dyn TaskLookup>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
}

impl TaskLinkedUpdater {
    pub fn new(
        store: Arc<dyn StatusStore>,
        tasks: Arc<dyn TaskLookup>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            tasks,
            users,
            clock,
        }
    }

    /// ACTIVE while the user holds a non-terminal task, IDLE otherwise.
    pub async fn baseline_for(&self, user_id: &UserId) -> Result<UserState, StatusError> {
        let open = self.tasks.open_task_count(user_id).await?;
        Ok(if open > 0 {
            UserState::Active
        } else {
            UserState::Idle
        })
    }

    pub async fn on_task_completed(&self, user_id: &UserId) -> TaskLinkedOutcome {
        let result = match self.baseline_for(user_id).await {
            Ok(baseline) => {
                self.apply(user_id, baseline, BaselineTrigger::TaskCompleted)
                    .await
            }
            Err(err) => Err(err),
        };
        report(user_id, result)
    }

    pub async fn on_task_assigned(&self, user_id: &UserId) -> TaskLinkedOutcome {
        let result = self
            .apply(user_id, UserState::Active, BaselineTrigger::TaskAssigned)
            .await;
        report(user_id, result)
    }

    pub async fn on_task_assigned_by_username(&self, username: &str) -> TaskLinkedOutcome {
        let resolved = match self.users.resolve_username(username).await {
            Ok(Some(user_id)) => user_id,
            Ok(None) => {
                let err = StatusError::NotFound {
                    message: format!("User with username {username} not found"),
                };
                warn!(username, error = %err, "task-linked status update failed");
                return TaskLinkedOutcome::from(&err);
            }
            Err(e) => {
                let err = StatusError::from(e);
                warn!(username, error = %err, "task-linked status update failed");
                return TaskLinkedOutcome::from(&err);
            }
        };
        self.on_task_assigned(&resolved).await
    }

    async fn apply(
        &self,
        user_id: &UserId,
        baseline: UserState,
        trigger: BaselineTrigger,
    ) -> Result<TaskLinkedOutcome, StatusError> {
        let read = self.store.get(user_id).await?;
        let precondition = Precondition::from_read(read.as_ref());
        let existing = read.map(|versioned| versioned.record);

        let now = self.clock.now_millis();
        let change = apply_baseline(existing.as_ref(), user_id, baseline, trigger, now)?;

        match change.record() {
            Some(record) => {
                self.store
                    .commit(vec![Write::put(record.clone(), precondition)])
                    .await?;
                info!(user_id = %user_id, baseline = %baseline, ?trigger, "task-linked status applied");
            }
            None => debug!(user_id = %user_id, baseline = %baseline, "status already at baseline"),
        }

        if let BaselineChange::FutureUpdated(_) = change {
            debug!(user_id = %user_id, "user is OOO, baseline queued as future status");
        }
        Ok(TaskLinkedOutcome::from_change(&change, baseline))
    }
}

fn report(user_id: &UserId, result: Result<TaskLinkedOutcome, StatusError>) -> TaskLinkedOutcome {
    match result {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(user_id = %user_id, error = %err, "task-linked status update failed");
            TaskLinkedOutcome::from(&err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::StatusDocument;
    use crate::domain::ids::TaskId;
    use crate::domain::outcome::OutcomeData;
    use crate::domain::record::{StatusPeriod, StatusRecord};
    use crate::domain::task::{TaskAssignment, TaskStatus};
    use crate::domain::time::days;
    use crate::error::INVALID_STATE_MESSAGE;
    use crate::impls::{InMemoryStatusStore, InMemoryTaskBoard};
    use crate::ports::FixedClock;
    use serde_json::json;

    // 2024-01-10T12:00:00Z
    const NOW: i64 = 1_704_888_000_000;

    fn setup() -> (TaskLinkedUpdater, InMemoryStatusStore, InMemoryTaskBoard) {
        crate::observability::init_test_logging();
        let store = InMemoryStatusStore::new();
        let board = InMemoryTaskBoard::new();
        let updater = TaskLinkedUpdater::new(
            Arc::new(store.clone()),
            Arc::new(board.clone()),
            Arc::new(board.clone()),
            Arc::new(FixedClock::from_millis(NOW)),
        );
        (updater, store, board)
    }

    async fn seed(store: &InMemoryStatusStore, record: StatusRecord) {
        store
            .commit(vec![Write::put(record, Precondition::Any)])
            .await
            .unwrap();
    }

    fn u1() -> UserId {
        UserId::new("u1")
    }

    #[tokio::test]
    async fn test_completion_for_active_user_goes_idle() {
        let (updater, store, _board) = setup();
        seed(
            &store,
            StatusRecord::new(u1(), StatusPeriod::new(UserState::Active, NOW - days(3))),
        )
        .await;

        let outcome = updater.on_task_completed(&u1()).await;
        assert_eq!(
            outcome,
            TaskLinkedOutcome::Success {
                message: "The status has been updated to IDLE.".into(),
                data: OutcomeData {
                    previous_status: Some(UserState::Active),
                    current_status: UserState::Idle,
                    future_status: None,
                },
            }
        );
        let stored = store.get(&u1()).await.unwrap().unwrap();
        assert_eq!(stored.record.current_state(), UserState::Idle);
    }

    #[tokio::test]
    async fn test_completion_creates_missing_record_as_idle() {
        let (updater, store, board) = setup();
        board
            .upsert_task(TaskAssignment {
                id: TaskId::new("t1"),
                assignee: Some(u1()),
                status: TaskStatus::Completed,
            })
            .await;

        let outcome = updater.on_task_completed(&u1()).await;
        assert_eq!(
            outcome,
            TaskLinkedOutcome::Success {
                message: "UserStatus Document did not previously exist, New UserStatus Document created and updated to an IDLE status.".into(),
                data: OutcomeData {
                    previous_status: None,
                    current_status: UserState::Idle,
                    future_status: None,
                },
            }
        );
        let stored = store.get(&u1()).await.unwrap().unwrap();
        assert_eq!(stored.record.current_state(), UserState::Idle);
        assert_eq!(stored.record.current_status.from, NOW);
    }

    #[tokio::test]
    async fn test_completion_with_remaining_task_stays_active() {
        let (updater, store, board) = setup();
        board
            .upsert_task(TaskAssignment {
                id: TaskId::new("t2"),
                assignee: Some(u1()),
                status: TaskStatus::InProgress,
            })
            .await;
        seed(
            &store,
            StatusRecord::new(u1(), StatusPeriod::new(UserState::Active, NOW)),
        )
        .await;

        let outcome = updater.on_task_completed(&u1()).await;
        assert_eq!(outcome.message(), "The status is already ACTIVE.");
    }

    #[tokio::test]
    async fn test_assignment_during_ooo_queues_future() {
        let (updater, store, _board) = setup();
        seed(
            &store,
            StatusRecord::new(u1(), StatusPeriod::ooo(NOW - days(1), NOW + days(2), "")),
        )
        .await;

        let outcome = updater.on_task_assigned(&u1()).await;
        assert_eq!(
            outcome.message(),
            "As the user is currently OOO, the future status has been updated to ACTIVE."
        );

        let stored = store.get(&u1()).await.unwrap().unwrap().record;
        assert_eq!(stored.current_state(), UserState::Ooo);
        let future = stored.future_status.unwrap();
        assert_eq!(future.state, UserState::Active);
        assert_eq!(future.from, NOW + days(2));
        assert_eq!(future.message, "future status updated due to task assignment");
    }

    #[tokio::test]
    async fn test_assignment_creates_missing_record() {
        let (updater, store, _board) = setup();
        let outcome = updater.on_task_assigned(&u1()).await;

        assert_eq!(
            outcome.message(),
            "UserStatus Document did not previously exist, New UserStatus Document created and updated to an ACTIVE status."
        );
        assert!(store.get(&u1()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_username() {
        let (updater, _store, _board) = setup();
        let outcome = updater.on_task_assigned_by_username("ghost").await;
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["statusCode"], 404);
        assert_eq!(value["message"], "User with username ghost not found");
    }

    #[tokio::test]
    async fn test_username_resolves() {
        let (updater, store, board) = setup();
        board.add_user(u1(), "ankush").await;

        let outcome = updater.on_task_assigned_by_username("ankush").await;
        assert!(outcome.is_success());
        let stored = store.get(&u1()).await.unwrap().unwrap();
        assert_eq!(stored.record.current_state(), UserState::Active);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_reported_not_thrown() {
        let (updater, store, _board) = setup();
        let document: StatusDocument = serde_json::from_value(json!({
            "userId": "u1",
            "currentStatus": { "state": "SLEEPING", "from": 1 }
        }))
        .unwrap();
        store.insert_raw(document).await;

        let outcome = updater.on_task_completed(&u1()).await;
        assert_eq!(
            outcome,
            TaskLinkedOutcome::Error {
                status_code: 500,
                error: "Internal Server Error".into(),
                message: INVALID_STATE_MESSAGE.into(),
            }
        );
    }
}
