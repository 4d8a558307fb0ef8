//! StatusService - リクエスト単位のファサード
//!
//! get / list / update / cancel OOO / delete を提供する。どの操作も
//! 「読む → domain の遷移関数 → CAS 付きで書く」の 1 往復で完結する。
//!
//! # 設計原則
//! - 競合（CAS 失敗）は `StoreError::Conflict` としてそのまま返す（リトライしない）
//! - 時刻は Clock から 1 回だけ読み、その値で遷移を計算する

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::ids::UserId;
use crate::domain::record::{MonthlyHours, StatusPeriod, StatusRecord};
use crate::domain::state::UserState;
use crate::domain::transition::{apply_manual_change, apply_restricted_edit, cancel_ooo};
use crate::domain::validation::{ValidationPolicy, Violation, validate_committed_hours};
use crate::error::StatusError;
use crate::ports::{Clock, Precondition, StatusFilter, StatusStore, Write};

use super::task_linked::TaskLinkedUpdater;

/// Who is making an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any status change.
    Full,
    /// Self-service edit: only the message of the current period.
    EditOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoursRequest {
    pub committed: f64,
}

/// Body of a manual update: at least one of the two fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    #[serde(default)]
    pub current_status: Option<StatusPeriod>,
    #[serde(default)]
    pub monthly_hours: Option<HoursRequest>,
}

impl UpdateRequest {
    pub fn status(period: StatusPeriod) -> Self {
        Self {
            current_status: Some(period),
            monthly_hours: None,
        }
    }

    pub fn hours(committed: f64) -> Self {
        Self {
            current_status: None,
            monthly_hours: Some(HoursRequest { committed }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    /// 201 when the record was created, 200 otherwise.
    pub status_code: u16,
    pub message: String,
    pub data: StatusRecord,
}

pub struct StatusService {
    store: Arc<dyn StatusStore>,
    tasks: Arc<TaskLinkedUpdater>,
    clock: Arc<dyn Clock>,
    policy: ValidationPolicy,
}

impl StatusService {
    pub fn new(
        store: Arc<dyn StatusStore>,
        tasks: Arc<TaskLinkedUpdater>,
        clock: Arc<dyn Clock>,
        policy: ValidationPolicy,
    ) -> Self {
        Self {
            store,
            tasks,
            clock,
            policy,
        }
    }

    pub async fn get(&self, user_id: &UserId) -> Result<StatusRecord, StatusError> {
        self.store
            .get(user_id)
            .await?
            .map(|versioned| versioned.record)
            .ok_or_else(|| StatusError::status_not_found(user_id))
    }

    /// All records, or only those currently in `state`.
    pub async fn list(&self, state: Option<UserState>) -> Result<Vec<StatusRecord>, StatusError> {
        let filter = state.map_or(StatusFilter::All, StatusFilter::CurrentState);
        let records = self.store.list(filter).await?;
        Ok(records.into_iter().map(|versioned| versioned.record).collect())
    }

    /// Manual status and/or monthly hours update.
    ///
    /// # フロー
    /// 1. 空リクエストを拒否
    /// 2. 既存文書を version 付きで読む
    /// 3. currentStatus があれば Access に応じて遷移を計算
    /// 4. monthlyHours があれば上書き
    /// 5. 読んだ version を前提条件にして書く
    pub async fn update(
        &self,
        user_id: &UserId,
        request: UpdateRequest,
        access: Access,
    ) -> Result<UpdateResponse, StatusError> {
        if request.current_status.is_none() && request.monthly_hours.is_none() {
            return Err(Violation::EmptyUpdate.into());
        }
        if let Some(hours) = &request.monthly_hours {
            validate_committed_hours(hours.committed)?;
        }

        let now = self.clock.now_millis();
        let read = self.store.get(user_id).await?;
        let precondition = Precondition::from_read(read.as_ref());
        let existing = read.map(|versioned| versioned.record);

        let (mut record, created) = match (request.current_status, access) {
            (Some(requested), Access::Full) => {
                let change =
                    apply_manual_change(existing.as_ref(), user_id, requested, now, &self.policy)?;
                (change.record, change.created)
            }
            (Some(requested), Access::EditOnly) => {
                let existing = existing.ok_or_else(|| StatusError::status_not_found(user_id))?;
                let record = apply_restricted_edit(&existing, &requested, now, &self.policy)?;
                (record, false)
            }
            (None, _) => {
                let existing = existing.ok_or_else(|| StatusError::status_not_found(user_id))?;
                (existing, false)
            }
        };

        if let Some(hours) = request.monthly_hours {
            record.monthly_hours = Some(MonthlyHours {
                committed: hours.committed,
                updated_at: now,
            });
        }

        self.store
            .commit(vec![Write::put(record.clone(), precondition)])
            .await?;

        info!(
            user_id = %user_id,
            current = %record.current_state(),
            future = ?record.future_state(),
            created,
            "status updated"
        );

        let (status_code, message) = if created {
            (201, "UserStatus created successfully.")
        } else {
            (200, "userStatus updated successfully.")
        };
        Ok(UpdateResponse {
            status_code,
            message: message.to_string(),
            data: record,
        })
    }

    /// End the current OOO period now and fall back to the task baseline.
    pub async fn cancel_ooo(&self, user_id: &UserId) -> Result<StatusRecord, StatusError> {
        let read = self.store.get(user_id).await?;
        let precondition = Precondition::from_read(read.as_ref());
        let existing = read.map(|versioned| versioned.record);

        // 404 / 403 は baseline の問い合わせより先に判定する
        let baseline = match &existing {
            Some(record) if record.current_state().is_ooo() => {
                self.tasks.baseline_for(user_id).await?
            }
            _ => UserState::Idle,
        };
        let record = cancel_ooo(existing.as_ref(), user_id, baseline, self.clock.now_millis())?;

        self.store
            .commit(vec![Write::put(record.clone(), precondition)])
            .await?;
        info!(user_id = %user_id, baseline = %baseline, "OOO cancelled");
        Ok(record)
    }

    pub async fn delete(&self, user_id: &UserId) -> Result<(), StatusError> {
        let read = self
            .store
            .get(user_id)
            .await?
            .ok_or_else(|| StatusError::status_not_found(user_id))?;

        self.store
            .commit(vec![Write::Delete {
                user_id: user_id.clone(),
                precondition: Precondition::Version(read.version),
            }])
            .await?;
        debug!(user_id = %user_id, "status deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::TaskId;
    use crate::domain::task::{TaskAssignment, TaskStatus};
    use crate::domain::time::days;
    use crate::error::ErrorKind;
    use crate::impls::{InMemoryStatusStore, InMemoryTaskBoard};
    use crate::ports::FixedClock;

    // 2024-01-10T12:00:00Z
    const NOW: i64 = 1_704_888_000_000;

    struct Fixture {
        service: StatusService,
        store: InMemoryStatusStore,
        board: InMemoryTaskBoard,
    }

    fn fixture() -> Fixture {
        crate::observability::init_test_logging();
        let store = InMemoryStatusStore::new();
        let board = InMemoryTaskBoard::new();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::from_millis(NOW));
        let tasks = Arc::new(TaskLinkedUpdater::new(
            Arc::new(store.clone()),
            Arc::new(board.clone()),
            Arc::new(board.clone()),
            clock.clone(),
        ));
        let service = StatusService::new(
            Arc::new(store.clone()),
            tasks,
            clock,
            ValidationPolicy::default(),
        );
        Fixture {
            service,
            store,
            board,
        }
    }

    fn u1() -> UserId {
        UserId::new("u1")
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let f = fixture();
        let err = f.service.get(&u1()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "User status not found for user u1");
    }

    #[tokio::test]
    async fn test_create_then_update() {
        let f = fixture();
        let created = f
            .service
            .update(
                &u1(),
                UpdateRequest::status(StatusPeriod::new(UserState::Idle, NOW)),
                Access::Full,
            )
            .await
            .unwrap();
        assert_eq!(created.status_code, 201);

        let updated = f
            .service
            .update(
                &u1(),
                UpdateRequest::status(StatusPeriod::ooo(NOW, NOW + days(2), "")),
                Access::Full,
            )
            .await
            .unwrap();
        assert_eq!(updated.status_code, 200);
        assert_eq!(updated.data.current_state(), UserState::Ooo);
        assert_eq!(updated.data.future_state(), Some(UserState::Idle));

        assert_eq!(f.service.get(&u1()).await.unwrap(), updated.data);
    }

    #[tokio::test]
    async fn test_validation_failure_writes_nothing() {
        let f = fixture();
        let err = f
            .service
            .update(
                &u1(),
                UpdateRequest::status(StatusPeriod::ooo(NOW, NOW + days(10), " ")),
                Access::Full,
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_request_rejected() {
        let f = fixture();
        let err = f
            .service
            .update(&u1(), UpdateRequest::default(), Access::Full)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StatusError::Validation(Violation::EmptyUpdate)
        ));
    }

    #[tokio::test]
    async fn test_monthly_hours() {
        let f = fixture();
        let err = f
            .service
            .update(&u1(), UpdateRequest::hours(40.0), Access::Full)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        f.service
            .update(
                &u1(),
                UpdateRequest::status(StatusPeriod::new(UserState::Active, NOW)),
                Access::Full,
            )
            .await
            .unwrap();
        let response = f
            .service
            .update(&u1(), UpdateRequest::hours(40.0), Access::EditOnly)
            .await
            .unwrap();

        let hours = response.data.monthly_hours.as_ref().unwrap();
        assert_eq!(hours.committed, 40.0);
        assert_eq!(hours.updated_at, NOW);
        assert_eq!(response.data.current_state(), UserState::Active);
    }

    #[tokio::test]
    async fn test_edit_only_rejects_state_change() {
        let f = fixture();
        f.service
            .update(
                &u1(),
                UpdateRequest::status(StatusPeriod::ooo(NOW, NOW + days(1), "trip")),
                Access::Full,
            )
            .await
            .unwrap();

        let err = f
            .service
            .update(
                &u1(),
                UpdateRequest::status(StatusPeriod::new(UserState::Active, NOW)),
                Access::EditOnly,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StatusError::Validation(Violation::FieldNotEditable { field: "state" })
        ));

        let edited = f
            .service
            .update(
                &u1(),
                UpdateRequest::status(StatusPeriod::ooo(NOW, NOW + days(1), "conference")),
                Access::EditOnly,
            )
            .await
            .unwrap();
        assert_eq!(edited.data.current_status.message, "conference");
    }

    #[tokio::test]
    async fn test_cancel_ooo_uses_task_baseline() {
        let f = fixture();
        f.board
            .upsert_task(TaskAssignment {
                id: TaskId::new("t1"),
                assignee: Some(u1()),
                status: TaskStatus::InProgress,
            })
            .await;
        f.service
            .update(
                &u1(),
                UpdateRequest::status(StatusPeriod::ooo(NOW, NOW + days(2), "")),
                Access::Full,
            )
            .await
            .unwrap();

        let record = f.service.cancel_ooo(&u1()).await.unwrap();
        assert_eq!(record.current_state(), UserState::Active);
        assert_eq!(record.future_status, None);
    }

    #[tokio::test]
    async fn test_cancel_ooo_errors() {
        let f = fixture();
        let err = f.service.cancel_ooo(&u1()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);

        f.service
            .update(
                &u1(),
                UpdateRequest::status(StatusPeriod::new(UserState::Idle, NOW)),
                Access::Full,
            )
            .await
            .unwrap();
        let err = f.service.cancel_ooo(&u1()).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(
            err.to_string(),
            "The OOO Status cannot be canceled because the current status is IDLE."
        );
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let f = fixture();
        for (id, state) in [("u1", UserState::Idle), ("u2", UserState::Active)] {
            f.service
                .update(
                    &UserId::new(id),
                    UpdateRequest::status(StatusPeriod::new(state, NOW)),
                    Access::Full,
                )
                .await
                .unwrap();
        }

        assert_eq!(f.service.list(None).await.unwrap().len(), 2);
        let idle = f.service.list(Some(UserState::Idle)).await.unwrap();
        assert_eq!(idle.len(), 1);
        assert_eq!(idle[0].user_id, u1());

        f.service.delete(&u1()).await.unwrap();
        assert_eq!(f.service.delete(&u1()).await.unwrap_err().status_code(), 404);
        assert_eq!(f.service.list(None).await.unwrap().len(), 1);
    }
}
