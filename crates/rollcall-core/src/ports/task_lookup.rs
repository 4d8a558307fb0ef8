//! TaskLookup port - タスクボードへの問い合わせ
//!
//! 担当タスクの数から ACTIVE / IDLE の baseline を決める。

use async_trait::async_trait;

use crate::domain::ids::UserId;

use super::status_store::StoreError;

/// TaskLookup は担当者ごとの未完了タスク数を返す
///
/// # 設計原則
/// - 「未完了」は [`crate::domain::task::TaskStatus::is_terminal`] でないもの
/// - 0 件なら IDLE、1 件以上なら ACTIVE
#[async_trait]
pub trait TaskLookup: Send + Sync {
    async fn open_task_count(&self, assignee: &UserId) -> Result<usize, StoreError>;
}
