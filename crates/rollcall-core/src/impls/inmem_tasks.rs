//! InMemoryTaskBoard - 開発用のタスクボード兼ユーザー台帳
//!
//! [`TaskLookup`] と [`UserDirectory`] の両方を実装する。
//! 本番ではタスク管理・ユーザー管理のサービスがこの役割を持つ。

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::ids::{TaskId, UserId};
use crate::domain::task::{TaskAssignment, TaskStatus};
use crate::ports::{StoreError, TaskLookup, UserDirectory};

/// username と userId の対応
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Default)]
struct Board {
    users: Vec<UserEntry>,
    tasks: Vec<TaskAssignment>,
}

#[derive(Clone, Default)]
pub struct InMemoryTaskBoard {
    board: Arc<Mutex<Board>>,
}

impl InMemoryTaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(users: Vec<UserEntry>, tasks: Vec<TaskAssignment>) -> Self {
        Self {
            board: Arc::new(Mutex::new(Board { users, tasks })),
        }
    }

    /// ユーザーを登録（同じ username は置き換え）
    pub async fn add_user(&self, id: UserId, username: impl Into<String>) {
        let username = username.into();
        let mut board = self.board.lock().await;
        board.users.retain(|user| user.username != username);
        board.users.push(UserEntry { id, username });
    }

    /// タスクの担当者と状態を設定（同じ id は置き換え）
    pub async fn upsert_task(&self, task: TaskAssignment) {
        let mut board = self.board.lock().await;
        match board.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => board.tasks.push(task),
        }
    }

    /// 既存タスクの状態を変更。タスクがなければ false
    pub async fn set_task_status(&self, id: &TaskId, status: TaskStatus) -> bool {
        let mut board = self.board.lock().await;
        match board.tasks.iter_mut().find(|t| &t.id == id) {
            Some(task) => {
                task.status = status;
                true
            }
            None => false,
        }
    }

    pub async fn users(&self) -> Vec<UserEntry> {
        self.board.lock().await.users.clone()
    }

    pub async fn tasks(&self) -> Vec<TaskAssignment> {
        self.board.lock().await.tasks.clone()
    }
}

#[async_trait]
impl TaskLookup for InMemoryTaskBoard {
    async fn open_task_count(&self, assignee: &UserId) -> Result<usize, StoreError> {
        let board = self.board.lock().await;
        Ok(board
            .tasks
            .iter()
            .filter(|task| task.keeps_assignee_active() && task.assignee.as_ref() == Some(assignee))
            .count())
    }
}

#[async_trait]
impl UserDirectory for InMemoryTaskBoard {
    async fn resolve_username(&self, username: &str) -> Result<Option<UserId>, StoreError> {
        let board = self.board.lock().await;
        Ok(board
            .users
            .iter()
            .find(|user| user.username == username)
            .map(|user| user.id.clone()))
    }
}
