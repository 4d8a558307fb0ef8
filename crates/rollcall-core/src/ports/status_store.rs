//! StatusStore port - ステータス文書の正本（source of truth）
//!
//! 1 ユーザー 1 文書。書き込みは必ず version 付きの前提条件（CAS）で行い、
//! 読み込みから書き込みまでの間に他の writer が割り込んだ場合は
//! [`StoreError::Conflict`] を返す。
//!
//! # 実装
//! - `impls::inmem_store::InMemoryStatusStore`（開発・テスト用、JSON snapshot 対応）

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::document::InvalidStoredState;
use crate::domain::ids::UserId;
use crate::domain::record::StatusRecord;
use crate::domain::state::UserState;

/// 書き込み時の前提条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// 文書がまだ存在しないこと（新規作成）
    Absent,
    /// 読み込んだ時点の version のままであること
    Version(u64),
    /// 無条件
    Any,
}

impl Precondition {
    /// 読み込み結果から CAS 条件を作る
    pub fn from_read(read: Option<&Versioned<StatusRecord>>) -> Self {
        match read {
            Some(versioned) => Precondition::Version(versioned.version),
            None => Precondition::Absent,
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::Absent => f.write_str("absent"),
            Precondition::Version(version) => write!(f, "version {version}"),
            Precondition::Any => f.write_str("any"),
        }
    }
}

/// version 付きの読み込み結果
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub record: T,
}

/// 1 件の書き込み
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Put {
        record: StatusRecord,
        precondition: Precondition,
    },
    Delete {
        user_id: UserId,
        precondition: Precondition,
    },
}

impl Write {
    pub fn put(record: StatusRecord, precondition: Precondition) -> Self {
        Write::Put {
            record,
            precondition,
        }
    }

    pub fn user_id(&self) -> &UserId {
        match self {
            Write::Put { record, .. } => &record.user_id,
            Write::Delete { user_id, .. } => user_id,
        }
    }

    pub fn precondition(&self) -> Precondition {
        match self {
            Write::Put { precondition, .. } | Write::Delete { precondition, .. } => *precondition,
        }
    }
}

/// list() の絞り込み条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    /// futureStatus を持つ文書のみ（reconciler 用）
    WithFutureStatus,
    /// currentStatus.state が一致する文書のみ
    CurrentState(UserState),
}

impl StatusFilter {
    pub fn matches(&self, record: &StatusRecord) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::WithFutureStatus => record.future_status.is_some(),
            StatusFilter::CurrentState(state) => record.current_state() == *state,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("write conflict for {user_id}: expected {expected}")]
    Conflict {
        user_id: UserId,
        expected: Precondition,
    },

    #[error("batch of {size} writes exceeds the limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    #[error("stored status for {user_id} is invalid: {source}")]
    InvalidState {
        user_id: UserId,
        #[source]
        source: InvalidStoredState,
    },

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// StatusStore はステータス文書の読み書きを抽象化
///
/// # 設計原則
/// - 文書の decode（state 文字列 → [`UserState`]）は store の責務
/// - `commit` はバッチ全体で atomic（1 件でも前提条件を満たさなければ何も書かない）
/// - バッチ上限は `max_batch_size` で公開し、呼び出し側が分割する
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn get(&self, user_id: &UserId) -> Result<Option<Versioned<StatusRecord>>, StoreError>;

    async fn list(&self, filter: StatusFilter)
    -> Result<Vec<Versioned<StatusRecord>>, StoreError>;

    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError>;

    fn max_batch_size(&self) -> usize;
}
