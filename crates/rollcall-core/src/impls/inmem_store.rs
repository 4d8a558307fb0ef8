//! InMemoryStatusStore - 開発用のステータス文書ストア
//!
//! # 学習ポイント
//! - tokio::sync::Mutex による排他制御
//! - version による CAS（compare-and-swap）
//! - バッチ全体を検証してから反映する atomic commit

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::document::StatusDocument;
use crate::domain::ids::UserId;
use crate::domain::record::StatusRecord;
use crate::ports::{Precondition, StatusFilter, StatusStore, StoreError, Versioned, Write};

/// 1 回の commit に含められる書き込み数の既定値
pub const DEFAULT_BATCH_LIMIT: usize = 500;

#[derive(Debug, Clone)]
struct Entry {
    version: u64,
    document: StatusDocument,
}

impl Entry {
    fn decode(&self, user_id: &UserId) -> Result<Versioned<StatusRecord>, StoreError> {
        let record = self
            .document
            .clone()
            .decode()
            .map_err(|source| StoreError::InvalidState {
                user_id: user_id.clone(),
                source,
            })?;
        Ok(Versioned {
            version: self.version,
            record,
        })
    }
}

#[derive(Debug, Default)]
struct StoreState {
    documents: HashMap<UserId, Entry>,
    /// 削除→再作成でも古い version が通らないよう、store 全体で単調増加
    next_version: u64,
}

impl StoreState {
    fn bump(&mut self) -> u64 {
        self.next_version += 1;
        self.next_version
    }
}

/// InMemoryStatusStore は開発・テスト用の [`StatusStore`]
///
/// # 実装詳細
/// - HashMap<UserId, Entry> で文書を保持（文書は state 文字列のまま）
/// - 読み出し時に decode し、不正な state は [`StoreError::InvalidState`]
/// - commit は前提条件をすべて確認してからまとめて反映
///
/// # 使用例
/// ```ignore
/// let store = InMemoryStatusStore::new();
/// store.commit(vec![Write::put(record, Precondition::Absent)]).await?;
/// let read = store.get(&user_id).await?;
/// ```
#[derive(Clone)]
pub struct InMemoryStatusStore {
    state: Arc<Mutex<StoreState>>,
    batch_limit: usize,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::with_batch_limit(DEFAULT_BATCH_LIMIT)
    }

    pub fn with_batch_limit(batch_limit: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            batch_limit,
        }
    }

    /// 文書をそのまま投入する（snapshot 読み込み・壊れたデータの再現用）
    ///
    /// 同じ userId の文書があれば置き換える。
    pub async fn insert_raw(&self, document: StatusDocument) {
        let mut state = self.state.lock().await;
        let version = state.bump();
        let user_id = UserId::new(document.user_id.clone());
        state.documents.insert(user_id, Entry { version, document });
    }

    /// 保持している全文書（userId 順）
    pub async fn documents(&self) -> Vec<StatusDocument> {
        let state = self.state.lock().await;
        let mut entries: Vec<_> = state.documents.iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries
            .into_iter()
            .map(|(_, entry)| entry.document.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_precondition(
    user_id: &UserId,
    expected: Precondition,
    actual: Option<u64>,
) -> Result<(), StoreError> {
    let ok = match (expected, actual) {
        (Precondition::Any, _) => true,
        (Precondition::Absent, None) => true,
        (Precondition::Version(expected), Some(actual)) => expected == actual,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(StoreError::Conflict {
            user_id: user_id.clone(),
            expected,
        })
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<Versioned<StatusRecord>>, StoreError> {
        let state = self.state.lock().await;
        state
            .documents
            .get(user_id)
            .map(|entry| entry.decode(user_id))
            .transpose()
    }

    async fn list(
        &self,
        filter: StatusFilter,
    ) -> Result<Vec<Versioned<StatusRecord>>, StoreError> {
        let state = self.state.lock().await;
        let mut ids: Vec<&UserId> = state.documents.keys().collect();
        ids.sort();

        let mut out = Vec::new();
        for user_id in ids {
            let versioned = state.documents[user_id].decode(user_id)?;
            if filter.matches(&versioned.record) {
                out.push(versioned);
            }
        }
        Ok(out)
    }

    /// 書き込みをまとめて反映
    ///
    /// # 実装
    /// 1. バッチサイズを確認
    /// 2. 同一バッチ内の先行書き込みも考慮して、前提条件を順に検証
    /// 3. すべて通ったら反映（1 件でも失敗すれば何も変えない）
    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        if writes.len() > self.batch_limit {
            return Err(StoreError::BatchTooLarge {
                size: writes.len(),
                limit: self.batch_limit,
            });
        }

        let mut state = self.state.lock().await;
        let mut staged: HashMap<UserId, Option<StatusDocument>> = HashMap::new();
        let mut staged_versions: HashMap<UserId, Option<u64>> = HashMap::new();

        for write in &writes {
            let user_id = write.user_id();
            let actual = match staged_versions.get(user_id) {
                Some(version) => *version,
                None => state.documents.get(user_id).map(|entry| entry.version),
            };
            check_precondition(user_id, write.precondition(), actual)?;

            match write {
                Write::Put { record, .. } => {
                    // 同一バッチ内の後続書き込み用の仮 version（反映時に振り直す）
                    staged_versions.insert(user_id.clone(), Some(actual.unwrap_or(0) + 1));
                    staged.insert(user_id.clone(), Some(StatusDocument::from(record)));
                }
                Write::Delete { .. } => {
                    staged_versions.insert(user_id.clone(), None);
                    staged.insert(user_id.clone(), None);
                }
            }
        }

        for (user_id, document) in staged {
            match document {
                Some(document) => {
                    let version = state.bump();
                    state.documents.insert(user_id, Entry { version, document });
                }
                None => {
                    state.documents.remove(&user_id);
                }
            }
        }
        Ok(())
    }

    fn max_batch_size(&self) -> usize {
        self.batch_limit
    }
}
