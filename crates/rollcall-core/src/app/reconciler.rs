//! Reconciler - futureStatus の定期反映と baseline の一括同期
//!
//! # フロー（run）
//! 1. futureStatus を持つ文書を列挙
//! 2. 1 回の実行で共通の `now` を使い `advance_time` を計算
//! 3. 結果の currentStatus で集計（OOO / 非 OOO × 変更あり / なし）
//! 4. 変更分を CAS 付きで、バッチ上限ごとに分割して commit
//!
//! commit が 1 つでも失敗したら集計は返さずエラーにする。先に成功した
//! チャンクは書き込まれたままだが、同じ `now` で再実行すれば残りだけが変わる。

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::ids::UserId;
use crate::domain::outcome::{ReconcileSummary, SyncSummary};
use crate::domain::state::UserState;
use crate::domain::transition::{Advance, BaselineChange, BaselineTrigger, advance_time, apply_baseline};
use crate::error::StatusError;
use crate::ports::{Clock, Precondition, StatusFilter, StatusStore, Write};

/// One entry of a baseline sync request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineEntry {
    pub user_id: UserId,
    pub state: UserState,
}

pub struct Reconciler {
    store: Arc<dyn StatusStore>,
    clock: Arc<dyn Clock>,
    batch_write_limit: usize,
}

impl Reconciler {
    pub fn new(store: Arc<dyn StatusStore>, clock: Arc<dyn Clock>, batch_write_limit: usize) -> Self {
        Self {
            store,
            clock,
            batch_write_limit,
        }
    }

    /// Writes per commit: the smaller of the configured and the store limit.
    fn chunk_size(&self) -> usize {
        self.batch_write_limit
            .min(self.store.max_batch_size())
            .max(1)
    }

    /// Promote or expire every due `futureStatus`.
    pub async fn run(&self) -> Result<ReconcileSummary, StatusError> {
        let now = self.clock.now_millis();
        let due = self.store.list(StatusFilter::WithFutureStatus).await?;

        let mut summary = ReconcileSummary {
            users_count: due.len(),
            ..ReconcileSummary::default()
        };
        let mut writes = Vec::new();

        for versioned in due {
            let advance = advance_time(&versioned.record, now);
            let (state, altered) = match &advance {
                Advance::Advanced(record) => (record.current_state(), true),
                Advance::Unchanged => (versioned.record.current_state(), false),
            };

            match (state.is_ooo(), altered) {
                (true, true) => summary.ooo_users_altered += 1,
                (true, false) => summary.ooo_users_unaltered += 1,
                (false, true) => summary.non_ooo_users_altered += 1,
                (false, false) => summary.non_ooo_users_unaltered += 1,
            }

            if let Advance::Advanced(record) = advance {
                writes.push(Write::put(record, Precondition::Version(versioned.version)));
            }
        }

        self.commit_chunked(writes).await?;
        info!(?summary, "reconcile finished");
        Ok(summary)
    }

    /// Apply externally computed ACTIVE/IDLE baselines in bulk.
    ///
    /// Entries that cannot be applied (non-baseline state, unreadable
    /// document) are counted as unprocessed and skipped. When a user appears
    /// more than once the last entry wins and the earlier ones count as
    /// unprocessed.
    pub async fn sync_baselines(
        &self,
        entries: Vec<BaselineEntry>,
    ) -> Result<SyncSummary, StatusError> {
        let now = self.clock.now_millis();
        let mut summary = SyncSummary {
            users_count: entries.len(),
            ..SyncSummary::default()
        };

        let mut seen = HashSet::new();
        let mut entries: Vec<BaselineEntry> = entries
            .into_iter()
            .rev()
            .filter(|entry| seen.insert(entry.user_id.clone()))
            .collect();
        entries.reverse();
        let duplicates = summary.users_count - entries.len();
        if duplicates > 0 {
            warn!(duplicates, "duplicate users in baseline sync, keeping the last entry");
            summary.unprocessed_users += duplicates;
        }

        let mut writes = Vec::new();

        for entry in entries {
            let read = match self.store.get(&entry.user_id).await {
                Ok(read) => read,
                Err(e) => {
                    let err = StatusError::from(e);
                    if !matches!(err, StatusError::InvalidState { .. }) {
                        return Err(err);
                    }
                    warn!(user_id = %entry.user_id, error = %err, "skipping user in baseline sync");
                    summary.unprocessed_users += 1;
                    continue;
                }
            };
            let precondition = Precondition::from_read(read.as_ref());
            let existing = read.map(|versioned| versioned.record);

            let change = match apply_baseline(
                existing.as_ref(),
                &entry.user_id,
                entry.state,
                BaselineTrigger::Sync,
                now,
            ) {
                Ok(change) => change,
                Err(violation) => {
                    warn!(user_id = %entry.user_id, %violation, "skipping user in baseline sync");
                    summary.unprocessed_users += 1;
                    continue;
                }
            };

            match &change {
                BaselineChange::FutureUpdated(_) => summary.future_status_updated += 1,
                BaselineChange::Unchanged { .. } => summary.users_unaltered += 1,
                BaselineChange::Created(_) | BaselineChange::Changed { .. } => {
                    match entry.state {
                        UserState::Active => summary.active_users_altered += 1,
                        _ => summary.idle_users_altered += 1,
                    }
                }
            }

            if let Some(record) = change.record() {
                writes.push(Write::put(record.clone(), precondition));
            }
        }

        self.commit_chunked(writes).await?;
        info!(?summary, "baseline sync finished");
        Ok(summary)
    }

    async fn commit_chunked(&self, mut writes: Vec<Write>) -> Result<(), StatusError> {
        let chunk_size = self.chunk_size();
        if writes.len() > chunk_size {
            warn!(
                writes = writes.len(),
                limit = chunk_size,
                "more documents to update than the permissible limit"
            );
        }

        while !writes.is_empty() {
            let rest = writes.split_off(writes.len().min(chunk_size));
            let chunk = std::mem::replace(&mut writes, rest);
            debug!(size = chunk.len(), "committing batch");
            self.store.commit(chunk).await?;
        }
        Ok(())
    }
}
