//! EngineBuilder - ports と設定のワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）

use std::sync::Arc;

use crate::config::{ConfigError, EngineConfig};
use crate::ports::{Clock, StatusStore, SystemClock, TaskLookup, UserDirectory};

use super::reconciler::Reconciler;
use super::service::StatusService;
use super::task_linked::TaskLinkedUpdater;

/// EngineBuilder は StatusEngine を構築
///
/// # 使用例
/// ```ignore
/// let engine = EngineBuilder::new()
///     .store(Arc::new(store))
///     .task_lookup(Arc::new(board.clone()))
///     .user_directory(Arc::new(board))
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - store / task_lookup / user_directory は必須
/// - clock を省略すると SystemClock
/// - build() 時に不足している port と設定の妥当性をまとめてチェック
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn StatusStore>>,
    task_lookup: Option<Arc<dyn TaskLookup>>,
    user_directory: Option<Arc<dyn UserDirectory>>,
    clock: Option<Arc<dyn Clock>>,
    config: EngineConfig,
}

/// BuildError はエンジン構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing ports: {0:?}. These ports must be provided before build().")]
    MissingPorts(Vec<&'static str>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn StatusStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn task_lookup(mut self, task_lookup: Arc<dyn TaskLookup>) -> Self {
        self.task_lookup = Some(task_lookup);
        self
    }

    pub fn user_directory(mut self, user_directory: Arc<dyn UserDirectory>) -> Self {
        self.user_directory = Some(user_directory);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// # 検証
    /// - 必須 port が全て設定されているか
    /// - EngineConfig::validate()
    pub fn build(self) -> Result<StatusEngine, BuildError> {
        let mut missing = Vec::new();
        if self.store.is_none() {
            missing.push("store");
        }
        if self.task_lookup.is_none() {
            missing.push("task_lookup");
        }
        if self.user_directory.is_none() {
            missing.push("user_directory");
        }

        let (Some(store), Some(task_lookup), Some(user_directory)) =
            (self.store, self.task_lookup, self.user_directory)
        else {
            return Err(BuildError::MissingPorts(missing));
        };
        self.config.validate()?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let task_linked = Arc::new(TaskLinkedUpdater::new(
            store.clone(),
            task_lookup,
            user_directory,
            clock.clone(),
        ));
        let service = StatusService::new(
            store.clone(),
            task_linked.clone(),
            clock.clone(),
            self.config.validation_policy(),
        );
        let reconciler = Reconciler::new(store, clock, self.config.batch_write_limit);

        Ok(StatusEngine {
            service,
            task_linked,
            reconciler,
            config: self.config,
        })
    }
}

/// StatusEngine は組み立て済みの 3 コンポーネント
pub struct StatusEngine {
    pub service: StatusService,
    pub task_linked: Arc<TaskLinkedUpdater>,
    pub reconciler: Reconciler,
    pub config: EngineConfig,
}
