//! App - アプリケーション層
//!
//! このモジュールは、ports と domain の遷移関数を組み合わせて
//! アプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **EngineBuilder**: ports と設定のワイヤリング
//! - **StatusService**: get / list / update / cancel OOO / delete
//! - **TaskLinkedUpdater**: タスクの割り当て・完了からの ACTIVE / IDLE
//! - **Reconciler**: futureStatus の定期反映、baseline の一括同期

pub mod builder;
pub mod reconciler;
pub mod service;
pub mod task_linked;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, EngineBuilder, StatusEngine};
pub use self::reconciler::{BaselineEntry, Reconciler};
pub use self::service::{Access, HoursRequest, StatusService, UpdateRequest, UpdateResponse};
pub use self::task_linked::TaskLinkedUpdater;
