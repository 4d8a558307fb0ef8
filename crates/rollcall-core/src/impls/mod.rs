//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryStatusStore**: CAS 付きのステータス文書ストア
//! - **InMemoryTaskBoard**: TaskLookup / UserDirectory
//! - **Snapshot**: 上記 2 つを JSON ファイルに保存・復元

pub mod inmem_store;
pub mod inmem_tasks;
pub mod snapshot;

// 主要な型を再エクスポート
pub use self::inmem_store::{DEFAULT_BATCH_LIMIT, InMemoryStatusStore};
pub use self::inmem_tasks::{InMemoryTaskBoard, UserEntry};
pub use self::snapshot::Snapshot;
