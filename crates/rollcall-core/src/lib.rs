//! rollcall-core
//!
//! Core building blocks for the rollcall user status engine.
//!
//! # モジュール構成
//! - **domain**: ドメインモデルと純粋な遷移関数（ids, state, record, validation, transition, outcome）
//! - **ports**: 抽象化レイヤー（StatusStore, TaskLookup, UserDirectory, Clock）
//! - **impls**: 実装（InMemoryStatusStore, InMemoryTaskBoard, Snapshot）
//! - **app**: アプリケーションロジック（builder, service, task_linked, reconciler）
//! - **config**: EngineConfig
//! - **error**: StatusError と ErrorKind
//! - **observability**: tracing-subscriber の初期化

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::{EngineBuilder, StatusEngine};
pub use config::EngineConfig;
pub use error::{ErrorKind, StatusError};
