//! Ports - 抽象化レイヤー
//!
//! エンジン本体（domain の遷移関数）は純粋で、外部とのやりとりはすべて
//! ここの trait を経由する。
//!
//! # 設計原則
//! - StatusStore が source of truth（正本）。書き込みは CAS
//! - TaskLookup / UserDirectory は読み取り専用の外部協力者
//! - 時刻は Clock からのみ取得する

pub mod clock;
pub mod status_store;
pub mod task_lookup;
pub mod user_directory;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::status_store::{
    Precondition, StatusFilter, StatusStore, StoreError, Versioned, Write,
};
pub use self::task_lookup::TaskLookup;
pub use self::user_directory::UserDirectory;
