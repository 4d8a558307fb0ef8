//! Domain model (ids, states, records, validation, transitions, outcomes).
//!
//! 依存は serde / chrono / thiserror のみ。store や時計には触れない。

pub mod document;
pub mod ids;
pub mod outcome;
pub mod record;
pub mod state;
pub mod task;
pub mod time;
pub mod transition;
pub mod validation;

pub use document::{InvalidStoredState, StatusDocument};
pub use ids::{TaskId, UserId};
pub use outcome::{OutcomeData, ReconcileSummary, SyncSummary, TaskLinkedOutcome};
pub use record::{MonthlyHours, StatusPeriod, StatusRecord};
pub use state::{UnknownState, UserState};
pub use task::{TaskAssignment, TaskStatus};
pub use time::Timestamp;
pub use transition::{
    Advance, BaselineChange, BaselineTrigger, ManualChange, advance_time, apply_baseline,
    apply_manual_change, apply_restricted_edit, cancel_ooo,
};
pub use validation::{ValidationPolicy, Violation};
