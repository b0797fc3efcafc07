//! # Seedling Core Library
//!
//! This library provides the core logic for Seedling, a single-user focus
//! timer that grows a plant while you concentrate. A fixed-length countdown
//! passes through growth milestones, completed sessions are added to the
//! day's totals, and leaving the app ends the session.
//!
//! ## Architecture
//!
//! - **Focus Engine**: A tick-driven state machine. The caller (or the async
//!   [`SessionHandle`] runner) delivers one tick per period.
//! - **Growth Milestones**: Pure mapping from clock text to growth stage
//! - **Daily Ledger**: Date-stamped totals over a namespaced key-value store
//! - **Lifecycle Controller**: Cancels the session whenever the app leaves the
//!   foreground and reconciles totals when it returns
//!
//! ## Key Components
//!
//! - [`FocusEngine`]: Core session state machine
//! - [`FocusRuntime`]: Engine runner, clock source and completion recorder
//! - [`DailyLedger`]: Daily statistics persistence
//! - [`LifecycleController`]: Visibility policy
//! - [`Config`]: Application configuration management

pub mod audio;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod onboarding;
pub mod runtime;
pub mod stats;
pub mod storage;
pub mod timer;

pub use audio::{display_track_name, AudioPlayer};
pub use error::{ConfigError, CoreError, StorageError};
pub use events::Event;
pub use lifecycle::{LifecycleController, SessionControl, Visibility};
pub use runtime::FocusRuntime;
pub use stats::{DailyLedger, DailyStats, DailyTotals, DateSource, LocalDates};
pub use storage::{Config, KvStore, MemoryStore, SqliteStore};
pub use timer::{
    FocusEngine, GrowthMilestones, SessionHandle, SessionSettings, SessionSignals, SessionStatus,
};
