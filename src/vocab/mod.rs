//! Spaced repetition vocabulary engine
//!
//! This module provides:
//! - Word and progress models
//! - SM-2 interval and ease factor updates
//! - The scheduler that picks the next word to practice
//! - The progress store contract with SQLite and in-memory backends
//! - CSV import, quiz helpers and session reports

pub mod algorithm;
pub mod import;
pub mod memory;
pub mod models;
pub mod quiz;
pub mod scheduler;
pub mod session;
pub mod sqlite;
pub mod store;

pub use memory::MemoryProgressStore;
pub use models::*;
pub use scheduler::{Clock, FixedClock, Scheduler, SchedulerError, SelectionPolicy, SessionBias, SystemClock};
pub use sqlite::SqliteProgressStore;
pub use store::{ProgressStore, StoreError};
