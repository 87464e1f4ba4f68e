//! # Dateplanner Core Library
//!
//! Core logic for the date planner: a fixed sequence of themed stages
//! (coffee, walk, food, movie, gift) where the user rolls a random option,
//! confirms it, and waits out a cooldown before the next stage unlocks.
//! The CLI and any graphical front end are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Progression Engine**: A wall-clock-based state machine over the
//!   stages; the caller periodically invokes `tick()` to advance countdowns
//! - **Storage**: Key-value persistence (SQLite or in-memory) of one JSON
//!   snapshot per user identity, plus TOML-based configuration
//! - **Countdown**: Deadline tracking recomputed from the clock on every tick
//!
//! ## Key Components
//!
//! - [`ProgressionEngine`]: Stage state machine and startup reconciliation
//! - [`PersistedStateStore`]: Snapshot load/save with validation
//! - [`StageRegistry`]: Validated, ordered stage definitions
//! - [`CountdownScheduler`]: Single-deadline countdown
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod countdown;
pub mod error;
pub mod events;
pub mod progression;
pub mod stage;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use countdown::{format_remaining, CountdownScheduler, CountdownTick};
pub use error::{ConfigError, CoreError, ProgressionError, StorageError};
pub use events::Event;
pub use progression::{
    run_countdown, CountdownStatus, EngineSettings, Itinerary, PendingTarget, PendingUnlock,
    ProgressionEngine, ProgressionSnapshot, ResolvedView, StageProgress, StageState, StageView,
};
pub use stage::{PcgRandomizer, Randomizer, StageDefinition, StageOption, StageRegistry};
pub use storage::{Config, Database, KeyValueStore, MemoryStore, PersistedStateStore, StorageKeys};
