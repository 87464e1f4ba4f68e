use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progression::PendingTarget;

/// Every state change in the progression produces an Event.
/// The presentation layer subscribes to them; the CLI prints them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    StageSelected {
        stage_index: usize,
        selected_index: usize,
        at: DateTime<Utc>,
    },
    StageConfirmed {
        stage_index: usize,
        selected_index: usize,
        at: DateTime<Utc>,
    },
    /// A stage was reopened; every later stage was locked again.
    StageRetried {
        stage_index: usize,
        relocked: Vec<usize>,
        at: DateTime<Utc>,
    },
    StageUnlocked {
        stage_index: usize,
        at: DateTime<Utc>,
    },
    CountdownStarted {
        target: PendingTarget,
        unlock_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    CountdownTick {
        target: PendingTarget,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// A pending unlock was dropped because it pointed at a confirmed or
    /// nonexistent stage, or was invalidated by a retry.
    StaleUnlockDiscarded {
        target: PendingTarget,
        at: DateTime<Utc>,
    },
    FarewellReached {
        at: DateTime<Utc>,
    },
    ProgressRestarted {
        at: DateTime<Utc>,
    },
}
