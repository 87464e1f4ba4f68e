//! Stage states and the pure parts of reconciliation.
//!
//! ## State Transitions
//!
//! ```text
//! Locked -> Unlocked -> Selected -> Confirmed
//!              ^           |            |
//!              +-- retry --+---- retry -+
//! ```
//!
//! Retrying a stage also locks every later stage again.

use serde::{Deserialize, Serialize};

use super::snapshot::{PendingTarget, PendingUnlock, ProgressionSnapshot, StageProgress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageState {
    Locked,
    Unlocked,
    Selected,
    Confirmed,
}

impl std::fmt::Display for StageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StageState::Locked => "locked",
            StageState::Unlocked => "unlocked",
            StageState::Selected => "selected",
            StageState::Confirmed => "confirmed",
        })
    }
}

/// Mutating operations on a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Select,
    Confirm,
    Retry,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operation::Select => "select",
            Operation::Confirm => "confirm",
            Operation::Retry => "retry",
        })
    }
}

/// What the presentation layer needs to draw one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageView {
    pub index: usize,
    pub id: String,
    pub state: StageState,
    /// Only reported while the stage is selected or confirmed.
    pub selected_index: Option<usize>,
    pub option_count: usize,
}

/// The single running countdown, for remaining-time display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownStatus {
    pub target: PendingTarget,
    pub unlock_at_ms: u64,
    pub remaining_ms: u64,
}

/// Output of reconciliation: every stage plus the running countdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedView {
    pub stages: Vec<StageView>,
    pub countdown: Option<CountdownStatus>,
    pub intro_completed: bool,
    pub current_step: String,
    pub finished: bool,
}

/// Unlock rule: stage 0 always, any other stage once its unlock time has
/// passed.
pub fn is_unlocked(index: usize, progress: &StageProgress, now_ms: u64) -> bool {
    index == 0 || progress.unlock_time.is_some_and(|t| now_ms >= t)
}

/// Walk stages from the first: confirmed stages pass through, and the walk
/// stops at the first stage that is not confirmed. That stage is open if
/// its unlock time has passed; it and everything after it is otherwise
/// locked.
pub fn resolve_stages(snapshot: &ProgressionSnapshot, now_ms: u64) -> Vec<StageState> {
    let mut states = vec![StageState::Locked; snapshot.stages.len()];
    for (index, progress) in snapshot.stages.iter().enumerate() {
        if progress.confirmed {
            states[index] = StageState::Confirmed;
            continue;
        }
        if is_unlocked(index, progress, now_ms) {
            states[index] = if progress.selected_index.is_some() {
                StageState::Selected
            } else {
                StageState::Unlocked
            };
        }
        break;
    }
    states
}

/// What reconciliation must do with the stored pending unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingResolution {
    /// Nothing is pending.
    None,
    /// The record points at a confirmed or nonexistent stage, or at the
    /// farewell while some stage is still unconfirmed.
    Stale(PendingUnlock),
    /// The deadline has passed: apply the transition now.
    Due(PendingUnlock),
    /// The deadline is ahead: count down to it.
    Resume(PendingUnlock),
}

pub fn resolve_pending(snapshot: &ProgressionSnapshot, now_ms: u64) -> PendingResolution {
    let Some(pending) = snapshot.pending_unlock else {
        return PendingResolution::None;
    };

    let stale = match pending.target {
        PendingTarget::Farewell => !snapshot.all_confirmed(),
        PendingTarget::Stage(index) => snapshot.stages.get(index).map_or(true, |s| s.confirmed),
    };

    if stale {
        PendingResolution::Stale(pending)
    } else if now_ms >= pending.at {
        PendingResolution::Due(pending)
    } else {
        PendingResolution::Resume(pending)
    }
}
