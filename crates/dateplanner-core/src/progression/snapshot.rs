//! The persisted progression snapshot.
//!
//! Serialized as one JSON record:
//!
//! ```text
//! {
//!   "userId": "planner-…",
//!   "stages": [ { "selectedIndex": 2, "confirmed": true, "unlockTime": 0 }, … ],
//!   "introCompleted": true,
//!   "currentStep": "stages",
//!   "lastActiveStage": 1,
//!   "pendingUnlock": { "target": 1, "at": 1700000030000 },
//!   "farewellReached": false
//! }
//! ```
//!
//! `pendingUnlock.target` is either a stage index or the string `"farewell"`.

use serde::{Deserialize, Serialize};

/// Screen shown before the intro has been completed.
pub const FIRST_SCREEN: &str = "intro-1";
/// Screen recorded once the stage sequence has started.
pub const STAGES_SCREEN: &str = "stages";

const FAREWELL_MARKER: &str = "farewell";

/// Mutable per-stage progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageProgress {
    /// Currently chosen option, if any.
    pub selected_index: Option<usize>,
    pub confirmed: bool,
    /// Epoch ms at or after which the stage is selectable; `None` while the
    /// unlock has not been scheduled.
    pub unlock_time: Option<u64>,
}

impl StageProgress {
    /// Fresh progress for the stage at `index`; stage 0 starts unlocked.
    pub fn initial(index: usize) -> Self {
        Self {
            selected_index: None,
            confirmed: false,
            unlock_time: if index == 0 { Some(0) } else { None },
        }
    }
}

/// Where a pending countdown leads once it elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTarget", into = "RawTarget")]
pub enum PendingTarget {
    Stage(usize),
    Farewell,
}

impl std::fmt::Display for PendingTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingTarget::Stage(index) => write!(f, "stage {index}"),
            PendingTarget::Farewell => f.write_str(FAREWELL_MARKER),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Stage(usize),
    Named(String),
}

impl TryFrom<RawTarget> for PendingTarget {
    type Error = String;

    fn try_from(raw: RawTarget) -> Result<Self, Self::Error> {
        match raw {
            RawTarget::Stage(index) => Ok(PendingTarget::Stage(index)),
            RawTarget::Named(name) if name == FAREWELL_MARKER => Ok(PendingTarget::Farewell),
            RawTarget::Named(name) => Err(format!("unknown pending unlock target '{name}'")),
        }
    }
}

impl From<PendingTarget> for RawTarget {
    fn from(target: PendingTarget) -> Self {
        match target {
            PendingTarget::Stage(index) => RawTarget::Stage(index),
            PendingTarget::Farewell => RawTarget::Named(FAREWELL_MARKER.to_string()),
        }
    }
}

/// The single in-flight countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUnlock {
    pub target: PendingTarget,
    /// Deadline, epoch ms.
    pub at: u64,
}

/// Everything persisted about one user's progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionSnapshot {
    pub user_id: String,
    pub stages: Vec<StageProgress>,
    #[serde(default)]
    pub intro_completed: bool,
    /// Front-matter screen name; opaque to the core.
    #[serde(default = "default_screen")]
    pub current_step: String,
    #[serde(default)]
    pub last_active_stage: usize,
    #[serde(default)]
    pub pending_unlock: Option<PendingUnlock>,
    #[serde(default)]
    pub farewell_reached: bool,
}

fn default_screen() -> String {
    FIRST_SCREEN.to_string()
}

impl ProgressionSnapshot {
    /// Default snapshot for `stage_count` stages.
    pub fn new(user_id: impl Into<String>, stage_count: usize) -> Self {
        Self {
            user_id: user_id.into(),
            stages: (0..stage_count).map(StageProgress::initial).collect(),
            intro_completed: false,
            current_step: default_screen(),
            last_active_stage: 0,
            pending_unlock: None,
            farewell_reached: false,
        }
    }

    pub fn all_confirmed(&self) -> bool {
        self.stages.iter().all(|s| s.confirmed)
    }

    pub fn next_unconfirmed(&self) -> Option<usize> {
        self.stages.iter().position(|s| !s.confirmed)
    }

    pub fn confirmed_count(&self) -> usize {
        self.stages.iter().filter(|s| s.confirmed).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_unlocks_only_first_stage() {
        let snap = ProgressionSnapshot::new("u", 3);
        assert_eq!(snap.stages[0].unlock_time, Some(0));
        assert_eq!(snap.stages[1].unlock_time, None);
        assert_eq!(snap.stages[2].unlock_time, None);
        assert_eq!(snap.current_step, FIRST_SCREEN);
        assert_eq!(snap.next_unconfirmed(), Some(0));
    }

    #[test]
    fn serializes_camel_case_with_nulls() {
        let snap = ProgressionSnapshot::new("u", 2);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["userId"], "u");
        assert!(json["stages"][1]["selectedIndex"].is_null());
        assert!(json["stages"][1]["unlockTime"].is_null());
        assert_eq!(json["stages"][0]["unlockTime"], 0);
        assert!(json["pendingUnlock"].is_null());
        assert_eq!(json["farewellReached"], false);
    }

    #[test]
    fn pending_target_uses_number_or_farewell_marker() {
        let stage = PendingUnlock {
            target: PendingTarget::Stage(3),
            at: 10,
        };
        let farewell = PendingUnlock {
            target: PendingTarget::Farewell,
            at: 20,
        };
        assert_eq!(
            serde_json::to_string(&stage).unwrap(),
            r#"{"target":3,"at":10}"#
        );
        assert_eq!(
            serde_json::to_string(&farewell).unwrap(),
            r#"{"target":"farewell","at":20}"#
        );

        let parsed: PendingUnlock = serde_json::from_str(r#"{"target":"farewell","at":5}"#).unwrap();
        assert_eq!(parsed.target, PendingTarget::Farewell);
    }

    #[test]
    fn unknown_pending_marker_fails_to_parse() {
        let parsed = serde_json::from_str::<PendingUnlock>(r#"{"target":"party","at":5}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_front_matter_fields_take_defaults() {
        let parsed: ProgressionSnapshot = serde_json::from_str(
            r#"{"userId":"u","stages":[{"selectedIndex":null,"confirmed":false,"unlockTime":0}]}"#,
        )
        .unwrap();
        assert!(!parsed.intro_completed);
        assert_eq!(parsed.current_step, FIRST_SCREEN);
        assert!(parsed.pending_unlock.is_none());
    }
}
