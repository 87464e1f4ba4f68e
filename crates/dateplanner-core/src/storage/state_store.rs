//! Load/save of the progression snapshot.
//!
//! Loading never fails: anything missing, unparsable or structurally
//! inconsistent with the current session is replaced by a default snapshot.
//! Saving never fails either: write errors are logged and the in-memory
//! snapshot stays authoritative for the rest of the session.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::identity::get_or_create_user_id;
use super::kv::KeyValueStore;
use crate::progression::ProgressionSnapshot;
use crate::stage::StageRegistry;

pub const DEFAULT_STATE_KEY: &str = "dateplanner_state_v2";
pub const DEFAULT_USER_ID_KEY: &str = "dateplanner_user_id";

const REQUIRED_STAGE_FIELDS: [&str; 3] = ["selectedIndex", "confirmed", "unlockTime"];

/// Keys under which the snapshot and the identity are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub state: String,
    pub user_id: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            state: DEFAULT_STATE_KEY.to_string(),
            user_id: DEFAULT_USER_ID_KEY.to_string(),
        }
    }
}

/// Why a stored snapshot was discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotRejection {
    #[error("stored user id '{stored}' does not match session user id '{expected}'")]
    UserMismatch { stored: String, expected: String },

    #[error("stored stage count {found} does not match registry stage count {expected}")]
    StageCountMismatch { expected: usize, found: usize },

    #[error("stage {stage} is missing field '{field}'")]
    MissingField { stage: usize, field: &'static str },

    #[error("malformed snapshot: {0}")]
    Malformed(String),
}

/// Persisted-state store for one stage registry.
pub struct PersistedStateStore {
    kv: Box<dyn KeyValueStore>,
    keys: StorageKeys,
    option_counts: Vec<usize>,
}

impl PersistedStateStore {
    pub fn new(kv: impl KeyValueStore + 'static, registry: &StageRegistry) -> Self {
        Self {
            kv: Box::new(kv),
            keys: StorageKeys::default(),
            option_counts: registry.iter().map(|s| s.option_count()).collect(),
        }
    }

    pub fn with_keys(mut self, keys: StorageKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Validate against `registry` from now on.
    pub fn bind_registry(&mut self, registry: &StageRegistry) {
        self.option_counts = registry.iter().map(|s| s.option_count()).collect();
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn stage_count(&self) -> usize {
        self.option_counts.len()
    }

    /// The session's user identity, created and persisted on first use.
    pub fn user_id(&self) -> String {
        get_or_create_user_id(self.kv.as_ref(), &self.keys.user_id)
    }

    /// A default snapshot for the current identity.
    pub fn default_snapshot(&self) -> ProgressionSnapshot {
        ProgressionSnapshot::new(self.user_id(), self.stage_count())
    }

    /// Load the stored snapshot, or a default one if nothing usable is stored.
    ///
    /// A rejected snapshot is replaced in storage by the default, so the
    /// reset is durable.
    pub fn load(&self) -> ProgressionSnapshot {
        let user_id = self.user_id();
        let raw = match self.kv.get(&self.keys.state) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no stored progression, starting fresh");
                return ProgressionSnapshot::new(user_id, self.stage_count());
            }
            Err(e) => {
                warn!(error = %e, "failed to read stored progression, starting fresh");
                return ProgressionSnapshot::new(user_id, self.stage_count());
            }
        };

        match self.decode(&raw, &user_id) {
            Ok(snapshot) => snapshot,
            Err(reason) => {
                warn!(%reason, "discarding stored progression");
                let fresh = ProgressionSnapshot::new(user_id, self.stage_count());
                self.save(&fresh);
                fresh
            }
        }
    }

    /// Persist `snapshot`. Returns `false` if the write failed; the failure is
    /// logged and otherwise ignored.
    pub fn save(&self, snapshot: &ProgressionSnapshot) -> bool {
        let json = match serde_json::to_string(snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize progression");
                return false;
            }
        };
        match self.kv.set(&self.keys.state, &json) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to persist progression");
                false
            }
        }
    }

    /// Remove the stored snapshot. The user identity is kept.
    pub fn clear(&self) {
        if let Err(e) = self.kv.remove(&self.keys.state) {
            warn!(error = %e, "failed to clear stored progression");
        }
    }

    /// The raw stored blob, if any.
    pub fn raw(&self) -> Option<String> {
        self.kv.get(&self.keys.state).ok().flatten()
    }

    /// Validate and decode a stored blob against the session identity.
    ///
    /// # Errors
    ///
    /// Returns the first reason the blob cannot be used.
    pub fn decode(&self, raw: &str, user_id: &str) -> Result<ProgressionSnapshot, SnapshotRejection> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| SnapshotRejection::Malformed(e.to_string()))?;

        let stored_user = value.get("userId").and_then(Value::as_str).unwrap_or_default();
        if stored_user != user_id {
            return Err(SnapshotRejection::UserMismatch {
                stored: stored_user.to_string(),
                expected: user_id.to_string(),
            });
        }

        let stages = value
            .get("stages")
            .and_then(Value::as_array)
            .ok_or_else(|| SnapshotRejection::Malformed("'stages' is not a list".into()))?;
        if stages.len() != self.stage_count() {
            return Err(SnapshotRejection::StageCountMismatch {
                expected: self.stage_count(),
                found: stages.len(),
            });
        }

        for (stage, entry) in stages.iter().enumerate() {
            let fields = entry.as_object().ok_or_else(|| {
                SnapshotRejection::Malformed(format!("stage {stage} is not an object"))
            })?;
            if let Some(field) = REQUIRED_STAGE_FIELDS
                .iter()
                .find(|field| !fields.contains_key(**field))
            {
                return Err(SnapshotRejection::MissingField {
                    stage,
                    field: *field,
                });
            }
        }

        let snapshot: ProgressionSnapshot =
            serde_json::from_value(value).map_err(|e| SnapshotRejection::Malformed(e.to_string()))?;

        for (stage, (progress, &options)) in snapshot
            .stages
            .iter()
            .zip(self.option_counts.iter())
            .enumerate()
        {
            match progress.selected_index {
                Some(index) if index >= options => {
                    return Err(SnapshotRejection::Malformed(format!(
                        "stage {stage} selects option {index} of {options}"
                    )));
                }
                None if progress.confirmed => {
                    return Err(SnapshotRejection::Malformed(format!(
                        "stage {stage} is confirmed without a selection"
                    )));
                }
                _ => {}
            }
        }

        Ok(snapshot)
    }
}
