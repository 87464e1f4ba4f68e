// Per-installation user identity.
// Format: "planner-<uuid>"

use tracing::warn;
use uuid::Uuid;

use super::kv::KeyValueStore;

pub const USER_ID_PREFIX: &str = "planner-";

/// Generate a fresh identity token.
pub fn generate_user_id() -> String {
    format!("{}{}", USER_ID_PREFIX, Uuid::new_v4())
}

/// Get or create the user identity stored under `key`.
///
/// A freshly generated identity is written immediately so it outlives any
/// later snapshot reset. If that write fails the identity is still returned
/// and used for this session; the next session will generate a new one.
pub fn get_or_create_user_id(store: &dyn KeyValueStore, key: &str) -> String {
    match store.get(key) {
        Ok(Some(existing)) => {
            let trimmed = existing.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "failed to read user id, generating a new one"),
    }

    let user_id = generate_user_id();
    if let Err(e) = store.set(key, &user_id) {
        warn!(error = %e, "failed to persist user id");
    }
    user_id
}
