pub mod config;
pub mod intro;
pub mod stage;
pub mod status;
pub mod watch;

use std::sync::Arc;

use dateplanner_core::error::Result;
use dateplanner_core::{
    Config, Database, PersistedStateStore, ProgressionEngine, ResolvedView, SystemClock,
};
use tracing::debug;

pub type CommandResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Open the engine the way a page load does: configuration, store and
/// clock, then reconcile against the stored snapshot.
pub fn load_engine() -> Result<(ProgressionEngine, ResolvedView)> {
    let config = Config::load()?;
    let registry = config.registry()?;
    let db = Database::open()?;
    let store = PersistedStateStore::new(db, &registry).with_keys(config.storage_keys());
    let mut engine = ProgressionEngine::new(
        registry,
        store,
        Arc::new(SystemClock),
        config.engine_settings(),
    );
    let view = engine.reconcile_on_load();
    debug!(
        confirmed = engine.confirmed_count(),
        countdown = view.countdown.is_some(),
        "engine loaded"
    );
    Ok((engine, view))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
