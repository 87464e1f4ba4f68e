//! Async driver for the engine's countdown.

use tokio::time::{interval, MissedTickBehavior};

use super::engine::ProgressionEngine;
use crate::events::Event;

/// Tick `engine` once per tick period until its countdown completes or is
/// no longer active.
///
/// The first tick happens immediately, so a deadline that is already in
/// the past completes without waiting. Returns the completion event, or
/// `None` if there was nothing to count down.
pub async fn run_countdown(engine: &mut ProgressionEngine) -> Option<Event> {
    let mut ticker = interval(engine.tick_period());
    // A suspended host resumes with one tick, not a burst of catch-up ticks.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while engine.countdown_active() {
        ticker.tick().await;
        if let Some(event) = engine.tick() {
            return Some(event);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::progression::{EngineSettings, StageState};
    use crate::stage::{PcgRandomizer, StageRegistry};
    use crate::storage::{MemoryStore, PersistedStateStore};

    fn engine(clock: &ManualClock, delay: Duration) -> ProgressionEngine {
        let registry = StageRegistry::date_plan();
        let store = PersistedStateStore::new(MemoryStore::new(), &registry);
        ProgressionEngine::new(
            registry,
            store,
            Arc::new(clock.clone()),
            EngineSettings {
                delay,
                tick_period: Duration::from_millis(5),
            },
        )
        .with_randomizer(PcgRandomizer::with_seed(3))
    }

    #[tokio::test]
    async fn idle_engine_returns_immediately() {
        let clock = ManualClock::new(0);
        let mut engine = engine(&clock, Duration::from_secs(30));
        assert!(run_countdown(&mut engine).await.is_none());
    }

    #[tokio::test]
    async fn elapsed_deadline_completes_on_first_tick() {
        let clock = ManualClock::new(0);
        let mut engine = engine(&clock, Duration::from_secs(30));
        engine.select(0).unwrap();
        engine.confirm(0).unwrap();
        clock.advance_ms(60_000);

        let event = run_countdown(&mut engine).await;
        assert!(matches!(event, Some(Event::StageUnlocked { stage_index: 1, .. })));
        assert_eq!(engine.stage_state(1), Some(StageState::Unlocked));
    }

    #[tokio::test]
    async fn zero_delay_reaches_farewell() {
        let clock = ManualClock::new(0);
        let mut engine = engine(&clock, Duration::ZERO);
        for stage in 0..engine.stage_count() {
            engine.select(stage).unwrap();
            engine.confirm(stage).unwrap();
            run_countdown(&mut engine).await;
        }
        assert!(engine.is_finished());
        assert!(engine.snapshot().farewell_reached);
        assert!(engine.snapshot().pending_unlock.is_none());
    }
}
