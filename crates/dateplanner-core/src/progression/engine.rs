//! Progression engine.
//!
//! Owns the snapshot and is the only thing that mutates it. Every mutation
//! is persisted before the operation returns. Like the countdown it drives,
//! the engine has no internal thread: the host calls [`ProgressionEngine::tick`]
//! once per tick period.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = ProgressionEngine::new(registry, store, clock, settings);
//! let view = engine.reconcile_on_load();
//! engine.select(0)?;
//! engine.confirm(0)?;
//! // In a loop, every tick period:
//! engine.tick(); // Returns Some(Event) when the pending unlock fires
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::itinerary::Itinerary;
use super::snapshot::{
    PendingTarget, PendingUnlock, ProgressionSnapshot, StageProgress, STAGES_SCREEN,
};
use super::state::{
    is_unlocked, resolve_pending, resolve_stages, CountdownStatus, Operation, PendingResolution,
    ResolvedView, StageState, StageView,
};
use crate::clock::{to_datetime, Clock};
use crate::countdown::{CountdownScheduler, CountdownTick};
use crate::error::ProgressionError;
use crate::events::Event;
use crate::stage::{PcgRandomizer, Randomizer, StageRegistry};
use crate::storage::PersistedStateStore;

type EventListener = Box<dyn FnMut(&Event) + Send>;
type TickListener = Box<dyn FnMut(&CountdownStatus) + Send>;

/// Timing shared by every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Delay between a confirm and the next unlock.
    pub delay: Duration,
    /// How often the host should call `tick()`.
    pub tick_period: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(30),
            tick_period: Duration::from_secs(1),
        }
    }
}

impl EngineSettings {
    fn delay_ms(&self) -> u64 {
        u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Linear, time-gated stage progression.
pub struct ProgressionEngine {
    registry: StageRegistry,
    store: PersistedStateStore,
    clock: Arc<dyn Clock>,
    randomizer: Box<dyn Randomizer>,
    settings: EngineSettings,
    snapshot: ProgressionSnapshot,
    countdown: CountdownScheduler<PendingUnlock>,
    listeners: Vec<EventListener>,
    tick_listeners: Vec<TickListener>,
}

impl ProgressionEngine {
    /// Create an engine over the stored snapshot.
    ///
    /// The store is bound to `registry` and the snapshot is loaded (or reset)
    /// immediately; no countdown runs until
    /// [`reconcile_on_load`](Self::reconcile_on_load) is called.
    pub fn new(
        registry: StageRegistry,
        mut store: PersistedStateStore,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Self {
        store.bind_registry(&registry);
        let snapshot = store.load();
        let countdown = CountdownScheduler::new(Arc::clone(&clock), settings.tick_period);
        Self {
            registry,
            store,
            clock,
            randomizer: Box::new(PcgRandomizer::from_entropy()),
            settings,
            snapshot,
            countdown,
            listeners: Vec::new(),
            tick_listeners: Vec::new(),
        }
    }

    pub fn with_randomizer(mut self, randomizer: impl Randomizer + 'static) -> Self {
        self.randomizer = Box::new(randomizer);
        self
    }

    /// Register a listener for every state change.
    pub fn subscribe(&mut self, listener: impl FnMut(&Event) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Register a listener for remaining-time updates of the running countdown.
    pub fn on_countdown_tick(&mut self, listener: impl FnMut(&CountdownStatus) + Send + 'static) {
        self.tick_listeners.push(Box::new(listener));
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> &ProgressionSnapshot {
        &self.snapshot
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    pub fn tick_period(&self) -> Duration {
        self.settings.tick_period
    }

    pub fn stage_count(&self) -> usize {
        self.registry.len()
    }

    /// Whether the stage at `index` is unlocked: stage 0 always, any other
    /// stage once its unlock time has passed.
    pub fn is_unlocked(&self, index: usize) -> bool {
        self.snapshot
            .stages
            .get(index)
            .is_some_and(|progress| is_unlocked(index, progress, self.clock.now_ms()))
    }

    pub fn stage_state(&self, index: usize) -> Option<StageState> {
        resolve_stages(&self.snapshot, self.clock.now_ms())
            .get(index)
            .copied()
    }

    pub fn stage_view(&self, index: usize) -> Option<StageView> {
        let state = self.stage_state(index)?;
        Some(self.build_view(index, state))
    }

    /// Every stage plus the running countdown, as of now.
    pub fn resolved_view(&self) -> ResolvedView {
        let states = resolve_stages(&self.snapshot, self.clock.now_ms());
        ResolvedView {
            stages: states
                .into_iter()
                .enumerate()
                .map(|(index, state)| self.build_view(index, state))
                .collect(),
            countdown: self.countdown_status(),
            intro_completed: self.snapshot.intro_completed,
            current_step: self.snapshot.current_step.clone(),
            finished: self.is_finished(),
        }
    }

    pub fn countdown_status(&self) -> Option<CountdownStatus> {
        let pending = self.countdown.pending()?;
        Some(CountdownStatus {
            target: pending.target,
            unlock_at_ms: pending.at,
            remaining_ms: self.countdown.remaining_ms().unwrap_or(0),
        })
    }

    pub fn countdown_active(&self) -> bool {
        self.countdown.is_active()
    }

    /// True once the farewell has been reached with every stage confirmed.
    pub fn is_finished(&self) -> bool {
        self.snapshot.farewell_reached && self.snapshot.all_confirmed()
    }

    pub fn all_confirmed(&self) -> bool {
        self.snapshot.all_confirmed()
    }

    pub fn next_unconfirmed_stage(&self) -> Option<usize> {
        self.snapshot.next_unconfirmed()
    }

    pub fn confirmed_count(&self) -> usize {
        self.snapshot.confirmed_count()
    }

    pub fn itinerary(&self) -> Itinerary {
        Itinerary::from_progress(&self.registry, &self.snapshot)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Derive the current view from the stored snapshot and the clock, and
    /// resume, apply or discard the stored pending unlock.
    ///
    /// Running it again without a mutation or clock change in between yields
    /// the same view and leaves the single countdown untouched.
    pub fn reconcile_on_load(&mut self) -> ResolvedView {
        let now = self.clock.now_ms();
        match resolve_pending(&self.snapshot, now) {
            PendingResolution::None => {}
            PendingResolution::Stale(pending) => {
                debug!(unlock_target = %pending.target, "discarding stale pending unlock");
                self.snapshot.pending_unlock = None;
                if self.countdown.pending() == Some(&pending) {
                    self.countdown.stop();
                }
                self.persist();
                self.emit(Event::StaleUnlockDiscarded {
                    target: pending.target,
                    at: to_datetime(now),
                });
            }
            PendingResolution::Due(pending) => {
                if self.countdown.pending() == Some(&pending) {
                    self.countdown.stop();
                }
                self.complete_pending(pending);
            }
            PendingResolution::Resume(pending) => {
                if self.countdown.pending() != Some(&pending) {
                    self.start_countdown(pending);
                }
            }
        }
        self.resolved_view()
    }

    /// Roll a random option for an unlocked, unconfirmed stage.
    ///
    /// # Errors
    ///
    /// Rejected without any change if the stage is locked or confirmed.
    pub fn select(&mut self, index: usize) -> Result<StageView, ProgressionError> {
        self.require(index, Operation::Select, &[StageState::Unlocked, StageState::Selected])?;

        let option_count = self.registry.option_count(index).unwrap_or(1);
        let selected_index = self.randomizer.pick(option_count);
        self.snapshot.stages[index].selected_index = Some(selected_index);
        self.persist();

        debug!(stage = index, selected_index, "stage selected");
        self.emit(Event::StageSelected {
            stage_index: index,
            selected_index,
            at: self.clock.now(),
        });
        Ok(self.build_view(index, StageState::Selected))
    }

    /// Lock in the current selection and schedule the next unlock (or the
    /// farewell, after the last stage).
    ///
    /// # Errors
    ///
    /// Rejected without any change unless the stage is selected.
    pub fn confirm(&mut self, index: usize) -> Result<StageView, ProgressionError> {
        self.require(index, Operation::Confirm, &[StageState::Selected])?;

        let now = self.clock.now_ms();
        let at = now.saturating_add(self.settings.delay_ms());
        let stage = &mut self.snapshot.stages[index];
        stage.confirmed = true;
        let selected_index = stage.selected_index.unwrap_or(0);

        let target = if index == self.registry.last_index() {
            PendingTarget::Farewell
        } else {
            self.snapshot.stages[index + 1].unlock_time = Some(at);
            self.snapshot.last_active_stage = index + 1;
            PendingTarget::Stage(index + 1)
        };
        let pending = PendingUnlock { target, at };
        self.snapshot.pending_unlock = Some(pending);
        self.persist();

        info!(stage = index, unlock_target = %target, at, "stage confirmed");
        self.emit(Event::StageConfirmed {
            stage_index: index,
            selected_index,
            at: to_datetime(now),
        });
        self.start_countdown(pending);
        Ok(self.build_view(index, StageState::Confirmed))
    }

    /// Reopen a selected or confirmed stage and lock every later stage.
    ///
    /// # Errors
    ///
    /// Rejected without any change unless the stage is selected or confirmed.
    pub fn retry(&mut self, index: usize) -> Result<StageView, ProgressionError> {
        self.require(
            index,
            Operation::Retry,
            &[StageState::Selected, StageState::Confirmed],
        )?;

        let now = self.clock.now_ms();
        let stage = &mut self.snapshot.stages[index];
        stage.selected_index = None;
        stage.confirmed = false;
        if index == 0 {
            stage.unlock_time = Some(0);
        }

        let mut relocked = Vec::new();
        for (later, progress) in self.snapshot.stages.iter_mut().enumerate().skip(index + 1) {
            let locked = StageProgress {
                selected_index: None,
                confirmed: false,
                unlock_time: None,
            };
            if *progress != locked {
                relocked.push(later);
                *progress = locked;
            }
        }

        let invalidated = match self.snapshot.pending_unlock {
            Some(pending) => match pending.target {
                PendingTarget::Farewell => Some(pending),
                PendingTarget::Stage(target) if target >= index => Some(pending),
                PendingTarget::Stage(_) => None,
            },
            None => None,
        };
        if let Some(pending) = invalidated {
            self.snapshot.pending_unlock = None;
            // Same operation: no tick may fire for the invalidated target.
            self.countdown.stop();
            self.emit(Event::StaleUnlockDiscarded {
                target: pending.target,
                at: to_datetime(now),
            });
        }
        self.snapshot.farewell_reached = false;
        self.persist();

        info!(stage = index, ?relocked, "stage retried");
        self.emit(Event::StageRetried {
            stage_index: index,
            relocked,
            at: to_datetime(now),
        });

        let state = self.stage_state(index).unwrap_or(StageState::Unlocked);
        Ok(self.build_view(index, state))
    }

    /// Advance the running countdown. Returns the unlock or farewell event
    /// when its deadline has passed.
    pub fn tick(&mut self) -> Option<Event> {
        match self.countdown.tick() {
            CountdownTick::Idle => None,
            CountdownTick::Running {
                remaining_ms,
                target_ms,
            } => {
                let target = self.countdown.pending()?.target;
                let status = CountdownStatus {
                    target,
                    unlock_at_ms: target_ms,
                    remaining_ms,
                };
                for listener in &mut self.tick_listeners {
                    listener(&status);
                }
                debug!(unlock_target = %target, remaining_ms, "countdown tick");
                self.emit(Event::CountdownTick {
                    target,
                    remaining_ms,
                    at: self.clock.now(),
                });
                None
            }
            CountdownTick::Completed(pending) => self.complete_pending(pending),
        }
    }

    /// Leave the front-matter screens and enter the stage sequence.
    pub fn complete_intro(&mut self) {
        self.snapshot.intro_completed = true;
        self.snapshot.current_step = STAGES_SCREEN.to_string();
        self.persist();
    }

    /// Record which front-matter screen is showing.
    pub fn set_screen(&mut self, screen: impl Into<String>) {
        self.snapshot.current_step = screen.into();
        self.persist();
    }

    /// Discard all progress. The user identity is kept.
    pub fn restart(&mut self) -> ResolvedView {
        self.countdown.stop();
        self.store.clear();
        self.snapshot = self.store.default_snapshot();
        self.persist();

        info!("progress restarted");
        self.emit(Event::ProgressRestarted {
            at: self.clock.now(),
        });
        self.resolved_view()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn require(
        &self,
        index: usize,
        operation: Operation,
        allowed: &[StageState],
    ) -> Result<StageState, ProgressionError> {
        let state = self
            .stage_state(index)
            .ok_or(ProgressionError::StageOutOfRange {
                index,
                len: self.registry.len(),
            })?;
        if allowed.contains(&state) {
            Ok(state)
        } else {
            debug!(stage = index, %operation, %state, "operation rejected");
            Err(ProgressionError::InvalidTransition {
                index,
                operation,
                state,
            })
        }
    }

    fn build_view(&self, index: usize, state: StageState) -> StageView {
        let selected_index = match state {
            StageState::Selected | StageState::Confirmed => self
                .snapshot
                .stages
                .get(index)
                .and_then(|s| s.selected_index),
            StageState::Locked | StageState::Unlocked => None,
        };
        StageView {
            index,
            id: self
                .registry
                .get(index)
                .map(|s| s.id.clone())
                .unwrap_or_default(),
            state,
            selected_index,
            option_count: self.registry.option_count(index).unwrap_or(0),
        }
    }

    fn start_countdown(&mut self, pending: PendingUnlock) {
        self.countdown.start(pending.at, pending);
        self.emit(Event::CountdownStarted {
            target: pending.target,
            unlock_at: to_datetime(pending.at),
            at: self.clock.now(),
        });
    }

    /// Apply an elapsed pending unlock and clear the record.
    fn complete_pending(&mut self, pending: PendingUnlock) -> Option<Event> {
        if self.snapshot.pending_unlock != Some(pending) {
            debug!(unlock_target = %pending.target, "countdown fired for a superseded unlock");
            return None;
        }
        self.snapshot.pending_unlock = None;
        let at = self.clock.now();

        let event = match pending.target {
            PendingTarget::Stage(index) => {
                let Some(stage) = self.snapshot.stages.get_mut(index) else {
                    self.persist();
                    return None;
                };
                if stage.unlock_time.map_or(true, |t| t > pending.at) {
                    stage.unlock_time = Some(pending.at);
                }
                info!(stage = index, "stage unlocked");
                Event::StageUnlocked {
                    stage_index: index,
                    at,
                }
            }
            PendingTarget::Farewell => {
                self.snapshot.farewell_reached = true;
                info!("farewell reached");
                Event::FarewellReached { at }
            }
        };
        self.persist();
        self.emit(event.clone());
        Some(event)
    }

    fn persist(&self) {
        self.store.save(&self.snapshot);
    }

    fn emit(&mut self, event: Event) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}
