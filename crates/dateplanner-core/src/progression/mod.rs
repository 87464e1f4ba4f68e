mod driver;
mod engine;
mod itinerary;
mod snapshot;
mod state;

pub use driver::run_countdown;
pub use engine::{EngineSettings, ProgressionEngine};
pub use itinerary::{Itinerary, ItineraryEntry};
pub use snapshot::{
    PendingTarget, PendingUnlock, ProgressionSnapshot, StageProgress, FIRST_SCREEN,
    STAGES_SCREEN,
};
pub use state::{
    is_unlocked, resolve_pending, resolve_stages, CountdownStatus, Operation,
    PendingResolution, ResolvedView, StageState, StageView,
};
