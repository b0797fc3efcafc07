mod clock;
mod engine;
mod growth;
mod runner;

pub use clock::{format_clock, parse_clock, FOCUS_DURATION_MIN, FOCUS_DURATION_MS, TICK_PERIOD_MS};
pub use engine::{FocusEngine, SessionSettings, SessionSignals, SessionStatus};
pub use growth::{GrowthMilestones, DEFAULT_MILESTONES, MAX_STAGE};
pub use runner::{spawn_ticker, ClockTick, SessionHandle};
