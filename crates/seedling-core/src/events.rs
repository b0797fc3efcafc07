use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::SessionStatus;

/// Every state change of the focus engine produces an Event.
/// The host renders them; the completion recorder consumes `SessionCompleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    /// A milestone was reached. `growth_pulse` increases by one per
    /// transition so observers can tell two transitions apart even when
    /// they render the same stage.
    GrowthAdvanced {
        session_id: Uuid,
        stage: u8,
        growth_pulse: u64,
        clock_text: String,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero. Delivered at most once per session.
    SessionCompleted {
        session_id: Uuid,
        minutes_added: u32,
        /// Sessions completed by this engine since the process started.
        sessions_total: u32,
        at: DateTime<Utc>,
    },
    /// Session was hard-reset to its starting display.
    SessionCancelled {
        session_id: Option<Uuid>,
        /// Time that was still left when the session was cancelled.
        remaining_ms: u64,
        /// Stage that had been reached when the session was cancelled.
        stage: u8,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: SessionStatus,
        clock_text: String,
        remaining_ms: u64,
        total_ms: u64,
        stage: u8,
        growth_pulse: u64,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Session the event belongs to, if any.
    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            Event::SessionStarted { session_id, .. }
            | Event::GrowthAdvanced { session_id, .. }
            | Event::SessionCompleted { session_id, .. } => Some(*session_id),
            Event::SessionCancelled { session_id, .. } => *session_id,
            Event::StateSnapshot { .. } => None,
        }
    }
}
