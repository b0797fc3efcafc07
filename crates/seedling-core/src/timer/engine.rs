//! Focus session engine.
//!
//! The engine is a tick-driven state machine. It owns no threads and reads
//! no wall clock: the caller delivers one `on_tick()` per tick period and the
//! engine deducts exactly one period each time. `SessionRunner` is the async
//! host that feeds it from a tokio interval.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Completed
//!   ^        |           |
//!   +------ cancel ------+
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = FocusEngine::new(SessionSettings::default());
//! engine.start();
//! // Once per tick period:
//! for event in engine.on_tick() { /* render */ }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::clock::{format_clock, FOCUS_DURATION_MS, TICK_PERIOD_MS};
use super::growth::GrowthMilestones;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Running,
    Completed,
}

/// Fixed parameters of every session an engine runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub duration_ms: u64,
    pub tick_ms: u64,
    pub milestones: GrowthMilestones,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            duration_ms: FOCUS_DURATION_MS,
            tick_ms: TICK_PERIOD_MS,
            milestones: GrowthMilestones::default(),
        }
    }
}

impl SessionSettings {
    /// Whole minutes credited for one completed session.
    pub fn duration_min(&self) -> u32 {
        u32::try_from(self.duration_ms / 60_000).unwrap_or(u32::MAX)
    }
}

/// Read-only view of what the presentation layer shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSignals {
    pub clock_text: String,
    pub stage: u8,
    /// Increments once per genuine stage transition.
    pub growth_pulse: u64,
    pub status: SessionStatus,
}

/// Core focus engine. Exactly one session at a time.
#[derive(Debug, Clone)]
pub struct FocusEngine {
    settings: SessionSettings,
    session_id: Option<Uuid>,
    status: SessionStatus,
    remaining_ms: u64,
    stage: u8,
    clock_text: String,
    growth_pulse: u64,
    sessions_completed: u32,
}

impl FocusEngine {
    /// Create an idle engine showing the full session length.
    pub fn new(settings: SessionSettings) -> Self {
        let remaining_ms = settings.duration_ms;
        Self {
            settings,
            session_id: None,
            status: SessionStatus::Idle,
            remaining_ms,
            stage: 0,
            clock_text: format_clock(remaining_ms),
            growth_pulse: 0,
            sessions_completed: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn stage(&self) -> u8 {
        self.stage
    }

    pub fn clock_text(&self) -> &str {
        &self.clock_text
    }

    pub fn growth_pulse(&self) -> u64 {
        self.growth_pulse
    }

    pub fn sessions_completed(&self) -> u32 {
        self.sessions_completed
    }

    pub fn signals(&self) -> SessionSignals {
        SessionSignals {
            clock_text: self.clock_text.clone(),
            stage: self.stage,
            growth_pulse: self.growth_pulse,
            status: self.status,
        }
    }

    /// 0.0 .. 100.0 progress through the current session.
    pub fn progress_pct(&self) -> f64 {
        let total = self.settings.duration_ms;
        if total == 0 {
            return 0.0;
        }
        (1.0 - self.remaining_ms as f64 / total as f64) * 100.0
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            status: self.status,
            clock_text: self.clock_text.clone(),
            remaining_ms: self.remaining_ms,
            total_ms: self.settings.duration_ms,
            stage: self.stage,
            growth_pulse: self.growth_pulse,
            progress_pct: self.progress_pct(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fresh session. No-op while a session is already running.
    pub fn start(&mut self) -> Option<Event> {
        if self.status == SessionStatus::Running {
            debug!("start ignored: session already running");
            return None;
        }
        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        self.status = SessionStatus::Running;
        self.remaining_ms = self.settings.duration_ms;
        self.stage = 0;
        self.clock_text = format_clock(self.remaining_ms);
        info!(%session_id, duration_ms = self.remaining_ms, "focus session started");
        Some(Event::SessionStarted {
            session_id,
            duration_ms: self.remaining_ms,
            at: Utc::now(),
        })
    }

    /// Advance the running session by one tick period.
    ///
    /// Returns the events produced by this tick: at most one growth event
    /// and at most one completion. Ticks outside `Running` are ignored.
    pub fn on_tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if self.status != SessionStatus::Running {
            debug!(status = ?self.status, "tick ignored: no running session");
            return events;
        }
        let Some(session_id) = self.session_id else {
            return events;
        };

        self.remaining_ms = self.remaining_ms.saturating_sub(self.settings.tick_ms);
        self.clock_text = format_clock(self.remaining_ms);

        let next = self.settings.milestones.resolve(&self.clock_text, self.stage);
        if next > self.stage {
            self.stage = next;
            self.growth_pulse += 1;
            info!(%session_id, stage = next, clock = %self.clock_text, "growth stage reached");
            events.push(Event::GrowthAdvanced {
                session_id,
                stage: next,
                growth_pulse: self.growth_pulse,
                clock_text: self.clock_text.clone(),
                at: Utc::now(),
            });
        }

        if self.remaining_ms == 0 {
            self.complete(session_id, &mut events);
        }
        events
    }

    /// Hard reset to the starting display. There is no resume-from-elapsed.
    ///
    /// Returns `None` when no session was ever started since the last reset.
    pub fn cancel(&mut self) -> Option<Event> {
        let session_id = self.session_id.take();
        let was_active = session_id.is_some() || self.status != SessionStatus::Idle;
        let remaining_ms = self.remaining_ms;
        let stage = self.stage;

        self.status = SessionStatus::Idle;
        self.remaining_ms = self.settings.duration_ms;
        self.stage = 0;
        self.clock_text = format_clock(self.remaining_ms);

        if !was_active {
            debug!("cancel with no session: display reset only");
            return None;
        }
        info!(session_id = ?session_id, remaining_ms, stage, "focus session cancelled");
        Some(Event::SessionCancelled {
            session_id,
            remaining_ms,
            stage,
            at: Utc::now(),
        })
    }

    /// Drop any leftover growth imagery. Never interferes with a running
    /// session, whose stage must stay monotonic.
    pub fn clear_growth(&mut self) {
        if self.status == SessionStatus::Running {
            debug!("clear_growth ignored: session running");
            return;
        }
        self.stage = 0;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self, session_id: Uuid, events: &mut Vec<Event>) {
        self.status = SessionStatus::Completed;
        self.stage = 0;
        self.sessions_completed = self.sessions_completed.saturating_add(1);
        let minutes_added = self.settings.duration_min();
        info!(%session_id, minutes_added, "focus session completed");
        events.push(Event::SessionCompleted {
            session_id,
            minutes_added,
            sessions_total: self.sessions_completed,
            at: Utc::now(),
        });
    }
}

impl Default for FocusEngine {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick_n(engine: &mut FocusEngine, n: usize) -> Vec<Event> {
        (0..n).flat_map(|_| engine.on_tick()).collect()
    }

    fn growth_stages(events: &[Event]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::GrowthAdvanced { stage, .. } => Some(*stage),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn new_engine_is_idle_at_full_duration() {
        let engine = FocusEngine::default();
        assert_eq!(engine.status(), SessionStatus::Idle);
        assert_eq!(engine.remaining_ms(), 300_000);
        assert_eq!(engine.clock_text(), "5:00");
        assert_eq!(engine.stage(), 0);
    }

    #[test]
    fn start_is_idempotent_while_running() {
        let mut engine = FocusEngine::default();
        assert!(engine.start().is_some());
        let id = engine.session_id();
        tick_n(&mut engine, 5);

        assert!(engine.start().is_none());
        assert_eq!(engine.session_id(), id);
        assert_eq!(engine.remaining_ms(), 295_000);
    }

    #[test]
    fn ticks_decrement_and_format() {
        let mut engine = FocusEngine::default();
        engine.start();
        tick_n(&mut engine, 1);
        assert_eq!(engine.clock_text(), "4:59");
        tick_n(&mut engine, 69);
        assert_eq!(engine.clock_text(), "3:50");
        assert_eq!(engine.stage(), 1);
    }

    #[test]
    fn growth_fires_once_per_milestone() {
        let mut engine = FocusEngine::default();
        engine.start();
        let events = tick_n(&mut engine, 270);
        assert_eq!(growth_stages(&events), vec![1, 2, 3]);
        assert_eq!(engine.stage(), 3);
        assert_eq!(engine.growth_pulse(), 3);
        assert_eq!(engine.clock_text(), "0:30");
    }

    #[test]
    fn reordered_milestones_still_reach_every_stage() {
        let settings = SessionSettings {
            milestones: GrowthMilestones::new(["0:30", "3:50", "2:00"], 3).unwrap(),
            ..SessionSettings::default()
        };
        let mut engine = FocusEngine::new(settings);
        engine.start();
        let events = tick_n(&mut engine, 299);
        assert_eq!(growth_stages(&events), vec![1, 2, 3]);
        assert_eq!(engine.stage(), 3);
    }

    #[test]
    fn completion_resets_stage_and_emits_once() {
        let mut engine = FocusEngine::default();
        engine.start();
        let events = tick_n(&mut engine, 300);

        let completions: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, Event::SessionCompleted { .. }))
            .collect();
        assert_eq!(completions.len(), 1);
        match completions[0] {
            Event::SessionCompleted {
                minutes_added,
                sessions_total,
                ..
            } => {
                assert_eq!(*minutes_added, 5);
                assert_eq!(*sessions_total, 1);
            }
            _ => unreachable!(),
        }
        assert_eq!(engine.status(), SessionStatus::Completed);
        assert_eq!(engine.remaining_ms(), 0);
        assert_eq!(engine.stage(), 0);
        assert_eq!(engine.clock_text(), "0:00");

        assert!(tick_n(&mut engine, 10).is_empty());
        assert_eq!(engine.remaining_ms(), 0);
    }

    #[test]
    fn restart_after_completion_counts_sessions() {
        let mut engine = FocusEngine::default();
        engine.start();
        tick_n(&mut engine, 300);
        assert!(engine.start().is_some());
        assert_eq!(engine.remaining_ms(), 300_000);
        let events = tick_n(&mut engine, 300);
        assert!(events.iter().any(|e| matches!(
            e,
            Event::SessionCompleted {
                sessions_total: 2,
                ..
            }
        )));
    }

    #[test]
    fn cancel_is_a_hard_reset() {
        let mut engine = FocusEngine::default();
        engine.start();
        tick_n(&mut engine, 100);
        assert_eq!(engine.stage(), 1);

        let event = engine.cancel();
        assert!(matches!(
            event,
            Some(Event::SessionCancelled {
                remaining_ms: 200_000,
                stage: 1,
                ..
            })
        ));
        assert_eq!(engine.status(), SessionStatus::Idle);
        assert_eq!(engine.remaining_ms(), 300_000);
        assert_eq!(engine.clock_text(), "5:00");
        assert_eq!(engine.stage(), 0);
        assert!(engine.session_id().is_none());
    }

    #[test]
    fn tick_after_cancel_is_ignored() {
        let mut engine = FocusEngine::default();
        engine.start();
        tick_n(&mut engine, 3);
        engine.cancel();
        assert!(engine.on_tick().is_empty());
        assert_eq!(engine.remaining_ms(), 300_000);
    }

    #[test]
    fn cancel_without_session_only_resets_display() {
        let mut engine = FocusEngine::default();
        assert!(engine.cancel().is_none());
        assert_eq!(engine.status(), SessionStatus::Idle);
    }

    #[test]
    fn clear_growth_leaves_running_session_alone() {
        let mut engine = FocusEngine::default();
        engine.start();
        tick_n(&mut engine, 70);
        engine.clear_growth();
        assert_eq!(engine.stage(), 1);
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let engine = FocusEngine::default();
        match engine.snapshot() {
            Event::StateSnapshot {
                status,
                remaining_ms,
                clock_text,
                progress_pct,
                ..
            } => {
                assert_eq!(status, SessionStatus::Idle);
                assert_eq!(remaining_ms, 300_000);
                assert_eq!(clock_text, "5:00");
                assert_eq!(progress_pct, 0.0);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Start,
            Tick,
            Cancel,
            ClearGrowth,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                1 => Just(Op::Start),
                20 => Just(Op::Tick),
                1 => Just(Op::Cancel),
                1 => Just(Op::ClearGrowth),
            ]
        }

        proptest! {
            #[test]
            fn invariants_hold_for_any_call_sequence(ops in prop::collection::vec(op(), 0..600)) {
                let mut engine = FocusEngine::default();
                let total = engine.settings().duration_ms;
                let mut last_stage = 0u8;
                let mut growth_in_session = 0u32;

                for op in ops {
                    let before = engine.status();
                    let before_remaining = engine.remaining_ms();
                    match op {
                        Op::Start => {
                            if engine.start().is_some() {
                                last_stage = 0;
                                growth_in_session = 0;
                            }
                        }
                        Op::Tick => {
                            let events = engine.on_tick();
                            growth_in_session += events
                                .iter()
                                .filter(|e| matches!(e, Event::GrowthAdvanced { .. }))
                                .count() as u32;
                            if before == SessionStatus::Running {
                                prop_assert!(engine.remaining_ms() < before_remaining);
                            } else {
                                prop_assert!(events.is_empty());
                            }
                        }
                        Op::Cancel => {
                            engine.cancel();
                            prop_assert_eq!(engine.stage(), 0);
                            prop_assert_eq!(engine.remaining_ms(), total);
                            last_stage = 0;
                        }
                        Op::ClearGrowth => {
                            engine.clear_growth();
                            if engine.status() != SessionStatus::Running {
                                last_stage = 0;
                            }
                        }
                    }

                    prop_assert!(engine.remaining_ms() <= total);
                    prop_assert!(growth_in_session <= 3);
                    match engine.status() {
                        SessionStatus::Running => {
                            prop_assert!(engine.stage() >= last_stage);
                            last_stage = engine.stage();
                        }
                        SessionStatus::Completed => {
                            prop_assert_eq!(engine.remaining_ms(), 0);
                            prop_assert_eq!(engine.stage(), 0);
                            last_stage = 0;
                        }
                        SessionStatus::Idle => {}
                    }
                }
            }
        }
    }
}
