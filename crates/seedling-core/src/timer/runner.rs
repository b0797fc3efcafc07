//! Async host for the focus engine.
//!
//! One runner task owns the [`FocusEngine`]. Commands from any number of
//! [`SessionHandle`] clones and ticks from the clock task are both funnelled
//! into that task's single `select!` loop, so `start`, `on_tick` and `cancel`
//! never interleave. Commands are polled first: a cancel and a pending tick
//! that are both ready resolve to the cancelled state.
//!
//! The clock task delivers ticks through a single-slot channel. Every tick
//! carries the id of the session it was started for, and ticks for any other
//! session are dropped.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};
use uuid::Uuid;

use super::engine::{FocusEngine, SessionSignals, SessionStatus};
use crate::events::Event;

const EVENT_CAPACITY: usize = 64;

/// One clock pulse addressed to a specific session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub session_id: Uuid,
}

#[derive(Debug)]
enum Command {
    Start,
    Cancel,
    ClearGrowth,
    Shutdown,
}

/// Clock source: emits one tick per `period` until aborted or the slot
/// is closed. The first tick fires one full period after spawning.
pub fn spawn_ticker(
    session_id: Uuid,
    period: Duration,
    slot: mpsc::Sender<ClockTick>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if slot.send(ClockTick { session_id }).await.is_err() {
                break;
            }
        }
    })
}

/// Cloneable front door to a running [`SessionRunner`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<Event>,
    signals: watch::Receiver<SessionSignals>,
}

impl SessionHandle {
    /// Spawn a runner for `engine` on the current tokio runtime.
    pub fn spawn(engine: FocusEngine) -> (Self, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::channel(1);
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (signal_tx, signal_rx) = watch::channel(engine.signals());

        let runner = SessionRunner {
            engine,
            commands: command_rx,
            tick_tx,
            tick_rx,
            ticker: None,
            events: event_tx.clone(),
            signals: signal_tx,
        };
        let join = tokio::spawn(runner.run());

        let handle = Self {
            commands: command_tx,
            events: event_tx,
            signals: signal_rx,
        };
        (handle, join)
    }

    /// Request a new session. Ignored by the engine if one is running.
    pub fn start(&self) -> bool {
        self.send(Command::Start)
    }

    pub fn cancel(&self) -> bool {
        self.send(Command::Cancel)
    }

    pub fn clear_growth(&self) -> bool {
        self.send(Command::ClearGrowth)
    }

    /// Stop the runner. Pending commands queued before this one still apply.
    pub fn shutdown(&self) -> bool {
        self.send(Command::Shutdown)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn signals(&self) -> watch::Receiver<SessionSignals> {
        self.signals.clone()
    }

    /// Latest published signals.
    pub fn current(&self) -> SessionSignals {
        self.signals.borrow().clone()
    }

    fn send(&self, command: Command) -> bool {
        match self.commands.send(command) {
            Ok(()) => true,
            Err(err) => {
                debug!(command = ?err.0, "session runner gone; command dropped");
                false
            }
        }
    }
}

/// Single-owner task driving the engine.
struct SessionRunner {
    engine: FocusEngine,
    commands: mpsc::UnboundedReceiver<Command>,
    tick_tx: mpsc::Sender<ClockTick>,
    tick_rx: mpsc::Receiver<ClockTick>,
    ticker: Option<JoinHandle<()>>,
    events: broadcast::Sender<Event>,
    signals: watch::Sender<SessionSignals>,
}

impl SessionRunner {
    async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                Some(tick) = self.tick_rx.recv() => self.on_clock_tick(tick),
            }
        }
        self.stop_ticker();
        debug!("session runner stopped");
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Start => {
                if let Some(event) = self.engine.start() {
                    self.stop_ticker();
                    if let Some(session_id) = self.engine.session_id() {
                        let period = Duration::from_millis(self.engine.settings().tick_ms);
                        self.ticker = Some(spawn_ticker(session_id, period, self.tick_tx.clone()));
                    }
                    self.publish(event);
                }
            }
            Command::Cancel => {
                self.stop_ticker();
                if let Some(event) = self.engine.cancel() {
                    self.publish(event);
                }
            }
            Command::ClearGrowth => self.engine.clear_growth(),
            Command::Shutdown => {}
        }
        self.signals.send_replace(self.engine.signals());
    }

    fn on_clock_tick(&mut self, tick: ClockTick) {
        if self.engine.session_id() != Some(tick.session_id) {
            trace!(session_id = %tick.session_id, "stale tick dropped");
            return;
        }
        let events = self.engine.on_tick();
        if self.engine.status() != SessionStatus::Running {
            self.stop_ticker();
        }
        self.signals.send_replace(self.engine.signals());
        for event in events {
            self.publish(event);
        }
    }

    fn publish(&self, event: Event) {
        // No subscribers is fine; the engine does not wait for anyone.
        let _ = self.events.send(event);
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::SessionSettings;

    fn spawn_default() -> (SessionHandle, JoinHandle<()>) {
        SessionHandle::spawn(FocusEngine::new(SessionSettings::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn full_session_runs_to_completion() {
        let (handle, _join) = spawn_default();
        let mut events = handle.subscribe();
        assert!(handle.start());

        let mut stages = Vec::new();
        let completed = loop {
            match events.recv().await.unwrap() {
                Event::GrowthAdvanced { stage, .. } => stages.push(stage),
                Event::SessionCompleted { minutes_added, .. } => break minutes_added,
                _ => {}
            }
        };

        assert_eq!(stages, vec![1, 2, 3]);
        assert_eq!(completed, 5);
        let mut signals = handle.signals();
        let final_signals = signals
            .wait_for(|s| s.status == SessionStatus::Completed)
            .await
            .unwrap()
            .clone();
        assert_eq!(final_signals.stage, 0);
        assert_eq!(final_signals.clock_text, "0:00");
        assert_eq!(final_signals.growth_pulse, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_wins_and_stops_the_clock() {
        let (handle, _join) = spawn_default();
        let mut signals = handle.signals();
        handle.start();

        signals
            .wait_for(|s| s.clock_text == "3:20")
            .await
            .unwrap();
        handle.cancel();

        let after = signals
            .wait_for(|s| s.status == SessionStatus::Idle)
            .await
            .unwrap()
            .clone();
        assert_eq!(after.clock_text, "5:00");
        assert_eq!(after.stage, 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.current().clock_text, "5:00");
        assert_eq!(handle.current().status, SessionStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_keeps_one_session() {
        let (handle, _join) = spawn_default();
        let mut events = handle.subscribe();
        handle.start();
        handle.start();

        let first = events.recv().await.unwrap();
        assert!(matches!(first, Event::SessionStarted { .. }));

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(handle.current().clock_text, "4:50");
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_cancel_ignores_old_clock() {
        let (handle, _join) = spawn_default();
        let mut signals = handle.signals();
        handle.start();
        signals.wait_for(|s| s.clock_text == "4:55").await.unwrap();
        handle.cancel();
        handle.start();

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(handle.current().clock_text, "4:57");
        assert_eq!(handle.current().status, SessionStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_closes_the_runner() {
        let (handle, join) = spawn_default();
        handle.shutdown();
        join.await.unwrap();
        assert!(!handle.start());
    }
}
