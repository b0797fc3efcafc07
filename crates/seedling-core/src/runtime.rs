//! Async wiring of the engine, its clock and the completion recorder.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::lifecycle::SessionControl;
use crate::stats::{spawn_recorder, DailyLedger, DateSource};
use crate::storage::KvStore;
use crate::timer::{FocusEngine, SessionHandle, SessionSettings};

/// A spawned session runner plus the completion recorder attached to it.
///
/// Must be created inside a tokio runtime.
pub struct FocusRuntime<S> {
    handle: SessionHandle,
    runner: JoinHandle<()>,
    store: S,
    dates: Arc<dyn DateSource>,
    recorder: Option<JoinHandle<()>>,
    last_recorded: Arc<Mutex<Option<Uuid>>>,
}

impl<S> FocusRuntime<S>
where
    S: KvStore + Clone + Send + Sync + 'static,
{
    /// Spawn the runner. The recorder is attached on the first
    /// [`register_receivers`](SessionControl::register_receivers).
    pub fn spawn(settings: SessionSettings, store: S, dates: Arc<dyn DateSource>) -> Self {
        let (handle, runner) = SessionHandle::spawn(FocusEngine::new(settings));
        Self {
            handle,
            runner,
            store,
            dates,
            recorder: None,
            last_recorded: Arc::default(),
        }
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// A ledger over the same store and calendar as the recorder.
    pub fn ledger(&self) -> DailyLedger<S> {
        DailyLedger::new(self.store.clone(), Arc::clone(&self.dates))
    }

    /// Stop the runner and let the recorder drain whatever completions were
    /// already published.
    ///
    /// The recorder only finishes once every [`SessionHandle`] clone has been
    /// dropped, so drop any clones before awaiting this.
    pub async fn shutdown(self) {
        let Self {
            handle,
            runner,
            recorder,
            ..
        } = self;
        handle.shutdown();
        drop(handle);
        if let Err(err) = runner.await {
            warn!(error = %err, "session runner ended abnormally");
        }
        if let Some(recorder) = recorder {
            if let Err(err) = recorder.await {
                warn!(error = %err, "completion recorder ended abnormally");
            }
        }
    }
}

impl<S> SessionControl for FocusRuntime<S>
where
    S: KvStore + Clone + Send + Sync + 'static,
{
    fn cancel(&mut self) {
        self.handle.cancel();
    }

    fn clear_growth(&mut self) {
        self.handle.clear_growth();
    }

    fn register_receivers(&mut self) {
        if let Some(previous) = self.recorder.take() {
            debug!("replacing completion recorder");
            previous.abort();
        }
        self.recorder = Some(spawn_recorder(
            self.handle.subscribe(),
            self.ledger(),
            Arc::clone(&self.last_recorded),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use crate::stats::DailyTotals;
    use crate::storage::MemoryStore;
    use crate::timer::SessionStatus;
    use chrono::NaiveDate;

    fn today() -> Arc<dyn DateSource> {
        Arc::new(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn completed_session_reaches_the_ledger() {
        let store = MemoryStore::new();
        let mut runtime = FocusRuntime::spawn(SessionSettings::default(), store.clone(), today());
        runtime.register_receivers();
        let ledger = runtime.ledger();
        let mut events = runtime.handle().subscribe();

        runtime.handle().start();
        loop {
            if let Event::SessionCompleted { .. } = events.recv().await.unwrap() {
                break;
            }
        }
        runtime.shutdown().await;

        assert_eq!(ledger.current_display_stats(), DailyTotals::new(5, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn re_registering_does_not_double_count() {
        let store = MemoryStore::new();
        let mut runtime = FocusRuntime::spawn(SessionSettings::default(), store.clone(), today());
        runtime.register_receivers();
        runtime.register_receivers();
        runtime.register_receivers();
        let ledger = runtime.ledger();
        let mut events = runtime.handle().subscribe();

        runtime.handle().start();
        loop {
            if let Event::SessionCompleted { .. } = events.recv().await.unwrap() {
                break;
            }
        }
        runtime.shutdown().await;

        assert_eq!(ledger.current_display_stats(), DailyTotals::new(5, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_through_control_seam() {
        let store = MemoryStore::new();
        let mut runtime = FocusRuntime::spawn(SessionSettings::default(), store, today());
        let mut signals = runtime.handle().signals();
        runtime.handle().start();
        signals.wait_for(|s| s.clock_text == "4:00").await.unwrap();

        SessionControl::cancel(&mut runtime);
        let after = signals
            .wait_for(|s| s.status == SessionStatus::Idle)
            .await
            .unwrap()
            .clone();
        assert_eq!(after.clock_text, "5:00");
        runtime.shutdown().await;
    }
}
