use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::ledger::DailyLedger;
use crate::events::Event;
use crate::storage::KvStore;

/// Spawn the completion receiver: every `SessionCompleted` on `events` is
/// credited to the ledger once.
///
/// `last_recorded` is shared between successive recorders so a replacement
/// never credits a session its predecessor already wrote. Write failures are
/// logged and dropped; the engine never waits on this task.
pub fn spawn_recorder<S>(
    mut events: broadcast::Receiver<Event>,
    ledger: DailyLedger<S>,
    last_recorded: Arc<Mutex<Option<Uuid>>>,
) -> JoinHandle<()>
where
    S: KvStore + Send + Sync + 'static,
{
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(Event::SessionCompleted {
                    session_id,
                    minutes_added,
                    ..
                }) => {
                    if !claim(&last_recorded, session_id) {
                        debug!(%session_id, "completion already recorded");
                        continue;
                    }
                    match ledger.record_completion(minutes_added) {
                        Ok(stats) => info!(
                            %session_id,
                            minutes = stats.focus_minutes_total,
                            sessions = stats.focus_sessions_total,
                            "completion recorded"
                        ),
                        Err(err) => warn!(
                            %session_id,
                            error = %err,
                            "failed to record completion; in-memory totals stay authoritative"
                        ),
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "completion recorder lagged behind session events");
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("completion recorder stopped");
    })
}

fn claim(last_recorded: &Mutex<Option<Uuid>>, session_id: Uuid) -> bool {
    // A poisoned guard only loses deduplication, never the write.
    let Ok(mut last) = last_recorded.lock() else {
        return true;
    };
    if *last == Some(session_id) {
        return false;
    }
    *last = Some(session_id);
    true
}
