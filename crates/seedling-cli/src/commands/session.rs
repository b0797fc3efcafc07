use std::io::Write;
use std::sync::Arc;

use seedling_core::onboarding::{take_first_open, RULES_TEXT};
use seedling_core::{
    AudioPlayer, Config, Event, FocusRuntime, LifecycleController, LocalDates, SessionSettings,
    SqliteStore, Visibility,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::audio::TerminalAudio;

enum Outcome {
    Completed,
    Interrupted,
    Ended,
}

pub fn run(track: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let settings = config.session_settings()?;
    let store = SqliteStore::open(&config.storage.namespace)?;

    if take_first_open(&store) {
        println!("{RULES_TEXT}\n");
    }

    let track = track.unwrap_or(config.audio.default_track);
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_session(settings, store, track))
}

async fn run_session(
    settings: SessionSettings,
    store: SqliteStore,
    track: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = FocusRuntime::spawn(settings, store, Arc::new(LocalDates));
    let handle = runtime.handle().clone();
    let mut events = handle.subscribe();
    let mut signals = handle.signals();
    let ledger = runtime.ledger();

    let mut lifecycle = LifecycleController::new(runtime, TerminalAudio::default(), ledger);
    lifecycle.transition(Visibility::Resumed);
    let before = lifecycle.totals();
    println!(
        "today so far: {} min, {} sessions",
        before.minutes, before.sessions
    );

    lifecycle.audio_mut().start(&track);
    handle.start();
    show_clock(&signals.borrow_and_update().clock_text)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res?;
                println!();
                lifecycle.transition(Visibility::Stopped);
                break Outcome::Interrupted;
            }
            changed = signals.changed() => {
                if changed.is_err() {
                    break Outcome::Ended;
                }
                let clock_text = signals.borrow_and_update().clock_text.clone();
                show_clock(&clock_text)?;
            }
            event = events.recv() => match event {
                Ok(Event::GrowthAdvanced { stage, clock_text, .. }) => {
                    println!("\nthe seedling grew (stage {stage}) at {clock_text}");
                }
                Ok(Event::SessionCompleted { minutes_added, .. }) => {
                    println!();
                    lifecycle.on_session_completed(minutes_added);
                    break Outcome::Completed;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "session output fell behind");
                }
                Err(RecvError::Closed) => break Outcome::Ended,
            },
        }
    };

    let totals = lifecycle.totals();
    let (runtime, mut audio, ledger) = lifecycle.into_parts();
    audio.stop();
    drop(handle);
    runtime.shutdown().await;

    match outcome {
        Outcome::Completed => {
            let today = ledger.reconcile_on_resume(totals);
            info!(minutes = today.minutes, sessions = today.sessions, "session completed");
            println!(
                "session complete. today: {} min, {} sessions",
                today.minutes, today.sessions
            );
        }
        Outcome::Interrupted => println!("session cancelled"),
        Outcome::Ended => warn!("session runner stopped before the session finished"),
    }
    Ok(())
}

fn show_clock(clock_text: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "\r{clock_text:>5}")?;
    stdout.flush()
}
