//! Application visibility policy.
//!
//! A session only runs while the app is in front of the user. Any move into
//! `Paused` or `Stopped` cancels the session outright and silences audio;
//! coming back to `Resumed` re-attaches receivers, reconciles the daily
//! totals and clears leftover growth imagery.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::audio::AudioPlayer;
use crate::stats::{DailyLedger, DailyTotals};
use crate::storage::KvStore;
use crate::timer::FocusEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Resumed,
    Paused,
    Stopped,
}

/// What the controller needs from whoever hosts the focus engine.
pub trait SessionControl {
    /// Hard-reset the session.
    fn cancel(&mut self);

    /// Return the growth display to "no growth".
    fn clear_growth(&mut self);

    /// Attach broadcast-style receivers (the completion recorder). Calling
    /// this again must replace, not duplicate, earlier registrations.
    fn register_receivers(&mut self) {}
}

impl SessionControl for FocusEngine {
    fn cancel(&mut self) {
        FocusEngine::cancel(self);
    }

    fn clear_growth(&mut self) {
        FocusEngine::clear_growth(self);
    }
}

pub struct LifecycleController<C, A, S> {
    state: Visibility,
    session: C,
    audio: A,
    ledger: DailyLedger<S>,
    totals: DailyTotals,
}

impl<C, A, S> LifecycleController<C, A, S>
where
    C: SessionControl,
    A: AudioPlayer,
    S: KvStore,
{
    /// Controller in the initial `Resumed` state with zeroed running totals.
    ///
    /// No entry actions run here; hosts deliver their first `Resumed`
    /// through [`transition`](Self::transition) like any other.
    pub fn new(session: C, audio: A, ledger: DailyLedger<S>) -> Self {
        Self {
            state: Visibility::Resumed,
            session,
            audio,
            ledger,
            totals: DailyTotals::default(),
        }
    }

    pub fn state(&self) -> Visibility {
        self.state
    }

    /// In-memory running totals for today.
    pub fn totals(&self) -> DailyTotals {
        self.totals
    }

    pub fn session(&self) -> &C {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut C {
        &mut self.session
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn ledger(&self) -> &DailyLedger<S> {
        &self.ledger
    }

    /// Apply a visibility signal from the host. Entry actions run on every
    /// delivery, so repeated signals are harmless.
    pub fn transition(&mut self, next: Visibility) {
        debug!(from = ?self.state, to = ?next, "visibility transition");
        self.state = next;
        match next {
            Visibility::Resumed => self.resume(),
            Visibility::Paused | Visibility::Stopped => self.suspend(),
        }
    }

    /// Fold a locally observed completion into the running totals.
    /// Persisting it is the recorder's job.
    pub fn on_session_completed(&mut self, minutes_added: u32) {
        self.totals.minutes = self.totals.minutes.saturating_add(minutes_added);
        self.totals.sessions = self.totals.sessions.saturating_add(1);
    }

    pub fn into_parts(self) -> (C, A, DailyLedger<S>) {
        (self.session, self.audio, self.ledger)
    }

    fn suspend(&mut self) {
        info!(state = ?self.state, "app left the foreground; cancelling session");
        self.session.cancel();
        self.audio.stop();
        self.session.clear_growth();
    }

    fn resume(&mut self) {
        self.session.register_receivers();
        self.totals = self.ledger.reconcile_on_resume(self.totals);
        self.session.clear_growth();
        debug!(
            minutes = self.totals.minutes,
            sessions = self.totals.sessions,
            "resumed"
        );
    }
}
