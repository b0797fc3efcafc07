//! Daily focus totals.
//!
//! Only one day's totals are ever kept. The record is stamped with the
//! calendar date (`dd-mm-yyyy`) of the completion that last wrote it, and any
//! read on a different date treats the totals as zero. Date handling is a
//! plain string comparison: a session that crosses midnight is credited to
//! the day it completes on.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::StorageError;
use crate::storage::KvStore;

pub const STORED_DATE_KEY: &str = "stored_date";
pub const FOCUS_TIME_KEY: &str = "updated_focus_time";
pub const FOCUS_SESSIONS_KEY: &str = "updated_focus_sessions";

/// Persisted date layout, e.g. `19-10-2026`.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Source of "today".
pub trait DateSource: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Today according to the local system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDates;

impl DateSource for LocalDates {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A fixed date is its own source.
impl DateSource for NaiveDate {
    fn today(&self) -> NaiveDate {
        *self
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Strip JSON quoting and escape characters left by older writers.
pub fn normalize_stored_date(raw: &str) -> String {
    raw.replace(['\\', '"'], "").trim().to_string()
}

/// `(minutes, sessions)` pair as shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub minutes: u32,
    pub sessions: u32,
}

impl DailyTotals {
    pub fn new(minutes: u32, sessions: u32) -> Self {
        Self { minutes, sessions }
    }
}

/// The persisted record, exactly as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: Option<String>,
    pub focus_minutes_total: u32,
    pub focus_sessions_total: u32,
}

impl DailyStats {
    pub fn is_for(&self, day: &str) -> bool {
        self.date.as_deref() == Some(day)
    }

    pub fn totals(&self) -> DailyTotals {
        DailyTotals::new(self.focus_minutes_total, self.focus_sessions_total)
    }
}

/// Sole writer of the persisted daily totals.
#[derive(Clone)]
pub struct DailyLedger<S> {
    store: S,
    dates: Arc<dyn DateSource>,
}

impl<S: KvStore> DailyLedger<S> {
    pub fn new(store: S, dates: Arc<dyn DateSource>) -> Self {
        Self { store, dates }
    }

    pub fn with_local_dates(store: S) -> Self {
        Self::new(store, Arc::new(LocalDates))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Today's date in the persisted layout.
    pub fn today(&self) -> String {
        format_date(self.dates.today())
    }

    /// Read the persisted record. Unavailable storage and unparsable values
    /// read as absent.
    pub fn load(&self) -> DailyStats {
        DailyStats {
            date: self
                .read(STORED_DATE_KEY)
                .map(|raw| normalize_stored_date(&raw))
                .filter(|date| !date.is_empty()),
            focus_minutes_total: self.read_count(FOCUS_TIME_KEY),
            focus_sessions_total: self.read_count(FOCUS_SESSIONS_KEY),
        }
    }

    /// Credit one completed session of `session_minutes` to today.
    ///
    /// Totals recorded on any other day are discarded, not archived.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the new record could not be written.
    pub fn record_completion(&self, session_minutes: u32) -> Result<DailyStats, StorageError> {
        let today = self.today();
        let stored = self.load();
        let updated = if stored.is_for(&today) {
            DailyStats {
                date: Some(today),
                focus_minutes_total: stored.focus_minutes_total.saturating_add(session_minutes),
                focus_sessions_total: stored.focus_sessions_total.saturating_add(1),
            }
        } else {
            DailyStats {
                date: Some(today),
                focus_minutes_total: session_minutes,
                focus_sessions_total: 1,
            }
        };

        let minutes = updated.focus_minutes_total.to_string();
        let sessions = updated.focus_sessions_total.to_string();
        let date = updated.date.as_deref().unwrap_or_default();
        self.store.put_strings(&[
            (STORED_DATE_KEY, date),
            (FOCUS_TIME_KEY, minutes.as_str()),
            (FOCUS_SESSIONS_KEY, sessions.as_str()),
        ])?;
        info!(
            date,
            minutes = updated.focus_minutes_total,
            sessions = updated.focus_sessions_total,
            "daily stats recorded"
        );
        Ok(updated)
    }

    /// Adopt persisted totals on foreground if they are today's and ahead of
    /// the in-memory count. Never lowers the in-memory minutes.
    pub fn reconcile_on_resume(&self, in_memory: DailyTotals) -> DailyTotals {
        let stored = self.load();
        if stored.is_for(&self.today()) && stored.focus_minutes_total > in_memory.minutes {
            stored.totals()
        } else {
            in_memory
        }
    }

    /// Totals to display: zero unless the record is today's.
    pub fn current_display_stats(&self) -> DailyTotals {
        let stored = self.load();
        if stored.is_for(&self.today()) {
            stored.totals()
        } else {
            DailyTotals::default()
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get_string(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "stats read failed; treating as absent");
                None
            }
        }
    }

    fn read_count(&self, key: &str) -> u32 {
        self.read(key)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(0)
    }
}
