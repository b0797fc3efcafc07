//! First-open rules prompt.

use tracing::warn;

use crate::storage::KvStore;

pub const FIRST_OPENED_KEY: &str = "first_opened";

pub const RULES_TEXT: &str = "\
How Seedling works:
  - Start a session and keep the app in front of you until the clock runs out.
  - Your seedling grows three times as the clock runs down.
  - Leaving the app ends the session and the seedling starts over.
  - Every finished session adds to today's focus totals.";

/// Returns `true` the first time it is called against a store, and records
/// that the rules have been shown.
///
/// An unreadable store counts as a first open.
pub fn take_first_open<S: KvStore>(store: &S) -> bool {
    let first = match store.get_bool(FIRST_OPENED_KEY) {
        Ok(value) => value.unwrap_or(true),
        Err(err) => {
            warn!(error = %err, "could not read first-open flag");
            true
        }
    };
    if first {
        if let Err(err) = store.put_bool(FIRST_OPENED_KEY, false) {
            warn!(error = %err, "could not persist first-open flag");
        }
    }
    first
}
