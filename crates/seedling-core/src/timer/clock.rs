//! Countdown clock text.
//!
//! Milestones are matched against the rendered clock text, so the rendering
//! here is the single source of truth: minutes unpadded, seconds padded to two
//! digits, ASCII digits only (`300_000` -> `"5:00"`, `30_000` -> `"0:30"`).

/// Fixed period between clock ticks.
pub const TICK_PERIOD_MS: u64 = 1_000;

/// Default length of one focus session, in minutes.
pub const FOCUS_DURATION_MIN: u32 = 5;

/// Default length of one focus session, in milliseconds.
pub const FOCUS_DURATION_MS: u64 = FOCUS_DURATION_MIN as u64 * 60_000;

/// Render a millisecond count as `m:ss`.
///
/// Sub-second remainders are truncated, never rounded.
pub fn format_clock(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms / 1_000) % 60;
    format!("{minutes}:{seconds:02}")
}

/// Parse `m:ss` (or `mm:ss`, `m:s`) clock text back into milliseconds.
///
/// Returns `None` for anything that is not two ASCII-digit groups with
/// seconds below 60.
pub fn parse_clock(text: &str) -> Option<u64> {
    let (minutes, seconds) = text.trim().split_once(':')?;
    if minutes.is_empty()
        || seconds.is_empty()
        || seconds.len() > 2
        || !minutes.bytes().all(|b| b.is_ascii_digit())
        || !seconds.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    minutes
        .checked_mul(60_000)?
        .checked_add(seconds * 1_000)
}
