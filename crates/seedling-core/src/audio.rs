//! Background audio seam.
//!
//! Playback itself lives in the host; the core only needs to be able to stop
//! it whenever the app leaves the foreground.

/// Foreground playback collaborator.
pub trait AudioPlayer {
    fn start(&mut self, track_id: &str);

    /// Stop playback. Must be safe to call when nothing is playing.
    fn stop(&mut self);
}

/// Human-readable name for a track id: underscores become spaces and the
/// first letter is upper-cased (`forest_rain` -> `Forest rain`).
pub fn display_track_name(track_id: &str) -> String {
    let spaced = track_id.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
