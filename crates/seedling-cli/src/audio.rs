//! Terminal stand-in for background audio: announces the track instead of
//! playing it.

use seedling_core::{display_track_name, AudioPlayer};
use tracing::debug;

#[derive(Debug, Default)]
pub struct TerminalAudio {
    playing: Option<String>,
}

impl AudioPlayer for TerminalAudio {
    fn start(&mut self, track_id: &str) {
        println!("playing: {}", display_track_name(track_id));
        self.playing = Some(track_id.to_string());
    }

    fn stop(&mut self) {
        if let Some(track) = self.playing.take() {
            debug!(track = %track, "audio stopped");
        }
    }
}
