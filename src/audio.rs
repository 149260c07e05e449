//! Audio cue abstraction
//!
//! The simulation fires named cues; hosts plug in a real backend. Playback
//! is fire-and-forget and infallible: a backend with no audio hardware
//! swallows every call.

/// Sound cues the simulation can fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    /// Ball hits a wall or the paddle
    BallHit,
    /// Ball hits a brick
    BrickHit,
    /// Ball fell below the field
    BallLost,
    /// Power-up caught by the paddle
    PowerUp,
}

/// Fire-and-forget cue playback plus persistent music control.
///
/// Passed into the tick as an explicit collaborator; the simulation never
/// reaches for a global sound manager.
pub trait CuePlayer {
    fn play(&mut self, cue: AudioCue);

    fn play_music(&mut self, _name: &str) {}
    fn pause_music(&mut self) {}
    fn resume_music(&mut self) {}
    fn stop_music(&mut self) {}
}

/// Backend that plays nothing. Stands in when no audio hardware exists.
#[derive(Debug, Default)]
pub struct NullCuePlayer;

impl CuePlayer for NullCuePlayer {
    fn play(&mut self, _cue: AudioCue) {}
}

/// Records fired cues in order. Used by the simulation tests.
#[derive(Debug, Default)]
pub struct RecordingCuePlayer {
    pub cues: Vec<AudioCue>,
}

impl RecordingCuePlayer {
    pub fn count(&self, cue: AudioCue) -> usize {
        self.cues.iter().filter(|&&c| c == cue).count()
    }
}

impl CuePlayer for RecordingCuePlayer {
    fn play(&mut self, cue: AudioCue) {
        self.cues.push(cue);
    }
}
