//! Audio engine
//!
//! Connects the voice to the outside world: a sample clock shared by the
//! audio and control threads, the note controller, MIDI input and real-time
//! playback.

mod keyboard;
mod midi;
mod player;
mod session;

pub use keyboard::{key_index, note_frequency, note_name, KeyTracker, NoteController, KEYBOARD_KEYS};
pub use midi::{list_midi_ports, MidiInputHandle, MidiMessage, MidiNotes};
pub use player::{list_output_devices, Player};
pub use session::{Session, Status};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::SynthConfig;
use crate::synth::Voice;

/// Stream clock counting rendered frames
///
/// Only the audio producer advances it; anyone may read the time.
#[derive(Debug)]
pub struct Clock {
    frames: AtomicU64,
    sample_rate: f64,
}

impl Clock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            frames: AtomicU64::new(0),
            sample_rate: sample_rate as f64,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Frames rendered since the stream started
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Seconds since the stream started
    pub fn now(&self) -> f64 {
        self.frames() as f64 / self.sample_rate
    }

    /// Move the clock forward by `frames`
    pub fn advance(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::AcqRel);
    }
}

/// The main audio engine
///
/// Cloning is cheap; clones share the same voice and clock.
#[derive(Clone)]
pub struct Engine {
    voice: Arc<Voice>,
    clock: Arc<Clock>,
}

impl Engine {
    /// Create an engine for the configured voice, running at `sample_rate`
    pub fn new(config: &SynthConfig, sample_rate: u32) -> Self {
        let voice = Voice::new(config.envelope.shape(), config.patch(), config.voice.volume);
        Self::with_voice(Arc::new(voice), sample_rate)
    }

    pub fn with_voice(voice: Arc<Voice>, sample_rate: u32) -> Self {
        Self {
            voice,
            clock: Arc::new(Clock::new(sample_rate)),
        }
    }

    pub fn voice(&self) -> &Arc<Voice> {
        &self.voice
    }

    pub fn clock(&self) -> &Arc<Clock> {
        &self.clock
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> f64 {
        self.clock.sample_rate()
    }

    /// Render the sample at the current clock time and advance the clock
    pub fn process(&self) -> f64 {
        let sample = self.voice.render_sample(self.clock.now());
        self.clock.advance(1);
        sample
    }

    /// Fill a buffer with samples
    pub fn fill_buffer(&self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process() as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_engine() -> Engine {
        Engine::new(&SynthConfig::default(), 44100)
    }

    #[test]
    fn test_clock() {
        let clock = Clock::new(100);
        assert_eq!(clock.now(), 0.0);

        clock.advance(50);
        assert_eq!(clock.frames(), 50);
        assert_eq!(clock.now(), 0.5);
    }

    #[test]
    fn test_engine_creation() {
        let engine = test_engine();
        assert_eq!(engine.sample_rate(), 44100.0);
        assert_eq!(engine.clock().frames(), 0);
        assert_eq!(engine.voice().volume(), 0.4);
    }

    #[test]
    fn test_engine_silent_until_note_on() {
        let engine = test_engine();
        engine.voice().set_frequency(440.0);

        let mut buffer = vec![1.0f32; 512];
        engine.fill_buffer(&mut buffer);
        assert!(buffer.iter().all(|&s| s == 0.0));
        assert_eq!(engine.clock().frames(), 512);
    }

    #[test]
    fn test_engine_plays_note() {
        let engine = test_engine();
        engine.voice().set_frequency(261.63);
        engine.voice().note_on(engine.clock().now());

        let mut buffer = vec![0.0f32; 4410];
        engine.fill_buffer(&mut buffer);

        let max = buffer.iter().fold(0.0f32, |a, &b| a.max(b.abs()));
        assert!(max > 0.1, "Expected audible output, got {}", max);
    }

    #[test]
    fn test_engine_release_goes_silent() {
        let engine = test_engine();
        engine.voice().set_frequency(261.63);
        engine.voice().note_on(0.0);

        let mut buffer = vec![0.0f32; 4410];
        engine.fill_buffer(&mut buffer);

        engine.voice().note_off(engine.clock().now());
        // 0.02 s release is 882 frames at 44.1 kHz
        let mut tail = vec![0.0f32; 2000];
        engine.fill_buffer(&mut tail);
        assert!(tail[1000..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_engine_clones_share_state() {
        let engine = test_engine();
        let audio = engine.clone();

        audio.process();
        audio.process();
        assert_eq!(engine.clock().frames(), 2);

        engine.voice().set_frequency(330.0);
        assert_eq!(audio.voice().frequency(), 330.0);
    }
}
