//! The monophonic voice shared between control and audio threads
//!
//! A [`Voice`] owns the only pitch state (one active frequency), the envelope
//! triggers, and the fixed patch. The control thread writes through
//! [`Voice::set_frequency`], [`Voice::note_on`] and [`Voice::note_off`]; the
//! audio thread calls [`Voice::render_sample`]. Every field is an atomic
//! scalar, so neither side ever locks or allocates.
//!
//! The envelope is read as three separate atomics. A trigger that lands while
//! the audio thread is mid-read can be seen half-applied for a single sample;
//! the next sample is consistent again.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::envelope::{Envelope, EnvelopeShape};
use super::patch::Patch;

/// Output headroom scaling applied after the patch mix
pub const MASTER_VOLUME: f64 = 0.4;

/// An `f64` stored as its bit pattern in an `AtomicU64`
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    fn load(&self, order: Ordering) -> f64 {
        f64::from_bits(self.0.load(order))
    }

    fn store(&self, value: f64, order: Ordering) {
        self.0.store(value.to_bits(), order);
    }
}

/// One monophonic synthesis unit
pub struct Voice {
    frequency: AtomicF64,
    trigger_on_time: AtomicF64,
    trigger_off_time: AtomicF64,
    note_on: AtomicBool,
    shape: EnvelopeShape,
    patch: Patch,
    volume: f64,
}

impl Voice {
    /// Create a silent voice
    pub fn new(shape: EnvelopeShape, patch: Patch, volume: f64) -> Self {
        let idle = Envelope::new(shape);
        Self {
            frequency: AtomicF64::new(0.0),
            trigger_on_time: AtomicF64::new(idle.trigger_on_time()),
            trigger_off_time: AtomicF64::new(idle.trigger_off_time()),
            note_on: AtomicBool::new(false),
            shape,
            patch,
            volume,
        }
    }

    /// Switch the active frequency without touching the envelope
    pub fn set_frequency(&self, hertz: f64) {
        self.frequency.store(hertz, Ordering::Relaxed);
    }

    pub fn frequency(&self) -> f64 {
        self.frequency.load(Ordering::Relaxed)
    }

    /// Start (or restart) the envelope at `time`
    pub fn note_on(&self, time: f64) {
        self.trigger_on_time.store(time, Ordering::Relaxed);
        self.note_on.store(true, Ordering::Release);
    }

    /// Release the envelope at `time`
    pub fn note_off(&self, time: f64) {
        self.trigger_off_time.store(time, Ordering::Relaxed);
        self.note_on.store(false, Ordering::Release);
    }

    pub fn is_note_on(&self) -> bool {
        self.note_on.load(Ordering::Acquire)
    }

    /// Snapshot of the envelope state
    pub fn envelope(&self) -> Envelope {
        let note_on = self.note_on.load(Ordering::Acquire);
        Envelope::from_parts(
            self.shape,
            self.trigger_on_time.load(Ordering::Relaxed),
            self.trigger_off_time.load(Ordering::Relaxed),
            note_on,
        )
    }

    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Produce the output sample at `time` seconds since stream start
    pub fn render_sample(&self, time: f64) -> f64 {
        let amplitude = self.envelope().amplitude(time);
        if amplitude == 0.0 {
            return 0.0;
        }

        amplitude * self.patch.mix(self.frequency(), time) * self.volume
    }
}

impl Default for Voice {
    fn default() -> Self {
        Self::new(EnvelopeShape::default(), Patch::default(), MASTER_VOLUME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{oscillate, Waveform};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_voice_creation() {
        let voice = Voice::default();
        assert_eq!(voice.frequency(), 0.0);
        assert!(!voice.is_note_on());
        assert_eq!(voice.volume(), 0.4);
        assert_eq!(voice.patch().name, "additive");
        assert_eq!(voice.render_sample(0.3), 0.0);
    }

    #[test]
    fn test_voice_silent_before_first_note_on() {
        let voice = Voice::default();
        voice.set_frequency(440.0);
        assert_eq!(voice.envelope(), Envelope::default());

        for i in 0..512 {
            let t = i as f64 / 44100.0;
            assert_eq!(voice.render_sample(t), 0.0, "audible at frame {}", i);
        }
    }

    #[test]
    fn test_voice_render_matches_mix() {
        let voice = Voice::default();
        let f = 261.63;
        voice.set_frequency(f);
        voice.note_on(0.0);

        for i in 0..50 {
            let t = 0.05 + i as f64 * 0.000_9;
            let raw = oscillate(f, t, Waveform::Saw)
                + oscillate(f * 2.0, t, Waveform::Sine)
                + oscillate(f * 3.0, t, Waveform::Triangle);
            let expected = 0.8 * raw * 0.4;
            assert!((voice.render_sample(t) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_voice_released_is_silent() {
        let voice = Voice::default();
        voice.note_on(0.0);
        voice.note_off(1.0);

        for f in [27.5, 261.63, 4186.0, 12_000.0] {
            voice.set_frequency(f);
            for i in 0..20 {
                let t = 1.5 + i as f64 * 0.013;
                assert_eq!(voice.render_sample(t), 0.0);
            }
        }
    }

    #[test]
    fn test_voice_frequency_switch_keeps_envelope() {
        let voice = Voice::default();
        voice.set_frequency(261.63);
        voice.note_on(0.0);
        let before = voice.envelope();

        voice.set_frequency(392.0);
        assert_eq!(voice.frequency(), 392.0);
        assert_eq!(voice.envelope(), before);
    }

    #[test]
    fn test_voice_envelope_snapshot() {
        let voice = Voice::default();
        voice.note_on(2.0);
        voice.note_off(3.0);

        let env = voice.envelope();
        assert!(!env.is_note_on());
        assert_eq!(env.trigger_on_time(), 2.0);
        assert_eq!(env.trigger_off_time(), 3.0);
    }

    #[test]
    fn test_voice_custom_patch_and_volume() {
        let voice = Voice::new(EnvelopeShape::default(), crate::synth::patch::SINE, 1.0);
        voice.set_frequency(1.0);
        voice.note_on(0.0);

        // Sustain 0.8 times sin(pi / 2)
        assert!((voice.render_sample(0.25) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_voice_shared_across_threads() {
        let voice = Arc::new(Voice::default());
        voice.set_frequency(440.0);

        let control = {
            let voice = Arc::clone(&voice);
            thread::spawn(move || {
                // Trigger times stay behind the audio clock
                for i in 0..1000 {
                    let t = -1.0 + i as f64 * 0.001;
                    if i % 2 == 0 {
                        voice.note_on(t);
                        voice.set_frequency(220.0 + i as f64);
                    } else {
                        voice.note_off(t);
                    }
                }
            })
        };

        for i in 0..10_000 {
            let sample = voice.render_sample(i as f64 / 10_000.0);
            assert!(sample.is_finite());
            assert!(sample.abs() < 2.0, "sample out of range: {}", sample);
        }

        control.join().unwrap();
    }
}
