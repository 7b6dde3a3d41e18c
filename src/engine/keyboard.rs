//! Keyboard note control
//!
//! Maps the home-row keys to 13 equal-tempered semitones above the base
//! frequency, tracks which keys are held, and turns changes in the held set
//! into voice triggers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::synth::Voice;

/// Playable keys, lowest note first: white keys on the home row, black keys above
pub const KEYBOARD_KEYS: &str = "AWSEDFTGYHUJK";

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Semitone offset of a keyboard key, if it is mapped
pub fn key_index(key: char) -> Option<i32> {
    let key = key.to_ascii_uppercase();
    KEYBOARD_KEYS.chars().position(|c| c == key).map(|i| i as i32)
}

/// Equal-tempered frequency `semitones` above `base`
pub fn note_frequency(base: f64, semitones: i32) -> f64 {
    base * 2f64.powf(semitones as f64 / 12.0)
}

/// Note name for a semitone offset from a C base, e.g. `C#`
pub fn note_name(semitones: i32) -> &'static str {
    NOTE_NAMES[semitones.rem_euclid(12) as usize]
}

#[derive(Debug, Clone, Copy)]
struct HeldKey {
    semitone: i32,
    last_seen: Instant,
    repeated: bool,
}

/// Turns terminal key events into a set of held keys
///
/// Terminals that report key releases end a hold immediately. Others only
/// send a press followed by auto-repeats, so a key counts as held until it
/// has not been seen for `hold` (before the first repeat) or `repeat_hold`
/// (once repeats are arriving).
#[derive(Debug, Clone)]
pub struct KeyTracker {
    keys: Vec<HeldKey>,
    hold: Duration,
    repeat_hold: Duration,
}

impl KeyTracker {
    pub fn new(hold: Duration, repeat_hold: Duration) -> Self {
        Self {
            keys: Vec::new(),
            hold,
            repeat_hold,
        }
    }

    /// Record a press or auto-repeat of `semitone`
    pub fn press(&mut self, semitone: i32, now: Instant) {
        match self.keys.iter_mut().find(|k| k.semitone == semitone) {
            Some(key) => {
                key.last_seen = now;
                key.repeated = true;
            }
            None => self.keys.push(HeldKey {
                semitone,
                last_seen: now,
                repeated: false,
            }),
        }
    }

    pub fn release(&mut self, semitone: i32) {
        self.keys.retain(|k| k.semitone != semitone);
    }

    /// Drop keys whose hold has run out
    pub fn expire(&mut self, now: Instant) {
        let (hold, repeat_hold) = (self.hold, self.repeat_hold);
        self.keys.retain(|k| {
            let limit = if k.repeated { repeat_hold } else { hold };
            now.saturating_duration_since(k.last_seen) < limit
        });
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Held keys, oldest press first
    pub fn held(&self) -> Vec<i32> {
        self.keys.iter().map(|k| k.semitone).collect()
    }
}

/// Drives the voice from the set of held notes
///
/// The most recently pressed held note sounds. Pressing a note from silence
/// triggers the envelope; moving between held notes only changes the
/// frequency unless `retrigger` is set; releasing everything ends the note.
pub struct NoteController {
    voice: Arc<Voice>,
    base_frequency: f64,
    retrigger: bool,
    current: Option<i32>,
}

impl NoteController {
    pub fn new(voice: Arc<Voice>, base_frequency: f64, retrigger: bool) -> Self {
        Self {
            voice,
            base_frequency,
            retrigger,
            current: None,
        }
    }

    /// Semitone offset of the sounding note
    pub fn current(&self) -> Option<i32> {
        self.current
    }

    pub fn frequency(&self, semitone: i32) -> f64 {
        note_frequency(self.base_frequency, semitone)
    }

    /// Apply the held notes (oldest first) at stream `time`
    pub fn update(&mut self, held: &[i32], time: f64) {
        match (self.current, held.last().copied()) {
            (None, Some(note)) => {
                self.voice.set_frequency(self.frequency(note));
                self.voice.note_on(time);
                self.current = Some(note);
                log::debug!("note on {} at {:.3}s", note, time);
            }
            (Some(current), Some(note)) if current != note => {
                self.voice.set_frequency(self.frequency(note));
                if self.retrigger {
                    self.voice.note_on(time);
                }
                self.current = Some(note);
                log::debug!("note change {} -> {} at {:.3}s", current, note, time);
            }
            (Some(current), None) => {
                self.voice.note_off(time);
                self.current = None;
                log::debug!("note off {} at {:.3}s", current, time);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::EnvelopePhase;

    const MIDDLE_C: f64 = 261.63;

    fn controller(retrigger: bool) -> (Arc<Voice>, NoteController) {
        let voice = Arc::new(Voice::default());
        let controller = NoteController::new(Arc::clone(&voice), MIDDLE_C, retrigger);
        (voice, controller)
    }

    #[test]
    fn test_key_index() {
        assert_eq!(key_index('a'), Some(0));
        assert_eq!(key_index('W'), Some(1));
        assert_eq!(key_index('k'), Some(12));
        assert_eq!(key_index('z'), None);
        assert_eq!(KEYBOARD_KEYS.len(), 13);
    }

    #[test]
    fn test_note_frequency() {
        assert_eq!(note_frequency(MIDDLE_C, 0), MIDDLE_C);
        assert!((note_frequency(MIDDLE_C, 12) - 2.0 * MIDDLE_C).abs() < 1e-9);
        assert!((note_frequency(440.0, -12) - 220.0).abs() < 1e-9);
        // A above middle C
        assert!((note_frequency(MIDDLE_C, 9) - 440.0).abs() < 0.01);

        for i in 0..12 {
            let ratio = note_frequency(MIDDLE_C, i + 1) / note_frequency(MIDDLE_C, i);
            assert!((ratio - 2f64.powf(1.0 / 12.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_note_name() {
        assert_eq!(note_name(0), "C");
        assert_eq!(note_name(1), "C#");
        assert_eq!(note_name(12), "C");
        assert_eq!(note_name(-1), "B");
    }

    #[test]
    fn test_tracker_press_release() {
        let now = Instant::now();
        let mut tracker = KeyTracker::new(Duration::from_millis(500), Duration::from_millis(100));

        tracker.press(0, now);
        tracker.press(4, now);
        assert_eq!(tracker.held(), vec![0, 4]);

        tracker.release(0);
        assert_eq!(tracker.held(), vec![4]);

        tracker.clear();
        assert!(tracker.held().is_empty());
    }

    #[test]
    fn test_tracker_hold_timeouts() {
        let start = Instant::now();
        let mut tracker = KeyTracker::new(Duration::from_millis(500), Duration::from_millis(100));

        tracker.press(2, start);
        tracker.expire(start + Duration::from_millis(400));
        assert_eq!(tracker.held(), vec![2]);

        // First auto-repeat switches to the shorter window
        tracker.press(2, start + Duration::from_millis(450));
        tracker.expire(start + Duration::from_millis(500));
        assert_eq!(tracker.held(), vec![2]);

        tracker.expire(start + Duration::from_millis(600));
        assert!(tracker.held().is_empty());
    }

    #[test]
    fn test_note_on_from_silence() {
        let (voice, mut controller) = controller(false);

        controller.update(&[4], 1.0);
        assert_eq!(controller.current(), Some(4));
        assert!(voice.is_note_on());
        assert_eq!(voice.envelope().trigger_on_time(), 1.0);
        assert!((voice.frequency() - note_frequency(MIDDLE_C, 4)).abs() < 1e-12);
    }

    #[test]
    fn test_held_note_does_not_retrigger() {
        let (voice, mut controller) = controller(false);

        controller.update(&[0], 1.0);
        controller.update(&[0], 1.5);
        assert_eq!(voice.envelope().trigger_on_time(), 1.0);
    }

    #[test]
    fn test_legato_switch() {
        let (voice, mut controller) = controller(false);

        controller.update(&[0], 1.0);
        controller.update(&[0, 7], 2.0);

        assert_eq!(controller.current(), Some(7));
        assert!((voice.frequency() - note_frequency(MIDDLE_C, 7)).abs() < 1e-12);
        assert_eq!(voice.envelope().trigger_on_time(), 1.0);
        assert_eq!(voice.envelope().phase(2.0), EnvelopePhase::Sustain);

        // Releasing the newer key falls back to the older one
        controller.update(&[0], 3.0);
        assert_eq!(controller.current(), Some(0));
        assert_eq!(voice.frequency(), MIDDLE_C);
        assert!(voice.is_note_on());
    }

    #[test]
    fn test_retrigger_switch() {
        let (voice, mut controller) = controller(true);

        controller.update(&[0], 1.0);
        controller.update(&[0, 7], 2.0);
        assert_eq!(voice.envelope().trigger_on_time(), 2.0);
        assert_eq!(voice.envelope().phase(2.0), EnvelopePhase::Attack);
    }

    #[test]
    fn test_note_off_when_all_released() {
        let (voice, mut controller) = controller(false);

        controller.update(&[0], 1.0);
        controller.update(&[], 2.0);
        assert_eq!(controller.current(), None);
        assert!(!voice.is_note_on());
        assert_eq!(voice.envelope().trigger_off_time(), 2.0);

        // Silence stays silent
        controller.update(&[], 3.0);
        assert_eq!(voice.envelope().trigger_off_time(), 2.0);
    }

    #[test]
    fn test_new_note_after_release_retriggers() {
        let (voice, mut controller) = controller(false);

        controller.update(&[0], 1.0);
        controller.update(&[], 2.0);
        controller.update(&[3], 4.0);
        assert!(voice.is_note_on());
        assert_eq!(voice.envelope().trigger_on_time(), 4.0);
    }
}
