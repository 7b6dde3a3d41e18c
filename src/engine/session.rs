//! Control-rate session
//!
//! Collects note input from the computer keyboard and MIDI, and on every
//! tick hands the combined held set to the note controller, stamped with
//! the stream clock. Both sources share one press order, so the most
//! recently pressed note sounds whichever device it came from.

use std::time::{Duration, Instant};

use super::keyboard::{key_index, KeyTracker, NoteController};
use super::midi::{MidiInputHandle, MidiMessage, MidiNotes};
use super::Engine;
use crate::config::SynthConfig;
use crate::synth::EnvelopePhase;

/// Snapshot of what the voice is doing, for display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
    /// Stream time in seconds
    pub time: f64,
    /// Semitone offset of the sounding note
    pub note: Option<i32>,
    pub frequency: f64,
    pub phase: EnvelopePhase,
    pub amplitude: f64,
}

pub struct Session {
    engine: Engine,
    controller: NoteController,
    keys: KeyTracker,
    midi: Option<MidiInputHandle>,
    midi_notes: MidiNotes,
    base_note: u8,
    /// Semitones by most recent press, across both sources
    pressed: Vec<i32>,
}

impl Session {
    pub fn new(engine: Engine, config: &SynthConfig) -> Self {
        let controller = NoteController::new(
            engine.voice().clone(),
            config.voice.base_frequency,
            config.keyboard.retrigger,
        );
        let keys = KeyTracker::new(
            Duration::from_millis(config.keyboard.hold_ms),
            Duration::from_millis(config.keyboard.repeat_hold_ms),
        );

        Self {
            engine,
            controller,
            keys,
            midi: None,
            midi_notes: MidiNotes::new(),
            base_note: config.midi.base_note,
            pressed: Vec::new(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn attach_midi(&mut self, handle: MidiInputHandle) {
        self.midi = Some(handle);
    }

    pub fn midi_port(&self) -> Option<&str> {
        self.midi.as_ref().map(|m| m.port_name())
    }

    /// Record a press or auto-repeat; returns false for unmapped keys
    pub fn key_press(&mut self, key: char, now: Instant) -> bool {
        match key_index(key) {
            Some(semitone) => {
                // Auto-repeat of a held key keeps its place
                if !self.keys.held().contains(&semitone) {
                    self.mark_pressed(semitone);
                }
                self.keys.press(semitone, now);
                true
            }
            None => false,
        }
    }

    pub fn key_release(&mut self, key: char) {
        if let Some(semitone) = key_index(key) {
            self.keys.release(semitone);
        }
    }

    pub fn midi_message(&mut self, msg: MidiMessage) {
        if let MidiMessage::NoteOn(_, note, _) = msg {
            self.mark_pressed(note as i32 - self.base_note as i32);
        }
        self.midi_notes.apply(msg);
    }

    fn mark_pressed(&mut self, semitone: i32) {
        self.pressed.retain(|&s| s != semitone);
        self.pressed.push(semitone);
    }

    /// Release every held key and MIDI note
    pub fn all_notes_off(&mut self) {
        self.keys.clear();
        self.midi_notes = MidiNotes::new();
        self.pressed.clear();
    }

    /// Semitone offsets currently held, oldest press first
    pub fn held(&self) -> Vec<i32> {
        let keys = self.keys.held();
        let midi = self.midi_notes.held(self.base_note);
        self.pressed
            .iter()
            .copied()
            .filter(|s| keys.contains(s) || midi.contains(s))
            .collect()
    }

    /// Poll input and push the held set to the voice
    pub fn tick(&mut self, now: Instant) {
        let messages = self.midi.as_ref().map(MidiInputHandle::drain).unwrap_or_default();
        for msg in messages {
            self.midi_message(msg);
        }
        self.keys.expire(now);

        let held = self.held();
        self.pressed.retain(|s| held.contains(s));
        self.controller.update(&held, self.engine.clock().now());
    }

    pub fn status(&self) -> Status {
        let time = self.engine.clock().now();
        let voice = self.engine.voice();
        let envelope = voice.envelope();

        Status {
            time,
            note: self.controller.current(),
            frequency: voice.frequency(),
            phase: envelope.phase(time),
            amplitude: envelope.amplitude(time),
        }
    }
}
