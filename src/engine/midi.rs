//! MIDI input for Monosynth.
//!
//! Listens on a MIDI port and forwards note messages to the control loop.

use std::sync::mpsc::{self, Receiver};

use anyhow::{anyhow, Result};
use midir::{Ignore, MidiInput, MidiInputConnection};

/// MIDI channel messages the synth understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note on: channel (0-15), note (0-127), velocity (1-127)
    NoteOn(u8, u8, u8),
    /// Note off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff(u8, u8, u8),
    /// Control change: channel (0-15), controller (0-127), value (0-127)
    ControlChange(u8, u8, u8),
}

impl MidiMessage {
    /// Parse raw MIDI bytes. A note on with velocity 0 is a note off.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let channel = status & 0x0F;

        match (status & 0xF0, data) {
            (0x90, &[note, 0, ..]) => Some(MidiMessage::NoteOff(channel, note & 0x7F, 0)),
            (0x90, &[note, vel, ..]) => Some(MidiMessage::NoteOn(channel, note & 0x7F, vel & 0x7F)),
            (0x80, &[note, vel, ..]) => Some(MidiMessage::NoteOff(channel, note & 0x7F, vel & 0x7F)),
            (0xB0, &[ctrl, val, ..]) => Some(MidiMessage::ControlChange(channel, ctrl & 0x7F, val & 0x7F)),
            _ => None,
        }
    }
}

/// Controller 123: all notes off
const ALL_NOTES_OFF: u8 = 123;

/// Held MIDI notes, oldest first.
#[derive(Debug, Clone, Default)]
pub struct MidiNotes {
    held: Vec<u8>,
}

impl MidiNotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the held set from a message.
    pub fn apply(&mut self, msg: MidiMessage) {
        match msg {
            MidiMessage::NoteOn(_, note, _) => {
                self.held.retain(|&n| n != note);
                self.held.push(note);
            }
            MidiMessage::NoteOff(_, note, _) => self.held.retain(|&n| n != note),
            MidiMessage::ControlChange(_, ALL_NOTES_OFF, _) => self.held.clear(),
            MidiMessage::ControlChange(..) => {}
        }
    }

    /// Held notes as semitone offsets from `base_note`.
    pub fn held(&self, base_note: u8) -> Vec<i32> {
        self.held
            .iter()
            .map(|&n| n as i32 - base_note as i32)
            .collect()
    }
}

/// An open MIDI input connection.
///
/// Messages arrive on midir's thread and are queued for the control loop.
pub struct MidiInputHandle {
    connection: Option<MidiInputConnection<()>>,
    receiver: Receiver<MidiMessage>,
    port_name: String,
}

impl MidiInputHandle {
    /// Connect to the first port whose name contains `port_name`, or the first port.
    pub fn connect(port_name: Option<&str>) -> Result<Self> {
        let mut midi_in = MidiInput::new("Monosynth MIDI Input")?;
        midi_in.ignore(Ignore::All);
        let ports = midi_in.ports();

        if ports.is_empty() {
            return Err(anyhow!("No MIDI input ports available"));
        }

        let port = if let Some(name) = port_name {
            ports
                .iter()
                .find(|p| {
                    midi_in
                        .port_name(p)
                        .map(|n| n.contains(name))
                        .unwrap_or(false)
                })
                .ok_or_else(|| anyhow!("MIDI port '{}' not found", name))?
                .clone()
        } else {
            ports[0].clone()
        };

        let port_name_actual = midi_in.port_name(&port)?;
        let (sender, receiver) = mpsc::channel::<MidiMessage>();

        let connection = midi_in
            .connect(
                &port,
                "monosynth-input",
                move |_stamp, bytes, _| {
                    if let Some(msg) = MidiMessage::from_bytes(bytes) {
                        let _ = sender.send(msg);
                    }
                },
                (),
            )
            .map_err(|e| anyhow!("failed to connect to MIDI port '{}': {}", port_name_actual, e))?;

        log::info!("MIDI input connected to: {}", port_name_actual);

        Ok(Self {
            connection: Some(connection),
            receiver,
            port_name: port_name_actual,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Take every queued message, oldest first.
    pub fn drain(&self) -> Vec<MidiMessage> {
        self.receiver
            .try_iter()
            .inspect(|msg| log::trace!("midi {:?}", msg))
            .collect()
    }
}

impl Drop for MidiInputHandle {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            let _ = connection.close();
        }
    }
}

/// List available MIDI input ports.
pub fn list_midi_ports() -> Result<Vec<String>> {
    let midi_in = MidiInput::new("Monosynth MIDI List")?;
    let ports = midi_in.ports();

    let names: Vec<String> = ports
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect();

    Ok(names)
}
