//! Synthesis core
//!
//! Contains the oscillator bank, the ADSR envelope, the built-in patches and
//! the monophonic voice that mixes them into output samples.

mod envelope;
mod oscillator;
pub mod patch;
mod voice;

pub use envelope::{Envelope, EnvelopePhase, EnvelopeShape, AMPLITUDE_FLOOR};
pub use oscillator::{angular_velocity, oscillate, oscillate_index, Waveform, SAW_HARMONICS};
pub use patch::{Partial, Patch};
pub use voice::{Voice, MASTER_VOLUME};
