//! Monosynth - a real-time monophonic additive synthesizer
//!
//! One note at a time, played from the computer keyboard or a MIDI port.
//! Each sample is a fixed mix of oscillators shaped by an ADSR envelope.

pub mod config;
pub mod engine;
pub mod synth;
pub mod viz;

pub use config::SynthConfig;
pub use engine::Engine;
pub use synth::Voice;
