//! Stateless oscillator bank
//!
//! Every waveform is a pure function of frequency and absolute time, so the
//! audio thread can ask for any sample without carrying phase between calls.

use std::f64::consts::PI;

/// Number of harmonics summed for the band-limited sawtooth.
///
/// There is no anti-aliasing filter: harmonics above Nyquist fold back for
/// high fundamentals. This bound runs on the audio thread once per sample,
/// so it stays a compile-time constant.
pub const SAW_HARMONICS: u32 = 99;

/// Convert a frequency in Hz to angular velocity in radians per second.
pub fn angular_velocity(hertz: f64) -> f64 {
    hertz * 2.0 * PI
}

/// Waveform types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    /// Fourier-series sawtooth truncated at [`SAW_HARMONICS`]
    Saw,
}

impl Waveform {
    /// All waveforms, in index order
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Saw,
    ];

    /// Look up a waveform by its numeric index (0 = sine .. 3 = saw)
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Look up a waveform by name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sine" | "sin" => Some(Waveform::Sine),
            "square" | "sqr" => Some(Waveform::Square),
            "triangle" | "tri" => Some(Waveform::Triangle),
            "saw" | "sawtooth" => Some(Waveform::Saw),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Saw => "saw",
        }
    }
}

/// Compute one sample of `waveform` at `frequency` Hz and `time` seconds.
pub fn oscillate(frequency: f64, time: f64, waveform: Waveform) -> f64 {
    let phase = angular_velocity(frequency) * time;

    match waveform {
        Waveform::Sine => phase.sin(),
        Waveform::Square => {
            if phase.sin() > 0.0 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Triangle => phase.sin().asin() * 2.0 / PI,
        Waveform::Saw => saw(phase, SAW_HARMONICS),
    }
}

/// Like [`oscillate`], but selects the waveform by numeric index.
///
/// Unknown indices produce silence instead of an error.
pub fn oscillate_index(frequency: f64, time: f64, index: u8) -> f64 {
    match Waveform::from_index(index) {
        Some(waveform) => oscillate(frequency, time, waveform),
        None => 0.0,
    }
}

fn saw(phase: f64, harmonics: u32) -> f64 {
    let mut output = 0.0;
    for k in 1..=harmonics {
        let k = k as f64;
        output += (k * phase).sin() / k;
    }
    output * (2.0 / PI)
}
