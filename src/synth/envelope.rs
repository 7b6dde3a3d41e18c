//! ADSR envelope generator
//!
//! Attack-Decay-Sustain-Release envelope for amplitude shaping. The phase is
//! never stored: it is recomputed on every query from the time elapsed since
//! the last trigger, so irregular or late sample-clock calls cannot drift.

/// Amplitudes at or below this level are snapped to exactly zero.
pub const AMPLITUDE_FLOOR: f64 = 0.0001;

/// Envelope phase, derived from trigger state and time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopePhase {
    Attack,
    Decay,
    Sustain,
    /// Note released: fading out, or already silent
    Release,
}

impl EnvelopePhase {
    pub fn name(&self) -> &'static str {
        match self {
            EnvelopePhase::Attack => "attack",
            EnvelopePhase::Decay => "decay",
            EnvelopePhase::Sustain => "sustain",
            EnvelopePhase::Release => "release",
        }
    }
}

/// Timing and level parameters of an envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeShape {
    /// Attack time in seconds
    pub attack: f64,
    /// Decay time in seconds
    pub decay: f64,
    /// Release time in seconds
    pub release: f64,
    /// Peak level reached at the end of the attack
    pub start_amplitude: f64,
    /// Level held while the note stays on
    pub sustain_amplitude: f64,
}

impl Default for EnvelopeShape {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.01,
            release: 0.02,
            start_amplitude: 1.0,
            sustain_amplitude: 0.8,
        }
    }
}

/// ADSR envelope state: a shape plus the most recent trigger timestamps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    shape: EnvelopeShape,
    trigger_on_time: f64,
    trigger_off_time: f64,
    note_on: bool,
}

impl Envelope {
    /// Create an envelope that has never been triggered
    ///
    /// The release is placed infinitely far in the past so the envelope is
    /// silent until the first note on. Durations must be positive; this is
    /// checked when configuration is loaded, not here.
    pub fn new(shape: EnvelopeShape) -> Self {
        Self {
            shape,
            trigger_on_time: 0.0,
            trigger_off_time: f64::NEG_INFINITY,
            note_on: false,
        }
    }

    /// Rebuild an envelope from previously recorded triggers
    pub fn from_parts(shape: EnvelopeShape, trigger_on_time: f64, trigger_off_time: f64, note_on: bool) -> Self {
        Self {
            shape,
            trigger_on_time,
            trigger_off_time,
            note_on,
        }
    }

    pub fn shape(&self) -> &EnvelopeShape {
        &self.shape
    }

    pub fn trigger_on_time(&self) -> f64 {
        self.trigger_on_time
    }

    pub fn trigger_off_time(&self) -> f64 {
        self.trigger_off_time
    }

    pub fn is_note_on(&self) -> bool {
        self.note_on
    }

    /// Start (or restart) the attack at `time`
    pub fn note_on(&mut self, time: f64) {
        self.trigger_on_time = time;
        self.note_on = true;
    }

    /// Start the release at `time`
    pub fn note_off(&mut self, time: f64) {
        self.trigger_off_time = time;
        self.note_on = false;
    }

    /// Which phase applies at `time`
    pub fn phase(&self, time: f64) -> EnvelopePhase {
        if !self.note_on {
            return EnvelopePhase::Release;
        }

        let life = time - self.trigger_on_time;
        if life <= self.shape.attack {
            EnvelopePhase::Attack
        } else if life <= self.shape.attack + self.shape.decay {
            EnvelopePhase::Decay
        } else {
            EnvelopePhase::Sustain
        }
    }

    /// Amplitude multiplier at `time`
    pub fn amplitude(&self, time: f64) -> f64 {
        let s = &self.shape;
        let life = time - self.trigger_on_time;

        let amplitude = match self.phase(time) {
            EnvelopePhase::Attack => (life / s.attack) * s.start_amplitude,
            EnvelopePhase::Decay => {
                ((life - s.attack) / s.decay) * (s.sustain_amplitude - s.start_amplitude) + s.start_amplitude
            }
            EnvelopePhase::Sustain => s.sustain_amplitude,
            // Unclamped line; goes negative once the release has run out
            EnvelopePhase::Release => {
                ((time - self.trigger_off_time) / s.release) * -s.sustain_amplitude + s.sustain_amplitude
            }
        };

        if amplitude <= AMPLITUDE_FLOOR {
            0.0
        } else {
            amplitude
        }
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(EnvelopeShape::default())
    }
}
