//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::synth::{EnvelopeShape, Patch, MASTER_VOLUME};

/// Reasons a configuration is rejected
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("sample rate must be between 8000 and 192000, got {0}")]
    SampleRate(u32),

    #[error("buffer size must be between 64 and 8192, got {0}")]
    BufferSize(u32),

    #[error("envelope {name} time must be positive, got {value}")]
    Duration { name: &'static str, value: f64 },

    #[error("envelope {name} amplitude must be between 0.0 and 1.0, got {value}")]
    Amplitude { name: &'static str, value: f64 },

    #[error("sustain amplitude {sustain} exceeds start amplitude {start}")]
    SustainAboveStart { sustain: f64, start: f64 },

    #[error("volume must be between 0.0 and 1.0, got {0}")]
    Volume(f64),

    #[error("base frequency must be positive, got {0}")]
    BaseFrequency(f64),

    #[error("unknown patch '{0}'")]
    UnknownPatch(String),

    #[error("MIDI base note must be 0-127, got {0}")]
    BaseNote(u8),
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Audio output settings
    pub audio: AudioConfig,

    /// Amplitude envelope
    pub envelope: EnvelopeConfig,

    /// Patch, volume and tuning
    pub voice: VoiceConfig,

    /// Computer keyboard control
    pub keyboard: KeyboardConfig,

    /// MIDI input
    pub midi: MidiConfig,
}

impl SynthConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(8000..=192_000).contains(&self.audio.sample_rate) {
            return Err(ConfigError::SampleRate(self.audio.sample_rate));
        }
        if !(64..=8192).contains(&self.audio.buffer_size) {
            return Err(ConfigError::BufferSize(self.audio.buffer_size));
        }

        self.envelope.validate()?;

        if !(0.0..=1.0).contains(&self.voice.volume) {
            return Err(ConfigError::Volume(self.voice.volume));
        }
        if !(self.voice.base_frequency > 0.0) {
            return Err(ConfigError::BaseFrequency(self.voice.base_frequency));
        }
        if Patch::by_name(&self.voice.patch).is_none() {
            return Err(ConfigError::UnknownPatch(self.voice.patch.clone()));
        }

        if self.midi.base_note > 127 {
            return Err(ConfigError::BaseNote(self.midi.base_note));
        }

        Ok(())
    }

    /// The selected built-in patch, falling back to the default
    pub fn patch(&self) -> Patch {
        Patch::by_name(&self.voice.patch).unwrap_or_default()
    }
}

/// Audio output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 44100)
    pub sample_rate: u32,

    /// Buffer size in frames (default: 512)
    pub buffer_size: u32,

    /// Output device name (None = default device)
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: 512,
            device: None,
        }
    }
}

/// Envelope timing in seconds and levels in 0.0-1.0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    pub attack: f64,
    pub decay: f64,
    pub release: f64,
    pub start_amplitude: f64,
    pub sustain_amplitude: f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        EnvelopeShape::default().into()
    }
}

impl EnvelopeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("attack", self.attack), ("decay", self.decay), ("release", self.release)] {
            // Also rejects NaN
            if !(value > 0.0) {
                return Err(ConfigError::Duration { name, value });
            }
        }

        for (name, value) in [("start", self.start_amplitude), ("sustain", self.sustain_amplitude)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Amplitude { name, value });
            }
        }

        if self.sustain_amplitude > self.start_amplitude {
            return Err(ConfigError::SustainAboveStart {
                sustain: self.sustain_amplitude,
                start: self.start_amplitude,
            });
        }

        Ok(())
    }

    pub fn shape(&self) -> EnvelopeShape {
        EnvelopeShape {
            attack: self.attack,
            decay: self.decay,
            release: self.release,
            start_amplitude: self.start_amplitude,
            sustain_amplitude: self.sustain_amplitude,
        }
    }
}

impl From<EnvelopeShape> for EnvelopeConfig {
    fn from(shape: EnvelopeShape) -> Self {
        Self {
            attack: shape.attack,
            decay: shape.decay,
            release: shape.release,
            start_amplitude: shape.start_amplitude,
            sustain_amplitude: shape.sustain_amplitude,
        }
    }
}

/// Voice settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Built-in patch name (default: additive)
    pub patch: String,

    /// Output scaling 0.0-1.0 (default: 0.4)
    pub volume: f64,

    /// Frequency of the lowest key in Hz (default: 261.63, middle C)
    pub base_frequency: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            patch: Patch::default().name.to_string(),
            volume: MASTER_VOLUME,
            base_frequency: 261.63,
        }
    }
}

/// Computer keyboard settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Restart the envelope on every key change, not just from silence
    pub retrigger: bool,

    /// How long a single key press counts as held without a release event
    /// (covers the terminal's initial auto-repeat delay)
    pub hold_ms: u64,

    /// How long a key counts as held after its last auto-repeat
    pub repeat_hold_ms: u64,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            retrigger: false,
            hold_ms: 550,
            repeat_hold_ms: 90,
        }
    }
}

/// MIDI input settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Listen for MIDI notes
    pub enabled: bool,

    /// Port name substring (None = first port)
    pub port: Option<String>,

    /// MIDI note that sounds at the base frequency (default: 60)
    pub base_note: u8,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: None,
            base_note: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SynthConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.envelope.shape(), EnvelopeShape::default());
        assert_eq!(config.voice.volume, 0.4);
        assert_eq!(config.patch().name, "additive");
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: SynthConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, SynthConfig::default());
    }

    #[test]
    fn test_partial_audio_config() {
        let yaml = "sample_rate: 48000";
        let config: AudioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_size, 512); // default
    }

    #[test]
    fn test_envelope_config() {
        let yaml = r#"
attack: 0.05
release: 0.3
sustain_amplitude: 0.5
"#;
        let config: EnvelopeConfig = serde_yaml::from_str(yaml).unwrap();
        let shape = config.shape();
        assert_eq!(shape.attack, 0.05);
        assert_eq!(shape.decay, 0.01);
        assert_eq!(shape.release, 0.3);
        assert_eq!(shape.start_amplitude, 1.0);
        assert_eq!(shape.sustain_amplitude, 0.5);
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut config = SynthConfig::default();
        config.envelope.decay = 0.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Duration { name: "decay", value: 0.0 })
        );

        config.envelope.decay = 0.01;
        config.envelope.release = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Duration { name: "release", .. })));

        config.envelope.release = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_amplitude_rules() {
        let mut config = SynthConfig::default();
        config.envelope.start_amplitude = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Amplitude { name: "start", .. })));

        config.envelope.start_amplitude = 0.5;
        config.envelope.sustain_amplitude = 0.8;
        assert_eq!(
            config.validate(),
            Err(ConfigError::SustainAboveStart { sustain: 0.8, start: 0.5 })
        );
    }

    #[test]
    fn test_voice_rules() {
        let mut config = SynthConfig::default();
        config.voice.volume = 1.2;
        assert_eq!(config.validate(), Err(ConfigError::Volume(1.2)));

        config.voice.volume = 0.4;
        config.voice.base_frequency = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::BaseFrequency(0.0)));

        config.voice.base_frequency = 440.0;
        config.voice.patch = "kazoo".to_string();
        assert_eq!(config.validate(), Err(ConfigError::UnknownPatch("kazoo".to_string())));

        config.voice.patch = "organ".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(config.patch().name, "organ");
    }

    #[test]
    fn test_audio_rules() {
        let mut config = SynthConfig::default();
        config.audio.sample_rate = 4000;
        assert_eq!(config.validate(), Err(ConfigError::SampleRate(4000)));

        config.audio.sample_rate = 48000;
        config.audio.buffer_size = 16;
        assert_eq!(config.validate(), Err(ConfigError::BufferSize(16)));
    }

    #[test]
    fn test_midi_rules() {
        let mut config = SynthConfig::default();
        config.midi.base_note = 200;
        assert_eq!(config.validate(), Err(ConfigError::BaseNote(200)));
    }

    #[test]
    fn test_error_messages() {
        let err = ConfigError::Duration { name: "attack", value: 0.0 };
        assert_eq!(err.to_string(), "envelope attack time must be positive, got 0");
        assert_eq!(ConfigError::UnknownPatch("x".into()).to_string(), "unknown patch 'x'");
    }
}
