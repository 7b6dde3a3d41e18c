//! Built-in additive patches
//!
//! A patch is a fixed list of partials, each an oscillator running at a
//! multiple of the voice frequency. Patches are compiled in; they can be
//! selected by name but not edited at runtime.

use super::oscillator::{oscillate, Waveform};

/// One oscillator in a patch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partial {
    /// Frequency multiple of the voice's fundamental
    pub ratio: f64,
    pub waveform: Waveform,
}

impl Partial {
    pub const fn new(ratio: f64, waveform: Waveform) -> Self {
        Self { ratio, waveform }
    }
}

/// A named, fixed oscillator mix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Patch {
    pub name: &'static str,
    pub partials: &'static [Partial],
}

/// Saw fundamental, sine octave, triangle twelfth
pub const ADDITIVE: Patch = Patch {
    name: "additive",
    partials: &[
        Partial::new(1.0, Waveform::Saw),
        Partial::new(2.0, Waveform::Sine),
        Partial::new(3.0, Waveform::Triangle),
    ],
};

pub const SINE: Patch = Patch {
    name: "sine",
    partials: &[Partial::new(1.0, Waveform::Sine)],
};

pub const SQUARE: Patch = Patch {
    name: "square",
    partials: &[Partial::new(1.0, Waveform::Square)],
};

/// Drawbar-style stack of sines
pub const ORGAN: Patch = Patch {
    name: "organ",
    partials: &[
        Partial::new(0.5, Waveform::Sine),
        Partial::new(1.0, Waveform::Sine),
        Partial::new(2.0, Waveform::Sine),
        Partial::new(4.0, Waveform::Sine),
    ],
};

/// Every built-in patch, default first
pub const BUILTIN_PATCHES: [Patch; 4] = [ADDITIVE, SINE, SQUARE, ORGAN];

impl Patch {
    /// Look up a built-in patch by name
    pub fn by_name(name: &str) -> Option<Patch> {
        BUILTIN_PATCHES
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .copied()
    }

    /// Names of all built-in patches
    pub fn names() -> impl Iterator<Item = &'static str> {
        BUILTIN_PATCHES.iter().map(|p| p.name)
    }

    /// Unscaled sum of every partial at `frequency` and `time`
    pub fn mix(&self, frequency: f64, time: f64) -> f64 {
        self.partials
            .iter()
            .map(|p| oscillate(frequency * p.ratio, time, p.waveform))
            .sum()
    }
}

impl Default for Patch {
    fn default() -> Self {
        ADDITIVE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patch_is_additive() {
        let patch = Patch::default();
        assert_eq!(patch.name, "additive");
        assert_eq!(patch.partials.len(), 3);
    }

    #[test]
    fn test_additive_mix() {
        let f = 261.63;
        for i in 0..100 {
            let t = i as f64 * 0.000_123;
            let expected = oscillate(f, t, Waveform::Saw)
                + oscillate(f * 2.0, t, Waveform::Sine)
                + oscillate(f * 3.0, t, Waveform::Triangle);
            assert!((ADDITIVE.mix(f, t) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_patch_by_name() {
        assert_eq!(Patch::by_name("organ"), Some(ORGAN));
        assert_eq!(Patch::by_name("SINE"), Some(SINE));
        assert_eq!(Patch::by_name("kazoo"), None);
    }

    #[test]
    fn test_patch_names() {
        let names: Vec<_> = Patch::names().collect();
        assert_eq!(names, vec!["additive", "sine", "square", "organ"]);
    }
}
