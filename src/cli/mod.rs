//! CLI interface for Monosynth

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Monophonic additive synthesizer played from the computer keyboard
#[derive(Parser)]
#[command(name = "monosynth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play the synth from the keyboard (and optionally a MIDI port)
    Play {
        /// Configuration file path (defaults apply if it does not exist)
        #[arg(short, long, default_value = "monosynth.yaml")]
        config: PathBuf,

        /// Listen on the MIDI input port whose name contains this text
        #[arg(short, long)]
        midi: Option<String>,

        /// Built-in patch to play, overriding the config
        #[arg(short, long)]
        patch: Option<String>,

        /// Run without the terminal UI; notes come from MIDI only
        #[arg(long)]
        no_tui: bool,
    },

    /// List available audio output devices
    Devices,

    /// List available MIDI input ports
    MidiPorts,

    /// List the built-in patches
    Patches,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "monosynth.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}
