//! Monosynth - real-time monophonic additive synthesizer

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use cpal::traits::{DeviceTrait, HostTrait};
use monosynth::config::{self, SynthConfig, EXAMPLE_CONFIG};
use monosynth::engine::{list_midi_ports, Engine, MidiInputHandle, Player, Session};
use monosynth::synth::Patch;
use monosynth::viz::{self, SampleBuffer};

mod cli;

use cli::{Cli, Commands};

/// Samples kept for the scope
const SCOPE_SAMPLES: usize = 4096;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config: config_path,
            midi,
            patch,
            no_tui,
        } => {
            let mut cfg = config::load_or_default(&config_path)?;
            if let Some(name) = patch {
                cfg.voice.patch = name;
            }
            if let Some(port) = midi {
                cfg.midi.enabled = true;
                cfg.midi.port = Some(port);
            }
            cfg.validate()?;

            play(&cfg, no_tui)?;
        }

        Commands::Devices => {
            println!("Available audio devices:\n");

            let host = cpal::default_host();

            // Default output device
            if let Some(device) = host.default_output_device() {
                println!("Default output: {}", device.name().unwrap_or_default());
                if let Ok(config) = device.default_output_config() {
                    println!(
                        "  Sample rate: {} Hz, Channels: {}, Format: {:?}",
                        config.sample_rate().0,
                        config.channels(),
                        config.sample_format()
                    );
                }
                println!();
            }

            println!("Output devices:");
            let devices = monosynth::engine::list_output_devices();
            if devices.is_empty() {
                println!("  (none)");
            }
            for (name, config) in devices {
                println!("  - {} ({} Hz, {} ch)", name, config.sample_rate.0, config.channels);
            }
        }

        Commands::MidiPorts => {
            let ports = list_midi_ports()?;
            if ports.is_empty() {
                println!("No MIDI input ports found.");
            } else {
                println!("MIDI input ports:");
                for port in ports {
                    println!("  - {}", port);
                }
            }
        }

        Commands::Patches => {
            for name in Patch::names() {
                let patch = Patch::by_name(name).unwrap_or_default();
                let partials: Vec<String> = patch
                    .partials
                    .iter()
                    .map(|p| format!("{} {}x", p.waveform.name(), p.ratio))
                    .collect();
                println!("{:<10} {}", name, partials.join(" + "));
            }
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    println!("  Buffer size: {}", cfg.audio.buffer_size);
                    println!(
                        "  Envelope: A {}s  D {}s  S {:.2} (peak {:.2})  R {}s",
                        cfg.envelope.attack,
                        cfg.envelope.decay,
                        cfg.envelope.sustain_amplitude,
                        cfg.envelope.start_amplitude,
                        cfg.envelope.release
                    );
                    println!("  Patch: {}", cfg.voice.patch);
                    println!("  Volume: {:.0}%", cfg.voice.volume * 100.0);
                    println!("  Base frequency: {} Hz", cfg.voice.base_frequency);
                    println!(
                        "  MIDI: {}",
                        if cfg.midi.enabled { "[enabled]" } else { "[disabled]" }
                    );
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let path = Path::new("monosynth.yaml");
            if path.exists() {
                println!("monosynth.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, EXAMPLE_CONFIG)?;
                println!("Created monosynth.yaml with example configuration.");
            }
        }
    }

    Ok(())
}

fn play(cfg: &SynthConfig, no_tui: bool) -> Result<()> {
    let mut player = Player::open(&cfg.audio)?;
    let engine = Engine::new(cfg, player.sample_rate());
    let mut session = Session::new(engine.clone(), cfg);

    if cfg.midi.enabled {
        let handle = MidiInputHandle::connect(cfg.midi.port.as_deref())?;
        session.attach_midi(handle);
    }

    if no_tui {
        if session.midi_port().is_none() {
            bail!("--no-tui needs a MIDI input; pass --midi or enable midi in the config");
        }

        player.start(engine)?;
        run_headless(&mut session)?;
    } else {
        let samples = Arc::new(Mutex::new(SampleBuffer::new(SCOPE_SAMPLES)));
        player.start_with_viz(engine, Some(samples.clone()))?;
        viz::run_tui(&mut session, samples)?;
    }

    player.stop();
    Ok(())
}

/// MIDI-only control loop, runs until Ctrl-C
fn run_headless(session: &mut Session) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
        .context("failed to install Ctrl-C handler")?;

    println!(
        "Playing from MIDI port {}. Press Ctrl-C to stop.",
        session.midi_port().unwrap_or("?")
    );

    while running.load(Ordering::SeqCst) {
        session.tick(Instant::now());
        std::thread::sleep(Duration::from_millis(2));
    }

    Ok(())
}
