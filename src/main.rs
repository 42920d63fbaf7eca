//! Keytone - polyphonic additive synthesis from the computer keyboard

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::Parser;
use cpal::traits::{DeviceTrait, HostTrait};

use keytone::config;
use keytone::engine::{CpalSink, Keyboard, Pipeline, Recorder};
use keytone::pitch::Note;
use keytone::synth::{ActiveNotes, Synthesizer};
use keytone::tui::{self, SampleBuffer};

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play { config: config_path } => {
            println!("Loading configuration from {:?}...", config_path);
            let cfg = config::load_config(&config_path)?;

            println!("Starting Keytone...");
            println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
            println!(
                "  Buffer size: {} bytes ({} samples)",
                cfg.audio.buffer_size,
                cfg.audio.samples_per_buffer()
            );
            println!(
                "  Envelope: {:?}, attack {} / release {} ticks",
                cfg.synth.curve, cfg.synth.attack_ticks, cfg.synth.release_ticks
            );

            let keyboard = Arc::new(Keyboard::new(cfg.synth.base_octave));
            let viz = Arc::new(Mutex::new(SampleBuffer::new(4096)));

            let audio = cfg.audio.clone();
            let mut pipeline = Pipeline::start_with_viz(
                cfg,
                keyboard.clone(),
                Some(viz.clone()),
                move || CpalSink::open(&audio),
            )?;

            let ui_result = tui::run(&keyboard, &viz);
            pipeline.stop();
            ui_result?;

            println!("Stopped.");
        }

        Commands::Render {
            config: config_path,
            output,
            notes,
            duration,
        } => {
            println!("Loading configuration from {:?}...", config_path);
            let cfg = config::load_config(&config_path)?;

            let notes = notes
                .split(',')
                .map(|spec| spec.trim().parse::<Note>())
                .collect::<Result<Vec<_>, _>>()?;
            let pressed: HashSet<Note> = notes.iter().cloned().collect();

            println!(
                "Rendering [{}] for {:.1}s to {:?}...",
                notes
                    .iter()
                    .map(Note::to_string)
                    .collect::<Vec<_>>()
                    .join("  "),
                duration,
                output
            );

            let mut active = ActiveNotes::new(cfg.synth.attack_ticks, cfg.synth.release_ticks);
            let mut synthesizer = Synthesizer::new(&cfg);
            let mut recorder = Recorder::new(&output, &cfg.audio)?;

            let samples_per_buffer = cfg.audio.samples_per_buffer();
            let hold_ticks =
                ((duration * cfg.audio.sample_rate) / samples_per_buffer as f64).ceil() as u64;
            let ticks_per_second =
                (cfg.audio.sample_rate / samples_per_buffer as f64).max(1.0) as u64;
            let nothing = HashSet::new();

            let mut tick: u64 = 0;
            loop {
                let held = tick < hold_ticks;
                if !held && active.is_empty() {
                    break;
                }

                active.update(if held { &pressed } else { &nothing });
                let samples = synthesizer.synthesize(&active, cfg.synth.base_octave);
                recorder.write_buffer(&samples)?;

                if tick % ticks_per_second == 0 {
                    print!("\r  Progress: {:.1}s / {:.1}s", recorder.duration_secs(), duration);
                    use std::io::Write;
                    std::io::stdout().flush()?;
                }
                tick += 1;
            }

            let seconds = recorder.duration_secs();
            let samples_written = recorder.samples_written();
            recorder.finalize()?;
            println!("\nWrote {:.2}s ({} samples) to {:?}", seconds, samples_written, output);
        }

        Commands::Devices => {
            println!("Available audio output devices:\n");

            let host = cpal::default_host();

            if let Some(device) = host.default_output_device() {
                println!("Default output: {}", device.name().unwrap_or_default());
                if let Ok(config) = device.default_output_config() {
                    println!(
                        "  Sample rate: {} Hz, Channels: {}",
                        config.sample_rate().0,
                        config.channels()
                    );
                }
                println!();
            }

            match host.output_devices() {
                Ok(devices) => {
                    for device in devices {
                        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
                        print!("  - {}", name);

                        if let Ok(config) = device.default_output_config() {
                            print!(
                                " ({} Hz, {} ch)",
                                config.sample_rate().0,
                                config.channels()
                            );
                        }
                        println!();
                    }
                }
                Err(e) => {
                    println!("  Error listing devices: {}", e);
                }
            }
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    println!("  Bits per sample: {}", cfg.audio.bits_per_sample);
                    println!(
                        "  Buffer size: {} bytes ({} samples)",
                        cfg.audio.buffer_size,
                        cfg.audio.samples_per_buffer()
                    );
                    println!("  Endianness: {:?}", cfg.audio.endianness);
                    println!("  Key amplitude: {:.2}", cfg.synth.key_amplitude);
                    println!(
                        "  Envelope: {:?}, attack {} / release {} ticks",
                        cfg.synth.curve, cfg.synth.attack_ticks, cfg.synth.release_ticks
                    );
                    println!("  Base octave: {}", cfg.synth.base_octave);
                }
                Err(e) => {
                    println!("Configuration is invalid: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let example_config = include_str!("../keytone.example.yaml");

            let path = "keytone.yaml";
            if std::path::Path::new(path).exists() {
                println!("keytone.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, example_config)?;
                println!("Created keytone.yaml with example configuration.");
            }
        }
    }

    Ok(())
}
