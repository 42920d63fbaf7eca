//! CLI interface for Keytone

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Polyphonic additive synthesizer played from the computer keyboard
#[derive(Parser)]
#[command(name = "keytone")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play live from the keyboard
    Play {
        /// Configuration file path
        #[arg(short, long, default_value = "keytone.yaml")]
        config: PathBuf,
    },

    /// Render a chord to a WAV file
    Render {
        /// Configuration file path
        #[arg(short, long, default_value = "keytone.yaml")]
        config: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Notes to hold, comma separated (e.g. "C,E,G" or "A.1,C#.0")
        #[arg(short, long, default_value = "C,E,G")]
        notes: String,

        /// How long to hold the chord, in seconds
        #[arg(short, long, default_value = "2.0")]
        duration: f64,
    },

    /// List available audio output devices
    Devices,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "keytone.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}
