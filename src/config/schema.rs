//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for Keytone
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KeytoneConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Synthesis settings
    #[serde(default)]
    pub synth: SynthConfig,
}

impl KeytoneConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate < 8000.0 || self.audio.sample_rate > 192000.0 {
            bail!("Sample rate must be between 8000 and 192000");
        }
        if !matches!(self.audio.bits_per_sample, 8 | 16 | 24 | 32) {
            bail!("Bits per sample must be 8, 16, 24 or 32");
        }
        if self.audio.buffer_size < 64 || self.audio.buffer_size > 8192 {
            bail!("Buffer size must be between 64 and 8192 bytes");
        }
        if self.audio.buffer_size % self.audio.bytes_per_sample() != 0 {
            bail!("Buffer size must be a whole number of samples");
        }

        if self.synth.key_amplitude <= 0.0 || self.synth.key_amplitude > 1.0 {
            bail!("Key amplitude must be in (0.0, 1.0]");
        }
        if self.synth.attack_ticks < 1 || self.synth.attack_ticks > 64 {
            bail!("Attack window must be between 1 and 64 ticks");
        }
        if self.synth.release_ticks < 1 || self.synth.release_ticks > 64 {
            bail!("Release window must be between 1 and 64 ticks");
        }

        Ok(())
    }
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,

    /// Bits per PCM sample (default: 16)
    #[serde(default = "default_bits_per_sample")]
    pub bits_per_sample: u16,

    /// Buffer size in bytes (default: 1024)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// PCM byte order (default: little)
    #[serde(default)]
    pub endianness: Endianness,
}

impl AudioConfig {
    /// Bytes occupied by one encoded sample
    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample / 8)
    }

    /// Samples held by one buffer
    pub fn samples_per_buffer(&self) -> usize {
        self.buffer_size / self.bytes_per_sample()
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            bits_per_sample: default_bits_per_sample(),
            buffer_size: default_buffer_size(),
            endianness: Endianness::default(),
        }
    }
}

fn default_sample_rate() -> f64 {
    44100.0
}
fn default_bits_per_sample() -> u16 {
    16
}
fn default_buffer_size() -> usize {
    1024
}

/// PCM byte order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

/// Synthesis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthConfig {
    /// Per-key amplitude 0.0-1.0 (default: 0.2, five full-volume keys
    /// before polyphony normalization engages)
    #[serde(default = "default_key_amplitude")]
    pub key_amplitude: f64,

    /// Attack window in buffer ticks (default: 1)
    #[serde(default = "default_window_ticks")]
    pub attack_ticks: u32,

    /// Release window in buffer ticks (default: 1)
    #[serde(default = "default_window_ticks")]
    pub release_ticks: u32,

    /// Envelope curve shape (default: linear)
    #[serde(default)]
    pub curve: CurveKind,

    /// Starting base octave (default: 3)
    #[serde(default = "default_base_octave")]
    pub base_octave: i32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            key_amplitude: default_key_amplitude(),
            attack_ticks: default_window_ticks(),
            release_ticks: default_window_ticks(),
            curve: CurveKind::default(),
            base_octave: default_base_octave(),
        }
    }
}

fn default_key_amplitude() -> f64 {
    0.2
}
fn default_window_ticks() -> u32 {
    1
}
fn default_base_octave() -> i32 {
    3
}

/// Envelope curve shapes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// Straight-line ramps (default)
    #[default]
    Linear,
    /// Half-life curves
    Exponential,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_audio_config() {
        let yaml = "sample_rate: 48000";
        let config: AudioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sample_rate, 48000.0);
        assert_eq!(config.bits_per_sample, 16); // default
        assert_eq!(config.buffer_size, 1024); // default
        assert_eq!(config.endianness, Endianness::Little); // default
    }

    #[test]
    fn test_derived_sample_counts() {
        let config = AudioConfig::default();
        assert_eq!(config.bytes_per_sample(), 2);
        assert_eq!(config.samples_per_buffer(), 512);
    }

    #[test]
    fn test_synth_config_defaults() {
        let config: SynthConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.key_amplitude, 0.2);
        assert_eq!(config.attack_ticks, 1);
        assert_eq!(config.release_ticks, 1);
        assert_eq!(config.curve, CurveKind::Linear);
        assert_eq!(config.base_octave, 3);
    }

    #[test]
    fn test_curve_kind_parsing() {
        let yaml = "curve: exponential";
        let config: SynthConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.curve, CurveKind::Exponential);
    }

    #[test]
    fn test_validation_accepts_defaults() {
        assert!(KeytoneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_odd_buffer() {
        let mut config = KeytoneConfig::default();
        config.audio.buffer_size = 1023;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_bit_depth() {
        let mut config = KeytoneConfig::default();
        config.audio.bits_per_sample = 12;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_amplitude() {
        let mut config = KeytoneConfig::default();
        config.synth.key_amplitude = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_release_window() {
        let mut config = KeytoneConfig::default();
        config.synth.release_ticks = 0;
        assert!(config.validate().is_err());
    }
}
