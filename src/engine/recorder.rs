//! WAV file recorder
//!
//! Writes synthesized buffers to a WAV file at the configured PCM bit
//! depth, quantizing exactly as the live stream does.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::config::AudioConfig;
use crate::pcm::PcmEncoder;

/// WAV file recorder
pub struct Recorder {
    writer: WavWriter<BufWriter<File>>,
    encoder: PcmEncoder,
    bits_per_sample: u16,
    sample_rate: f64,
    samples_written: u64,
}

impl Recorder {
    /// Create a recorder writing mono integer samples in the configured
    /// format.
    pub fn new(path: &Path, config: &AudioConfig) -> Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: config.sample_rate as u32,
            bits_per_sample: config.bits_per_sample,
            sample_format: SampleFormat::Int,
        };

        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer,
            encoder: PcmEncoder::new(config.bits_per_sample, config.endianness),
            bits_per_sample: config.bits_per_sample,
            sample_rate: config.sample_rate,
            samples_written: 0,
        })
    }

    /// Get the number of samples written
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Get the duration recorded in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples_written as f64 / self.sample_rate
    }

    /// Write a buffer of samples
    pub fn write_buffer(&mut self, buffer: &[f32]) -> Result<()> {
        for &sample in buffer {
            let value = self.encoder.quantize(sample);
            match self.bits_per_sample {
                8 => self.writer.write_sample(value as i8),
                16 => self.writer.write_sample(value as i16),
                _ => self.writer.write_sample(value as i32),
            }
            .context("failed to write sample")?;
        }
        self.samples_written += buffer.len() as u64;
        Ok(())
    }

    /// Finalize the WAV file
    ///
    /// This must be called to properly close the file and write the header.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize().context("failed to finalize WAV file")
    }
}
