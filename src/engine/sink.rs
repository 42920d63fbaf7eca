//! Audio sink boundary and the cpal-backed output device.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, SampleRate, Stream, StreamConfig};

use crate::config::{AudioConfig, Endianness};

use super::SinkError;

/// The byte-oriented device contract the streaming pipeline writes into.
///
/// `write` accepts at most `available()` bytes and reports how many it
/// took; the caller owns what to do with the rest. `flush` discards any
/// queued-but-unplayed bytes; after `close` every call fails.
pub trait AudioSink {
    /// Begin playback
    fn start(&mut self) -> Result<(), SinkError>;

    /// Bytes the sink can currently accept without dropping
    fn available(&self) -> usize;

    /// Write up to `len` bytes of `buffer` starting at `offset`, returning
    /// how many were actually accepted
    fn write(&mut self, buffer: &[u8], offset: usize, len: usize) -> Result<usize, SinkError>;

    /// Discard queued data
    fn flush(&mut self) -> Result<(), SinkError>;

    /// Stop playback and release the device
    fn close(&mut self) -> Result<(), SinkError>;
}

/// Decode one signed PCM sample from its byte representation.
fn decode_sample(bytes: &[u8], endianness: Endianness, scale: f64) -> f32 {
    let mut value: i64 = 0;
    match endianness {
        Endianness::Little => {
            for (i, &byte) in bytes.iter().enumerate() {
                value |= i64::from(byte) << (8 * i);
            }
        }
        Endianness::Big => {
            for &byte in bytes {
                value = (value << 8) | i64::from(byte);
            }
        }
    }
    // Sign-extend from the sample width.
    let shift = 64 - bytes.len() as u32 * 8;
    value = (value << shift) >> shift;
    (value as f64 / scale) as f32
}

/// Sink backed by the default cpal output device.
///
/// Bridges the byte-oriented `AudioSink` contract onto cpal's pull-model
/// callback through an internal byte ring: `write` feeds the ring,
/// `available` reports its free space, and the device callback drains it,
/// decoding PCM back to floats and duplicating the mono signal across the
/// device's channels.
pub struct CpalSink {
    stream: Option<Stream>,
    ring: Arc<Mutex<VecDeque<u8>>>,
    capacity: usize,
    closed: bool,
}

impl CpalSink {
    /// Ring capacity, in generated buffers. Matches the line-buffer headroom
    /// the synthesizer's cadence is tuned against: enough to ride out
    /// scheduling jitter, small enough that latency stays inaudible.
    const BUFFERS_OF_HEADROOM: usize = 4;

    /// Open the default output device for the configured format.
    pub fn open(config: &AudioConfig) -> Result<Self, SinkError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(SinkError::NoDevice)?;

        let default_config = device
            .default_output_config()
            .map_err(|e| SinkError::UnsupportedFormat(e.to_string()))?;
        let sample_format = default_config.sample_format();
        let stream_config = StreamConfig {
            channels: default_config.channels(),
            sample_rate: SampleRate(config.sample_rate as u32),
            buffer_size: BufferSize::Default,
        };

        let ring = Arc::new(Mutex::new(VecDeque::new()));
        let stream = match sample_format {
            SampleFormat::F32 => {
                Self::build_stream::<f32>(&device, &stream_config, config, ring.clone())?
            }
            SampleFormat::I16 => {
                Self::build_stream::<i16>(&device, &stream_config, config, ring.clone())?
            }
            SampleFormat::U16 => {
                Self::build_stream::<u16>(&device, &stream_config, config, ring.clone())?
            }
            other => return Err(SinkError::UnsupportedFormat(format!("{:?}", other))),
        };

        Ok(Self {
            stream: Some(stream),
            ring,
            capacity: config.buffer_size * Self::BUFFERS_OF_HEADROOM,
            closed: false,
        })
    }

    fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>>(
        device: &Device,
        stream_config: &StreamConfig,
        config: &AudioConfig,
        ring: Arc<Mutex<VecDeque<u8>>>,
    ) -> Result<Stream, SinkError> {
        let channels = stream_config.channels as usize;
        let bytes_per_sample = config.bytes_per_sample();
        let endianness = config.endianness;
        let scale = ((1i64 << (config.bits_per_sample - 1)) - 1) as f64;

        let stream = device
            .build_output_stream(
                stream_config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let mut ring = match ring.try_lock() {
                        Ok(ring) => ring,
                        Err(_) => {
                            // Writer holds the lock; emit silence rather
                            // than blocking the audio thread.
                            for sample in data.iter_mut() {
                                *sample = T::from_sample(0.0f32);
                            }
                            return;
                        }
                    };

                    for frame in data.chunks_mut(channels) {
                        let sample = if ring.len() >= bytes_per_sample {
                            let mut raw = [0u8; 4];
                            for slot in raw.iter_mut().take(bytes_per_sample) {
                                *slot = ring.pop_front().unwrap_or(0);
                            }
                            decode_sample(&raw[..bytes_per_sample], endianness, scale)
                        } else {
                            0.0
                        };
                        for channel_sample in frame.iter_mut() {
                            *channel_sample = T::from_sample(sample);
                        }
                    }
                },
                |err| {
                    eprintln!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| SinkError::UnsupportedFormat(e.to_string()))?;

        Ok(stream)
    }
}

impl AudioSink for CpalSink {
    fn start(&mut self) -> Result<(), SinkError> {
        let stream = self.stream.as_ref().ok_or(SinkError::Closed)?;
        stream
            .play()
            .map_err(|e| SinkError::WriteFailed(format!("failed to start stream: {}", e)))
    }

    fn available(&self) -> usize {
        self.capacity.saturating_sub(self.ring.lock().unwrap().len())
    }

    fn write(&mut self, buffer: &[u8], offset: usize, len: usize) -> Result<usize, SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }

        let start = offset.min(buffer.len());
        let end = offset.saturating_add(len).min(buffer.len());
        let requested = &buffer[start..end];

        let mut ring = self.ring.lock().unwrap();
        let free = self.capacity.saturating_sub(ring.len());
        let accepted = requested.len().min(free);
        ring.extend(&requested[..accepted]);
        Ok(accepted)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.ring.lock().unwrap().clear();
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if let Some(stream) = self.stream.take() {
            let _ = stream.pause();
        }
        self.closed = true;
        Ok(())
    }
}
