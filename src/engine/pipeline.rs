//! Timed producer/consumer streaming pipeline.
//!
//! A generator thread turns the pressed-key state into encoded PCM buffers
//! on a fixed cadence; a writer thread drains them into the audio sink,
//! bounded by whatever the sink can currently accept.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, RecvTimeoutError};

use crate::config::KeytoneConfig;
use crate::pcm::PcmEncoder;
use crate::synth::{ActiveNotes, Synthesizer};
use crate::tui::SampleBuffer;

use super::keyboard::Keyboard;
use super::sink::AudioSink;
use super::SinkError;

/// Encoded buffers that may queue between the generator and the writer.
const QUEUE_CAPACITY: usize = 8;

/// How long the writer blocks on an empty queue before rechecking the stop
/// flag, keeping shutdown responsive.
const WRITER_POLL: Duration = Duration::from_millis(100);

/// Slack subtracted from the tick period. Generating slightly faster than
/// real time keeps the sink from underrunning; the sink's own capacity
/// check stops the surplus from accumulating.
const CADENCE_SLACK: Duration = Duration::from_millis(1);

/// Handle to the two running pipeline stages.
pub struct Pipeline {
    stop: Arc<AtomicBool>,
    generator: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

impl Pipeline {
    /// Start the pipeline against the given keyboard and sink.
    ///
    /// `open_sink` runs on the writer thread (cpal streams cannot move
    /// between threads); an open or start failure is returned here and no
    /// stage is left running.
    pub fn start<S, F>(
        config: KeytoneConfig,
        keyboard: Arc<Keyboard>,
        open_sink: F,
    ) -> Result<Self, SinkError>
    where
        S: AudioSink,
        F: FnOnce() -> Result<S, SinkError> + Send + 'static,
    {
        Self::start_with_viz(config, keyboard, None, open_sink)
    }

    /// Start the pipeline, additionally mirroring generated samples into a
    /// visualization buffer.
    pub fn start_with_viz<S, F>(
        config: KeytoneConfig,
        keyboard: Arc<Keyboard>,
        viz_buffer: Option<Arc<Mutex<SampleBuffer>>>,
        open_sink: F,
    ) -> Result<Self, SinkError>
    where
        S: AudioSink,
        F: FnOnce() -> Result<S, SinkError> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let (buffer_tx, buffer_rx) = bounded::<Vec<u8>>(QUEUE_CAPACITY);
        let (ready_tx, ready_rx) = bounded::<Result<(), SinkError>>(1);

        let writer = {
            let stop = stop.clone();
            thread::spawn(move || {
                let mut sink = match open_sink().and_then(|mut sink| {
                    sink.start()?;
                    Ok(sink)
                }) {
                    Ok(sink) => {
                        let _ = ready_tx.send(Ok(()));
                        sink
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while !stop.load(Ordering::SeqCst) {
                    match buffer_rx.recv_timeout(WRITER_POLL) {
                        Ok(buffer) => {
                            let len = buffer.len().min(sink.available());
                            // Whatever the sink does not take is dropped,
                            // never retried: an occasional dropout is the
                            // price of staying real-time instead of growing
                            // a backlog.
                            if let Err(e) = sink.write(&buffer, 0, len) {
                                eprintln!("Sink write failed: {}", e);
                            }
                        }
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                if let Err(e) = sink.flush() {
                    eprintln!("Sink flush failed: {}", e);
                }
                if let Err(e) = sink.close() {
                    eprintln!("Sink close failed: {}", e);
                }
            })
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = writer.join();
                return Err(e);
            }
            Err(_) => {
                let _ = writer.join();
                return Err(SinkError::Closed);
            }
        }

        let generator = {
            let stop = stop.clone();
            thread::spawn(move || {
                let mut active =
                    ActiveNotes::new(config.synth.attack_ticks, config.synth.release_ticks);
                let mut synthesizer = Synthesizer::new(&config);
                let encoder =
                    PcmEncoder::new(config.audio.bits_per_sample, config.audio.endianness);
                let period = tick_period(&config);

                let mut deadline = Instant::now() + period;
                loop {
                    let now = Instant::now();
                    if now < deadline {
                        thread::sleep(deadline - now);
                    }
                    deadline = Instant::now() + period;

                    if stop.load(Ordering::SeqCst) {
                        break;
                    }

                    let pressed = keyboard.pressed();
                    if pressed.is_empty() && active.is_empty() {
                        continue;
                    }

                    active.update(&pressed);
                    let samples = synthesizer.synthesize(&active, keyboard.octave());

                    if let Some(viz) = &viz_buffer {
                        if let Ok(mut buffer) = viz.try_lock() {
                            for &sample in &samples {
                                buffer.push(sample);
                            }
                        }
                    }

                    // A full queue means the writer is behind; drop the
                    // tick rather than stall the cadence.
                    let _ = buffer_tx.try_send(encoder.encode(&samples));
                }
            })
        };

        Ok(Self {
            stop,
            generator: Some(generator),
            writer: Some(writer),
        })
    }

    /// Whether both stages are still running
    pub fn is_running(&self) -> bool {
        !self.stop.load(Ordering::SeqCst) && self.generator.is_some()
    }

    /// Stop both stages and wait for an ordered shutdown: the generator
    /// first, so nothing new is produced, then the writer, which flushes
    /// and closes the sink on its own thread before exiting. Any buffers
    /// still queued are abandoned.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.generator.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.writer.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Cadence of the generator stage: the real-time duration of one buffer,
/// less a little slack.
fn tick_period(config: &KeytoneConfig) -> Duration {
    let millis = config.audio.samples_per_buffer() as f64 / config.audio.sample_rate * 1000.0;
    Duration::from_millis(millis as u64).saturating_sub(CADENCE_SLACK)
}
