//! Additive waveform synthesis from the active note set.

use std::f64::consts::PI;

use crate::config::{CurveKind, KeytoneConfig};

use super::modulator::{ExponentialModulator, LinearModulator, Modulator};
use super::tracker::ActiveNotes;

/// Turns the active note set into buffers of floating-point samples by
/// summing one enveloped cosine per note.
///
/// Owns the global phase counter; it advances exactly one step per emitted
/// sample so the summed waveform stays continuous from buffer to buffer,
/// and resets to zero whenever the active set empties.
pub struct Synthesizer {
    sample_rate: f64,
    samples_per_buffer: usize,
    key_amplitude: f64,
    modulator: Box<dyn Modulator>,
    phase: u64,
}

impl Synthesizer {
    /// Create a synthesizer from the audio and synth configuration
    pub fn new(config: &KeytoneConfig) -> Self {
        let samples_per_buffer = config.audio.samples_per_buffer();
        let modulator: Box<dyn Modulator> = match config.synth.curve {
            CurveKind::Linear => Box::new(LinearModulator::new(
                config.synth.attack_ticks,
                config.synth.release_ticks,
                samples_per_buffer,
            )),
            CurveKind::Exponential => Box::new(ExponentialModulator::new(
                config.synth.attack_ticks,
                config.synth.release_ticks,
                samples_per_buffer,
            )),
        };

        Self {
            sample_rate: config.audio.sample_rate,
            samples_per_buffer,
            key_amplitude: config.synth.key_amplitude,
            modulator,
            phase: 0,
        }
    }

    /// Generate one buffer tick of samples for the current active notes.
    pub fn synthesize(&mut self, active: &ActiveNotes, base_octave: i32) -> Vec<f32> {
        let mut samples = vec![0.0f32; self.samples_per_buffer];

        if active.is_empty() {
            // Silence resets continuity state; the next sound starts its
            // cosines at phase zero under a zero envelope.
            self.phase = 0;
            return samples;
        }

        let amplitude = self.effective_amplitude(active.len());

        for (i, out) in samples.iter_mut().enumerate() {
            let seconds = self.phase as f64 / self.sample_rate;
            self.phase += 1;

            let mut sample = 0.0f64;
            for (note, state) in active.iter() {
                let shaped = amplitude * self.modulator.modulate(i, state);
                sample += shaped * (2.0 * PI * note.frequency(base_octave) * seconds).cos();
            }
            *out = sample as f32;
        }

        samples
    }

    /// Per-note amplitude, scaled down once polyphony would push the summed
    /// peaks past full scale.
    fn effective_amplitude(&self, voices: usize) -> f64 {
        if voices as f64 > 1.0 / self.key_amplitude {
            1.0 / voices as f64
        } else {
            self.key_amplitude
        }
    }

    /// Current value of the global phase counter
    pub fn phase(&self) -> u64 {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeytoneConfig;
    use crate::pitch::Note;
    use std::collections::HashSet;

    fn config(buffer_size: usize, key_amplitude: f64) -> KeytoneConfig {
        let mut config = KeytoneConfig::default();
        config.audio.buffer_size = buffer_size;
        config.synth.key_amplitude = key_amplitude;
        config
    }

    fn press(active: &mut ActiveNotes, names: &[&str]) {
        let pressed: HashSet<Note> = names.iter().map(|n| Note::new(n, 0).unwrap()).collect();
        active.update(&pressed);
    }

    #[test]
    fn test_empty_set_yields_silence_and_phase_reset() {
        let mut synth = Synthesizer::new(&config(1024, 0.2));
        let mut active = ActiveNotes::new(1, 1);

        press(&mut active, &["A"]);
        synth.synthesize(&active, 3);
        assert!(synth.phase() > 0);

        let empty = ActiveNotes::new(1, 1);
        let samples = synth.synthesize(&empty, 3);
        assert!(samples.iter().all(|&s| s == 0.0));
        assert_eq!(synth.phase(), 0);
    }

    #[test]
    fn test_phase_advances_one_buffer_per_tick() {
        let mut synth = Synthesizer::new(&config(1024, 0.2));
        let mut active = ActiveNotes::new(8, 8);
        press(&mut active, &["C"]);

        synth.synthesize(&active, 3);
        assert_eq!(synth.phase(), 512);
        synth.synthesize(&active, 3);
        assert_eq!(synth.phase(), 1024);
    }

    #[test]
    fn test_first_tick_attack_ramp() {
        // Four-sample buffer, one-tick attack: the envelope walks
        // 0, 0.25, 0.5, 0.75 across the buffer.
        let mut config = config(8, 0.2);
        config.audio.sample_rate = 44100.0;
        let mut synth = Synthesizer::new(&config);

        let mut active = ActiveNotes::new(1, 1);
        press(&mut active, &["A"]);

        let samples = synth.synthesize(&active, 3);
        assert_eq!(samples.len(), 4);

        let freq = Note::new("A", 0).unwrap().frequency(3);
        for (i, &sample) in samples.iter().enumerate() {
            let seconds = i as f64 / 44100.0;
            let expected = 0.2 * (i as f64 / 4.0) * (2.0 * PI * freq * seconds).cos();
            assert!(
                (f64::from(sample) - expected).abs() < 1e-6,
                "sample {}: {} vs {}",
                i,
                sample,
                expected
            );
        }
        assert_eq!(samples[0], 0.0);
    }

    #[test]
    fn test_effective_amplitude_normalizes_polyphony() {
        let synth = Synthesizer::new(&config(1024, 0.2));
        // Up to five full-amplitude notes fit under 1.0.
        assert_eq!(synth.effective_amplitude(1), 0.2);
        assert_eq!(synth.effective_amplitude(5), 0.2);
        assert_eq!(synth.effective_amplitude(6), 1.0 / 6.0);
        assert_eq!(synth.effective_amplitude(10), 0.1);
    }

    #[test]
    fn test_many_notes_never_clip() {
        let mut synth = Synthesizer::new(&config(1024, 0.2));
        let mut active = ActiveNotes::new(1, 1);
        let names = ["C", "D", "E", "F", "G", "A", "B", "C#"];

        press(&mut active, &names);
        for _ in 0..8 {
            // Extra ticks drive every envelope to full sustain.
            press(&mut active, &names);
            let samples = synth.synthesize(&active, 3);
            for &sample in &samples {
                assert!(sample.abs() <= 1.0, "clipped sample {}", sample);
            }
        }
    }

    #[test]
    fn test_deterministic_output() {
        let make = || {
            let mut synth = Synthesizer::new(&config(256, 0.2));
            let mut active = ActiveNotes::new(2, 2);
            press(&mut active, &["E", "G#"]);
            let mut out = synth.synthesize(&active, 3);
            press(&mut active, &["E", "G#"]);
            out.extend(synth.synthesize(&active, 3));
            out
        };

        assert_eq!(make(), make());
    }

    #[test]
    fn test_waveform_continuous_across_buffers() {
        // With a sustained note, the gap between the last sample of one
        // buffer and the first of the next stays in line with the in-buffer
        // sample-to-sample steps.
        let mut config = config(512, 0.2);
        config.audio.sample_rate = 44100.0;
        let mut synth = Synthesizer::new(&config);
        let mut active = ActiveNotes::new(1, 1);

        press(&mut active, &["A"]);
        press(&mut active, &["A"]); // sustained from here on

        let first = synth.synthesize(&active, 3);
        press(&mut active, &["A"]);
        let second = synth.synthesize(&active, 3);

        let boundary = (f64::from(second[0]) - f64::from(first[first.len() - 1])).abs();
        let max_step = first
            .windows(2)
            .map(|w| (f64::from(w[1]) - f64::from(w[0])).abs())
            .fold(0.0f64, f64::max);
        assert!(boundary <= max_step * 1.5, "{} > {}", boundary, max_step);
    }
}
