//! Amplitude modulators that shape note attack and release.
//!
//! A modulator turns a sample's position within the current buffer plus the
//! note's tick counters into an amplitude factor in [0, 1]. The ramp index
//! `i + ticks * samples_per_buffer` advances by exactly one per sample,
//! including across buffer boundaries, which is what keeps key presses and
//! releases free of clicks.

use super::tracker::NoteState;

/// Trait for envelope curve implementations
pub trait Modulator: Send {
    /// Amplitude factor for the sample at `index` within the current buffer
    fn modulate(&self, index: usize, state: &NoteState) -> f64;
}

/// Straight-line attack and release ramps
pub struct LinearModulator {
    attack_ticks: u32,
    release_ticks: u32,
    samples_per_buffer: usize,
}

impl LinearModulator {
    pub fn new(attack_ticks: u32, release_ticks: u32, samples_per_buffer: usize) -> Self {
        Self {
            attack_ticks,
            release_ticks,
            samples_per_buffer,
        }
    }

    fn rising(&self, index: usize, ticks: u32) -> f64 {
        let n = self.samples_per_buffer as f64;
        (index as f64 + f64::from(ticks) * n) / (n * f64::from(self.attack_ticks))
    }

    fn falling(&self, index: usize, ticks: u32) -> f64 {
        let n = self.samples_per_buffer as f64;
        1.0 - (index as f64 + f64::from(ticks) * n) / (n * f64::from(self.release_ticks))
    }
}

impl Modulator for LinearModulator {
    fn modulate(&self, index: usize, state: &NoteState) -> f64 {
        if state.released() {
            self.falling(index, state.ticks_released())
        } else if state.ticks_pressed() < self.attack_ticks {
            self.rising(index, state.ticks_pressed())
        } else {
            1.0
        }
    }
}

/// Half-life curves: `1 - 0.5^e` on attack, `0.5^e` on release, where `e`
/// is the ramp position normalized to the window length.
pub struct ExponentialModulator {
    attack_ticks: u32,
    release_ticks: u32,
    samples_per_buffer: usize,
}

impl ExponentialModulator {
    const BASE: f64 = 0.5;

    pub fn new(attack_ticks: u32, release_ticks: u32, samples_per_buffer: usize) -> Self {
        Self {
            attack_ticks,
            release_ticks,
            samples_per_buffer,
        }
    }

    fn rising(&self, index: usize, ticks: u32) -> f64 {
        let n = self.samples_per_buffer as f64;
        let exponent = (index as f64 + f64::from(ticks) * n) / (n * f64::from(self.attack_ticks));
        1.0 - Self::BASE.powf(exponent)
    }

    fn falling(&self, index: usize, ticks: u32) -> f64 {
        let n = self.samples_per_buffer as f64;
        let exponent = (index as f64 + f64::from(ticks) * n) / (n * f64::from(self.release_ticks));
        Self::BASE.powf(exponent)
    }
}

impl Modulator for ExponentialModulator {
    fn modulate(&self, index: usize, state: &NoteState) -> f64 {
        if state.released() {
            self.falling(index, state.ticks_released())
        } else if state.ticks_pressed() < self.attack_ticks {
            self.rising(index, state.ticks_pressed())
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 256;

    fn attacking(ticks: u32) -> NoteState {
        NoteState::with(false, ticks, 0)
    }

    fn releasing(ticks: u32) -> NoteState {
        NoteState::with(true, 0, ticks)
    }

    #[test]
    fn test_linear_attack_ramp() {
        let m = LinearModulator::new(1, 1, 4);
        let state = attacking(0);

        assert_eq!(m.modulate(0, &state), 0.0);
        assert_eq!(m.modulate(1, &state), 0.25);
        assert_eq!(m.modulate(2, &state), 0.5);
        assert_eq!(m.modulate(3, &state), 0.75);
    }

    #[test]
    fn test_linear_sustain_after_attack_window() {
        let m = LinearModulator::new(2, 2, N);
        let state = attacking(2);
        assert_eq!(m.modulate(0, &state), 1.0);
        assert_eq!(m.modulate(N - 1, &state), 1.0);
    }

    #[test]
    fn test_linear_release_ramp() {
        let m = LinearModulator::new(1, 1, 4);
        let state = releasing(0);

        assert_eq!(m.modulate(0, &state), 1.0);
        assert_eq!(m.modulate(1, &state), 0.75);
        assert_eq!(m.modulate(3, &state), 0.25);
    }

    #[test]
    fn test_linear_attack_continuous_across_tick_boundary() {
        let m = LinearModulator::new(4, 4, N);
        let step = 1.0 / (N as f64 * 4.0);

        for tick in 0..3 {
            let last = m.modulate(N - 1, &attacking(tick));
            let first = m.modulate(0, &attacking(tick + 1));
            // The ramp advances by exactly one sample step over the boundary,
            // the same as between any two adjacent samples.
            assert!(
                (first - last - step).abs() < 1e-12,
                "tick {} boundary jumped: {} -> {}",
                tick,
                last,
                first
            );
        }
    }

    #[test]
    fn test_linear_release_continuous_across_tick_boundary() {
        let m = LinearModulator::new(4, 4, N);
        let step = 1.0 / (N as f64 * 4.0);

        for tick in 0..3 {
            let last = m.modulate(N - 1, &releasing(tick));
            let first = m.modulate(0, &releasing(tick + 1));
            assert!((last - first - step).abs() < 1e-12);
        }
    }

    #[test]
    fn test_linear_range() {
        let m = LinearModulator::new(2, 2, N);
        for tick in 0..2 {
            for i in 0..N {
                let up = m.modulate(i, &attacking(tick));
                let down = m.modulate(i, &releasing(tick));
                assert!((0.0..=1.0).contains(&up));
                assert!((0.0..=1.0).contains(&down));
            }
        }
    }

    #[test]
    fn test_exponential_attack_rises_monotonically() {
        let m = ExponentialModulator::new(2, 2, N);
        let mut previous = -1.0;
        for tick in 0..2 {
            let state = attacking(tick);
            for i in 0..N {
                let value = m.modulate(i, &state);
                assert!(value > previous);
                assert!((0.0..=1.0).contains(&value));
                previous = value;
            }
        }
    }

    #[test]
    fn test_exponential_release_half_life() {
        let m = ExponentialModulator::new(1, 1, N);
        let state = releasing(0);

        assert_eq!(m.modulate(0, &state), 1.0);
        // Halfway through the release window the curve sits at 0.5^0.5.
        let mid = m.modulate(N / 2, &state);
        assert!((mid - 0.5f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_exponential_sustain_after_attack_window() {
        let m = ExponentialModulator::new(1, 1, N);
        assert_eq!(m.modulate(0, &attacking(1)), 1.0);
    }

    #[test]
    fn test_exponential_continuous_across_tick_boundary() {
        let m = ExponentialModulator::new(4, 4, N);

        let last = m.modulate(N - 1, &attacking(1));
        let first = m.modulate(0, &attacking(2));
        // One sample step apart, like adjacent samples within a buffer.
        let within = m.modulate(1, &attacking(2)) - first;
        assert!((first - last).abs() <= within * 1.5);
    }
}
