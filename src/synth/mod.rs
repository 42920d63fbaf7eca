//! Synthesis engine for turning pressed keys into sample buffers.
//!
//! Contains the per-note lifecycle tracker, the envelope modulators, and
//! the additive synthesizer.

mod modulator;
mod synthesizer;
mod tracker;

pub use modulator::{ExponentialModulator, LinearModulator, Modulator};
pub use synthesizer::Synthesizer;
pub use tracker::{ActiveNotes, NoteState};
