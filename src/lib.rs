//! Keytone - polyphonic additive synthesis from the computer keyboard
//!
//! Pressed keys become enveloped cosine voices that are summed, normalized
//! against clipping, PCM-encoded and streamed to the sound device on a
//! fixed cadence.

pub mod config;
pub mod engine;
pub mod pcm;
pub mod pitch;
pub mod synth;
pub mod tui;

pub use config::KeytoneConfig;
pub use engine::Pipeline;
