//! Real-time streaming engine
//!
//! Connects the synthesis core to a sound device: a shared keyboard state,
//! the generator/writer pipeline, and the audio sink boundary.

mod keyboard;
mod pipeline;
mod recorder;
mod sink;

pub use keyboard::Keyboard;
pub use pipeline::Pipeline;
pub use recorder::Recorder;
pub use sink::{AudioSink, CpalSink};

use thiserror::Error;

/// Errors at the audio sink boundary
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("sink write failed: {0}")]
    WriteFailed(String),

    #[error("sink is closed")]
    Closed,
}
