//! Error types for strumtrainer
//!
//! Configuration problems (bad patterns, unknown meters, out-of-range tempo)
//! are rejected at the call that introduces them, so the playback thread only
//! ever sees well-formed input. Audio problems encountered while playing are
//! logged by the dispatcher and never surface here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainerError {
    #[error("pattern has no steps")]
    EmptyPattern,

    #[error("step {index} has non-positive duration {duration}")]
    NonPositiveDuration { index: usize, duration: f64 },

    #[error("pattern lasts {actual:.4} but the measure needs {expected:.4}")]
    MeasureMismatch { expected: f64, actual: f64 },

    #[error("unknown time signature '{0}'")]
    UnknownTimeSignature(String),

    #[error("tempo {0} BPM is outside the supported range")]
    InvalidTempo(f64),

    #[error("step {index} is out of range for a pattern of {len} steps")]
    StepOutOfRange { index: usize, len: usize },

    #[error("invalid pattern notation: {0}")]
    InvalidNotation(String),

    #[error("no rhythm types allowed, select at least one rhythm type")]
    NoRhythmTypes,

    #[error("could not fill a measure after {attempts} attempts, select at least one rhythm type that fits the meter")]
    GenerationFailed { attempts: usize },

    #[error("audio error: {0}")]
    Audio(String),

    #[error("MIDI error: {0}")]
    Midi(String),

    #[error("pattern '{0}' not found")]
    PatternNotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ::config::ConfigError),
}

pub type Result<T> = std::result::Result<T, TrainerError>;
