//! Strum pattern practice engine
//!
//! Plays one-measure strum patterns in a loop at a chosen tempo and meter,
//! with an optional spoken count-in and a steady metronome click, and
//! generates random patterns that always fill the measure exactly.

pub mod audio;
pub mod cli;
pub mod config;
pub mod duration;
pub mod engine;
pub mod error;
pub mod generator;
pub mod library;
pub mod logging;
pub mod meter;
pub mod pattern;
pub mod scheduler;
pub mod transport;
pub mod ui;

pub use audio::{AudioEvent, AudioSink, StrumDirection};
pub use cli::Args;
pub use config::Settings;
pub use engine::{ClickResolution, ClickVoicing, Engine, MetronomeStyle, PlaybackConfig};
pub use error::{Result, TrainerError};
pub use generator::{generate_pattern, PatternGenerator, RhythmType};
pub use meter::TimeSignature;
pub use pattern::{Articulation, Pattern, Step};
pub use scheduler::{Scheduler, ThreadScheduler};
pub use transport::{Phase, SharedTransport, TransportSnapshot, TransportState};

use std::sync::Arc;

pub fn create_scheduler() -> ThreadScheduler {
    ThreadScheduler::new()
}

/// Engine configured from `settings`, playing `pattern` into `sink`.
pub fn create_engine(
    settings: &Settings,
    pattern: Pattern,
    sink: Arc<dyn AudioSink>,
) -> Result<Engine> {
    let engine = Engine::with_scheduler(sink, create_scheduler())?;
    engine.configure(settings.playback_config())?;
    engine.set_pattern(pattern);
    engine.set_volume(settings.volume);
    Ok(engine)
}
