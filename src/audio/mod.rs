//! Audio event dispatch
//!
//! The engine describes what should sound as [`AudioEvent`]s and hands them to
//! an [`AudioSink`]. Sinks are fire-and-forget: `dispatch` must return
//! immediately and never report failure back to the scheduler.
//!
//! The main components are:
//! - [`SynthDispatcher`] renders synthesized tones and count voices through cpal
//! - [`MidiDispatcher`] sends the same events to a MIDI output port via midir
//! - [`RecordingSink`] and [`LogSink`] for tests and device-less runs

mod midi;
mod mixer;
pub mod mock;
mod output;
mod synth;
pub mod tone;
mod voices;

use std::sync::Arc;
use std::time::Duration;

pub use midi::{list_midi_outputs, MidiDispatcher, MidiMessage};
pub use mixer::{Mixer, ScheduledVoice};
pub use mock::{LogSink, RecordingSink};
pub use output::AudioOutput;
pub use synth::SynthDispatcher;
pub use voices::CountVoiceBank;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrumDirection {
    Down,
    Up,
    Muted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioEvent {
    /// Metronome click, `delay` after the moment of dispatch.
    Click { strong: bool, delay: Duration },
    Strum { direction: StrumDirection },
    /// Spoken count for a 1-based voice number.
    CountVoice { number: u32 },
}

pub trait AudioSink: Send + Sync {
    fn dispatch(&self, event: AudioEvent);

    /// Master gain in `0.0..=1.0`. Sinks without a gain stage ignore it.
    fn set_volume(&self, _volume: f32) {}
}

impl<T: AudioSink + ?Sized> AudioSink for Arc<T> {
    fn dispatch(&self, event: AudioEvent) {
        (**self).dispatch(event)
    }

    fn set_volume(&self, volume: f32) {
        (**self).set_volume(volume)
    }
}
