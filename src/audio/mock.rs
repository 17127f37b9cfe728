use super::{AudioEvent, AudioSink};
use log::info;
use std::sync::Mutex;
use std::time::Instant;

/// Keeps every dispatched event with the instant it arrived.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(Instant, AudioEvent)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AudioEvent> {
        self.timed_events().into_iter().map(|(_, e)| e).collect()
    }

    pub fn timed_events(&self) -> Vec<(Instant, AudioEvent)> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl AudioSink for RecordingSink {
    fn dispatch(&self, event: AudioEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push((Instant::now(), event));
        }
    }
}

/// Writes events to the log instead of a device.
#[derive(Debug, Default)]
pub struct LogSink;

impl AudioSink for LogSink {
    fn dispatch(&self, event: AudioEvent) {
        info!("Audio event: {:?}", event);
    }
}
