use super::mixer::{Mixer, ScheduledVoice};
use super::tone::Tone;
use super::voices::CountVoiceBank;
use super::{AudioEvent, AudioSink, StrumDirection};
use crossbeam::channel::{bounded, Sender, TrySendError};
use log::{debug, warn};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Voices waiting for the output callback. Far more than a measure can emit.
const QUEUE_DEPTH: usize = 256;

/// Pre-rendered tones for each event kind.
struct ToneSet {
    strong_click: Arc<[f32]>,
    weak_click: Arc<[f32]>,
    strum_down: Arc<[f32]>,
    strum_up: Arc<[f32]>,
    strum_muted: Arc<[f32]>,
}

impl ToneSet {
    fn render(sample_rate: u32) -> Self {
        Self {
            strong_click: Arc::from(Tone::STRONG_CLICK.render(sample_rate)),
            weak_click: Arc::from(Tone::WEAK_CLICK.render(sample_rate)),
            strum_down: Arc::from(Tone::STRUM_DOWN.render(sample_rate)),
            strum_up: Arc::from(Tone::STRUM_UP.render(sample_rate)),
            strum_muted: Arc::from(Tone::STRUM_MUTED.render(sample_rate)),
        }
    }
}

/// Turns audio events into voices on the shared output clock.
pub struct SynthDispatcher {
    queue: Sender<ScheduledVoice>,
    clock: Arc<AtomicU64>,
    volume: Arc<AtomicU32>,
    sample_rate: u32,
    tones: ToneSet,
    voices: CountVoiceBank,
}

impl SynthDispatcher {
    /// Creates a dispatcher and the mixer that an output stream should drive.
    pub fn new(sample_rate: u32, volume: f32, voices: CountVoiceBank) -> (Self, Mixer) {
        let (tx, rx) = bounded(QUEUE_DEPTH);
        let clock = Arc::new(AtomicU64::new(0));
        let volume = Arc::new(AtomicU32::new(volume.clamp(0.0, 1.0).to_bits()));
        let mixer = Mixer::new(rx, clock.clone(), volume.clone());
        let dispatcher = Self {
            queue: tx,
            clock,
            volume,
            sample_rate,
            tones: ToneSet::render(sample_rate),
            voices,
        };
        (dispatcher, mixer)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn delay_frames(&self, delay: std::time::Duration) -> u64 {
        (delay.as_secs_f64() * f64::from(self.sample_rate)).round() as u64
    }

    fn schedule(&self, samples: Arc<[f32]>, delay_frames: u64) {
        let voice = ScheduledVoice {
            samples,
            start_frame: self.clock.load(Ordering::Acquire) + delay_frames,
        };
        match self.queue.try_send(voice) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Audio queue full, dropping a voice"),
            Err(TrySendError::Disconnected(_)) => warn!("Audio output closed, dropping a voice"),
        }
    }
}

impl AudioSink for SynthDispatcher {
    fn dispatch(&self, event: AudioEvent) {
        match event {
            AudioEvent::Click { strong, delay } => {
                let samples = if strong {
                    self.tones.strong_click.clone()
                } else {
                    self.tones.weak_click.clone()
                };
                self.schedule(samples, self.delay_frames(delay));
            }
            AudioEvent::Strum { direction } => {
                let samples = match direction {
                    StrumDirection::Down => self.tones.strum_down.clone(),
                    StrumDirection::Up => self.tones.strum_up.clone(),
                    StrumDirection::Muted => self.tones.strum_muted.clone(),
                };
                self.schedule(samples, 0);
            }
            AudioEvent::CountVoice { number } => match self.voices.get(number) {
                Some(samples) => self.schedule(samples, 0),
                None => {
                    debug!("No sample for count {}, clicking instead", number);
                    self.schedule(self.tones.strong_click.clone(), 0);
                }
            },
        }
    }

    fn set_volume(&self, volume: f32) {
        self.volume
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_click_delay_becomes_frame_offset() {
        let (dispatcher, mut mixer) = SynthDispatcher::new(1_000, 1.0, CountVoiceBank::empty());
        dispatcher.dispatch(AudioEvent::Click {
            strong: true,
            delay: Duration::from_millis(50),
        });

        let mut out = vec![0.0f32; 50];
        mixer.render(&mut out, 1);
        assert!(out.iter().all(|s| *s == 0.0));

        mixer.render(&mut out, 1);
        assert!(out.iter().any(|s| *s != 0.0));
    }

    #[test]
    fn test_missing_count_voice_falls_back_to_click() {
        let (dispatcher, mut mixer) = SynthDispatcher::new(1_000, 1.0, CountVoiceBank::empty());
        dispatcher.dispatch(AudioEvent::CountVoice { number: 3 });
        let mut out = vec![0.0f32; 100];
        mixer.render(&mut out, 1);
        assert_eq!(mixer.active_voices(), 0);
        assert!(out.iter().any(|s| *s != 0.0));
    }

    #[test]
    fn test_loaded_count_voice_is_used() {
        let mut bank = CountVoiceBank::empty();
        bank.insert(1, vec![0.3; 10]);
        let (dispatcher, mut mixer) = SynthDispatcher::new(1_000, 1.0, bank);
        dispatcher.dispatch(AudioEvent::CountVoice { number: 1 });
        let mut out = vec![0.0f32; 10];
        mixer.render(&mut out, 1);
        assert!(out.iter().all(|s| (*s - 0.3).abs() < 1e-6));
    }

    #[test]
    fn test_volume_scales_output() {
        let mut bank = CountVoiceBank::empty();
        bank.insert(1, vec![0.8; 4]);
        let (dispatcher, mut mixer) = SynthDispatcher::new(1_000, 1.0, bank);
        dispatcher.set_volume(0.5);
        dispatcher.dispatch(AudioEvent::CountVoice { number: 1 });
        let mut out = vec![0.0f32; 4];
        mixer.render(&mut out, 1);
        assert!(out.iter().all(|s| (*s - 0.4).abs() < 1e-6));
    }
}
