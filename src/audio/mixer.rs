//! Sample-offset voice mixer
//!
//! Dispatchers schedule voices at an absolute frame position on the output
//! clock. The output callback drains new voices and sums whatever overlaps
//! the buffer being rendered, which is how sub-step click delays land on
//! time without extra scheduler ticks.

use crossbeam::channel::Receiver;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Voices sounding at once. Space for them is reserved up front so the output
/// callback never allocates; extra voices wait in the queue for a free slot.
pub const MAX_VOICES: usize = 256;

#[derive(Debug, Clone)]
pub struct ScheduledVoice {
    pub samples: Arc<[f32]>,
    /// Absolute output frame at which the first sample plays.
    pub start_frame: u64,
}

impl ScheduledVoice {
    fn end_frame(&self) -> u64 {
        self.start_frame + self.samples.len() as u64
    }
}

pub struct Mixer {
    incoming: Receiver<ScheduledVoice>,
    active: Vec<ScheduledVoice>,
    clock: Arc<AtomicU64>,
    volume: Arc<AtomicU32>,
}

impl Mixer {
    pub fn new(
        incoming: Receiver<ScheduledVoice>,
        clock: Arc<AtomicU64>,
        volume: Arc<AtomicU32>,
    ) -> Self {
        Self {
            incoming,
            active: Vec::with_capacity(MAX_VOICES),
            clock,
            volume,
        }
    }

    pub fn active_voices(&self) -> usize {
        self.active.len()
    }

    /// Fills an interleaved buffer of `channels` channels and advances the
    /// output clock by the number of frames written.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let frames = out.len() / channels;
        let buffer_start = self.clock.load(Ordering::Acquire);
        let buffer_end = buffer_start + frames as u64;
        let gain = f32::from_bits(self.volume.load(Ordering::Relaxed));

        // Voices that arrive late start immediately rather than being clipped.
        while self.active.len() < MAX_VOICES {
            let Ok(mut voice) = self.incoming.try_recv() else {
                break;
            };
            if voice.start_frame < buffer_start {
                voice.start_frame = buffer_start;
            }
            self.active.push(voice);
        }

        out.iter_mut().for_each(|s| *s = 0.0);
        for voice in &self.active {
            let from = voice.start_frame.max(buffer_start);
            let to = voice.end_frame().min(buffer_end);
            for frame in from..to {
                let sample = voice.samples[(frame - voice.start_frame) as usize] * gain;
                let base = (frame - buffer_start) as usize * channels;
                for s in &mut out[base..base + channels] {
                    *s += sample;
                }
            }
        }
        for s in out.iter_mut() {
            *s = s.clamp(-1.0, 1.0);
        }

        self.active.retain(|v| v.end_frame() > buffer_end);
        self.clock.store(buffer_end, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;

    fn mixer() -> (crossbeam::channel::Sender<ScheduledVoice>, Mixer, Arc<AtomicU64>) {
        let (tx, rx) = unbounded();
        let clock = Arc::new(AtomicU64::new(0));
        let volume = Arc::new(AtomicU32::new(1.0f32.to_bits()));
        (tx, Mixer::new(rx, clock.clone(), volume), clock)
    }

    #[test]
    fn test_voice_lands_at_its_start_frame() {
        let (tx, mut mixer, clock) = mixer();
        tx.send(ScheduledVoice {
            samples: Arc::from(vec![0.5f32; 4]),
            start_frame: 6,
        })
        .unwrap();

        let mut out = vec![0.0f32; 8];
        mixer.render(&mut out, 1);
        assert_eq!(out, vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.5]);
        assert_eq!(clock.load(Ordering::Acquire), 8);
        assert_eq!(mixer.active_voices(), 1);

        mixer.render(&mut out, 1);
        assert_eq!(out, vec![0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_late_voice_starts_immediately_on_all_channels() {
        let (tx, mut mixer, clock) = mixer();
        clock.store(100, Ordering::Release);
        tx.send(ScheduledVoice {
            samples: Arc::from(vec![0.25f32, 0.25]),
            start_frame: 10,
        })
        .unwrap();

        let mut out = vec![0.0f32; 6];
        mixer.render(&mut out, 2);
        assert_eq!(out, vec![0.25, 0.25, 0.25, 0.25, 0.0, 0.0]);
    }

    #[test]
    fn test_overlapping_voices_sum_and_clip() {
        let (tx, mut mixer, _) = mixer();
        for _ in 0..3 {
            tx.send(ScheduledVoice {
                samples: Arc::from(vec![0.5f32; 2]),
                start_frame: 0,
            })
            .unwrap();
        }
        let mut out = vec![0.0f32; 2];
        mixer.render(&mut out, 1);
        assert_eq!(out, vec![1.0, 1.0]);
    }

    #[test]
    fn test_voice_flood_stays_within_reserved_space() {
        let (tx, mut mixer, _) = mixer();
        let capacity = mixer.active.capacity();
        for _ in 0..MAX_VOICES + 10 {
            tx.send(ScheduledVoice {
                samples: Arc::from(vec![0.001f32; 4]),
                start_frame: 0,
            })
            .unwrap();
        }

        let mut out = vec![0.0f32; 2];
        mixer.render(&mut out, 1);
        assert_eq!(mixer.active_voices(), MAX_VOICES);
        assert_eq!(mixer.active.capacity(), capacity);

        // The held-back voices join once the first batch has finished.
        mixer.render(&mut out, 1);
        mixer.render(&mut out, 1);
        assert_eq!(mixer.active_voices(), 10);
        assert_eq!(mixer.active.capacity(), capacity);
    }
}
