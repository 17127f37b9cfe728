//! Recorded count-in voices
//!
//! Voices are `1.wav` to `4.wav` in a directory. Any that are missing or fail
//! to decode are skipped with a warning; the dispatcher plays a strong click
//! in their place.

use crate::meter::COUNT_VOICES;
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct CountVoiceBank {
    voices: HashMap<u32, Arc<[f32]>>,
}

impl CountVoiceBank {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads every available voice from `dir`, resampled to `sample_rate`.
    pub fn load(dir: &Path, sample_rate: u32) -> Self {
        let mut voices = HashMap::new();
        for number in 1..=COUNT_VOICES {
            let path = dir.join(format!("{}.wav", number));
            match read_wav_mono(&path) {
                Ok((samples, rate)) => {
                    let samples = resample(&samples, rate, sample_rate);
                    info!(
                        "Loaded count voice {} ({} frames) from {}",
                        number,
                        samples.len(),
                        path.display()
                    );
                    voices.insert(number, Arc::from(samples));
                }
                Err(e) => warn!("Count voice {} unavailable ({}): {}", number, path.display(), e),
            }
        }
        Self { voices }
    }

    pub fn insert(&mut self, number: u32, samples: Vec<f32>) {
        self.voices.insert(number, Arc::from(samples));
    }

    pub fn get(&self, number: u32) -> Option<Arc<[f32]>> {
        self.voices.get(&number).cloned()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

/// Reads a WAV file, folds it to mono and normalises it to `-1.0..=1.0`.
fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32), hound::Error> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

/// Linear-interpolation resampling; good enough for short spoken counts.
fn resample(samples: &[f32], from: u32, to: u32) -> Vec<f32> {
    if from == to || samples.is_empty() || from == 0 {
        return samples.to_vec();
    }
    let ratio = f64::from(from) / f64::from(to);
    let out_len = (samples.len() as f64 / ratio).round() as usize;
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos.floor() as usize;
            let frac = (pos - idx as f64) as f32;
            let a = samples[idx.min(samples.len() - 1)];
            let b = samples[(idx + 1).min(samples.len() - 1)];
            a + (b - a) * frac
        })
        .collect()
}
