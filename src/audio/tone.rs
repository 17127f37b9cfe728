//! Short synthesized tones for clicks and strums

use std::f32::consts::PI;
use std::time::Duration;

/// Level the exponential envelope reaches at the end of a tone.
const ENVELOPE_FLOOR: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
}

impl Waveform {
    /// Value at `phase` cycles (only the fractional part matters).
    fn sample(self, phase: f32) -> f32 {
        let p = phase.fract();
        match self {
            Waveform::Sine => (2.0 * PI * p).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency: f32,
    pub waveform: Waveform,
    pub length: Duration,
    pub gain: f32,
}

impl Tone {
    pub const STRONG_CLICK: Tone = Tone {
        frequency: 800.0,
        waveform: Waveform::Sine,
        length: Duration::from_millis(100),
        gain: 1.0,
    };

    pub const WEAK_CLICK: Tone = Tone {
        frequency: 440.0,
        waveform: Waveform::Sine,
        length: Duration::from_millis(100),
        gain: 1.0,
    };

    pub const STRUM_DOWN: Tone = Tone {
        frequency: 196.0,
        waveform: Waveform::Triangle,
        length: Duration::from_millis(180),
        gain: 0.8,
    };

    pub const STRUM_UP: Tone = Tone {
        frequency: 247.0,
        waveform: Waveform::Triangle,
        length: Duration::from_millis(140),
        gain: 0.6,
    };

    pub const STRUM_MUTED: Tone = Tone {
        frequency: 110.0,
        waveform: Waveform::Square,
        length: Duration::from_millis(40),
        gain: 0.4,
    };

    pub fn frames(&self, sample_rate: u32) -> usize {
        (self.length.as_secs_f32() * sample_rate as f32).round() as usize
    }

    /// Renders the tone as mono samples with an exponential decay.
    pub fn render(&self, sample_rate: u32) -> Vec<f32> {
        let frames = self.frames(sample_rate);
        let step = self.frequency / sample_rate as f32;
        (0..frames)
            .map(|i| {
                let t = i as f32 / frames as f32;
                let envelope = ENVELOPE_FLOOR.powf(t);
                self.waveform.sample(i as f32 * step) * envelope * self.gain
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_length_matches_duration() {
        assert_eq!(Tone::STRONG_CLICK.render(48_000).len(), 4_800);
        assert_eq!(Tone::STRUM_MUTED.render(44_100).len(), 1_764);
    }

    #[test]
    fn test_render_decays_and_stays_in_range() {
        let samples = Tone::STRUM_DOWN.render(48_000);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));

        let head: f32 = samples[..200].iter().map(|s| s.abs()).sum();
        let tail: f32 = samples[samples.len() - 200..].iter().map(|s| s.abs()).sum();
        assert!(tail < head / 10.0);
    }

    #[test]
    fn test_waveform_shapes() {
        assert!(Waveform::Sine.sample(0.0).abs() < 1e-6);
        assert!((Waveform::Sine.sample(0.25) - 1.0).abs() < 1e-6);
        assert_eq!(Waveform::Triangle.sample(0.5), 1.0);
        assert_eq!(Waveform::Square.sample(0.75), -1.0);
    }
}
