//! Time signatures and their count-in behaviour

use crate::duration::{beat_ms, QUARTER};
use crate::error::{Result, TrainerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Only four count voices are recorded, so counts above this wrap.
pub const COUNT_VOICES: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeSignature {
    FourFour,
    ThreeFour,
    SixEight,
    Custom(CustomMeter),
}

/// A meter outside the preset library. Only built by [`TimeSignature::custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomMeter {
    numerator: u32,
    denominator: u32,
}

impl CustomMeter {
    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }
}

/// How a count-in is played for a given meter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountIn {
    /// Number of count beats before the pattern starts.
    pub beats: u32,
    /// Spacing between count beats, in quarter notes.
    pub interval_multiplier: f64,
    /// Voice numbers cycle `1..=voice_cycle`.
    pub voice_cycle: u32,
}

impl CountIn {
    /// Wait between count beats, in milliseconds.
    pub fn interval_ms(&self, bpm: f64) -> f64 {
        beat_ms(bpm) * self.interval_multiplier
    }

    /// Voice sample to play for a 1-based count beat.
    pub fn voice_for(&self, beat: u32) -> u32 {
        (beat.max(1) - 1) % self.voice_cycle + 1
    }
}

impl TimeSignature {
    pub fn custom(numerator: u32, denominator: u32) -> Result<Self> {
        let sig = match (numerator, denominator) {
            (4, 4) => TimeSignature::FourFour,
            (3, 4) => TimeSignature::ThreeFour,
            (6, 8) => TimeSignature::SixEight,
            (1..=16, 1 | 2 | 4 | 8 | 16) => TimeSignature::Custom(CustomMeter {
                numerator,
                denominator,
            }),
            _ => {
                return Err(TrainerError::UnknownTimeSignature(format!(
                    "{}/{}",
                    numerator, denominator
                )))
            }
        };
        Ok(sig)
    }

    pub fn numerator(&self) -> u32 {
        match self {
            TimeSignature::FourFour => 4,
            TimeSignature::ThreeFour => 3,
            TimeSignature::SixEight => 6,
            TimeSignature::Custom(meter) => meter.numerator,
        }
    }

    pub fn denominator(&self) -> u32 {
        match self {
            TimeSignature::FourFour | TimeSignature::ThreeFour => 4,
            TimeSignature::SixEight => 8,
            TimeSignature::Custom(meter) => meter.denominator,
        }
    }

    /// Length of one measure relative to a 4/4 whole note.
    pub fn measure_duration(&self) -> f64 {
        f64::from(self.numerator()) / f64::from(self.denominator())
    }

    /// Compound meters (6/8, 9/8, 12/8) are felt in groups of three eighths.
    pub fn is_compound(&self) -> bool {
        self.denominator() == 8 && self.numerator() % 3 == 0
    }

    pub fn count_in(&self) -> CountIn {
        let voice_cycle = if self.is_compound() { 3 } else { COUNT_VOICES };
        CountIn {
            beats: self.numerator(),
            interval_multiplier: 1.0 / (QUARTER * f64::from(self.denominator())),
            voice_cycle,
        }
    }

    /// The three meters the preset library covers.
    pub fn common() -> [TimeSignature; 3] {
        [
            TimeSignature::FourFour,
            TimeSignature::ThreeFour,
            TimeSignature::SixEight,
        ]
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature::FourFour
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator(), self.denominator())
    }
}

impl FromStr for TimeSignature {
    type Err = TrainerError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || TrainerError::UnknownTimeSignature(s.to_string());
        let (num, den) = s.trim().split_once('/').ok_or_else(unknown)?;
        let numerator = num.trim().parse::<u32>().map_err(|_| unknown())?;
        let denominator = den.trim().parse::<u32>().map_err(|_| unknown())?;
        TimeSignature::custom(numerator, denominator)
    }
}

impl TryFrom<String> for TimeSignature {
    type Error = TrainerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TimeSignature> for String {
    fn from(sig: TimeSignature) -> Self {
        sig.to_string()
    }
}
