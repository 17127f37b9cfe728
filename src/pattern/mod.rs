//! Strum patterns
//!
//! A [`Pattern`] is one measure of [`Step`]s whose durations add up to the
//! measure length of its time signature. Patterns are validated on
//! construction and never mutated afterwards; editing returns a new pattern.

mod notation;
pub mod presets;

use crate::duration::{classify, NoteValue};
use crate::error::{Result, TrainerError};
use crate::meter::TimeSignature;
use serde::{Deserialize, Serialize};

pub use presets::{default_for, find_preset, Preset, PRESETS};

/// Allowed gap between the summed step durations and the measure length.
pub const MEASURE_TOLERANCE: f64 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Articulation {
    Down,
    Up,
    Mute,
    Rest,
}

impl Articulation {
    pub fn symbol(self) -> char {
        match self {
            Articulation::Down => 'D',
            Articulation::Up => 'U',
            Articulation::Mute => 'x',
            Articulation::Rest => '-',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            'D' | 'd' => Some(Articulation::Down),
            'U' | 'u' => Some(Articulation::Up),
            'X' | 'x' => Some(Articulation::Mute),
            '-' | 'r' | 'R' => Some(Articulation::Rest),
            _ => None,
        }
    }

    /// Arrow glyph for strum-view rendering.
    pub fn arrow(self) -> char {
        match self {
            Articulation::Down => '↓',
            Articulation::Up => '↑',
            Articulation::Mute => '×',
            Articulation::Rest => '·',
        }
    }

    pub fn is_rest(self) -> bool {
        self == Articulation::Rest
    }

    /// Editor cycle: Down -> Up -> Rest -> Down. Mutes re-enter at Down.
    pub fn cycled(self) -> Self {
        match self {
            Articulation::Down => Articulation::Up,
            Articulation::Up => Articulation::Rest,
            Articulation::Rest | Articulation::Mute => Articulation::Down,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Fraction of a 4/4 whole note.
    pub duration: f64,
    pub articulation: Articulation,
}

impl Step {
    pub fn new(duration: f64, articulation: Articulation) -> Self {
        Self {
            duration,
            articulation,
        }
    }

    pub fn down(duration: f64) -> Self {
        Self::new(duration, Articulation::Down)
    }

    pub fn up(duration: f64) -> Self {
        Self::new(duration, Articulation::Up)
    }

    pub fn rest(duration: f64) -> Self {
        Self::new(duration, Articulation::Rest)
    }

    pub fn note_value(&self) -> Option<NoteValue> {
        classify(self.duration)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPattern", into = "RawPattern")]
pub struct Pattern {
    time_signature: TimeSignature,
    steps: Vec<Step>,
}

#[derive(Serialize, Deserialize)]
struct RawPattern {
    time_signature: TimeSignature,
    steps: Vec<Step>,
}

impl TryFrom<RawPattern> for Pattern {
    type Error = TrainerError;

    fn try_from(raw: RawPattern) -> Result<Self> {
        Pattern::new(raw.time_signature, raw.steps)
    }
}

impl From<Pattern> for RawPattern {
    fn from(pattern: Pattern) -> Self {
        RawPattern {
            time_signature: pattern.time_signature,
            steps: pattern.steps,
        }
    }
}

impl Pattern {
    /// Builds a pattern, rejecting empty step lists, non-positive durations
    /// and totals that do not fill exactly one measure.
    pub fn new(time_signature: TimeSignature, steps: Vec<Step>) -> Result<Self> {
        if steps.is_empty() {
            return Err(TrainerError::EmptyPattern);
        }
        if let Some((index, step)) = steps
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.duration.is_finite() && s.duration > 0.0))
        {
            return Err(TrainerError::NonPositiveDuration {
                index,
                duration: step.duration,
            });
        }

        let expected = time_signature.measure_duration();
        let actual: f64 = steps.iter().map(|s| s.duration).sum();
        if (actual - expected).abs() > MEASURE_TOLERANCE {
            return Err(TrainerError::MeasureMismatch { expected, actual });
        }

        Ok(Self {
            time_signature,
            steps,
        })
    }

    /// Builds a pattern without validation, for exercising code paths that
    /// valid patterns never reach.
    #[cfg(test)]
    pub(crate) fn unchecked(time_signature: TimeSignature, steps: Vec<Step>) -> Self {
        Self {
            time_signature,
            steps,
        }
    }

    /// One down strum per counted beat of the meter.
    pub fn pulse(time_signature: TimeSignature) -> Result<Self> {
        let beat = 1.0 / f64::from(time_signature.denominator());
        let steps = (0..time_signature.numerator())
            .map(|_| Step::down(beat))
            .collect();
        Self::new(time_signature, steps)
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a constructed pattern; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn total_duration(&self) -> f64 {
        self.steps.iter().map(|s| s.duration).sum()
    }

    /// Start offset of every step within the measure.
    pub fn start_times(&self) -> Vec<f64> {
        self.steps
            .iter()
            .scan(0.0, |acc, step| {
                let start = *acc;
                *acc += step.duration;
                Some(start)
            })
            .collect()
    }

    /// Returns a copy with one step's articulation replaced.
    pub fn with_articulation(&self, index: usize, articulation: Articulation) -> Result<Self> {
        let mut steps = self.steps.clone();
        let len = steps.len();
        let step = steps
            .get_mut(index)
            .ok_or(TrainerError::StepOutOfRange { index, len })?;
        step.articulation = articulation;
        Ok(Self {
            time_signature: self.time_signature,
            steps,
        })
    }

    /// Returns a copy with one step advanced through the editor cycle.
    pub fn cycle_articulation(&self, index: usize) -> Result<Self> {
        let current = self
            .step(index)
            .ok_or(TrainerError::StepOutOfRange {
                index,
                len: self.len(),
            })?
            .articulation;
        self.with_articulation(index, current.cycled())
    }
}
