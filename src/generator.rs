//! Constrained random pattern generation
//!
//! Generation runs in two passes. The fill pass picks random note values until
//! the measure is exactly full, restarting from scratch whenever the remaining
//! gap is smaller than every allowed value. The articulation pass then assigns
//! down strums to even eighth positions, up strums everywhere else, and turns
//! some later steps into rests.
//!
//! Filling is done in integer ticks ([`TICKS_PER_WHOLE`]) so the total is exact.

use crate::duration::{ticks_to_fraction, NoteValue, TICKS_PER_WHOLE};
use crate::error::{Result, TrainerError};
use crate::meter::TimeSignature;
use crate::pattern::{Articulation, Pattern, Step};
use log::{debug, trace};
use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Whole-measure restarts allowed before giving up.
pub const MAX_ATTEMPTS: usize = 50;

/// Chance that a step after the downbeat becomes a rest.
pub const REST_PROBABILITY: f64 = 0.2;

const EIGHTH_TICKS: u32 = TICKS_PER_WHOLE / 8;

/// Note values the generator may draw from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum RhythmType {
    #[value(alias = "16th")]
    Sixteenth,
    #[value(alias = "8th")]
    Eighth,
    #[value(alias = "dotted8")]
    DottedEighth,
    Quarter,
    #[value(alias = "dotted4")]
    DottedQuarter,
    /// Three triplet thirds spanning one quarter note, always inserted together.
    #[value(alias = "triplet")]
    TripletBlock,
}

impl RhythmType {
    pub const ALL: [RhythmType; 6] = [
        RhythmType::Sixteenth,
        RhythmType::Eighth,
        RhythmType::DottedEighth,
        RhythmType::Quarter,
        RhythmType::DottedQuarter,
        RhythmType::TripletBlock,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RhythmType::Sixteenth => "Sixteenth (1/16)",
            RhythmType::Eighth => "Eighth (1/8)",
            RhythmType::DottedEighth => "Dotted Eighth",
            RhythmType::Quarter => "Quarter (1/4)",
            RhythmType::DottedQuarter => "Dotted Quarter",
            RhythmType::TripletBlock => "Triplets",
        }
    }

    fn single_value(self) -> Option<NoteValue> {
        match self {
            RhythmType::Sixteenth => Some(NoteValue::Sixteenth),
            RhythmType::Eighth => Some(NoteValue::Eighth),
            RhythmType::DottedEighth => Some(NoteValue::DottedEighth),
            RhythmType::Quarter => Some(NoteValue::Quarter),
            RhythmType::DottedQuarter => Some(NoteValue::DottedQuarter),
            RhythmType::TripletBlock => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Candidate {
    Single(NoteValue),
    TripletBlock,
}

pub struct PatternGenerator<R: Rng> {
    rng: R,
    rest_probability: f64,
    max_attempts: usize,
}

impl PatternGenerator<ThreadRng> {
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for PatternGenerator<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> PatternGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            rest_probability: REST_PROBABILITY,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    pub fn with_rest_probability(mut self, probability: f64) -> Self {
        self.rest_probability = probability.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Generates one measure of `time_signature` using only `allowed` values.
    pub fn generate(
        &mut self,
        time_signature: TimeSignature,
        allowed: &[RhythmType],
    ) -> Result<Pattern> {
        if allowed.is_empty() {
            return Err(TrainerError::NoRhythmTypes);
        }

        let values = self.fill(time_signature, allowed)?;
        let steps = self.articulate(&values);
        let pattern = Pattern::new(time_signature, steps)?;
        debug!(
            "Generated {} pattern: {}",
            time_signature,
            pattern.to_notation()
        );
        Ok(pattern)
    }

    fn target_ticks(time_signature: TimeSignature) -> u32 {
        TICKS_PER_WHOLE * time_signature.numerator() / time_signature.denominator()
    }

    /// Each allowed type at most once, in [`RhythmType::ALL`] order, so a
    /// repeated type is not drawn more often.
    fn candidates(allowed: &[RhythmType], remaining: u32) -> Vec<Candidate> {
        RhythmType::ALL
            .iter()
            .filter(|t| allowed.contains(*t))
            .filter_map(|t| match t.single_value() {
                Some(value) if value.ticks() <= remaining => Some(Candidate::Single(value)),
                Some(_) => None,
                None if remaining >= NoteValue::Quarter.ticks() => Some(Candidate::TripletBlock),
                None => None,
            })
            .collect()
    }

    fn fill(&mut self, time_signature: TimeSignature, allowed: &[RhythmType]) -> Result<Vec<NoteValue>> {
        let target = Self::target_ticks(time_signature);
        let mut values = Vec::new();
        let mut accumulated = 0;
        let mut attempts = 0;

        while accumulated != target {
            let candidates = Self::candidates(allowed, target - accumulated);
            let Some(choice) = candidates.choose(&mut self.rng).copied() else {
                attempts += 1;
                trace!(
                    "Dead end with {} ticks left, restarting (attempt {})",
                    target - accumulated,
                    attempts
                );
                if attempts >= self.max_attempts {
                    return Err(TrainerError::GenerationFailed { attempts });
                }
                values.clear();
                accumulated = 0;
                continue;
            };

            match choice {
                Candidate::Single(value) => {
                    values.push(value);
                    accumulated += value.ticks();
                }
                Candidate::TripletBlock => {
                    values.extend([NoteValue::TripletThird; 3]);
                    accumulated += NoteValue::Quarter.ticks();
                }
            }
        }

        Ok(values)
    }

    fn articulate(&mut self, values: &[NoteValue]) -> Vec<Step> {
        let mut start = 0;
        values
            .iter()
            .map(|value| {
                let step_start = start;
                start += value.ticks();

                let strum = if step_start % EIGHTH_TICKS == 0 {
                    if (step_start / EIGHTH_TICKS) % 2 == 0 {
                        Articulation::Down
                    } else {
                        Articulation::Up
                    }
                } else {
                    Articulation::Up
                };

                let articulation = if step_start > 0 && self.rng.gen_bool(self.rest_probability) {
                    Articulation::Rest
                } else {
                    strum
                };

                Step::new(ticks_to_fraction(value.ticks()), articulation)
            })
            .collect()
    }
}

/// Generates a pattern with the thread-local RNG and default settings.
pub fn generate_pattern(time_signature: TimeSignature, allowed: &[RhythmType]) -> Result<Pattern> {
    PatternGenerator::new().generate(time_signature, allowed)
}
