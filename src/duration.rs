//! Duration model
//!
//! Durations are fractions of a 4/4 whole note, so a quarter note is always
//! `0.25` whatever the meter. Wall-clock conversion assumes the tempo counts
//! quarter notes per minute.

use std::time::Duration;

/// Milliseconds in one whole note at 1 BPM (four quarter notes of 60 s each).
pub const MS_PER_WHOLE_AT_ONE_BPM: f64 = 240_000.0;

/// Integer resolution used where sums have to be exact. 96 divides evenly by
/// every supported note value, triplet thirds included.
pub const TICKS_PER_WHOLE: u32 = 96;

/// Maximum distance between a duration and a named value for it to classify
/// as that value.
pub const CLASSIFY_TOLERANCE: f64 = 0.02;

pub const QUARTER: f64 = 0.25;
pub const EIGHTH: f64 = 0.125;

/// Length of `duration` at `bpm`, in milliseconds.
pub fn ms_for(duration: f64, bpm: f64) -> f64 {
    duration * MS_PER_WHOLE_AT_ONE_BPM / bpm
}

/// Same as [`ms_for`], as a `Duration` suitable for sleeping or deadlines.
/// Negative or non-finite results clamp to zero.
pub fn wait_for(duration: f64, bpm: f64) -> Duration {
    let ms = ms_for(duration, bpm);
    if ms.is_finite() && ms > 0.0 {
        Duration::from_secs_f64(ms / 1000.0)
    } else {
        Duration::ZERO
    }
}

/// Length of one quarter-note beat at `bpm`, in milliseconds.
pub fn beat_ms(bpm: f64) -> f64 {
    60_000.0 / bpm
}

pub fn ticks_to_fraction(ticks: u32) -> f64 {
    f64::from(ticks) / f64::from(TICKS_PER_WHOLE)
}

/// Named note values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteValue {
    Sixteenth,
    TripletThird,
    Eighth,
    DottedEighth,
    Quarter,
    DottedQuarter,
    Half,
}

impl NoteValue {
    pub const ALL: [NoteValue; 7] = [
        NoteValue::Sixteenth,
        NoteValue::TripletThird,
        NoteValue::Eighth,
        NoteValue::DottedEighth,
        NoteValue::Quarter,
        NoteValue::DottedQuarter,
        NoteValue::Half,
    ];

    pub fn ticks(self) -> u32 {
        match self {
            NoteValue::Sixteenth => 6,
            NoteValue::TripletThird => 8,
            NoteValue::Eighth => 12,
            NoteValue::DottedEighth => 18,
            NoteValue::Quarter => 24,
            NoteValue::DottedQuarter => 36,
            NoteValue::Half => 48,
        }
    }

    pub fn fraction(self) -> f64 {
        ticks_to_fraction(self.ticks())
    }

    /// Short symbol used by the text notation (`4` quarter, `8.` dotted eighth, `12` triplet third).
    pub fn symbol(self) -> &'static str {
        match self {
            NoteValue::Sixteenth => "16",
            NoteValue::TripletThird => "12",
            NoteValue::Eighth => "8",
            NoteValue::DottedEighth => "8.",
            NoteValue::Quarter => "4",
            NoteValue::DottedQuarter => "4.",
            NoteValue::Half => "2",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.symbol() == symbol)
    }

    pub fn name(self) -> &'static str {
        match self {
            NoteValue::Sixteenth => "sixteenth",
            NoteValue::TripletThird => "triplet",
            NoteValue::Eighth => "eighth",
            NoteValue::DottedEighth => "dotted eighth",
            NoteValue::Quarter => "quarter",
            NoteValue::DottedQuarter => "dotted quarter",
            NoteValue::Half => "half",
        }
    }
}

/// Classifies a duration as the closest named value within
/// [`CLASSIFY_TOLERANCE`]. `None` means the duration is irregular and callers
/// should use the raw number.
pub fn classify(duration: f64) -> Option<NoteValue> {
    NoteValue::ALL
        .into_iter()
        .map(|v| (v, (v.fraction() - duration).abs()))
        .filter(|(_, distance)| *distance <= CLASSIFY_TOLERANCE)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(v, _)| v)
}
