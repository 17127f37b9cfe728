use crate::duration::NoteValue;
use serde::{Deserialize, Serialize};

pub const MIN_BPM: f64 = 30.0;
pub const MAX_BPM: f64 = 300.0;
pub const DEFAULT_BPM: f64 = 70.0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ClickVoicing {
    /// Higher click on the downbeat
    #[default]
    Accented,
    /// Every click sounds the same
    Flat,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum MetronomeStyle {
    /// Clicks on a fixed grid only
    SteadyClick,
    /// Strum sounds following the pattern only
    PatternGuide,
    /// Clicks and strums together
    #[default]
    Both,
}

impl MetronomeStyle {
    pub fn clicks(self) -> bool {
        matches!(self, MetronomeStyle::SteadyClick | MetronomeStyle::Both)
    }

    pub fn strums(self) -> bool {
        matches!(self, MetronomeStyle::PatternGuide | MetronomeStyle::Both)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ClickResolution {
    #[default]
    Quarter,
    Eighth,
    Sixteenth,
}

impl ClickResolution {
    pub fn note_value(self) -> NoteValue {
        match self {
            ClickResolution::Quarter => NoteValue::Quarter,
            ClickResolution::Eighth => NoteValue::Eighth,
            ClickResolution::Sixteenth => NoteValue::Sixteenth,
        }
    }

    /// Grid spacing as a fraction of a whole note.
    pub fn fraction(self) -> f64 {
        self.note_value().fraction()
    }
}

/// Settings the scheduler reads fresh at every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackConfig {
    pub bpm: f64,
    pub count_in: bool,
    pub click_voicing: ClickVoicing,
    pub metronome_style: MetronomeStyle,
    pub click_resolution: ClickResolution,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            count_in: true,
            click_voicing: ClickVoicing::default(),
            metronome_style: MetronomeStyle::default(),
            click_resolution: ClickResolution::default(),
        }
    }
}

pub fn is_valid_bpm(bpm: f64) -> bool {
    bpm.is_finite() && (MIN_BPM..=MAX_BPM).contains(&bpm)
}
