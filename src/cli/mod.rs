use crate::config::{OutputKind, Settings};
use crate::engine::{ClickResolution, ClickVoicing, MetronomeStyle};
use crate::generator::RhythmType;
use crate::meter::TimeSignature;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Settings file (default: ~/.config/strumtrainer/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at trace level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a strum pattern with count-in and metronome
    Play(PlayArgs),
    /// Generate a random one-measure pattern
    Generate(GenerateArgs),
    /// List the built-in patterns
    Presets,
    /// Manage saved patterns
    #[command(subcommand)]
    Library(LibraryCommand),
    /// List MIDI output ports
    Devices,
}

#[derive(ClapArgs, Debug, Default)]
pub struct PlayArgs {
    /// Tempo in beats per minute (30-300)
    #[arg(short, long)]
    pub bpm: Option<f64>,

    /// 4/4, 3/4, 6/8 or any n/d
    #[arg(short, long)]
    pub time_signature: Option<TimeSignature>,

    /// Start the pattern without counting in
    #[arg(long)]
    pub no_count_in: bool,

    #[arg(long, value_enum)]
    pub style: Option<MetronomeStyle>,

    #[arg(long, value_enum)]
    pub resolution: Option<ClickResolution>,

    #[arg(long, value_enum)]
    pub voicing: Option<ClickVoicing>,

    /// Master volume, 0.0 to 1.0
    #[arg(long)]
    pub volume: Option<f32>,

    /// Built-in pattern id (see `presets`)
    #[arg(long, group = "source")]
    pub preset: Option<String>,

    /// Pattern in text notation, e.g. "D4 D8 U8 -8 U8 D4"
    #[arg(long, group = "source")]
    pub pattern: Option<String>,

    /// Generate a pattern from these rhythm types
    #[arg(long, group = "source", value_enum, value_delimiter = ',', num_args = 1..)]
    pub random: Vec<RhythmType>,

    /// Saved pattern id (see `library list`)
    #[arg(long, group = "source")]
    pub saved: Option<String>,

    #[arg(long, value_enum)]
    pub output: Option<OutputKind>,

    /// Substring of the MIDI output port name
    #[arg(long)]
    pub midi_device: Option<String>,

    /// Stop after this many measures
    #[arg(long)]
    pub bars: Option<u64>,
}

/// Where the pattern to play comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternSource {
    Preset(String),
    Notation(String),
    Random(Vec<RhythmType>),
    Saved(String),
    /// The default pattern for the configured time signature.
    Default,
}

impl PlayArgs {
    /// Layers the flags that were given over `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(bpm) = self.bpm {
            settings.bpm = bpm;
        }
        if let Some(ts) = self.time_signature {
            settings.time_signature = ts;
        }
        if self.no_count_in {
            settings.count_in = false;
        }
        if let Some(style) = self.style {
            settings.metronome_style = style;
        }
        if let Some(resolution) = self.resolution {
            settings.click_resolution = resolution;
        }
        if let Some(voicing) = self.voicing {
            settings.click_voicing = voicing;
        }
        if let Some(volume) = self.volume {
            settings.volume = volume.clamp(0.0, 1.0);
        }
        if let Some(output) = self.output {
            settings.output = output;
        }
        if let Some(device) = &self.midi_device {
            settings.midi_device = Some(device.clone());
        }
    }

    pub fn source(&self) -> PatternSource {
        if let Some(id) = &self.preset {
            PatternSource::Preset(id.clone())
        } else if let Some(text) = &self.pattern {
            PatternSource::Notation(text.clone())
        } else if !self.random.is_empty() {
            PatternSource::Random(self.random.clone())
        } else if let Some(id) = &self.saved {
            PatternSource::Saved(id.clone())
        } else {
            PatternSource::Default
        }
    }
}

#[derive(ClapArgs, Debug, Default)]
pub struct GenerateArgs {
    #[arg(short, long)]
    pub time_signature: Option<TimeSignature>,

    /// Allowed rhythm types, comma separated
    #[arg(long, value_enum, value_delimiter = ',', num_args = 1..)]
    pub types: Vec<RhythmType>,

    /// Choose rhythm types interactively
    #[arg(long, conflicts_with = "types")]
    pub pick: bool,

    /// Seed for a reproducible pattern
    #[arg(long)]
    pub seed: Option<u64>,

    /// Save the result to the library under this name
    #[arg(long)]
    pub save: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum LibraryCommand {
    /// List saved patterns
    List,
    /// Print one saved pattern
    Show { id: String },
    /// Remove a saved pattern
    Delete { id: String },
    /// Give a saved pattern a new name
    Rename { id: String, name: String },
}

pub fn validate_device(device_name: &str, devices: &[String]) -> Result<(), String> {
    if !devices.iter().any(|d| d.contains(device_name)) {
        let mut error_msg = format!(
            "Error: Device '{}' not found in available devices:\n",
            device_name
        );
        for device in devices {
            error_msg.push_str(&format!("  - {}\n", device));
        }
        return Err(error_msg);
    }
    Ok(())
}
