// config.rs

use crate::engine::{
    is_valid_bpm, ClickResolution, ClickVoicing, MetronomeStyle, PlaybackConfig, DEFAULT_BPM,
};
use crate::error::{Result, TrainerError};
use crate::meter::TimeSignature;
use ::config::{Config, Environment, File};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "strumtrainer";
pub const ENV_PREFIX: &str = "STRUMTRAINER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Synthesized audio through the default output device
    #[default]
    Audio,
    /// Notes on a MIDI output port
    Midi,
    /// Events written to the log only
    Log,
}

/// Everything the application reads at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bpm: f64,
    pub time_signature: TimeSignature,
    pub count_in: bool,
    pub click_voicing: ClickVoicing,
    pub metronome_style: MetronomeStyle,
    pub click_resolution: ClickResolution,
    pub volume: f32,
    pub output: OutputKind,
    /// Substring of the MIDI output port name.
    pub midi_device: Option<String>,
    /// Directory holding `1.wav` to `4.wav`.
    pub voices_dir: Option<PathBuf>,
    pub library_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            time_signature: TimeSignature::default(),
            count_in: true,
            click_voicing: ClickVoicing::default(),
            metronome_style: MetronomeStyle::default(),
            click_resolution: ClickResolution::default(),
            volume: 0.5,
            output: OutputKind::default(),
            midi_device: None,
            voices_dir: None,
            library_path: None,
        }
    }
}

impl Settings {
    /// Loads defaults, then `path` (or the per-user config file when `None`),
    /// then `STRUMTRAINER_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(path) => (Some(path.to_path_buf()), true),
            None => (default_config_path(), false),
        };
        Self::from_sources(file.as_deref(), required, ENV_PREFIX)
    }

    fn from_sources(file: Option<&Path>, required: bool, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(file) = file {
            debug!("Reading settings from {}", file.display());
            builder = builder.add_source(File::from(file).required(required));
        }
        builder = builder.add_source(Environment::with_prefix(env_prefix).try_parsing(true));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        info!(
            "Settings loaded: {} BPM in {}, output {:?}",
            settings.bpm, settings.time_signature, settings.output
        );
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_valid_bpm(self.bpm) {
            return Err(TrainerError::InvalidTempo(self.bpm));
        }
        Ok(())
    }

    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            bpm: self.bpm,
            count_in: self.count_in,
            click_voicing: self.click_voicing,
            metronome_style: self.metronome_style,
            click_resolution: self.click_resolution,
        }
    }

    /// Where saved patterns live.
    pub fn library_file(&self) -> Result<PathBuf> {
        match &self.library_path {
            Some(path) => Ok(path.clone()),
            None => data_dir()
                .map(|dir| dir.join("patterns.json"))
                .ok_or_else(|| TrainerError::Storage("HOME environment variable not set".into())),
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// `$HOME/.local/share/strumtrainer`
pub fn data_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".local").join("share").join(APP_NAME))
}

/// `$HOME/.config/strumtrainer/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".config").join(APP_NAME).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bpm, 70.0);
        assert_eq!(settings.time_signature, TimeSignature::FourFour);
        assert!(settings.count_in);
        assert_eq!(settings.metronome_style, MetronomeStyle::Both);
        assert_eq!(settings.output, OutputKind::Audio);
        assert_eq!(settings.playback_config(), PlaybackConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "bpm = 96\ntime_signature = \"6/8\"\nclick_voicing = \"flat\"\noutput = \"log\"\n",
        )
        .unwrap();

        let settings = Settings::from_sources(Some(&path), true, "STRUMTRAINER_TEST_FILE").unwrap();
        assert_eq!(settings.bpm, 96.0);
        assert_eq!(settings.time_signature, TimeSignature::SixEight);
        assert_eq!(settings.click_voicing, ClickVoicing::Flat);
        assert_eq!(settings.output, OutputKind::Log);
        assert_eq!(settings.volume, 0.5);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "bpm = 96\n").unwrap();
        std::env::set_var("STRUMTRAINER_TEST_ENV_BPM", "150");

        let settings = Settings::from_sources(Some(&path), true, "STRUMTRAINER_TEST_ENV").unwrap();
        assert_eq!(settings.bpm, 150.0);
    }

    #[test]
    fn test_missing_optional_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings =
            Settings::from_sources(Some(&path), false, "STRUMTRAINER_TEST_ABSENT").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(Settings::from_sources(Some(&path), true, "STRUMTRAINER_TEST_ABSENT").is_err());
    }

    #[test]
    fn test_out_of_range_tempo_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "bpm = 500\n").unwrap();
        let result = Settings::from_sources(Some(&path), true, "STRUMTRAINER_TEST_RANGE");
        assert!(matches!(result, Err(TrainerError::InvalidTempo(b)) if b == 500.0));
    }
}
