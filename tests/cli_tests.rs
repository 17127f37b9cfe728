#[cfg(test)]
mod tests {
    use clap::Parser;
    use strumtrainer::cli::{validate_device, Command, LibraryCommand, PatternSource};
    use strumtrainer::config::OutputKind;
    use strumtrainer::*;

    fn play_args(argv: &[&str]) -> strumtrainer::cli::PlayArgs {
        let mut full = vec!["strumtrainer", "play"];
        full.extend_from_slice(argv);
        match Args::parse_from(full).command {
            Command::Play(play) => play,
            other => panic!("expected play, got {:?}", other),
        }
    }

    #[test]
    fn test_play_flags_override_settings() {
        let play = play_args(&[
            "--bpm",
            "110",
            "--time-signature",
            "6/8",
            "--no-count-in",
            "--style",
            "steady-click",
            "--resolution",
            "eighth",
            "--voicing",
            "flat",
            "--output",
            "log",
        ]);
        let mut settings = Settings::default();
        play.apply(&mut settings);

        assert_eq!(settings.bpm, 110.0);
        assert_eq!(settings.time_signature, TimeSignature::SixEight);
        assert!(!settings.count_in);
        assert_eq!(settings.metronome_style, MetronomeStyle::SteadyClick);
        assert_eq!(settings.click_resolution, ClickResolution::Eighth);
        assert_eq!(settings.click_voicing, ClickVoicing::Flat);
        assert_eq!(settings.output, OutputKind::Log);
    }

    #[test]
    fn test_absent_flags_keep_settings() {
        let play = play_args(&[]);
        let mut settings = Settings::default();
        settings.bpm = 88.0;
        play.apply(&mut settings);
        assert_eq!(settings.bpm, 88.0);
        assert!(settings.count_in);
        assert_eq!(play.source(), PatternSource::Default);
    }

    #[test]
    fn test_random_source_with_aliases() {
        let play = play_args(&["--random", "8th,quarter,triplet"]);
        assert_eq!(
            play.source(),
            PatternSource::Random(vec![
                RhythmType::Eighth,
                RhythmType::Quarter,
                RhythmType::TripletBlock
            ])
        );
    }

    #[test]
    fn test_pattern_sources_are_exclusive() {
        let result = Args::try_parse_from([
            "strumtrainer",
            "play",
            "--preset",
            "funk",
            "--pattern",
            "D1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_time_signature_rejected() {
        assert!(Args::try_parse_from(["strumtrainer", "play", "--time-signature", "5/3"]).is_err());
    }

    #[test]
    fn test_library_rename() {
        let args = Args::parse_from(["strumtrainer", "library", "rename", "custom_1", "Warmup"]);
        match args.command {
            Command::Library(LibraryCommand::Rename { id, name }) => {
                assert_eq!(id, "custom_1");
                assert_eq!(name, "Warmup");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from(["strumtrainer", "presets", "--verbose", "--config", "x.toml"]);
        assert!(args.verbose);
        assert_eq!(args.config.as_deref(), Some(std::path::Path::new("x.toml")));
    }

    #[test]
    fn test_valid_device_binding() {
        let devices = vec!["Midi Through Port-0".to_string(), "USB Synth".to_string()];
        assert!(validate_device("USB", &devices).is_ok());
    }

    #[test]
    fn test_invalid_device_binding() {
        let devices = vec!["Midi Through Port-0".to_string()];
        let error_msg = validate_device("Nonexistent Device", &devices).unwrap_err();
        assert!(error_msg.contains("Nonexistent Device"));
        assert!(error_msg.contains("Midi Through Port-0"));
    }
}
