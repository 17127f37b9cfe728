use strumtrainer::pattern::{default_for, find_preset, PRESETS};
use strumtrainer::{Articulation, Pattern, Step, TimeSignature, TrainerError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_fills_its_measure() {
        for preset in PRESETS {
            let pattern = preset
                .pattern()
                .unwrap_or_else(|e| panic!("preset {} is invalid: {}", preset.id, e));
            assert_eq!(pattern.time_signature(), preset.time_signature);
            assert!(
                (pattern.total_duration() - preset.time_signature.measure_duration()).abs()
                    <= 0.002,
                "preset {}",
                preset.id
            );
        }
    }

    #[test]
    fn test_default_pattern_per_meter() {
        for ts in TimeSignature::common() {
            assert_eq!(default_for(ts).unwrap().time_signature(), ts);
        }
        let seven_eight = TimeSignature::custom(7, 8).unwrap();
        let pulse = default_for(seven_eight).unwrap();
        assert_eq!(pulse.time_signature(), seven_eight);
        assert!((pulse.total_duration() - 0.875).abs() < 1e-9);
    }

    #[test]
    fn test_find_preset() {
        assert_eq!(find_preset("basic_34").unwrap().name, "Basic 3/4");
        assert!(find_preset("no_such_pattern").is_none());
    }

    #[test]
    fn test_construction_rejects_bad_patterns() {
        assert!(matches!(
            Pattern::new(TimeSignature::FourFour, vec![]),
            Err(TrainerError::EmptyPattern)
        ));
        assert!(matches!(
            Pattern::new(
                TimeSignature::ThreeFour,
                vec![Step::down(0.5), Step::up(0.0), Step::down(0.25)]
            ),
            Err(TrainerError::NonPositiveDuration { index: 1, .. })
        ));
        assert!(matches!(
            Pattern::new(TimeSignature::SixEight, vec![Step::down(0.5)]),
            Err(TrainerError::MeasureMismatch { .. })
        ));
    }

    #[test]
    fn test_notation_round_trip_for_presets() {
        for preset in PRESETS {
            let pattern = preset.pattern().unwrap();
            let reparsed = Pattern::parse(pattern.time_signature(), &pattern.to_notation()).unwrap();
            assert_eq!(reparsed.len(), pattern.len(), "preset {}", preset.id);
        }
    }

    #[test]
    fn test_editing_returns_new_pattern() {
        let original = Pattern::parse(TimeSignature::FourFour, "D4 D4 U4 D4").unwrap();
        let edited = original.with_articulation(1, Articulation::Mute).unwrap();
        assert_eq!(original.steps()[1].articulation, Articulation::Down);
        assert_eq!(edited.steps()[1].articulation, Articulation::Mute);

        let cycled = original.cycle_articulation(2).unwrap();
        assert_eq!(cycled.steps()[2].articulation, Articulation::Rest);
        assert!(matches!(
            original.cycle_articulation(4),
            Err(TrainerError::StepOutOfRange { index: 4, len: 4 })
        ));
    }

    #[test]
    fn test_saved_json_is_validated_on_load() {
        let broken = r#"{"time_signature":"4/4","steps":[{"duration":0.25,"articulation":"down"}]}"#;
        assert!(serde_json::from_str::<Pattern>(broken).is_err());

        let pattern = Pattern::pulse(TimeSignature::ThreeFour).unwrap();
        let json = serde_json::to_string(&pattern).unwrap();
        assert_eq!(serde_json::from_str::<Pattern>(&json).unwrap(), pattern);
    }
}
