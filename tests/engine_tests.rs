use std::sync::Arc;
use std::thread;
use std::time::Duration;
use strumtrainer::audio::RecordingSink;
use strumtrainer::{
    AudioEvent, Engine, MetronomeStyle, Pattern, Phase, StrumDirection, TimeSignature,
    TransportSnapshot,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_engine() -> (Engine, Arc<RecordingSink>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let sink = Arc::new(RecordingSink::new());
        let engine = Engine::new(sink.clone()).unwrap();
        engine.set_tempo(300.0).unwrap();
        (engine, sink)
    }

    fn assert_neutral(snapshot: TransportSnapshot) {
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.step_index, -1);
        assert_eq!(snapshot.measure_index, 0);
        assert_eq!(snapshot.time_in_measure, 0.0);
        assert_eq!(snapshot.count_in_beat, 0);
    }

    fn strum_count(sink: &RecordingSink) -> usize {
        sink.events()
            .iter()
            .filter(|e| matches!(e, AudioEvent::Strum { .. }))
            .count()
    }

    #[test]
    fn test_new_engine_is_idle() {
        let (engine, sink) = fast_engine();
        assert!(!engine.is_playing());
        assert_neutral(engine.snapshot());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (engine, _sink) = fast_engine();
        engine.stop();
        engine.stop();
        assert_neutral(engine.snapshot());

        engine.start();
        thread::sleep(Duration::from_millis(50));
        engine.stop();
        engine.stop();
        assert!(!engine.is_playing());
        assert_neutral(engine.snapshot());
    }

    #[test]
    fn test_start_while_playing_stops() {
        let (engine, _sink) = fast_engine();
        assert!(engine.start());
        thread::sleep(Duration::from_millis(50));
        assert!(!engine.start());
        assert!(!engine.is_playing());
        assert_neutral(engine.snapshot());
    }

    #[test]
    fn test_nothing_sounds_after_stop() {
        let (engine, sink) = fast_engine();
        engine.set_count_in(false);
        engine.start();
        thread::sleep(Duration::from_millis(120));
        engine.stop();
        let count = sink.events().len();
        assert!(count > 0);

        thread::sleep(Duration::from_millis(300));
        assert_eq!(sink.events().len(), count);
    }

    #[test]
    fn test_six_eight_count_in_then_pattern() {
        let (engine, sink) = fast_engine();
        engine.set_time_signature(TimeSignature::SixEight).unwrap();
        engine.set_metronome_style(MetronomeStyle::PatternGuide);
        engine.start();

        // Six count beats of 100 ms each at 300 BPM, then the first step.
        thread::sleep(Duration::from_millis(680));
        engine.stop();

        let timed = sink.timed_events();
        let voices: Vec<u32> = timed
            .iter()
            .filter_map(|(_, e)| match e {
                AudioEvent::CountVoice { number } => Some(*number),
                _ => None,
            })
            .collect();
        assert_eq!(voices, vec![1, 2, 3, 1, 2, 3]);

        assert!(matches!(
            timed[6].1,
            AudioEvent::Strum {
                direction: StrumDirection::Down
            }
        ));
        let count_in_span = timed[6].0.duration_since(timed[0].0);
        assert!(count_in_span >= Duration::from_millis(550));
        assert!(count_in_span < Duration::from_millis(700));
    }

    #[test]
    fn test_measures_advance_while_playing() {
        let (engine, _sink) = fast_engine();
        engine.set_count_in(false);
        engine.set_pattern(Pattern::parse(TimeSignature::ThreeFour, "D4 U4 D4").unwrap());
        engine.start();

        // A 3/4 measure lasts 600 ms at 300 BPM.
        thread::sleep(Duration::from_millis(700));
        let snapshot = engine.snapshot();
        engine.stop();

        assert_eq!(snapshot.phase, Phase::Playing);
        assert!(snapshot.measure_index >= 1);
        assert!(snapshot.step_index >= 0 && snapshot.step_index < 3);
    }

    #[test]
    fn test_tempo_change_applies_from_next_step() {
        let (engine, sink) = fast_engine();
        engine.set_count_in(false);
        engine.set_metronome_style(MetronomeStyle::PatternGuide);
        engine.set_pattern(Pattern::pulse(TimeSignature::FourFour).unwrap());
        engine.start();

        // The first wait was computed at 300 BPM (200 ms); later ones at 150 BPM.
        thread::sleep(Duration::from_millis(60));
        engine.set_tempo(150.0).unwrap();
        thread::sleep(Duration::from_millis(700));
        engine.stop();

        let times: Vec<_> = sink.timed_events().into_iter().map(|(t, _)| t).collect();
        assert!(times.len() >= 3);
        let first_gap = times[1].duration_since(times[0]);
        let second_gap = times[2].duration_since(times[1]);
        assert!(first_gap < Duration::from_millis(300));
        assert!(second_gap > Duration::from_millis(300));
    }

    #[test]
    fn test_restart_does_not_double_schedule() {
        let (engine, sink) = fast_engine();
        engine.set_count_in(false);
        engine.set_metronome_style(MetronomeStyle::PatternGuide);
        engine.set_pattern(Pattern::pulse(TimeSignature::FourFour).unwrap());

        engine.start();
        thread::sleep(Duration::from_millis(100));
        engine.stop();
        sink.clear();

        engine.start();
        thread::sleep(Duration::from_millis(450));
        engine.stop();

        // Steps at 0, 200 and 400 ms from the second start only.
        let strums = strum_count(&sink);
        assert!((2..=3).contains(&strums), "got {} strums", strums);
    }

    #[test]
    fn test_steady_click_lands_inside_long_step() {
        let (engine, sink) = fast_engine();
        engine.set_count_in(false);
        engine.set_metronome_style(MetronomeStyle::SteadyClick);
        engine.set_pattern(Pattern::parse(TimeSignature::FourFour, "D2 D2").unwrap());
        engine.start();
        thread::sleep(Duration::from_millis(100));
        engine.stop();

        let events = sink.events();
        assert_eq!(events.len(), 2);
        match (events[0], events[1]) {
            (
                AudioEvent::Click {
                    strong: true,
                    delay: first,
                },
                AudioEvent::Click {
                    strong: false,
                    delay: second,
                },
            ) => {
                assert_eq!(first, Duration::ZERO);
                assert_eq!(second.as_millis(), 200);
            }
            other => panic!("unexpected events {:?}", other),
        }
    }

    #[test]
    fn test_generate_pattern_installs_result() {
        let (engine, _sink) = fast_engine();
        let pattern = engine
            .generate_pattern(
                TimeSignature::ThreeFour,
                &[strumtrainer::RhythmType::Eighth],
            )
            .unwrap();
        assert_eq!(*engine.pattern(), pattern);
        assert_eq!(pattern.len(), 6);
    }
}
