// ui.rs

use crate::meter::TimeSignature;
use crate::pattern::Pattern;
use crate::transport::{Phase, TransportSnapshot};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

fn create_beat_progress(multi_progress: &MultiProgress) -> ProgressBar {
    let pb = multi_progress.add(ProgressBar::new(4));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:.bold} [{bar:40.cyan}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("⣀⣤⣦⣶⣷⣿ "),
    );
    pb.set_prefix("Beat");
    pb
}

fn create_measure_progress(multi_progress: &MultiProgress, bars: Option<u64>) -> ProgressBar {
    let pb = match bars {
        Some(bars) => multi_progress.add(ProgressBar::new(bars)),
        None => multi_progress.add(ProgressBar::new_spinner()),
    };
    let template = if bars.is_some() {
        "{prefix:.bold} [{bar:20.white/black}] {pos}/{len}"
    } else {
        "{prefix:.bold} {pos}"
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▊ "),
    );
    pb.set_prefix("Measure");
    pb
}

fn create_transport_spinner(multi_progress: &MultiProgress) -> ProgressBar {
    let pb = multi_progress.add(ProgressBar::new_spinner());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix("Transport");
    pb
}

/// 1-based beat of the meter that `time_in_measure` falls in.
pub fn beat_in_measure(time_in_measure: f64, time_signature: TimeSignature) -> u32 {
    let beat_length = 1.0 / f64::from(time_signature.denominator());
    let beat = (time_in_measure / beat_length + 1e-6).floor().max(0.0) as u32;
    (beat + 1).min(time_signature.numerator())
}

/// The pattern as arrows, with the sounding step bracketed.
pub fn strum_line(pattern: &Pattern, step_index: i64) -> String {
    pattern
        .steps()
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let arrow = step.articulation.arrow();
            if i as i64 == step_index {
                format!("[{}]", arrow)
            } else {
                format!(" {} ", arrow)
            }
        })
        .collect()
}

/// One-line summary of where playback is.
pub fn describe(snapshot: &TransportSnapshot, time_signature: TimeSignature, bpm: f64) -> String {
    match snapshot.phase {
        Phase::Idle => format!("Stopped | {} | {} BPM", time_signature, bpm),
        Phase::CountingIn => format!(
            "Count-in {}/{} | {} | {} BPM",
            snapshot.count_in_beat,
            time_signature.count_in().beats,
            time_signature,
            bpm
        ),
        Phase::Playing => format!(
            "Playing | step {} | {} | {} BPM",
            snapshot.step_index + 1,
            time_signature,
            bpm
        ),
    }
}

/// Terminal view of the transport, redrawn from polled snapshots.
pub struct TransportView {
    #[allow(dead_code)]
    multi_progress: MultiProgress,
    beat_pb: ProgressBar,
    measure_pb: ProgressBar,
    transport_pb: ProgressBar,
}

impl TransportView {
    pub fn new(bars: Option<u64>) -> Self {
        let multi_progress = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());
        let beat_pb = create_beat_progress(&multi_progress);
        let measure_pb = create_measure_progress(&multi_progress, bars);
        let transport_pb = create_transport_spinner(&multi_progress);

        TransportView {
            multi_progress,
            beat_pb,
            measure_pb,
            transport_pb,
        }
    }

    pub fn update(&self, snapshot: &TransportSnapshot, pattern: &Pattern, bpm: f64) {
        let time_signature = pattern.time_signature();
        self.beat_pb
            .set_length(u64::from(time_signature.numerator()));

        let beat = match snapshot.phase {
            Phase::Playing => beat_in_measure(snapshot.time_in_measure, time_signature),
            Phase::CountingIn => snapshot.count_in_beat,
            Phase::Idle => 0,
        };
        self.beat_pb.set_position(u64::from(beat));
        self.measure_pb.set_position(snapshot.measure_index);

        self.transport_pb.set_message(format!(
            "{}  {}",
            describe(snapshot, time_signature, bpm),
            strum_line(pattern, snapshot.step_index)
        ));

        // Tick the spinner to animate it.
        self.transport_pb.tick();
    }

    pub fn finish(&self) {
        self.beat_pb.finish_and_clear();
        self.measure_pb.finish_and_clear();
        self.transport_pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beat_in_measure() {
        assert_eq!(beat_in_measure(0.0, TimeSignature::FourFour), 1);
        assert_eq!(beat_in_measure(0.375, TimeSignature::FourFour), 2);
        assert_eq!(beat_in_measure(0.75, TimeSignature::FourFour), 4);
        assert_eq!(beat_in_measure(0.625, TimeSignature::SixEight), 6);
        assert_eq!(beat_in_measure(0.25, TimeSignature::SixEight), 3);
    }

    #[test]
    fn test_strum_line_marks_current_step() {
        let pattern = Pattern::parse(TimeSignature::ThreeFour, "D4 U4 -4").unwrap();
        assert_eq!(strum_line(&pattern, 1), " ↓ [↑] · ");
        assert_eq!(strum_line(&pattern, -1), " ↓  ↑  · ");
    }

    #[test]
    fn test_describe_count_in() {
        let snapshot = TransportSnapshot {
            phase: Phase::CountingIn,
            step_index: 0,
            measure_index: 0,
            time_in_measure: 0.0,
            count_in_beat: 2,
        };
        assert_eq!(
            describe(&snapshot, TimeSignature::SixEight, 90.0),
            "Count-in 2/6 | 6/8 | 90 BPM"
        );
    }
}
