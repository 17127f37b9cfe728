//! One scheduler tick at a time
//!
//! `tick` sounds whatever belongs to the current position and reports how long
//! to wait; `advance` then moves the transport to the next position. Keeping
//! the two apart lets the session thread wait in between, and lets tests walk
//! a whole session without a clock.

use super::options::{ClickVoicing, PlaybackConfig};
use crate::audio::{AudioEvent, AudioSink, StrumDirection};
use crate::duration::{ms_for, wait_for};
use crate::error::{Result, TrainerError};
use crate::pattern::{Articulation, Pattern};
use crate::transport::{Phase, TransportState};
use log::{debug, trace};
use std::time::Duration;

/// Tolerance for deciding that a grid point coincides with a step boundary.
pub const GRID_EPSILON: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Time until the next tick.
    pub wait: Duration,
    /// Duration of the step that sounded, `None` for count-in beats.
    pub step_duration: Option<f64>,
}

/// A steady click falling inside a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickAt {
    /// Offset from the start of the step.
    pub offset: f64,
    /// True only for the click on the measure boundary.
    pub strong: bool,
}

/// Grid points of spacing `resolution` in `[start, start + duration)`.
pub fn clicks_within(start: f64, duration: f64, resolution: f64) -> Vec<ClickAt> {
    let end = start + duration;
    let mut k = ((start - GRID_EPSILON) / resolution).ceil().max(0.0) as u64;
    let mut clicks = Vec::new();
    loop {
        let at = k as f64 * resolution;
        if at >= end - GRID_EPSILON {
            break;
        }
        clicks.push(ClickAt {
            offset: (at - start).max(0.0),
            strong: at.abs() < GRID_EPSILON,
        });
        k += 1;
    }
    clicks
}

fn strum_for(articulation: Articulation) -> Option<StrumDirection> {
    match articulation {
        Articulation::Down => Some(StrumDirection::Down),
        Articulation::Up => Some(StrumDirection::Up),
        Articulation::Mute => Some(StrumDirection::Muted),
        Articulation::Rest => None,
    }
}

/// Sounds the current position and publishes it on `transport`.
///
/// Fails without sounding anything when the pattern has no step to play, which
/// a session must treat as fatal.
pub fn tick(
    transport: &mut TransportState,
    config: &PlaybackConfig,
    pattern: &Pattern,
    sink: &dyn AudioSink,
) -> Result<TickOutcome> {
    match transport.phase {
        Phase::CountingIn => Ok(tick_count_in(transport, config, pattern, sink)),
        Phase::Playing | Phase::Idle => tick_pattern(transport, config, pattern, sink),
    }
}

fn tick_count_in(
    transport: &mut TransportState,
    config: &PlaybackConfig,
    pattern: &Pattern,
    sink: &dyn AudioSink,
) -> TickOutcome {
    let plan = pattern.time_signature().count_in();
    let beat = transport.count_in_beat.max(1);
    let number = plan.voice_for(beat);
    debug!("Count-in beat {}/{} (voice {})", beat, plan.beats, number);
    sink.dispatch(AudioEvent::CountVoice { number });

    let ms = plan.interval_ms(config.bpm);
    TickOutcome {
        wait: Duration::from_secs_f64(ms.max(0.0) / 1000.0),
        step_duration: None,
    }
}

fn tick_pattern(
    transport: &mut TransportState,
    config: &PlaybackConfig,
    pattern: &Pattern,
    sink: &dyn AudioSink,
) -> Result<TickOutcome> {
    // A pattern swapped for a shorter one may leave the index past its end.
    let index = match usize::try_from(transport.step_index) {
        Ok(i) if i < pattern.len() => i,
        _ => {
            transport.step_index = 0;
            transport.time_in_measure = 0.0;
            transport.measure_index += 1;
            0
        }
    };
    let step = pattern
        .step(index)
        .copied()
        .ok_or(TrainerError::StepOutOfRange {
            index,
            len: pattern.len(),
        })?;

    if config.metronome_style.strums() {
        if let Some(direction) = strum_for(step.articulation) {
            sink.dispatch(AudioEvent::Strum { direction });
        }
    }

    if config.metronome_style.clicks() {
        let accented = config.click_voicing == ClickVoicing::Accented;
        for click in clicks_within(
            transport.time_in_measure,
            step.duration,
            config.click_resolution.fraction(),
        ) {
            sink.dispatch(AudioEvent::Click {
                strong: click.strong && accented,
                delay: wait_for(click.offset, config.bpm),
            });
        }
    }

    trace!(
        "Step {} of measure {} at {:.4}: {:?} for {:.1} ms",
        index,
        transport.measure_index,
        transport.time_in_measure,
        step.articulation,
        ms_for(step.duration, config.bpm)
    );

    Ok(TickOutcome {
        wait: wait_for(step.duration, config.bpm),
        step_duration: Some(step.duration),
    })
}

/// Moves to the position after the tick that produced `outcome`.
pub fn advance(transport: &mut TransportState, pattern: &Pattern, outcome: &TickOutcome) {
    match transport.phase {
        Phase::CountingIn => {
            let plan = pattern.time_signature().count_in();
            if transport.count_in_beat < plan.beats {
                transport.count_in_beat += 1;
            } else {
                debug!("Count-in finished, starting pattern");
                transport.phase = Phase::Playing;
                transport.count_in_beat = 0;
            }
        }
        Phase::Playing | Phase::Idle => {
            let duration = outcome.step_duration.unwrap_or(0.0);
            transport.advance_step(duration, pattern.len());
        }
    }
}
