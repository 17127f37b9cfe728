use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    CountingIn,
    Playing,
}

/// Read-only copy of the transport for views to render against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportSnapshot {
    pub phase: Phase,
    /// Index into the current pattern, `-1` when idle.
    pub step_index: i64,
    /// Completed loops of the pattern.
    pub measure_index: u64,
    /// Elapsed duration since the start of the current measure.
    pub time_in_measure: f64,
    /// 1-based count beat while counting in, `0` otherwise.
    pub count_in_beat: u32,
}

/// Live playback position. Only the engine's scheduling thread mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportState {
    pub phase: Phase,
    pub step_index: i64,
    pub measure_index: u64,
    pub time_in_measure: f64,
    pub count_in_beat: u32,
}

pub type SharedTransport = Arc<Mutex<TransportState>>;

impl Default for TransportState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            step_index: -1,
            measure_index: 0,
            time_in_measure: 0.0,
            count_in_beat: 0,
        }
    }
}

impl TransportState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Neutral idle values.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Position at the very start of a session, before the first tick.
    pub fn begin(&mut self, count_in: bool) {
        self.phase = if count_in {
            Phase::CountingIn
        } else {
            Phase::Playing
        };
        self.step_index = 0;
        self.measure_index = 0;
        self.count_in_beat = 1;
        self.time_in_measure = 0.0;
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Moves past a step of `duration` in a pattern of `pattern_len` steps,
    /// wrapping into the next measure after the last step.
    pub fn advance_step(&mut self, duration: f64, pattern_len: usize) {
        let next = self.step_index + 1;
        if next < 0 || next as usize >= pattern_len {
            self.step_index = 0;
            self.time_in_measure = 0.0;
            self.measure_index += 1;
        } else {
            self.step_index = next;
            self.time_in_measure += duration;
        }
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        TransportSnapshot {
            phase: self.phase,
            step_index: self.step_index,
            measure_index: self.measure_index,
            time_in_measure: self.time_in_measure,
            count_in_beat: self.count_in_beat,
        }
    }
}

pub fn create_shared_transport() -> SharedTransport {
    Arc::new(Mutex::new(TransportState::new()))
}
