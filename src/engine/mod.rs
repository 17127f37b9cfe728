//! Playback engine
//!
//! The engine owns the live [`TransportState`], the playback settings and the
//! current [`Pattern`]. Each `start()` spawns one session thread that walks the
//! count-in and then loops the pattern, one tick at a time:
//!
//! 1. lock the transport and check the session guard
//! 2. run [`playhead::tick`] to sound the current position
//! 3. wait until the next deadline on the session's cancel channel
//! 4. lock again, re-check the guard, and [`playhead::advance`]
//!
//! The guard (`playing` plus a matching session id) is the authoritative stop
//! signal. The cancel channel only shortens the wait.

pub mod options;
pub mod playhead;

pub use options::{
    is_valid_bpm, ClickResolution, ClickVoicing, MetronomeStyle, PlaybackConfig, DEFAULT_BPM,
    MAX_BPM, MIN_BPM,
};

use crate::audio::AudioSink;
use crate::error::{Result, TrainerError};
use crate::generator::{PatternGenerator, RhythmType};
use crate::meter::TimeSignature;
use crate::pattern::{default_for, Pattern};
use crate::scheduler::{Scheduler, ThreadScheduler};
use crate::transport::{create_shared_transport, SharedTransport, TransportSnapshot};
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// How far a session may fall behind its deadlines before it re-anchors.
const MAX_LAG: Duration = Duration::from_millis(250);

/// Locks `mutex`, recovering the data if another thread panicked with it held.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Shared {
    config: Mutex<PlaybackConfig>,
    pattern: Mutex<Arc<Pattern>>,
    transport: SharedTransport,
    playing: AtomicBool,
    session: AtomicU64,
    sink: Arc<dyn AudioSink>,
}

impl Shared {
    fn is_current(&self, session: u64) -> bool {
        self.playing.load(Ordering::SeqCst) && self.session.load(Ordering::SeqCst) == session
    }
}

/// The one outstanding session a later `stop()` must cancel.
struct PendingSession {
    id: u64,
    cancel: Sender<()>,
}

pub struct Engine<S: Scheduler = ThreadScheduler> {
    shared: Arc<Shared>,
    pending: Mutex<Option<PendingSession>>,
    scheduler: S,
}

impl Engine<ThreadScheduler> {
    pub fn new(sink: Arc<dyn AudioSink>) -> Result<Self> {
        Self::with_scheduler(sink, ThreadScheduler::new())
    }
}

impl<S: Scheduler> Engine<S> {
    pub fn with_scheduler(sink: Arc<dyn AudioSink>, scheduler: S) -> Result<Self> {
        let pattern = default_for(TimeSignature::default())?;
        Ok(Self {
            shared: Arc::new(Shared {
                config: Mutex::new(PlaybackConfig::default()),
                pattern: Mutex::new(Arc::new(pattern)),
                transport: create_shared_transport(),
                playing: AtomicBool::new(false),
                session: AtomicU64::new(0),
                sink,
            }),
            pending: Mutex::new(None),
            scheduler,
        })
    }

    /// Starts playback, or stops it when already playing. Returns whether the
    /// engine is playing afterwards.
    pub fn start(&self) -> bool {
        let mut pending = lock(&self.pending);
        if self.shared.playing.load(Ordering::SeqCst) {
            self.stop_locked(&mut pending);
            return false;
        }

        let id = self.shared.session.fetch_add(1, Ordering::SeqCst) + 1;
        let count_in = lock(&self.shared.config).count_in;
        lock(&self.shared.transport).begin(count_in);
        self.shared.playing.store(true, Ordering::SeqCst);

        let (cancel, cancel_rx) = bounded(1);
        if let Some(stale) = pending.replace(PendingSession { id, cancel }) {
            debug!("Cancelling leftover session {}", stale.id);
            let _ = stale.cancel.try_send(());
        }

        info!(
            "Playback started (session {}, count-in {})",
            id,
            if count_in { "on" } else { "off" }
        );
        let shared = Arc::clone(&self.shared);
        self.scheduler.spawn(&format!("playback-{}", id), move || {
            run_session(shared, id, cancel_rx)
        });
        true
    }

    /// Stops playback and resets the transport. Safe to call at any time.
    pub fn stop(&self) {
        let mut pending = lock(&self.pending);
        self.stop_locked(&mut pending);
    }

    fn stop_locked(&self, pending: &mut Option<PendingSession>) {
        let was_playing = self.shared.playing.swap(false, Ordering::SeqCst);
        if let Some(session) = pending.take() {
            let _ = session.cancel.try_send(());
            debug!("Cancelled session {}", session.id);
        }
        lock(&self.shared.transport).reset();
        if was_playing {
            info!("Playback stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::SeqCst)
    }

    pub fn set_tempo(&self, bpm: f64) -> Result<()> {
        if !is_valid_bpm(bpm) {
            return Err(TrainerError::InvalidTempo(bpm));
        }
        lock(&self.shared.config).bpm = bpm;
        info!("Tempo set to {} BPM", bpm);
        Ok(())
    }

    /// Switches meter. A pattern in another meter is replaced by the default
    /// pattern for `time_signature`.
    pub fn set_time_signature(&self, time_signature: TimeSignature) -> Result<()> {
        let mut pattern = lock(&self.shared.pattern);
        if pattern.time_signature() != time_signature {
            *pattern = Arc::new(default_for(time_signature)?);
            info!("Time signature set to {}", time_signature);
        }
        Ok(())
    }

    pub fn set_count_in(&self, enabled: bool) {
        lock(&self.shared.config).count_in = enabled;
    }

    pub fn set_metronome_style(&self, style: MetronomeStyle) {
        lock(&self.shared.config).metronome_style = style;
        debug!("Metronome style set to {:?}", style);
    }

    pub fn set_click_resolution(&self, resolution: ClickResolution) {
        lock(&self.shared.config).click_resolution = resolution;
        debug!("Click resolution set to {:?}", resolution);
    }

    pub fn set_click_voicing(&self, voicing: ClickVoicing) {
        lock(&self.shared.config).click_voicing = voicing;
        debug!("Click voicing set to {:?}", voicing);
    }

    /// Applies every field of `config`, validating the tempo first.
    pub fn configure(&self, config: PlaybackConfig) -> Result<()> {
        if !is_valid_bpm(config.bpm) {
            return Err(TrainerError::InvalidTempo(config.bpm));
        }
        *lock(&self.shared.config) = config;
        info!("Playback configured: {:?}", config);
        Ok(())
    }

    /// Master volume in `0.0..=1.0`.
    pub fn set_volume(&self, volume: f32) {
        self.shared.sink.set_volume(volume.clamp(0.0, 1.0));
    }

    /// Replaces the current pattern. Takes effect at the next tick.
    pub fn set_pattern(&self, pattern: Pattern) {
        info!(
            "Pattern set: {} ({} steps)",
            pattern.time_signature(),
            pattern.len()
        );
        *lock(&self.shared.pattern) = Arc::new(pattern);
    }

    /// Generates a random pattern, installs it and returns a copy.
    pub fn generate_pattern(
        &self,
        time_signature: TimeSignature,
        allowed: &[RhythmType],
    ) -> Result<Pattern> {
        let pattern = PatternGenerator::new().generate(time_signature, allowed)?;
        self.set_pattern(pattern.clone());
        Ok(pattern)
    }

    /// Cycles the articulation of one step of the current pattern.
    pub fn cycle_step(&self, index: usize) -> Result<()> {
        let mut pattern = lock(&self.shared.pattern);
        let edited = pattern.cycle_articulation(index)?;
        *pattern = Arc::new(edited);
        Ok(())
    }

    pub fn pattern(&self) -> Arc<Pattern> {
        Arc::clone(&lock(&self.shared.pattern))
    }

    pub fn config(&self) -> PlaybackConfig {
        *lock(&self.shared.config)
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        lock(&self.shared.transport).snapshot()
    }

    /// Shared handle for views that poll the transport themselves.
    pub fn transport(&self) -> SharedTransport {
        Arc::clone(&self.shared.transport)
    }
}

impl<S: Scheduler> Drop for Engine<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_session(shared: Arc<Shared>, id: u64, cancel: Receiver<()>) {
    debug!("Session {} thread started", id);
    let mut deadline = Instant::now();

    loop {
        let outcome = {
            let mut transport = lock(&shared.transport);
            if !shared.is_current(id) {
                warn!("Discarding stale tick from session {}", id);
                break;
            }
            if transport.is_idle() {
                error!("Session {} ticked while the transport was idle; halting", id);
                transport.reset();
                shared.playing.store(false, Ordering::SeqCst);
                break;
            }
            let config = *lock(&shared.config);
            let pattern = Arc::clone(&lock(&shared.pattern));
            match playhead::tick(&mut transport, &config, &pattern, &*shared.sink) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Session {} cannot play its pattern ({}); halting", id, e);
                    transport.reset();
                    shared.playing.store(false, Ordering::SeqCst);
                    break;
                }
            }
        };

        deadline += outcome.wait;
        let now = Instant::now();
        if now > deadline + MAX_LAG {
            warn!(
                "Session {} fell {:?} behind, re-anchoring",
                id,
                now.duration_since(deadline)
            );
            deadline = now;
        }

        match cancel.recv_deadline(deadline) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                debug!("Session {} cancelled", id);
                break;
            }
        }

        let mut transport = lock(&shared.transport);
        if !shared.is_current(id) {
            warn!("Discarding stale tick from session {}", id);
            break;
        }
        let before = transport.phase;
        let pattern = Arc::clone(&lock(&shared.pattern));
        playhead::advance(&mut transport, &pattern, &outcome);
        if transport.phase != before {
            info!("Phase changed: {:?} -> {:?}", before, transport.phase);
        }
    }

    debug!("Session {} thread finished", id);
}
