//! Breathing-session sequencer
//!
//! Drives the repeating four-phase cycle (inhale, hold, exhale, hold) on
//! a dedicated thread, accepting commands via crossbeam channels and
//! emitting events back. The live countdown is shared via
//! `Arc<Mutex<SessionSnapshot>>`.
//!
//! Phase accounting is wall-clock (`Instant` deltas at a small tick
//! interval), so boundaries can drift under heavy load. The optional
//! total-session duration is checked only at phase boundaries: an
//! in-progress phase always completes, and a session may overrun its
//! total by up to one phase length.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::audio::types::{CueKind, CuePlayer, Segment};
use crate::config::audio::{CUE_GAIN, EXHALE_OFFSET_SECS, INHALE_OFFSET_SECS};
use crate::config::session::{COMMAND_QUEUE, EVENT_QUEUE, TICK_INTERVAL_MS};

use super::pattern::BreathPattern;
use super::types::{
    Phase, SequencerCommand, SequencerEvent, SequencerOptions, SessionSnapshot, SharedSession,
    StartOutcome,
};

/// Breathing sequencer handle; the state machine runs on its own thread
pub struct BreathSequencer {
    cmd_tx: Sender<SequencerCommand>,
    event_rx: Receiver<SequencerEvent>,
    shared: SharedSession,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl BreathSequencer {
    /// Spawn a sequencer with the default tick interval.
    ///
    /// `cues` is the playback seam; pass `None` for a silent sequencer.
    pub fn spawn(cues: Option<Arc<dyn CuePlayer>>, options: SequencerOptions) -> Self {
        Self::with_tick_interval(cues, options, Duration::from_millis(TICK_INTERVAL_MS))
    }

    /// Spawn with a custom tick interval (primarily for tests)
    pub fn with_tick_interval(
        cues: Option<Arc<dyn CuePlayer>>,
        options: SequencerOptions,
        tick: Duration,
    ) -> Self {
        let (cmd_tx, cmd_rx) = bounded::<SequencerCommand>(COMMAND_QUEUE);
        let (event_tx, event_rx) = bounded::<SequencerEvent>(EVENT_QUEUE);

        let shared: SharedSession = Arc::new(Mutex::new(SessionSnapshot::default()));
        let running = Arc::new(AtomicBool::new(false));

        let shared_thread = shared.clone();
        let running_thread = running.clone();

        let thread = thread::Builder::new()
            .name("breath-sequencer".to_string())
            .spawn(move || {
                let mut runner = Runner {
                    event_tx,
                    shared: shared_thread,
                    running: running_thread,
                    cues,
                    options,
                    tick,
                    session: None,
                };
                runner.run(cmd_rx);
            })
            .expect("Failed to spawn sequencer thread");

        Self {
            cmd_tx,
            event_rx,
            shared,
            running,
            thread: Some(thread),
        }
    }

    /// Begin a session.
    ///
    /// Returns [`StartOutcome::Busy`] without side effects if a session
    /// is already active. An unplayable pattern falls back to the
    /// default; `total` of `None` runs until [`stop`](Self::stop).
    pub fn start(&self, pattern: BreathPattern, total: Option<Duration>) -> StartOutcome {
        if self.running.swap(true, Ordering::SeqCst) {
            return StartOutcome::Busy;
        }
        let pattern = match pattern.validate() {
            Ok(()) => pattern.clamped(),
            Err(e) => {
                log::warn!("unplayable pattern ({}), using default", e);
                BreathPattern::default()
            }
        };
        let _ = self.cmd_tx.send(SequencerCommand::Start { pattern, total });
        StartOutcome::Started
    }

    /// Stop the active session at the next safe point. No-op when idle.
    pub fn stop(&self) {
        let _ = self.cmd_tx.send(SequencerCommand::Stop);
    }

    /// Freeze the countdown. No-op unless a session is running unpaused.
    pub fn pause(&self) {
        let _ = self.cmd_tx.send(SequencerCommand::Pause);
    }

    /// Resume a frozen countdown. No-op unless paused.
    pub fn resume(&self) {
        let _ = self.cmd_tx.send(SequencerCommand::Resume);
    }

    /// Whether a session is currently active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get a handle to the shared session snapshot
    pub fn session(&self) -> SharedSession {
        self.shared.clone()
    }

    /// Copy of the current snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Non-blocking poll for the next event
    pub fn try_recv_event(&self) -> Option<SequencerEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Get a reference to the event receiver for use with `select!`
    pub fn event_receiver(&self) -> &Receiver<SequencerEvent> {
        &self.event_rx
    }

    /// Graceful shutdown (consumes self)
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        let _ = self.cmd_tx.send(SequencerCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for BreathSequencer {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

/// Per-session state held by the sequencer thread
struct ActiveSession {
    pattern: BreathPattern,
    phase: Phase,
    phase_total: Duration,
    phase_remaining: Duration,
    elapsed: Duration,
    total: Option<Duration>,
    cycles_completed: u32,
    paused: bool,
    last_countdown: u32,
    last_tick: Instant,
}

/// The sequencer's thread-side state machine
struct Runner {
    event_tx: Sender<SequencerEvent>,
    shared: SharedSession,
    running: Arc<AtomicBool>,
    cues: Option<Arc<dyn CuePlayer>>,
    options: SequencerOptions,
    tick: Duration,
    session: Option<ActiveSession>,
}

impl Runner {
    fn run(&mut self, cmd_rx: Receiver<SequencerCommand>) {
        loop {
            match cmd_rx.recv_timeout(self.tick) {
                Ok(SequencerCommand::Start { pattern, total }) => {
                    // The running flag guards double starts; a stray
                    // Start while active is dropped.
                    if self.session.is_none() {
                        self.begin(pattern, total);
                    }
                }
                Ok(SequencerCommand::Stop) => {
                    if self.session.take().is_some() {
                        if self.options.stop_cues_on_stop {
                            if let Some(ref cues) = self.cues {
                                cues.stop_cues();
                            }
                        }
                        self.finish(false);
                    }
                }
                Ok(SequencerCommand::Pause) => {
                    let mut did_pause = false;
                    if let Some(ref mut s) = self.session {
                        if !s.paused {
                            s.paused = true;
                            did_pause = true;
                        }
                    }
                    if did_pause {
                        if self.options.stop_cues_on_pause {
                            if let Some(ref cues) = self.cues {
                                cues.stop_cues();
                            }
                        }
                        self.publish();
                        let _ = self.event_tx.send(SequencerEvent::Paused);
                    }
                }
                Ok(SequencerCommand::Resume) => {
                    let mut did_resume = false;
                    if let Some(ref mut s) = self.session {
                        if s.paused {
                            s.paused = false;
                            s.last_tick = Instant::now();
                            did_resume = true;
                        }
                    }
                    if did_resume {
                        self.publish();
                        let _ = self.event_tx.send(SequencerEvent::Resumed);
                    }
                }
                Ok(SequencerCommand::Shutdown) => break,
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => self.advance(),
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    /// Initialize a session at the inhale phase
    fn begin(&mut self, pattern: BreathPattern, total: Option<Duration>) {
        let mut session = ActiveSession {
            pattern,
            phase: Phase::Inhale,
            phase_total: Duration::ZERO,
            phase_remaining: Duration::ZERO,
            elapsed: Duration::ZERO,
            total,
            cycles_completed: 0,
            paused: false,
            last_countdown: 0,
            last_tick: Instant::now(),
        };
        self.enter_phase(&mut session, Phase::Inhale);
        self.session = Some(session);
        self.publish();
    }

    /// Advance wall-clock accounting by one tick
    fn advance(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if session.paused {
            self.session = Some(session);
            return;
        }

        let now = Instant::now();
        let delta = now.duration_since(session.last_tick);
        session.last_tick = now;
        session.elapsed += delta;

        if delta < session.phase_remaining {
            session.phase_remaining -= delta;
            let remaining = session.phase_remaining.as_secs_f32().ceil() as u32;
            if remaining != session.last_countdown {
                session.last_countdown = remaining;
                let _ = self.event_tx.try_send(SequencerEvent::Countdown {
                    phase: session.phase,
                    remaining_secs: remaining,
                });
            }
            self.session = Some(session);
            self.publish();
            return;
        }

        // Phase complete
        session.phase_remaining = Duration::ZERO;
        if session.phase == Phase::HoldOut {
            session.cycles_completed += 1;
        }

        // Total-duration cutoff applies between phases only
        if let Some(total) = session.total {
            if session.elapsed >= total {
                self.finish(true);
                return;
            }
        }

        let next = session.phase.next();
        self.enter_phase(&mut session, next);
        self.session = Some(session);
        self.publish();
    }

    /// Enter a phase: announce it and request its audio cue
    fn enter_phase(&mut self, session: &mut ActiveSession, phase: Phase) {
        let duration_secs = phase.duration_in(&session.pattern);
        session.phase = phase;
        session.phase_total = Duration::from_secs_f32(duration_secs.max(0.0));
        session.phase_remaining = session.phase_total;
        session.last_countdown = duration_secs.ceil() as u32;

        let _ = self.event_tx.send(SequencerEvent::PhaseStarted {
            phase,
            duration_secs,
        });
        let _ = self.event_tx.try_send(SequencerEvent::Countdown {
            phase,
            remaining_secs: session.last_countdown,
        });

        // Holds are silent by contract; cue failures never touch the timer
        if phase.is_breathing() && duration_secs > 0.0 {
            if let Some(ref cues) = self.cues {
                let offset = match phase {
                    Phase::Inhale => INHALE_OFFSET_SECS,
                    _ => EXHALE_OFFSET_SECS,
                };
                cues.play_segment(
                    CueKind::Breath,
                    Segment::new(offset, duration_secs),
                    CUE_GAIN,
                );
            }
        }
    }

    /// Tear down the session and announce how it ended
    fn finish(&mut self, natural: bool) {
        self.session = None;
        if let Ok(mut shared) = self.shared.lock() {
            shared.reset();
        }
        // The guard must clear before Finished is observable
        self.running.store(false, Ordering::SeqCst);
        let _ = self.event_tx.send(SequencerEvent::Finished { natural });
    }

    /// Mirror the session into the shared snapshot
    fn publish(&self) {
        let Ok(mut shared) = self.shared.lock() else {
            return;
        };
        match self.session {
            Some(ref s) => {
                shared.running = true;
                shared.paused = s.paused;
                shared.phase = s.phase;
                shared.phase_duration_secs = s.phase_total.as_secs_f32();
                shared.phase_remaining_secs = s.phase_remaining.as_secs_f32();
                shared.elapsed_secs = s.elapsed.as_secs_f32();
                shared.cycles_completed = s.cycles_completed;
            }
            None => shared.reset(),
        }
    }
}
