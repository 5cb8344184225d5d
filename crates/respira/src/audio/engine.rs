//! Cue-audio engine
//!
//! Runs playback on a dedicated thread, accepting commands via crossbeam
//! channels and emitting events back. Two players share one mixer output:
//! no mutual exclusion between them, the ambient bed keeps going
//! underneath the breath cues.
//!
//! Every failure path degrades to silence. Nothing here is allowed to
//! disturb a running session; callers observe problems only through
//! `CueEvent::CueFailed` and log output.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use rodio::{DeviceSinkBuilder, Player, Source};

use crate::config::audio::{AMBIENT_GAIN, COMMAND_QUEUE, EVENT_QUEUE};
use crate::error::{BreathError, Result};

use super::assets::AssetLibrary;
use super::types::{AssetPaths, CueCommand, CueEvent, CueKind, CuePlayer, Segment};

/// Cue-audio engine handle; playback runs on a dedicated thread
pub struct CueEngine {
    cmd_tx: Sender<CueCommand>,
    event_rx: Receiver<CueEvent>,
    thread: Option<JoinHandle<()>>,
}

impl CueEngine {
    /// Create a new engine, spawning the audio thread.
    ///
    /// Blocks until the audio output is initialized (or fails — e.g. no
    /// output device). Callers are expected to fall back to a silent
    /// session when this errors.
    pub fn new(paths: AssetPaths) -> Result<Self> {
        let (cmd_tx, cmd_rx) = bounded::<CueCommand>(COMMAND_QUEUE);
        let (event_tx, event_rx) = bounded::<CueEvent>(EVENT_QUEUE);
        let (init_tx, init_rx) = bounded::<std::result::Result<(), String>>(1);

        let thread = thread::Builder::new()
            .name("cue-engine".to_string())
            .spawn(move || {
                Self::run(cmd_rx, event_tx, init_tx, paths);
            })
            .map_err(|e| BreathError::Audio(format!("Failed to spawn audio thread: {}", e)))?;

        let init_result = init_rx
            .recv()
            .map_err(|_| BreathError::Audio("Audio thread terminated during init".to_string()))?;
        init_result.map_err(BreathError::Audio)?;

        Ok(Self {
            cmd_tx,
            event_rx,
            thread: Some(thread),
        })
    }

    /// Send a command to the engine
    pub fn send(&self, cmd: CueCommand) {
        let _ = self.cmd_tx.send(cmd);
    }

    /// Decode all configured assets ahead of first use (best-effort)
    pub fn preload(&self) {
        self.send(CueCommand::Preload);
    }

    /// Master volume (clamped to 0.0..=2.0)
    pub fn set_volume(&self, volume: f32) {
        self.send(CueCommand::SetVolume(volume));
    }

    /// Non-blocking poll for the next event
    pub fn try_recv_event(&self) -> Option<CueEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Get a reference to the event receiver for use with `select!`
    pub fn event_receiver(&self) -> &Receiver<CueEvent> {
        &self.event_rx
    }

    /// Graceful shutdown (consumes self)
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        let _ = self.cmd_tx.send(CueCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    /// The engine's main loop, running on the dedicated thread
    fn run(
        cmd_rx: Receiver<CueCommand>,
        event_tx: Sender<CueEvent>,
        init_tx: Sender<std::result::Result<(), String>>,
        paths: AssetPaths,
    ) {
        // Open audio output on this thread (backend streams may be !Send)
        let mut stream = match DeviceSinkBuilder::open_default_sink() {
            Ok(s) => s,
            Err(e) => {
                let _ = init_tx.send(Err(format!("Failed to open audio output: {}", e)));
                return;
            }
        };
        stream.log_on_drop(false);

        let cue_player = Player::connect_new(stream.mixer());
        let ambient_player = Player::connect_new(stream.mixer());

        let _ = init_tx.send(Ok(()));

        let mut assets = AssetLibrary::new(paths);
        let mut current_volume: f32 = 1.0;
        let mut ambient_active = false;

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                CueCommand::Preload => {
                    let decoded = assets.preload();
                    let _ = event_tx.try_send(CueEvent::Preloaded { decoded });
                }
                CueCommand::PlaySegment {
                    kind,
                    segment,
                    gain,
                } => {
                    // A new cue replaces whatever segment is in flight
                    cue_player.stop();
                    if let Some(buffer) = assets.get(kind).and_then(|a| a.segment_buffer(segment))
                    {
                        cue_player.append(buffer.amplify(gain));
                    } else if let Some(source) = assets.stream_segment(kind, segment) {
                        // Degraded path: stream the file directly
                        cue_player.append(source.amplify(gain));
                    } else {
                        log::warn!("no playable {} asset for segment {:?}", kind, segment);
                        let _ = event_tx.try_send(CueEvent::CueFailed(format!(
                            "no playable {} asset",
                            kind
                        )));
                        continue;
                    }
                    cue_player.set_volume(current_volume);
                    cue_player.play();
                }
                CueCommand::StartAmbient => {
                    if ambient_active {
                        continue;
                    }
                    if let Some(asset) = assets.get(CueKind::Ambient) {
                        ambient_player
                            .append(asset.full_buffer().amplify(AMBIENT_GAIN).repeat_infinite());
                    } else if let Some(source) = assets.stream_full(CueKind::Ambient) {
                        ambient_player.append(source.amplify(AMBIENT_GAIN).repeat_infinite());
                    } else {
                        log::warn!("no playable ambient asset");
                        let _ = event_tx
                            .try_send(CueEvent::CueFailed("no playable ambient asset".into()));
                        continue;
                    }
                    ambient_player.set_volume(current_volume);
                    ambient_player.play();
                    ambient_active = true;
                    let _ = event_tx.try_send(CueEvent::AmbientStarted);
                }
                CueCommand::StopAmbient => {
                    if ambient_active {
                        ambient_player.stop();
                        ambient_active = false;
                        let _ = event_tx.try_send(CueEvent::AmbientStopped);
                    }
                }
                CueCommand::StopCues => {
                    cue_player.stop();
                }
                CueCommand::SetVolume(vol) => {
                    current_volume = vol.clamp(0.0, 2.0);
                    cue_player.set_volume(current_volume);
                    ambient_player.set_volume(current_volume);
                }
                CueCommand::Shutdown => {
                    cue_player.stop();
                    ambient_player.stop();
                    break;
                }
            }
        }
    }
}

impl CuePlayer for CueEngine {
    fn play_segment(&self, kind: CueKind, segment: Segment, gain: f32) {
        self.send(CueCommand::PlaySegment {
            kind,
            segment,
            gain,
        });
    }

    fn start_ambient(&self) {
        self.send(CueCommand::StartAmbient);
    }

    fn stop_ambient(&self) {
        self.send(CueCommand::StopAmbient);
    }

    fn stop_cues(&self) {
        self.send(CueCommand::StopCues);
    }
}

impl Drop for CueEngine {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}
