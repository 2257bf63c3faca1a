use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::silence::{SilenceAction, SilencePolicy, SILENCE_DURATION, SILENCE_THRESHOLD};
use crate::audio::{AudioBackend, AudioChunk, CaptureStream, EnergyMonitor};
use crate::turn::{LanguageCode, Utterance};

/// Recording lifecycle
///
/// `Finalizing` covers both device teardown and the wait for the turn that
/// consumes the emitted utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
    Finalizing,
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Finalizing => "finalizing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum RecordingError {
    /// Permission denied or no capture device
    #[error("capture device unavailable: {0:#}")]
    DeviceUnavailable(anyhow::Error),

    /// A session is already recording or finalizing
    #[error("a recording session is already {0}")]
    AlreadyActive(RecordingState),

    #[error("cannot {op} while {state}")]
    InvalidTransition {
        state: RecordingState,
        op: &'static str,
    },
}

/// Why a recording ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Explicit stop command
    Requested,
    /// Silence lasted for the full silence duration
    Silence,
    /// The capture device closed its chunk stream
    DeviceClosed,
}

/// Voice-activity settings for a recording session
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Energy at or below this is silence
    pub silence_threshold: f32,

    /// Uninterrupted silence that ends the recording
    pub silence_duration: Duration,

    /// Energy sampling cadence (one display frame)
    pub frame_interval: Duration,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            silence_threshold: SILENCE_THRESHOLD,
            silence_duration: SILENCE_DURATION,
            frame_interval: Duration::from_millis(16), // ~60 frames/sec
        }
    }
}

type SharedDevice = Arc<Mutex<Box<dyn AudioBackend>>>;

struct ActiveSession {
    stop: CancellationToken,
    task: JoinHandle<()>,
}

struct Inner {
    state: RecordingState,
    session: Option<ActiveSession>,
    /// An utterance was emitted and its turn has not been reported back yet
    turn_in_flight: bool,
}

/// Owns the capture device and decides when an utterance starts and ends
///
/// At most one session exists at a time. Each session runs as one task that
/// owns the per-frame energy loop and the silence timer, so both are torn
/// down together on every exit path. The device itself stays with the
/// controller and outlives any session task.
pub struct RecordingController {
    inner: Arc<Mutex<Inner>>,
    device: SharedDevice,
    config: RecordingConfig,
    utterance_tx: mpsc::Sender<Utterance>,
    /// Parent of every session's stop token
    shutdown: CancellationToken,
}

impl RecordingController {
    /// Create a controller and the channel on which finished utterances arrive
    pub fn new(
        backend: Box<dyn AudioBackend>,
        config: RecordingConfig,
    ) -> (Self, mpsc::Receiver<Utterance>) {
        let (utterance_tx, utterance_rx) = mpsc::channel(1);

        info!(
            "Recording controller ready ({}, threshold {}, silence {:?})",
            backend.name(),
            config.silence_threshold,
            config.silence_duration
        );

        let controller = Self {
            inner: Arc::new(Mutex::new(Inner {
                state: RecordingState::Idle,
                session: None,
                turn_in_flight: false,
            })),
            device: Arc::new(Mutex::new(backend)),
            config,
            utterance_tx,
            shutdown: CancellationToken::new(),
        };

        (controller, utterance_rx)
    }

    pub async fn state(&self) -> RecordingState {
        self.inner.lock().await.state
    }

    /// Whether an emitted utterance is still waiting on its turn
    pub async fn is_turn_in_flight(&self) -> bool {
        self.inner.lock().await.turn_in_flight
    }

    /// Idle -> Recording
    pub async fn start(&self, language: LanguageCode) -> Result<(), RecordingError> {
        let mut inner = self.inner.lock().await;

        if inner.state != RecordingState::Idle {
            warn!("Rejected start: session is {}", inner.state);
            return Err(RecordingError::AlreadyActive(inner.state));
        }

        let stream = {
            let mut device = self.device.lock().await;
            match device.start().await {
                Ok(stream) => {
                    info!("Recording started ({}, {})", device.name(), language);
                    stream
                }
                Err(e) => {
                    error!("Failed to start capture on {}: {:#}", device.name(), e);
                    // Release anything the device may have partially acquired
                    if let Err(stop_err) = device.stop().await {
                        warn!("Failed to release {}: {:#}", device.name(), stop_err);
                    }
                    return Err(RecordingError::DeviceUnavailable(e));
                }
            }
        };

        let stop = self.shutdown.child_token();
        let session = tokio::spawn(run_session(SessionContext {
            inner: Arc::clone(&self.inner),
            device: Arc::clone(&self.device),
            stream,
            stop: stop.clone(),
            config: self.config.clone(),
            language,
            utterance_tx: self.utterance_tx.clone(),
        }));
        let task = tokio::spawn(supervise(
            session,
            Arc::clone(&self.inner),
            Arc::clone(&self.device),
        ));

        inner.state = RecordingState::Recording;
        inner.session = Some(ActiveSession { stop, task });

        Ok(())
    }

    /// Recording -> Finalizing on explicit request
    ///
    /// Returns once the device is released and the utterance (if any) has
    /// been emitted. Stopping while idle does nothing.
    pub async fn stop(&self) -> Result<(), RecordingError> {
        let session = {
            let mut inner = self.inner.lock().await;
            match inner.state {
                RecordingState::Idle => {
                    debug!("Stop ignored: not recording");
                    return Ok(());
                }
                RecordingState::Finalizing => {
                    warn!("Rejected stop: session is already finalizing");
                    return Err(RecordingError::InvalidTransition {
                        state: RecordingState::Finalizing,
                        op: "stop",
                    });
                }
                RecordingState::Recording => {}
            }
            inner.state = RecordingState::Finalizing;
            inner.session.take()
        };

        if let Some(session) = session {
            session.stop.cancel();
            if let Err(e) = session.task.await {
                error!("Recording supervisor failed: {}", e);
            }
        }

        Ok(())
    }

    /// Finalizing -> Idle once the turn for the emitted utterance resolved,
    /// whether it succeeded or failed
    pub async fn finish_turn(&self) -> Result<(), RecordingError> {
        let mut inner = self.inner.lock().await;

        if inner.state != RecordingState::Finalizing || !inner.turn_in_flight {
            return Err(RecordingError::InvalidTransition {
                state: inner.state,
                op: "finish a turn",
            });
        }

        inner.turn_in_flight = false;
        inner.state = RecordingState::Idle;
        debug!("Turn finished, ready to record");

        Ok(())
    }
}

impl Drop for RecordingController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Wait for a session task and put the controller back to Idle if it died
async fn supervise(session: JoinHandle<()>, inner: Arc<Mutex<Inner>>, device: SharedDevice) {
    let Err(e) = session.await else {
        return;
    };
    error!("Recording task panicked: {}", e);

    {
        let mut device = device.lock().await;
        if let Err(stop_err) = device.stop().await {
            warn!("Failed to release {}: {:#}", device.name(), stop_err);
        }
    }

    let mut inner = inner.lock().await;
    inner.session = None;
    inner.turn_in_flight = false;
    inner.state = RecordingState::Idle;
}

struct SessionContext {
    inner: Arc<Mutex<Inner>>,
    device: SharedDevice,
    stream: CaptureStream,
    stop: CancellationToken,
    config: RecordingConfig,
    language: LanguageCode,
    utterance_tx: mpsc::Sender<Utterance>,
}

/// Per-frame energy loop plus silence timer for one session
async fn run_session(ctx: SessionContext) {
    let SessionContext {
        inner,
        device,
        stream,
        stop,
        config,
        language,
        utterance_tx,
    } = ctx;

    let CaptureStream {
        chunks: mut chunk_rx,
        analyser,
    } = stream;

    let mut monitor = EnergyMonitor::new(analyser);
    let policy = SilencePolicy::new(config.silence_threshold);

    let mut frames = tokio::time::interval(config.frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut silence_deadline: Option<Instant> = None;
    let mut chunks: Vec<AudioChunk> = Vec::new();

    let reason = loop {
        tokio::select! {
            biased;

            () = stop.cancelled() => break StopReason::Requested,

            () = sleep_until(silence_deadline.unwrap_or_else(Instant::now)), if silence_deadline.is_some() => {
                break StopReason::Silence;
            }

            chunk = chunk_rx.recv() => match chunk {
                Some(chunk) => chunks.push(chunk),
                None => break StopReason::DeviceClosed,
            },

            _ = frames.tick() => {
                let energy = monitor.sample_energy();
                match policy.observe(energy, silence_deadline.is_some()) {
                    SilenceAction::Arm => {
                        debug!("Silence detected (energy {:.4}), arming timer", energy);
                        silence_deadline = Some(Instant::now() + config.silence_duration);
                    }
                    SilenceAction::Disarm => {
                        debug!("Speech resumed (energy {:.4}), disarming timer", energy);
                        silence_deadline = None;
                    }
                    SilenceAction::Keep => {}
                }
            }
        }
    };

    // The frame loop and the silence timer end here, together
    drop(frames);
    info!("Recording stopped: {:?}", reason);

    finalize(inner, device, chunk_rx, chunks, language, utterance_tx).await;
}

/// Release the device, assemble the payload and emit at most one utterance
async fn finalize(
    inner: Arc<Mutex<Inner>>,
    device: SharedDevice,
    mut chunk_rx: mpsc::Receiver<AudioChunk>,
    mut chunks: Vec<AudioChunk>,
    language: LanguageCode,
    utterance_tx: mpsc::Sender<Utterance>,
) {
    inner.lock().await.state = RecordingState::Finalizing;

    let (encoding, sample_rate_hz) = {
        let mut device = device.lock().await;
        if let Err(e) = device.stop().await {
            warn!("Failed to release {}: {:#}", device.name(), e);
        }
        (device.encoding(), device.sample_rate())
    };

    // Chunks flushed by the device while stopping
    while let Ok(chunk) = chunk_rx.try_recv() {
        chunks.push(chunk);
    }
    drop(chunk_rx);

    let audio: Vec<u8> = chunks.into_iter().flat_map(|chunk| chunk.data).collect();

    let mut guard = inner.lock().await;
    // Detach our own handle; stop() may already have taken it
    guard.session = None;

    if audio.is_empty() {
        info!("Recording was empty, no turn started");
        guard.state = RecordingState::Idle;
        return;
    }

    guard.turn_in_flight = true;
    drop(guard);

    info!("Emitting utterance: {} bytes ({})", audio.len(), language);

    let utterance = Utterance {
        audio,
        language,
        encoding,
        sample_rate_hz,
    };

    if utterance_tx.send(utterance).await.is_err() {
        warn!("Utterance receiver dropped, discarding recording");
        let mut guard = inner.lock().await;
        guard.turn_in_flight = false;
        guard.state = RecordingState::Idle;
    }
}
