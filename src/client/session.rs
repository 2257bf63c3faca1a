use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, MutexGuard};
use tracing::{info, warn};

use super::transport::{ClientError, TurnTransport};
use crate::audio::AudioBackend;
use crate::conversation::Conversation;
use crate::recording::{RecordingConfig, RecordingController, RecordingError, RecordingState};
use crate::turn::{LanguageCode, TurnRequest, TurnResult, Utterance};

/// One learner's voice session: capture, turns and chat log
///
/// Utterances emitted by the recorder are consumed one at a time by
/// [`TutorSession::next_turn`]. The recorder stays in `Finalizing` until
/// that turn resolves, so a new recording cannot start while a reply is
/// pending.
pub struct TutorSession {
    recorder: RecordingController,
    utterances: Mutex<mpsc::Receiver<Utterance>>,
    transport: Arc<dyn TurnTransport>,
    conversation: Mutex<Conversation>,
    language: Mutex<LanguageCode>,
}

impl TutorSession {
    pub fn new(
        backend: Box<dyn AudioBackend>,
        config: RecordingConfig,
        transport: Arc<dyn TurnTransport>,
    ) -> Self {
        let (recorder, utterances) = RecordingController::new(backend, config);

        Self {
            recorder,
            utterances: Mutex::new(utterances),
            transport,
            conversation: Mutex::new(Conversation::new()),
            language: Mutex::new(LanguageCode::default()),
        }
    }

    pub async fn language(&self) -> LanguageCode {
        self.language.lock().await.clone()
    }

    /// Applies to recordings started afterwards
    pub async fn set_language(&self, language: LanguageCode) {
        info!("Session language set to {}", language);
        *self.language.lock().await = language;
    }

    /// Chat log and roleplay state
    pub async fn conversation(&self) -> MutexGuard<'_, Conversation> {
        self.conversation.lock().await
    }

    pub async fn recording_state(&self) -> RecordingState {
        self.recorder.state().await
    }

    /// True while recording, finalizing or waiting on a reply
    pub async fn is_busy(&self) -> bool {
        self.recorder.state().await != RecordingState::Idle
    }

    pub async fn start_recording(&self) -> Result<(), RecordingError> {
        let language = self.language().await;
        self.recorder.start(language).await
    }

    pub async fn stop_recording(&self) -> Result<(), RecordingError> {
        self.recorder.stop().await
    }

    /// Wait for the next utterance and run its turn
    ///
    /// On success both messages are appended to the conversation. The
    /// recorder returns to idle whatever the outcome. Returns `None` once
    /// the recorder is gone.
    pub async fn next_turn(&self) -> Option<Result<TurnResult, ClientError>> {
        let utterance = self.utterances.lock().await.recv().await?;

        // Roleplay context is captured at submission time
        let roleplay = self.conversation.lock().await.roleplay_context();
        let outcome = self
            .transport
            .submit(TurnRequest::new(utterance, roleplay))
            .await;

        match &outcome {
            Ok(turn) => {
                self.conversation.lock().await.record_turn(turn);
            }
            Err(e) => warn!("Turn failed: {}", e),
        }

        if let Err(e) = self.recorder.finish_turn().await {
            warn!("Recorder was not awaiting a turn: {}", e);
        }

        Some(outcome)
    }
}
