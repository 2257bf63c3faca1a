use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::error::{InternalTurnError, TurnError, TurnStage};
use super::prompt::build_prompt;
use super::types::{AudioEncoding, TurnRequest, TurnResult, VoiceGender};
use crate::engines::{
    EngineError, ReplyGenerator, SpeechSynthesizer, SynthesisRequest, Transcriber,
    TranscriptionRequest,
};

/// Fixed engine parameters for every turn
#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// Voice used for replies
    pub voice_gender: VoiceGender,

    /// Encoding of synthesized replies
    pub output_encoding: AudioEncoding,

    /// Upper bound for each external call
    pub stage_timeout: Duration,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            voice_gender: VoiceGender::Female,
            output_encoding: AudioEncoding::Mp3,
            stage_timeout: Duration::from_secs(30),
        }
    }
}

/// Runs transcribe -> prompt -> generate -> synthesize for one utterance
///
/// Holds only shared, immutable engine handles, so concurrent turns never
/// contend with each other.
#[derive(Clone)]
pub struct TurnOrchestrator {
    transcriber: Arc<dyn Transcriber>,
    generator: Arc<dyn ReplyGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    config: TurnConfig,
}

impl TurnOrchestrator {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        generator: Arc<dyn ReplyGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        config: TurnConfig,
    ) -> Self {
        Self {
            transcriber,
            generator,
            synthesizer,
            config,
        }
    }

    pub fn config(&self) -> &TurnConfig {
        &self.config
    }

    /// Run one turn to completion or failure
    pub async fn run_turn(&self, request: TurnRequest) -> Result<TurnResult, TurnError> {
        let started = Instant::now();
        let roleplay = request.roleplay.is_some();

        let result = self.execute(request).await;

        match &result {
            Ok(turn) => info!(
                "Turn complete in {:?} (roleplay={}, transcript={} chars, reply={} chars, audio={} bytes)",
                started.elapsed(),
                roleplay,
                turn.transcript.len(),
                turn.reply_text.len(),
                turn.reply_audio.len()
            ),
            Err(TurnError::Internal(cause)) => {
                error!("Turn failed after {:?}: {} ({:?})", started.elapsed(), cause, cause)
            }
            Err(e) => warn!("Turn rejected after {:?}: {}", started.elapsed(), e),
        }

        result
    }

    async fn execute(&self, request: TurnRequest) -> Result<TurnResult, TurnError> {
        // 1. Transcribe
        let segments = self
            .bounded(TurnStage::Transcription, async {
                self.transcriber
                    .transcribe(TranscriptionRequest {
                        audio: &request.utterance.audio,
                        encoding: request.utterance.encoding,
                        sample_rate_hz: request.utterance.sample_rate_hz,
                        language: request.language(),
                    })
                    .await
            })
            .await?
            .map_err(InternalTurnError::Transcription)?;

        let transcript = segments
            .iter()
            .filter_map(|segment| segment.best())
            .map(|alt| alt.transcript.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if transcript.trim().is_empty() {
            return Err(TurnError::NoSpeechDetected);
        }

        debug!("Transcript ({}): {}", request.language(), transcript);

        // 2. Prompt
        let prompt = build_prompt(&transcript, request.language(), request.roleplay.as_ref());
        debug!("Using {:?} prompt template", prompt.template);

        // 3. Generate
        let reply_text = self
            .bounded(TurnStage::Generation, self.generator.generate(&prompt.text))
            .await?
            .map_err(InternalTurnError::Generation)?;

        if reply_text.trim().is_empty() {
            return Err(InternalTurnError::EmptyReply.into());
        }

        // 4. Synthesize
        let reply_audio = self
            .bounded(TurnStage::Synthesis, async {
                self.synthesizer
                    .synthesize(SynthesisRequest {
                        text: &reply_text,
                        language: request.language(),
                        voice_gender: self.config.voice_gender,
                        encoding: self.config.output_encoding,
                    })
                    .await
            })
            .await?
            .map_err(InternalTurnError::Synthesis)?;

        // 5. Empty synthesis output is its own failure class
        let reply_audio = match reply_audio {
            Some(audio) if !audio.is_empty() => audio,
            _ => return Err(TurnError::SynthesisFailed),
        };

        Ok(TurnResult {
            transcript,
            reply_text,
            reply_audio,
        })
    }

    /// Apply the stage timeout; the stage future is dropped on expiry
    async fn bounded<T>(
        &self,
        stage: TurnStage,
        call: impl Future<Output = Result<T, EngineError>>,
    ) -> Result<Result<T, EngineError>, InternalTurnError> {
        let started = Instant::now();
        tokio::time::timeout(self.config.stage_timeout, call)
            .await
            .map_err(|_| InternalTurnError::Timeout {
                stage,
                elapsed: started.elapsed(),
            })
    }
}
