//! External speech and language engines
//!
//! The turn pipeline only depends on the three traits below. Concrete
//! clients are built once at startup and shared behind `Arc`:
//! - `google::GoogleSpeechClient` - Cloud Speech-to-Text (`Transcriber`)
//! - `google::GoogleTtsClient` - Cloud Text-to-Speech (`SpeechSynthesizer`)
//! - `gemini::GeminiClient` - Gemini `generateContent` (`ReplyGenerator`)

pub mod gemini;
pub mod google;

use crate::turn::{AudioEncoding, LanguageCode, VoiceGender};
use thiserror::Error;

pub use gemini::GeminiClient;
pub use google::{GoogleSpeechClient, GoogleTtsClient};

/// Failure reported by an external engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine not configured: {0}")]
    Config(String),

    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("engine returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed engine response: {0}")]
    MalformedResponse(String),
}

/// Audio submitted for recognition
#[derive(Debug, Clone)]
pub struct TranscriptionRequest<'a> {
    pub audio: &'a [u8],
    pub encoding: AudioEncoding,
    pub sample_rate_hz: u32,
    pub language: &'a LanguageCode,
}

/// Candidate transcription for one result segment
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub transcript: String,
    pub confidence: Option<f32>,
}

/// One recognized segment; alternatives are ordered best first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranscriptSegment {
    pub alternatives: Vec<Alternative>,
}

impl TranscriptSegment {
    pub fn best(&self) -> Option<&Alternative> {
        self.alternatives.first()
    }
}

/// Text submitted for synthesis
#[derive(Debug, Clone)]
pub struct SynthesisRequest<'a> {
    pub text: &'a str,
    pub language: &'a LanguageCode,
    pub voice_gender: VoiceGender,
    pub encoding: AudioEncoding,
}

/// Speech-to-text engine. An empty result list means no speech was found.
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        request: TranscriptionRequest<'_>,
    ) -> Result<Vec<TranscriptSegment>, EngineError>;
}

/// Free-form text completion
#[async_trait::async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, EngineError>;
}

/// Text-to-speech engine. `Ok(None)` signals that no audio was produced.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        request: SynthesisRequest<'_>,
    ) -> Result<Option<Vec<u8>>, EngineError>;
}
