use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::engines::EngineError;

/// Pipeline stage, used to tag internal failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    Transcription,
    Generation,
    Synthesis,
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnStage::Transcription => "transcription",
            TurnStage::Generation => "generation",
            TurnStage::Synthesis => "synthesis",
        };
        f.write_str(name)
    }
}

/// Why a turn failed
#[derive(Debug, Error)]
pub enum TurnError {
    /// Transcription produced no results or only whitespace
    #[error("no speech detected")]
    NoSpeechDetected,

    /// Synthesis returned no audio
    #[error("speech synthesis returned no audio")]
    SynthesisFailed,

    /// Any collaborator fault; details stay server-side
    #[error("internal turn error: {0}")]
    Internal(#[from] InternalTurnError),
}

/// Typed causes behind `TurnError::Internal`
#[derive(Debug, Error)]
pub enum InternalTurnError {
    #[error("transcription failed: {0}")]
    Transcription(#[source] EngineError),

    #[error("reply generation failed: {0}")]
    Generation(#[source] EngineError),

    #[error("speech synthesis failed: {0}")]
    Synthesis(#[source] EngineError),

    #[error("{stage} timed out after {elapsed:?}")]
    Timeout { stage: TurnStage, elapsed: Duration },

    #[error("reply generation returned empty text")]
    EmptyReply,
}

impl TurnError {
    /// Message safe to show to the learner
    pub fn public_message(&self) -> &'static str {
        match self {
            TurnError::NoSpeechDetected => "No speech detected",
            TurnError::SynthesisFailed => "Could not synthesize speech.",
            TurnError::Internal(_) => "An internal server error occurred.",
        }
    }

    /// HTTP status reported for this failure class
    pub fn status_code(&self) -> u16 {
        match self {
            TurnError::NoSpeechDetected => 422,
            TurnError::SynthesisFailed => 502,
            TurnError::Internal(_) => 500,
        }
    }

    pub fn internal(&self) -> Option<&InternalTurnError> {
        match self {
            TurnError::Internal(cause) => Some(cause),
            _ => None,
        }
    }
}
