//! Server-side voice turn
//!
//! One turn takes a finished utterance through:
//! - transcription (speech-to-text engine)
//! - prompt construction (roleplay or generic tutor template)
//! - reply generation (text engine)
//! - speech synthesis (text-to-speech engine)
//!
//! Steps run strictly in order and a turn either completes or fails as a
//! whole; there is no partial result.

mod error;
mod orchestrator;
mod prompt;
mod types;

pub use error::{InternalTurnError, TurnError, TurnStage};
pub use orchestrator::{TurnConfig, TurnOrchestrator};
pub use prompt::{build_prompt, Prompt, PromptTemplate};
pub use types::{
    AudioEncoding, LanguageCode, RoleplayContext, TurnRequest, TurnResult, Utterance, VoiceGender,
};
