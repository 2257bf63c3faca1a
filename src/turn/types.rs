use serde::{Deserialize, Serialize};
use std::fmt;

/// Locale tag used for both transcription and synthesis (e.g. "en-US", "hi-IN")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub const DEFAULT: &'static str = "en-US";

    /// Languages offered to learners in the tutor UI
    pub const SUPPORTED: [&'static str; 5] = ["en-US", "hi-IN", "mr-IN", "gu-IN", "ta-IN"];

    /// Parse an IETF-style tag. Empty or malformed input yields `None`.
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() || tag.len() > 35 {
            return None;
        }

        let well_formed = tag
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()));

        well_formed.then(|| Self(tag.to_string()))
    }

    /// Parse, falling back to `en-US` for missing or empty values
    pub fn parse_or_default(tag: Option<&str>) -> Option<Self> {
        match tag.map(str::trim) {
            None | Some("") => Some(Self::default()),
            Some(tag) => Self::parse(tag),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.contains(&self.0.as_str())
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Audio encodings understood by the speech engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    WebmOpus,
    OggOpus,
    Linear16,
    Mp3,
}

impl AudioEncoding {
    /// Content type used when the payload travels over HTTP
    pub fn mime_type(self) -> &'static str {
        match self {
            AudioEncoding::WebmOpus => "audio/webm",
            AudioEncoding::OggOpus => "audio/ogg",
            AudioEncoding::Linear16 => "audio/l16",
            AudioEncoding::Mp3 => "audio/mpeg",
        }
    }

    /// Inverse of [`mime_type`](Self::mime_type); parameters are ignored
    pub fn from_mime(content_type: &str) -> Option<Self> {
        let media_type = content_type.split(';').next()?.trim();
        [
            AudioEncoding::WebmOpus,
            AudioEncoding::OggOpus,
            AudioEncoding::Linear16,
            AudioEncoding::Mp3,
        ]
        .into_iter()
        .find(|encoding| media_type.eq_ignore_ascii_case(encoding.mime_type()))
    }

    /// Content type with an explicit sample rate, e.g. `audio/l16; rate=16000`
    pub fn content_type(self, sample_rate_hz: u32) -> String {
        format!("{}; rate={}", self.mime_type(), sample_rate_hz)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AudioEncoding::WebmOpus => "WEBM_OPUS",
            AudioEncoding::OggOpus => "OGG_OPUS",
            AudioEncoding::Linear16 => "LINEAR16",
            AudioEncoding::Mp3 => "MP3",
        }
    }
}

/// Voice selection for speech synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoiceGender {
    Female,
    Male,
    Neutral,
}

impl VoiceGender {
    pub fn as_str(self) -> &'static str {
        match self {
            VoiceGender::Female => "FEMALE",
            VoiceGender::Male => "MALE",
            VoiceGender::Neutral => "NEUTRAL",
        }
    }
}

/// A finished recording, consumed by exactly one turn
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Concatenated audio chunks (never empty)
    pub audio: Vec<u8>,
    /// Language active when recording started
    pub language: LanguageCode,
    /// Encoding of `audio` as produced by the capture device
    pub encoding: AudioEncoding,
    /// Sample rate of `audio` in Hz
    pub sample_rate_hz: u32,
}

/// Scenario persona sent along with a roleplay turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleplayContext {
    pub scenario_title: String,
    pub context_text: String,
}

/// Input to one voice turn
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub utterance: Utterance,
    /// Present iff the session is in roleplay mode with a scenario selected
    pub roleplay: Option<RoleplayContext>,
}

impl TurnRequest {
    pub fn new(utterance: Utterance, roleplay: Option<RoleplayContext>) -> Self {
        Self {
            utterance,
            roleplay,
        }
    }

    pub fn language(&self) -> &LanguageCode {
        &self.utterance.language
    }
}

/// Output of a successful voice turn
#[derive(Debug, Clone)]
pub struct TurnResult {
    /// What the learner said (never empty)
    pub transcript: String,
    /// Tutor reply, verbatim from the generator
    pub reply_text: String,
    /// Synthesized reply
    pub reply_audio: Vec<u8>,
}
