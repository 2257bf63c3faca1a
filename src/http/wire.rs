//! Field names and multipart framing for the `/api/chat` exchange
//!
//! Requests are ordinary `multipart/form-data` uploads. Responses reuse the
//! same container: an `audio` part with the synthesized reply followed by a
//! `textData` part holding `{"user": ..., "ai": ...}` as JSON.

use axum::body::Bytes;
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use thiserror::Error;

pub const AUDIO_FIELD: &str = "audio";
pub const LANGUAGE_FIELD: &str = "language";
pub const IS_ROLEPLAY_FIELD: &str = "isRoleplay";
pub const ROLEPLAY_CONTEXT_FIELD: &str = "roleplayContext";
pub const SCENARIO_TITLE_FIELD: &str = "scenarioTitle";
pub const TEXT_DATA_FIELD: &str = "textData";

/// Text half of a turn response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextData {
    /// Transcript of the learner's utterance
    pub user: String,
    /// Tutor reply
    pub ai: String,
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("content type is not multipart or has no boundary: {0}")]
    MissingBoundary(String),

    #[error("response has no `{0}` part")]
    MissingPart(&'static str),

    #[error("malformed multipart body: {0}")]
    Multipart(#[from] multer::Error),

    #[error("invalid textData JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decoded turn response
#[derive(Debug, Clone)]
pub struct TurnResponse {
    pub audio: Vec<u8>,
    pub text: TextData,
}

/// Multipart body for a successful turn
pub struct TurnResponseBody {
    pub boundary: String,
    pub bytes: Vec<u8>,
}

impl TurnResponseBody {
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

/// Frame reply audio and text into one multipart body
pub fn encode_turn_response(
    audio: &[u8],
    audio_mime: &str,
    text: &TextData,
) -> Result<TurnResponseBody, WireError> {
    let boundary = format!("genie-{}", uuid::Uuid::new_v4().simple());
    let json = serde_json::to_vec(text)?;

    let mut bytes = Vec::with_capacity(audio.len() + json.len() + 512);
    push_part(
        &mut bytes,
        &boundary,
        &format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"reply\"\r\nContent-Type: {}",
            AUDIO_FIELD, audio_mime
        ),
        audio,
    );
    push_part(
        &mut bytes,
        &boundary,
        &format!(
            "Content-Disposition: form-data; name=\"{}\"\r\nContent-Type: application/json",
            TEXT_DATA_FIELD
        ),
        &json,
    );
    bytes.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    Ok(TurnResponseBody { boundary, bytes })
}

fn push_part(out: &mut Vec<u8>, boundary: &str, headers: &str, body: &[u8]) {
    out.extend_from_slice(format!("--{}\r\n{}\r\n\r\n", boundary, headers).as_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(b"\r\n");
}

/// Parse a turn response produced by [`encode_turn_response`] as it streams in
pub async fn decode_turn_response_stream<S, E>(
    content_type: &str,
    body: S,
) -> Result<TurnResponse, WireError>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let boundary = multer::parse_boundary(content_type)
        .map_err(|_| WireError::MissingBoundary(content_type.to_string()))?;
    let mut multipart = multer::Multipart::new(body, boundary);

    let mut audio = None;
    let mut text = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(AUDIO_FIELD) => audio = Some(field.bytes().await?.to_vec()),
            Some(TEXT_DATA_FIELD) => {
                text = Some(serde_json::from_slice::<TextData>(&field.bytes().await?)?)
            }
            _ => {}
        }
    }

    Ok(TurnResponse {
        audio: audio.ok_or(WireError::MissingPart(AUDIO_FIELD))?,
        text: text.ok_or(WireError::MissingPart(TEXT_DATA_FIELD))?,
    })
}

/// Parse a fully buffered turn response
pub async fn decode_turn_response(
    content_type: &str,
    body: impl Into<Bytes>,
) -> Result<TurnResponse, WireError> {
    let body = body.into();
    let chunk = stream::once(async move { Ok::<_, Infallible>(body) });
    decode_turn_response_stream(content_type, chunk).await
}
