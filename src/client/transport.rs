use reqwest::multipart::{Form, Part};
use reqwest::{header, Client};
use thiserror::Error;
use tracing::{debug, warn};

use crate::http::wire::{
    self, ErrorResponse, WireError, AUDIO_FIELD, IS_ROLEPLAY_FIELD, LANGUAGE_FIELD,
    ROLEPLAY_CONTEXT_FIELD, SCENARIO_TITLE_FIELD,
};
use crate::turn::{TurnError, TurnOrchestrator, TurnRequest, TurnResult};

#[derive(Debug, Error)]
pub enum ClientError {
    /// Request never produced a response
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with an error payload
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response could not be decoded
    #[error("protocol error: {0}")]
    Protocol(#[from] WireError),

    /// In-process turn failed
    #[error(transparent)]
    Turn(#[from] TurnError),
}

/// Submits a finished utterance and waits for the tutor's reply
#[async_trait::async_trait]
pub trait TurnTransport: Send + Sync {
    async fn submit(&self, request: TurnRequest) -> Result<TurnResult, ClientError>;
}

/// Runs turns in-process, without an HTTP hop
#[async_trait::async_trait]
impl TurnTransport for TurnOrchestrator {
    async fn submit(&self, request: TurnRequest) -> Result<TurnResult, ClientError> {
        Ok(self.run_turn(request).await?)
    }
}

/// Talks to a remote `/api/chat` endpoint
pub struct HttpTurnClient {
    client: Client,
    url: String,
}

impl HttpTurnClient {
    /// `base_url` is the server root, e.g. `http://localhost:3000`
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}/api/chat", base_url.trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn form(request: TurnRequest) -> Result<Form, reqwest::Error> {
        let TurnRequest {
            utterance,
            roleplay,
        } = request;

        let audio = Part::bytes(utterance.audio)
            .file_name("recording")
            .mime_str(&utterance.encoding.content_type(utterance.sample_rate_hz))?;

        let mut form = Form::new()
            .part(AUDIO_FIELD, audio)
            .text(LANGUAGE_FIELD, utterance.language.to_string());

        if let Some(roleplay) = roleplay {
            form = form
                .text(IS_ROLEPLAY_FIELD, "true")
                .text(ROLEPLAY_CONTEXT_FIELD, roleplay.context_text)
                .text(SCENARIO_TITLE_FIELD, roleplay.scenario_title);
        }

        Ok(form)
    }
}

#[async_trait::async_trait]
impl TurnTransport for HttpTurnClient {
    async fn submit(&self, request: TurnRequest) -> Result<TurnResult, ClientError> {
        let form = Self::form(request)?;

        debug!("Submitting turn to {}", self.url);
        let response = self.client.post(&self.url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            warn!("Turn rejected by server ({}): {}", status, message);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let decoded =
            wire::decode_turn_response_stream(&content_type, response.bytes_stream()).await?;

        Ok(TurnResult {
            transcript: decoded.text.user,
            reply_text: decoded.text.ai,
            reply_audio: decoded.audio,
        })
    }
}
