use super::state::AppState;
use super::wire::{
    self, ErrorResponse, TextData, AUDIO_FIELD, IS_ROLEPLAY_FIELD, LANGUAGE_FIELD,
    ROLEPLAY_CONTEXT_FIELD, SCENARIO_TITLE_FIELD,
};
use crate::conversation::{catalog, RoleplayScenario};
use crate::turn::{LanguageCode, RoleplayContext, TurnRequest, Utterance};
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Fields of a `/api/chat` upload
#[derive(Debug, Default)]
struct ChatForm {
    audio: Option<Vec<u8>>,
    audio_type: Option<String>,
    language: Option<String>,
    is_roleplay: Option<String>,
    roleplay_context: Option<String>,
    scenario_title: Option<String>,
}

impl ChatForm {
    async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                AUDIO_FIELD => {
                    form.audio_type = field.content_type().map(str::to_string);
                    form.audio = Some(field.bytes().await?.to_vec());
                }
                LANGUAGE_FIELD => form.language = Some(field.text().await?),
                IS_ROLEPLAY_FIELD => form.is_roleplay = Some(field.text().await?),
                ROLEPLAY_CONTEXT_FIELD => form.roleplay_context = Some(field.text().await?),
                SCENARIO_TITLE_FIELD => form.scenario_title = Some(field.text().await?),
                _ => {}
            }
        }

        Ok(form)
    }

    /// Roleplay applies only when flagged and a persona is supplied
    fn roleplay(&self) -> Option<RoleplayContext> {
        if self.is_roleplay.as_deref() != Some("true") {
            return None;
        }

        let context_text = self
            .roleplay_context
            .as_deref()
            .filter(|text| !text.trim().is_empty())?;

        Some(RoleplayContext {
            scenario_title: self.scenario_title.clone().unwrap_or_default(),
            context_text: context_text.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub default: String,
    pub supported: Vec<&'static str>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/chat
/// Run one voice turn for an uploaded recording
pub async fn chat(State(state): State<AppState>, multipart: Multipart) -> Response {
    let form = match ChatForm::read(multipart).await {
        Ok(form) => form,
        Err(e) => {
            warn!("Rejected chat upload: {}", e.body_text());
            return error_response(e.status(), e.body_text());
        }
    };

    let roleplay = form.roleplay();
    let format = state.upload.resolve(form.audio_type.as_deref());

    let audio = match form.audio {
        Some(audio) if !audio.is_empty() => audio,
        _ => return error_response(StatusCode::BAD_REQUEST, "No audio file provided."),
    };

    let language = match form.language.as_deref().map(str::trim) {
        None | Some("") => state.default_language.clone(),
        Some(tag) => match LanguageCode::parse(tag) {
            Some(language) => language,
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid language code: {}", tag),
                )
            }
        },
    };

    info!(
        "Chat turn: {} bytes {}/{}, language {}, roleplay {}",
        audio.len(),
        format.encoding.as_str(),
        format.sample_rate_hz,
        language,
        roleplay
            .as_ref()
            .map(|r| r.scenario_title.as_str())
            .unwrap_or("off")
    );

    let utterance = Utterance {
        audio,
        language,
        encoding: format.encoding,
        sample_rate_hz: format.sample_rate_hz,
    };

    let result = match state
        .orchestrator
        .run_turn(TurnRequest::new(utterance, roleplay))
        .await
    {
        Ok(result) => result,
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return error_response(status, e.public_message());
        }
    };

    let text = TextData {
        user: result.transcript,
        ai: result.reply_text,
    };
    let audio_mime = state.orchestrator.config().output_encoding.mime_type();

    match wire::encode_turn_response(&result.reply_audio, audio_mime, &text) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, body.content_type())],
            body.bytes,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode turn response: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred.",
            )
        }
    }
}

/// GET /api/scenarios
/// Built-in roleplay scenarios in display order
pub async fn list_scenarios() -> Json<&'static [RoleplayScenario]> {
    Json(catalog())
}

/// GET /api/languages
pub async fn list_languages(State(state): State<AppState>) -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        default: state.default_language.to_string(),
        supported: LanguageCode::SUPPORTED.to_vec(),
    })
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
