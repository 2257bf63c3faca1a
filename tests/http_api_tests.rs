// Integration tests for the HTTP API
//
// Requests go through the full router (body limit, CORS, tracing) with fake
// engines behind the turn orchestrator.

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use genie_voice::engines::{
    Alternative, EngineError, ReplyGenerator, SpeechSynthesizer, SynthesisRequest, Transcriber,
    TranscriptSegment, TranscriptionRequest,
};
use genie_voice::http::wire::{self, TextData};
use genie_voice::turn::{AudioEncoding, TurnConfig, TurnOrchestrator};
use genie_voice::{create_router, AppState, LanguageCode, UploadFormat};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

#[derive(Default)]
struct Seen {
    transcription: Mutex<Option<(AudioEncoding, u32, String, Vec<u8>)>>,
    prompt: Mutex<Option<String>>,
}

struct EchoTranscriber {
    seen: Arc<Seen>,
    transcript: &'static str,
}

#[async_trait::async_trait]
impl Transcriber for EchoTranscriber {
    async fn transcribe(
        &self,
        request: TranscriptionRequest<'_>,
    ) -> Result<Vec<TranscriptSegment>, EngineError> {
        *self.seen.transcription.lock().unwrap() = Some((
            request.encoding,
            request.sample_rate_hz,
            request.language.to_string(),
            request.audio.to_vec(),
        ));
        Ok(vec![TranscriptSegment {
            alternatives: vec![Alternative {
                transcript: self.transcript.to_string(),
                confidence: None,
            }],
        }])
    }
}

struct CannedGenerator {
    seen: Arc<Seen>,
}

#[async_trait::async_trait]
impl ReplyGenerator for CannedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, EngineError> {
        *self.seen.prompt.lock().unwrap() = Some(prompt.to_string());
        Ok("Very good!".to_string())
    }
}

struct CannedSynthesizer {
    audio: Option<Vec<u8>>,
}

#[async_trait::async_trait]
impl SpeechSynthesizer for CannedSynthesizer {
    async fn synthesize(
        &self,
        _request: SynthesisRequest<'_>,
    ) -> Result<Option<Vec<u8>>, EngineError> {
        Ok(self.audio.clone())
    }
}

fn app(transcript: &'static str, audio: Option<Vec<u8>>) -> (axum::Router, Arc<Seen>) {
    let seen = Arc::new(Seen::default());
    let orchestrator = TurnOrchestrator::new(
        Arc::new(EchoTranscriber {
            seen: Arc::clone(&seen),
            transcript,
        }),
        Arc::new(CannedGenerator {
            seen: Arc::clone(&seen),
        }),
        Arc::new(CannedSynthesizer { audio }),
        TurnConfig::default(),
    );

    let state = AppState::new(orchestrator).with_max_body_bytes(64 * 1024);
    (create_router(state), seen)
}

const BOUNDARY: &str = "test-boundary-7MA4YWxk";

/// Build a multipart/form-data body from (name, filename, bytes) triples
fn form(fields: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: audio/webm\r\n\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(value);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn chat_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let (app, _) = app("hi", Some(vec![1]));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&bytes[..], b"OK");

    Ok(())
}

#[tokio::test]
async fn test_chat_returns_audio_and_text_parts() -> Result<()> {
    let (app, seen) = app("My name is Ravi", Some(vec![0xff, 0xf3, 0x01]));

    let body = form(&[
        ("audio", Some("recording.webm"), b"opus-bytes"),
        ("language", None, b"hi-IN"),
    ]);
    let response = app.oneshot(chat_request(body)).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let decoded = wire::decode_turn_response(&content_type, bytes).await?;

    assert_eq!(decoded.audio, vec![0xff, 0xf3, 0x01]);
    assert_eq!(
        decoded.text,
        TextData {
            user: "My name is Ravi".to_string(),
            ai: "Very good!".to_string(),
        }
    );

    // audio/webm without a rate takes the configured upload rate
    let transcription = seen.transcription.lock().unwrap().clone();
    assert_eq!(
        transcription,
        Some((
            AudioEncoding::WebmOpus,
            48000,
            "hi-IN".to_string(),
            b"opus-bytes".to_vec()
        ))
    );

    Ok(())
}

/// Single `audio` part with the given Content-Type header, if any
fn audio_upload(content_type: Option<&str>, audio: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"recording\"\r\n",
        BOUNDARY
    )
    .into_bytes();
    if let Some(content_type) = content_type {
        body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(audio);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

#[tokio::test]
async fn test_declared_pcm_upload_keeps_its_format() -> Result<()> {
    let (app, seen) = app("Hello", Some(vec![1]));

    let body = audio_upload(Some("audio/l16; rate=16000"), &[0, 1, 2, 3]);
    let response = app.oneshot(chat_request(body)).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let format = seen
        .transcription
        .lock()
        .unwrap()
        .as_ref()
        .map(|t| (t.0, t.1));
    assert_eq!(format, Some((AudioEncoding::Linear16, 16000)));

    Ok(())
}

#[tokio::test]
async fn test_undeclared_upload_uses_server_format() -> Result<()> {
    let (app, seen) = app("Hello", Some(vec![1]));

    let body = audio_upload(None, b"opus");
    let response = app.oneshot(chat_request(body)).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let format = seen
        .transcription
        .lock()
        .unwrap()
        .as_ref()
        .map(|t| (t.0, t.1));
    assert_eq!(format, Some((AudioEncoding::WebmOpus, 48000)));

    Ok(())
}

#[tokio::test]
async fn test_missing_language_uses_default() -> Result<()> {
    let (app, seen) = app("Hello", Some(vec![1]));

    let body = form(&[("audio", Some("a.webm"), b"abc")]);
    let response = app.oneshot(chat_request(body)).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let language = seen
        .transcription
        .lock()
        .unwrap()
        .as_ref()
        .map(|t| t.2.clone());
    assert_eq!(language.as_deref(), Some(LanguageCode::DEFAULT));

    Ok(())
}

#[tokio::test]
async fn test_missing_audio_is_bad_request() -> Result<()> {
    let (app, seen) = app("Hello", Some(vec![1]));

    let body = form(&[("language", None, b"en-US")]);
    let response = app.oneshot(chat_request(body)).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await?;
    assert_eq!(json["error"], "No audio file provided.");
    assert!(seen.transcription.lock().unwrap().is_none());

    Ok(())
}

#[tokio::test]
async fn test_invalid_language_is_bad_request() -> Result<()> {
    let (app, _) = app("Hello", Some(vec![1]));

    let body = form(&[
        ("audio", Some("a.webm"), b"abc"),
        ("language", None, b"en US!"),
    ]);
    let response = app.oneshot(chat_request(body)).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_roleplay_fields_select_roleplay_prompt() -> Result<()> {
    let (app, seen) = app("Apples please", Some(vec![1]));

    let body = form(&[
        ("audio", Some("a.webm"), b"abc"),
        ("language", None, b"en-US"),
        ("isRoleplay", None, b"true"),
        ("roleplayContext", None, b"You are a helpful shopkeeper."),
        ("scenarioTitle", None, b"At the Store"),
    ]);
    let response = app.oneshot(chat_request(body)).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let prompt = seen.prompt.lock().unwrap().clone().unwrap_or_default();
    assert!(prompt.contains("IMPORTANT ROLEPLAY GUIDELINES:"));
    assert!(prompt.contains("At the Store"));
    assert!(prompt.contains("You are a helpful shopkeeper."));

    Ok(())
}

#[tokio::test]
async fn test_roleplay_flag_without_context_uses_tutor_prompt() -> Result<()> {
    let (app, seen) = app("Hello", Some(vec![1]));

    let body = form(&[
        ("audio", Some("a.webm"), b"abc"),
        ("isRoleplay", None, b"true"),
        ("roleplayContext", None, b"   "),
    ]);
    let response = app.oneshot(chat_request(body)).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let prompt = seen.prompt.lock().unwrap().clone().unwrap_or_default();
    assert!(prompt.contains("You are SpeakGenie"));
    assert!(!prompt.contains("IMPORTANT ROLEPLAY GUIDELINES:"));

    Ok(())
}

#[tokio::test]
async fn test_context_without_flag_uses_tutor_prompt() -> Result<()> {
    let (app, seen) = app("Hello", Some(vec![1]));

    let body = form(&[
        ("audio", Some("a.webm"), b"abc"),
        ("isRoleplay", None, b"false"),
        ("roleplayContext", None, b"You are a helpful shopkeeper."),
    ]);
    let response = app.oneshot(chat_request(body)).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let prompt = seen.prompt.lock().unwrap().clone().unwrap_or_default();
    assert!(!prompt.contains("IMPORTANT ROLEPLAY GUIDELINES:"));

    Ok(())
}

#[tokio::test]
async fn test_silence_maps_to_no_speech_error() -> Result<()> {
    let (app, _) = app("   ", Some(vec![1]));

    let body = form(&[("audio", Some("a.webm"), b"abc")]);
    let response = app.oneshot(chat_request(body)).await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = json_body(response).await?;
    assert_eq!(json["error"], "No speech detected");
    assert!(json.get("user").is_none());

    Ok(())
}

#[tokio::test]
async fn test_synthesis_failure_maps_to_bad_gateway() -> Result<()> {
    let (app, _) = app("Hello", None);

    let body = form(&[("audio", Some("a.webm"), b"abc")]);
    let response = app.oneshot(chat_request(body)).await?;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = json_body(response).await?;
    assert_eq!(json["error"], "Could not synthesize speech.");

    Ok(())
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() -> Result<()> {
    let (app, seen) = app("Hello", Some(vec![1]));

    let big = vec![7u8; 128 * 1024];
    let body = form(&[("audio", Some("a.webm"), &big)]);
    let response = app.oneshot(chat_request(body)).await?;

    assert!(!response.status().is_success());
    assert!(seen.transcription.lock().unwrap().is_none());

    Ok(())
}

#[tokio::test]
async fn test_scenarios_catalog() -> Result<()> {
    let (app, _) = app("Hello", Some(vec![1]));

    let response = app
        .oneshot(Request::builder().uri("/api/scenarios").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await?;
    let ids: Vec<&str> = json
        .as_array()
        .map(|items| items.iter().filter_map(|s| s["id"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(ids, ["school", "store", "home", "playground"]);
    assert_eq!(
        json[1]["initialMessage"],
        "Welcome to our store! What would you like to buy today?"
    );

    Ok(())
}

#[tokio::test]
async fn test_languages_list() -> Result<()> {
    let (app, _) = app("Hello", Some(vec![1]));

    let response = app
        .oneshot(Request::builder().uri("/api/languages").body(Body::empty())?)
        .await?;
    let json = json_body(response).await?;

    assert_eq!(json["default"], "en-US");
    assert_eq!(json["supported"].as_array().map(Vec::len), Some(5));

    Ok(())
}

#[test]
fn test_upload_format_defaults_to_browser_opus() {
    let format = UploadFormat::default();
    assert_eq!(format.encoding, AudioEncoding::WebmOpus);
    assert_eq!(format.sample_rate_hz, 48000);
}
