use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{
    Alternative, EngineError, SpeechSynthesizer, SynthesisRequest, Transcriber,
    TranscriptSegment, TranscriptionRequest,
};

pub const SPEECH_ENDPOINT: &str = "https://speech.googleapis.com";
pub const TTS_ENDPOINT: &str = "https://texttospeech.googleapis.com";

// ============================================================================
// Speech-to-Text
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: &'a str,
}

#[derive(Serialize)]
struct RecognitionAudio {
    content: String, // Base64-encoded audio bytes
}

#[derive(Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
    confidence: Option<f32>,
}

/// Cloud Speech-to-Text client (synchronous `speech:recognize`)
pub struct GoogleSpeechClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleSpeechClient {
    pub fn new(api_key: String) -> Result<Self, EngineError> {
        Self::with_endpoint(api_key, SPEECH_ENDPOINT.to_string())
    }

    pub fn with_endpoint(api_key: String, endpoint: String) -> Result<Self, EngineError> {
        if api_key.is_empty() {
            return Err(EngineError::Config(
                "Google API key required for Speech-to-Text".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl Transcriber for GoogleSpeechClient {
    async fn transcribe(
        &self,
        request: TranscriptionRequest<'_>,
    ) -> Result<Vec<TranscriptSegment>, EngineError> {
        debug!(
            "Starting transcription ({} bytes, {}, {}Hz, {})",
            request.audio.len(),
            request.encoding.as_str(),
            request.sample_rate_hz,
            request.language
        );

        let body = RecognizeRequest {
            config: RecognitionConfig {
                encoding: request.encoding.as_str(),
                sample_rate_hertz: request.sample_rate_hz,
                language_code: request.language.as_str(),
            },
            audio: RecognitionAudio {
                content: base64::engine::general_purpose::STANDARD.encode(request.audio),
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/speech:recognize", self.endpoint))
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Speech-to-Text error {}: {}", status, body);
            return Err(EngineError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| EngineError::MalformedResponse(e.to_string()))?;

        let segments: Vec<TranscriptSegment> = parsed
            .results
            .into_iter()
            .map(|result| TranscriptSegment {
                alternatives: result
                    .alternatives
                    .into_iter()
                    .map(|alt| Alternative {
                        transcript: alt.transcript,
                        confidence: alt.confidence,
                    })
                    .collect(),
            })
            .collect();

        info!("Transcription complete: {} segments", segments.len());

        Ok(segments)
    }
}

// ============================================================================
// Text-to-Speech
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    ssml_gender: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

/// Cloud Text-to-Speech client
pub struct GoogleTtsClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleTtsClient {
    pub fn new(api_key: String) -> Result<Self, EngineError> {
        Self::with_endpoint(api_key, TTS_ENDPOINT.to_string())
    }

    pub fn with_endpoint(api_key: String, endpoint: String) -> Result<Self, EngineError> {
        if api_key.is_empty() {
            return Err(EngineError::Config(
                "Google API key required for Text-to-Speech".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for GoogleTtsClient {
    async fn synthesize(
        &self,
        request: SynthesisRequest<'_>,
    ) -> Result<Option<Vec<u8>>, EngineError> {
        debug!(
            "Starting synthesis ({} chars, {}, {})",
            request.text.chars().count(),
            request.language,
            request.voice_gender.as_str()
        );

        let body = SynthesizeRequest {
            input: SynthesisInput { text: request.text },
            voice: VoiceSelection {
                language_code: request.language.as_str(),
                ssml_gender: request.voice_gender.as_str(),
            },
            audio_config: AudioConfig {
                audio_encoding: request.encoding.as_str(),
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/text:synthesize", self.endpoint))
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Text-to-Speech error {}: {}", status, body);
            return Err(EngineError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| EngineError::MalformedResponse(e.to_string()))?;

        let audio = match parsed.audio_content.filter(|content| !content.is_empty()) {
            Some(content) => base64::engine::general_purpose::STANDARD
                .decode(content)
                .map_err(|e| EngineError::MalformedResponse(format!("audioContent: {}", e)))?,
            None => return Ok(None),
        };

        info!("Synthesis complete: {} bytes", audio.len());

        Ok(Some(audio))
    }
}
