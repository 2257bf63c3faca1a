use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::audio::AudioBackendConfig;
use crate::http::UploadFormat;
use crate::recording::{RecordingConfig, SILENCE_DURATION, SILENCE_THRESHOLD};
use crate::turn::{AudioEncoding, LanguageCode, TurnConfig, VoiceGender};

/// Environment overrides look like `GENIE__ENGINES__GEMINI_API_KEY`
pub const ENV_PREFIX: &str = "GENIE";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub turn: TurnSettings,
    pub engines: EnginesConfig,
    pub recording: RecordingSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "genie-voice".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TurnSettings {
    pub default_language: String,
    pub input_encoding: AudioEncoding,
    pub input_sample_rate_hz: u32,
    pub voice_gender: VoiceGender,
    pub output_encoding: AudioEncoding,
    pub stage_timeout_secs: u64,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            default_language: LanguageCode::DEFAULT.to_string(),
            input_encoding: AudioEncoding::WebmOpus,
            input_sample_rate_hz: 48000,
            voice_gender: VoiceGender::Female,
            output_encoding: AudioEncoding::Mp3,
            stage_timeout_secs: 30,
        }
    }
}

/// Credentials and endpoint overrides for the external engines
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EnginesConfig {
    pub google_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub speech_endpoint: Option<String>,
    pub tts_endpoint: Option<String>,
    pub gemini_endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RecordingSettings {
    pub silence_threshold: f32,
    pub silence_duration_ms: u64,
    pub frame_interval_ms: u64,
    pub chunk_ms: u64,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            silence_threshold: SILENCE_THRESHOLD,
            silence_duration_ms: SILENCE_DURATION.as_millis() as u64,
            frame_interval_ms: 16,
            chunk_ms: 100,
        }
    }
}

impl Config {
    /// Defaults, then the optional file at `path`, then `GENIE__*` variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn default_language(&self) -> Result<LanguageCode> {
        LanguageCode::parse(&self.turn.default_language).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid turn.default_language: {:?}",
                self.turn.default_language
            )
        })
    }

    pub fn turn_config(&self) -> TurnConfig {
        TurnConfig {
            voice_gender: self.turn.voice_gender,
            output_encoding: self.turn.output_encoding,
            stage_timeout: Duration::from_secs(self.turn.stage_timeout_secs),
        }
    }

    pub fn upload_format(&self) -> UploadFormat {
        UploadFormat {
            encoding: self.turn.input_encoding,
            sample_rate_hz: self.turn.input_sample_rate_hz,
        }
    }

    pub fn recording_config(&self) -> RecordingConfig {
        RecordingConfig {
            silence_threshold: self.recording.silence_threshold,
            silence_duration: Duration::from_millis(self.recording.silence_duration_ms),
            frame_interval: Duration::from_millis(self.recording.frame_interval_ms.max(1)),
        }
    }

    pub fn audio_backend_config(&self) -> AudioBackendConfig {
        AudioBackendConfig {
            buffer_duration_ms: self.recording.chunk_ms,
            ..AudioBackendConfig::default()
        }
    }
}
