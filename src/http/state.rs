use crate::turn::{AudioEncoding, LanguageCode, TurnOrchestrator};
use std::sync::Arc;

/// How uploaded recordings are encoded; browsers record Opus in WebM at 48kHz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadFormat {
    pub encoding: AudioEncoding,
    pub sample_rate_hz: u32,
}

impl UploadFormat {
    /// Format of one upload, read from its `Content-Type`
    ///
    /// A recognised audio type wins; its `rate` parameter sets the sample
    /// rate. Anything else falls back to `self`.
    pub fn resolve(&self, content_type: Option<&str>) -> UploadFormat {
        let Some(content_type) = content_type else {
            return *self;
        };
        let Some(encoding) = AudioEncoding::from_mime(content_type) else {
            return *self;
        };

        let rate = content_type.split(';').skip(1).find_map(|param| {
            let (key, value) = param.split_once('=')?;
            if !key.trim().eq_ignore_ascii_case("rate") {
                return None;
            }
            value.trim().trim_matches('"').parse::<u32>().ok()
        });

        UploadFormat {
            encoding,
            sample_rate_hz: rate.filter(|&hz| hz > 0).unwrap_or(self.sample_rate_hz),
        }
    }
}

impl Default for UploadFormat {
    fn default() -> Self {
        Self {
            encoding: AudioEncoding::WebmOpus,
            sample_rate_hz: 48000,
        }
    }
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Turn pipeline with its engine clients, built once at startup
    pub orchestrator: Arc<TurnOrchestrator>,

    /// Encoding assumed for uploads that do not declare one
    pub upload: UploadFormat,

    /// Used when a request carries no language
    pub default_language: LanguageCode,

    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(orchestrator: TurnOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            upload: UploadFormat::default(),
            default_language: LanguageCode::default(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }

    pub fn with_upload_format(mut self, upload: UploadFormat) -> Self {
        self.upload = upload;
        self
    }

    pub fn with_default_language(mut self, language: LanguageCode) -> Self {
        self.default_language = language;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}
