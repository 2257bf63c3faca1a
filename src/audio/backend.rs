use anyhow::Result;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::turn::AudioEncoding;

/// Encoded audio emitted by a capture device while recording
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Encoded bytes, concatenated in order to form the utterance
    pub data: Vec<u8>,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Live view of the captured signal, read once per frame
pub trait AnalysisNode: Send + Sync {
    /// Number of samples written by `read_time_domain`
    fn buffer_len(&self) -> usize;

    /// Copy the most recent time-domain samples into `out`
    ///
    /// Samples are unsigned 8-bit centered at 128 (128 = silence).
    fn read_time_domain(&self, out: &mut [u8]);
}

/// Handles returned by a started capture device
pub struct CaptureStream {
    /// Encoded chunks in capture order
    pub chunks: mpsc::Receiver<AudioChunk>,
    /// Analysis tap for voice-activity detection
    pub analyser: Arc<dyn AnalysisNode>,
}

/// Configuration for capture devices
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// How much audio each chunk carries (affects latency)
    pub buffer_duration_ms: u64,
    /// Size of the analysis window
    pub analysis_buffer_len: usize,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            buffer_duration_ms: 100,   // 100ms chunks
            analysis_buffer_len: 1024, // Matches a 2048-point analyser's bin count
        }
    }
}

/// Audio capture device
///
/// `start` acquires the device and fails if it is missing or access is
/// denied; `stop` releases it. Implementations must tolerate `stop` without
/// a prior `start`.
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Acquire the device and begin capturing
    async fn start(&mut self) -> Result<CaptureStream>;

    /// Stop capturing and release the device
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Encoding of the chunks this device produces
    fn encoding(&self) -> AudioEncoding;

    /// Sample rate of the chunks this device produces
    fn sample_rate(&self) -> u32;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Analysis node backed by a shared buffer that the capture side overwrites
pub struct SharedAnalyser {
    buffer: Mutex<Vec<u8>>,
}

impl SharedAnalyser {
    /// Create an analyser holding `len` silent samples
    pub fn new(len: usize) -> Self {
        Self {
            buffer: Mutex::new(vec![128; len]),
        }
    }

    /// Replace the window with the newest samples, right-aligned
    pub fn publish(&self, samples: &[u8]) {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        let len = buffer.len();
        if samples.len() >= len {
            buffer.copy_from_slice(&samples[samples.len() - len..]);
        } else {
            buffer.copy_within(samples.len().., 0);
            buffer[len - samples.len()..].copy_from_slice(samples);
        }
    }

    /// Reset the window to silence
    pub fn silence(&self) {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        buffer.fill(128);
    }
}

impl AnalysisNode for SharedAnalyser {
    fn buffer_len(&self) -> usize {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn read_time_domain(&self, out: &mut [u8]) {
        let buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        let n = out.len().min(buffer.len());
        out[..n].copy_from_slice(&buffer[..n]);
    }
}

/// Convert a 16-bit PCM sample to the analyser's unsigned 8-bit scale
pub fn pcm_to_u8(sample: i16) -> u8 {
    ((sample as i32 >> 8) + 128) as u8
}
