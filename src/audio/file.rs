use anyhow::{bail, Context, Result};
use hound::WavReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::backend::{
    pcm_to_u8, AudioBackend, AudioBackendConfig, AudioChunk, CaptureStream, SharedAnalyser,
};
use crate::turn::AudioEncoding;

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

        let spec = reader.spec();
        if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
            bail!(
                "Unsupported WAV format: expected 16-bit PCM, got {}-bit {:?}",
                spec.bits_per_sample,
                spec.sample_format
            );
        }

        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Mono samples, averaging interleaved channels
    pub fn to_mono(&self) -> Vec<i16> {
        if self.channels <= 1 {
            return self.samples.clone();
        }

        self.samples
            .chunks_exact(self.channels as usize)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / frame.len() as i32) as i16
            })
            .collect()
    }
}

/// Capture device that replays a WAV file in real time
///
/// Chunks carry mono LINEAR16 little-endian PCM at the file's sample rate.
/// Once the file is exhausted the device keeps running and reports silence,
/// like a microphone in a quiet room.
pub struct FileBackend {
    samples: Arc<Vec<i16>>,
    sample_rate: u32,
    config: AudioBackendConfig,
    name: String,
    stop_token: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl FileBackend {
    pub fn open(path: impl AsRef<Path>, config: AudioBackendConfig) -> Result<Self> {
        let audio = AudioFile::open(path)?;
        Ok(Self::from_samples(
            audio.to_mono(),
            audio.sample_rate,
            config,
            format!("file:{}", audio.path),
        ))
    }

    pub fn from_samples(
        samples: Vec<i16>,
        sample_rate: u32,
        config: AudioBackendConfig,
        name: String,
    ) -> Self {
        Self {
            samples: Arc::new(samples),
            sample_rate,
            config,
            name,
            stop_token: None,
            task: None,
        }
    }

    /// Length of the recording at real-time playback
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate.max(1) as f64)
    }
}

#[async_trait::async_trait]
impl AudioBackend for FileBackend {
    async fn start(&mut self) -> Result<CaptureStream> {
        if self.task.is_some() {
            bail!("Already capturing");
        }

        info!("Starting file capture: {}", self.name);

        let (chunk_tx, chunk_rx) = mpsc::channel(64);
        let analyser = Arc::new(SharedAnalyser::new(self.config.analysis_buffer_len));
        let stop_token = CancellationToken::new();

        let samples = Arc::clone(&self.samples);
        let tap = Arc::clone(&analyser);
        let token = stop_token.clone();
        let chunk_ms = self.config.buffer_duration_ms.max(1);
        let samples_per_chunk = ((self.sample_rate as u64 * chunk_ms) / 1000).max(1) as usize;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(chunk_ms));
            let mut position = 0usize;
            let mut timestamp_ms = 0u64;

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if position >= samples.len() {
                            tap.silence();
                            continue;
                        }

                        let end = (position + samples_per_chunk).min(samples.len());
                        let window = &samples[position..end];
                        position = end;

                        let levels: Vec<u8> = window.iter().map(|&s| pcm_to_u8(s)).collect();
                        tap.publish(&levels);

                        let data: Vec<u8> = window.iter().flat_map(|s| s.to_le_bytes()).collect();
                        if chunk_tx.send(AudioChunk { data, timestamp_ms }).await.is_err() {
                            break;
                        }
                        timestamp_ms += chunk_ms;
                    }
                }
            }

            debug!("File capture task stopped");
        });

        self.stop_token = Some(stop_token);
        self.task = Some(task);

        Ok(CaptureStream {
            chunks: chunk_rx,
            analyser,
        })
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.stop_token.take() {
            token.cancel();
        }

        if let Some(task) = self.task.take() {
            task.await.context("File capture task panicked")?;
            info!("File capture stopped: {}", self.name);
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.is_some()
    }

    fn encoding(&self) -> AudioEncoding {
        AudioEncoding::Linear16
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn name(&self) -> &str {
        &self.name
    }
}
