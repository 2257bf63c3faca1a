// Integration tests for capture devices
//
// These tests drive the file-backed device the way the recorder does: read
// chunks from the stream and sample the analyser once per frame.

use anyhow::Result;
use genie_voice::audio::{AudioBackend, AudioBackendConfig, EnergyMonitor, FileBackend};
use genie_voice::turn::AudioEncoding;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Square wave at roughly half of full scale
fn tone(len: usize) -> Vec<i16> {
    (0..len)
        .map(|i| if (i / 8) % 2 == 0 { 16000 } else { -16000 })
        .collect()
}

fn backend(samples: Vec<i16>) -> FileBackend {
    FileBackend::from_samples(samples, 16000, AudioBackendConfig::default(), "tone".to_string())
}

#[tokio::test(start_paused = true)]
async fn test_file_backend_emits_chunks_in_real_time() -> Result<()> {
    let samples = tone(8000); // 0.5s at 16kHz
    let mut device = backend(samples.clone());

    let mut stream = device.start().await?;
    assert!(device.is_capturing());

    let mut data = Vec::new();
    let mut timestamps = Vec::new();
    while timestamps.len() < 5 {
        let chunk = timeout(Duration::from_secs(1), stream.chunks.recv())
            .await?
            .expect("chunk");
        data.extend_from_slice(&chunk.data);
        timestamps.push(chunk.timestamp_ms);
    }

    assert_eq!(timestamps, vec![0, 100, 200, 300, 400]);
    let expected: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    assert_eq!(data, expected);

    device.stop().await?;
    assert!(!device.is_capturing());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_analyser_goes_quiet_after_file_ends() -> Result<()> {
    let mut device = backend(tone(1600)); // one chunk

    let stream = device.start().await?;
    let mut monitor = EnergyMonitor::new(stream.analyser.clone());
    let mut chunks = stream.chunks;

    chunks.recv().await.expect("first chunk");
    let speaking = monitor.sample_energy();
    assert!(speaking > 0.4, "tone energy was {}", speaking);

    // Next tick finds the file exhausted
    sleep(Duration::from_millis(150)).await;
    assert_eq!(monitor.sample_energy(), 0.0);

    // The device stays open like a quiet microphone
    assert!(device.is_capturing());
    assert!(chunks.try_recv().is_err());

    device.stop().await?;

    Ok(())
}

#[tokio::test]
async fn test_stop_closes_chunk_stream() -> Result<()> {
    let mut device = backend(tone(16000));

    let mut stream = device.start().await?;
    device.stop().await?;

    // Anything already queued drains, then the stream ends
    while let Some(_chunk) = stream.chunks.recv().await {}

    Ok(())
}

#[tokio::test]
async fn test_double_start_fails() -> Result<()> {
    let mut device = backend(tone(160));

    let _stream = device.start().await?;
    assert!(device.start().await.is_err());

    device.stop().await?;
    // Stopping twice is harmless
    device.stop().await?;

    Ok(())
}

#[tokio::test]
async fn test_restart_after_stop() -> Result<()> {
    let mut device = backend(tone(160));

    device.start().await?;
    device.stop().await?;

    let mut stream = device.start().await?;
    let chunk = stream.chunks.recv().await.expect("chunk after restart");
    assert_eq!(chunk.timestamp_ms, 0);
    device.stop().await?;

    Ok(())
}

#[test]
fn test_file_backend_format() {
    let device = backend(tone(8000));

    assert_eq!(device.encoding(), AudioEncoding::Linear16);
    assert_eq!(device.sample_rate(), 16000);
    assert_eq!(device.duration(), Duration::from_millis(500));
    assert_eq!(device.name(), "tone");
    assert!(!device.is_capturing());
}

#[test]
fn test_backend_config_defaults() {
    let config = AudioBackendConfig::default();

    assert_eq!(config.buffer_duration_ms, 100);
    assert_eq!(config.analysis_buffer_len, 1024);
}
