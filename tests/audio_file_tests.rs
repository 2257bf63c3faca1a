// Integration tests for audio file processing
//
// These tests verify that we can read WAV files and extract audio data correctly.
// Fixtures are generated on the fly with hound.

use anyhow::Result;
use genie_voice::audio::AudioFile;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_wav(dir: &Path, name: &str, sample_rate: u32, channels: u16, samples: &[i16]) -> Result<PathBuf> {
    let path = dir.join(name);
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(&path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(path)
}

#[test]
fn test_audio_file_open() -> Result<()> {
    let dir = TempDir::new()?;
    let samples: Vec<i16> = (0..16000).map(|i| ((i % 100) * 100) as i16).collect();
    let path = write_wav(dir.path(), "utterance.wav", 16000, 1, &samples)?;

    let audio = AudioFile::open(&path)?;

    assert!((audio.duration_seconds - 1.0).abs() < 1e-9);
    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples, samples);
    assert!(audio.path.contains("utterance.wav"));

    Ok(())
}

#[test]
fn test_audio_file_stereo_duration_counts_frames() -> Result<()> {
    let dir = TempDir::new()?;
    let samples = vec![0i16; 48000 * 2];
    let path = write_wav(dir.path(), "stereo.wav", 48000, 2, &samples)?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.channels, 2);
    assert!((audio.duration_seconds - 1.0).abs() < 1e-9);

    Ok(())
}

#[test]
fn test_audio_file_to_mono_averages_channels() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(dir.path(), "stereo.wav", 8000, 2, &[100, 300, -100, -300, 7, 8])?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.to_mono(), vec![200, -200, 7]);

    Ok(())
}

#[test]
fn test_audio_file_mono_passthrough() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(dir.path(), "mono.wav", 8000, 1, &[1, -2, 3])?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.to_mono(), vec![1, -2, 3]);

    Ok(())
}

#[test]
fn test_audio_file_rejects_float_samples() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("float.wav");
    let spec = WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&path, spec)?;
    writer.write_sample(0.25f32)?;
    writer.finalize()?;

    let result = AudioFile::open(&path);

    assert!(result.is_err(), "Only 16-bit PCM is supported");

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let path = PathBuf::from("/nonexistent/path/to/audio.wav");
    let result = AudioFile::open(&path);

    assert!(result.is_err(), "Opening nonexistent file should fail");
}
