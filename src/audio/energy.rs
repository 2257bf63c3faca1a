use std::sync::Arc;

use super::backend::AnalysisNode;

/// Root-mean-square energy of an unsigned 8-bit time-domain buffer
///
/// Each sample is mapped to `sample / 128 - 1`, so 128 reads as silence and
/// the result lies in 0.0..=1.0.
pub fn rms_energy(buffer: &[u8]) -> f32 {
    if buffer.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = buffer
        .iter()
        .map(|&sample| {
            let centered = sample as f64 / 128.0 - 1.0;
            centered * centered
        })
        .sum();

    (sum_squares / buffer.len() as f64).sqrt() as f32
}

/// Reads the live analysis window and reports its energy
pub struct EnergyMonitor {
    analyser: Arc<dyn AnalysisNode>,
    buffer: Vec<u8>,
}

impl EnergyMonitor {
    pub fn new(analyser: Arc<dyn AnalysisNode>) -> Self {
        let buffer = vec![128; analyser.buffer_len()];
        Self { analyser, buffer }
    }

    /// Energy of the most recent window. Only reads the analyser.
    pub fn sample_energy(&mut self) -> f32 {
        self.analyser.read_time_domain(&mut self.buffer);
        rms_energy(&self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::backend::SharedAnalyser;

    #[test]
    fn test_midpoint_buffer_is_silent() {
        for len in [1, 32, 1024] {
            assert_eq!(rms_energy(&vec![128u8; len]), 0.0);
        }
    }

    #[test]
    fn test_empty_buffer_is_silent() {
        assert_eq!(rms_energy(&[]), 0.0);
    }

    #[test]
    fn test_full_swing_is_near_one() {
        let buffer: Vec<u8> = (0..256).map(|i| if i % 2 == 0 { 0 } else { 255 }).collect();
        let energy = rms_energy(&buffer);
        assert!(energy > 0.99 && energy <= 1.0, "energy was {}", energy);
    }

    #[test]
    fn test_quiet_noise_stays_under_threshold() {
        // +/-1 LSB of noise around the midpoint
        let buffer: Vec<u8> = (0..1024).map(|i| if i % 2 == 0 { 127 } else { 129 }).collect();
        let energy = rms_energy(&buffer);
        assert!((energy - 1.0 / 128.0).abs() < 1e-6);
        assert!(energy <= 0.01);
    }

    #[test]
    fn test_monitor_reads_latest_window() {
        let analyser = Arc::new(SharedAnalyser::new(8));
        let mut monitor = EnergyMonitor::new(analyser.clone());
        assert_eq!(monitor.sample_energy(), 0.0);

        analyser.publish(&[0, 255, 0, 255, 0, 255, 0, 255]);
        assert!(monitor.sample_energy() > 0.9);

        analyser.silence();
        assert_eq!(monitor.sample_energy(), 0.0);
    }
}
