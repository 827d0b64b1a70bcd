//! FFT engine using rustfft for complex baseband signals
//!
//! The plan and scratch space are created once and reused for every frame

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Forward complex-to-complex FFT of a fixed size
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Forward transform plan
    plan: Arc<dyn Fft<f64>>,

    /// Reusable scratch space for out-of-place processing
    scratch: Vec<Complex<f64>>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples, must be non-zero)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let plan = planner.plan_fft_forward(fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); plan.get_outofplace_scratch_len()];

        Self {
            fft_size,
            plan,
            scratch,
        }
    }

    /// Transform `input` into `output`
    ///
    /// Both slices must be `fft_size` long. `input` is used as workspace and
    /// holds garbage afterwards.
    pub fn process(&mut self, input: &mut [Complex<f64>], output: &mut [Complex<f64>]) {
        debug_assert_eq!(input.len(), self.fft_size);
        debug_assert_eq!(output.len(), self.fft_size);

        self.plan
            .process_outofplace_with_scratch(input, output, &mut self.scratch);
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Frequency offset of `bin` from the center frequency, in Hz
    ///
    /// Bins past `fft_size / 2` map to negative offsets.
    pub fn bin_offset_hz(&self, bin: usize, sample_rate: f64) -> f64 {
        let n = self.fft_size as f64;
        let k = if bin < self.fft_size.div_ceil(2) {
            bin as f64
        } else {
            bin as f64 - n
        };
        k * sample_rate / n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_fft_dc_signal() {
        let mut fft = FftEngine::new(64);

        let mut input = vec![Complex::new(1.0, 0.0); 64];
        let mut output = vec![Complex::new(0.0, 0.0); 64];
        fft.process(&mut input, &mut output);

        // DC bin carries the whole signal
        assert!((output[0].re - 64.0).abs() < 1e-9);
        assert!(output[1..].iter().all(|c| c.norm() < 1e-9));
    }

    #[test]
    fn test_fft_complex_tone() {
        let n = 128;
        let mut fft = FftEngine::new(n);

        // Negative-frequency tone lands in the upper half
        let mut input: Vec<Complex<f64>> = (0..n)
            .map(|t| Complex::from_polar(1.0, -2.0 * PI * 5.0 * t as f64 / n as f64))
            .collect();
        let mut output = vec![Complex::new(0.0, 0.0); n];
        fft.process(&mut input, &mut output);

        let (peak_bin, _) = output
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.norm().partial_cmp(&b.norm()).unwrap())
            .unwrap();
        assert_eq!(peak_bin, n - 5);
    }

    #[test]
    fn test_bin_offsets() {
        let fft = FftEngine::new(8);

        assert_eq!(fft.bin_offset_hz(0, 8000.0), 0.0);
        assert_eq!(fft.bin_offset_hz(1, 8000.0), 1000.0);
        assert_eq!(fft.bin_offset_hz(4, 8000.0), -4000.0);
        assert_eq!(fft.bin_offset_hz(7, 8000.0), -1000.0);
    }
}
