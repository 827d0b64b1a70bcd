//! Streaming power spectrum integrator
//!
//! Pulls samples from a [`SignalSource`] into an FFT-sized window, transforms
//! every full window and accumulates per-bin power until the configured
//! averaging time has been covered. The cycle is then complete until
//! [`Spectrogram::reset`] starts a new one.

use super::fft::FftEngine;
use crate::source::{SignalSource, SourceError, SourceInfo};
use num_complex::Complex;
use thiserror::Error;
use tracing::{debug, trace, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("FFT size must be non-zero")]
    ZeroBins,

    #[error("Averaging time must be a positive number of seconds (got {0})")]
    InvalidAveragingTime(f64),

    #[error("Source reports a zero sample rate")]
    ZeroSampleRate,

    #[error("Averaging time of {0} s does not give a usable number of frames")]
    FrameCountOutOfRange(f64),
}

#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("End of stream")]
    EndOfStream,

    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// What a successful [`Spectrogram::acquire`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Samples were added but the window is not full yet
    Partial,
    /// The window filled up and was folded into the spectrum
    FrameFolded,
    /// The cycle was already complete, nothing was read
    AlreadyComplete,
}

/// Spectrogram configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrogramConfig {
    /// FFT size (number of bins, power of 2 recommended)
    pub bins: usize,

    /// Averaging time per cycle in seconds
    pub avg_time: f64,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            bins: 2048,
            avg_time: 60.0,
        }
    }
}

/// Dynamic range and frequency span of the current spectrum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumRange {
    /// Smallest accumulated power among interior bins
    pub min: f64,
    /// Largest accumulated power among interior bins
    pub max: f64,
    /// Lowest frequency covered, in Hz
    pub f_lo: f64,
    /// Highest frequency covered, in Hz
    pub f_hi: f64,
}

/// Accumulates averaged power spectra from a signal source
///
/// `S` may be an owned source (`Box<dyn SignalSource>`) or a borrowed one
/// (`&mut FileSource`). The source's rate and center frequency are read once
/// at construction.
pub struct Spectrogram<S> {
    config: SpectrogramConfig,
    source: S,
    info: SourceInfo,
    fft: FftEngine,

    /// Time-domain samples of the window being filled
    window: Vec<Complex<f64>>,
    /// Frequency-domain output of the last transform
    transformed: Vec<Complex<f64>>,
    /// Accumulated (not yet averaged) power per bin
    spectrum: Vec<f64>,

    frames: u64,
    frame_count: u64,
    window_ptr: usize,

    total_samples: u64,
    got_samples: u64,
    reset_count: u64,

    min: f64,
    max: f64,
}

impl<S: SignalSource> Spectrogram<S> {
    /// Create a spectrogram bound to an open source
    pub fn new(source: S, config: SpectrogramConfig) -> Result<Self, ConstructionError> {
        if config.bins == 0 {
            return Err(ConstructionError::ZeroBins);
        }
        if !(config.avg_time.is_finite() && config.avg_time > 0.0) {
            return Err(ConstructionError::InvalidAveragingTime(config.avg_time));
        }

        let info = source.info();
        if info.sample_rate == 0 {
            return Err(ConstructionError::ZeroSampleRate);
        }

        let frames = (config.avg_time * info.sample_rate as f64 / config.bins as f64).ceil();
        if !(1.0..=u64::MAX as f64).contains(&frames) {
            return Err(ConstructionError::FrameCountOutOfRange(config.avg_time));
        }
        let frames = frames as u64;
        let total_samples = (config.bins as u64)
            .checked_mul(frames)
            .ok_or(ConstructionError::FrameCountOutOfRange(config.avg_time))?;

        debug!(
            "spectrogram: {} bins, {} frames per cycle ({} samples)",
            config.bins, frames, total_samples
        );

        Ok(Self {
            config,
            source,
            info,
            fft: FftEngine::new(config.bins),
            window: vec![Complex::new(0.0, 0.0); config.bins],
            transformed: vec![Complex::new(0.0, 0.0); config.bins],
            spectrum: vec![0.0; config.bins],
            frames,
            frame_count: 0,
            window_ptr: 0,
            total_samples,
            got_samples: 0,
            reset_count: 0,
            min: 0.0,
            max: 0.0,
        })
    }

    /// Pull the samples still missing from the current window
    ///
    /// The source may deliver fewer samples than requested; the next call
    /// resumes where this one stopped. Once the window is full it is
    /// transformed and folded into the spectrum. Calling this on a complete
    /// cycle does nothing. End of stream and source errors are returned
    /// without touching any counter and are never retried.
    pub fn acquire(&mut self) -> Result<AcquireOutcome, AcquireError> {
        if self.is_complete() {
            return Ok(AcquireOutcome::AlreadyComplete);
        }

        let needed = self.config.bins - self.window_ptr;

        let got = match self.source.acquire(&mut self.window[self.window_ptr..]) {
            Ok(0) => {
                warn!("spectrogram: end of stream");
                return Err(AcquireError::EndOfStream);
            }
            Ok(n) => n.min(needed),
            Err(e) => {
                warn!("spectrogram: source error: {}", e);
                return Err(AcquireError::Source(e));
            }
        };

        self.window_ptr += got;
        self.got_samples += got as u64;

        if self.window_ptr < self.config.bins {
            return Ok(AcquireOutcome::Partial);
        }

        self.fold_window();
        Ok(AcquireOutcome::FrameFolded)
    }

    fn fold_window(&mut self) {
        self.fft.process(&mut self.window, &mut self.transformed);

        let bins = self.config.bins;
        let scale = bins as f64;
        let first = self.frame_count == 0;

        self.min = f64::INFINITY;
        self.max = f64::NEG_INFINITY;

        for (i, (acc, x)) in self.spectrum.iter_mut().zip(&self.transformed).enumerate() {
            let psd = x.norm_sqr() / scale;

            // The first frame of a cycle overwrites whatever the last cycle left
            if first {
                *acc = psd;
            } else {
                *acc += psd;
            }

            // Two bins at each edge are left out of the range
            if i > 1 && i + 2 < bins {
                self.min = self.min.min(*acc);
                self.max = self.max.max(*acc);
            }
        }

        self.window_ptr = 0;
        self.frame_count += 1;

        trace!("spectrogram: frame {}/{}", self.frame_count, self.frames);
        if self.is_complete() {
            debug!(
                "spectrogram: cycle {} complete after {} samples",
                self.reset_count, self.got_samples
            );
        }
    }

    /// Shared access to the source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Exclusive access to the source
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Tear down the spectrogram and hand back the source
    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S> Spectrogram<S> {
    /// True once `frames` transforms have been folded in this cycle
    pub fn is_complete(&self) -> bool {
        self.frame_count == self.frames
    }

    /// Start a new cycle
    ///
    /// The spectrum is left as is; the next folded frame overwrites it.
    /// Until then `frame_count() == 0` means there is no valid data.
    pub fn reset(&mut self) {
        self.got_samples = 0;
        self.frame_count = 0;
        self.window_ptr = 0;
        self.reset_count += 1;
    }

    /// Accumulated power per bin, not divided by the frame count
    pub fn cumulative(&self) -> &[f64] {
        &self.spectrum
    }

    /// Averaged power per bin, `cumulative()[i] / frame_count()`
    pub fn averaged_iter(&self) -> impl Iterator<Item = f64> + '_ {
        let count = self.frame_count as f64;
        self.spectrum.iter().map(move |&v| v / count)
    }

    /// Averaged power per bin, collected
    pub fn averaged(&self) -> Vec<f64> {
        self.averaged_iter().collect()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frames needed to complete a cycle
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Samples already held for the window being filled
    pub fn window_ptr(&self) -> usize {
        self.window_ptr
    }

    pub fn bins(&self) -> usize {
        self.config.bins
    }

    pub fn config(&self) -> &SpectrogramConfig {
        &self.config
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    pub fn got_samples(&self) -> u64 {
        self.got_samples
    }

    pub fn reset_count(&self) -> u64 {
        self.reset_count
    }

    /// Fraction of the cycle's samples acquired so far
    pub fn progress(&self) -> f64 {
        self.got_samples as f64 / self.total_samples as f64
    }

    pub fn sample_rate(&self) -> u32 {
        self.info.sample_rate
    }

    pub fn source_info(&self) -> SourceInfo {
        self.info
    }

    /// Seconds of signal integrated in this cycle
    pub fn integration_time(&self) -> f64 {
        self.got_samples as f64 / self.info.sample_rate as f64
    }

    /// Raw accumulated min/max and the covered frequency span
    ///
    /// min/max are `0.0` before the first fold. With fewer than five bins
    /// there are no interior bins and they stay at `+inf`/`-inf`.
    pub fn range(&self) -> SpectrumRange {
        let (f_lo, f_hi) = self.info.frequency_range();
        SpectrumRange {
            min: self.min,
            max: self.max,
            f_lo,
            f_hi,
        }
    }

    /// Averaged min/max power in dB, once a frame has been folded
    ///
    /// `None` when there is no data yet or the range has no finite dB value
    /// (no interior bins, or an interior bin with zero power).
    pub fn db_range(&self) -> Option<(f64, f64)> {
        if self.frame_count == 0 || !(self.min.is_finite() && self.max.is_finite()) {
            return None;
        }
        if self.min <= 0.0 || self.max <= 0.0 {
            return None;
        }

        let count = self.frame_count as f64;
        Some((
            10.0 * (self.min / count).log10(),
            10.0 * (self.max / count).log10(),
        ))
    }
}
