//! Signal sources producing complex baseband samples
//!
//! A source is opened from a [`Params`] store by a [`SourceDriver`] looked up
//! by name in a [`SourceRegistry`]. Releasing a source is done by dropping it.

pub mod buffer;
pub mod file;
pub mod registry;
pub mod soundcard;

pub use buffer::SampleRingBuffer;
pub use file::{FileDriver, FileSource};
pub use registry::SourceRegistry;
pub use soundcard::{SoundcardDriver, SoundcardSource};

use crate::params::{ParamError, Params};
use num_complex::Complex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Unsupported source type `{0}'")]
    UnknownSource(String),

    #[error("Source `{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("Invalid source parameters: {0}")]
    Param(#[from] ParamError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No audio input device found")]
    NoDevice,

    #[error("Device error: {0}")]
    Device(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Timed out waiting for samples")]
    Timeout,
}

/// Properties reported by a source when it is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceInfo {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Nominal center frequency in Hz
    pub frequency: i64,
}

impl SourceInfo {
    /// Frequency span covered by a complex baseband capture, `fc -/+ fs/2`
    pub fn frequency_range(&self) -> (f64, f64) {
        let fc = self.frequency as f64;
        let half = self.sample_rate as f64 / 2.0;
        (fc - half, fc + half)
    }
}

/// An open, readable stream of complex samples
pub trait SignalSource {
    /// Sample rate and center frequency, fixed at open time
    fn info(&self) -> SourceInfo;

    /// Read up to `buffer.len()` samples into the front of `buffer`
    ///
    /// Returns the number of samples written. A short read is not an error;
    /// `Ok(0)` means end of stream.
    fn acquire(&mut self, buffer: &mut [Complex<f64>]) -> Result<usize, SourceError>;
}

impl<S: SignalSource + ?Sized> SignalSource for &mut S {
    fn info(&self) -> SourceInfo {
        (**self).info()
    }

    fn acquire(&mut self, buffer: &mut [Complex<f64>]) -> Result<usize, SourceError> {
        (**self).acquire(buffer)
    }
}

impl<S: SignalSource + ?Sized> SignalSource for Box<S> {
    fn info(&self) -> SourceInfo {
        (**self).info()
    }

    fn acquire(&mut self, buffer: &mut [Complex<f64>]) -> Result<usize, SourceError> {
        (**self).acquire(buffer)
    }
}

/// Factory for one kind of source
pub trait SourceDriver {
    /// Name the driver is registered under
    fn name(&self) -> &str;

    /// Open a new source configured by `params`
    fn open(&self, params: &Params) -> Result<Box<dyn SignalSource>, SourceError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_range() {
        let info = SourceInfo {
            sample_rate: 2_000_000,
            frequency: 1_420_000_000,
        };

        let (lo, hi) = info.frequency_range();
        assert_eq!(lo, 1_419_000_000.0);
        assert_eq!(hi, 1_421_000_000.0);
    }
}
