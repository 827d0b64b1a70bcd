//! IQ file replay
//!
//! Reads interleaved little-endian `f32` I/Q pairs and loops back to the start
//! of the file whenever a read comes up short.

use super::{SignalSource, SourceDriver, SourceError, SourceInfo};
use crate::params::Params;
use num_complex::Complex;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Maximum samples returned per `acquire`
pub const READ_BUF_MAX: usize = 1024;

const BYTES_PER_SAMPLE: usize = 2 * std::mem::size_of::<f32>();

/// Opens [`FileSource`]s from `path`, `fs` and optional `fc` parameters
pub struct FileDriver;

impl SourceDriver for FileDriver {
    fn name(&self) -> &str {
        "file"
    }

    fn open(&self, params: &Params) -> Result<Box<dyn SignalSource>, SourceError> {
        let path = params.require("path")?;
        let sample_rate = params.require_parsed::<u32>("fs")?;
        let frequency = params.get_integer("fc")?.unwrap_or(0);

        let source = FileSource::open(
            path,
            SourceInfo {
                sample_rate,
                frequency,
            },
        )?;

        Ok(Box::new(source))
    }
}

/// Replays a raw complex float file
pub struct FileSource<R = BufReader<File>> {
    reader: R,
    info: SourceInfo,
    bytes: Vec<u8>,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>, info: SourceInfo) -> Result<Self, SourceError> {
        let file = File::open(path.as_ref())?;
        debug!("replaying IQ file {}", path.as_ref().display());
        Ok(Self::from_reader(BufReader::new(file), info))
    }
}

impl<R: Read + Seek> FileSource<R> {
    /// Replay samples from any seekable reader
    pub fn from_reader(reader: R, info: SourceInfo) -> Self {
        Self {
            reader,
            info,
            bytes: vec![0; READ_BUF_MAX * BYTES_PER_SAMPLE],
        }
    }

    /// Fill the first `len` scratch bytes as far as the reader allows
    fn read_full(&mut self, len: usize) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < len {
            match self.reader.read(&mut self.bytes[filled..len]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read + Seek> SignalSource for FileSource<R> {
    fn info(&self) -> SourceInfo {
        self.info
    }

    fn acquire(&mut self, buffer: &mut [Complex<f64>]) -> Result<usize, SourceError> {
        let count = buffer.len().min(READ_BUF_MAX);
        let filled = self.read_full(count * BYTES_PER_SAMPLE)?;
        let got = filled / BYTES_PER_SAMPLE;

        for (slot, chunk) in buffer
            .iter_mut()
            .zip(self.bytes[..got * BYTES_PER_SAMPLE].chunks_exact(BYTES_PER_SAMPLE))
        {
            let re = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let im = f32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
            *slot = Complex::new(re as f64, im as f64);
        }

        if got < count {
            self.reader.seek(SeekFrom::Start(0))?;
            debug!("IQ file exhausted after {} samples, rewinding", got);
        }

        Ok(got)
    }
}
