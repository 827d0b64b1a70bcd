//! Sound card capture using cpal
//!
//! Mono capture from a microphone or line-in, delivered as complex samples
//! with a zero imaginary part

use super::buffer::{SampleConsumer, SampleRingBuffer};
use super::{SignalSource, SourceDriver, SourceError, SourceInfo};
use crate::params::Params;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SampleRate, Stream, StreamConfig};
use num_complex::Complex;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Sample rate used when `fs` is not given
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Maximum samples returned per `acquire`
pub const CAPTURE_CHUNK: usize = 2048;

/// Longest `acquire` will wait for the device
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(1);

/// Ring buffer capacity in seconds of audio
const BUFFER_SECONDS: u32 = 2;

/// Input device information
#[derive(Debug, Clone)]
pub struct InputDeviceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Opens [`SoundcardSource`]s from `fc`, `fs`, `device` and `dc` parameters
pub struct SoundcardDriver;

impl SourceDriver for SoundcardDriver {
    fn name(&self) -> &str {
        "soundcard"
    }

    fn open(&self, params: &Params) -> Result<Box<dyn SignalSource>, SourceError> {
        let frequency = params
            .get_integer("fc")?
            .ok_or_else(|| crate::params::ParamError::Missing("fc".to_string()))?;
        let sample_rate = params
            .get_parsed::<u32>("fs")?
            .unwrap_or(DEFAULT_SAMPLE_RATE);
        let dc_remove = params.get_bool("dc")?.unwrap_or(false);

        let host = cpal::default_host();
        let device = match params.get("device") {
            Some(name) => find_input_device(&host, name)?,
            None => host.default_input_device().ok_or(SourceError::NoDevice)?,
        };

        let source = SoundcardSource::from_device(device, sample_rate, frequency, dc_remove)?;
        Ok(Box::new(source))
    }
}

/// Live capture stream
pub struct SoundcardSource {
    stream: Stream,
    consumer: SampleConsumer,
    scratch: Vec<f32>,
    info: SourceInfo,
    device_name: String,
    dc_remove: bool,
    last: f64,
    stream_error: Arc<Mutex<Option<String>>>,
}

impl SoundcardSource {
    /// Start capturing from `device` at the supported rate nearest to `sample_rate`
    pub fn from_device(
        device: Device,
        sample_rate: u32,
        frequency: i64,
        dc_remove: bool,
    ) -> Result<Self, SourceError> {
        let device_name = device
            .name()
            .map_err(|e| SourceError::Device(e.to_string()))?;

        let config = nearest_input_config(&device, sample_rate)?;
        let rate = config.sample_rate.0;
        let channels = config.channels as usize;

        if rate != sample_rate {
            warn!(
                "{} does not support {} Hz, capturing at {} Hz",
                device_name, sample_rate, rate
            );
        }

        let (mut producer, consumer) =
            SampleRingBuffer::new((rate * BUFFER_SECONDS) as usize).split();

        let stream_error = Arc::new(Mutex::new(None));
        let error_slot = Arc::clone(&stream_error);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    producer.write_channel(data, channels);
                },
                move |err| {
                    if let Ok(mut slot) = error_slot.lock() {
                        *slot = Some(err.to_string());
                    }
                },
                None,
            )
            .map_err(|e| SourceError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| SourceError::Stream(e.to_string()))?;

        info!("capturing from {} at {} Hz ({} channels)", device_name, rate, channels);

        Ok(Self {
            stream,
            consumer,
            scratch: vec![0.0; CAPTURE_CHUNK],
            info: SourceInfo {
                sample_rate: rate,
                frequency,
            },
            device_name,
            dc_remove,
            last: 0.0,
            stream_error,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    fn take_stream_error(&self) -> Option<String> {
        self.stream_error.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl SignalSource for SoundcardSource {
    fn info(&self) -> SourceInfo {
        self.info
    }

    fn acquire(&mut self, buffer: &mut [Complex<f64>]) -> Result<usize, SourceError> {
        let count = buffer.len().min(CAPTURE_CHUNK);
        let started = Instant::now();

        let got = loop {
            if let Some(err) = self.take_stream_error() {
                return Err(SourceError::Stream(err));
            }

            let n = self.consumer.read(&mut self.scratch[..count]);
            if n > 0 || count == 0 {
                break n;
            }

            if started.elapsed() >= ACQUIRE_TIMEOUT {
                return Err(SourceError::Timeout);
            }

            std::thread::sleep(Duration::from_micros(100));
        };

        for (slot, &sample) in buffer.iter_mut().zip(&self.scratch[..got]) {
            let sample = sample as f64;
            let value = if self.dc_remove {
                let diff = sample - self.last;
                self.last = sample;
                diff
            } else {
                sample
            };
            *slot = Complex::new(value, 0.0);
        }

        Ok(got)
    }
}

impl Drop for SoundcardSource {
    fn drop(&mut self) {
        let _ = self.stream.pause();
    }
}

/// Pick the `f32` input configuration whose rate range lies closest to `wanted`
fn nearest_input_config(device: &Device, wanted: u32) -> Result<StreamConfig, SourceError> {
    let ranges = device
        .supported_input_configs()
        .map_err(|e| SourceError::Device(e.to_string()))?;

    let best = ranges
        .filter(|r| r.sample_format() == SampleFormat::F32)
        .map(|r| {
            let rate = wanted.clamp(r.min_sample_rate().0, r.max_sample_rate().0);
            (rate.abs_diff(wanted), r.channels(), r.with_sample_rate(SampleRate(rate)))
        })
        .min_by_key(|&(distance, channels, _)| (distance, channels));

    match best {
        Some((_, _, config)) => Ok(config.config()),
        None => Err(SourceError::Device(
            "device offers no 32-bit float capture format".to_string(),
        )),
    }
}

fn find_input_device(host: &cpal::Host, name: &str) -> Result<Device, SourceError> {
    let mut devices = host
        .input_devices()
        .map_err(|e| SourceError::Device(e.to_string()))?;

    devices
        .find(|d| d.name().map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| SourceError::Device(format!("input device `{}' not found", name)))
}

/// List available audio input devices
pub fn list_input_devices() -> Result<Vec<InputDeviceInfo>, SourceError> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    let device_iter = host
        .input_devices()
        .map_err(|e| SourceError::Device(e.to_string()))?;

    for device in device_iter {
        if let Ok(name) = device.name() {
            if let Ok(config) = device.default_input_config() {
                devices.push(InputDeviceInfo {
                    name,
                    sample_rate: config.sample_rate().0,
                    channels: config.channels(),
                });
            }
        }
    }

    Ok(devices)
}
