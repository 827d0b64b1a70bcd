//! Lock-free ring buffer between a capture callback and the reading side

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Single-producer single-consumer buffer of captured samples
pub struct SampleRingBuffer {
    producer: HeapProducer<f32>,
    consumer: HeapConsumer<f32>,
}

impl SampleRingBuffer {
    /// Create new ring buffer with given capacity
    ///
    /// # Arguments
    /// * `capacity` - Buffer capacity in samples
    pub fn new(capacity: usize) -> Self {
        let (producer, consumer) = HeapRb::<f32>::new(capacity).split();
        Self { producer, consumer }
    }

    /// Split into producer and consumer ends
    pub fn split(self) -> (SampleProducer, SampleConsumer) {
        (
            SampleProducer {
                producer: self.producer,
                dropped: 0,
            },
            SampleConsumer {
                consumer: self.consumer,
            },
        )
    }
}

/// Writing end, owned by the capture callback
pub struct SampleProducer {
    producer: HeapProducer<f32>,
    dropped: u64,
}

impl SampleProducer {
    /// Push one channel out of an interleaved frame buffer
    ///
    /// # Arguments
    /// * `data` - Interleaved samples
    /// * `channels` - Number of interleaved channels (only the first is kept)
    ///
    /// # Returns
    /// Number of samples written. Samples that do not fit are dropped.
    pub fn write_channel(&mut self, data: &[f32], channels: usize) -> usize {
        let step = channels.max(1);
        let wanted = data.len().div_ceil(step);
        let written = self
            .producer
            .push_iter(&mut data.iter().step_by(step).copied());

        self.dropped += (wanted - written) as u64;
        written
    }

    /// Total samples dropped because the reader fell behind
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn free_len(&self) -> usize {
        self.producer.free_len()
    }
}

/// Reading end, owned by the source
pub struct SampleConsumer {
    consumer: HeapConsumer<f32>,
}

impl SampleConsumer {
    /// Read available samples, returns how many were copied
    pub fn read(&mut self, buffer: &mut [f32]) -> usize {
        self.consumer.pop_slice(buffer)
    }

    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }
}
