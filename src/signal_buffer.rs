// signal_buffer: bounded FIFO history of raw rPPG samples

use heapless::Vec;
use ringbuffer::{ConstGenericRingBuffer, RingBuffer};

/// Holds the most recent `N` samples in arrival order. Pushing into a full
/// buffer evicts the oldest sample.
pub struct SignalBuffer<const N: usize> {
    samples: ConstGenericRingBuffer<f32, N>,
}

impl<const N: usize> Default for SignalBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SignalBuffer<N> {
    pub fn new() -> Self {
        Self { samples: ConstGenericRingBuffer::new() }
    }

    pub fn append(&mut self, batch: &[f32]) {
        for &x in batch {
            self.samples.push(x);
        }
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Oldest-first contiguous copy, for the windowed filter and scorers.
    pub fn snapshot(&self) -> Vec<f32, N> {
        let mut out = Vec::new();
        for &x in self.samples.iter() {
            // Cannot overflow: the ring never holds more than N.
            let _ = out.push(x);
        }
        out
    }
}
