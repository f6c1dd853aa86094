use std::collections::VecDeque;

/// Bounded FIFO of samples with a running arithmetic mean.
///
/// Never holds more than `capacity` samples; pushing into a full buffer
/// evicts the oldest one first.
#[derive(Debug, Clone)]
pub struct MetricBuffer {
    samples:  VecDeque<f32>,
    capacity: usize,
}

impl MetricBuffer {
    /// A zero capacity is treated as one so the buffer always tracks the latest sample.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a new sample, evicting the oldest if at capacity.
    pub fn push(&mut self, value: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Average of all samples in the window; `0.0` when empty.
    pub fn average(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f32>() / self.samples.len() as f32
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_average_is_zero() {
        assert_eq!(MetricBuffer::new(15).average(), 0.0);
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut buf = MetricBuffer::new(3);
        for i in 0..10 {
            buf.push(i as f32);
            assert!(buf.len() <= 3);
        }
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn oldest_sample_drops_out_of_the_mean() {
        let mut buf = MetricBuffer::new(3);
        buf.push(100.0);
        buf.push(0.0);
        buf.push(0.0);
        assert!((buf.average() - 100.0 / 3.0).abs() < 1e-4);

        buf.push(0.0);
        assert_eq!(buf.average(), 0.0);
    }

    #[test]
    fn partial_window_averages_what_it_has() {
        let mut buf = MetricBuffer::new(15);
        buf.push(10.0);
        buf.push(20.0);
        assert_eq!(buf.average(), 15.0);
    }

    #[test]
    fn zero_capacity_keeps_latest() {
        let mut buf = MetricBuffer::new(0);
        buf.push(1.0);
        buf.push(7.0);
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.average(), 7.0);
    }
}
