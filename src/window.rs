//! # Sample Window
//! Fixed-capacity sliding window over a numeric feed's recent samples.

use std::collections::VecDeque;

/// Keeps the most recent `cap` samples in arrival order; the oldest sample
/// is dropped first once full.
#[derive(Debug)]
pub struct SampleWindow {
    buf: VecDeque<f64>,
    cap: usize,
}

impl SampleWindow {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            buf: VecDeque::with_capacity(cap.min(1024)),
            cap,
        }
    }

    /// Append a sample, trimming from the front when the window is full.
    pub fn push(&mut self, sample: f64) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Oldest-first copy of the window for the statistics pass.
    pub fn series(&self) -> Vec<f64> {
        self.buf.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_arrival_order_below_capacity() {
        let mut w = SampleWindow::with_capacity(10);
        w.push(3.0);
        w.push(1.0);
        w.push(2.0);
        assert_eq!(w.series(), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn evicts_oldest_first_beyond_capacity() {
        let mut w = SampleWindow::with_capacity(120);
        for i in 0..150 {
            w.push(i as f64);
        }
        assert_eq!(w.len(), 120);
        let series = w.series();
        assert_eq!(series[0], 30.0);
        assert_eq!(series[119], 149.0);
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut w = SampleWindow::with_capacity(0);
        w.push(1.0);
        w.push(2.0);
        assert_eq!(w.series(), vec![2.0]);
    }
}
