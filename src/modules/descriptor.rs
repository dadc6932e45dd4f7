use std::collections::VecDeque;

use ndarray::Array1;

use crate::error::{LivenessError, LivenessResult};

/// Passive collector of candidate identity descriptors.
///
/// Bounded FIFO buffer; in practice it fills once early in the session and
/// stops churning. The final descriptor is the element-wise mean across the
/// buffered vectors.
#[derive(Debug, Clone)]
pub struct DescriptorAggregator {
    buffer: VecDeque<Array1<f32>>,
    capacity: usize,
    dims: Option<usize>,
}

impl DescriptorAggregator {
    /// new initializes an empty aggregator with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        DescriptorAggregator {
            buffer: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            dims: None,
        }
    }

    /// offer appends one candidate descriptor, evicting the oldest entry once
    /// the buffer is full. An empty slice is a detector that produced no
    /// embedding this tick and is ignored. A vector whose length disagrees
    /// with the first accepted descriptor is rejected with a length-mismatch
    /// error, since averaging it would corrupt the result; the caller absorbs
    /// this as a per-tick anomaly.
    pub fn offer(&mut self, descriptor: &[f32]) -> LivenessResult<()> {
        if descriptor.is_empty() {
            return Ok(());
        }
        match self.dims {
            None => self.dims = Some(descriptor.len()),
            Some(dims) if dims != descriptor.len() => {
                return Err(LivenessError::DescriptorLengthMismatch {
                    expected: dims,
                    actual: descriptor.len(),
                });
            }
            Some(_) => {}
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(Array1::from_vec(descriptor.to_vec()));
        Ok(())
    }

    /// len returns the number of buffered descriptors.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// finalize computes the element-wise arithmetic mean of the buffered
    /// descriptors.
    ///
    /// Fails when no descriptor was ever captured: the result would be used
    /// for irreversible identity storage or authorization matching, so a
    /// degenerate vector is never returned.
    ///
    /// # Returns
    /// * `Result<Array1<f32>, LivenessError>`
    pub fn finalize(&self) -> LivenessResult<Array1<f32>> {
        if self.buffer.is_empty() {
            return Err(LivenessError::NoDescriptorAtCompletion);
        }
        let dims = self.dims.unwrap_or(0);
        let mut mean = Array1::<f32>::zeros(dims);
        for descriptor in &self.buffer {
            mean += descriptor;
        }
        mean /= self.buffer.len() as f32;
        Ok(mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_fails_on_empty_buffer() {
        let agg = DescriptorAggregator::new(10);
        assert!(matches!(
            agg.finalize(),
            Err(LivenessError::NoDescriptorAtCompletion)
        ));
    }

    #[test]
    fn test_finalize_returns_elementwise_mean() {
        let mut agg = DescriptorAggregator::new(10);
        agg.offer(&[1.0, 2.0, 3.0]).unwrap();
        agg.offer(&[3.0, 4.0, 5.0]).unwrap();
        agg.offer(&[5.0, 6.0, 13.0]).unwrap();
        let mean = agg.finalize().unwrap();
        assert_eq!(mean.to_vec(), vec![3.0, 4.0, 7.0]);
    }

    #[test]
    fn test_buffer_evicts_oldest_at_capacity() {
        let mut agg = DescriptorAggregator::new(2);
        agg.offer(&[0.0]).unwrap();
        agg.offer(&[6.0]).unwrap();
        agg.offer(&[12.0]).unwrap();
        assert_eq!(agg.len(), 2);
        // [0.0] was evicted, leaving mean(6, 12).
        assert_eq!(agg.finalize().unwrap().to_vec(), vec![9.0]);
    }

    #[test]
    fn test_mismatched_length_is_a_length_mismatch_error() {
        let mut agg = DescriptorAggregator::new(4);
        agg.offer(&[1.0, 3.0]).unwrap();
        let err = agg.offer(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            LivenessError::DescriptorLengthMismatch {
                expected: 2,
                actual: 3,
            }
        ));
        // The rejected vector never reaches the buffer.
        assert_eq!(agg.len(), 1);
        assert_eq!(agg.finalize().unwrap().to_vec(), vec![1.0, 3.0]);
    }
}
