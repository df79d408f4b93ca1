// src/sample_buffer.rs

use std::ops::Index;
use std::sync::Arc;

/// Immutable, shareable run of amplitude samples (roughly -1.0..=1.0).
///
/// Cloning is cheap (the samples live behind an `Arc`), so the same buffer
/// can be held by the host, the geometry worker and the renderer at once.
/// Equality compares contents bit for bit, not identity: a host that hands
/// over the same audio in a fresh buffer does not cause a geometry rebuild,
/// and a buffer holding NaN still equals itself. `0.0` and `-0.0` differ.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Arc<[f32]>,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Fold interleaved multi-channel audio into a single lane.
    ///
    /// Each frame keeps the sample with the largest magnitude so that peaks
    /// on any channel stay visible. A trailing partial frame is ignored.
    pub fn from_interleaved(samples: &[f32], channels: usize) -> Self {
        if channels == 0 {
            return Self::empty();
        }

        samples
            .chunks_exact(channels)
            .map(|frame| {
                frame
                    .iter()
                    .copied()
                    .fold(0.0_f32, |peak, s| if s.abs() > peak.abs() { s } else { peak })
            })
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.samples.get(index).copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f32> {
        self.samples.iter()
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for SampleBuffer {
    fn eq(&self, other: &Self) -> bool {
        // Same allocation means same contents; skip the scan.
        if Arc::ptr_eq(&self.samples, &other.samples) {
            return true;
        }
        self.samples.len() == other.samples.len()
            && self
                .samples
                .iter()
                .zip(other.samples.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Index<usize> for SampleBuffer {
    type Output = f32;

    #[inline]
    fn index(&self, index: usize) -> &f32 {
        &self.samples[index]
    }
}

impl From<Vec<f32>> for SampleBuffer {
    fn from(samples: Vec<f32>) -> Self {
        Self::new(samples)
    }
}

impl From<&[f32]> for SampleBuffer {
    fn from(samples: &[f32]) -> Self {
        Self {
            samples: samples.into(),
        }
    }
}

impl FromIterator<f32> for SampleBuffer {
    fn from_iter<I: IntoIterator<Item = f32>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SampleBuffer {
    type Item = &'a f32;
    type IntoIter = std::slice::Iter<'a, f32>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_buffer_equals_itself() {
        let mut samples = vec![0.25; 64];
        samples[32] = f32::NAN;
        let a = SampleBuffer::new(samples.clone());
        assert_eq!(a, a.clone());
        assert_eq!(a, SampleBuffer::new(samples));
        assert_ne!(a, SampleBuffer::new(vec![0.25; 64]));
    }

    #[test]
    fn test_equal_contents_compare_equal() {
        let a = SampleBuffer::new(vec![0.1, -0.2, 0.3]);
        let b = SampleBuffer::from(&[0.1, -0.2, 0.3][..]);
        assert_eq!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_different_contents_same_length_compare_unequal() {
        let a = SampleBuffer::new(vec![0.1, -0.2, 0.3]);
        let b = SampleBuffer::new(vec![0.1, -0.2, 0.4]);
        assert_eq!(a.len(), b.len());
        assert_ne!(a, b);
    }

    #[test]
    fn test_different_lengths_compare_unequal() {
        let a = SampleBuffer::new(vec![0.1, -0.2]);
        let b = SampleBuffer::new(vec![0.1, -0.2, 0.0]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_read_access() {
        let buffer: SampleBuffer = [0.5, -0.5].into_iter().collect();
        assert_eq!(buffer.len(), 2);
        assert!(!buffer.is_empty());
        assert_eq!(buffer[1], -0.5);
        assert_eq!(buffer.get(1), Some(-0.5));
        assert_eq!(buffer.get(2), None);
        assert!(SampleBuffer::empty().is_empty());
    }

    #[test]
    fn test_from_interleaved_keeps_loudest_channel() {
        let stereo = [0.1, -0.6, 0.4, 0.2, -0.3, 0.3, 0.9];
        let buffer = SampleBuffer::from_interleaved(&stereo, 2);
        assert_eq!(buffer.as_slice(), &[-0.6, 0.4, -0.3]);
        assert!(SampleBuffer::from_interleaved(&stereo, 0).is_empty());
    }
}
