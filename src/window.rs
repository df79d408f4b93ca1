// src/window.rs
//
// Visible sample window (start, length) resolved against a buffer.

use std::ops::Range;

/// A resolved, always-valid window into a sample buffer.
///
/// Invariant: `start + len <= count` of the buffer it was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SampleWindow {
    pub start: usize,
    pub len: usize,
}

impl SampleWindow {
    /// Resolve host-supplied window parameters against `count` samples.
    ///
    /// Stale UI state is clamped rather than rejected:
    /// - a negative start, or one at/after the end, becomes 0
    /// - a length of 0 or less means "everything from start to the end"
    /// - a length past the end is cut to the remainder
    pub fn resolve(start: i64, length: i64, count: usize) -> Self {
        let start = if start < 0 || start as u64 >= count as u64 {
            0
        } else {
            start as usize
        };

        let remaining = count - start;
        let len = if length <= 0 {
            remaining
        } else {
            (length as u64).min(remaining as u64) as usize
        };

        Self { start, len }
    }

    /// The whole buffer.
    pub fn full(count: usize) -> Self {
        Self {
            start: 0,
            len: count,
        }
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_start_clamps_to_zero() {
        assert_eq!(
            SampleWindow::resolve(-5, 10, 100),
            SampleWindow { start: 0, len: 10 }
        );
    }

    #[test]
    fn test_start_past_end_clamps_to_zero() {
        assert_eq!(
            SampleWindow::resolve(100, 10, 100),
            SampleWindow { start: 0, len: 10 }
        );
    }

    #[test]
    fn test_non_positive_length_means_remainder() {
        assert_eq!(
            SampleWindow::resolve(40, 0, 100),
            SampleWindow { start: 40, len: 60 }
        );
        assert_eq!(
            SampleWindow::resolve(40, -3, 100),
            SampleWindow { start: 40, len: 60 }
        );
    }

    #[test]
    fn test_length_clamps_to_remainder() {
        let window = SampleWindow::resolve(90, 50, 100);
        assert_eq!(window, SampleWindow { start: 90, len: 10 });
        assert_eq!(window.end(), 100);
        assert_eq!(window.range(), 90..100);
    }

    #[test]
    fn test_empty_buffer_gives_empty_window() {
        let window = SampleWindow::resolve(3, 7, 0);
        assert!(window.is_empty());
        assert_eq!(window.start, 0);
    }
}
