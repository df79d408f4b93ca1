// src/selection.rs
//
// Drag-to-select state machine and normalized -> sample index mapping.
//
// Normalized positions (0.0 at the left edge of the viewport, 1.0 at the
// right) are mapped against the FULL buffer's sample count, not the visible
// window's.

/// Map a normalized position to a sample index.
///
/// `round(clamp(normalized, 0, 1) * total)`, so the result is in `0..=total`.
pub fn sample_index(normalized: f64, total: usize) -> usize {
    let normalized = if normalized.is_nan() {
        0.0
    } else {
        normalized.clamp(0.0, 1.0)
    };
    ((normalized * total as f64).round() as usize).min(total)
}

/// A reported selection in sample indices. `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub struct SampleRange {
    pub start: usize,
    pub end: usize,
}

impl SampleRange {
    /// What a tap-to-clear reports.
    pub const CLEARED: SampleRange = SampleRange { start: 0, end: 0 };

    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// An ordered span of the viewport in normalized units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedRange {
    pub start: f64,
    pub end: f64,
}

impl NormalizedRange {
    /// Build from two positions in any order, clamped to 0..=1.
    pub fn new(a: f64, b: f64) -> Self {
        let (a, b) = (clamp_unit(a), clamp_unit(b));
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn to_samples(self, total: usize) -> SampleRange {
        SampleRange::new(sample_index(self.start, total), sample_index(self.end, total))
    }
}

#[inline]
fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// Emitted when a gesture finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    /// A drag ended over this range.
    Selected(SampleRange),
    /// A tap cleared the selection; reported upward as `(0, 0)`.
    Cleared,
}

impl SelectionEvent {
    /// The range a host callback receives.
    pub fn range(&self) -> SampleRange {
        match self {
            SelectionEvent::Selected(range) => *range,
            SelectionEvent::Cleared => SampleRange::CLEARED,
        }
    }
}

/// Where the tracker is in a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Dragging {
        anchor: f64,
        current: f64,
    },
    Reported {
        span: NormalizedRange,
        range: SampleRange,
    },
}

/// Owns drag state for one view: `Idle -> Dragging -> Reported`.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    state: SelectionState,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Pointer went down at `x`.
    pub fn begin(&mut self, x: f64) {
        let x = clamp_unit(x);
        self.state = SelectionState::Dragging {
            anchor: x,
            current: x,
        };
    }

    /// Pointer moved to `x`. Ignored unless dragging.
    pub fn update(&mut self, x: f64) {
        if let SelectionState::Dragging { current, .. } = &mut self.state {
            *current = clamp_unit(x);
        }
    }

    /// Pointer released at `x`; reports the dragged range.
    ///
    /// Returns `None` if no drag was in progress.
    pub fn end(&mut self, x: f64, total_samples: usize) -> Option<SelectionEvent> {
        let SelectionState::Dragging { anchor, .. } = self.state else {
            return None;
        };

        let span = NormalizedRange::new(anchor, x);
        let range = span.to_samples(total_samples);
        self.state = SelectionState::Reported { span, range };
        Some(SelectionEvent::Selected(range))
    }

    /// Tap clears any selection.
    pub fn tap(&mut self) -> SelectionEvent {
        self.state = SelectionState::Idle;
        SelectionEvent::Cleared
    }

    /// Gesture cancelled by the platform; nothing is reported.
    pub fn cancel(&mut self) {
        self.state = SelectionState::Idle;
    }

    /// Span to highlight, if any.
    pub fn highlight(&self) -> Option<NormalizedRange> {
        match self.state {
            SelectionState::Idle => None,
            SelectionState::Dragging { anchor, current } => {
                Some(NormalizedRange::new(anchor, current))
            }
            SelectionState::Reported { span, .. } => Some(span),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_round_trip() {
        let mut tracker = SelectionTracker::new();
        tracker.begin(0.2);
        tracker.update(0.35);
        let event = tracker.end(0.5, 1000);

        assert_eq!(
            event,
            Some(SelectionEvent::Selected(SampleRange { start: 200, end: 500 }))
        );
        assert!(matches!(tracker.state(), SelectionState::Reported { .. }));
    }

    #[test]
    fn test_right_to_left_drag_is_ordered() {
        let mut tracker = SelectionTracker::new();
        tracker.begin(0.75);
        let event = tracker.end(0.25, 400).unwrap();
        assert_eq!(event.range(), SampleRange { start: 100, end: 300 });
    }

    #[test]
    fn test_tap_clears() {
        let mut tracker = SelectionTracker::new();
        tracker.begin(0.1);
        tracker.end(0.9, 1000);

        let event = tracker.tap();
        assert_eq!(event, SelectionEvent::Cleared);
        assert_eq!(event.range(), SampleRange::CLEARED);
        assert_eq!(tracker.state(), SelectionState::Idle);
        assert_eq!(tracker.highlight(), None);
    }

    #[test]
    fn test_positions_are_clamped() {
        let mut tracker = SelectionTracker::new();
        tracker.begin(-0.5);
        tracker.update(3.0);
        assert_eq!(tracker.highlight(), Some(NormalizedRange { start: 0.0, end: 1.0 }));
        assert_eq!(
            tracker.end(1.7, 640).map(|e| e.range()),
            Some(SampleRange { start: 0, end: 640 })
        );
    }

    #[test]
    fn test_end_without_begin_reports_nothing() {
        let mut tracker = SelectionTracker::new();
        assert_eq!(tracker.end(0.5, 100), None);
        tracker.update(0.4);
        assert_eq!(tracker.state(), SelectionState::Idle);
    }

    #[test]
    fn test_cancel_resets_without_event() {
        let mut tracker = SelectionTracker::new();
        tracker.begin(0.3);
        tracker.update(0.6);
        tracker.cancel();
        assert_eq!(tracker.state(), SelectionState::Idle);
        assert_eq!(tracker.end(0.6, 100), None);
    }

    #[test]
    fn test_sample_index_bounds() {
        assert_eq!(sample_index(0.0, 1000), 0);
        assert_eq!(sample_index(1.0, 1000), 1000);
        assert_eq!(sample_index(0.0004, 1000), 0);
        assert_eq!(sample_index(0.0006, 1000), 1);
        assert_eq!(sample_index(f64::NAN, 1000), 0);
        assert_eq!(sample_index(0.5, 0), 0);
    }
}
