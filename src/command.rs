// Commands from the host to the geometry worker.
//
// Commands are the only way the host changes what the worker builds. They
// are queued and applied in order, so when several arrive between two
// builds the newest values win.

use crate::geometry::Viewport;
use crate::look::LookAndFeel;
use crate::sample_buffer::SampleBuffer;

#[derive(Debug, Clone)]
pub enum Command {
    /// Show `samples` from `start` for `length` samples (raw, unclamped).
    SetVisible {
        samples: SampleBuffer,
        start: i64,
        length: i64,
    },

    /// Replace the look-and-feel.
    SetConfiguration { look: LookAndFeel },

    /// Samples, window and look in one step, so the worker never builds
    /// from a half-applied update.
    SetInput {
        samples: SampleBuffer,
        start: i64,
        length: i64,
        look: LookAndFeel,
    },

    /// The drawable area changed size.
    Resize { viewport: Viewport },

    /// Stop the worker.
    Shutdown,
}
