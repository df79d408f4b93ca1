use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::PublishedGeometry;

/// Latest-wins slot for built geometry.
///
/// Single producer (geometry worker)
/// Single consumer (draw path)
///
/// The worker builds a complete `PublishedGeometry` off to the side and
/// swaps the `Arc` in under the lock; the draw path clones the `Arc` out.
/// The lock is held only for the pointer swap, so the draw path never waits
/// on a rebuild and never sees a half-written mesh.
#[derive(Default)]
pub struct GeometryHandoff {
    slot: Mutex<Option<Arc<PublishedGeometry>>>,
}

impl GeometryHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish new geometry to the draw path.
    ///
    /// Worker-only. Anything not newer than what is already published is
    /// dropped, so a slow stale build can never replace a fresher one.
    /// Returns `true` if `geometry` was published.
    pub fn publish(&self, geometry: Arc<PublishedGeometry>) -> bool {
        let mut slot = self.slot.lock();
        if let Some(current) = slot.as_ref() {
            if current.generation >= geometry.generation {
                return false;
            }
        }
        *slot = Some(geometry);
        true
    }

    /// Get the most recently published geometry.
    ///
    /// Draw-path-safe; holds the lock only for an `Arc` clone.
    #[inline]
    pub fn latest(&self) -> Option<Arc<PublishedGeometry>> {
        self.slot.lock().clone()
    }

    /// Generation of the published geometry, 0 if none.
    pub fn generation(&self) -> u64 {
        self.slot.lock().as_ref().map_or(0, |g| g.generation)
    }
}
