// src/cache.rs
//
// Change detection for built geometry.
//
// The cache remembers the exact inputs its mesh was built from and only
// rebuilds when one of them differs by value. Each rebuild gets a new
// generation number so consumers can tell whether they already uploaded it.

use std::sync::Arc;

use log::debug;

use crate::geometry::{Mesh, Viewport, build_window_geometry};
use crate::look::LookAndFeel;
use crate::sample_buffer::SampleBuffer;
use crate::window::SampleWindow;

/// The inputs a mesh is derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheKey {
    pub samples: SampleBuffer,
    pub window: SampleWindow,
    pub viewport: Viewport,
    pub look: LookAndFeel,
}

impl CacheKey {
    /// Build a key, resolving the raw window against the buffer.
    pub fn new(
        samples: SampleBuffer,
        start: i64,
        length: i64,
        viewport: Viewport,
        look: LookAndFeel,
    ) -> Self {
        let window = SampleWindow::resolve(start, length, samples.len());
        Self {
            samples,
            window,
            viewport,
            look,
        }
    }

    /// Whether this key can only ever produce an empty mesh.
    pub fn is_degenerate(&self) -> bool {
        self.viewport.is_empty() || self.window.is_empty()
    }
}

/// A mesh together with the key it was built from.
///
/// Immutable once created; it is replaced as a whole, never edited.
#[derive(Debug, Clone)]
pub struct PublishedGeometry {
    pub generation: u64,
    pub key: CacheKey,
    pub mesh: Arc<Mesh>,
}

/// Last built mesh and the key it came from.
#[derive(Debug, Default)]
pub struct GeometryCache {
    current: Option<Arc<PublishedGeometry>>,
    generation: u64,
    rebuilds: u64,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the cache match `key`, rebuilding only if it changed.
    ///
    /// Returns `true` if a rebuild happened.
    pub fn refresh(&mut self, key: &CacheKey) -> bool {
        if let Some(current) = &self.current {
            if current.key == *key {
                return false;
            }
        }

        let mesh = if key.is_degenerate() {
            Mesh::empty()
        } else {
            let geometry = build_window_geometry(
                &key.samples,
                key.window,
                key.viewport.width,
                &key.look,
            );
            Mesh::tessellate(&geometry, key.look.fill)
        };

        self.generation += 1;
        self.rebuilds += 1;

        debug!(
            "geometry rebuilt: gen={} window={}..{} viewport={}x{} vertices={}",
            self.generation,
            key.window.start,
            key.window.end(),
            key.viewport.width,
            key.viewport.height,
            mesh.vertex_count()
        );

        self.current = Some(Arc::new(PublishedGeometry {
            generation: self.generation,
            key: key.clone(),
            mesh: Arc::new(mesh),
        }));
        true
    }

    /// The most recent build, if any.
    pub fn current(&self) -> Option<&Arc<PublishedGeometry>> {
        self.current.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of rebuilds performed so far.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(samples: Vec<f32>, width: u32) -> CacheKey {
        CacheKey::new(
            samples.into(),
            0,
            0,
            Viewport::new(width, 40),
            LookAndFeel::default(),
        )
    }

    #[test]
    fn test_same_key_does_not_rebuild() {
        let mut cache = GeometryCache::new();
        assert!(cache.refresh(&key(vec![0.1, 0.2, 0.3], 10)));
        assert!(!cache.refresh(&key(vec![0.1, 0.2, 0.3], 10)));
        assert_eq!(cache.rebuild_count(), 1);
        assert_eq!(cache.generation(), 1);
    }

    #[test]
    fn test_changed_input_rebuilds() {
        let mut cache = GeometryCache::new();
        cache.refresh(&key(vec![0.1, 0.2, 0.3], 10));
        assert!(cache.refresh(&key(vec![0.1, 0.2, 0.4], 10)));
        assert!(cache.refresh(&key(vec![0.1, 0.2, 0.4], 11)));

        let mut restyled = key(vec![0.1, 0.2, 0.4], 11);
        restyled.look = restyled.look.with_mirrored(false);
        assert!(cache.refresh(&restyled));

        assert_eq!(cache.rebuild_count(), 4);
        assert_eq!(cache.current().map(|g| g.generation), Some(4));
    }

    #[test]
    fn test_degenerate_key_builds_empty_mesh() {
        let mut cache = GeometryCache::new();
        cache.refresh(&key(vec![0.1, 0.2], 0));
        let current = cache.current().expect("cache should hold a build");
        assert!(current.mesh.is_empty());
        assert!(current.key.is_degenerate());
    }
}
