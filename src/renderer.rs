// src/renderer.rs
//
// Decides when geometry must be rebuilt, owns the uploaded vertex buffer and
// issues draws on an injected device.
//
// State machine:
//
//   Idle ──set_visible──▶ Built ──redraw (inputs unchanged)──▶ Built
//                           │                                     ▲
//                           └──redraw (inputs changed)──▶ Rebuilding
//
// Inputs are compared when they are set, not when drawn: a redraw with
// unchanged inputs is a flag check and a draw call. It never reads the
// samples and never re-uploads.

use std::sync::Arc;

use log::{debug, warn};

use crate::cache::{CacheKey, GeometryCache, PublishedGeometry};
use crate::device::{ClipRect, DrawPass, RenderDevice, RenderError};
use crate::geometry::{Primitive, Viewport};
use crate::look::LookAndFeel;
use crate::sample_buffer::SampleBuffer;
use crate::selection::NormalizedRange;

/// Result of servicing a redraw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// A frame was drawn.
    Drew {
        generation: u64,
        vertex_count: usize,
        highlighted: bool,
    },
    /// Nothing to draw (no samples, empty window, or zero-sized viewport).
    Nothing,
}

impl DrawOutcome {
    pub fn drew(&self) -> bool {
        matches!(self, DrawOutcome::Drew { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// No samples supplied yet.
    Idle,
    /// Geometry is built (or will be on the next redraw) for the current inputs.
    Built,
}

/// Counters for tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub rebuilds: u64,
    pub uploads: u64,
    /// Redraws that consulted the geometry cache.
    pub key_checks: u64,
    pub frames: u64,
    pub empty_frames: u64,
}

/// Vertex buffer currently resident on the device.
struct Uploaded<B> {
    generation: u64,
    buffer: B,
    vertex_count: usize,
    primitive: Primitive,
}

/// Waveform renderer for one view.
pub struct Renderer<D: RenderDevice> {
    device: D,

    samples: Option<SampleBuffer>,
    start: i64,
    length: i64,
    look: LookAndFeel,
    viewport: Viewport,
    highlight: Option<NormalizedRange>,
    dirty: bool,

    cache: GeometryCache,
    uploaded: Option<Uploaded<D::Buffer>>,
    stats: RenderStats,
}

impl<D: RenderDevice> Renderer<D> {
    pub fn new(device: D) -> Self {
        Self::with_look(device, LookAndFeel::default())
    }

    pub fn with_look(device: D, look: LookAndFeel) -> Self {
        Self {
            device,
            samples: None,
            start: 0,
            length: 0,
            look,
            viewport: Viewport::default(),
            highlight: None,
            dirty: false,
            cache: GeometryCache::new(),
            uploaded: None,
            stats: RenderStats::default(),
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Inputs
    // ───────────────────────────────────────────────────────────────

    /// Set the samples and the window to show.
    ///
    /// Cheap: nothing is rebuilt until the next redraw, and only if the
    /// inputs differ by value from the last build.
    pub fn set_visible(&mut self, samples: SampleBuffer, start: i64, length: i64) {
        // Keep the resident buffer when the contents match so later
        // comparisons hit the identity fast path.
        if self.samples.as_ref() != Some(&samples) {
            self.samples = Some(samples);
            self.dirty = true;
        }
        if (start, length) != (self.start, self.length) {
            self.start = start;
            self.length = length;
            self.dirty = true;
        }
    }

    /// Replace the look-and-feel wholesale.
    pub fn set_configuration(&mut self, look: LookAndFeel) {
        if look != self.look {
            self.look = look;
            self.dirty = true;
        }
    }

    pub fn on_resize(&mut self, viewport: Viewport) {
        if viewport != self.viewport {
            self.viewport = viewport;
            self.dirty = true;
        }
    }

    /// Span to draw in the highlight color. Never triggers a rebuild.
    pub fn set_highlight(&mut self, highlight: Option<NormalizedRange>) {
        self.highlight = highlight;
    }

    // ───────────────────────────────────────────────────────────────
    // Drawing
    // ───────────────────────────────────────────────────────────────

    /// Rebuild if any input changed, then draw.
    pub fn redraw(&mut self) -> Result<DrawOutcome, RenderError> {
        let Some(samples) = self.samples.clone() else {
            return Ok(self.draw_nothing());
        };

        if self.dirty {
            self.dirty = false;
            self.stats.key_checks += 1;
            let key = CacheKey::new(
                samples,
                self.start,
                self.length,
                self.viewport,
                self.look.clone(),
            );
            if self.cache.refresh(&key) {
                self.stats.rebuilds = self.cache.rebuild_count();
            }
        }

        let published = self.cache.current().cloned();
        self.present(published.as_deref())
    }

    /// Draw already-built geometry, uploading it first if it is new.
    ///
    /// Used directly by the threaded path, where geometry is built on a
    /// worker and only handed to the draw side once complete.
    pub fn present(
        &mut self,
        published: Option<&PublishedGeometry>,
    ) -> Result<DrawOutcome, RenderError> {
        let Some(published) = published else {
            return Ok(self.draw_nothing());
        };
        if published.mesh.is_empty() || published.key.viewport.is_empty() {
            self.release_uploaded();
            return Ok(self.draw_nothing());
        }

        let stale = self
            .uploaded
            .as_ref()
            .is_none_or(|u| u.generation != published.generation);
        if stale {
            let buffer = self.device.upload(&published.mesh.vertices)?;
            self.release_uploaded();
            self.uploaded = Some(Uploaded {
                generation: published.generation,
                buffer,
                vertex_count: published.mesh.vertex_count(),
                primitive: published.mesh.primitive,
            });
            self.stats.uploads += 1;
            debug!(
                "uploaded gen={} ({} vertices)",
                published.generation,
                published.mesh.vertex_count()
            );
        }

        let Some(uploaded) = self.uploaded.as_ref() else {
            return Ok(self.draw_nothing());
        };

        let look = &published.key.look;
        self.device.draw(&DrawPass {
            buffer: &uploaded.buffer,
            primitive: uploaded.primitive,
            vertex_count: uploaded.vertex_count,
            color: look.foreground,
            clip: None,
        })?;

        // Scissor against the surface as it is now; a threaded build may
        // still carry the previous size.
        let clip = self
            .highlight
            .and_then(|span| highlight_clip(span, self.viewport.width));
        if let Some(clip) = clip {
            self.device.draw(&DrawPass {
                buffer: &uploaded.buffer,
                primitive: uploaded.primitive,
                vertex_count: uploaded.vertex_count,
                color: look.highlight,
                clip: Some(clip),
            })?;
        }

        self.stats.frames += 1;
        Ok(DrawOutcome::Drew {
            generation: published.generation,
            vertex_count: uploaded.vertex_count,
            highlighted: clip.is_some(),
        })
    }

    fn draw_nothing(&mut self) -> DrawOutcome {
        self.stats.frames += 1;
        self.stats.empty_frames += 1;
        DrawOutcome::Nothing
    }

    fn release_uploaded(&mut self) {
        if let Some(old) = self.uploaded.take() {
            self.device.release(old.buffer);
        }
    }

    // ───────────────────────────────────────────────────────────────
    // State access
    // ───────────────────────────────────────────────────────────────

    pub fn state(&self) -> RenderState {
        if self.samples.is_some() {
            RenderState::Built
        } else {
            RenderState::Idle
        }
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Geometry rebuilds performed by this renderer.
    pub fn rebuild_count(&self) -> u64 {
        self.cache.rebuild_count()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn look(&self) -> &LookAndFeel {
        &self.look
    }

    pub fn samples(&self) -> Option<&SampleBuffer> {
        self.samples.as_ref()
    }

    /// Latest geometry built by this renderer's own cache.
    pub fn current_geometry(&self) -> Option<&Arc<PublishedGeometry>> {
        self.cache.current()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: RenderDevice> Drop for Renderer<D> {
    fn drop(&mut self) {
        self.release_uploaded();
    }
}

/// Pixel span covered by a normalized highlight, if it covers anything.
fn highlight_clip(span: NormalizedRange, width: u32) -> Option<ClipRect> {
    if span.is_empty() || width == 0 {
        return None;
    }
    let x = (span.start * width as f64).floor() as u32;
    let end = ((span.end * width as f64).ceil() as u32).min(width);
    if end <= x {
        warn!("highlight {:?} collapsed at width {}", span, width);
        return None;
    }
    Some(ClipRect { x, width: end - x })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RecordingDevice;
    use crate::look::FillStyle;

    fn sine(count: usize) -> SampleBuffer {
        (0..count).map(|i| (i as f32 * 0.01).sin()).collect()
    }

    fn renderer() -> Renderer<RecordingDevice> {
        let mut renderer = Renderer::new(RecordingDevice::new());
        renderer.on_resize(Viewport::new(200, 80));
        renderer
    }

    #[test]
    fn test_idle_draws_nothing() {
        let mut renderer = renderer();
        assert_eq!(renderer.state(), RenderState::Idle);
        assert_eq!(renderer.redraw(), Ok(DrawOutcome::Nothing));
        assert_eq!(renderer.rebuild_count(), 0);
    }

    #[test]
    fn test_unchanged_redraw_does_not_recompute() {
        let mut renderer = renderer();
        renderer.set_visible(sine(10_000), 0, 0);

        assert!(renderer.redraw().unwrap().drew());
        assert_eq!(renderer.state(), RenderState::Built);
        assert_eq!(renderer.rebuild_count(), 1);

        assert!(renderer.redraw().unwrap().drew());
        assert_eq!(renderer.rebuild_count(), 1);
        assert_eq!(renderer.stats().uploads, 1);
        assert_eq!(renderer.device().upload_count(), 1);
        assert_eq!(renderer.device().draws().len(), 2);
    }

    #[test]
    fn test_unchanged_redraw_skips_key_comparison() {
        let mut renderer = renderer();
        let samples = sine(100_000);
        renderer.set_visible(samples.clone(), 0, 1_000);
        renderer.redraw().unwrap();
        assert_eq!(renderer.stats().key_checks, 1);

        for _ in 0..20 {
            assert!(renderer.redraw().unwrap().drew());
        }
        // Re-sending identical inputs is not a change either.
        renderer.set_visible(samples, 0, 1_000);
        renderer.set_configuration(LookAndFeel::default());
        renderer.on_resize(Viewport::new(200, 80));
        renderer.redraw().unwrap();

        assert_eq!(renderer.stats().key_checks, 1);
        assert_eq!(renderer.rebuild_count(), 1);
        assert_eq!(renderer.device().upload_count(), 1);
    }

    #[test]
    fn test_nan_samples_build_once() {
        let mut samples: Vec<f32> = (0..10_000).map(|i| (i as f32 * 0.01).sin()).collect();
        samples[5_000] = f32::NAN;
        let samples = SampleBuffer::new(samples);

        let mut renderer = renderer();
        renderer.set_visible(samples.clone(), 0, 0);
        for _ in 0..3 {
            renderer.redraw().unwrap();
        }
        renderer.set_visible(samples, 0, 0);
        renderer.redraw().unwrap();

        assert_eq!(renderer.rebuild_count(), 1);
        assert_eq!(renderer.stats().uploads, 1);
    }

    #[test]
    fn test_same_data_in_new_buffer_does_not_recompute() {
        let mut renderer = renderer();
        renderer.set_visible(sine(4_000), 10, 2_000);
        renderer.redraw().unwrap();

        renderer.set_visible(sine(4_000), 10, 2_000);
        renderer.redraw().unwrap();
        assert_eq!(renderer.rebuild_count(), 1);
    }

    #[test]
    fn test_each_input_change_rebuilds() {
        let mut renderer = renderer();
        renderer.set_visible(sine(4_000), 0, 0);
        renderer.redraw().unwrap();

        renderer.set_visible(sine(4_000), 100, 0);
        renderer.redraw().unwrap();
        assert_eq!(renderer.rebuild_count(), 2);

        renderer.on_resize(Viewport::new(300, 80));
        renderer.redraw().unwrap();
        assert_eq!(renderer.rebuild_count(), 3);

        renderer.set_configuration(LookAndFeel::default().with_fill(FillStyle::Outline));
        renderer.redraw().unwrap();
        assert_eq!(renderer.rebuild_count(), 4);

        renderer.set_visible(sine(4_001), 100, 0);
        renderer.redraw().unwrap();
        assert_eq!(renderer.rebuild_count(), 5);

        // Only the newest buffer stays resident.
        assert_eq!(renderer.device().upload_count(), 5);
        assert_eq!(renderer.device().live_buffers(), 1);
    }

    #[test]
    fn test_degenerate_inputs_draw_nothing() {
        let mut renderer = renderer();
        renderer.set_visible(SampleBuffer::empty(), 0, 0);
        assert_eq!(renderer.redraw(), Ok(DrawOutcome::Nothing));

        renderer.set_visible(sine(100), 0, 0);
        renderer.on_resize(Viewport::new(0, 0));
        assert_eq!(renderer.redraw(), Ok(DrawOutcome::Nothing));
        assert!(renderer.device().draws().is_empty());
        assert_eq!(renderer.stats().empty_frames, 2);
    }

    #[test]
    fn test_highlight_adds_clipped_pass_without_rebuild() {
        let mut renderer = renderer();
        renderer.set_visible(sine(1_000), 0, 0);
        renderer.redraw().unwrap();

        renderer.set_highlight(Some(NormalizedRange::new(0.25, 0.5)));
        let outcome = renderer.redraw().unwrap();

        assert!(matches!(outcome, DrawOutcome::Drew { highlighted: true, .. }));
        assert_eq!(renderer.rebuild_count(), 1);
        assert_eq!(renderer.device().upload_count(), 1);

        let last = renderer.device().draws().last().unwrap();
        assert_eq!(last.clip, Some(ClipRect { x: 50, width: 50 }));
        assert_eq!(last.color, LookAndFeel::DEFAULT_HIGHLIGHT);
    }

    #[test]
    fn test_highlight_clip_bounds() {
        assert_eq!(
            highlight_clip(NormalizedRange::new(0.0, 1.0), 10),
            Some(ClipRect { x: 0, width: 10 })
        );
        assert_eq!(highlight_clip(NormalizedRange::new(0.5, 0.5), 10), None);
        assert_eq!(highlight_clip(NormalizedRange::new(0.1, 0.2), 0), None);
    }
}
