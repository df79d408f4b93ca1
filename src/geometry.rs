//! Waveform geometry: samples in, envelope columns and vertices out.
//!
//! # Pipeline
//!
//! 1. [`build_geometry`] resolves the visible window and reduces it to at
//!    most one [`Column`] per horizontal pixel. When the window holds more
//!    samples than the viewport has pixels, consecutive samples are binned
//!    and each column records the min/max of its bin, so dense audio still
//!    renders as a continuous envelope.
//! 2. [`Mesh::tessellate`] turns the columns into vertices in normalized
//!    device coordinates, ready to copy into a GPU vertex buffer.
//!
//! Both steps are pure functions of their inputs.

use crate::look::{FillStyle, LookAndFeel};
use crate::sample_buffer::SampleBuffer;
use crate::window::SampleWindow;

/// Drawable area in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// One horizontal position of the waveform envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    /// Horizontal position in pixels, 0 at the left edge.
    pub x: f32,
    /// Upper envelope, amplitude units.
    pub top: f32,
    /// Lower envelope, amplitude units. Always `<= top`.
    pub bottom: f32,
}

/// Envelope of a sample window laid out across a viewport.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    pub columns: Vec<Column>,
    pub viewport_width: u32,
    /// Samples folded into each column (1 when not binned).
    pub samples_per_column: usize,
}

impl Geometry {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }
}

/// Build the envelope for `samples[start..start + length]` across
/// `viewport_width` pixels.
///
/// Window parameters are clamped (see [`SampleWindow::resolve`]). An empty
/// buffer, an empty window or a zero width produce an empty geometry.
pub fn build_geometry(
    samples: &SampleBuffer,
    start: i64,
    length: i64,
    viewport_width: u32,
    look: &LookAndFeel,
) -> Geometry {
    let window = SampleWindow::resolve(start, length, samples.len());
    build_window_geometry(samples, window, viewport_width, look)
}

/// Same as [`build_geometry`] for an already-resolved window.
pub fn build_window_geometry(
    samples: &SampleBuffer,
    window: SampleWindow,
    viewport_width: u32,
    look: &LookAndFeel,
) -> Geometry {
    let width = viewport_width as usize;
    if window.is_empty() || width == 0 || window.end() > samples.len() {
        return Geometry {
            columns: Vec::new(),
            viewport_width,
            samples_per_column: 0,
        };
    }

    let visible = &samples.as_slice()[window.range()];
    let n = visible.len();

    // Bin only when samples outnumber pixels.
    let bucket = if n > width { n.div_ceil(width) } else { 1 };
    let count = n.div_ceil(bucket);

    let columns = visible
        .chunks(bucket)
        .enumerate()
        .map(|(i, chunk)| {
            let (top, bottom) = if bucket > 1 {
                binned_envelope(chunk, look)
            } else {
                direct_envelope(chunk[0], look)
            };
            Column {
                x: column_x(i, count, width),
                top,
                bottom,
            }
        })
        .collect();

    Geometry {
        columns,
        viewport_width,
        samples_per_column: bucket,
    }
}

/// Pixel position of column `index` out of `count`, spanning the full width.
#[inline]
fn column_x(index: usize, count: usize, width: usize) -> f32 {
    if count <= 1 {
        return 0.0;
    }
    index as f32 / (count - 1) as f32 * (width - 1) as f32
}

fn binned_envelope(chunk: &[f32], look: &LookAndFeel) -> (f32, f32) {
    let (min, max) = chunk
        .iter()
        .fold((f32::MAX, f32::MIN), |(min, max), &s| (min.min(s), max.max(s)));
    let (min, max) = (look.scale(min), look.scale(max));

    if look.mirrored {
        let peak = min.abs().max(max.abs());
        (peak, -peak)
    } else {
        (max, min)
    }
}

fn direct_envelope(sample: f32, look: &LookAndFeel) -> (f32, f32) {
    let s = look.scale(sample);
    if look.mirrored {
        (s.abs(), -s.abs())
    } else {
        (s.max(0.0), s.min(0.0))
    }
}

/// A 2D vertex in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 2],
}

impl Vertex {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { position: [x, y] }
    }
}

/// Primitive topology of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Primitive {
    TriangleList = 0,
    LineStrip = 1,
}

/// GPU-ready vertices for one waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub primitive: Primitive,
    pub vertices: Vec<Vertex>,
}

impl Mesh {
    pub fn empty() -> Self {
        Self {
            primitive: Primitive::TriangleList,
            vertices: Vec::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Flatten vertex positions to `[x0, y0, x1, y1, ...]`.
    pub fn to_flat(&self) -> Vec<f32> {
        self.vertices.iter().flat_map(|v| v.position).collect()
    }

    /// Turn envelope columns into drawable vertices.
    ///
    /// - `Filled`: a triangle list, two triangles per pair of neighbouring
    ///   columns. A single column becomes a two-vertex line strip.
    /// - `Outline`: one closed line strip, top edge left to right then bottom
    ///   edge right to left.
    pub fn tessellate(geometry: &Geometry, fill: FillStyle) -> Self {
        let columns = &geometry.columns;
        if columns.is_empty() {
            return Self::empty();
        }

        let width = geometry.viewport_width;
        let top = |c: &Column| Vertex::new(ndc_x(c.x, width), c.top);
        let bottom = |c: &Column| Vertex::new(ndc_x(c.x, width), c.bottom);

        if columns.len() == 1 {
            return Self {
                primitive: Primitive::LineStrip,
                vertices: vec![top(&columns[0]), bottom(&columns[0])],
            };
        }

        match fill {
            FillStyle::Filled => {
                let mut vertices = Vec::with_capacity((columns.len() - 1) * 6);
                for pair in columns.windows(2) {
                    let (a, b) = (&pair[0], &pair[1]);
                    vertices.extend_from_slice(&[top(a), bottom(a), top(b)]);
                    vertices.extend_from_slice(&[top(b), bottom(a), bottom(b)]);
                }
                Self {
                    primitive: Primitive::TriangleList,
                    vertices,
                }
            }
            FillStyle::Outline => {
                let mut vertices = Vec::with_capacity(columns.len() * 2 + 1);
                vertices.extend(columns.iter().map(top));
                vertices.extend(columns.iter().rev().map(bottom));
                vertices.push(top(&columns[0]));
                Self {
                    primitive: Primitive::LineStrip,
                    vertices,
                }
            }
        }
    }
}

#[inline]
fn ndc_x(x: f32, width: u32) -> f32 {
    if width <= 1 {
        return -1.0;
    }
    x / (width - 1) as f32 * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(count: usize) -> SampleBuffer {
        (0..count)
            .map(|i| ((i as f32) * 0.37).sin() * 0.8)
            .collect()
    }

    fn unmirrored() -> LookAndFeel {
        LookAndFeel::default().with_mirrored(false)
    }

    #[test]
    fn test_deterministic() {
        let buffer = ramp(10_000);
        let look = LookAndFeel::default();
        let a = build_geometry(&buffer, 120, 5_000, 300, &look);
        let b = build_geometry(&buffer, 120, 5_000, 300, &look);
        assert_eq!(a, b);
        assert_eq!(
            Mesh::tessellate(&a, FillStyle::Filled),
            Mesh::tessellate(&b, FillStyle::Filled)
        );
    }

    #[test]
    fn test_binning_bounds_true_min_max() {
        let buffer = ramp(10_007);
        let look = unmirrored();
        let width = 300;
        let geometry = build_geometry(&buffer, 0, 0, width, &look);

        assert!(geometry.len() <= width as usize);
        let bucket = geometry.samples_per_column;
        assert_eq!(bucket, 10_007usize.div_ceil(300));

        for (column, chunk) in geometry.columns.iter().zip(buffer.as_slice().chunks(bucket)) {
            let min = chunk.iter().copied().fold(f32::MAX, f32::min);
            let max = chunk.iter().copied().fold(f32::MIN, f32::max);
            assert!(column.top >= max);
            assert!(column.bottom <= min);
        }
    }

    #[test]
    fn test_mirrored_binning_still_bounds() {
        let buffer: SampleBuffer = vec![0.1, -0.7, 0.3, 0.2, 0.5, -0.1].into();
        let geometry = build_geometry(&buffer, 0, 0, 2, &LookAndFeel::default());

        assert_eq!(geometry.len(), 2);
        assert_eq!(geometry.columns[0].top, 0.7);
        assert_eq!(geometry.columns[0].bottom, -0.7);
        assert_eq!(geometry.columns[1].top, 0.5);
        assert_eq!(geometry.columns[1].bottom, -0.5);
    }

    #[test]
    fn test_direct_mode_represents_every_sample() {
        let buffer: SampleBuffer = vec![0.2, -0.4, 0.6, -0.8].into();
        let geometry = build_geometry(&buffer, 0, 0, 100, &unmirrored());

        assert_eq!(geometry.len(), 4);
        assert_eq!(geometry.samples_per_column, 1);
        for (column, &s) in geometry.columns.iter().zip(buffer.iter()) {
            assert!(column.bottom <= s && s <= column.top);
        }
        assert_eq!(geometry.columns[0].x, 0.0);
        assert_eq!(geometry.columns[3].x, 99.0);
        assert!(geometry.columns.windows(2).all(|w| w[0].x < w[1].x));
    }

    #[test]
    fn test_negative_start_matches_zero_start() {
        let buffer = ramp(500);
        let look = LookAndFeel::default();
        assert_eq!(
            build_geometry(&buffer, -5, 10, 64, &look),
            build_geometry(&buffer, 0, 10, 64, &look)
        );
    }

    #[test]
    fn test_window_follows_start_index() {
        let buffer: SampleBuffer = vec![0.0, 0.0, 0.9, -0.3].into();
        let geometry = build_geometry(&buffer, 2, 2, 10, &unmirrored());

        assert_eq!(geometry.len(), 2);
        assert_eq!(geometry.columns[0].top, 0.9);
        assert_eq!(geometry.columns[1].bottom, -0.3);
    }

    #[test]
    fn test_degenerate_inputs_are_empty() {
        let look = LookAndFeel::default();
        assert!(build_geometry(&SampleBuffer::empty(), 0, 0, 100, &look).is_empty());
        assert!(build_geometry(&ramp(100), 0, 0, 0, &look).is_empty());
        assert!(Mesh::tessellate(&Geometry::default(), FillStyle::Filled).is_empty());
    }

    #[test]
    fn test_filled_mesh_layout() {
        let buffer: SampleBuffer = vec![0.5, -0.5, 0.25].into();
        let geometry = build_geometry(&buffer, 0, 0, 3, &LookAndFeel::default());
        let mesh = Mesh::tessellate(&geometry, FillStyle::Filled);

        assert_eq!(mesh.primitive, Primitive::TriangleList);
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.vertices[0], Vertex::new(-1.0, 0.5));
        assert_eq!(mesh.vertices[1], Vertex::new(-1.0, -0.5));
        assert_eq!(mesh.vertices[11], Vertex::new(1.0, -0.25));
    }

    #[test]
    fn test_outline_mesh_is_closed() {
        let buffer = ramp(40);
        let geometry = build_geometry(&buffer, 0, 0, 20, &LookAndFeel::default());
        let mesh = Mesh::tessellate(&geometry, FillStyle::Outline);

        assert_eq!(mesh.primitive, Primitive::LineStrip);
        assert_eq!(mesh.vertex_count(), geometry.len() * 2 + 1);
        assert_eq!(mesh.vertices.first(), mesh.vertices.last());
    }

    #[test]
    fn test_single_column_is_a_line() {
        let buffer: SampleBuffer = vec![0.4].into();
        let geometry = build_geometry(&buffer, 0, 0, 50, &LookAndFeel::default());
        let mesh = Mesh::tessellate(&geometry, FillStyle::Filled);

        assert_eq!(mesh.primitive, Primitive::LineStrip);
        assert_eq!(mesh.to_flat(), vec![-1.0, 0.4, -1.0, -0.4]);
    }
}
