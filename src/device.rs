//! GPU device seam.
//!
//! The renderer never reaches for a global device. Hosts inject something
//! that implements [`RenderDevice`]: a Metal-backed callback table on iOS
//! (see `ffi`), or the [`RecordingDevice`] software sink in tests, the web
//! adapter and the sanity binary.

use thiserror::Error;

use crate::geometry::{Primitive, Vertex};
use crate::look::Color;

/// Errors raised by a render device.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    /// No GPU device could be acquired. Nothing can be drawn.
    #[error("render device unavailable")]
    DeviceUnavailable,

    #[error("vertex upload failed: {0}")]
    Upload(String),

    #[error("draw failed: {0}")]
    Draw(String),
}

/// Horizontal scissor span in device pixels. Covers the full height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ClipRect {
    pub x: u32,
    pub width: u32,
}

/// One draw of an uploaded vertex buffer.
#[derive(Debug)]
pub struct DrawPass<'a, B> {
    pub buffer: &'a B,
    pub primitive: Primitive,
    pub vertex_count: usize,
    pub color: Color,
    pub clip: Option<ClipRect>,
}

/// What the renderer needs from a GPU.
pub trait RenderDevice {
    /// Device-side handle for uploaded vertices.
    type Buffer;

    /// Copy vertices into a new device buffer.
    fn upload(&mut self, vertices: &[Vertex]) -> Result<Self::Buffer, RenderError>;

    /// Give a buffer back once the renderer no longer draws from it.
    fn release(&mut self, buffer: Self::Buffer) {
        drop(buffer);
    }

    /// Encode one draw.
    fn draw(&mut self, pass: &DrawPass<'_, Self::Buffer>) -> Result<(), RenderError>;
}

/// A draw pass as captured by [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub buffer: usize,
    pub primitive: Primitive,
    pub vertex_count: usize,
    pub color: Color,
    pub clip: Option<ClipRect>,
}

/// Software device that keeps every upload and draw in memory.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    buffers: Vec<Option<Vec<Vertex>>>,
    draws: Vec<RecordedDraw>,
    uploads: usize,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of uploads performed.
    pub fn upload_count(&self) -> usize {
        self.uploads
    }

    /// Number of buffers uploaded and not yet released.
    pub fn live_buffers(&self) -> usize {
        self.buffers.iter().filter(|b| b.is_some()).count()
    }

    /// Every draw recorded since the last [`clear_draws`](Self::clear_draws).
    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }

    /// Vertices of a live buffer.
    pub fn vertices(&self, buffer: usize) -> Option<&[Vertex]> {
        self.buffers.get(buffer)?.as_deref()
    }

    /// Vertices drawn by the most recent unclipped pass.
    pub fn last_frame_vertices(&self) -> Option<&[Vertex]> {
        let draw = self.draws.iter().rev().find(|d| d.clip.is_none())?;
        self.vertices(draw.buffer)
    }
}

impl RenderDevice for RecordingDevice {
    type Buffer = usize;

    fn upload(&mut self, vertices: &[Vertex]) -> Result<usize, RenderError> {
        self.uploads += 1;
        self.buffers.push(Some(vertices.to_vec()));
        Ok(self.buffers.len() - 1)
    }

    fn release(&mut self, buffer: usize) {
        if let Some(slot) = self.buffers.get_mut(buffer) {
            *slot = None;
        }
    }

    fn draw(&mut self, pass: &DrawPass<'_, usize>) -> Result<(), RenderError> {
        if self.vertices(*pass.buffer).is_none() {
            return Err(RenderError::Draw(format!(
                "buffer {} is not live",
                pass.buffer
            )));
        }
        self.draws.push(RecordedDraw {
            buffer: *pass.buffer,
            primitive: pass.primitive,
            vertex_count: pass.vertex_count,
            color: pass.color,
            clip: pass.clip,
        });
        Ok(())
    }
}
