// src/lib.rs
//
// Library entry point for FFI consumers (iOS/Swift) and the browser.

mod bridge;
mod cache;
mod command;
mod config;
mod device;
mod geometry;
mod handoff;
mod look;
mod renderer;
mod sample_buffer;
mod selection;
mod view;
mod window;

pub mod ffi;

#[cfg(feature = "web")]
pub mod wasm;

// Re-export key types for Rust consumers
pub use bridge::{FrameDriver, GeometryWorker, PublishHook, ViewHandle, create_bridge};
pub use cache::{CacheKey, GeometryCache, PublishedGeometry};
pub use command::Command;
pub use config::ViewConfig;
pub use device::{ClipRect, DrawPass, RecordedDraw, RecordingDevice, RenderDevice, RenderError};
pub use geometry::{
    Column, Geometry, Mesh, Primitive, Vertex, Viewport, build_geometry, build_window_geometry,
};
pub use handoff::GeometryHandoff;
pub use look::{Color, FillStyle, LookAndFeel};
pub use renderer::{DrawOutcome, RenderState, RenderStats, Renderer};
pub use sample_buffer::SampleBuffer;
pub use selection::{
    NormalizedRange, SampleRange, SelectionEvent, SelectionState, SelectionTracker, sample_index,
};
pub use view::{DynWaveformView, SelectionListener, WaveformSurface, WaveformView, build_view};
pub use window::SampleWindow;
