//! WebAssembly bindings via wasm-bindgen for browser integration.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! # Usage
//!
//! Build with wasm-pack:
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { waveview_init, WebWaveview } from './waveview.js';
//!
//! await init();
//! waveview_init();
//!
//! const view = new WebWaveview(canvas.width, canvas.height);
//! view.set_samples(channelData, 0, 0);
//!
//! // Flat [x0, y0, x1, y1, ...] in clip space, ready for a WebGL buffer.
//! const vertices = view.redraw();
//! const mode = view.primitive() === 0 ? gl.TRIANGLES : gl.LINE_STRIP;
//! ```
//!
//! Geometry is built inline on the calling thread; the browser main thread
//! has no worker to hand off to.

use wasm_bindgen::prelude::*;

use crate::device::RecordingDevice;
use crate::geometry::{Primitive, Viewport};
use crate::look::{Color, FillStyle, LookAndFeel};
use crate::renderer::{DrawOutcome, Renderer};
use crate::sample_buffer::SampleBuffer;
use crate::selection::SampleRange;
use crate::view::WaveformView;

// ═══════════════════════════════════════════════════════════════════════════
// Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the wasm module. Call this once before using any other functions.
/// Sets up panic hooks and console logging.
#[wasm_bindgen]
pub fn waveview_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// View
// ═══════════════════════════════════════════════════════════════════════════

/// A waveform view for a `<canvas>`.
///
/// Draws into an in-memory device; JavaScript uploads the returned vertices
/// to WebGL itself.
#[wasm_bindgen]
pub struct WebWaveview {
    view: WaveformView<Renderer<RecordingDevice>>,
    primitive: Primitive,
}

#[wasm_bindgen]
impl WebWaveview {
    /// Create a view for a canvas of the given pixel size.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> WebWaveview {
        let mut view = WaveformView::new(Renderer::new(RecordingDevice::new()));
        view.resize(Viewport::new(width, height));
        Self {
            view,
            primitive: Primitive::TriangleList,
        }
    }

    /// Replace samples and window. `length <= 0` shows everything from `start`.
    pub fn set_samples(&mut self, samples: &[f32], start: f64, length: f64) {
        self.view
            .set_input(SampleBuffer::from(samples), start as i64, length as i64);
    }

    /// Mix interleaved multi-channel audio down and show it.
    pub fn set_interleaved(&mut self, samples: &[f32], channels: u32, start: f64, length: f64) {
        let buffer = SampleBuffer::from_interleaved(samples, channels as usize);
        self.view.set_input(buffer, start as i64, length as i64);
    }

    /// Move the visible window (zoom/pan).
    pub fn set_window(&mut self, start: f64, length: f64) {
        self.view.set_window(start as i64, length as i64);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.view.resize(Viewport::new(width, height));
    }

    pub fn sample_count(&self) -> u32 {
        u32::try_from(self.view.sample_count()).unwrap_or(u32::MAX)
    }

    // ───────────────────────────────────────────────────────────────
    // Look and feel
    // ───────────────────────────────────────────────────────────────

    pub fn set_foreground(&mut self, r: f32, g: f32, b: f32, a: f32) {
        let look = self.view.look().with_foreground(Color::new(r, g, b, a));
        self.view.set_look(look);
    }

    pub fn set_highlight_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        let look = self.view.look().with_highlight(Color::new(r, g, b, a));
        self.view.set_look(look);
    }

    /// 0 = filled, 1 = outline.
    pub fn set_fill(&mut self, fill: u32) {
        let look = self.view.look().with_fill(FillStyle::from_raw(fill));
        self.view.set_look(look);
    }

    pub fn set_mirrored(&mut self, mirrored: bool) {
        let look = self.view.look().with_mirrored(mirrored);
        self.view.set_look(look);
    }

    pub fn set_gain(&mut self, gain: f32) {
        let look = self.view.look().with_gain(gain);
        self.view.set_look(look);
    }

    pub fn reset_look(&mut self) {
        self.view.set_look(LookAndFeel::default());
    }

    // ───────────────────────────────────────────────────────────────
    // Drawing
    // ───────────────────────────────────────────────────────────────

    /// Render a frame and return its vertices as flat `[x, y, ...]`.
    ///
    /// Empty when there is nothing to draw.
    pub fn redraw(&mut self) -> Result<Vec<f32>, JsValue> {
        self.view.surface_mut().device_mut().clear_draws();
        let outcome = self
            .view
            .redraw()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        if outcome == DrawOutcome::Nothing {
            return Ok(Vec::new());
        }

        let device = self.view.surface().device();
        if let Some(draw) = device.draws().iter().find(|d| d.clip.is_none()) {
            self.primitive = draw.primitive;
        }
        Ok(device
            .last_frame_vertices()
            .map(|vertices| vertices.iter().flat_map(|v| v.position).collect())
            .unwrap_or_default())
    }

    /// Primitive of the last frame: 0 = triangle list, 1 = line strip.
    pub fn primitive(&self) -> u32 {
        self.primitive as u32
    }

    /// Pixel span `[x, width]` of the selection highlight in the last
    /// frame, or empty when nothing is highlighted.
    pub fn highlight_clip(&self) -> Vec<u32> {
        self.view
            .surface()
            .device()
            .draws()
            .iter()
            .find_map(|d| d.clip)
            .map(|clip| vec![clip.x, clip.width])
            .unwrap_or_default()
    }

    // ───────────────────────────────────────────────────────────────
    // Pointer input (x normalized 0..1 across the canvas)
    // ───────────────────────────────────────────────────────────────

    pub fn pointer_down(&mut self, x: f64) {
        self.view.pointer_down(x);
    }

    pub fn pointer_moved(&mut self, x: f64) {
        self.view.pointer_moved(x);
    }

    /// Finish a drag. Returns `[start, end]` in samples, or empty if no drag
    /// was in progress.
    pub fn pointer_up(&mut self, x: f64) -> Vec<f64> {
        self.view
            .pointer_up(x)
            .map(|event| range_to_js(event.range()))
            .unwrap_or_default()
    }

    /// Clear the selection. Always returns `[0, 0]`.
    pub fn tap(&mut self) -> Vec<f64> {
        range_to_js(self.view.tap().range())
    }

    pub fn cancel(&mut self) {
        self.view.cancel();
    }
}

fn range_to_js(range: SampleRange) -> Vec<f64> {
    vec![range.start as f64, range.end as f64]
}
