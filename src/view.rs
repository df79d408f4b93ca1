//! The narrow interface a platform view talks to.
//!
//! A native view (a Metal-backed `UIView`/`NSView`, a browser canvas, ...)
//! only needs three calls into the core: resize, input changed, redraw.
//! [`WaveformSurface`] is that interface; [`WaveformView`] adds pointer
//! handling on top so a platform adapter stays a thin shim that forwards
//! events and reports selections back to the host.

use std::thread::JoinHandle;

use log::debug;

use crate::bridge::{FrameDriver, PublishHook, create_bridge};
use crate::config::ViewConfig;
use crate::device::{RenderDevice, RenderError};
use crate::geometry::Viewport;
use crate::look::LookAndFeel;
use crate::renderer::{DrawOutcome, Renderer};
use crate::sample_buffer::SampleBuffer;
use crate::selection::{NormalizedRange, SelectionEvent, SelectionState, SelectionTracker};

/// Core-side view lifecycle.
pub trait WaveformSurface {
    fn on_resize(&mut self, viewport: Viewport);

    fn on_input_changed(
        &mut self,
        samples: SampleBuffer,
        start: i64,
        length: i64,
        look: LookAndFeel,
    );

    fn on_redraw_requested(&mut self) -> Result<DrawOutcome, RenderError>;

    fn set_highlight(&mut self, highlight: Option<NormalizedRange>);
}

impl<D: RenderDevice> WaveformSurface for Renderer<D> {
    fn on_resize(&mut self, viewport: Viewport) {
        Renderer::on_resize(self, viewport);
    }

    fn on_input_changed(
        &mut self,
        samples: SampleBuffer,
        start: i64,
        length: i64,
        look: LookAndFeel,
    ) {
        self.set_visible(samples, start, length);
        self.set_configuration(look);
    }

    fn on_redraw_requested(&mut self) -> Result<DrawOutcome, RenderError> {
        self.redraw()
    }

    fn set_highlight(&mut self, highlight: Option<NormalizedRange>) {
        Renderer::set_highlight(self, highlight);
    }
}

impl<D: RenderDevice> WaveformSurface for FrameDriver<D> {
    fn on_resize(&mut self, viewport: Viewport) {
        self.resize(viewport);
    }

    fn on_input_changed(
        &mut self,
        samples: SampleBuffer,
        start: i64,
        length: i64,
        look: LookAndFeel,
    ) {
        self.view().set_input(samples, start, length, look);
    }

    fn on_redraw_requested(&mut self) -> Result<DrawOutcome, RenderError> {
        let viewport = self.viewport();
        self.redraw(viewport)
    }

    fn set_highlight(&mut self, highlight: Option<NormalizedRange>) {
        FrameDriver::set_highlight(self, highlight);
    }
}

impl<S: WaveformSurface + ?Sized> WaveformSurface for Box<S> {
    fn on_resize(&mut self, viewport: Viewport) {
        (**self).on_resize(viewport);
    }

    fn on_input_changed(
        &mut self,
        samples: SampleBuffer,
        start: i64,
        length: i64,
        look: LookAndFeel,
    ) {
        (**self).on_input_changed(samples, start, length, look);
    }

    fn on_redraw_requested(&mut self) -> Result<DrawOutcome, RenderError> {
        (**self).on_redraw_requested()
    }

    fn set_highlight(&mut self, highlight: Option<NormalizedRange>) {
        (**self).set_highlight(highlight);
    }
}

/// Receives finished selections.
pub type SelectionListener = Box<dyn FnMut(SelectionEvent) + Send>;

/// A waveform surface plus drag-to-select handling.
pub struct WaveformView<S: WaveformSurface> {
    surface: S,
    selection: SelectionTracker,
    listener: Option<SelectionListener>,

    samples: SampleBuffer,
    start: i64,
    length: i64,
    look: LookAndFeel,
}

impl<S: WaveformSurface> WaveformView<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            selection: SelectionTracker::new(),
            listener: None,
            samples: SampleBuffer::empty(),
            start: 0,
            length: 0,
            look: LookAndFeel::default(),
        }
    }

    pub fn set_listener(&mut self, listener: Option<SelectionListener>) {
        self.listener = listener;
    }

    // ───────────────────────────────────────────────────────────────
    // Inputs
    // ───────────────────────────────────────────────────────────────

    pub fn resize(&mut self, viewport: Viewport) {
        self.surface.on_resize(viewport);
    }

    /// Replace samples and window together.
    pub fn set_input(&mut self, samples: SampleBuffer, start: i64, length: i64) {
        self.samples = samples;
        self.start = start;
        self.length = length;
        self.push_input();
    }

    /// Move the visible window over the current samples (zoom/pan).
    pub fn set_window(&mut self, start: i64, length: i64) {
        self.start = start;
        self.length = length;
        self.push_input();
    }

    pub fn set_look(&mut self, look: LookAndFeel) {
        self.look = look;
        self.push_input();
    }

    fn push_input(&mut self) {
        self.surface.on_input_changed(
            self.samples.clone(),
            self.start,
            self.length,
            self.look.clone(),
        );
    }

    pub fn redraw(&mut self) -> Result<DrawOutcome, RenderError> {
        self.surface.on_redraw_requested()
    }

    // ───────────────────────────────────────────────────────────────
    // Pointer input (normalized 0..1 across the viewport width)
    // ───────────────────────────────────────────────────────────────

    pub fn pointer_down(&mut self, x: f64) {
        self.selection.begin(x);
        self.sync_highlight();
    }

    pub fn pointer_moved(&mut self, x: f64) {
        self.selection.update(x);
        self.sync_highlight();
    }

    /// Finish a drag. Selections map against the full buffer length.
    pub fn pointer_up(&mut self, x: f64) -> Option<SelectionEvent> {
        let event = self.selection.end(x, self.samples.len());
        self.sync_highlight();
        if let Some(event) = event {
            self.emit(event);
        }
        event
    }

    pub fn tap(&mut self) -> SelectionEvent {
        let event = self.selection.tap();
        self.sync_highlight();
        self.emit(event);
        event
    }

    pub fn cancel(&mut self) {
        self.selection.cancel();
        self.sync_highlight();
    }

    fn sync_highlight(&mut self) {
        self.surface.set_highlight(self.selection.highlight());
    }

    fn emit(&mut self, event: SelectionEvent) {
        let range = event.range();
        debug!("selection reported: {}..{}", range.start, range.end);
        if let Some(listener) = self.listener.as_mut() {
            listener(event);
        }
    }

    // ───────────────────────────────────────────────────────────────
    // State access
    // ───────────────────────────────────────────────────────────────

    pub fn selection_state(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn look(&self) -> &LookAndFeel {
        &self.look
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

/// A view as handed to a platform adapter.
pub type DynWaveformView = WaveformView<Box<dyn WaveformSurface>>;

/// Build a view from `config` on top of `device`.
///
/// With `config.threaded` the geometry worker is spawned and its thread
/// handle returned; the worker exits once the view is dropped. `on_published`
/// is only used in threaded mode.
pub fn build_view<D: RenderDevice + 'static>(
    device: D,
    config: &ViewConfig,
    on_published: Option<PublishHook>,
) -> std::io::Result<(DynWaveformView, Option<JoinHandle<()>>)> {
    let (surface, worker) = if config.threaded {
        let (_view, frames, worker) = create_bridge(device, on_published);
        let surface: Box<dyn WaveformSurface> = Box::new(frames);
        (surface, Some(worker.spawn()?))
    } else {
        let surface: Box<dyn WaveformSurface> =
            Box::new(Renderer::with_look(device, config.look.clone()));
        (surface, None)
    };

    let mut view = WaveformView::new(surface);
    view.resize(config.viewport);
    view.set_look(config.look.clone());
    Ok((view, worker))
}
