//! Threaded geometry recompute between host and draw path.
//!
//! # Architecture
//!
//! - **Host thread** owns a [`ViewHandle`] and sends [`Command`]s
//! - **Worker thread** owns the [`GeometryWorker`], rebuilds geometry when
//!   its inputs change and publishes the result to a [`GeometryHandoff`]
//! - **Draw path** owns the [`FrameDriver`], which draws whatever was
//!   published last and never waits for a rebuild
//!
//! After each publish the worker calls the host's `on_published` hook, which
//! is where a host schedules the redraw that will pick the new geometry up.
//!
//! # Usage
//!
//! ```ignore
//! let (view, mut frames, worker) = create_bridge(device, Some(Box::new(request_redraw)));
//! let _thread = worker.spawn()?;
//!
//! // Host thread
//! view.set_visible(samples, 0, 0);
//!
//! // Display refresh
//! frames.redraw(Viewport::new(width, height))?;
//! ```

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::cache::{CacheKey, GeometryCache};
use crate::command::Command;
use crate::device::{RenderDevice, RenderError};
use crate::geometry::Viewport;
use crate::handoff::GeometryHandoff;
use crate::look::LookAndFeel;
use crate::renderer::{DrawOutcome, Renderer};
use crate::sample_buffer::SampleBuffer;
use crate::selection::NormalizedRange;

/// Called by the worker after new geometry is published.
pub type PublishHook = Box<dyn Fn() + Send>;

/// Host-side handle. Cheap to clone and safe to send between threads.
#[derive(Clone)]
pub struct ViewHandle {
    command_tx: Sender<Command>,
}

/// Builds geometry off the draw path.
pub struct GeometryWorker {
    command_rx: Receiver<Command>,
    handoff: Arc<GeometryHandoff>,
    on_published: Option<PublishHook>,

    cache: GeometryCache,
    samples: Option<SampleBuffer>,
    start: i64,
    length: i64,
    look: LookAndFeel,
    viewport: Viewport,
    shutdown: bool,
}

/// Draw-side half: turns published geometry into frames.
pub struct FrameDriver<D: RenderDevice> {
    renderer: Renderer<D>,
    handoff: Arc<GeometryHandoff>,
    view: ViewHandle,
    viewport: Viewport,
}

/// Create the three linked halves of a threaded waveform view.
pub fn create_bridge<D: RenderDevice>(
    device: D,
    on_published: Option<PublishHook>,
) -> (ViewHandle, FrameDriver<D>, GeometryWorker) {
    let (command_tx, command_rx) = mpsc::channel();
    let handoff = Arc::new(GeometryHandoff::new());
    let view = ViewHandle { command_tx };

    let worker = GeometryWorker {
        command_rx,
        handoff: Arc::clone(&handoff),
        on_published,
        cache: GeometryCache::new(),
        samples: None,
        start: 0,
        length: 0,
        look: LookAndFeel::default(),
        viewport: Viewport::default(),
        shutdown: false,
    };

    let frames = FrameDriver {
        renderer: Renderer::new(device),
        handoff,
        view: view.clone(),
        viewport: Viewport::default(),
    };

    (view, frames, worker)
}

// ═══════════════════════════════════════════════════════════════════
// ViewHandle - Host API
// ═══════════════════════════════════════════════════════════════════

impl ViewHandle {
    /// Queue a command for the worker.
    ///
    /// Returns `false` if the worker is gone.
    pub fn send(&self, command: Command) -> bool {
        self.command_tx.send(command).is_ok()
    }

    pub fn set_visible(&self, samples: SampleBuffer, start: i64, length: i64) -> bool {
        self.send(Command::SetVisible {
            samples,
            start,
            length,
        })
    }

    /// Replace samples, window and look as a single command.
    pub fn set_input(
        &self,
        samples: SampleBuffer,
        start: i64,
        length: i64,
        look: LookAndFeel,
    ) -> bool {
        self.send(Command::SetInput {
            samples,
            start,
            length,
            look,
        })
    }

    pub fn set_configuration(&self, look: LookAndFeel) -> bool {
        self.send(Command::SetConfiguration { look })
    }

    pub fn resize(&self, viewport: Viewport) -> bool {
        self.send(Command::Resize { viewport })
    }

    pub fn shutdown(&self) -> bool {
        self.send(Command::Shutdown)
    }
}

// ═══════════════════════════════════════════════════════════════════
// GeometryWorker - Recompute API
// ═══════════════════════════════════════════════════════════════════

impl GeometryWorker {
    /// Apply every queued command, then rebuild once if needed.
    ///
    /// For hosts without a spare thread, and for tests. Returns `true` if
    /// new geometry was published.
    pub fn run_pending(&mut self) -> bool {
        loop {
            match self.command_rx.try_recv() {
                Ok(command) => self.apply(command),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if self.shutdown {
            return false;
        }
        self.rebuild_and_publish()
    }

    /// Run on a dedicated thread until shutdown or until every
    /// [`ViewHandle`] is dropped.
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("waveview-geometry".into())
            .spawn(move || self.run())
    }

    fn run(mut self) {
        info!("geometry worker started");

        // Block for the first command, then drain whatever queued up behind
        // it so a burst of updates costs a single rebuild.
        while let Ok(command) = self.command_rx.recv() {
            self.apply(command);
            while let Ok(command) = self.command_rx.try_recv() {
                self.apply(command);
            }
            if self.shutdown {
                break;
            }
            self.rebuild_and_publish();
        }

        info!("geometry worker stopped");
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::SetVisible {
                samples,
                start,
                length,
            } => {
                self.samples = Some(samples);
                self.start = start;
                self.length = length;
            }
            Command::SetConfiguration { look } => {
                self.look = look;
            }
            Command::SetInput {
                samples,
                start,
                length,
                look,
            } => {
                self.samples = Some(samples);
                self.start = start;
                self.length = length;
                self.look = look;
            }
            Command::Resize { viewport } => {
                self.viewport = viewport;
            }
            Command::Shutdown => {
                self.shutdown = true;
            }
        }
    }

    fn rebuild_and_publish(&mut self) -> bool {
        let Some(samples) = self.samples.clone() else {
            return false;
        };

        let key = CacheKey::new(
            samples,
            self.start,
            self.length,
            self.viewport,
            self.look.clone(),
        );
        if !self.cache.refresh(&key) {
            return false;
        }

        let Some(current) = self.cache.current() else {
            return false;
        };
        if !self.handoff.publish(Arc::clone(current)) {
            warn!("dropped stale geometry gen={}", current.generation);
            return false;
        }

        debug!("published geometry gen={}", current.generation);
        if let Some(hook) = &self.on_published {
            hook();
        }
        true
    }

    pub fn rebuild_count(&self) -> u64 {
        self.cache.rebuild_count()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }
}

// ═══════════════════════════════════════════════════════════════════
// FrameDriver - Draw API
// ═══════════════════════════════════════════════════════════════════

impl<D: RenderDevice> FrameDriver<D> {
    /// Service a display refresh.
    ///
    /// A changed viewport is forwarded to the worker; the frame itself is
    /// drawn from the latest published geometry (vertices are in normalized
    /// device coordinates, so a build for the previous size still fills the
    /// view until the new one arrives).
    pub fn redraw(&mut self, viewport: Viewport) -> Result<DrawOutcome, RenderError> {
        self.resize(viewport);

        if viewport.is_empty() {
            return self.renderer.present(None);
        }

        let published = self.handoff.latest();
        self.renderer.present(published.as_deref())
    }

    /// Record a new viewport and tell the worker about it.
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport != self.viewport {
            self.viewport = viewport;
            self.renderer.on_resize(viewport);
            if !self.view.resize(viewport) {
                warn!("geometry worker gone; resize to {}x{} dropped", viewport.width, viewport.height);
            }
        }
    }

    pub fn set_highlight(&mut self, highlight: Option<NormalizedRange>) {
        self.renderer.set_highlight(highlight);
    }

    /// Host handle feeding this driver's worker.
    pub fn view(&self) -> &ViewHandle {
        &self.view
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn renderer(&self) -> &Renderer<D> {
        &self.renderer
    }

    /// Generation of the newest published geometry.
    pub fn published_generation(&self) -> u64 {
        self.handoff.generation()
    }
}
