// C-compatible FFI bindings for Swift/iOS integration.
//
// Safety requirements:
// - All pointers must be non-null unless documented otherwise
// - All handles must be created by this module and not fabricated
// - Device callbacks must stay valid until the matching _destroy call
// - `request_redraw` is called from the geometry worker thread when the view
//   is threaded; the host must hop to its main thread before touching UI
// - Caller must call the corresponding _destroy function for each _create

use std::ffi::c_void;
use std::thread::JoinHandle;

use crate::config::ViewConfig;
use crate::device::{ClipRect, DrawPass, RenderDevice, RenderError};
use crate::geometry::{Vertex, Viewport};
use crate::look::{Color, FillStyle, LookAndFeel};
use crate::renderer::DrawOutcome;
use crate::sample_buffer::SampleBuffer;
use crate::selection::{SampleRange, SelectionEvent};
use crate::view::{DynWaveformView, build_view};

use log::{error, info, warn};

// Logger subsystem identifier
#[cfg(feature = "ios")]
const LOG_SUBSYSTEM: &str = "com.waveview.engine";

// ═══════════════════════════════════════════════════════════════════════════
// Logger Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the oslog logger.
///
/// Call once at application startup before using any other FFI function.
/// Log output shows up in Console.app and Xcode's debug console. Without the
/// `ios` feature this is a no-op and log records are discarded.
#[unsafe(no_mangle)]
pub extern "C" fn waveview_init_logger() {
    #[cfg(feature = "ios")]
    {
        oslog::OsLogger::new(LOG_SUBSYSTEM)
            .level_filter(log::LevelFilter::Debug)
            .init()
            .ok();
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// FFI Types
// ═══════════════════════════════════════════════════════════════════════════

/// Look-and-feel as seen from C.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct WaveLook {
    pub foreground: Color,
    pub highlight: Color,
    /// 0 = filled, 1 = outline.
    pub fill: u32,
    pub mirrored: bool,
    pub gain: f32,
}

impl From<WaveLook> for LookAndFeel {
    fn from(look: WaveLook) -> Self {
        Self {
            foreground: look.foreground,
            highlight: look.highlight,
            fill: FillStyle::from_raw(look.fill),
            mirrored: look.mirrored,
            gain: look.gain,
        }
    }
}

impl From<&LookAndFeel> for WaveLook {
    fn from(look: &LookAndFeel) -> Self {
        Self {
            foreground: look.foreground,
            highlight: look.highlight,
            fill: look.fill as u32,
            mirrored: look.mirrored,
            gain: look.gain,
        }
    }
}

/// Configuration for creating a view.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct WaveviewConfig {
    /// Build geometry on a worker thread.
    pub threaded: bool,
    /// Initial drawable size in pixels (may be 0 until layout).
    pub width: u32,
    pub height: u32,
    pub look: WaveLook,
}

impl Default for WaveviewConfig {
    fn default() -> Self {
        ViewConfig::default().into()
    }
}

impl From<ViewConfig> for WaveviewConfig {
    fn from(config: ViewConfig) -> Self {
        Self {
            threaded: config.threaded,
            width: config.viewport.width,
            height: config.viewport.height,
            look: WaveLook::from(&config.look),
        }
    }
}

impl From<WaveviewConfig> for ViewConfig {
    fn from(config: WaveviewConfig) -> Self {
        Self {
            threaded: config.threaded,
            viewport: Viewport::new(config.width, config.height),
            look: config.look.into(),
        }
    }
}

/// Host GPU callbacks (e.g. backed by `MTLDevice` / `MTLRenderCommandEncoder`).
///
/// `upload` and `draw` are required; the others may be NULL.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct WaveHostDevice {
    pub context: *mut c_void,
    /// Copy `vertex_count` (x, y) float pairs into a new GPU buffer.
    /// Returns a non-zero buffer id, or 0 on failure.
    pub upload: Option<unsafe extern "C" fn(*mut c_void, *const f32, u32) -> u64>,
    /// Free a buffer returned by `upload`.
    pub release: Option<unsafe extern "C" fn(*mut c_void, u64)>,
    /// Draw a buffer. `primitive`: 0 = triangle list, 1 = line strip.
    /// `clip` is NULL for an unclipped pass. Returns false on failure.
    pub draw: Option<
        unsafe extern "C" fn(*mut c_void, u64, u32, u32, Color, *const ClipRect) -> bool,
    >,
    /// Ask the host to schedule a redraw (new geometry is ready).
    pub request_redraw: Option<unsafe extern "C" fn(*mut c_void)>,
}

type UploadFn = unsafe extern "C" fn(*mut c_void, *const f32, u32) -> u64;
type DrawFn = unsafe extern "C" fn(*mut c_void, u64, u32, u32, Color, *const ClipRect) -> bool;

/// Host context pointer that may cross to the worker thread.
#[derive(Clone, Copy)]
struct HostContext(*mut c_void);

// SAFETY: the host guarantees the context outlives the view and that
// `request_redraw` may be called from any thread.
unsafe impl Send for HostContext {}
unsafe impl Sync for HostContext {}

/// [`RenderDevice`] backed by host callbacks.
struct HostDevice {
    context: *mut c_void,
    upload: UploadFn,
    release: Option<unsafe extern "C" fn(*mut c_void, u64)>,
    draw: DrawFn,
}

impl HostDevice {
    fn from_raw(device: &WaveHostDevice) -> Result<Self, RenderError> {
        match (device.upload, device.draw) {
            (Some(upload), Some(draw)) => Ok(Self {
                context: device.context,
                upload,
                release: device.release,
                draw,
            }),
            _ => Err(RenderError::DeviceUnavailable),
        }
    }
}

impl RenderDevice for HostDevice {
    type Buffer = u64;

    fn upload(&mut self, vertices: &[Vertex]) -> Result<u64, RenderError> {
        let count = u32::try_from(vertices.len())
            .map_err(|_| RenderError::Upload(format!("{} vertices", vertices.len())))?;
        let id = unsafe { (self.upload)(self.context, vertices.as_ptr().cast::<f32>(), count) };
        if id == 0 {
            return Err(RenderError::Upload("host returned no buffer".into()));
        }
        Ok(id)
    }

    fn release(&mut self, buffer: u64) {
        if let Some(release) = self.release {
            unsafe { release(self.context, buffer) };
        }
    }

    fn draw(&mut self, pass: &DrawPass<'_, u64>) -> Result<(), RenderError> {
        let clip = pass
            .clip
            .as_ref()
            .map_or(std::ptr::null(), |c| c as *const ClipRect);
        let ok = unsafe {
            (self.draw)(
                self.context,
                *pass.buffer,
                pass.primitive as u32,
                pass.vertex_count as u32,
                pass.color,
                clip,
            )
        };
        if ok {
            Ok(())
        } else {
            Err(RenderError::Draw(format!("host draw of buffer {} failed", pass.buffer)))
        }
    }
}

/// Opaque view handle.
pub struct Waveview {
    view: DynWaveformView,
    worker: Option<JoinHandle<()>>,
}

/// Result codes for `waveview_redraw`.
pub const WAVEVIEW_DREW: i32 = 1;
pub const WAVEVIEW_DREW_NOTHING: i32 = 0;
pub const WAVEVIEW_ERROR: i32 = -1;

// ═══════════════════════════════════════════════════════════════════════════
// Creation
// ═══════════════════════════════════════════════════════════════════════════

/// Get the default configuration values.
#[unsafe(no_mangle)]
pub extern "C" fn waveview_default_config() -> WaveviewConfig {
    WaveviewConfig::default()
}

/// Create a view drawing through `device`.
///
/// Returns NULL if the device table is missing required callbacks (no GPU
/// is available) or the worker thread cannot be started.
///
/// # Safety
/// - `config` must be a valid pointer to a WaveviewConfig or NULL (defaults)
/// - `device` must be a valid pointer to a WaveHostDevice
#[unsafe(no_mangle)]
pub unsafe extern "C" fn waveview_create(
    config: *const WaveviewConfig,
    device: *const WaveHostDevice,
) -> *mut Waveview {
    let config: ViewConfig = if config.is_null() {
        ViewConfig::default()
    } else {
        unsafe { std::ptr::read(config) }.into()
    };

    if device.is_null() {
        error!("waveview_create: {}", RenderError::DeviceUnavailable);
        return std::ptr::null_mut();
    }
    let raw = unsafe { &*device };
    let host = match HostDevice::from_raw(raw) {
        Ok(host) => host,
        Err(e) => {
            error!("waveview_create: {}", e);
            return std::ptr::null_mut();
        }
    };

    let on_published = raw.request_redraw.map(|request_redraw| {
        let context = HostContext(raw.context);
        Box::new(move || {
            let ctx = context;
            unsafe { request_redraw(ctx.0) }
        }) as crate::bridge::PublishHook
    });

    match build_view(host, &config, on_published) {
        Ok((view, worker)) => {
            info!(
                "waveview created ({}x{}, threaded={})",
                config.viewport.width, config.viewport.height, config.threaded
            );
            Box::into_raw(Box::new(Waveview { view, worker }))
        }
        Err(e) => {
            error!("waveview_create: failed to start geometry worker: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// Destroy a view. Joins the geometry worker if there is one.
///
/// # Safety
/// `view` must be a valid pointer returned by `waveview_create`, or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn waveview_destroy(view: *mut Waveview) {
    if view.is_null() {
        return;
    }
    let Waveview { view, worker } = *unsafe { Box::from_raw(view) };
    // Dropping the view disconnects the worker's command channel.
    drop(view);
    if let Some(worker) = worker {
        if worker.join().is_err() {
            warn!("geometry worker panicked");
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Inputs
// ═══════════════════════════════════════════════════════════════════════════

/// Replace the samples and the visible window.
///
/// The samples are copied. `length <= 0` shows everything from `start`.
///
/// # Safety
/// `samples` must point to `count` floats (may be NULL when `count` is 0).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn waveview_set_samples(
    view: *mut Waveview,
    samples: *const f32,
    count: usize,
    start: i64,
    length: i64,
) {
    if view.is_null() {
        return;
    }
    let buffer = if samples.is_null() || count == 0 {
        SampleBuffer::empty()
    } else {
        SampleBuffer::from(unsafe { std::slice::from_raw_parts(samples, count) })
    };
    unsafe { (*view).view.set_input(buffer, start, length) };
}

/// Move the visible window over the current samples.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn waveview_set_window(view: *mut Waveview, start: i64, length: i64) {
    if view.is_null() {
        return;
    }
    unsafe { (*view).view.set_window(start, length) };
}

/// Replace the look-and-feel.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn waveview_set_look(view: *mut Waveview, look: *const WaveLook) {
    if view.is_null() || look.is_null() {
        return;
    }
    let look = unsafe { std::ptr::read(look) };
    unsafe { (*view).view.set_look(look.into()) };
}

/// Drawable size changed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn waveview_resize(view: *mut Waveview, width: u32, height: u32) {
    if view.is_null() {
        return;
    }
    unsafe { (*view).view.resize(Viewport::new(width, height)) };
}

/// Number of samples currently shown.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn waveview_sample_count(view: *const Waveview) -> u64 {
    if view.is_null() {
        return 0;
    }
    unsafe { (*view).view.sample_count() as u64 }
}

// ═══════════════════════════════════════════════════════════════════════════
// Drawing
// ═══════════════════════════════════════════════════════════════════════════

/// Service a display refresh.
///
/// Returns `WAVEVIEW_DREW`, `WAVEVIEW_DREW_NOTHING` or `WAVEVIEW_ERROR`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn waveview_redraw(view: *mut Waveview) -> i32 {
    if view.is_null() {
        return WAVEVIEW_ERROR;
    }
    match unsafe { (*view).view.redraw() } {
        Ok(DrawOutcome::Drew { .. }) => WAVEVIEW_DREW,
        Ok(DrawOutcome::Nothing) => WAVEVIEW_DREW_NOTHING,
        Err(e) => {
            warn!("waveview_redraw: {}", e);
            WAVEVIEW_ERROR
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Selection
// ═══════════════════════════════════════════════════════════════════════════

/// Selection callback: `(context, sample_start, sample_end)`.
pub type WaveSelectionCallback = unsafe extern "C" fn(*mut c_void, u64, u64);

/// Register (or clear, with NULL) the selection callback.
///
/// Called with the sample range when a drag ends and with (0, 0) on tap.
///
/// # Safety
/// `context` must stay valid while the callback is registered.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn waveview_set_selection_callback(
    view: *mut Waveview,
    context: *mut c_void,
    callback: Option<WaveSelectionCallback>,
) {
    if view.is_null() {
        return;
    }
    let listener = callback.map(|callback| {
        let context = HostContext(context);
        Box::new(move |event: SelectionEvent| {
            let ctx = context;
            let range = event.range();
            unsafe { callback(ctx.0, range.start as u64, range.end as u64) }
        }) as crate::view::SelectionListener
    });
    unsafe { (*view).view.set_listener(listener) };
}

/// Pointer went down at normalized `x` (0 = left edge, 1 = right edge).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn waveview_pointer_down(view: *mut Waveview, x: f64) {
    if view.is_null() {
        return;
    }
    unsafe { (*view).view.pointer_down(x) };
}

/// Pointer moved to normalized `x`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn waveview_pointer_moved(view: *mut Waveview, x: f64) {
    if view.is_null() {
        return;
    }
    unsafe { (*view).view.pointer_moved(x) };
}

/// Pointer released at normalized `x`.
///
/// Returns true and fills `out_range` (if non-NULL) when a drag completed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn waveview_pointer_up(
    view: *mut Waveview,
    x: f64,
    out_range: *mut SampleRange,
) -> bool {
    if view.is_null() {
        return false;
    }
    let Some(event) = (unsafe { (*view).view.pointer_up(x) }) else {
        return false;
    };
    if !out_range.is_null() {
        unsafe { *out_range = event.range() };
    }
    true
}

/// Tap: clears the selection and reports (0, 0).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn waveview_tap(view: *mut Waveview, out_range: *mut SampleRange) {
    if view.is_null() {
        return;
    }
    let event = unsafe { (*view).view.tap() };
    if !out_range.is_null() {
        unsafe { *out_range = event.range() };
    }
}

/// Gesture cancelled; drops the in-progress selection without reporting.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn waveview_cancel(view: *mut Waveview) {
    if view.is_null() {
        return;
    }
    unsafe { (*view).view.cancel() };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeGpu {
        next_id: u64,
        live: Vec<u64>,
        draws: Vec<(u64, u32, Option<ClipRect>)>,
        selections: Vec<(u64, u64)>,
    }

    unsafe extern "C" fn fake_upload(ctx: *mut c_void, _xy: *const f32, _count: u32) -> u64 {
        let gpu = unsafe { &mut *(ctx as *mut FakeGpu) };
        gpu.next_id += 1;
        gpu.live.push(gpu.next_id);
        gpu.next_id
    }

    unsafe extern "C" fn fake_release(ctx: *mut c_void, buffer: u64) {
        let gpu = unsafe { &mut *(ctx as *mut FakeGpu) };
        gpu.live.retain(|&b| b != buffer);
    }

    unsafe extern "C" fn fake_draw(
        ctx: *mut c_void,
        buffer: u64,
        _primitive: u32,
        count: u32,
        _color: Color,
        clip: *const ClipRect,
    ) -> bool {
        let gpu = unsafe { &mut *(ctx as *mut FakeGpu) };
        let clip = if clip.is_null() { None } else { Some(unsafe { *clip }) };
        gpu.draws.push((buffer, count, clip));
        true
    }

    unsafe extern "C" fn fake_selection(ctx: *mut c_void, start: u64, end: u64) {
        let gpu = unsafe { &mut *(ctx as *mut FakeGpu) };
        gpu.selections.push((start, end));
    }

    fn device(gpu: &mut FakeGpu) -> WaveHostDevice {
        WaveHostDevice {
            context: gpu as *mut FakeGpu as *mut c_void,
            upload: Some(fake_upload),
            release: Some(fake_release),
            draw: Some(fake_draw),
            request_redraw: None,
        }
    }

    fn inline_config() -> WaveviewConfig {
        WaveviewConfig {
            threaded: false,
            width: 100,
            height: 40,
            ..WaveviewConfig::default()
        }
    }

    #[test]
    fn test_missing_device_returns_null() {
        let config = inline_config();
        let view = unsafe { waveview_create(&config, std::ptr::null()) };
        assert!(view.is_null());

        let device = WaveHostDevice {
            context: std::ptr::null_mut(),
            upload: None,
            release: None,
            draw: None,
            request_redraw: None,
        };
        let view = unsafe { waveview_create(&config, &device) };
        assert!(view.is_null());
    }

    #[test]
    fn test_draw_and_select_through_c_abi() {
        let mut gpu = FakeGpu::default();
        let device = device(&mut gpu);
        let config = inline_config();
        let samples: Vec<f32> = (0..1000).map(|i| (i as f32 * 0.03).sin()).collect();

        unsafe {
            let view = waveview_create(&config, &device);
            assert!(!view.is_null());
            assert_eq!(waveview_redraw(view), WAVEVIEW_DREW_NOTHING);

            waveview_set_samples(view, samples.as_ptr(), samples.len(), 0, 0);
            assert_eq!(waveview_sample_count(view), 1000);
            assert_eq!(waveview_redraw(view), WAVEVIEW_DREW);
            assert_eq!(waveview_redraw(view), WAVEVIEW_DREW);

            waveview_set_selection_callback(view, device.context, Some(fake_selection));
            waveview_pointer_down(view, 0.2);
            waveview_pointer_moved(view, 0.3);
            let mut range = SampleRange::default();
            assert!(waveview_pointer_up(view, 0.5, &mut range));
            assert_eq!(range, SampleRange { start: 200, end: 500 });

            waveview_tap(view, &mut range);
            assert_eq!(range, SampleRange::CLEARED);

            waveview_destroy(view);
        }

        assert_eq!(gpu.next_id, 1);
        assert_eq!(gpu.draws.len(), 2);
        assert!(gpu.live.is_empty());
        assert_eq!(gpu.selections, vec![(200, 500), (0, 0)]);
    }

    #[test]
    fn test_null_handles_are_ignored() {
        unsafe {
            waveview_set_window(std::ptr::null_mut(), 0, 10);
            waveview_resize(std::ptr::null_mut(), 10, 10);
            waveview_destroy(std::ptr::null_mut());
            assert_eq!(waveview_redraw(std::ptr::null_mut()), WAVEVIEW_ERROR);
            assert!(!waveview_pointer_up(std::ptr::null_mut(), 0.5, std::ptr::null_mut()));
        }
    }

    #[test]
    fn test_config_round_trips_look() {
        let config = WaveviewConfig::default();
        let back: ViewConfig = config.into();
        assert_eq!(back, ViewConfig::default());
    }
}
