// src/main.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use waveview::{
    DrawOutcome, FillStyle, LookAndFeel, RecordingDevice, Renderer, SampleBuffer, SelectionEvent,
    Viewport, WaveformView, create_bridge,
};

/// ===============================
/// Test Signal
/// ===============================

/// A decaying 220 Hz tone, one second at 48 kHz.
fn test_signal(sample_rate: f32, seconds: f32) -> SampleBuffer {
    let frames = (sample_rate * seconds) as usize;
    (0..frames)
        .map(|i| {
            let t = i as f32 / sample_rate;
            (t * 220.0 * std::f32::consts::TAU).sin() * (-3.0 * t).exp()
        })
        .collect()
}

/// ===============================
/// Main
/// ===============================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let samples = test_signal(48_000.0, 1.0);
    let viewport = Viewport::new(320, 80);

    println!("Starting waveview sanity test…");

    // --------------------------------
    // Inline renderer
    // --------------------------------

    let mut view = WaveformView::new(Renderer::new(RecordingDevice::new()));
    view.resize(viewport);
    view.set_input(samples.clone(), 0, 0);

    for frame in 0..3 {
        match view.redraw() {
            Ok(DrawOutcome::Drew {
                generation,
                vertex_count,
                ..
            }) => println!(
                "Frame {}: generation {} ({} vertices)",
                frame, generation, vertex_count
            ),
            Ok(DrawOutcome::Nothing) => println!("Frame {}: nothing to draw", frame),
            Err(e) => println!("Frame {}: {}", frame, e),
        }
    }
    println!(
        "Rebuilds after 3 frames: {}",
        view.surface().rebuild_count()
    );

    // Zoom into the first 10 ms, outlined.
    view.set_window(0, 480);
    view.set_look(LookAndFeel::default().with_fill(FillStyle::Outline));
    if let Ok(outcome) = view.redraw() {
        println!("Zoomed: {:?}", outcome);
    }

    // --------------------------------
    // Selection
    // --------------------------------

    view.set_listener(Some(Box::new(|event: SelectionEvent| {
        let range = event.range();
        println!("Selected samples {}..{}", range.start, range.end);
    })));
    view.pointer_down(0.25);
    view.pointer_moved(0.4);
    view.pointer_up(0.5);
    view.tap();

    // --------------------------------
    // Threaded worker
    // --------------------------------

    let published = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&published);
    let (handle, mut frames, worker) = create_bridge(
        RecordingDevice::new(),
        Some(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
    );
    let worker = match worker.spawn() {
        Ok(worker) => worker,
        Err(e) => {
            println!("Failed to start geometry worker: {}", e);
            return;
        }
    };

    frames.resize(viewport);
    handle.set_visible(samples, 0, 0);
    handle.set_configuration(LookAndFeel::default());

    // Wait for the first publish, as a display link would.
    while published.load(Ordering::SeqCst) == 0 {
        std::thread::yield_now();
    }
    match frames.redraw(viewport) {
        Ok(outcome) => println!("Threaded frame: {:?}", outcome),
        Err(e) => println!("Threaded frame failed: {}", e),
    }

    handle.shutdown();
    if worker.join().is_err() {
        println!("Geometry worker panicked");
    }

    println!("Sanity test completed.");
}
