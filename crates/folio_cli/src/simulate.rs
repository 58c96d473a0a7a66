//! Headless replay of a page description

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use folio_animation::{FrameClock, ManualDriver, ScrollState};
use folio_core::{Viewport, VisualStyle};
use folio_scroll::{
    mount_animation_coordinator, Coordinator, CoordinatorEvent, PageEnv, PointerKind,
    TeardownReport,
};
use tracing::{debug, info, warn};

use crate::page::{PageDescription, ScriptAction};

#[derive(Clone, Debug)]
pub struct SimulationOptions {
    /// Overrides the page's frame count
    pub frames: Option<u64>,
    pub frame_ms: f64,
    pub reduced_motion: bool,
    pub coarse_pointer: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            frames: None,
            frame_ms: 16.0,
            reduced_motion: false,
            coarse_pointer: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SimulationReport {
    pub frames: u64,
    /// Coordinator events with the frame they happened in
    pub events: Vec<(u64, CoordinatorEvent)>,
    pub final_state: ScrollState,
    pub viewport: Viewport,
    /// Final style per element label, in page order
    pub styles: Vec<(String, VisualStyle)>,
    pub teardown: TeardownReport,
}

impl SimulationReport {
    pub fn revealed(&self) -> impl Iterator<Item = (&str, f32)> {
        self.events.iter().filter_map(|(_, event)| match event {
            CoordinatorEvent::Revealed { selector, offset } => Some((selector.as_str(), *offset)),
            _ => None,
        })
    }
}

/// Mount the page on a manual clock and play its script
pub fn simulate(page: &PageDescription, options: &SimulationOptions) -> Result<SimulationReport> {
    let frames = options.frames.unwrap_or(page.frames);
    let (document, handles) = page.build_document();

    let mut config = page.coordinator.clone();
    config.reduced_motion |= options.reduced_motion;

    let frame_counter = Arc::new(AtomicU64::new(0));
    let events: Arc<Mutex<Vec<(u64, CoordinatorEvent)>>> = Arc::new(Mutex::new(Vec::new()));

    let driver = ManualDriver::new();
    let clock = FrameClock::new(driver.clone());
    let pointer = if options.coarse_pointer {
        PointerKind::Coarse
    } else {
        PointerKind::Fine
    };

    let sink_counter = Arc::clone(&frame_counter);
    let sink_events = Arc::clone(&events);
    let env = PageEnv::new(document, page.viewport, clock)
        .with_pointer(pointer)
        .with_events(Arc::new(move |event: &CoordinatorEvent| {
            let frame = sink_counter.load(Ordering::Relaxed);
            info!("frame {:>4}: {:?}", frame, event);
            if let Ok(mut events) = sink_events.lock() {
                events.push((frame, event.clone()));
            }
        }));

    let coordinator =
        mount_animation_coordinator(config, env).context("Failed to mount coordinator")?;
    debug!(
        "Mounted {} triggers on a {}x{} viewport",
        coordinator.registry().len(),
        page.viewport.width,
        page.viewport.height
    );

    for frame in 0..frames {
        frame_counter.store(frame, Ordering::Relaxed);
        for action in page.events_at(frame) {
            apply(&coordinator, action);
        }
        if !driver.frame(frame as f64 * options.frame_ms) {
            debug!("Clock stopped at frame {}", frame);
        }
    }

    let final_state = coordinator.state();
    let viewport = coordinator.viewport();
    let styles = page
        .elements
        .iter()
        .zip(&handles)
        .map(|(spec, handle)| (spec.label(), handle.style()))
        .collect();

    frame_counter.store(frames, Ordering::Relaxed);
    let teardown = coordinator.teardown();
    let events = events.lock().map(|e| e.clone()).unwrap_or_default();

    Ok(SimulationReport {
        frames,
        events,
        final_state,
        viewport,
        styles,
        teardown,
    })
}

fn apply(coordinator: &Coordinator, action: &ScriptAction) {
    debug!("Script: {:?}", action);
    let accepted = match action {
        ScriptAction::Wheel { delta } => coordinator.on_wheel(*delta),
        ScriptAction::Touch { delta } => coordinator.on_touch(*delta),
        ScriptAction::Key { delta } => coordinator.on_key_scroll(*delta),
        ScriptAction::Native { offset } => coordinator.on_native_scroll(*offset),
        ScriptAction::Resize { width, height } => {
            coordinator.on_resize(Viewport::new(*width, *height));
            true
        }
        ScriptAction::Nav { selector } => coordinator.scroll_to_selector(selector),
        ScriptAction::FontsLoaded => {
            coordinator.on_fonts_loaded();
            true
        }
        ScriptAction::Pointer { x, y } => {
            coordinator.on_pointer_move(*x, *y);
            true
        }
        ScriptAction::PointerLeave => {
            coordinator.on_pointer_leave();
            true
        }
    };
    if !accepted {
        warn!("Script action ignored: {:?}", action);
    }
}
