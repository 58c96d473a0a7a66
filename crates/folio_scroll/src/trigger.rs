//! Scroll trigger registry
//!
//! Maps the scroll offset onto element-relative events. Each registered entry
//! has a mode:
//!
//! - **OneShot**: fires `on_enter` once when the offset first reaches its
//!   trigger line, however large the step that crossed it
//! - **Scrub**: reports progress `t ∈ [0, 1]` through a scroll window
//!   `[start, start + D]`
//! - **Pin**: a scrub that also translates its element by the distance
//!   scrolled into the window, so it appears stationary
//!
//! Geometry (trigger lines and pin distances) is measured on refresh and
//! cached. A resize only marks the cache stale; the next evaluation
//! refreshes first and then evaluates, under the same lock, so the two never
//! interleave.
//!
//! # Pin spacing
//!
//! A pin holds its section for `D` pixels of scrolling, so everything laid
//! out below the section reaches the viewport `D` pixels later. Each pin
//! with `D > 0` contributes a spacer: lines of elements whose top is at or
//! below the pinned section's bottom are pushed down by the spacer, and
//! [`TriggerRegistry::pin_spacing`] reports the extra scroll length the
//! page needs.
//!
//! Callbacks are collected while the registry is locked and invoked after it
//! is released. A callback may dispose entries (including its own) or
//! register new ones.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

use folio_animation::ScrollState;
use folio_core::{Disposer, ElementHandle, ElementId, Property, Rect, Viewport, WeakElement};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::position::TriggerPosition;

new_key_type! {
    /// Handle to a registered trigger entry
    pub struct TriggerId;
}

/// How an entry reacts to scrolling
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerMode {
    OneShot,
    Pin,
    Scrub,
}

/// Which way the offset was moving when a boundary was crossed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Measured sizes along the pinned axis
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Extent {
    pub content: f32,
    pub container: f32,
}

/// Measures an [`Extent`] at refresh time
pub type MeasureFn = Arc<dyn Fn(&Viewport) -> Extent + Send + Sync>;

/// End of a scrub or pin window
#[derive(Clone)]
pub enum TriggerEnd {
    /// Where a second element/viewport anchor pair meets
    Position(TriggerPosition),
    /// Fixed scroll distance past the start
    Distance(f32),
    /// Distance is `content - container`, re-measured on every refresh
    Measured(MeasureFn),
}

impl fmt::Debug for TriggerEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerEnd::Position(p) => f.debug_tuple("Position").field(p).finish(),
            TriggerEnd::Distance(d) => f.debug_tuple("Distance").field(d).finish(),
            TriggerEnd::Measured(_) => f.write_str("Measured(..)"),
        }
    }
}

/// Cached window geometry of a pin or scrub entry
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PinGeometry {
    /// Length of the scroll window; never negative
    pub scroll_distance: f32,
    pub container_bounds: Rect,
    pub content_extent: f32,
}

/// Scroll length a pin inserts below its section
#[derive(Clone, Copy, Debug, PartialEq)]
struct Spacer {
    /// Bottom of the pinned section in layout coordinates
    below: f32,
    distance: f32,
}

fn spacing_before(spacers: &[Spacer], top: f32) -> f32 {
    spacers
        .iter()
        .filter(|s| top >= s.below)
        .map(|s| s.distance)
        .sum()
}

/// An event produced by evaluation
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TriggerEvent {
    Enter(Direction),
    Leave(Direction),
    Progress(f32),
}

type EnterFn = Box<dyn FnMut(Direction) + Send>;
type ProgressFn = Box<dyn FnMut(f32, &PinGeometry) + Send>;

#[derive(Default)]
struct Callbacks {
    on_enter: Option<EnterFn>,
    on_leave: Option<EnterFn>,
    on_progress: Option<ProgressFn>,
}

/// Description of an entry to register
pub struct TriggerSpec {
    target: Option<WeakElement>,
    mode: TriggerMode,
    start: TriggerPosition,
    end: Option<TriggerEnd>,
    callbacks: Callbacks,
}

impl TriggerSpec {
    fn new(target: Option<&ElementHandle>, mode: TriggerMode, start: TriggerPosition) -> Self {
        Self {
            target: target.map(|t| t.downgrade()),
            mode,
            start,
            end: None,
            callbacks: Callbacks::default(),
        }
    }

    /// Fire once when `target` reaches `start`
    pub fn one_shot(target: Option<&ElementHandle>, start: TriggerPosition) -> Self {
        Self::new(target, TriggerMode::OneShot, start)
    }

    /// Report progress between `start` and `end`
    pub fn scrub(target: Option<&ElementHandle>, start: TriggerPosition, end: TriggerEnd) -> Self {
        Self::new(target, TriggerMode::Scrub, start).end(end)
    }

    /// Hold `target` in place between `start` and `end`
    pub fn pin(target: Option<&ElementHandle>, start: TriggerPosition, end: TriggerEnd) -> Self {
        Self::new(target, TriggerMode::Pin, start).end(end)
    }

    pub fn end(mut self, end: TriggerEnd) -> Self {
        self.end = Some(end);
        self
    }

    pub fn on_enter<F>(mut self, f: F) -> Self
    where
        F: FnMut(Direction) + Send + 'static,
    {
        self.callbacks.on_enter = Some(Box::new(f));
        self
    }

    pub fn on_leave<F>(mut self, f: F) -> Self
    where
        F: FnMut(Direction) + Send + 'static,
    {
        self.callbacks.on_leave = Some(Box::new(f));
        self
    }

    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: FnMut(f32, &PinGeometry) + Send + 'static,
    {
        self.callbacks.on_progress = Some(Box::new(f));
        self
    }

    pub fn mode(&self) -> TriggerMode {
        self.mode
    }
}

/// Geometry resolved at the last refresh
#[derive(Clone, Copy, Debug)]
enum Resolved {
    /// Element missing, detached or without size
    Degenerate,
    Line(f32),
    Window { start: f32, geometry: PinGeometry },
}

struct Entry {
    target: WeakElement,
    target_id: ElementId,
    mode: TriggerMode,
    start: TriggerPosition,
    end: Option<TriggerEnd>,
    callbacks: Arc<Mutex<Callbacks>>,
    resolved: Option<Resolved>,
    fired: bool,
    inside: bool,
    progress: Option<f32>,
    last_offset: Option<f32>,
    pin_translation: Option<f32>,
}

impl Entry {
    /// Attached, laid-out target bounds
    fn bounds(&self) -> Option<Rect> {
        self.target
            .upgrade()
            .filter(|el| el.is_attached())
            .map(|el| el.layout())
            .filter(|bounds| !bounds.is_empty())
    }

    fn extent(&self, bounds: Rect, viewport: Viewport) -> Extent {
        match &self.end {
            Some(TriggerEnd::Position(end)) => {
                let d = end.line(bounds, viewport) - self.start.line(bounds, viewport);
                Extent {
                    content: bounds.height + d,
                    container: bounds.height,
                }
            }
            Some(TriggerEnd::Distance(d)) => Extent {
                content: bounds.height + d,
                container: bounds.height,
            },
            Some(TriggerEnd::Measured(measure)) => measure(&viewport),
            None => Extent {
                content: bounds.height * 2.0,
                container: bounds.height,
            },
        }
    }

    /// The spacer this entry inserts, if it is a pin with a window
    fn spacer(&self, viewport: Viewport) -> Option<Spacer> {
        if self.mode != TriggerMode::Pin {
            return None;
        }
        let bounds = self.bounds()?;
        let extent = self.extent(bounds, viewport);
        let distance = (extent.content - extent.container).max(0.0);
        (distance > 0.0).then_some(Spacer {
            below: bounds.bottom(),
            distance,
        })
    }

    fn refresh(&mut self, viewport: Viewport, spacers: &[Spacer]) {
        let previous = self.resolved;
        let resolved = match self.bounds() {
            Some(bounds) => {
                let shift = spacing_before(spacers, bounds.top());
                let start = self.start.line(bounds, viewport) + shift;
                match self.mode {
                    TriggerMode::OneShot => Resolved::Line(start),
                    TriggerMode::Pin | TriggerMode::Scrub => {
                        let extent = self.extent(bounds, viewport);
                        Resolved::Window {
                            start,
                            geometry: PinGeometry {
                                scroll_distance: (extent.content - extent.container).max(0.0),
                                container_bounds: bounds,
                                content_extent: extent.content,
                            },
                        }
                    }
                }
            }
            None => Resolved::Degenerate,
        };

        // New geometry restarts window bookkeeping so progress is re-reported
        let changed = match (previous, resolved) {
            (
                Some(Resolved::Window { start: a, geometry: ga }),
                Resolved::Window { start: b, geometry: gb },
            ) => a != b || ga != gb,
            (None, _) => false,
            _ => true,
        };
        if changed {
            self.progress = None;
        }
        self.resolved = Some(resolved);
    }

    /// Advance the entry to `offset`, returning the events to dispatch
    fn evaluate(&mut self, offset: f32) -> SmallVec<[TriggerEvent; 3]> {
        let mut events = SmallVec::new();
        let direction = match self.last_offset {
            Some(prev) if offset < prev => Direction::Backward,
            _ => Direction::Forward,
        };
        self.last_offset = Some(offset);

        let Some(element) = self.target.upgrade().filter(|e| e.is_attached()) else {
            return events;
        };

        match self.resolved {
            None | Some(Resolved::Degenerate) => {}
            Some(Resolved::Line(line)) => {
                if !self.fired && offset >= line {
                    self.fired = true;
                    events.push(TriggerEvent::Enter(Direction::Forward));
                }
            }
            Some(Resolved::Window { start, geometry }) => {
                let distance = geometry.scroll_distance;
                if distance <= 0.0 {
                    // A window that shrank to nothing releases whatever it held
                    if self.inside {
                        self.inside = false;
                        events.push(TriggerEvent::Leave(direction));
                    }
                    if self.mode == TriggerMode::Pin && self.pin_translation.unwrap_or(0.0) != 0.0 {
                        self.pin_translation = Some(0.0);
                        element.set_property(Property::Y, 0.0);
                    }
                    // Nothing to scrub through: report completion once
                    if self.progress.is_none() {
                        self.progress = Some(1.0);
                        events.push(TriggerEvent::Progress(1.0));
                    }
                    return events;
                }

                let inside = offset >= start && offset <= start + distance;
                if inside != self.inside {
                    self.inside = inside;
                    events.push(if inside {
                        TriggerEvent::Enter(direction)
                    } else {
                        TriggerEvent::Leave(direction)
                    });
                }

                let t = ((offset - start) / distance).clamp(0.0, 1.0);
                if self.progress != Some(t) {
                    self.progress = Some(t);
                    events.push(TriggerEvent::Progress(t));
                }

                if self.mode == TriggerMode::Pin {
                    let translation = (offset - start).clamp(0.0, distance);
                    if self.pin_translation != Some(translation) {
                        self.pin_translation = Some(translation);
                        element.set_property(Property::Y, translation);
                    }
                }
            }
        }
        events
    }

    fn geometry(&self) -> Option<PinGeometry> {
        match self.resolved {
            Some(Resolved::Window { geometry, .. }) => Some(geometry),
            _ => None,
        }
    }
}

type Pending = (
    TriggerId,
    Arc<Mutex<Callbacks>>,
    SmallVec<[TriggerEvent; 3]>,
    PinGeometry,
);

#[derive(Default)]
struct RegistryInner {
    entries: SlotMap<TriggerId, Entry>,
    /// Registration order
    order: Vec<TriggerId>,
    viewport: Viewport,
    stale: bool,
    spacers: Vec<Spacer>,
    /// Bumped on every full refresh
    revision: u64,
}

impl RegistryInner {
    fn refresh_all(&mut self) {
        let viewport = self.viewport;
        self.spacers = self
            .order
            .iter()
            .filter_map(|id| self.entries.get(*id))
            .filter_map(|entry| entry.spacer(viewport))
            .collect();
        for entry in self.entries.values_mut() {
            entry.refresh(viewport, &self.spacers);
        }
        self.stale = false;
        self.revision += 1;
    }

    fn remove(&mut self, id: TriggerId) -> Option<Entry> {
        let entry = self.entries.remove(id)?;
        self.order.retain(|other| *other != id);
        if entry.mode == TriggerMode::Pin {
            // Its spacer goes with it
            self.stale = true;
        }
        Some(entry)
    }
}

/// A registered entry
///
/// Disposing removes the entry; it is safe to call any number of times.
/// Dropping the registration does *not* dispose it.
#[derive(Debug)]
pub struct Trigger {
    id: Option<TriggerId>,
    disposer: Disposer,
}

impl Trigger {
    pub fn id(&self) -> Option<TriggerId> {
        self.id
    }

    pub fn dispose(&self) {
        self.disposer.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposer.is_disposed()
    }

    pub fn into_disposer(self) -> Disposer {
        self.disposer
    }
}

/// Registry of scroll-driven entries, evaluated once per frame
#[derive(Clone, Default)]
pub struct TriggerRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl TriggerRegistry {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                viewport,
                ..Default::default()
            })),
        }
    }

    /// Register an entry and measure it right away
    ///
    /// A missing or already dropped target yields a no-op registration.
    pub fn register(&self, spec: TriggerSpec) -> Trigger {
        let Some(target) = spec.target.as_ref().and_then(Weak::upgrade) else {
            tracing::debug!("TriggerRegistry: no target for {:?} entry", spec.mode);
            return Trigger {
                id: None,
                disposer: Disposer::noop(),
            };
        };

        let Ok(mut inner) = self.inner.lock() else {
            return Trigger {
                id: None,
                disposer: Disposer::noop(),
            };
        };

        let mut entry = Entry {
            target: target.downgrade(),
            target_id: target.id(),
            mode: spec.mode,
            start: spec.start,
            end: spec.end,
            callbacks: Arc::new(Mutex::new(spec.callbacks)),
            resolved: None,
            fired: false,
            inside: false,
            progress: None,
            last_offset: None,
            pin_translation: None,
        };
        let pins = entry.mode == TriggerMode::Pin;
        if !pins {
            entry.refresh(inner.viewport, &inner.spacers);
        }

        let id = inner.entries.insert(entry);
        inner.order.push(id);
        if pins {
            // A new spacer moves every line below it
            inner.refresh_all();
        }
        tracing::debug!(
            "TriggerRegistry: registered {:?} entry {:?} on element {}",
            spec.mode,
            id,
            target.id().as_u64()
        );

        let weak = Arc::downgrade(&self.inner);
        Trigger {
            id: Some(id),
            disposer: Disposer::new(move || {
                if let Some(inner) = weak.upgrade() {
                    if let Ok(mut inner) = inner.lock() {
                        if inner.remove(id).is_some() {
                            tracing::debug!("TriggerRegistry: disposed entry {:?}", id);
                        }
                    }
                }
            }),
        }
    }

    /// Re-measure every entry now
    pub fn refresh_all(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.refresh_all();
            tracing::debug!("TriggerRegistry: refreshed {} entries", inner.entries.len());
        }
    }

    /// Mark geometry stale; it is re-measured before the next evaluation
    pub fn invalidate(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.stale = true;
        }
    }

    /// Update the viewport and mark geometry stale
    pub fn set_viewport(&self, viewport: Viewport) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.viewport = viewport;
            inner.stale = true;
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.inner
            .lock()
            .map(|inner| inner.viewport)
            .unwrap_or_default()
    }

    pub fn is_stale(&self) -> bool {
        self.inner.lock().map(|inner| inner.stale).unwrap_or(false)
    }

    /// Number of full refreshes so far
    pub fn revision(&self) -> u64 {
        self.inner.lock().map(|inner| inner.revision).unwrap_or(0)
    }

    /// Extra scroll length all pins add to the page, as of the last refresh
    pub fn pin_spacing(&self) -> f32 {
        self.inner
            .lock()
            .map(|inner| inner.spacers.iter().map(|s| s.distance).sum())
            .unwrap_or(0.0)
    }

    /// Pin spacing inserted above an element whose layout top is `top`
    ///
    /// Adding this to `top` gives the scroll offset at which the element
    /// reaches the top of the viewport.
    pub fn spacing_before(&self, top: f32) -> f32 {
        self.inner
            .lock()
            .map(|inner| spacing_before(&inner.spacers, top))
            .unwrap_or(0.0)
    }

    /// Evaluate every entry against `state`, in registration order
    pub fn evaluate(&self, state: &ScrollState) {
        let offset = state.smoothed_offset;
        let pending: Vec<Pending> = {
            let Ok(mut guard) = self.inner.lock() else {
                return;
            };
            let inner = &mut *guard;
            if inner.stale {
                inner.refresh_all();
                tracing::trace!("TriggerRegistry: refreshed stale geometry before evaluation");
            }

            let mut pending = Vec::new();
            for id in &inner.order {
                let Some(entry) = inner.entries.get_mut(*id) else {
                    continue;
                };
                let events = entry.evaluate(offset);
                if !events.is_empty() {
                    let geometry = entry.geometry().unwrap_or_default();
                    pending.push((*id, Arc::clone(&entry.callbacks), events, geometry));
                }
            }
            pending
        };

        for (id, callbacks, events, geometry) in pending {
            if !self.contains(id) {
                continue;
            }
            let Ok(mut callbacks) = callbacks.lock() else {
                continue;
            };
            let result = catch_unwind(AssertUnwindSafe(|| {
                for event in &events {
                    tracing::trace!("TriggerRegistry: {:?} -> {:?}", id, event);
                    match *event {
                        TriggerEvent::Enter(dir) => {
                            if let Some(f) = callbacks.on_enter.as_mut() {
                                f(dir);
                            }
                        }
                        TriggerEvent::Leave(dir) => {
                            if let Some(f) = callbacks.on_leave.as_mut() {
                                f(dir);
                            }
                        }
                        TriggerEvent::Progress(t) => {
                            if let Some(f) = callbacks.on_progress.as_mut() {
                                f(t, &geometry);
                            }
                        }
                    }
                }
            }));
            if result.is_err() {
                tracing::error!("TriggerRegistry: callback for entry {:?} panicked", id);
            }
        }
    }

    pub fn contains(&self, id: TriggerId) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.entries.contains_key(id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live entries with the given mode
    pub fn count_mode(&self, mode: TriggerMode) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.entries.values().filter(|e| e.mode == mode).count())
            .unwrap_or(0)
    }

    /// Cached window geometry of a pin or scrub entry
    pub fn geometry(&self, id: TriggerId) -> Option<PinGeometry> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.entries.get(id).and_then(Entry::geometry))
    }

    /// Last reported progress of a pin or scrub entry
    pub fn progress(&self, id: TriggerId) -> Option<f32> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.entries.get(id).and_then(|e| e.progress))
    }

    /// Trigger line of a one-shot entry
    pub fn line(&self, id: TriggerId) -> Option<f32> {
        self.inner.lock().ok().and_then(|inner| {
            inner.entries.get(id).and_then(|e| match e.resolved {
                Some(Resolved::Line(line)) => Some(line),
                Some(Resolved::Window { start, .. }) => Some(start),
                _ => None,
            })
        })
    }

    /// Elements referenced by live entries
    pub fn targets(&self) -> Vec<ElementId> {
        self.inner
            .lock()
            .map(|inner| {
                inner
                    .order
                    .iter()
                    .filter_map(|id| inner.entries.get(*id).map(|e| e.target_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Remove every entry
    pub fn dispose_all(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            let count = inner.entries.len();
            inner.entries.clear();
            inner.order.clear();
            inner.spacers.clear();
            if count > 0 {
                tracing::debug!("TriggerRegistry: disposed {} entries", count);
            }
        }
    }
}
