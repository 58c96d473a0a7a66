//! Inertial scroll emulator
//!
//! Wheel, touch and keyboard input move a *target* offset; once per frame the
//! displayed (smoothed) offset is pulled toward the target with a critically
//! damped exponential step, so it glides without ever overshooting.
//!
//! ```text
//! smoothed += (target - smoothed) * (1 - e^(-k·dt)),   k = ln(1000) / duration
//! ```
//!
//! After one configured duration the remaining gap is 0.1% of where it
//! started. A shorter duration gives a larger `k` and a snappier scroll.
//!
//! [`NativeScroll`] is the reduced-motion counterpart: input is applied as-is
//! and the smoothed offset always equals the raw one. Both implement
//! [`ScrollSource`] so the rest of the page never needs to know which one is
//! active.
//!
//! # Example
//!
//! ```rust
//! use folio_animation::{ScrollInput, ScrollSource, SmoothScroll, SmoothScrollConfig};
//!
//! let scroll = SmoothScroll::new(SmoothScrollConfig::default(), 4000.0);
//! scroll.input(ScrollInput::Wheel { delta_y: 300.0 });
//!
//! let state = scroll.advance(16.0, 16.0);
//! assert!(state.smoothed_offset > 0.0 && state.smoothed_offset < 300.0);
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// Remaining gap (px) under which the smoothed offset snaps to the target
pub const SNAP_EPSILON: f64 = 0.01;

// ============================================================================
// State and input
// ============================================================================

/// Scroll position as seen by the rest of the page
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollState {
    /// Where input says the page should be
    pub raw_offset: f32,
    /// Where the page is drawn this frame
    pub smoothed_offset: f32,
    /// Smoothed velocity in pixels per second
    pub velocity: f32,
    pub timestamp_ms: f64,
}

/// Host scroll input
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollInput {
    Wheel { delta_y: f32 },
    Touch { delta_y: f32 },
    Keyboard { delta_y: f32 },
    /// Absolute offset reported by the platform scroller
    Native { offset: f32 },
}

/// Configuration for the inertial emulator
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothScrollConfig {
    /// Time for the smoothed offset to close 99.9% of a gap
    pub duration_ms: f32,
    /// Curve used by programmatic [`ScrollSource::scroll_to`]
    pub easing: Easing,
    pub wheel_multiplier: f32,
    pub touch_multiplier: f32,
}

impl Default for SmoothScrollConfig {
    fn default() -> Self {
        Self {
            duration_ms: 1200.0,
            easing: Easing::ExpoOut,
            wheel_multiplier: 1.0,
            touch_multiplier: 2.0,
        }
    }
}

impl SmoothScrollConfig {
    /// Short glide for trackpad-heavy pages
    pub fn snappy() -> Self {
        Self {
            duration_ms: 600.0,
            ..Default::default()
        }
    }

    /// Decay rate per millisecond
    fn decay_per_ms(&self) -> f64 {
        if self.duration_ms <= 0.0 {
            f64::INFINITY
        } else {
            1000f64.ln() / f64::from(self.duration_ms)
        }
    }
}

// ============================================================================
// Physics
// ============================================================================

/// The smoothing step on its own, free of listeners and locking
///
/// Works in f64 so long glides keep converging instead of stalling a few
/// ulps short of the target.
#[derive(Clone, Copy, Debug)]
pub struct InertialScroll {
    k: f64,
    target: f64,
    smoothed: f64,
    velocity: f32,
}

impl InertialScroll {
    pub fn new(config: &SmoothScrollConfig) -> Self {
        Self {
            k: config.decay_per_ms(),
            target: 0.0,
            smoothed: 0.0,
            velocity: 0.0,
        }
    }

    /// Move toward `target` for `dt_ms` and return the new smoothed offset
    pub fn advance(&mut self, target: f32, dt_ms: f32) -> f32 {
        self.target = f64::from(target);
        let prev = self.smoothed;

        if dt_ms > 0.0 {
            let gap = self.target - self.smoothed;
            // 1 - e^(-x), accurate for small x
            let factor = -(-self.k * f64::from(dt_ms)).exp_m1();
            let factor = if factor.is_finite() { factor } else { 1.0 };
            self.smoothed += gap * factor;

            if (self.target - self.smoothed).abs() < SNAP_EPSILON {
                self.smoothed = self.target;
            }
            self.velocity = ((self.smoothed - prev) / f64::from(dt_ms) * 1000.0) as f32;
        }

        self.smoothed as f32
    }

    /// Place both offsets at `offset` with no motion
    pub fn jump(&mut self, offset: f32) {
        self.target = f64::from(offset);
        self.smoothed = self.target;
        self.velocity = 0.0;
    }

    pub fn smoothed(&self) -> f32 {
        self.smoothed as f32
    }

    pub fn target(&self) -> f32 {
        self.target as f32
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Distance left to travel
    pub fn gap(&self) -> f64 {
        (self.target - self.smoothed).abs()
    }

    pub fn is_settled(&self) -> bool {
        self.smoothed == self.target
    }
}

// ============================================================================
// Listeners
// ============================================================================

/// Identifies a scroll listener for removal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Callback receiving every scroll change
pub type ScrollListener = Box<dyn FnMut(&ScrollState) + Send>;

type SharedListener = Arc<Mutex<ScrollListener>>;

#[derive(Default)]
struct ListenerSet {
    listeners: Mutex<(u64, IndexMap<ListenerId, SharedListener>)>,
}

impl ListenerSet {
    fn add(&self, listener: ScrollListener) -> ListenerId {
        match self.listeners.lock() {
            Ok(mut guard) => {
                guard.0 += 1;
                let id = ListenerId(guard.0);
                guard.1.insert(id, Arc::new(Mutex::new(listener)));
                id
            }
            Err(_) => ListenerId(0),
        }
    }

    fn remove(&self, id: ListenerId) -> bool {
        self.listeners
            .lock()
            .map(|mut guard| guard.1.shift_remove(&id).is_some())
            .unwrap_or(false)
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.listeners.lock() {
            guard.1.clear();
        }
    }

    /// Notify every listener, outside the set's lock
    fn emit(&self, state: &ScrollState) {
        let snapshot: Vec<SharedListener> = match self.listeners.lock() {
            Ok(guard) => guard.1.values().cloned().collect(),
            Err(_) => return,
        };
        for listener in snapshot {
            if let Ok(mut f) = listener.lock() {
                if catch_unwind(AssertUnwindSafe(|| (*f)(state))).is_err() {
                    tracing::error!("scroll listener panicked");
                }
            }
        }
    }
}

// ============================================================================
// Scroll sources
// ============================================================================

/// A scroll position provider driven once per frame
pub trait ScrollSource: Send + Sync {
    fn state(&self) -> ScrollState;

    /// Apply host input. Returns `false` if the input was ignored.
    fn input(&self, input: ScrollInput) -> bool;

    /// Scroll to `offset` over `duration_ms`; `0` jumps immediately
    fn scroll_to(&self, offset: f32, duration_ms: f32);

    /// Update the scroll limit after a resize, clamping the current target
    fn set_max_scroll(&self, max_scroll: f32);

    fn max_scroll(&self) -> f32;

    /// Step one frame
    fn advance(&self, dt_ms: f32, now_ms: f64) -> ScrollState;

    fn on_scroll(&self, listener: ScrollListener) -> ListenerId;

    fn off_scroll(&self, id: ListenerId) -> bool;

    /// Pause input handling
    fn stop(&self);

    /// Resume input handling
    fn start(&self);

    /// Stop listening and drop all listeners. Idempotent.
    fn dispose(&self);

    fn is_disposed(&self) -> bool;

    /// Whether this source smooths input (false for native scrolling)
    fn is_smooth(&self) -> bool;
}

#[derive(Clone, Copy, Debug)]
struct ProgrammaticScroll {
    from: f32,
    to: f32,
    duration_ms: f32,
    elapsed_ms: f32,
}

struct SmoothInner {
    config: SmoothScrollConfig,
    physics: InertialScroll,
    max_scroll: f32,
    programmatic: Option<ProgrammaticScroll>,
    stopped: bool,
    disposed: bool,
    state: ScrollState,
}

impl SmoothInner {
    fn clamp(&self, offset: f32) -> f32 {
        offset.clamp(0.0, self.max_scroll)
    }
}

/// Inertial scroll emulator
///
/// Emits exactly one notification per [`ScrollSource::advance`], with the
/// new smoothed offset.
pub struct SmoothScroll {
    inner: Mutex<SmoothInner>,
    listeners: ListenerSet,
}

impl SmoothScroll {
    pub fn new(config: SmoothScrollConfig, max_scroll: f32) -> Self {
        Self {
            inner: Mutex::new(SmoothInner {
                physics: InertialScroll::new(&config),
                config,
                max_scroll: max_scroll.max(0.0),
                programmatic: None,
                stopped: false,
                disposed: false,
                state: ScrollState::default(),
            }),
            listeners: ListenerSet::default(),
        }
    }

    pub fn new_shared(config: SmoothScrollConfig, max_scroll: f32) -> Arc<Self> {
        Arc::new(Self::new(config, max_scroll))
    }

    pub fn config(&self) -> SmoothScrollConfig {
        self.inner
            .lock()
            .map(|inner| inner.config)
            .unwrap_or_default()
    }

    /// Whether a programmatic scroll is in flight
    pub fn is_scrolling_to(&self) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.programmatic.is_some())
            .unwrap_or(false)
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.lock().map(|inner| inner.stopped).unwrap_or(true)
    }
}

impl ScrollSource for SmoothScroll {
    fn state(&self) -> ScrollState {
        self.inner
            .lock()
            .map(|inner| inner.state)
            .unwrap_or_default()
    }

    fn input(&self, input: ScrollInput) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        if inner.stopped || inner.disposed {
            return false;
        }

        // User input always wins over a running scroll_to
        if inner.programmatic.take().is_some() {
            tracing::trace!("SmoothScroll: programmatic scroll interrupted");
        }

        let current = inner.state.raw_offset;
        let target = match input {
            ScrollInput::Wheel { delta_y } | ScrollInput::Keyboard { delta_y } => {
                current + delta_y * inner.config.wheel_multiplier
            }
            ScrollInput::Touch { delta_y } => current + delta_y * inner.config.touch_multiplier,
            ScrollInput::Native { offset } => offset,
        };
        inner.state.raw_offset = inner.clamp(target);
        true
    }

    fn scroll_to(&self, offset: f32, duration_ms: f32) {
        let state = {
            let Ok(mut inner) = self.inner.lock() else {
                return;
            };
            if inner.disposed {
                return;
            }
            let to = inner.clamp(offset);

            if duration_ms <= 0.0 {
                inner.programmatic = None;
                inner.physics.jump(to);
                inner.state.raw_offset = to;
                inner.state.smoothed_offset = to;
                inner.state.velocity = 0.0;
                Some(inner.state)
            } else {
                let from = inner.state.smoothed_offset;
                inner.programmatic = Some(ProgrammaticScroll {
                    from,
                    to,
                    duration_ms,
                    elapsed_ms: 0.0,
                });
                inner.state.raw_offset = to;
                None
            }
        };

        if let Some(state) = state {
            self.listeners.emit(&state);
        }
    }

    fn set_max_scroll(&self, max_scroll: f32) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.max_scroll = max_scroll.max(0.0);
            inner.state.raw_offset = inner.clamp(inner.state.raw_offset);
            if let Some(p) = inner.programmatic.as_mut() {
                p.to = p.to.min(max_scroll.max(0.0));
            }
        }
    }

    fn max_scroll(&self) -> f32 {
        self.inner.lock().map(|inner| inner.max_scroll).unwrap_or(0.0)
    }

    fn advance(&self, dt_ms: f32, now_ms: f64) -> ScrollState {
        let state = {
            let Ok(mut guard) = self.inner.lock() else {
                return ScrollState::default();
            };
            let inner = &mut *guard;
            if inner.disposed {
                return inner.state;
            }

            let easing = inner.config.easing;
            let smoothed = match inner.programmatic.as_mut() {
                Some(p) => {
                    p.elapsed_ms += dt_ms.max(0.0);
                    let t = (p.elapsed_ms / p.duration_ms).min(1.0);
                    let offset = p.from + (p.to - p.from) * easing.apply(t);
                    let done = t >= 1.0;
                    let to = p.to;
                    let prev = inner.physics.smoothed();
                    if done {
                        inner.programmatic = None;
                        inner.physics.jump(to);
                    } else {
                        inner.physics.jump(offset);
                    }
                    let now = inner.physics.smoothed();
                    inner.state.velocity = if dt_ms > 0.0 {
                        (now - prev) / dt_ms * 1000.0
                    } else {
                        0.0
                    };
                    now
                }
                None => {
                    let target = inner.state.raw_offset;
                    let smoothed = inner.physics.advance(target, dt_ms);
                    inner.state.velocity = inner.physics.velocity();
                    smoothed
                }
            };

            inner.state.smoothed_offset = smoothed;
            inner.state.timestamp_ms = now_ms;
            inner.state
        };

        tracing::trace!(
            "SmoothScroll: raw={} smoothed={}",
            state.raw_offset,
            state.smoothed_offset
        );
        self.listeners.emit(&state);
        state
    }

    fn on_scroll(&self, listener: ScrollListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn off_scroll(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn stop(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.stopped = true;
        }
    }

    fn start(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.stopped = false;
        }
    }

    fn dispose(&self) {
        let first = match self.inner.lock() {
            Ok(mut inner) => {
                let first = !inner.disposed;
                inner.disposed = true;
                inner.programmatic = None;
                first
            }
            Err(_) => false,
        };
        if first {
            tracing::debug!("SmoothScroll: disposed");
        }
        self.listeners.clear();
    }

    fn is_disposed(&self) -> bool {
        self.inner.lock().map(|inner| inner.disposed).unwrap_or(true)
    }

    fn is_smooth(&self) -> bool {
        true
    }
}

struct NativeInner {
    max_scroll: f32,
    stopped: bool,
    disposed: bool,
    state: ScrollState,
}

/// Unsmoothed scrolling for reduced motion
///
/// Input lands immediately and is announced right away; `advance` only
/// refreshes the timestamp.
pub struct NativeScroll {
    inner: Mutex<NativeInner>,
    listeners: ListenerSet,
}

impl NativeScroll {
    pub fn new(max_scroll: f32) -> Self {
        Self {
            inner: Mutex::new(NativeInner {
                max_scroll: max_scroll.max(0.0),
                stopped: false,
                disposed: false,
                state: ScrollState::default(),
            }),
            listeners: ListenerSet::default(),
        }
    }

    pub fn new_shared(max_scroll: f32) -> Arc<Self> {
        Arc::new(Self::new(max_scroll))
    }

    fn set_offset(&self, offset: f32, respect_stop: bool) -> bool {
        let state = {
            let Ok(mut inner) = self.inner.lock() else {
                return false;
            };
            if inner.disposed || (respect_stop && inner.stopped) {
                return false;
            }
            let offset = offset.clamp(0.0, inner.max_scroll);
            inner.state.raw_offset = offset;
            inner.state.smoothed_offset = offset;
            inner.state.velocity = 0.0;
            inner.state
        };
        self.listeners.emit(&state);
        true
    }
}

impl ScrollSource for NativeScroll {
    fn state(&self) -> ScrollState {
        self.inner
            .lock()
            .map(|inner| inner.state)
            .unwrap_or_default()
    }

    fn input(&self, input: ScrollInput) -> bool {
        let current = self.state().raw_offset;
        let offset = match input {
            ScrollInput::Wheel { delta_y }
            | ScrollInput::Touch { delta_y }
            | ScrollInput::Keyboard { delta_y } => current + delta_y,
            ScrollInput::Native { offset } => offset,
        };
        self.set_offset(offset, true)
    }

    fn scroll_to(&self, offset: f32, _duration_ms: f32) {
        self.set_offset(offset, false);
    }

    fn set_max_scroll(&self, max_scroll: f32) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.max_scroll = max_scroll.max(0.0);
            let clamped = inner.state.raw_offset.min(inner.max_scroll);
            inner.state.raw_offset = clamped;
            inner.state.smoothed_offset = clamped;
        }
    }

    fn max_scroll(&self) -> f32 {
        self.inner.lock().map(|inner| inner.max_scroll).unwrap_or(0.0)
    }

    fn advance(&self, _dt_ms: f32, now_ms: f64) -> ScrollState {
        match self.inner.lock() {
            Ok(mut inner) => {
                inner.state.timestamp_ms = now_ms;
                inner.state
            }
            Err(_) => ScrollState::default(),
        }
    }

    fn on_scroll(&self, listener: ScrollListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn off_scroll(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn stop(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.stopped = true;
        }
    }

    fn start(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.stopped = false;
        }
    }

    fn dispose(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.disposed = true;
        }
        self.listeners.clear();
    }

    fn is_disposed(&self) -> bool {
        self.inner.lock().map(|inner| inner.disposed).unwrap_or(true)
    }

    fn is_smooth(&self) -> bool {
        false
    }
}
