//! Frame clock
//!
//! A single ticker that drives the scroll emulator, the trigger registry and
//! every running tween. Callbacks run once per tick in registration order.
//!
//! The clock owns no loop itself. A [`FrameDriver`] produces frames and is
//! started on the first `add` and stopped when the last callback is removed,
//! so an idle clock never spins. Frames delivered while the driver is stopped
//! are ignored.
//!
//! # Example
//!
//! ```rust
//! use folio_animation::{FrameClock, FrameDriver, ManualDriver};
//!
//! let driver = ManualDriver::new();
//! let clock = FrameClock::new(driver.clone());
//!
//! let id = clock.add(|time| println!("frame {} (+{}ms)", time.frame, time.delta_ms)).unwrap();
//! driver.frame(0.0);
//! driver.frame(16.7);
//!
//! clock.remove(id);
//! assert!(!driver.is_running());
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use indexmap::IndexMap;

use crate::error::{ClockError, Result};

/// Default cap above which a frame delta counts as lag
pub const DEFAULT_LAG_THRESHOLD_MS: f32 = 500.0;

/// Delta substituted for a lagging frame when lag smoothing is on
pub const DEFAULT_ADJUSTED_LAG_MS: f32 = 33.0;

/// Timing information passed to every frame callback
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTime {
    /// Timestamp of this frame in milliseconds
    pub now_ms: f64,
    /// Time since the previous frame, after lag smoothing
    pub delta_ms: f32,
    /// Number of frames delivered so far (starting at 1)
    pub frame: u64,
}

/// Handle to a registered frame callback
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

type SharedCallback = Arc<Mutex<dyn FnMut(&FrameTime) + Send>>;

struct ClockState {
    callbacks: IndexMap<CallbackId, SharedCallback>,
    next_id: u64,
    running: bool,
    last_now_ms: Option<f64>,
    frame: u64,
    lag_smoothing: bool,
    lag_threshold_ms: f32,
    adjusted_lag_ms: f32,
}

struct ClockShared {
    state: Mutex<ClockState>,
    driver: Arc<dyn FrameDriver>,
}

/// Produces frames for a [`FrameClock`]
///
/// Implementations call [`ClockHandle::tick`] once per display frame while
/// running.
pub trait FrameDriver: Send + Sync {
    /// Begin delivering frames to `clock`
    fn start(&self, clock: ClockHandle) -> Result<()>;

    /// Stop delivering frames. Must be safe to call from inside a tick.
    fn stop(&self);

    fn is_running(&self) -> bool;
}

/// The shared per-frame ticker
///
/// Cloning yields another reference to the same clock.
#[derive(Clone)]
pub struct FrameClock {
    shared: Arc<ClockShared>,
}

static GLOBAL_CLOCK: OnceLock<FrameClock> = OnceLock::new();

impl FrameClock {
    /// Create a clock driven by `driver`
    pub fn new(driver: Arc<dyn FrameDriver>) -> Self {
        Self {
            shared: Arc::new(ClockShared {
                state: Mutex::new(ClockState {
                    callbacks: IndexMap::new(),
                    next_id: 1,
                    running: false,
                    last_now_ms: None,
                    frame: 0,
                    lag_smoothing: true,
                    lag_threshold_ms: DEFAULT_LAG_THRESHOLD_MS,
                    adjusted_lag_ms: DEFAULT_ADJUSTED_LAG_MS,
                }),
                driver,
            }),
        }
    }

    /// The process-wide clock, driven by a background thread at 120fps
    pub fn global() -> FrameClock {
        GLOBAL_CLOCK
            .get_or_init(|| FrameClock::new(Arc::new(ThreadDriver::new(120))))
            .clone()
    }

    /// Weak handle for drivers and self-removing callbacks
    pub fn handle(&self) -> ClockHandle {
        ClockHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Register a callback; starts the driver on the empty → non-empty edge
    ///
    /// Fails only when the driver cannot start, in which case the callback
    /// is not kept.
    pub fn add<F>(&self, callback: F) -> Result<CallbackId>
    where
        F: FnMut(&FrameTime) + Send + 'static,
    {
        let callback: SharedCallback = Arc::new(Mutex::new(callback));
        let (id, needs_start) = {
            let mut state = self.lock_state()?;
            let id = CallbackId(state.next_id);
            state.next_id += 1;
            state.callbacks.insert(id, callback);
            let needs_start = !state.running;
            if needs_start {
                state.running = true;
                state.last_now_ms = None;
            }
            (id, needs_start)
        };

        if needs_start {
            tracing::debug!("FrameClock: starting driver");
            if let Err(err) = self.shared.driver.start(self.handle()) {
                if let Ok(mut state) = self.shared.state.lock() {
                    state.callbacks.shift_remove(&id);
                    state.running = false;
                }
                return Err(err);
            }
        }

        Ok(id)
    }

    /// Unregister a callback; stops the driver when none remain
    ///
    /// Removing an unknown or already removed id is a no-op.
    pub fn remove(&self, id: CallbackId) -> bool {
        let (removed, needs_stop) = match self.shared.state.lock() {
            Ok(mut state) => {
                let removed = state.callbacks.shift_remove(&id).is_some();
                let needs_stop = removed && state.callbacks.is_empty() && state.running;
                if needs_stop {
                    state.running = false;
                }
                (removed, needs_stop)
            }
            Err(_) => (false, false),
        };

        if needs_stop {
            tracing::debug!("FrameClock: last callback removed, stopping driver");
            self.shared.driver.stop();
        }
        removed
    }

    /// Run `callback` once after `delay_ms` of clock time
    ///
    /// Cancel with [`FrameClock::remove`] before it fires.
    pub fn delayed_call<F>(&self, delay_ms: f32, callback: F) -> Result<CallbackId>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = self.handle();
        let own_id: Arc<Mutex<Option<CallbackId>>> = Arc::new(Mutex::new(None));
        let mut callback = Some(callback);
        let mut elapsed = 0.0_f32;

        let id = self.add({
            let own_id = Arc::clone(&own_id);
            move |time| {
                elapsed += time.delta_ms;
                if elapsed < delay_ms {
                    return;
                }
                if let Some(f) = callback.take() {
                    f();
                }
                if let Some(id) = own_id.lock().ok().and_then(|id| *id) {
                    handle.remove(id);
                }
            }
        })?;

        if let Ok(mut slot) = own_id.lock() {
            *slot = Some(id);
        }
        Ok(id)
    }

    /// Enable or disable lag smoothing
    ///
    /// When disabled, frame deltas are passed through untouched even after a
    /// stall, accepting a visible jump instead of a catch-up burst.
    pub fn set_lag_smoothing(&self, enabled: bool) {
        if let Ok(mut state) = self.shared.state.lock() {
            state.lag_smoothing = enabled;
        }
    }

    /// Configure the lag threshold and the delta substituted above it
    pub fn set_lag_params(&self, threshold_ms: f32, adjusted_ms: f32) {
        if let Ok(mut state) = self.shared.state.lock() {
            state.lag_threshold_ms = threshold_ms.max(0.0);
            state.adjusted_lag_ms = adjusted_ms.clamp(0.0, state.lag_threshold_ms);
        }
    }

    pub fn lag_smoothing(&self) -> bool {
        self.shared
            .state
            .lock()
            .map(|s| s.lag_smoothing)
            .unwrap_or(true)
    }

    pub fn callback_count(&self) -> usize {
        self.shared
            .state
            .lock()
            .map(|s| s.callbacks.len())
            .unwrap_or(0)
    }

    /// Frames delivered since creation
    pub fn frame_count(&self) -> u64 {
        self.shared.state.lock().map(|s| s.frame).unwrap_or(0)
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().map(|s| s.running).unwrap_or(false)
    }

    /// Deliver a frame at `now_ms`; see [`ClockHandle::tick`]
    pub fn tick(&self, now_ms: f64) -> bool {
        tick_shared(&self.shared, now_ms)
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, ClockState>> {
        self.shared
            .state
            .lock()
            .map_err(|_| ClockError::DriverStart("frame clock state poisoned".into()))
    }
}

impl std::fmt::Debug for FrameClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameClock")
            .field("callbacks", &self.callback_count())
            .field("running", &self.is_running())
            .field("frame", &self.frame_count())
            .finish()
    }
}

/// Run every registered callback once
///
/// Callbacks are snapshotted first and invoked without the clock lock held,
/// so they may add or remove callbacks. A callback removed earlier in the
/// same tick does not run.
fn tick_shared(shared: &ClockShared, now_ms: f64) -> bool {
    let (time, callbacks) = {
        let Ok(mut state) = shared.state.lock() else {
            return false;
        };
        if !state.running {
            return false;
        }

        let raw_delta = state
            .last_now_ms
            .map(|last| (now_ms - last).max(0.0) as f32)
            .unwrap_or(0.0);
        state.last_now_ms = Some(now_ms);

        let delta_ms = if state.lag_smoothing && raw_delta > state.lag_threshold_ms {
            state.adjusted_lag_ms
        } else {
            raw_delta
        };
        state.frame += 1;

        let time = FrameTime {
            now_ms,
            delta_ms,
            frame: state.frame,
        };
        let callbacks: Vec<(CallbackId, SharedCallback)> = state
            .callbacks
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect();
        (time, callbacks)
    };

    for (id, callback) in callbacks {
        let still_registered = shared
            .state
            .lock()
            .map(|s| s.callbacks.contains_key(&id))
            .unwrap_or(false);
        if !still_registered {
            continue;
        }

        let Ok(mut f) = callback.lock() else {
            tracing::trace!("FrameClock: skipping poisoned callback {:?}", id);
            continue;
        };
        if catch_unwind(AssertUnwindSafe(|| (*f)(&time))).is_err() {
            tracing::error!("FrameClock: callback {:?} panicked on frame {}", id, time.frame);
        }
    }

    true
}

/// A weak reference to a clock, held by drivers
#[derive(Clone)]
pub struct ClockHandle {
    shared: Weak<ClockShared>,
}

impl ClockHandle {
    /// Deliver one frame
    ///
    /// Returns `false` if the clock is gone or stopped, in which case nothing
    /// ran.
    pub fn tick(&self, now_ms: f64) -> bool {
        match self.shared.upgrade() {
            Some(shared) => tick_shared(&shared, now_ms),
            None => false,
        }
    }

    /// Remove a callback if the clock still exists
    pub fn remove(&self, id: CallbackId) -> bool {
        match self.shared.upgrade() {
            Some(shared) => FrameClock { shared }.remove(id),
            None => false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }

    /// Recover the clock this handle points at
    pub fn upgrade(&self) -> Result<FrameClock> {
        self.shared
            .upgrade()
            .map(|shared| FrameClock { shared })
            .ok_or(ClockError::Dropped)
    }
}

// ============================================================================
// Drivers
// ============================================================================

/// Frames delivered by the host (or a test) calling [`ManualDriver::frame`]
#[derive(Default)]
pub struct ManualDriver {
    clock: Mutex<Option<ClockHandle>>,
    running: AtomicBool,
    starts: AtomicU64,
}

impl ManualDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver a frame if the driver is running
    pub fn frame(&self, now_ms: f64) -> bool {
        if !self.running.load(Ordering::Acquire) {
            return false;
        }
        let handle = self.clock.lock().ok().and_then(|c| c.clone());
        handle.map(|h| h.tick(now_ms)).unwrap_or(false)
    }

    /// Number of times the clock has started this driver
    pub fn start_count(&self) -> u64 {
        self.starts.load(Ordering::Relaxed)
    }
}

impl FrameDriver for ManualDriver {
    fn start(&self, clock: ClockHandle) -> Result<()> {
        if let Ok(mut slot) = self.clock.lock() {
            *slot = Some(clock);
        }
        self.starts.fetch_add(1, Ordering::Relaxed);
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

struct ThreadState {
    handle: Option<JoinHandle<()>>,
    thread_id: Option<ThreadId>,
    stop_flag: Arc<AtomicBool>,
}

/// Background thread delivering frames at a fixed rate
pub struct ThreadDriver {
    fps: u32,
    thread: Mutex<ThreadState>,
}

impl ThreadDriver {
    pub fn new(fps: u32) -> Self {
        Self {
            fps: fps.max(1),
            thread: Mutex::new(ThreadState {
                handle: None,
                thread_id: None,
                stop_flag: Arc::new(AtomicBool::new(false)),
            }),
        }
    }
}

impl FrameDriver for ThreadDriver {
    fn start(&self, clock: ClockHandle) -> Result<()> {
        let mut thread_state = self
            .thread
            .lock()
            .map_err(|_| ClockError::DriverStart("driver state poisoned".into()))?;
        if thread_state.handle.is_some() {
            return Ok(());
        }

        let stop_flag = Arc::new(AtomicBool::new(false));
        thread_state.stop_flag = Arc::clone(&stop_flag);
        let frame_duration = Duration::from_micros(1_000_000 / u64::from(self.fps));

        let handle = thread::Builder::new()
            .name("folio-frame-clock".into())
            .spawn(move || {
                let epoch = Instant::now();
                while !stop_flag.load(Ordering::Relaxed) {
                    let start = Instant::now();
                    let now_ms = epoch.elapsed().as_secs_f64() * 1000.0;
                    if !clock.is_alive() {
                        break;
                    }
                    clock.tick(now_ms);

                    let elapsed = start.elapsed();
                    if elapsed < frame_duration {
                        thread::sleep(frame_duration - elapsed);
                    }
                }
            })
            .map_err(|e| ClockError::DriverStart(e.to_string()))?;

        thread_state.thread_id = Some(handle.thread().id());
        thread_state.handle = Some(handle);
        Ok(())
    }

    fn stop(&self) {
        let (handle, on_driver_thread) = match self.thread.lock() {
            Ok(mut state) => {
                state.stop_flag.store(true, Ordering::Relaxed);
                let on_driver_thread = state.thread_id == Some(thread::current().id());
                state.thread_id = None;
                (state.handle.take(), on_driver_thread)
            }
            Err(_) => return,
        };

        // Stopping from inside a tick: the loop sees the flag and exits on
        // its own, joining here would deadlock.
        if let (Some(handle), false) = (handle, on_driver_thread) {
            let _ = handle.join();
        }
    }

    fn is_running(&self) -> bool {
        self.thread
            .lock()
            .map(|s| s.handle.is_some())
            .unwrap_or(false)
    }
}

impl Drop for ThreadDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn manual_clock() -> (Arc<ManualDriver>, FrameClock) {
        let driver = ManualDriver::new();
        let clock = FrameClock::new(driver.clone());
        (driver, clock)
    }

    #[test]
    fn test_callbacks_run_in_registration_order() {
        let (driver, clock) = manual_clock();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let log = Arc::clone(&log);
            clock.add(move |_| log.lock().unwrap().push(i)).unwrap();
        }
        driver.frame(0.0);
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_driver_starts_and_stops_with_callbacks() {
        let (driver, clock) = manual_clock();
        assert!(!driver.is_running());

        let a = clock.add(|_| {}).unwrap();
        let b = clock.add(|_| {}).unwrap();
        assert!(driver.is_running());
        assert_eq!(driver.start_count(), 1);

        clock.remove(a);
        assert!(driver.is_running());
        clock.remove(b);
        assert!(!driver.is_running());
        assert!(!clock.is_running());

        clock.add(|_| {}).unwrap();
        assert_eq!(driver.start_count(), 2);
    }

    #[test]
    fn test_no_ticks_after_last_callback_removed() {
        let (driver, clock) = manual_clock();
        let calls = Arc::new(AtomicUsize::new(0));
        let id = {
            let calls = Arc::clone(&calls);
            clock
                .add(move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap()
        };

        driver.frame(0.0);
        driver.frame(16.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let frames = clock.frame_count();

        clock.remove(id);
        assert!(!driver.frame(32.0));
        assert!(!clock.tick(48.0));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(clock.frame_count(), frames);
    }

    #[test]
    fn test_lag_smoothing() {
        let (driver, clock) = manual_clock();
        let deltas = Arc::new(Mutex::new(Vec::new()));
        {
            let deltas = Arc::clone(&deltas);
            clock
                .add(move |t| deltas.lock().unwrap().push(t.delta_ms))
                .unwrap();
        }

        driver.frame(0.0);
        driver.frame(1000.0);
        clock.set_lag_smoothing(false);
        driver.frame(2000.0);

        assert_eq!(
            *deltas.lock().unwrap(),
            vec![0.0, DEFAULT_ADJUSTED_LAG_MS, 1000.0]
        );
    }

    #[test]
    fn test_callback_may_remove_itself_and_others() {
        let (driver, clock) = manual_clock();
        let ran_second = Arc::new(AtomicUsize::new(0));
        let second_id = Arc::new(Mutex::new(None));

        {
            let handle = clock.handle();
            let second_id = Arc::clone(&second_id);
            clock
                .add(move |_| {
                    if let Some(id) = *second_id.lock().unwrap() {
                        handle.remove(id);
                    }
                })
                .unwrap();
        }
        let id = {
            let ran_second = Arc::clone(&ran_second);
            clock
                .add(move |_| {
                    ran_second.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap()
        };
        *second_id.lock().unwrap() = Some(id);

        driver.frame(0.0);
        assert_eq!(ran_second.load(Ordering::SeqCst), 0);
        assert_eq!(clock.callback_count(), 1);
    }

    #[test]
    fn test_panicking_callback_is_isolated() {
        let (driver, clock) = manual_clock();
        let after = Arc::new(AtomicUsize::new(0));
        clock.add(|_| panic!("boom")).unwrap();
        {
            let after = Arc::clone(&after);
            clock
                .add(move |_| {
                    after.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
        driver.frame(0.0);
        driver.frame(16.0);
        assert_eq!(after.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_delayed_call_fires_once_then_unregisters() {
        let (driver, clock) = manual_clock();
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let fired = Arc::clone(&fired);
            clock
                .delayed_call(100.0, move || {
                    fired.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        let mut now = 0.0;
        for _ in 0..5 {
            driver.frame(now);
            now += 16.0;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        for _ in 0..10 {
            driver.frame(now);
            now += 16.0;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(clock.callback_count(), 0);
        assert!(!driver.is_running());
    }

    #[test]
    fn test_cancel_delayed_call() {
        let (driver, clock) = manual_clock();
        let fired = Arc::new(AtomicUsize::new(0));
        let id = {
            let fired = Arc::clone(&fired);
            clock
                .delayed_call(10.0, move || {
                    fired.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap()
        };
        clock.remove(id);
        clock.remove(id);
        driver.frame(0.0);
        driver.frame(50.0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    struct FailingDriver;

    impl FrameDriver for FailingDriver {
        fn start(&self, _clock: ClockHandle) -> Result<()> {
            Err(ClockError::DriverStart("no timing primitive".into()))
        }
        fn stop(&self) {}
        fn is_running(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_driver_failure_is_reported() {
        let clock = FrameClock::new(Arc::new(FailingDriver));
        assert!(clock.add(|_| {}).is_err());
        assert_eq!(clock.callback_count(), 0);
        assert!(!clock.is_running());
    }

    #[test]
    fn test_handle_outlived_by_clock() {
        let (_driver, clock) = manual_clock();
        let handle = clock.handle();
        assert!(handle.upgrade().is_ok());
        drop(clock);
        assert!(!handle.is_alive());
        assert!(matches!(handle.upgrade(), Err(ClockError::Dropped)));
        assert!(!handle.tick(0.0));
    }

    #[test]
    fn test_thread_driver_ticks_and_stops() {
        let clock = FrameClock::new(Arc::new(ThreadDriver::new(240)));
        let calls = Arc::new(AtomicUsize::new(0));
        let id = {
            let calls = Arc::clone(&calls);
            clock
                .add(move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap()
        };

        let deadline = Instant::now() + Duration::from_secs(2);
        while calls.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(calls.load(Ordering::SeqCst) >= 3);

        clock.remove(id);
        let settled = calls.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(calls.load(Ordering::SeqCst), settled);
    }
}
