//! Reveal animator
//!
//! Fire-and-forget property tweens on page elements. Each tween interpolates
//! from a start state to an end state through an [`Easing`], optionally
//! staggering its targets.
//!
//! Rules the animator keeps:
//!
//! - `from` values are applied to every target the moment a tween starts,
//!   even when a delay or stagger holds the motion back
//! - the most recently started tween owns each (element, property) pair;
//!   older tweens stop writing properties they lost and finish once they own
//!   nothing
//! - only [`Repeat::Forever`] tweens outlive their duration, and only
//!   cancellation ends them
//! - in reduced-motion mode transforms are dropped and opacity snaps to its
//!   end value
//!
//! # Example
//!
//! ```rust
//! use folio_animation::{Animator, FrameClock, ManualDriver, TweenOptions};
//! use folio_core::{Element, Props};
//!
//! let driver = ManualDriver::new();
//! let clock = FrameClock::new(driver.clone());
//! let animator = Animator::new(&clock).unwrap();
//!
//! let card = Element::builder().class("service-card").build();
//! animator.tween(
//!     &[card.clone()],
//!     Props::new().y(50.0).opacity(0.0),
//!     Props::new().y(0.0).opacity(1.0),
//!     TweenOptions::with_duration(800.0),
//! );
//! assert_eq!(card.style().opacity, 0.0);
//!
//! for i in 0..60 {
//!     driver.frame(i as f64 * 16.0);
//! }
//! assert_eq!(card.style().opacity, 1.0);
//! ```

use std::sync::{Arc, Mutex, Weak};

use folio_core::{ElementHandle, ElementId, Property, Props, WeakElement};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::clock::{CallbackId, FrameClock};
use crate::easing::Easing;
use crate::error::Result;

new_key_type! {
    /// Handle to a running tween
    pub struct TweenId;
}

/// Repetition behaviour
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    #[default]
    Once,
    /// Loop until cancelled; `yoyo` plays every other cycle backwards
    Forever {
        #[serde(default)]
        yoyo: bool,
    },
}

/// Timing options for a tween
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenOptions {
    pub duration_ms: f32,
    /// Extra delay added per target index
    pub stagger_ms: f32,
    pub delay_ms: f32,
    pub easing: Easing,
    pub repeat: Repeat,
}

impl Default for TweenOptions {
    fn default() -> Self {
        Self {
            duration_ms: 500.0,
            stagger_ms: 0.0,
            delay_ms: 0.0,
            easing: Easing::default(),
            repeat: Repeat::Once,
        }
    }
}

impl TweenOptions {
    pub fn with_duration(duration_ms: f32) -> Self {
        Self {
            duration_ms,
            ..Default::default()
        }
    }

    pub fn stagger(mut self, stagger_ms: f32) -> Self {
        self.stagger_ms = stagger_ms;
        self
    }

    pub fn delay(mut self, delay_ms: f32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    /// Delay before target `index` starts moving
    pub fn delay_for_index(&self, index: usize) -> f32 {
        self.delay_ms + index as f32 * self.stagger_ms
    }

    /// Time until the last of `targets` finishes one cycle
    pub fn total_duration(&self, targets: usize) -> f32 {
        self.delay_for_index(targets.saturating_sub(1)) + self.duration_ms
    }
}

/// Linear progress through a cycle and whether the tween is finished
fn cycle_progress(local_ms: f32, duration_ms: f32, repeat: Repeat) -> (f32, bool) {
    if duration_ms <= 0.0 {
        return (1.0, true);
    }
    let cycles = local_ms / duration_ms;
    match repeat {
        Repeat::Once => (cycles.min(1.0), cycles >= 1.0),
        Repeat::Forever { yoyo } => {
            let index = cycles.floor();
            let frac = cycles - index;
            if yoyo && (index as u64) % 2 == 1 {
                (1.0 - frac, false)
            } else {
                (frac, false)
            }
        }
    }
}

/// One target of a tween
struct Track {
    element: WeakElement,
    element_id: ElementId,
    delay_ms: f32,
    from: Props,
    to: Props,
    /// Start values, captured when the track first becomes active
    start: Option<Props>,
    done: bool,
}

struct Tween {
    tracks: SmallVec<[Track; 4]>,
    duration_ms: f32,
    easing: Easing,
    repeat: Repeat,
    elapsed_ms: f32,
}

#[derive(Default)]
struct AnimatorInner {
    tweens: SlotMap<TweenId, Tween>,
    owners: FxHashMap<(ElementId, Property), TweenId>,
    reduced_motion: bool,
}

impl AnimatorInner {
    fn release(&mut self, id: TweenId) -> bool {
        let Some(tween) = self.tweens.remove(id) else {
            return false;
        };
        for track in &tween.tracks {
            for (property, _) in track.to.iter() {
                let key = (track.element_id, property);
                if self.owners.get(&key) == Some(&id) {
                    self.owners.remove(&key);
                }
            }
        }
        true
    }

    fn step(&mut self, dt_ms: f32) {
        let mut finished: SmallVec<[TweenId; 8]> = SmallVec::new();

        for (id, tween) in self.tweens.iter_mut() {
            tween.elapsed_ms += dt_ms;
            let mut running = false;
            let mut owns_any = false;

            for track in tween.tracks.iter_mut() {
                if track.done {
                    continue;
                }
                let Some(element) = track.element.upgrade().filter(|e| e.is_attached()) else {
                    track.done = true;
                    continue;
                };

                let owned: SmallVec<[(Property, f32); 4]> = track
                    .to
                    .iter()
                    .filter(|(p, _)| self.owners.get(&(track.element_id, *p)) == Some(&id))
                    .collect();
                if owned.is_empty() {
                    track.done = true;
                    continue;
                }
                owns_any = true;

                let local = tween.elapsed_ms - track.delay_ms;
                if local < 0.0 {
                    running = true;
                    continue;
                }

                let from = track.from;
                let start = *track.start.get_or_insert_with(|| {
                    let mut start = Props::new();
                    for (property, _) in track.to.iter() {
                        let value = from
                            .get(property)
                            .unwrap_or_else(|| element.property(property));
                        start.set(property, Some(value));
                    }
                    start
                });

                let (progress, done) = cycle_progress(local, tween.duration_ms, tween.repeat);
                let eased = tween.easing.apply(progress);
                for (property, end) in owned {
                    let begin = start.get(property).unwrap_or_else(|| property.identity());
                    let value = if done { end } else { begin + (end - begin) * eased };
                    element.set_property(property, value);
                }

                if done {
                    track.done = true;
                } else {
                    running = true;
                }
            }

            if !running || !owns_any {
                finished.push(id);
            }
        }

        for id in finished {
            tracing::trace!("Animator: tween {:?} finished", id);
            self.release(id);
        }
    }
}

/// Handle returned by [`Animator::tween`]
///
/// Dropping the handle does not stop the tween.
#[derive(Clone, Debug)]
pub struct TweenHandle {
    id: TweenId,
    inner: Weak<Mutex<AnimatorInner>>,
}

impl TweenHandle {
    /// A handle to nothing, for tweens that never started
    pub fn noop() -> Self {
        Self {
            id: TweenId::default(),
            inner: Weak::new(),
        }
    }

    pub fn id(&self) -> TweenId {
        self.id
    }

    /// Stop the tween where it is. Safe to call any number of times.
    pub fn cancel(&self) {
        if let Some(inner) = self.inner.upgrade() {
            if let Ok(mut inner) = inner.lock() {
                if inner.release(self.id) {
                    tracing::trace!("Animator: tween {:?} cancelled", self.id);
                }
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner
            .upgrade()
            .and_then(|inner| inner.lock().ok().map(|i| i.tweens.contains_key(self.id)))
            .unwrap_or(false)
    }
}

/// Runs tweens on every frame of a [`FrameClock`]
pub struct Animator {
    inner: Arc<Mutex<AnimatorInner>>,
    clock: Option<FrameClock>,
    callback: Mutex<Option<CallbackId>>,
}

impl Animator {
    /// Create an animator ticking on `clock`
    pub fn new(clock: &FrameClock) -> Result<Self> {
        let inner = Arc::new(Mutex::new(AnimatorInner::default()));
        let weak = Arc::downgrade(&inner);
        let id = clock.add(move |time| {
            if let Some(inner) = weak.upgrade() {
                if let Ok(mut inner) = inner.lock() {
                    inner.step(time.delta_ms);
                }
            }
        })?;

        Ok(Self {
            inner,
            clock: Some(clock.clone()),
            callback: Mutex::new(Some(id)),
        })
    }

    /// An animator driven only through [`Animator::tick`]
    pub fn manual() -> Self {
        Self {
            inner: Arc::new(Mutex::new(AnimatorInner::default())),
            clock: None,
            callback: Mutex::new(None),
        }
    }

    pub fn set_reduced_motion(&self, reduced: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.reduced_motion = reduced;
        }
    }

    pub fn reduced_motion(&self) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.reduced_motion)
            .unwrap_or(false)
    }

    /// Start a tween from `from` to `to` on every target
    pub fn tween(
        &self,
        targets: &[ElementHandle],
        from: Props,
        to: Props,
        options: TweenOptions,
    ) -> TweenHandle {
        if targets.is_empty() {
            tracing::debug!("Animator: tween with no targets skipped");
            return TweenHandle::noop();
        }
        let Ok(mut inner) = self.inner.lock() else {
            return TweenHandle::noop();
        };

        if inner.reduced_motion {
            let to = to.opacity_only();
            if to.is_empty() {
                return TweenHandle::noop();
            }
            for target in targets {
                inner.owners.remove(&(target.id(), Property::Opacity));
                target.apply(&to);
            }
            return TweenHandle::noop();
        }

        let mut tracks = SmallVec::new();
        for (index, target) in targets.iter().enumerate() {
            target.apply(&from);
            tracks.push(Track {
                element: target.downgrade(),
                element_id: target.id(),
                delay_ms: options.delay_for_index(index),
                from,
                to,
                start: None,
                done: false,
            });
        }

        let id = inner.tweens.insert(Tween {
            tracks,
            duration_ms: options.duration_ms.max(0.0),
            easing: options.easing,
            repeat: options.repeat,
            elapsed_ms: 0.0,
        });

        for target in targets {
            for (property, _) in to.iter() {
                inner.owners.insert((target.id(), property), id);
            }
        }

        tracing::trace!("Animator: tween {:?} started on {} targets", id, targets.len());
        TweenHandle {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Tween from the current style to `to`
    pub fn to(&self, targets: &[ElementHandle], to: Props, options: TweenOptions) -> TweenHandle {
        self.tween(targets, Props::new(), to, options)
    }

    /// Apply `props` immediately, taking the properties away from any tween
    pub fn set(&self, targets: &[ElementHandle], props: Props) {
        if let Ok(mut inner) = self.inner.lock() {
            for target in targets {
                for (property, _) in props.iter() {
                    inner.owners.remove(&(target.id(), property));
                }
                target.apply(&props);
            }
        }
    }

    /// Advance every tween by `dt_ms`
    pub fn tick(&self, dt_ms: f32) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.step(dt_ms);
        }
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.tweens.len()).unwrap_or(0)
    }

    /// Cancel every running tween
    pub fn cancel_all(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            let count = inner.tweens.len();
            inner.tweens.clear();
            inner.owners.clear();
            if count > 0 {
                tracing::debug!("Animator: cancelled {} tweens", count);
            }
        }
    }

    /// Stop receiving frames; running tweens freeze in place
    pub fn detach_from_clock(&self) {
        let id = self.callback.lock().ok().and_then(|mut id| id.take());
        if let (Some(id), Some(clock)) = (id, self.clock.as_ref()) {
            clock.remove(id);
        }
    }
}

impl Drop for Animator {
    fn drop(&mut self) {
        self.detach_from_clock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FrameDriver, ManualDriver};
    use folio_core::Element;

    fn card() -> ElementHandle {
        Element::builder().class("card").build()
    }

    #[test]
    fn test_from_applied_immediately_then_reaches_to() {
        let animator = Animator::manual();
        let el = card();
        animator.tween(
            &[el.clone()],
            Props::new().y(50.0).opacity(0.0),
            Props::new().y(0.0).opacity(1.0),
            TweenOptions::with_duration(800.0).easing(Easing::Linear),
        );
        assert_eq!(el.style().y, 50.0);
        assert_eq!(el.style().opacity, 0.0);

        animator.tick(400.0);
        assert!((el.style().y - 25.0).abs() < 1e-4);

        animator.tick(400.0);
        assert_eq!(el.style().y, 0.0);
        assert_eq!(el.style().opacity, 1.0);
        assert_eq!(animator.active_count(), 0);
    }

    #[test]
    fn test_stagger_offsets_targets() {
        let animator = Animator::manual();
        let els: Vec<_> = (0..3).map(|_| card()).collect();
        animator.tween(
            &els,
            Props::new().opacity(0.0),
            Props::new().opacity(1.0),
            TweenOptions::with_duration(100.0)
                .stagger(100.0)
                .easing(Easing::Linear),
        );

        animator.tick(150.0);
        assert_eq!(els[0].style().opacity, 1.0);
        assert!((els[1].style().opacity - 0.5).abs() < 1e-4);
        assert_eq!(els[2].style().opacity, 0.0);

        animator.tick(150.0);
        assert!(els.iter().all(|e| e.style().opacity == 1.0));
        assert_eq!(animator.active_count(), 0);
    }

    #[test]
    fn test_to_starts_from_current_value() {
        let animator = Animator::manual();
        let el = card();
        el.set_property(Property::X, 100.0);
        animator.to(
            &[el.clone()],
            Props::new().x(200.0),
            TweenOptions::with_duration(100.0).easing(Easing::Linear),
        );
        animator.tick(50.0);
        assert!((el.style().x - 150.0).abs() < 1e-4);
    }

    #[test]
    fn test_last_started_tween_owns_property() {
        let animator = Animator::manual();
        let el = card();
        let first = animator.to(
            &[el.clone()],
            Props::new().x(100.0),
            TweenOptions::with_duration(1000.0).easing(Easing::Linear),
        );
        animator.tick(100.0);
        let second = animator.to(
            &[el.clone()],
            Props::new().x(-100.0),
            TweenOptions::with_duration(100.0).easing(Easing::Linear),
        );

        animator.tick(100.0);
        assert_eq!(el.style().x, -100.0);
        assert!(!first.is_active());
        assert!(!second.is_active());

        animator.tick(500.0);
        assert_eq!(el.style().x, -100.0);
    }

    #[test]
    fn test_forever_yoyo_and_idempotent_cancel() {
        let animator = Animator::manual();
        let el = card();
        let handle = animator.tween(
            &[el.clone()],
            Props::new().x(0.0),
            Props::new().x(100.0),
            TweenOptions::with_duration(100.0)
                .easing(Easing::Linear)
                .repeat(Repeat::Forever { yoyo: true }),
        );

        animator.tick(50.0);
        assert!((el.style().x - 50.0).abs() < 1e-3);
        animator.tick(75.0);
        assert!((el.style().x - 75.0).abs() < 1e-3);
        for _ in 0..100 {
            animator.tick(16.0);
        }
        assert!(handle.is_active());

        handle.cancel();
        handle.cancel();
        assert!(!handle.is_active());
        let frozen = el.style().x;
        animator.tick(50.0);
        assert_eq!(el.style().x, frozen);
    }

    #[test]
    fn test_reduced_motion_keeps_only_opacity() {
        let animator = Animator::manual();
        animator.set_reduced_motion(true);
        let el = card();

        let handle = animator.tween(
            &[el.clone()],
            Props::new().y(50.0).opacity(0.0),
            Props::new().y(0.0).opacity(1.0),
            TweenOptions::with_duration(800.0),
        );
        assert!(!handle.is_active());
        assert_eq!(el.style().opacity, 1.0);
        assert_eq!(el.style().y, 0.0);

        let handle = animator.to(
            &[el.clone()],
            Props::new().x(300.0),
            TweenOptions::default(),
        );
        assert!(!handle.is_active());
        assert_eq!(el.style().x, 0.0);
        assert_eq!(animator.active_count(), 0);
    }

    #[test]
    fn test_dropped_target_is_skipped() {
        let animator = Animator::manual();
        let el = card();
        let handle = animator.to(&[el.clone()], Props::new().x(10.0), TweenOptions::default());
        drop(el);
        animator.tick(16.0);
        assert!(!handle.is_active());
    }

    #[test]
    fn test_no_targets_gives_noop_handle() {
        let animator = Animator::manual();
        let handle = animator.to(&[], Props::new().x(10.0), TweenOptions::default());
        assert!(!handle.is_active());
        handle.cancel();
    }

    #[test]
    fn test_clock_driven_and_detached() {
        let driver = ManualDriver::new();
        let clock = FrameClock::new(driver.clone());
        let animator = Animator::new(&clock).unwrap();
        let el = card();
        animator.to(
            &[el.clone()],
            Props::new().opacity(0.0),
            TweenOptions::with_duration(100.0),
        );

        driver.frame(0.0);
        driver.frame(50.0);
        assert!(el.style().opacity < 1.0);

        animator.detach_from_clock();
        assert!(!driver.is_running());
        animator.cancel_all();
        assert_eq!(animator.active_count(), 0);
    }

    #[test]
    fn test_repeat_from_toml() {
        let opts: TweenOptions = toml::from_str(
            r#"
            duration_ms = 20000
            easing = "none"
            repeat = { forever = { yoyo = false } }
            "#,
        )
        .unwrap();
        assert_eq!(opts.repeat, Repeat::Forever { yoyo: false });
        assert_eq!(opts.easing, Easing::Linear);
    }
}
