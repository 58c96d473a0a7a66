//! Animation coordinator
//!
//! Wires the page together for one mount: the scroll source, the trigger
//! registry and the animator all run on one [`FrameClock`], in that order,
//! so every frame evaluates triggers against the scroll position computed
//! in the same frame.
//!
//! # Mount
//!
//! 1. Build the scroll source (inertial, or native under reduced motion)
//! 2. Register the scroll step, then the trigger evaluator, then the animator
//!    on the clock, with lag smoothing off
//! 3. Register reveal, gallery and parallax entries; start loops, the intro,
//!    the pointer follower and magnetic buttons
//! 4. Schedule one deferred refresh for late layout (fonts, images)
//!
//! The scroll limit is the document's own limit plus the spacing pinned
//! sections add. It is recomputed whenever the registry re-measures.
//!
//! # Teardown
//!
//! Runs exactly once, either explicitly or when the [`Coordinator`] is
//! dropped, in a fixed order: cancel the deferred refresh, stop frame
//! callbacks, dispose triggers, cancel tweens, release the scroll source.

use std::sync::{Arc, Mutex, Weak};

use folio_animation::{
    Animator, CallbackId, FrameClock, NativeScroll, ScrollInput, ScrollSource, ScrollState,
    SmoothScroll, Timeline, TimelineHandle, TweenHandle,
};
use folio_core::{DisposeBag, Document, ElementHandle, Props, Rect, Viewport, WeakElement};

use crate::config::{CoordinatorConfig, RevealConfig};
use crate::error::Result;
use crate::gallery::{mount_gallery, StripMotion};
use crate::parallax::{mount_parallax, ParallaxRange};
use crate::pointer::{MagneticField, PointerFollower, PointerKind};
use crate::trigger::{Direction, TriggerRegistry, TriggerSpec};

/// Something the coordinator did, reported to an [`EventSink`]
#[derive(Clone, Debug, PartialEq)]
pub enum CoordinatorEvent {
    /// A reveal trigger fired at the given smoothed offset
    Revealed { selector: String, offset: f32 },
    /// Trigger geometry was re-measured
    Refreshed,
    /// A teardown step completed
    Teardown(TeardownStep),
}

/// Observer of coordinator events
pub type EventSink = Arc<dyn Fn(&CoordinatorEvent) + Send + Sync>;

/// Host environment for a mount
#[derive(Clone)]
pub struct PageEnv {
    pub document: Arc<Document>,
    pub viewport: Viewport,
    pub clock: FrameClock,
    pub pointer: PointerKind,
    pub events: Option<EventSink>,
}

impl PageEnv {
    pub fn new(document: Arc<Document>, viewport: Viewport, clock: FrameClock) -> Self {
        Self {
            document,
            viewport,
            clock,
            pointer: PointerKind::Fine,
            events: None,
        }
    }

    pub fn with_pointer(mut self, pointer: PointerKind) -> Self {
        self.pointer = pointer;
        self
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = Some(events);
        self
    }
}

/// Teardown stages, in the order they run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeardownStep {
    CancelRefresh,
    RemoveClockCallbacks,
    DisposeTriggers,
    CancelTweens,
    ReleaseScroll,
}

/// What a call to [`Coordinator::teardown`] did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub steps: Vec<TeardownStep>,
}

impl TeardownReport {
    /// True when teardown had already run
    pub fn was_noop(&self) -> bool {
        self.steps.is_empty()
    }
}

#[derive(Default)]
struct Lifecycle {
    torn_down: bool,
    refresh_call: Option<CallbackId>,
    clock_callbacks: Vec<CallbackId>,
    triggers: DisposeBag,
    tweens: Vec<TweenHandle>,
    timeline: Option<TimelineHandle>,
}

struct Shared {
    clock: FrameClock,
    document: Arc<Document>,
    scroll: Arc<dyn ScrollSource>,
    registry: TriggerRegistry,
    animator: Arc<Animator>,
    follower: Mutex<Option<PointerFollower>>,
    magnetic: Mutex<Option<MagneticField>>,
    lifecycle: Mutex<Lifecycle>,
    viewport: Mutex<Viewport>,
    scroll_duration_ms: f32,
    events: Option<EventSink>,
}

impl Shared {
    fn emit(&self, event: CoordinatorEvent) {
        if let Some(sink) = &self.events {
            sink(&event);
        }
    }

    /// Scroll limit including pin spacing
    fn sync_max_scroll(&self) {
        let viewport = self.registry.viewport();
        let max = self.document.max_scroll(viewport) + self.registry.pin_spacing();
        self.scroll.set_max_scroll(max);
    }
}

/// A mounted page; tears everything down when dropped
pub struct Coordinator {
    shared: Arc<Shared>,
}

/// Mount scroll-driven animation for a page
///
/// Fails only when the configuration is invalid or the frame clock cannot
/// run. Missing elements are skipped.
pub fn mount_animation_coordinator(
    config: CoordinatorConfig,
    env: PageEnv,
) -> Result<Coordinator> {
    config.validate()?;

    let PageEnv {
        document,
        viewport,
        clock,
        pointer,
        events,
    } = env;
    let reduced = config.reduced_motion;
    let max_scroll = document.max_scroll(viewport);

    let scroll: Arc<dyn ScrollSource> = if reduced {
        NativeScroll::new_shared(max_scroll)
    } else {
        SmoothScroll::new_shared(config.smooth_scroll, max_scroll)
    };

    let registry = TriggerRegistry::new(viewport);

    clock.set_lag_smoothing(false);
    let mut clock_callbacks = Vec::with_capacity(2);
    let registered = register_frame_callbacks(
        &clock,
        &scroll,
        &registry,
        &document,
        &mut clock_callbacks,
    );
    let animator = match registered.and_then(|()| Ok(Animator::new(&clock)?)) {
        Ok(animator) => animator,
        Err(err) => {
            for id in clock_callbacks {
                clock.remove(id);
            }
            scroll.dispose();
            return Err(err);
        }
    };
    animator.set_reduced_motion(reduced);

    let coordinator = Coordinator {
        shared: Arc::new(Shared {
            clock: clock.clone(),
            document: Arc::clone(&document),
            scroll,
            registry,
            animator: Arc::new(animator),
            follower: Mutex::new(None),
            magnetic: Mutex::new(None),
            lifecycle: Mutex::new(Lifecycle {
                clock_callbacks,
                ..Lifecycle::default()
            }),
            viewport: Mutex::new(viewport),
            scroll_duration_ms: config.smooth_scroll.duration_ms,
            events,
        }),
    };
    // From here on, an early return drops `coordinator` and tears down
    // whatever was registered so far.
    let shared = &coordinator.shared;

    let mut triggers = DisposeBag::new();
    for reveal in &config.reveals {
        mount_reveal(shared, reveal, reduced, &mut triggers);
    }

    if !reduced {
        if let Some(gallery) = &config.pinned_gallery {
            match document.query_first(&gallery.strip) {
                Some(strip) => {
                    let section = document.query_first(&gallery.section);
                    let motion = StripMotion::with_lag(&shared.animator, gallery.scrub_lag_ms);
                    let trigger = mount_gallery(
                        &shared.registry,
                        section.as_ref(),
                        &strip,
                        gallery.start,
                        motion,
                    );
                    triggers.push(trigger.into_disposer());
                }
                None => tracing::debug!("Coordinator: gallery strip `{}` not found", gallery.strip),
            }
        }

        for parallax in &config.parallax {
            let trigger = document.query_first(&parallax.trigger);
            let targets = document.query(&parallax.selector);
            let range = ParallaxRange {
                property: parallax.property,
                from: parallax.from,
                to: parallax.to,
                easing: parallax.easing,
            };
            let entry = mount_parallax(
                &shared.registry,
                trigger.as_ref(),
                &targets,
                range,
                parallax.start,
                parallax.end,
            );
            triggers.push(entry.into_disposer());
        }
    }

    let mut tweens = Vec::new();
    if !reduced {
        for lp in &config.loops {
            for target in document.query(&lp.selector) {
                let distance = target.scroll_width() * lp.distance_fraction;
                tweens.push(shared.animator.to(
                    &[target],
                    Props::new().x(-distance),
                    lp.tween_options(),
                ));
            }
        }
    }

    let timeline = config.intro.as_ref().map(|intro| {
        let mut timeline = Timeline::new();
        for step in &intro.steps {
            timeline.from_to(
                document.query(&step.selector),
                step.from,
                step.to,
                step.tween_options(),
                step.position,
            );
        }
        timeline.play(&shared.animator)
    });

    if !reduced {
        if let Some(cursor) = &config.cursor {
            let dot = document.query_first(&cursor.dot);
            let ring = document.query_first(&cursor.ring);
            if let (Some(dot), Some(ring)) = (dot, ring) {
                let follower =
                    PointerFollower::new(&shared.animator, &dot, &ring, cursor.clone(), pointer);
                if let Ok(mut slot) = shared.follower.lock() {
                    *slot = follower;
                }
            }
        }

        if let Some(magnetic) = &config.magnetic {
            let buttons = document.query(&magnetic.selector);
            let labels = magnetic
                .label
                .as_ref()
                .map(|label| document.query(label))
                .unwrap_or_default();
            if buttons.is_empty() {
                tracing::debug!("Coordinator: no magnetic buttons for `{}`", magnetic.selector);
            } else if let Ok(mut slot) = shared.magnetic.lock() {
                *slot = MagneticField::new(&buttons, &labels, magnetic.clone(), pointer);
            }
        }
    }
    shared.sync_max_scroll();

    let refresh_call = {
        let weak = Arc::downgrade(shared);
        clock.delayed_call(config.refresh_delay_ms, move || {
            if let Some(shared) = weak.upgrade() {
                shared.registry.refresh_all();
                shared.emit(CoordinatorEvent::Refreshed);
            }
        })?
    };

    coordinator.with_lifecycle(|lc| {
        lc.triggers = triggers;
        lc.tweens = tweens;
        lc.timeline = timeline;
        lc.refresh_call = Some(refresh_call);
    });

    tracing::debug!(
        "Coordinator: mounted ({} triggers, reduced motion: {})",
        shared.registry.len(),
        reduced
    );
    Ok(coordinator)
}

/// Scroll step first, trigger evaluation second; the animator registers
/// after both
///
/// Evaluation also carries pin spacing over to the scroll limit whenever the
/// registry has re-measured.
fn register_frame_callbacks(
    clock: &FrameClock,
    scroll: &Arc<dyn ScrollSource>,
    registry: &TriggerRegistry,
    document: &Arc<Document>,
    ids: &mut Vec<CallbackId>,
) -> Result<()> {
    let stepped = Arc::clone(scroll);
    ids.push(clock.add(move |time| {
        stepped.advance(time.delta_ms, time.now_ms);
    })?);

    let observed = Arc::clone(scroll);
    let registry = registry.clone();
    let document = Arc::clone(document);
    let mut measured = None;
    ids.push(clock.add(move |_| {
        registry.evaluate(&observed.state());
        let revision = registry.revision();
        if measured != Some(revision) {
            measured = Some(revision);
            let max = document.max_scroll(registry.viewport()) + registry.pin_spacing();
            observed.set_max_scroll(max);
        }
    })?);
    Ok(())
}

fn mount_reveal(shared: &Arc<Shared>, reveal: &RevealConfig, reduced: bool, bag: &mut DisposeBag) {
    let targets = shared.document.query(&reveal.selector);
    if targets.is_empty() {
        tracing::debug!("Coordinator: no elements for reveal `{}`", reveal.selector);
        return;
    }
    // A shared trigger that never renders would leave the targets hidden
    let trigger_el = match &reveal.trigger {
        Some(selector) => match shared.document.query_first(selector) {
            Some(el) => Some(el),
            None => {
                tracing::debug!("Coordinator: reveal trigger `{}` not found", selector);
                return;
            }
        },
        None => None,
    };

    let from = if reduced {
        reveal.from.opacity_only()
    } else {
        reveal.from
    };
    shared.animator.set(&targets, from);

    let fire = |targets: Vec<WeakElement>| {
        let weak: Weak<Shared> = Arc::downgrade(shared);
        let selector = reveal.selector.clone();
        let (from, to, options) = (reveal.from, reveal.to, reveal.tween_options());
        move |_: Direction| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let targets: Vec<ElementHandle> = targets.iter().filter_map(Weak::upgrade).collect();
            shared.animator.tween(&targets, from, to, options);
            shared.emit(CoordinatorEvent::Revealed {
                selector: selector.clone(),
                offset: shared.scroll.state().smoothed_offset,
            });
        }
    };

    match trigger_el {
        Some(trigger_el) => {
            let weak_targets = targets.iter().map(|t| t.downgrade()).collect();
            let entry = shared.registry.register(
                TriggerSpec::one_shot(Some(&trigger_el), reveal.start)
                    .on_enter(fire(weak_targets)),
            );
            bag.push(entry.into_disposer());
        }
        None => {
            for target in &targets {
                let entry = shared.registry.register(
                    TriggerSpec::one_shot(Some(target), reveal.start)
                        .on_enter(fire(vec![target.downgrade()])),
                );
                bag.push(entry.into_disposer());
            }
        }
    }
}

impl Coordinator {
    fn with_lifecycle(&self, f: impl FnOnce(&mut Lifecycle)) {
        if let Ok(mut lc) = self.shared.lifecycle.lock() {
            f(&mut lc);
        }
    }

    pub fn on_wheel(&self, delta_y: f32) -> bool {
        self.shared.scroll.input(ScrollInput::Wheel { delta_y })
    }

    pub fn on_touch(&self, delta_y: f32) -> bool {
        self.shared.scroll.input(ScrollInput::Touch { delta_y })
    }

    pub fn on_key_scroll(&self, delta_y: f32) -> bool {
        self.shared.scroll.input(ScrollInput::Keyboard { delta_y })
    }

    /// The platform scroller moved to `offset`
    pub fn on_native_scroll(&self, offset: f32) -> bool {
        self.shared.scroll.input(ScrollInput::Native { offset })
    }

    /// Viewport size changed; geometry and the scroll limit are re-measured
    /// before the next frame evaluates triggers
    pub fn on_resize(&self, viewport: Viewport) {
        if let Ok(mut vp) = self.shared.viewport.lock() {
            *vp = viewport;
        }
        self.shared.registry.set_viewport(viewport);
    }

    /// Late layout change (web fonts, images)
    pub fn on_fonts_loaded(&self) {
        self.shared.registry.invalidate();
    }

    /// Pointer moved to client position `(x, y)`
    pub fn on_pointer_move(&self, x: f32, y: f32) {
        let shared = &self.shared;
        if let Ok(follower) = shared.follower.lock() {
            if let Some(follower) = follower.as_ref() {
                follower.on_pointer_move(&shared.animator, x, y);
            }
        }
        if let Ok(mut magnetic) = shared.magnetic.lock() {
            if let Some(magnetic) = magnetic.as_mut() {
                let offset = shared.scroll.state().smoothed_offset;
                let registry = &shared.registry;
                magnetic.on_pointer_move(&shared.animator, x, y, |rect: Rect| {
                    rect.offset_y(registry.spacing_before(rect.top()) - offset)
                });
            }
        }
    }

    /// Pointer left the page
    pub fn on_pointer_leave(&self) {
        if let Ok(mut magnetic) = self.shared.magnetic.lock() {
            if let Some(magnetic) = magnetic.as_mut() {
                magnetic.on_pointer_leave(&self.shared.animator);
            }
        }
    }

    /// Animate to the top of the first element matching `selector`
    ///
    /// Sections below a pinned section sit further down by its spacing.
    /// Returns `false` when nothing matches.
    pub fn scroll_to_selector(&self, selector: &str) -> bool {
        match self.shared.document.query_first(selector) {
            Some(el) => {
                let top = el.layout().top();
                self.scroll_to(top + self.shared.registry.spacing_before(top));
                true
            }
            None => false,
        }
    }

    pub fn scroll_to(&self, offset: f32) {
        self.shared
            .scroll
            .scroll_to(offset, self.shared.scroll_duration_ms);
    }

    pub fn state(&self) -> ScrollState {
        self.shared.scroll.state()
    }

    pub fn viewport(&self) -> Viewport {
        self.shared
            .viewport
            .lock()
            .map(|vp| *vp)
            .unwrap_or_default()
    }

    pub fn registry(&self) -> &TriggerRegistry {
        &self.shared.registry
    }

    pub fn animator(&self) -> &Animator {
        &self.shared.animator
    }

    pub fn scroll(&self) -> &Arc<dyn ScrollSource> {
        &self.shared.scroll
    }

    pub fn has_pointer_follower(&self) -> bool {
        self.shared
            .follower
            .lock()
            .map(|f| f.is_some())
            .unwrap_or(false)
    }

    /// Number of magnetic buttons tracking the pointer
    pub fn magnetic_buttons(&self) -> usize {
        self.shared
            .magnetic
            .lock()
            .map(|m| m.as_ref().map_or(0, MagneticField::len))
            .unwrap_or(0)
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared
            .lifecycle
            .lock()
            .map(|lc| lc.torn_down)
            .unwrap_or(true)
    }

    /// Release everything this mount created. Later calls do nothing.
    pub fn teardown(&self) -> TeardownReport {
        let mut lifecycle = match self.shared.lifecycle.lock() {
            Ok(mut lc) if !lc.torn_down => {
                let taken = std::mem::take(&mut *lc);
                lc.torn_down = true;
                taken
            }
            _ => return TeardownReport::default(),
        };

        let shared = &self.shared;
        let mut report = TeardownReport::default();
        let mut step = |s: TeardownStep| {
            tracing::debug!("Coordinator: teardown {:?}", s);
            shared.emit(CoordinatorEvent::Teardown(s));
            report.steps.push(s);
        };

        if let Some(id) = lifecycle.refresh_call.take() {
            shared.clock.remove(id);
        }
        step(TeardownStep::CancelRefresh);

        for id in lifecycle.clock_callbacks.drain(..) {
            shared.clock.remove(id);
        }
        shared.animator.detach_from_clock();
        step(TeardownStep::RemoveClockCallbacks);

        lifecycle.triggers.dispose_all();
        shared.registry.dispose_all();
        step(TeardownStep::DisposeTriggers);

        for tween in lifecycle.tweens.drain(..) {
            tween.cancel();
        }
        if let Some(timeline) = lifecycle.timeline.take() {
            timeline.cancel();
        }
        shared.animator.cancel_all();
        if let Ok(mut follower) = shared.follower.lock() {
            *follower = None;
        }
        if let Ok(mut magnetic) = shared.magnetic.lock() {
            *magnetic = None;
        }
        step(TeardownStep::CancelTweens);

        shared.scroll.dispose();
        step(TeardownStep::ReleaseScroll);

        report
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}
