//! Horizontal gallery
//!
//! A pinned section whose strip of cards slides sideways while the page
//! scrolls vertically. The pin lasts exactly as long as the strip's overflow:
//!
//! ```text
//! D = max(0, strip scroll width - viewport width)
//! ```
//!
//! and progress `t` through the pin sets the strip's `x` to `-t * D`. The
//! overflow is measured on every refresh, so a resize or late-loading images
//! change the pin length. A strip narrower than the viewport never pins.
//!
//! With [`StripMotion::Lagged`] the strip does not jump to its new `x`; each
//! progress update retargets a short ease-out tween instead, so the strip
//! catches up with the scroll position over `lag_ms`.

use std::sync::{Arc, Weak};

use folio_animation::{Animator, Easing, TweenOptions};
use folio_core::{ElementHandle, Property, Props, Viewport};

use crate::position::TriggerPosition;
use crate::trigger::{Extent, Trigger, TriggerEnd, TriggerRegistry, TriggerSpec};

/// Scroll distance needed to reveal all of a strip
pub fn gallery_distance(strip_width: f32, viewport_width: f32) -> f32 {
    (strip_width - viewport_width).max(0.0)
}

/// How the strip follows pin progress
#[derive(Clone, Debug, Default)]
pub enum StripMotion {
    /// `x` is set on every progress update
    #[default]
    Immediate,
    /// `x` is tweened toward each update over `lag_ms`
    Lagged {
        animator: Weak<Animator>,
        lag_ms: f32,
    },
}

impl StripMotion {
    /// Lagged when `lag_ms > 0`
    pub fn with_lag(animator: &Arc<Animator>, lag_ms: f32) -> Self {
        if lag_ms > 0.0 {
            StripMotion::Lagged {
                animator: Arc::downgrade(animator),
                lag_ms,
            }
        } else {
            StripMotion::Immediate
        }
    }

    fn apply(&self, strip: ElementHandle, x: f32) {
        match self {
            StripMotion::Immediate => strip.set_property(Property::X, x),
            StripMotion::Lagged { animator, lag_ms } => {
                if let Some(animator) = animator.upgrade() {
                    animator.to(
                        &[strip],
                        Props::new().x(x),
                        TweenOptions::with_duration(*lag_ms).easing(Easing::power3_out()),
                    );
                }
            }
        }
    }
}

/// Pin `section` and drive `strip` horizontally from `registry`
///
/// Returns a no-op registration when `section` is missing.
pub fn mount_gallery(
    registry: &TriggerRegistry,
    section: Option<&ElementHandle>,
    strip: &ElementHandle,
    start: TriggerPosition,
    motion: StripMotion,
) -> Trigger {
    let measured = strip.downgrade();
    let moved = strip.downgrade();

    let spec = TriggerSpec::pin(
        section,
        start,
        TriggerEnd::Measured(Arc::new(move |viewport: &Viewport| Extent {
            content: measured.upgrade().map(|s| s.scroll_width()).unwrap_or(0.0),
            container: viewport.width,
        })),
    )
    .on_progress(move |t, geometry| {
        if let Some(strip) = moved.upgrade() {
            motion.apply(strip, -t * geometry.scroll_distance);
        }
    });

    registry.register(spec)
}
