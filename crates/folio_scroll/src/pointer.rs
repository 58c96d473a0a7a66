//! Pointer follower
//!
//! A small dot that tracks the pointer almost instantly and a larger ring
//! that trails behind it. Each move restarts both tweens; because the newest
//! tween owns `x`/`y`, a fast pointer simply retargets the motion.
//! Coarse (touch) pointers get no follower at all.
//!
//! [`MagneticField`] handles buttons that lean toward the pointer while it
//! hovers them and spring back once it leaves.

use folio_animation::{Animator, TweenOptions};
use folio_core::{ElementHandle, Property, Props, Rect, WeakElement};

use crate::config::{CursorConfig, MagneticConfig};

/// What kind of pointer the host reports
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerKind {
    #[default]
    Fine,
    Coarse,
}

/// Dot-and-ring pointer follower
#[derive(Debug)]
pub struct PointerFollower {
    dot: WeakElement,
    ring: WeakElement,
    config: CursorConfig,
}

impl PointerFollower {
    /// Centre both elements on the pointer and start following
    ///
    /// Returns `None` for coarse pointers.
    pub fn new(
        animator: &Animator,
        dot: &ElementHandle,
        ring: &ElementHandle,
        config: CursorConfig,
        pointer: PointerKind,
    ) -> Option<Self> {
        if pointer == PointerKind::Coarse {
            tracing::debug!("PointerFollower: coarse pointer, follower disabled");
            return None;
        }

        let centred = Props::new()
            .with(Property::XPercent, -50.0)
            .y_percent(-50.0);
        animator.set(&[dot.clone(), ring.clone()], centred);

        Some(Self {
            dot: dot.downgrade(),
            ring: ring.downgrade(),
            config,
        })
    }

    /// Retarget both elements at the pointer position
    pub fn on_pointer_move(&self, animator: &Animator, x: f32, y: f32) {
        let target = Props::new().x(x).y(y);
        if let Some(dot) = self.dot.upgrade() {
            animator.to(
                &[dot],
                target,
                TweenOptions::with_duration(self.config.dot_duration_ms),
            );
        }
        if let Some(ring) = self.ring.upgrade() {
            animator.to(
                &[ring],
                target,
                TweenOptions::with_duration(self.config.ring_duration_ms)
                    .easing(self.config.ring_easing),
            );
        }
    }

    pub fn config(&self) -> &CursorConfig {
        &self.config
    }
}

#[derive(Debug)]
struct MagneticButton {
    button: WeakElement,
    label: Option<WeakElement>,
    hovered: bool,
}

/// Buttons pulled toward the pointer
///
/// Hover is decided from the buttons' untransformed layout, so a button that
/// has already leaned toward the pointer does not move its own hit area.
#[derive(Debug)]
pub struct MagneticField {
    buttons: Vec<MagneticButton>,
    config: MagneticConfig,
}

impl MagneticField {
    /// Pair each button with the first label whose centre lies inside it
    ///
    /// Returns `None` for coarse pointers.
    pub fn new(
        buttons: &[ElementHandle],
        labels: &[ElementHandle],
        config: MagneticConfig,
        pointer: PointerKind,
    ) -> Option<Self> {
        if pointer == PointerKind::Coarse {
            tracing::debug!("MagneticField: coarse pointer, magnetic buttons disabled");
            return None;
        }

        let buttons = buttons
            .iter()
            .map(|button| {
                let bounds = button.layout();
                let label = labels.iter().find(|label| {
                    let (cx, cy) = label.layout().center();
                    bounds.contains(cx, cy)
                });
                MagneticButton {
                    button: button.downgrade(),
                    label: label.map(|l| l.downgrade()),
                    hovered: false,
                }
            })
            .collect();
        Some(Self { buttons, config })
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    /// Number of buttons currently under the pointer
    pub fn hovered(&self) -> usize {
        self.buttons.iter().filter(|b| b.hovered).count()
    }

    /// Lean hovered buttons toward `(x, y)` and release the ones the pointer
    /// has left
    ///
    /// `to_client` maps a document-space layout into the pointer's space.
    pub fn on_pointer_move(
        &mut self,
        animator: &Animator,
        x: f32,
        y: f32,
        to_client: impl Fn(Rect) -> Rect,
    ) {
        let config = &self.config;
        for entry in &mut self.buttons {
            let Some(button) = entry.button.upgrade() else {
                entry.hovered = false;
                continue;
            };
            let bounds = to_client(button.layout());
            if !bounds.contains(x, y) {
                if entry.hovered {
                    entry.hovered = false;
                    release(animator, config, &button, entry.label.as_ref());
                }
                continue;
            }

            entry.hovered = true;
            let (cx, cy) = bounds.center();
            let (dx, dy) = (x - cx, y - cy);
            animator.to(
                &[button],
                Props::new()
                    .x(dx * config.strength)
                    .y(dy * config.strength),
                config.follow_options(),
            );
            if let Some(label) = entry.label.as_ref().and_then(|l| l.upgrade()) {
                animator.to(
                    &[label],
                    Props::new()
                        .x(dx * config.label_strength)
                        .y(dy * config.label_strength),
                    config.follow_options(),
                );
            }
        }
    }

    /// The pointer left the page: spring every hovered button back
    pub fn on_pointer_leave(&mut self, animator: &Animator) {
        let config = &self.config;
        for entry in &mut self.buttons {
            if !std::mem::take(&mut entry.hovered) {
                continue;
            }
            if let Some(button) = entry.button.upgrade() {
                release(animator, config, &button, entry.label.as_ref());
            }
        }
    }

    pub fn config(&self) -> &MagneticConfig {
        &self.config
    }
}

fn release(
    animator: &Animator,
    config: &MagneticConfig,
    button: &ElementHandle,
    label: Option<&WeakElement>,
) {
    let home = Props::new().x(0.0).y(0.0);
    animator.to(&[button.clone()], home, config.release_options());
    if let Some(label) = label.and_then(|l| l.upgrade()) {
        animator.to(&[label], home, config.release_options());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Element;

    #[test]
    fn test_ring_trails_dot() {
        let animator = Animator::manual();
        let dot = Element::builder().id("cursor-dot").build();
        let ring = Element::builder().id("cursor-ring").build();
        let follower = PointerFollower::new(
            &animator,
            &dot,
            &ring,
            CursorConfig::default(),
            PointerKind::Fine,
        )
        .unwrap();
        assert_eq!(dot.style().x_percent, -50.0);

        follower.on_pointer_move(&animator, 400.0, 300.0);
        animator.tick(100.0);
        assert_eq!(dot.style().x, 400.0);
        assert!(ring.style().x > 0.0 && ring.style().x < 400.0);

        for _ in 0..40 {
            animator.tick(16.0);
        }
        assert_eq!(ring.style().x, 400.0);
        assert_eq!(ring.style().y, 300.0);
    }

    #[test]
    fn test_new_move_retargets() {
        let animator = Animator::manual();
        let dot = Element::builder().build();
        let ring = Element::builder().build();
        let follower =
            PointerFollower::new(&animator, &dot, &ring, CursorConfig::default(), PointerKind::Fine)
                .unwrap();

        follower.on_pointer_move(&animator, 400.0, 0.0);
        animator.tick(50.0);
        follower.on_pointer_move(&animator, -100.0, 0.0);
        animator.tick(16.0);
        assert_eq!(animator.active_count(), 2);
        animator.tick(1000.0);
        assert_eq!(dot.style().x, -100.0);
        assert_eq!(ring.style().x, -100.0);
    }

    #[test]
    fn test_coarse_pointer_disabled() {
        let animator = Animator::manual();
        let dot = Element::builder().build();
        let ring = Element::builder().build();
        assert!(PointerFollower::new(
            &animator,
            &dot,
            &ring,
            CursorConfig::default(),
            PointerKind::Coarse
        )
        .is_none());
        assert_eq!(dot.style().x_percent, 0.0);
    }

    fn magnetic() -> (ElementHandle, ElementHandle, MagneticField) {
        let button = Element::builder()
            .class("magnetic")
            .layout(Rect::new(100.0, 1000.0, 200.0, 60.0))
            .build();
        let label = Element::builder()
            .class("magnetic-label")
            .layout(Rect::new(150.0, 1015.0, 100.0, 30.0))
            .build();
        let stray = Element::builder()
            .class("magnetic-label")
            .layout(Rect::new(900.0, 1015.0, 100.0, 30.0))
            .build();
        let field = MagneticField::new(
            &[button.clone()],
            &[stray, label.clone()],
            MagneticConfig::default(),
            PointerKind::Fine,
        )
        .unwrap();
        (button, label, field)
    }

    #[test]
    fn test_button_leans_toward_pointer() {
        let animator = Animator::manual();
        let (button, label, mut field) = magnetic();
        // Page scrolled by 900: the button sits at client y 100..160
        let to_client = |r: Rect| r.offset_y(-900.0);

        field.on_pointer_move(&animator, 250.0, 140.0, to_client);
        assert_eq!(field.hovered(), 1);
        animator.tick(150.0);
        assert!(button.style().x > 0.0 && button.style().x < 10.0);
        animator.tick(200.0);

        assert_eq!(button.style().x, 10.0);
        assert_eq!(button.style().y, 2.0);
        assert_eq!(label.style().x, 5.0);
        assert_eq!(label.style().y, 1.0);
    }

    #[test]
    fn test_leaving_springs_back() {
        let animator = Animator::manual();
        let (button, label, mut field) = magnetic();
        let to_client = |r: Rect| r.offset_y(-900.0);

        field.on_pointer_move(&animator, 150.0, 110.0, to_client);
        animator.tick(400.0);
        assert_eq!(button.style().x, -10.0);

        field.on_pointer_leave(&animator);
        assert_eq!(field.hovered(), 0);
        animator.tick(100.0);
        // elastic release overshoots home before settling
        assert!(button.style().x > 0.0);
        animator.tick(500.0);
        assert_eq!(button.style().x, 0.0);
        assert_eq!(button.style().y, 0.0);
        assert_eq!(label.style().x, 0.0);
    }

    #[test]
    fn test_moving_off_the_button_releases_it() {
        let animator = Animator::manual();
        let (button, _label, mut field) = magnetic();
        let to_client = |r: Rect| r.offset_y(-900.0);

        field.on_pointer_move(&animator, 290.0, 150.0, to_client);
        animator.tick(400.0);
        assert_eq!(button.style().x, 18.0);

        field.on_pointer_move(&animator, 600.0, 150.0, to_client);
        assert_eq!(field.hovered(), 0);
        animator.tick(600.0);
        assert_eq!(button.style().x, 0.0);

        // Away from every button nothing is tweened
        field.on_pointer_move(&animator, 600.0, 400.0, to_client);
        assert_eq!(animator.active_count(), 0);
    }

    #[test]
    fn test_magnetic_coarse_pointer_disabled() {
        let button = Element::builder().build();
        assert!(MagneticField::new(
            &[button],
            &[],
            MagneticConfig::default(),
            PointerKind::Coarse
        )
        .is_none());
    }
}
