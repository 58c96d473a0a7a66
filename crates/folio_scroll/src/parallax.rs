//! Parallax scrub
//!
//! Maps progress through a trigger element's scroll window onto a property
//! range of other elements, e.g. a hero background drifting down
//! (`y_percent` 0 → 30) while the hero scrolls out of view.

use folio_animation::Easing;
use folio_core::{ElementHandle, Property};

use crate::position::TriggerPosition;
use crate::trigger::{Trigger, TriggerEnd, TriggerRegistry, TriggerSpec};

/// A property range driven by scroll progress
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParallaxRange {
    pub property: Property,
    pub from: f32,
    pub to: f32,
    pub easing: Easing,
}

impl ParallaxRange {
    pub fn value_at(&self, t: f32) -> f32 {
        self.from + (self.to - self.from) * self.easing.apply(t)
    }
}

/// Scrub `targets` through `range` while `trigger` passes from `start` to `end`
pub fn mount_parallax(
    registry: &TriggerRegistry,
    trigger: Option<&ElementHandle>,
    targets: &[ElementHandle],
    range: ParallaxRange,
    start: TriggerPosition,
    end: TriggerPosition,
) -> Trigger {
    let targets: Vec<_> = targets.iter().map(|t| t.downgrade()).collect();
    let spec = TriggerSpec::scrub(trigger, start, TriggerEnd::Position(end)).on_progress(
        move |t, _| {
            let value = range.value_at(t);
            for target in targets.iter().filter_map(|w| w.upgrade()) {
                target.set_property(range.property, value);
            }
        },
    );
    registry.register(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_animation::ScrollState;
    use folio_core::{Element, Rect, Viewport};

    #[test]
    fn test_hero_blob_drifts() {
        let registry = TriggerRegistry::new(Viewport::new(1280.0, 900.0));
        let hero = Element::builder()
            .id("hero")
            .layout(Rect::new(0.0, 0.0, 1280.0, 900.0))
            .build();
        let blob = Element::builder().class("hero-bg-blob").build();

        mount_parallax(
            &registry,
            Some(&hero),
            &[blob.clone()],
            ParallaxRange {
                property: Property::YPercent,
                from: 0.0,
                to: 30.0,
                easing: Easing::Linear,
            },
            TriggerPosition::TOP_TOP,
            TriggerPosition::BOTTOM_TOP,
        );

        for (offset, expected) in [(0.0, 0.0), (450.0, 15.0), (900.0, 30.0), (2000.0, 30.0)] {
            registry.evaluate(&ScrollState {
                smoothed_offset: offset,
                raw_offset: offset,
                ..Default::default()
            });
            assert!((blob.style().y_percent - expected).abs() < 1e-4, "at {offset}");
        }
    }
}
