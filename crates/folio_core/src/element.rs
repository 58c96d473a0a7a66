//! Element handles
//!
//! An [`Element`] is the headless stand-in for a page node: it carries an
//! optional `#id`, a class list, its document-space layout, the intrinsic
//! width of its content, and the visual style animations write to.
//!
//! Page code owns elements through [`ElementHandle`]; the animation core only
//! keeps [`WeakElement`]s so it never extends an element's lifetime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use smallvec::SmallVec;

use crate::geometry::Rect;
use crate::style::{Property, Props, VisualStyle};

/// Shared owning handle to an element
pub type ElementHandle = Arc<Element>;

/// Non-owning reference held by registries and animators
pub type WeakElement = Weak<Element>;

/// Process-unique element identity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ElementId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct ElementState {
    layout: Rect,
    /// Width of the content, which may exceed the layout width
    scroll_width: Option<f32>,
    attached: bool,
    style: VisualStyle,
}

/// A page element with geometry and animatable style
#[derive(Debug)]
pub struct Element {
    id: ElementId,
    dom_id: Option<String>,
    classes: SmallVec<[String; 4]>,
    state: Mutex<ElementState>,
}

impl Element {
    pub fn builder() -> ElementBuilder {
        ElementBuilder::default()
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// The `#id` attribute, if any
    pub fn dom_id(&self) -> Option<&str> {
        self.dom_id.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Layout rectangle in document coordinates
    ///
    /// A poisoned element reports an empty rect, which every consumer treats
    /// as degenerate geometry.
    pub fn layout(&self) -> Rect {
        self.state.lock().map(|s| s.layout).unwrap_or(Rect::ZERO)
    }

    pub fn set_layout(&self, layout: Rect) {
        if let Ok(mut state) = self.state.lock() {
            state.layout = layout;
        }
    }

    /// Intrinsic content width (defaults to the layout width)
    pub fn scroll_width(&self) -> f32 {
        self.state
            .lock()
            .map(|s| s.scroll_width.unwrap_or(s.layout.width))
            .unwrap_or(0.0)
    }

    pub fn set_scroll_width(&self, width: f32) {
        if let Ok(mut state) = self.state.lock() {
            state.scroll_width = Some(width);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.state.lock().map(|s| s.attached).unwrap_or(false)
    }

    /// Mark the element as removed from the document
    pub fn detach(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.attached = false;
        }
    }

    pub fn attach(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.attached = true;
        }
    }

    /// Snapshot of the current visual style
    pub fn style(&self) -> VisualStyle {
        self.state.lock().map(|s| s.style).unwrap_or_default()
    }

    pub fn property(&self, property: Property) -> f32 {
        self.style().get(property)
    }

    pub fn set_property(&self, property: Property, value: f32) {
        if let Ok(mut state) = self.state.lock() {
            state.style.set(property, value);
        }
    }

    /// Apply every property present in `props`
    pub fn apply(&self, props: &Props) {
        if let Ok(mut state) = self.state.lock() {
            for (property, value) in props.iter() {
                state.style.set(property, value);
            }
        }
    }

    pub fn downgrade(self: &Arc<Self>) -> WeakElement {
        Arc::downgrade(self)
    }
}

/// Builder for [`Element`]
#[derive(Debug, Default)]
pub struct ElementBuilder {
    dom_id: Option<String>,
    classes: SmallVec<[String; 4]>,
    layout: Rect,
    scroll_width: Option<f32>,
    style: VisualStyle,
}

impl ElementBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.dom_id = Some(id.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn layout(mut self, layout: Rect) -> Self {
        self.layout = layout;
        self
    }

    pub fn scroll_width(mut self, width: f32) -> Self {
        self.scroll_width = Some(width);
        self
    }

    pub fn style(mut self, style: VisualStyle) -> Self {
        self.style = style;
        self
    }

    pub fn build(self) -> ElementHandle {
        Arc::new(Element {
            id: ElementId::next(),
            dom_id: self.dom_id,
            classes: self.classes,
            state: Mutex::new(ElementState {
                layout: self.layout,
                scroll_width: self.scroll_width,
                attached: true,
                style: self.style,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = Element::builder().build();
        let b = Element::builder().build();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_scroll_width_defaults_to_layout() {
        let el = Element::builder()
            .layout(Rect::new(0.0, 0.0, 1000.0, 500.0))
            .build();
        assert_eq!(el.scroll_width(), 1000.0);
        el.set_scroll_width(3000.0);
        assert_eq!(el.scroll_width(), 3000.0);
    }

    #[test]
    fn test_weak_reference_does_not_keep_alive() {
        let el = Element::builder().class("card").build();
        let weak = el.downgrade();
        assert!(weak.upgrade().is_some());
        drop(el);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_apply_props() {
        let el = Element::builder().build();
        el.apply(&Props::new().y(50.0).opacity(0.0));
        let style = el.style();
        assert_eq!(style.y, 50.0);
        assert_eq!(style.opacity, 0.0);
        assert_eq!(style.scale, 1.0);
    }

    #[test]
    fn test_detach() {
        let el = Element::builder().build();
        assert!(el.is_attached());
        el.detach();
        assert!(!el.is_attached());
    }
}
