//! Headless document
//!
//! An ordered list of elements standing in for the page. Queries return
//! elements in insertion (document) order; an unknown or malformed selector
//! yields no matches instead of an error, since sections render
//! conditionally.

use std::sync::{Arc, RwLock};

use crate::element::{ElementHandle, ElementId};
use crate::geometry::{Rect, Viewport};
use crate::selector::Selector;

/// Ordered collection of page elements
#[derive(Debug, Default)]
pub struct Document {
    elements: RwLock<Vec<ElementHandle>>,
    /// Explicit document height; derived from element bounds when unset
    height: RwLock<Option<f32>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Append an element and return its handle
    pub fn insert(&self, element: ElementHandle) -> ElementHandle {
        element.attach();
        if let Ok(mut elements) = self.elements.write() {
            elements.push(Arc::clone(&element));
        }
        element
    }

    /// Remove an element; outstanding handles see it as detached
    pub fn remove(&self, id: ElementId) -> Option<ElementHandle> {
        let mut elements = self.elements.write().ok()?;
        let index = elements.iter().position(|e| e.id() == id)?;
        let element = elements.remove(index);
        element.detach();
        Some(element)
    }

    pub fn len(&self) -> usize {
        self.elements.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All elements matching a parsed selector, in document order
    pub fn select(&self, selector: &Selector) -> Vec<ElementHandle> {
        self.elements
            .read()
            .map(|elements| {
                elements
                    .iter()
                    .filter(|e| selector.matches(e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All elements matching a selector string
    ///
    /// Malformed selectors are logged and match nothing.
    pub fn query(&self, selector: &str) -> Vec<ElementHandle> {
        match Selector::parse(selector) {
            Ok(sel) => self.select(&sel),
            Err(err) => {
                tracing::warn!("{}", err);
                Vec::new()
            }
        }
    }

    pub fn query_first(&self, selector: &str) -> Option<ElementHandle> {
        self.query(selector).into_iter().next()
    }

    pub fn set_height(&self, height: f32) {
        if let Ok(mut h) = self.height.write() {
            *h = Some(height);
        }
    }

    /// Total document height
    pub fn height(&self) -> f32 {
        if let Some(h) = self.height.read().ok().and_then(|h| *h) {
            return h;
        }
        self.elements
            .read()
            .map(|elements| {
                elements
                    .iter()
                    .map(|e| e.layout())
                    .map(|r: Rect| r.bottom())
                    .fold(0.0_f32, f32::max)
            })
            .unwrap_or(0.0)
    }

    /// Largest reachable scroll offset for this document in `viewport`
    pub fn max_scroll(&self, viewport: Viewport) -> f32 {
        viewport.max_scroll(self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    fn doc() -> Document {
        let doc = Document::new();
        doc.insert(
            Element::builder()
                .id("hero")
                .layout(Rect::new(0.0, 0.0, 1280.0, 900.0))
                .build(),
        );
        for i in 0..3 {
            doc.insert(
                Element::builder()
                    .class("about-reveal")
                    .layout(Rect::new(0.0, 1500.0 + i as f32 * 100.0, 600.0, 80.0))
                    .build(),
            );
        }
        doc
    }

    #[test]
    fn test_query_in_document_order() {
        let doc = doc();
        let found = doc.query(".about-reveal");
        assert_eq!(found.len(), 3);
        assert!(found[0].layout().y < found[1].layout().y);
        assert!(doc.query_first("#hero").is_some());
    }

    #[test]
    fn test_bad_selector_matches_nothing() {
        let doc = doc();
        assert!(doc.query("section > div").is_empty());
        assert!(doc.query("#missing").is_empty());
    }

    #[test]
    fn test_height_from_bounds() {
        let doc = doc();
        assert_eq!(doc.height(), 1780.0);
        doc.set_height(5000.0);
        assert_eq!(doc.height(), 5000.0);
        assert_eq!(doc.max_scroll(Viewport::new(1000.0, 1000.0)), 4000.0);
    }

    #[test]
    fn test_remove_detaches() {
        let doc = doc();
        let hero = doc.query_first("#hero").unwrap();
        doc.remove(hero.id());
        assert!(!hero.is_attached());
        assert!(doc.query_first("#hero").is_none());
    }
}
