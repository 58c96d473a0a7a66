//! Folio Core
//!
//! Foundational primitives shared by the Folio animation crates:
//!
//! - **Geometry**: document-space rectangles and the viewport
//! - **Elements**: shared element handles with layout and a mutable visual style
//! - **Document**: an ordered element collection queried by selector
//! - **Disposers**: idempotent release handles and dispose bags
//!
//! The animation core never owns page elements. Page code holds
//! [`ElementHandle`]s; registries and animators hold [`WeakElement`]s and
//! treat a dropped or detached element as a no-op.
//!
//! # Example
//!
//! ```rust
//! use folio_core::{Document, Element, Property, Rect};
//!
//! let doc = Document::new();
//! let card = doc.insert(
//!     Element::builder()
//!         .class("service-card")
//!         .layout(Rect::new(0.0, 2000.0, 400.0, 300.0))
//!         .build(),
//! );
//!
//! assert_eq!(doc.query(".service-card").len(), 1);
//! card.set_property(Property::Opacity, 0.0);
//! assert_eq!(card.style().opacity, 0.0);
//! ```

pub mod dispose;
pub mod document;
pub mod element;
pub mod error;
pub mod geometry;
pub mod selector;
pub mod style;

pub use dispose::{DisposeBag, Disposer};
pub use document::Document;
pub use element::{Element, ElementBuilder, ElementHandle, ElementId, WeakElement};
pub use error::{CoreError, Result};
pub use geometry::{Rect, Viewport};
pub use selector::Selector;
pub use style::{Property, Props, VisualStyle};
