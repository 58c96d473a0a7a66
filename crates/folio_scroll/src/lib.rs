//! Folio Scroll
//!
//! Scroll-position driven behaviour for the Folio page runtime:
//!
//! - **Trigger registry**: one-shot reveals, scrubbed ranges and pinned
//!   sections, evaluated once per frame against the smoothed offset; pins
//!   push later content down by the distance they hold
//! - **Gallery**: a pinned section whose strip slides horizontally,
//!   optionally lagging behind the scroll position
//! - **Parallax**: property ranges scrubbed by scroll progress
//! - **Pointer**: a dot with a trailing ring, and magnetic buttons
//! - **Coordinator**: mounts all of the above for a page and tears it down
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use folio_animation::{FrameClock, ManualDriver};
//! use folio_core::{Document, Element, Rect, Viewport};
//! use folio_scroll::{mount_animation_coordinator, CoordinatorConfig, PageEnv, RevealConfig};
//!
//! let document = Document::new_shared();
//! document.insert(
//!     Element::builder()
//!         .class("reveal")
//!         .layout(Rect::new(0.0, 2000.0, 800.0, 300.0))
//!         .build(),
//! );
//!
//! let driver = ManualDriver::new();
//! let clock = FrameClock::new(driver.clone());
//! let config = CoordinatorConfig {
//!     reveals: vec![RevealConfig {
//!         selector: ".reveal".into(),
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//!
//! let env = PageEnv::new(document, Viewport::new(1280.0, 1000.0), clock);
//! let coordinator = mount_animation_coordinator(config, env).unwrap();
//! assert_eq!(coordinator.registry().len(), 1);
//! coordinator.teardown();
//! assert!(coordinator.registry().is_empty());
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod gallery;
pub mod parallax;
pub mod pointer;
pub mod position;
pub mod trigger;

pub use config::{
    CoordinatorConfig, CursorConfig, GalleryConfig, IntroConfig, IntroStep, LoopConfig,
    MagneticConfig, ParallaxConfig, RevealConfig, DEFAULT_REFRESH_DELAY_MS,
};
pub use coordinator::{
    mount_animation_coordinator, Coordinator, CoordinatorEvent, EventSink, PageEnv,
    TeardownReport, TeardownStep,
};
pub use error::{CoordinatorError, Result};
pub use gallery::{gallery_distance, mount_gallery, StripMotion};
pub use parallax::{mount_parallax, ParallaxRange};
pub use pointer::{MagneticField, PointerFollower, PointerKind};
pub use position::{Anchor, TriggerPosition};
pub use trigger::{
    Direction, Extent, MeasureFn, PinGeometry, Trigger, TriggerEnd, TriggerEvent, TriggerId,
    TriggerMode, TriggerRegistry, TriggerSpec,
};
