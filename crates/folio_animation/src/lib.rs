//! Folio Animation
//!
//! Time-based motion for the Folio page runtime:
//!
//! - **Frame clock**: one shared ticker with pluggable drivers
//! - **Scroll emulation**: critically damped inertial scrolling and its
//!   reduced-motion counterpart
//! - **Tweens**: staggered property tweens with per-property ownership
//! - **Timelines**: overlapping tween sequences
//! - **Easing**: named curves that parse from page configuration
//!
//! Everything runs on the caller-provided [`FrameClock`]. Within a frame
//! callbacks run in registration order, so registering the scroll emulator
//! first guarantees every later callback sees the same scroll state.

pub mod clock;
pub mod easing;
pub mod error;
pub mod scroll;
pub mod timeline;
pub mod tween;

pub use clock::{
    CallbackId, ClockHandle, FrameClock, FrameDriver, FrameTime, ManualDriver, ThreadDriver,
    DEFAULT_ADJUSTED_LAG_MS, DEFAULT_LAG_THRESHOLD_MS,
};
pub use easing::{EaseDirection, Easing, ParseEasingError};
pub use error::{ClockError, Result};
pub use scroll::{
    InertialScroll, ListenerId, NativeScroll, ScrollInput, ScrollListener, ScrollSource,
    ScrollState, SmoothScroll, SmoothScrollConfig,
};
pub use timeline::{ParsePositionError, Position, Timeline, TimelineHandle};
pub use tween::{Animator, Repeat, TweenHandle, TweenId, TweenOptions};
