//! Tween sequencing
//!
//! A [`Timeline`] lays tweens out on a shared time axis. Each step is placed
//! after the previous step's end unless a [`Position`] says otherwise, which
//! is how overlapping entrance sequences are written:
//!
//! ```rust
//! use folio_animation::{Position, Timeline, TweenOptions};
//! use folio_core::{Element, Props};
//!
//! let title = Element::builder().class("hero-text-line").build();
//! let sub = Element::builder().class("hero-sub").build();
//!
//! let mut intro = Timeline::new();
//! intro
//!     .from_to(vec![title], Props::new().opacity(0.0), Props::new().opacity(1.0),
//!              TweenOptions::with_duration(1200.0), Position::Sequential)
//!     .from_to(vec![sub], Props::new().opacity(0.0), Props::new().opacity(1.0),
//!              TweenOptions::with_duration(1000.0), "-=0.5".parse().unwrap());
//!
//! assert_eq!(intro.duration_ms(), 1700.0);
//! ```

use std::fmt;
use std::str::FromStr;

use folio_core::{ElementHandle, Props};
use serde::{Deserialize, Serialize};

use crate::tween::{Animator, TweenHandle, TweenOptions};

/// Where a step starts relative to the timeline so far
///
/// Parses from `""` (after the previous end), `"+=0.2"` / `"-=0.5"`
/// (seconds relative to the previous end) and `"1.5"` (absolute seconds).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    #[default]
    Sequential,
    /// Milliseconds relative to the end of the timeline so far
    Relative(f32),
    /// Absolute start in milliseconds
    At(f32),
}

/// Failure to parse a timeline position
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timeline position `{0}`")]
pub struct ParsePositionError(pub String);

impl FromStr for Position {
    type Err = ParsePositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let err = || ParsePositionError(s.to_string());
        let seconds = |v: &str| -> Result<f32, ParsePositionError> {
            let v: f32 = v.trim().parse().map_err(|_| err())?;
            if v.is_finite() {
                Ok(v * 1000.0)
            } else {
                Err(err())
            }
        };

        if text.is_empty() || text == ">" {
            Ok(Position::Sequential)
        } else if let Some(rest) = text.strip_prefix("+=") {
            seconds(rest).map(Position::Relative)
        } else if let Some(rest) = text.strip_prefix("-=") {
            seconds(rest).map(|ms| Position::Relative(-ms))
        } else {
            seconds(text).map(|ms| Position::At(ms.max(0.0)))
        }
    }
}

impl TryFrom<String> for Position {
    type Error = ParsePositionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Position::Sequential => Ok(()),
            Position::Relative(ms) if ms < 0.0 => write!(f, "-={}", -ms / 1000.0),
            Position::Relative(ms) => write!(f, "+={}", ms / 1000.0),
            Position::At(ms) => write!(f, "{}", ms / 1000.0),
        }
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.to_string()
    }
}

struct TimelineStep {
    targets: Vec<ElementHandle>,
    from: Props,
    to: Props,
    options: TweenOptions,
    start_ms: f32,
}

/// An ordered set of tweens with resolved start times
#[derive(Default)]
pub struct Timeline {
    steps: Vec<TimelineStep>,
    end_ms: f32,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a from/to step at `position`
    ///
    /// Steps with no targets are dropped without moving the timeline's end.
    pub fn from_to(
        &mut self,
        targets: Vec<ElementHandle>,
        from: Props,
        to: Props,
        options: TweenOptions,
        position: Position,
    ) -> &mut Self {
        if targets.is_empty() {
            tracing::debug!("Timeline: step with no targets skipped");
            return self;
        }

        let start_ms = match position {
            Position::Sequential => self.end_ms,
            Position::Relative(ms) => (self.end_ms + ms).max(0.0),
            Position::At(ms) => ms,
        };
        let end = start_ms + options.total_duration(targets.len());
        self.end_ms = self.end_ms.max(end);

        self.steps.push(TimelineStep {
            targets,
            from,
            to,
            options,
            start_ms,
        });
        self
    }

    /// Start times of every step, in insertion order
    pub fn start_times(&self) -> Vec<f32> {
        self.steps.iter().map(|s| s.start_ms).collect()
    }

    /// Time until the last step finishes
    pub fn duration_ms(&self) -> f32 {
        self.end_ms
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Start every step on `animator`
    pub fn play(self, animator: &Animator) -> TimelineHandle {
        let tweens = self
            .steps
            .into_iter()
            .map(|step| {
                let options = step.options.delay(step.options.delay_ms + step.start_ms);
                animator.tween(&step.targets, step.from, step.to, options)
            })
            .collect();
        TimelineHandle { tweens }
    }
}

/// Handle to a playing timeline
#[derive(Clone, Debug, Default)]
pub struct TimelineHandle {
    tweens: Vec<TweenHandle>,
}

impl TimelineHandle {
    /// Cancel every step. Idempotent.
    pub fn cancel(&self) {
        for tween in &self.tweens {
            tween.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.tweens.iter().any(TweenHandle::is_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use folio_core::Element;

    fn els(class: &str, n: usize) -> Vec<ElementHandle> {
        (0..n).map(|_| Element::builder().class(class).build()).collect()
    }

    #[test]
    fn test_parse_positions() {
        assert_eq!("".parse::<Position>().unwrap(), Position::Sequential);
        assert_eq!("-=0.5".parse::<Position>().unwrap(), Position::Relative(-500.0));
        assert_eq!("+=0.25".parse::<Position>().unwrap(), Position::Relative(250.0));
        assert_eq!("1.5".parse::<Position>().unwrap(), Position::At(1500.0));
        assert!("soon".parse::<Position>().is_err());
        assert_eq!(Position::Relative(-800.0).to_string(), "-=0.8");
    }

    #[test]
    fn test_hero_intro_layout() {
        let mut tl = Timeline::new();
        tl.from_to(
            els("hero-text-line", 3),
            Props::new().y(100.0).opacity(0.0),
            Props::new().y(0.0).opacity(1.0),
            TweenOptions::with_duration(1200.0).stagger(150.0),
            Position::Sequential,
        )
        .from_to(
            els("hero-sub", 1),
            Props::new().opacity(0.0),
            Props::new().opacity(1.0),
            TweenOptions::with_duration(1000.0),
            Position::Relative(-500.0),
        )
        .from_to(
            els("hero-btn", 2),
            Props::new().scale(0.8),
            Props::new().scale(1.0),
            TweenOptions::default().stagger(100.0),
            Position::Relative(-800.0),
        )
        .from_to(
            els("hero-bg-blob", 1),
            Props::new().scale(0.5),
            Props::new().scale(1.0),
            TweenOptions::with_duration(2000.0),
            Position::Relative(-1500.0),
        );

        assert_eq!(tl.start_times(), vec![0.0, 1000.0, 1200.0, 500.0]);
        assert_eq!(tl.duration_ms(), 2500.0);
    }

    #[test]
    fn test_empty_step_skipped() {
        let mut tl = Timeline::new();
        tl.from_to(
            Vec::new(),
            Props::new(),
            Props::new().opacity(1.0),
            TweenOptions::default(),
            Position::Sequential,
        );
        assert!(tl.is_empty());
        assert_eq!(tl.duration_ms(), 0.0);
    }

    #[test]
    fn test_play_applies_from_and_offsets_steps() {
        let animator = Animator::manual();
        let first = els("a", 1);
        let second = els("b", 1);

        let mut tl = Timeline::new();
        tl.from_to(
            first.clone(),
            Props::new().opacity(0.0),
            Props::new().opacity(1.0),
            TweenOptions::with_duration(100.0).easing(Easing::Linear),
            Position::Sequential,
        )
        .from_to(
            second.clone(),
            Props::new().opacity(0.0),
            Props::new().opacity(1.0),
            TweenOptions::with_duration(100.0).easing(Easing::Linear),
            Position::Sequential,
        );
        let handle = tl.play(&animator);

        assert_eq!(second[0].style().opacity, 0.0);
        animator.tick(100.0);
        assert_eq!(first[0].style().opacity, 1.0);
        assert_eq!(second[0].style().opacity, 0.0);
        assert!(handle.is_active());

        animator.tick(50.0);
        assert!((second[0].style().opacity - 0.5).abs() < 1e-4);

        handle.cancel();
        handle.cancel();
        assert!(!handle.is_active());
    }
}
