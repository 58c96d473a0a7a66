//! Trigger positions
//!
//! A position pairs a point on the element with a point on the viewport,
//! written as `"<element> <viewport>"`: `"top 80%"` triggers when the
//! element's top edge reaches 80% of the way down the viewport. Each side
//! accepts `top`, `center`, `bottom`, a percentage or a pixel value.

use std::fmt;
use std::str::FromStr;

use folio_core::{Rect, Viewport};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, map, opt, value},
    error::{context, VerboseError},
    number::complete::float,
    sequence::{delimited, pair, preceded, terminated},
    Finish, IResult,
};
use serde::{Deserialize, Serialize};

use crate::error::CoordinatorError;

/// A point along one vertical extent
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Anchor {
    Top,
    Center,
    Bottom,
    /// Fraction of the extent, `0.8` for `80%`
    Fraction(f32),
    Pixels(f32),
}

impl Anchor {
    /// Offset of this anchor from the start of an extent of `length`
    pub fn resolve(self, length: f32) -> f32 {
        match self {
            Anchor::Top => 0.0,
            Anchor::Center => length * 0.5,
            Anchor::Bottom => length,
            Anchor::Fraction(f) => length * f,
            Anchor::Pixels(px) => px,
        }
    }
}

type ParseResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// `top`, `center`, `bottom`, `80%`, `120px` or a bare pixel count
fn anchor(input: &str) -> ParseResult<'_, Anchor> {
    context(
        "anchor",
        alt((
            value(Anchor::Top, tag("top")),
            value(Anchor::Center, tag("center")),
            value(Anchor::Bottom, tag("bottom")),
            map(terminated(float, char('%')), |pct| Anchor::Fraction(pct / 100.0)),
            map(terminated(float, opt(tag("px"))), Anchor::Pixels),
        )),
    )(input)
}

/// One or two anchors separated by whitespace
fn anchor_pair(input: &str) -> ParseResult<'_, (Anchor, Option<Anchor>)> {
    all_consuming(delimited(
        multispace0,
        pair(anchor, opt(preceded(multispace1, anchor))),
        multispace0,
    ))(input)
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Top => f.write_str("top"),
            Anchor::Center => f.write_str("center"),
            Anchor::Bottom => f.write_str("bottom"),
            Anchor::Fraction(v) => write!(f, "{}%", v * 100.0),
            Anchor::Pixels(px) => write!(f, "{}px", px),
        }
    }
}

/// Where a trigger line sits for an element
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TriggerPosition {
    pub element: Anchor,
    pub viewport: Anchor,
}

impl TriggerPosition {
    pub const fn new(element: Anchor, viewport: Anchor) -> Self {
        Self { element, viewport }
    }

    /// `"top top"`
    pub const TOP_TOP: TriggerPosition = TriggerPosition::new(Anchor::Top, Anchor::Top);

    /// `"bottom top"`
    pub const BOTTOM_TOP: TriggerPosition = TriggerPosition::new(Anchor::Bottom, Anchor::Top);

    /// Scroll offset at which the element anchor meets the viewport anchor
    pub fn line(&self, bounds: Rect, viewport: Viewport) -> f32 {
        bounds.top() + self.element.resolve(bounds.height) - self.viewport.resolve(viewport.height)
    }
}

impl Default for TriggerPosition {
    /// `"top 80%"`, the reveal threshold used across the page
    fn default() -> Self {
        TriggerPosition::new(Anchor::Top, Anchor::Fraction(0.8))
    }
}

impl FromStr for TriggerPosition {
    type Err = CoordinatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| CoordinatorError::InvalidPosition {
            position: s.to_string(),
            reason,
        };

        if s.trim().is_empty() {
            return Err(invalid("empty position".into()));
        }

        let (_, (element, viewport)) = anchor_pair(s).finish().map_err(|e| {
            invalid(match e.errors.first() {
                Some((rest, _)) if !rest.trim().is_empty() => format!("unexpected `{}`", rest),
                _ => "incomplete position".into(),
            })
        })?;

        // A lone anchor applies to both sides, e.g. "center"
        Ok(TriggerPosition {
            element,
            viewport: viewport.unwrap_or(element),
        })
    }
}

impl TryFrom<String> for TriggerPosition {
    type Error = CoordinatorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TriggerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element, self.viewport)
    }
}

impl From<TriggerPosition> for String {
    fn from(position: TriggerPosition) -> Self {
        position.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positions() {
        let p: TriggerPosition = "top 80%".parse().unwrap();
        assert_eq!(p, TriggerPosition::default());

        let p: TriggerPosition = "bottom top".parse().unwrap();
        assert_eq!(p, TriggerPosition::BOTTOM_TOP);

        let p: TriggerPosition = "center".parse().unwrap();
        assert_eq!(p.viewport, Anchor::Center);

        let p: TriggerPosition = "top 120px".parse().unwrap();
        assert_eq!(p.viewport, Anchor::Pixels(120.0));

        assert!("middle top".parse::<TriggerPosition>().is_err());
        assert!("".parse::<TriggerPosition>().is_err());
        assert!("top top top".parse::<TriggerPosition>().is_err());
        assert!("top80%".parse::<TriggerPosition>().is_err());
    }

    #[test]
    fn test_error_reports_position_and_reason() {
        match "top sideways".parse::<TriggerPosition>() {
            Err(CoordinatorError::InvalidPosition { position, reason }) => {
                assert_eq!(position, "top sideways");
                assert!(reason.contains("sideways"), "{reason}");
            }
            other => panic!("expected an error, got {other:?}"),
        }
    }

    #[test]
    fn test_bare_pixels_and_padding() {
        let p: TriggerPosition = "  bottom -40 ".parse().unwrap();
        assert_eq!(p.element, Anchor::Bottom);
        assert_eq!(p.viewport, Anchor::Pixels(-40.0));
    }

    #[test]
    fn test_line() {
        let bounds = Rect::new(0.0, 2000.0, 800.0, 400.0);
        let viewport = Viewport::new(1280.0, 1000.0);
        assert_eq!(TriggerPosition::default().line(bounds, viewport), 1200.0);
        assert_eq!(TriggerPosition::TOP_TOP.line(bounds, viewport), 2000.0);
        assert_eq!(TriggerPosition::BOTTOM_TOP.line(bounds, viewport), 2400.0);
    }

    #[test]
    fn test_display_parses_back() {
        let p: TriggerPosition = "center 25%".parse().unwrap();
        assert_eq!(p.to_string().parse::<TriggerPosition>().unwrap(), p);
    }
}
