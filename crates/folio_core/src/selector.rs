//! Minimal selector matching
//!
//! Supports the subset page sections use to hand elements to the animation
//! core: `#id`, `.class`, compounds such as `#about.reveal` or `.a.b`, and
//! comma-separated groups.

use std::fmt;
use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map},
    error::{context, VerboseError},
    multi::{many1, separated_list1},
    sequence::{delimited, preceded},
    Finish, IResult,
};
use smallvec::SmallVec;

use crate::element::Element;
use crate::error::{CoreError, Result};

type ParseResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    id: Option<String>,
    classes: SmallVec<[String; 2]>,
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        if let Some(id) = &self.id {
            if element.dom_id() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| element.has_class(c))
    }

    fn from_parts(parts: Vec<Simple<'_>>) -> std::result::Result<Self, &'static str> {
        let mut compound = Compound::default();
        for part in parts {
            match part {
                Simple::Id(_) if compound.id.is_some() => return Err("more than one id"),
                Simple::Id(id) => compound.id = Some(id.to_string()),
                Simple::Class(class) => compound.classes.push(class.to_string()),
            }
        }
        Ok(compound)
    }
}

/// A parsed selector
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    source: String,
    groups: SmallVec<[Compound; 1]>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self> {
        let err = |reason: String| CoreError::InvalidSelector {
            selector: source.to_string(),
            reason,
        };

        let (_, parsed) = selector_list(source)
            .finish()
            .map_err(|e| err(describe(source, &e)))?;

        let mut groups = SmallVec::new();
        for parts in parsed {
            groups.push(Compound::from_parts(parts).map_err(|reason| err(reason.into()))?);
        }

        Ok(Self {
            source: source.trim().to_string(),
            groups,
        })
    }

    pub fn matches(&self, element: &Element) -> bool {
        self.groups.iter().any(|g| g.matches(element))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

enum Simple<'a> {
    Id(&'a str),
    Class(&'a str),
}

fn identifier(input: &str) -> ParseResult<'_, &str> {
    context(
        "name",
        take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_'),
    )(input)
}

/// `#name` or `.name`
fn simple(input: &str) -> ParseResult<'_, Simple<'_>> {
    alt((
        map(preceded(char('#'), identifier), Simple::Id),
        map(preceded(char('.'), identifier), Simple::Class),
    ))(input)
}

fn compound(input: &str) -> ParseResult<'_, Vec<Simple<'_>>> {
    context("compound selector", many1(simple))(input)
}

/// Comma-separated compounds; anything left over (such as a descendant
/// combinator) fails the whole list
fn selector_list(input: &str) -> ParseResult<'_, Vec<Vec<Simple<'_>>>> {
    all_consuming(delimited(
        multispace0,
        separated_list1(delimited(multispace0, char(','), multispace0), compound),
        multispace0,
    ))(input)
}

fn describe(source: &str, err: &VerboseError<&str>) -> String {
    match err.errors.first() {
        Some((rest, _)) if rest.trim().is_empty() => "unexpected end of selector".into(),
        Some((rest, _)) => format!(
            "unexpected `{}` at column {}",
            rest,
            source.len() - rest.len() + 1
        ),
        None => "malformed selector".into(),
    }
}

impl FromStr for Selector {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_and_class() {
        let el = Element::builder().id("about").class("reveal").build();
        assert!(Selector::parse("#about").unwrap().matches(&el));
        assert!(Selector::parse(".reveal").unwrap().matches(&el));
        assert!(Selector::parse("#about.reveal").unwrap().matches(&el));
        assert!(!Selector::parse("#contact").unwrap().matches(&el));
        assert!(!Selector::parse(".reveal.other").unwrap().matches(&el));
    }

    #[test]
    fn test_groups() {
        let el = Element::builder().class("timeline-item").build();
        let sel: Selector = ".hero-text-line, .timeline-item".parse().unwrap();
        assert!(sel.matches(&el));
    }

    #[test]
    fn test_invalid_selectors() {
        for bad in ["", "div", "#", ".a b", "#a#b", ".a,", ".a$", ", .a"] {
            assert!(Selector::parse(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn test_error_names_the_offending_text() {
        match Selector::parse(".card > .title") {
            Err(CoreError::InvalidSelector { selector, reason }) => {
                assert_eq!(selector, ".card > .title");
                assert!(reason.contains("`> .title`"), "{reason}");
            }
            other => panic!("expected an error, got {other:?}"),
        }
        assert!(matches!(
            Selector::parse("#a#b"),
            Err(CoreError::InvalidSelector { reason, .. }) if reason == "more than one id"
        ));
    }

    #[test]
    fn test_whitespace_around_groups() {
        let sel = Selector::parse("  .nav-item ,#logo ").unwrap();
        assert_eq!(sel.as_str(), ".nav-item ,#logo");
        assert!(sel.matches(&Element::builder().id("logo").build()));
    }
}
