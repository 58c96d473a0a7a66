//! Easing functions
//!
//! Named easings parse from the strings page configs use (`"power3.out"`,
//! `"back.out(1.7)"`, `"elastic.out(1, 0.3)"`, `"none"`), so they can be
//! written directly in TOML.

use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace0, one_of},
    combinator::{all_consuming, map, opt, value},
    error::VerboseError,
    number::complete::float,
    sequence::{delimited, pair, preceded},
    Finish, IResult,
};
use serde::{Deserialize, Serialize};

/// Which end of the curve the acceleration sits on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EaseDirection {
    In,
    Out,
    InOut,
}

/// An easing curve mapping linear progress in `[0, 1]` to eased progress
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Easing {
    Linear,
    /// Polynomial ease of degree `power + 1` (`power1` is quadratic)
    Power(u8, EaseDirection),
    /// Overshooting ease-out with the given overshoot amount
    BackOut(f32),
    /// Exponential ease-out, reaching 1 slightly early
    ExpoOut,
    /// Decaying spring: `(amplitude, period)`. It overshoots 1 and
    /// oscillates with the given period; larger amplitudes swing further.
    ElasticOut(f32, f32),
    Smoothstep,
    /// Any user-provided curve
    Custom(fn(f32) -> f32),
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Power(1, EaseDirection::Out)
    }
}

impl PartialEq for Easing {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Easing::Linear, Easing::Linear)
            | (Easing::ExpoOut, Easing::ExpoOut)
            | (Easing::Smoothstep, Easing::Smoothstep) => true,
            (Easing::Power(a, da), Easing::Power(b, db)) => a == b && da == db,
            (Easing::BackOut(a), Easing::BackOut(b)) => a == b,
            (Easing::ElasticOut(a, p), Easing::ElasticOut(b, q)) => a == b && p == q,
            (Easing::Custom(a), Easing::Custom(b)) => *a as usize == *b as usize,
            _ => false,
        }
    }
}

impl Easing {
    pub fn power3_out() -> Self {
        Easing::Power(3, EaseDirection::Out)
    }

    /// `"elastic.out(1, 0.3)"`
    pub fn elastic_out() -> Self {
        Easing::ElasticOut(1.0, 0.3)
    }

    /// Apply the curve. Input is clamped to `[0, 1]`; the output of
    /// overshooting curves may leave that range in between the endpoints.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::Power(power, direction) => {
                let exp = i32::from(power) + 1;
                match direction {
                    EaseDirection::In => t.powi(exp),
                    EaseDirection::Out => 1.0 - (1.0 - t).powi(exp),
                    EaseDirection::InOut => {
                        if t < 0.5 {
                            (2.0 * t).powi(exp) / 2.0
                        } else {
                            1.0 - (2.0 * (1.0 - t)).powi(exp) / 2.0
                        }
                    }
                }
            }
            Easing::BackOut(overshoot) => {
                let u = t - 1.0;
                u * u * ((overshoot + 1.0) * u + overshoot) + 1.0
            }
            Easing::ExpoOut => (1.001 - 2f32.powf(-10.0 * t)).min(1.0),
            Easing::ElasticOut(_, _) if t >= 1.0 => 1.0,
            Easing::ElasticOut(amplitude, period) => {
                let peak = amplitude.max(1.0);
                let period = period / amplitude.clamp(f32::EPSILON, 1.0);
                let phase = period / TAU * (1.0 / peak).asin();
                peak * 2f32.powf(-10.0 * t) * ((t - phase) * TAU / period).sin() + 1.0
            }
            Easing::Smoothstep => t * t * (3.0 - 2.0 * t),
            Easing::Custom(f) => f(t),
        }
    }
}

/// Failure to parse an easing name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown easing `{0}`")]
pub struct ParseEasingError(pub String);

type ParseResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

fn comma(input: &str) -> ParseResult<'_, char> {
    delimited(multispace0, char(','), multispace0)(input)
}

/// `(a)`
fn argument(input: &str) -> ParseResult<'_, f32> {
    delimited(pair(char('('), multispace0), float, pair(multispace0, char(')')))(input)
}

/// `(a)` or `(a, b)`
fn arguments(input: &str) -> ParseResult<'_, (f32, Option<f32>)> {
    delimited(
        pair(char('('), multispace0),
        pair(float, opt(preceded(comma, float))),
        pair(multispace0, char(')')),
    )(input)
}

fn power(input: &str) -> ParseResult<'_, Easing> {
    let (input, _) = tag("power")(input)?;
    let (input, degree) = one_of("1234")(input)?;
    let (input, direction) = opt(preceded(
        char('.'),
        alt((
            value(EaseDirection::InOut, tag("inOut")),
            value(EaseDirection::In, tag("in")),
            value(EaseDirection::Out, tag("out")),
        )),
    ))(input)?;

    let degree = degree as u8 - b'0';
    Ok((input, Easing::Power(degree, direction.unwrap_or(EaseDirection::Out))))
}

fn easing(input: &str) -> ParseResult<'_, Easing> {
    alt((
        value(Easing::Linear, alt((tag("none"), tag("linear")))),
        value(Easing::ExpoOut, tag("expo.out")),
        value(Easing::Smoothstep, tag("smoothstep")),
        map(preceded(tag("back.out"), opt(argument)), |overshoot| {
            Easing::BackOut(overshoot.unwrap_or(1.70158))
        }),
        map(preceded(tag("elastic.out"), opt(arguments)), |args| match args {
            Some((amplitude, period)) => Easing::ElasticOut(amplitude, period.unwrap_or(0.3)),
            None => Easing::elastic_out(),
        }),
        power,
    ))(input)
}

impl FromStr for Easing {
    type Err = ParseEasingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseEasingError(s.to_string());
        let (_, easing) = all_consuming(delimited(multispace0, easing, multispace0))(s)
            .finish()
            .map_err(|_| err())?;

        match easing {
            Easing::ElasticOut(amplitude, period) if !(amplitude > 0.0 && period > 0.0) => {
                Err(err())
            }
            easing => Ok(easing),
        }
    }
}

impl TryFrom<String> for Easing {
    type Error = ParseEasingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::Linear => f.write_str("none"),
            Easing::Power(p, EaseDirection::In) => write!(f, "power{}.in", p),
            Easing::Power(p, EaseDirection::Out) => write!(f, "power{}.out", p),
            Easing::Power(p, EaseDirection::InOut) => write!(f, "power{}.inOut", p),
            Easing::BackOut(o) => write!(f, "back.out({})", o),
            Easing::ExpoOut => f.write_str("expo.out"),
            Easing::ElasticOut(a, p) => write!(f, "elastic.out({}, {})", a, p),
            Easing::Smoothstep => f.write_str("smoothstep"),
            Easing::Custom(_) => f.write_str("custom"),
        }
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let all = [
            Easing::Linear,
            Easing::Power(1, EaseDirection::In),
            Easing::Power(2, EaseDirection::Out),
            Easing::Power(3, EaseDirection::InOut),
            Easing::BackOut(1.7),
            Easing::elastic_out(),
            Easing::ElasticOut(2.0, 0.5),
            Easing::Smoothstep,
        ];
        for e in all {
            assert!(e.apply(0.0).abs() < 1e-6, "{e} at 0");
            assert!((e.apply(1.0) - 1.0).abs() < 1e-6, "{e} at 1");
        }
        assert_eq!(Easing::ExpoOut.apply(1.0), 1.0);
    }

    #[test]
    fn test_back_out_overshoots() {
        let e = Easing::BackOut(1.7);
        assert!((0..100).map(|i| e.apply(i as f32 / 100.0)).any(|v| v > 1.0));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("none".parse::<Easing>().unwrap(), Easing::Linear);
        assert_eq!("power3.out".parse::<Easing>().unwrap(), Easing::power3_out());
        assert_eq!(
            "power2".parse::<Easing>().unwrap(),
            Easing::Power(2, EaseDirection::Out)
        );
        assert_eq!(
            "back.out(1.7)".parse::<Easing>().unwrap(),
            Easing::BackOut(1.7)
        );
        assert_eq!(
            "power2.inOut".parse::<Easing>().unwrap(),
            Easing::Power(2, EaseDirection::InOut)
        );
        assert!("power9.out".parse::<Easing>().is_err());
        assert!("power2.sideways".parse::<Easing>().is_err());
        assert!("back.out(1, 2)".parse::<Easing>().is_err());
        assert!("bounce".parse::<Easing>().is_err());
    }

    #[test]
    fn test_parse_elastic() {
        assert_eq!(
            "elastic.out(1, 0.3)".parse::<Easing>().unwrap(),
            Easing::elastic_out()
        );
        assert_eq!("elastic.out".parse::<Easing>().unwrap(), Easing::elastic_out());
        assert_eq!(
            " elastic.out( 1.2 ) ".parse::<Easing>().unwrap(),
            Easing::ElasticOut(1.2, 0.3)
        );
        assert!("elastic.out(0, 0.3)".parse::<Easing>().is_err());
        assert!("elastic.out(1, 0.3".parse::<Easing>().is_err());
    }

    #[test]
    fn test_elastic_springs_past_and_settles() {
        let e = Easing::elastic_out();
        let samples: Vec<f32> = (0..=100).map(|i| e.apply(i as f32 / 100.0)).collect();
        assert!(samples.iter().any(|v| *v > 1.1));
        assert!(samples.iter().any(|v| *v < 1.0 && *v > 0.5));
        assert!(samples[90..].iter().all(|v| (v - 1.0).abs() < 0.01));
        assert_eq!(e.to_string(), "elastic.out(1, 0.3)");
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        let e = Easing::Power(4, EaseDirection::InOut);
        assert_eq!(e.to_string().parse::<Easing>().unwrap(), e);
    }

    #[test]
    fn test_custom_curve() {
        fn half(t: f32) -> f32 {
            t * 0.5
        }
        assert_eq!(Easing::Custom(half).apply(1.0), 0.5);
    }
}
