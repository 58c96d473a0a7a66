//! Coordinator configuration
//!
//! Every section is optional and defaults sensibly, so a page description
//! only lists what it animates:
//!
//! ```toml
//! reduced_motion = false
//!
//! [smooth_scroll]
//! duration_ms = 1200
//!
//! [[reveals]]
//! selector = ".about-reveal"
//! trigger = "#about"
//! start = "top 80%"
//! from = { y = 50, opacity = 0 }
//! to = { y = 0, opacity = 1 }
//! duration_ms = 1000
//! stagger_ms = 100
//!
//! [pinned_gallery]
//! section = "#projects-pin"
//! strip = "#projects-strip"
//! scrub_lag_ms = 1000
//!
//! [magnetic]
//! selector = ".magnetic"
//! label = ".magnetic-label"
//! ```

use folio_animation::{
    EaseDirection, Easing, Position, Repeat, SmoothScrollConfig, TweenOptions,
};
use folio_core::{Property, Props};
use serde::{Deserialize, Serialize};

use crate::error::{CoordinatorError, Result};
use crate::position::TriggerPosition;

/// Delay before the one-off refresh after mount
pub const DEFAULT_REFRESH_DELAY_MS: f32 = 100.0;

/// Top-level configuration for [`crate::mount_animation_coordinator`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub reveals: Vec<RevealConfig>,
    pub pinned_gallery: Option<GalleryConfig>,
    pub smooth_scroll: SmoothScrollConfig,
    pub reduced_motion: bool,
    pub parallax: Vec<ParallaxConfig>,
    pub loops: Vec<LoopConfig>,
    pub intro: Option<IntroConfig>,
    pub cursor: Option<CursorConfig>,
    pub magnetic: Option<MagneticConfig>,
    /// Delay before geometry is re-measured once fonts and images settle
    pub refresh_delay_ms: f32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            reveals: Vec::new(),
            pinned_gallery: None,
            smooth_scroll: SmoothScrollConfig::default(),
            reduced_motion: false,
            parallax: Vec::new(),
            loops: Vec::new(),
            intro: None,
            cursor: None,
            magnetic: None,
            refresh_delay_ms: DEFAULT_REFRESH_DELAY_MS,
        }
    }
}

impl CoordinatorConfig {
    /// Reject values no page could mean
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(CoordinatorError::InvalidConfig(msg));

        if !(self.refresh_delay_ms >= 0.0) {
            return invalid(format!("refresh_delay_ms must be >= 0, got {}", self.refresh_delay_ms));
        }
        if !(self.smooth_scroll.duration_ms >= 0.0) {
            return invalid("smooth_scroll.duration_ms must be >= 0".into());
        }
        for reveal in &self.reveals {
            if reveal.selector.trim().is_empty() {
                return invalid("reveal with empty selector".into());
            }
            if reveal.duration_ms < 0.0 || reveal.stagger_ms < 0.0 {
                return invalid(format!("reveal `{}` has a negative duration", reveal.selector));
            }
        }
        for lp in &self.loops {
            if !(lp.duration_ms > 0.0) {
                return invalid(format!("loop `{}` needs a positive duration", lp.selector));
            }
        }
        if let Some(gallery) = &self.pinned_gallery {
            if !(gallery.scrub_lag_ms >= 0.0) {
                return invalid("pinned_gallery.scrub_lag_ms must be >= 0".into());
            }
        }
        if let Some(magnetic) = &self.magnetic {
            if magnetic.selector.trim().is_empty() {
                return invalid("magnetic with empty selector".into());
            }
            if magnetic.duration_ms < 0.0 || magnetic.release_duration_ms < 0.0 {
                return invalid(format!("magnetic `{}` has a negative duration", magnetic.selector));
            }
        }
        Ok(())
    }
}

/// A one-shot entrance animation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Elements to animate
    pub selector: String,
    /// Element whose position triggers the reveal. When unset, every target
    /// triggers its own reveal.
    pub trigger: Option<String>,
    pub start: TriggerPosition,
    pub from: Props,
    pub to: Props,
    pub duration_ms: f32,
    pub stagger_ms: f32,
    pub easing: Easing,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            selector: String::new(),
            trigger: None,
            start: TriggerPosition::default(),
            from: Props::new().y(50.0).opacity(0.0),
            to: Props::new().y(0.0).opacity(1.0),
            duration_ms: 1000.0,
            stagger_ms: 0.0,
            easing: Easing::default(),
        }
    }
}

impl RevealConfig {
    pub fn tween_options(&self) -> TweenOptions {
        TweenOptions::with_duration(self.duration_ms)
            .stagger(self.stagger_ms)
            .easing(self.easing)
    }
}

/// A pinned section whose strip scrolls sideways
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Section that stays pinned
    pub section: String,
    /// Strip translated horizontally
    pub strip: String,
    pub start: TriggerPosition,
    /// Time the strip takes to catch up with the scroll position; 0 follows
    /// it exactly
    pub scrub_lag_ms: f32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            section: "#projects".into(),
            strip: "#projects-strip".into(),
            start: TriggerPosition::TOP_TOP,
            scrub_lag_ms: 0.0,
        }
    }
}

/// Scroll-scrubbed property range
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallaxConfig {
    /// Element whose position defines the scrub window
    pub trigger: String,
    /// Elements that move
    pub selector: String,
    pub property: Property,
    pub from: f32,
    pub to: f32,
    pub start: TriggerPosition,
    pub end: TriggerPosition,
    pub easing: Easing,
}

impl Default for ParallaxConfig {
    fn default() -> Self {
        Self {
            trigger: String::new(),
            selector: String::new(),
            property: Property::YPercent,
            from: 0.0,
            to: 30.0,
            start: TriggerPosition::TOP_TOP,
            end: TriggerPosition::BOTTOM_TOP,
            easing: Easing::Linear,
        }
    }
}

/// Endless marquee of a strip holding its content twice or more
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub selector: String,
    pub duration_ms: f32,
    /// Share of the strip's scroll width travelled per cycle
    pub distance_fraction: f32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            selector: String::new(),
            duration_ms: 20_000.0,
            distance_fraction: 0.5,
        }
    }
}

impl LoopConfig {
    pub fn tween_options(&self) -> TweenOptions {
        TweenOptions::with_duration(self.duration_ms)
            .easing(Easing::Linear)
            .repeat(Repeat::Forever { yoyo: false })
    }
}

/// Entrance sequence played at mount
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    pub steps: Vec<IntroStep>,
}

/// One step of the intro timeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroStep {
    pub selector: String,
    pub from: Props,
    pub to: Props,
    pub duration_ms: f32,
    pub stagger_ms: f32,
    pub delay_ms: f32,
    pub easing: Easing,
    /// Placement on the timeline, e.g. `"-=0.5"`
    pub position: Position,
}

impl Default for IntroStep {
    fn default() -> Self {
        Self {
            selector: String::new(),
            from: Props::new(),
            to: Props::new(),
            duration_ms: 500.0,
            stagger_ms: 0.0,
            delay_ms: 0.0,
            easing: Easing::default(),
            position: Position::Sequential,
        }
    }
}

impl IntroStep {
    pub fn tween_options(&self) -> TweenOptions {
        TweenOptions::with_duration(self.duration_ms)
            .stagger(self.stagger_ms)
            .delay(self.delay_ms)
            .easing(self.easing)
    }
}

/// Pointer-following dot and ring
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    pub dot: String,
    pub ring: String,
    pub dot_duration_ms: f32,
    pub ring_duration_ms: f32,
    pub ring_easing: Easing,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            dot: "#cursor-dot".into(),
            ring: "#cursor-ring".into(),
            dot_duration_ms: 100.0,
            ring_duration_ms: 700.0,
            ring_easing: Easing::power3_out(),
        }
    }
}

/// Buttons that lean toward the pointer while it hovers them
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagneticConfig {
    pub selector: String,
    /// Label elements; each belongs to the button whose bounds contain it
    pub label: Option<String>,
    /// Share of the pointer's offset from the button centre the button moves
    pub strength: f32,
    pub label_strength: f32,
    pub duration_ms: f32,
    pub easing: Easing,
    pub release_duration_ms: f32,
    pub release_easing: Easing,
}

impl Default for MagneticConfig {
    fn default() -> Self {
        Self {
            selector: ".magnetic".into(),
            label: Some(".magnetic-label".into()),
            strength: 0.2,
            label_strength: 0.1,
            duration_ms: 300.0,
            easing: Easing::Power(2, EaseDirection::Out),
            release_duration_ms: 500.0,
            release_easing: Easing::elastic_out(),
        }
    }
}

impl MagneticConfig {
    pub fn follow_options(&self) -> TweenOptions {
        TweenOptions::with_duration(self.duration_ms).easing(self.easing)
    }

    pub fn release_options(&self) -> TweenOptions {
        TweenOptions::with_duration(self.release_duration_ms).easing(self.release_easing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml() {
        let config: CoordinatorConfig = toml::from_str(
            r##"
            [[reveals]]
            selector = ".service-card"
            trigger = "#services"
            start = "top 75%"
            stagger_ms = 100
            duration_ms = 800

            [pinned_gallery]
            section = "#projects"
            strip = "#strip"
            "##,
        )
        .unwrap();

        assert_eq!(config.refresh_delay_ms, DEFAULT_REFRESH_DELAY_MS);
        assert!(!config.reduced_motion);
        let reveal = &config.reveals[0];
        assert_eq!(reveal.start.to_string(), "top 75%");
        assert_eq!(reveal.from, Props::new().y(50.0).opacity(0.0));
        let gallery = config.pinned_gallery.as_ref().unwrap();
        assert_eq!(gallery.start, TriggerPosition::TOP_TOP);
        assert_eq!(gallery.scrub_lag_ms, 0.0);
        assert!(config.magnetic.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_intro_positions_parse() {
        let config: CoordinatorConfig = toml::from_str(
            r#"
            [[intro.steps]]
            selector = ".hero-text-line"
            from = { y = 100, opacity = 0, rotate_x = -20 }
            to = { y = 0, opacity = 1, rotate_x = 0 }
            duration_ms = 1200
            stagger_ms = 150
            easing = "power3.out"

            [[intro.steps]]
            selector = ".hero-sub"
            position = "-=0.5"
            "#,
        )
        .unwrap();
        let steps = &config.intro.unwrap().steps;
        assert_eq!(steps[0].easing, Easing::power3_out());
        assert_eq!(steps[1].position, Position::Relative(-500.0));
    }

    #[test]
    fn test_magnetic_defaults_and_overrides() {
        let config: CoordinatorConfig = toml::from_str(
            r#"
            [pinned_gallery]
            scrub_lag_ms = 1000

            [magnetic]
            selector = ".btn"
            release_easing = "elastic.out(1.2, 0.4)"
            "#,
        )
        .unwrap();
        assert_eq!(config.pinned_gallery.as_ref().unwrap().scrub_lag_ms, 1000.0);
        let magnetic = config.magnetic.as_ref().unwrap();
        assert_eq!(magnetic.selector, ".btn");
        assert_eq!(magnetic.label.as_deref(), Some(".magnetic-label"));
        assert_eq!(magnetic.strength, 0.2);
        assert_eq!(magnetic.easing.to_string(), "power2.out");
        assert_eq!(magnetic.release_easing, Easing::ElasticOut(1.2, 0.4));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_position_rejected() {
        let result: std::result::Result<CoordinatorConfig, _> = toml::from_str(
            r#"
            [[reveals]]
            selector = ".x"
            start = "somewhere"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = CoordinatorConfig::default();
        config.refresh_delay_ms = -1.0;
        assert!(config.validate().is_err());

        let config = CoordinatorConfig {
            loops: vec![LoopConfig {
                selector: ".ticker".into(),
                duration_ms: 0.0,
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CoordinatorConfig {
            pinned_gallery: Some(GalleryConfig {
                scrub_lag_ms: -1.0,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CoordinatorConfig {
            magnetic: Some(MagneticConfig {
                selector: " ".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
