//! Folio Content
//!
//! Portfolio content as typed data: profile, projects, skills, experience
//! timeline, services, social links and UI strings. Text fields are
//! [`Localized`] and fall back to English.
//!
//! The animation crates never read content; the page renders it and hands
//! the resulting layout to the coordinator.

pub mod bundle;
pub mod error;
pub mod icon;
pub mod localized;
pub mod model;

pub use bundle::{ContentBundle, ContentIssue};
pub use error::{ContentError, Result};
pub use icon::Icon;
pub use localized::{Localized, FALLBACK_LANGUAGE};
pub use model::{
    HeroText, Profile, Project, Service, Skill, SkillCategory, SocialLinks, TimelineItem,
    Translations,
};
