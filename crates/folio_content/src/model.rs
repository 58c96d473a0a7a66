//! Portfolio content types
//!
//! Field names follow the camelCase JSON the site ships with.

use folio_theme::Language;
use serde::{Deserialize, Serialize};

use crate::icon::Icon;
use crate::localized::Localized;

/// Owner of the portfolio
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub name: String,
    pub title: Localized<String>,
    pub hero: Localized<HeroText>,
    pub intro: Localized<String>,
    pub location: Option<String>,
    pub cv_url: Option<String>,
}

impl Profile {
    /// Window title, `"<name> | <title>"`
    pub fn document_title(&self, language: Language) -> String {
        let title = self.title.text(language);
        if title.is_empty() {
            self.name.clone()
        } else {
            format!("{} | {}", self.name, title)
        }
    }

    /// Suggested file name for the downloadable CV
    pub fn cv_file_name(&self) -> String {
        format!("cv-{}.pdf", self.name.to_lowercase().replace(' ', "-"))
    }
}

/// Headline shown in the hero section
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroText {
    pub availability: String,
    pub line1: String,
    pub line2: String,
    pub line3: String,
}

impl HeroText {
    pub fn lines(&self) -> [&str; 3] {
        [&self.line1, &self.line2, &self.line3]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u32,
    pub title: Localized<String>,
    pub description: Localized<String>,
    pub role: Localized<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metrics: Localized<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: u32,
    pub title: Localized<String>,
    pub description: Localized<String>,
    /// Lucide icon key; see [`Service::icon`]
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub steps: Localized<Vec<String>>,
}

impl Service {
    pub fn icon(&self) -> Icon {
        Icon::from_key(&self.icon)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillCategory {
    pub category: Localized<String>,
    #[serde(default)]
    pub skills: Vec<Skill>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    /// Proficiency in percent, `0..=100`
    pub level: u8,
}

/// One entry of the experience timeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub year: String,
    pub role: Localized<String>,
    pub company: String,
    #[serde(default)]
    pub description: Localized<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub email: Option<String>,
}

impl SocialLinks {
    pub fn mailto(&self) -> Option<String> {
        self.email.as_ref().map(|email| format!("mailto:{email}"))
    }
}

/// UI strings: a nested JSON object per language, addressed by dotted keys
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Translations(Localized<serde_json::Value>);

impl Translations {
    /// Look up `key` (e.g. `"nav.projects"`), falling back to English
    pub fn get(&self, language: Language, key: &str) -> Option<&str> {
        let pointer = format!("/{}", key.replace('.', "/"));
        self.0
            .get_with(language, |tree| tree.pointer(&pointer).is_some_and(|v| v.is_string()))
            .and_then(|tree| tree.pointer(&pointer))
            .and_then(serde_json::Value::as_str)
    }

    /// Like [`Translations::get`], returning the key itself when missing
    pub fn text<'a>(&'a self, language: Language, key: &'a str) -> &'a str {
        self.get(language, key).unwrap_or(key)
    }

    pub fn has_language(&self, language: Language) -> bool {
        self.0.has(language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_json() {
        let profile: Profile = serde_json::from_str(
            r#"{
                "name": "Ada Lovelace",
                "title": { "en": "Engineer", "fr": "Ingénieure" },
                "hero": {
                    "en": { "availability": "Available", "line1": "I build",
                            "line2": "fast", "line3": "software" }
                },
                "intro": "Hello",
                "cvUrl": "/cv.pdf"
            }"#,
        )
        .unwrap();

        assert_eq!(profile.document_title(Language::Fr), "Ada Lovelace | Ingénieure");
        assert_eq!(profile.cv_file_name(), "cv-ada-lovelace.pdf");
        assert_eq!(profile.cv_url.as_deref(), Some("/cv.pdf"));
        let hero = profile.hero.get(Language::De).unwrap();
        assert_eq!(hero.lines(), ["I build", "fast", "software"]);
        assert_eq!(profile.intro.text(Language::De), "Hello");
    }

    #[test]
    fn test_service_steps_and_icon() {
        let service: Service = serde_json::from_str(
            r#"{
                "id": 1,
                "title": { "en": "Web Apps", "de": "Web-Apps" },
                "description": "End to end",
                "icon": "Layers",
                "steps": { "en": ["Architecture", "Development"], "de": [] }
            }"#,
        )
        .unwrap();
        assert_eq!(service.icon(), Icon::Layers);
        assert_eq!(service.title.text(Language::De), "Web-Apps");
        assert_eq!(service.steps.items(Language::De).len(), 2);
    }

    #[test]
    fn test_translations_lookup() {
        let t: Translations = serde_json::from_str(
            r#"{
                "en": { "nav": { "projects": "Projects", "about": "About" } },
                "fr": { "nav": { "projects": "Projets" } }
            }"#,
        )
        .unwrap();
        assert_eq!(t.get(Language::Fr, "nav.projects"), Some("Projets"));
        assert_eq!(t.get(Language::Fr, "nav.about"), Some("About"));
        assert_eq!(t.text(Language::De, "nav.contact"), "nav.contact");
        assert!(!t.has_language(Language::De));
    }
}
