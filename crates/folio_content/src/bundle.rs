//! Content bundle loading
//!
//! A bundle is a directory of JSON files, one per section of the site.
//! `translations.json` is optional; every other file is required.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use folio_theme::Language;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ContentError, Result};
use crate::icon::Icon;
use crate::localized::Localized;
use crate::model::{
    Profile, Project, Service, SkillCategory, SocialLinks, TimelineItem, Translations,
};

pub const PROFILE_FILE: &str = "profile.json";
pub const PROJECTS_FILE: &str = "projects.json";
pub const SKILLS_FILE: &str = "skills.json";
pub const TIMELINE_FILE: &str = "timeline.json";
pub const SERVICES_FILE: &str = "services.json";
pub const SOCIAL_FILE: &str = "social.json";
pub const TECH_STACK_FILE: &str = "tech-stack.json";
pub const TRANSLATIONS_FILE: &str = "translations.json";

/// Everything the page renders besides markup
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBundle {
    pub profile: Profile,
    pub projects: Vec<Project>,
    pub skills: Vec<SkillCategory>,
    pub timeline: Vec<TimelineItem>,
    pub services: Vec<Service>,
    pub social: SocialLinks,
    pub tech_stack: Vec<String>,
    pub translations: Option<Translations>,
}

/// A problem found by [`ContentBundle::validate`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentIssue {
    pub file: &'static str,
    pub message: String,
}

impl std::fmt::Display for ContentIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file, self.message)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ContentError::Json {
        path: path.to_path_buf(),
        source,
    })
}

impl ContentBundle {
    /// Load every section from `dir`
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let file = |name: &str| -> PathBuf { dir.join(name) };

        let translations_path = file(TRANSLATIONS_FILE);
        let translations = if translations_path.exists() {
            Some(read_json(&translations_path)?)
        } else {
            None
        };

        let bundle = Self {
            profile: read_json(&file(PROFILE_FILE))?,
            projects: read_json(&file(PROJECTS_FILE))?,
            skills: read_json(&file(SKILLS_FILE))?,
            timeline: read_json(&file(TIMELINE_FILE))?,
            services: read_json(&file(SERVICES_FILE))?,
            social: read_json(&file(SOCIAL_FILE))?,
            tech_stack: read_json(&file(TECH_STACK_FILE))?,
            translations,
        };

        tracing::debug!(
            "ContentBundle: loaded {} projects, {} services from {}",
            bundle.projects.len(),
            bundle.services.len(),
            dir.display()
        );
        for issue in bundle.validate() {
            tracing::warn!("ContentBundle: {}", issue);
        }
        Ok(bundle)
    }

    /// Check the constraints JSON typing cannot express
    ///
    /// Every localized field needs an English value (the fallback), skill
    /// levels are percentages, ids are unique and icon keys are known.
    pub fn validate(&self) -> Vec<ContentIssue> {
        let mut issues = Vec::new();
        let mut issue = |file: &'static str, message: String| {
            issues.push(ContentIssue { file, message });
        };
        let lacks_english = |l: &Localized<String>| !l.has(Language::En) && !l.is_empty();

        if self.profile.name.trim().is_empty() {
            issue(PROFILE_FILE, "profile name is empty".into());
        }
        if !self.profile.hero.has(Language::En) {
            issue(PROFILE_FILE, "hero text has no English version".into());
        }

        let mut ids = HashSet::new();
        for project in &self.projects {
            if !ids.insert(project.id) {
                issue(PROJECTS_FILE, format!("duplicate project id {}", project.id));
            }
            if !project.title.has(Language::En) || lacks_english(&project.description) {
                issue(PROJECTS_FILE, format!("project {} has no English text", project.id));
            }
        }

        for category in &self.skills {
            for skill in &category.skills {
                if skill.level > 100 {
                    issue(
                        SKILLS_FILE,
                        format!("skill `{}` level {} exceeds 100", skill.name, skill.level),
                    );
                }
            }
        }

        for item in &self.timeline {
            if lacks_english(&item.role) {
                issue(TIMELINE_FILE, format!("{} role has no English text", item.year));
            }
        }

        let mut ids = HashSet::new();
        for service in &self.services {
            if !ids.insert(service.id) {
                issue(SERVICES_FILE, format!("duplicate service id {}", service.id));
            }
            if Icon::lookup(&service.icon).is_none() {
                issue(
                    SERVICES_FILE,
                    format!("service {} uses unknown icon `{}`", service.id, service.icon),
                );
            }
        }

        issues
    }

    /// Window title in `language`
    pub fn document_title(&self, language: Language) -> String {
        self.profile.document_title(language)
    }

    /// UI string for a dotted key, or the key itself
    pub fn translate<'a>(&'a self, language: Language, key: &'a str) -> &'a str {
        match &self.translations {
            Some(t) => t.text(language, key),
            None => key,
        }
    }
}
