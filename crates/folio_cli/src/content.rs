//! Content bundle summary

use std::fmt::Write;

use folio_content::ContentBundle;
use folio_theme::Language;

/// Human-readable overview of `bundle` in `language`
pub fn summarize(bundle: &ContentBundle, language: Language) -> String {
    let mut out = String::new();
    let profile = &bundle.profile;

    let _ = writeln!(out, "{}", bundle.document_title(language));
    if let Some(hero) = profile.hero.get(language) {
        let _ = writeln!(out, "  {}", hero.availability);
        let _ = writeln!(out, "  {}", hero.lines().join(" "));
    }
    if let Some(location) = &profile.location {
        let _ = writeln!(out, "  {}", location);
    }

    let _ = writeln!(out, "\nProjects ({}):", bundle.projects.len());
    for project in &bundle.projects {
        let _ = writeln!(
            out,
            "  [{}] {} - {} ({})",
            project.id,
            project.title.text(language),
            project.role.text(language),
            project.tags.join(", ")
        );
    }

    let _ = writeln!(out, "\nServices ({}):", bundle.services.len());
    for service in &bundle.services {
        let _ = writeln!(
            out,
            "  {:<10} {} ({} steps)",
            service.icon().key(),
            service.title.text(language),
            service.steps.items(language).len()
        );
    }

    let skills: usize = bundle.skills.iter().map(|c| c.skills.len()).sum();
    let _ = writeln!(
        out,
        "\nSkills: {} in {} categories",
        skills,
        bundle.skills.len()
    );
    let _ = writeln!(out, "Timeline: {} entries", bundle.timeline.len());
    let _ = writeln!(out, "Tech stack: {}", bundle.tech_stack.join(", "));

    if let Some(mailto) = bundle.social.mailto() {
        let _ = writeln!(out, "Contact: {}", mailto);
    }
    match &bundle.translations {
        Some(t) if !t.has_language(language) => {
            let _ = writeln!(out, "UI strings: no {} table, using English", language);
        }
        Some(_) => {
            let _ = writeln!(out, "UI strings: {}", language);
        }
        None => {}
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_content::{HeroText, Localized, Project, Service};

    fn bundle() -> ContentBundle {
        let mut bundle = ContentBundle::default();
        bundle.profile.name = "Ada Lovelace".into();
        bundle.profile.title = Localized::single("Engineer".to_string())
            .with(Language::Fr, "Ingénieure".to_string());
        bundle.profile.hero = Localized::single(HeroText {
            availability: "Available".into(),
            line1: "I build".into(),
            line2: "fast".into(),
            line3: "software".into(),
        });
        bundle.projects.push(Project {
            id: 7,
            title: Localized::single("Dashboard".to_string()),
            description: Localized::default(),
            role: Localized::single("Lead".to_string()),
            tags: vec!["Rust".into(), "WebGL".into()],
            metrics: Localized::default(),
            image: String::new(),
            link: None,
            github: None,
        });
        bundle.services.push(Service {
            id: 1,
            title: Localized::single("APIs".to_string()),
            description: Localized::default(),
            icon: "Rocket".into(),
            steps: Localized::single(vec!["Design".to_string()]),
        });
        bundle
    }

    #[test]
    fn test_summary_uses_language_and_fallbacks() {
        let summary = summarize(&bundle(), Language::Fr);

        assert!(summary.starts_with("Ada Lovelace | Ingénieure\n"));
        assert!(summary.contains("I build fast software"));
        assert!(summary.contains("[7] Dashboard - Lead (Rust, WebGL)"));
        // Unknown icon renders as Code
        assert!(summary.contains("Code       APIs (1 steps)"));
        assert!(!summary.contains("UI strings"));
    }
}
