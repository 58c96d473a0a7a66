//! Folio CLI
//!
//! Replay scroll scripts against page descriptions and check content
//! bundles without a browser.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use folio_content::ContentBundle;
use folio_theme::{Language, LanguageState, ResolvedTheme, ThemePreference, ThemeState};
use folio_theme::{PreferenceStore, TomlFileStore};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod content;
mod page;
mod simulate;

use page::PageDescription;
use simulate::{simulate, SimulationOptions};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Folio scroll animation tools", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount a page description on a simulated clock and replay its script
    Simulate {
        /// Page description (TOML)
        page: PathBuf,

        /// Number of frames to run (defaults to the page's `frames`)
        #[arg(short, long)]
        frames: Option<u64>,

        /// Milliseconds per frame
        #[arg(long, default_value = "16")]
        frame_ms: f64,

        /// Run as if the user prefers reduced motion
        #[arg(long)]
        reduced_motion: bool,

        /// Run as a touch device (no pointer follower)
        #[arg(long)]
        coarse_pointer: bool,
    },

    /// Load and validate a content bundle
    Content {
        /// Directory holding the JSON files
        #[arg(default_value = "content")]
        dir: PathBuf,

        /// Language to summarize in (en, fr, de)
        #[arg(short, long, default_value = "en")]
        lang: String,
    },

    /// Show or change stored theme and language preferences
    Prefs {
        /// Preferences file
        #[arg(long, default_value = "folio-prefs.toml")]
        file: PathBuf,

        /// New theme (light, dark, system) or `cycle`
        #[arg(short, long)]
        theme: Option<String>,

        /// New language (en, fr, de)
        #[arg(short, long)]
        lang: Option<String>,

        /// Operating system color scheme is dark
        #[arg(long)]
        system_dark: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Simulate {
            page,
            frames,
            frame_ms,
            reduced_motion,
            coarse_pointer,
        } => cmd_simulate(
            page,
            SimulationOptions {
                frames,
                frame_ms,
                reduced_motion,
                coarse_pointer,
            },
        ),
        Commands::Content { dir, lang } => cmd_content(dir, &lang),
        Commands::Prefs {
            file,
            theme,
            lang,
            system_dark,
        } => cmd_prefs(file, theme.as_deref(), lang.as_deref(), system_dark),
    }
}

fn cmd_simulate(path: PathBuf, options: SimulationOptions) -> Result<()> {
    if !(options.frame_ms > 0.0) {
        bail!("--frame-ms must be positive");
    }
    let page = PageDescription::load(&path)?;
    info!(
        "Simulating {} ({} elements, {} script events)",
        path.display(),
        page.elements.len(),
        page.script.len()
    );

    let report = simulate(&page, &options)?;

    println!();
    println!("Frames:   {}", report.frames);
    println!(
        "Viewport: {}x{}",
        report.viewport.width, report.viewport.height
    );
    println!(
        "Offset:   {:.1} (raw {:.1})",
        report.final_state.smoothed_offset, report.final_state.raw_offset
    );
    println!("Reveals:");
    for (selector, offset) in report.revealed() {
        println!("  {:<24} at {:.1}", selector, offset);
    }
    println!("Elements:");
    for (label, style) in &report.styles {
        println!(
            "  {:<24} x {:>8.1}  y {:>7.1}  y% {:>5.1}  opacity {:.2}",
            label, style.x, style.y, style.y_percent, style.opacity
        );
    }
    info!("Teardown: {:?}", report.teardown.steps);

    Ok(())
}

fn cmd_content(dir: PathBuf, lang: &str) -> Result<()> {
    let language: Language = lang.parse()?;
    let bundle = ContentBundle::load_dir(&dir)
        .with_context(|| format!("Failed to load content from {}", dir.display()))?;

    print!("{}", content::summarize(&bundle, language));

    let issues = bundle.validate();
    if !issues.is_empty() {
        for issue in &issues {
            warn!("{}", issue);
        }
        bail!("{} content issue(s) in {}", issues.len(), dir.display());
    }
    info!("Content OK");
    Ok(())
}

fn cmd_prefs(
    file: PathBuf,
    theme: Option<&str>,
    lang: Option<&str>,
    system_dark: bool,
) -> Result<()> {
    let store: Arc<dyn PreferenceStore> = Arc::new(TomlFileStore::new(&file));
    let system = if system_dark {
        ResolvedTheme::Dark
    } else {
        ResolvedTheme::Light
    };

    let theme_state = ThemeState::load(Arc::clone(&store), system);
    match theme {
        Some("cycle") => {
            theme_state.cycle()?;
        }
        Some(value) => theme_state.set_preference(value.parse::<ThemePreference>()?)?,
        None => {}
    }

    let language_state = LanguageState::load(store, None);
    if let Some(value) = lang {
        language_state.set(value.parse()?)?;
    }

    println!("File:     {}", file.display());
    println!(
        "Theme:    {} (resolved {})",
        theme_state.preference(),
        theme_state.resolved().class_name()
    );
    println!("Language: {}", language_state.get());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefs_persist_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prefs.toml");
        cmd_prefs(file.clone(), Some("light"), Some("fr"), false).unwrap();
        cmd_prefs(file.clone(), Some("cycle"), None, false).unwrap();

        let store: Arc<dyn PreferenceStore> = Arc::new(TomlFileStore::new(&file));
        let theme = ThemeState::load(Arc::clone(&store), ResolvedTheme::Dark);
        assert_eq!(theme.preference(), ThemePreference::System);
        assert_eq!(LanguageState::load(store, None).get(), Language::Fr);
    }

    #[test]
    fn test_prefs_reject_unknown_values() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prefs.toml");
        assert!(cmd_prefs(file.clone(), Some("sepia"), None, false).is_err());
        assert!(cmd_prefs(file, None, Some("xx"), false).is_err());
    }

    #[test]
    fn test_simulate_sample_page() {
        let page = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("pages/portfolio.toml");
        cmd_simulate(page, SimulationOptions::default()).unwrap();
    }

    #[test]
    fn test_simulate_rejects_bad_frame_time() {
        let page = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("pages/portfolio.toml");
        let options = SimulationOptions {
            frame_ms: 0.0,
            ..Default::default()
        };
        assert!(cmd_simulate(page, options).is_err());
    }

    #[test]
    fn test_content_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cmd_content(dir.path().join("missing"), "en").is_err());
        assert!(cmd_content(dir.path().to_path_buf(), "klingon").is_err());
    }
}
