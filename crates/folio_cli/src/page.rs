//! Page description files
//!
//! A page description is a TOML file with the viewport, the laid-out
//! elements, the coordinator configuration and a scripted input sequence:
//!
//! ```toml
//! frames = 240
//!
//! [viewport]
//! width = 1280
//! height = 800
//!
//! [[elements]]
//! id = "about"
//! classes = ["about-reveal"]
//! y = 1600
//! width = 1280
//! height = 600
//!
//! [coordinator]
//! [[coordinator.reveals]]
//! selector = ".about-reveal"
//!
//! [[script]]
//! frame = 10
//! action = "wheel"
//! delta = 900
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use folio_core::{Document, Element, ElementHandle, Rect, Viewport};
use folio_scroll::CoordinatorConfig;
use serde::{Deserialize, Serialize};

fn default_frames() -> u64 {
    300
}

/// A simulated page
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageDescription {
    #[serde(default = "default_frames")]
    pub frames: u64,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub script: Vec<ScriptEvent>,
}

/// One laid-out element
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ElementSpec {
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Content width when it overflows horizontally
    pub scroll_width: Option<f32>,
}

impl ElementSpec {
    /// Selector that names this element in reports
    pub fn label(&self) -> String {
        match (&self.id, self.classes.first()) {
            (Some(id), _) => format!("#{id}"),
            (None, Some(class)) => format!(".{class}"),
            (None, None) => "<anonymous>".to_string(),
        }
    }
}

/// Input delivered before a given frame
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptEvent {
    pub frame: u64,
    #[serde(flatten)]
    pub action: ScriptAction,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptAction {
    Wheel { delta: f32 },
    Touch { delta: f32 },
    Key { delta: f32 },
    Native { offset: f32 },
    Resize { width: f32, height: f32 },
    Nav { selector: String },
    FontsLoaded,
    Pointer { x: f32, y: f32 },
    PointerLeave,
}

impl PageDescription {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let page: PageDescription = toml::from_str(content)?;
        page.coordinator
            .validate()
            .context("Invalid coordinator configuration")?;
        Ok(page)
    }

    /// Build the headless document
    ///
    /// Handles are returned in `elements` order.
    pub fn build_document(&self) -> (Arc<Document>, Vec<ElementHandle>) {
        let document = Document::new_shared();
        let mut handles = Vec::with_capacity(self.elements.len());
        for spec in &self.elements {
            let mut builder = Element::builder().layout(Rect::new(
                spec.x,
                spec.y,
                spec.width,
                spec.height,
            ));
            if let Some(id) = &spec.id {
                builder = builder.id(id.clone());
            }
            for class in &spec.classes {
                builder = builder.class(class.clone());
            }
            if let Some(width) = spec.scroll_width {
                builder = builder.scroll_width(width);
            }
            handles.push(document.insert(builder.build()));
        }
        (document, handles)
    }

    /// Script events for `frame`, in file order
    pub fn events_at(&self, frame: u64) -> impl Iterator<Item = &ScriptAction> {
        self.script
            .iter()
            .filter(move |e| e.frame == frame)
            .map(|e| &e.action)
    }
}
