use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self { Theme::Light => Theme::Dark, Theme::Dark => Theme::Light }
    }

    pub fn as_str(self) -> &'static str {
        match self { Theme::Light => "light", Theme::Dark => "dark" }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Preferences {
    theme: Theme,
}

/// Client-local persistence of the theme choice: a small JSON file.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    /// The saved theme; `Light` when nothing usable is stored.
    pub fn load(&self) -> Theme {
        match fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str::<Preferences>(&raw) {
                Ok(prefs) => prefs.theme,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "ignoring unreadable theme file");
                    Theme::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Theme::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read theme file");
                Theme::default()
            }
        }
    }

    pub fn save(&self, theme: Theme) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() { fs::create_dir_all(parent)?; }
        }
        let raw = serde_json::to_string(&Preferences { theme })?;
        fs::write(&self.path, raw).with_context(|| format!("writing theme to {}", self.path.display()))
    }
}
