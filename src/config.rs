use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::catalog::CategoryFilter;
use crate::engine::question::KindPolicy;
use crate::engine::selector::SelectionMode;
use crate::session::QuizOptions;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub question_kind: KindPolicy,
    #[serde(default)]
    pub selection_mode: SelectionMode,
    #[serde(default = "default_include_travellers")]
    pub include_travellers: bool,
    #[serde(default = "default_include_fabled")]
    pub include_fabled: bool,
    #[serde(default)]
    pub include_unreleased: bool,
    #[serde(default)]
    pub last_script: Option<String>,
    #[serde(default)]
    pub analytics_endpoint: Option<String>,
}

fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_include_travellers() -> bool {
    false
}
fn default_include_fabled() -> bool {
    false
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            question_kind: KindPolicy::default(),
            selection_mode: SelectionMode::default(),
            include_travellers: default_include_travellers(),
            include_fabled: default_include_fabled(),
            include_unreleased: false,
            last_script: None,
            analytics_endpoint: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rolecall")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Resets settings that refer to things that no longer exist.
    /// Call after loading, since old configs may name removed themes.
    pub fn validate(&mut self, themes: &[String]) {
        if !themes.iter().any(|t| *t == self.theme) {
            log::warn!("unknown theme {:?}, using default", self.theme);
            self.theme = default_theme();
        }
        if self
            .analytics_endpoint
            .as_deref()
            .is_some_and(|e| e.trim().is_empty())
        {
            self.analytics_endpoint = None;
        }
    }

    pub fn category_filter(&self) -> CategoryFilter {
        CategoryFilter {
            include_travellers: self.include_travellers,
            include_fabled: self.include_fabled,
            include_unreleased: self.include_unreleased,
        }
    }

    pub fn quiz_options(&self) -> QuizOptions {
        QuizOptions {
            kind: self.question_kind,
            mode: self.selection_mode,
        }
    }
}
