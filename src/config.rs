//! Project configuration.
//!
//! `taskforge.toml` at the project root carries the two facts the engine
//! cannot derive: the artifact name and the package prefix for stamped
//! variables. The file is optional; defaults cover a conventional layout.

use crate::Result;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE: &str = "taskforge.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output binary name; empty means "derive from the directory name".
    pub target: String,
    /// Fully-qualified package prefix for stamped variables
    /// (e.g. `github.com/you/app/version`).
    pub ldflags_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: String::new(),
            ldflags_prefix: "main/version".to_string(),
        }
    }
}

impl Config {
    /// Load from `<root>/taskforge.toml`, falling back to defaults when the
    /// file is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);

        let mut config: Config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Config::default()
        };

        if config.target.is_empty() {
            config.target = root
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("app")
                .to_string();
        }

        Ok(config)
    }
}
