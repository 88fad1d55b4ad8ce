//! Configuration for the Ruby analysis core.
//!
//! Settings are layered:
//! - Default values
//! - `.ruby-insight/settings.toml`, searched upward from the current directory
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `RI_` and use double underscores
//! to separate nested levels:
//! - `RI_HOVER__TYPECHECKER_ENABLED=false` sets `hover.typechecker_enabled`
//! - `RI_HOVER__GATE_THRESHOLD=strict` sets `hover.gate_threshold`
//! - `RI_LOGGING__LEVEL=debug` sets `logging.level`

use crate::parsing::Strictness;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".ruby-insight";
const CONFIG_FILE: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Hover and gating behaviour
    #[serde(default)]
    pub hover: HoverConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HoverConfig {
    /// Whether an external type checker handles strictly typed files.
    /// When off, files are never gated regardless of their sigil.
    #[serde(default = "default_true")]
    pub typechecker_enabled: bool,

    /// Files at or above this strictness lose declaration-based hovers on
    /// method calls, instance variables and `super`.
    #[serde(default = "default_gate_threshold")]
    pub gate_threshold: Strictness,

    /// Base URL for keyword documentation pages.
    #[serde(default = "default_static_docs_base")]
    pub static_docs_base: String,

    /// Page explaining how receiver guessing works.
    #[serde(default = "default_guessed_types_url")]
    pub guessed_types_url: String,

    #[serde(default = "default_true")]
    pub guess_receivers: bool,

    /// Definition links rendered before collapsing the rest into a count.
    #[serde(default = "default_max_definition_links")]
    pub max_definition_links: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_gate_threshold() -> Strictness {
    Strictness::True
}
fn default_static_docs_base() -> String {
    "https://github.com/ruby/ruby/blob/master/doc/keywords".to_string()
}
fn default_guessed_types_url() -> String {
    "https://shopify.github.io/ruby-lsp/#guessed-types".to_string()
}
fn default_max_definition_links() -> usize {
    10
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            hover: HoverConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            typechecker_enabled: true,
            gate_threshold: default_gate_threshold(),
            static_docs_base: default_static_docs_base(),
            guessed_types_url: default_guessed_types_url(),
            guess_receivers: true,
            max_definition_links: default_max_definition_links(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::figment(&config_path).extract().map_err(Box::new)
    }

    /// Load configuration from a specific file, still honouring `RI_` overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscores stay
            .merge(Env::prefixed("RI_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find `.ruby-insight/settings.toml` from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_DIR))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join(CONFIG_FILE))
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Write default settings to `.ruby-insight/settings.toml` in the current
    /// directory. Refuses to overwrite unless `force` is set.
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);
        if path.exists() && !force {
            return Err(format!(
                "{} already exists, use --force to overwrite",
                path.display()
            )
            .into());
        }
        Settings::default().save(&path)?;
        Ok(path)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}
