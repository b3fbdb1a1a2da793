//! Site configuration management for `devloop.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── pages      # [[pages]]
//! │   └── serve      # [serve]
//! ├── types/         # ConfigError, ConfigDiagnostics
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! The loaded [`SiteConfig`] is passed explicitly to every constructor that
//! needs it; nothing reads mode or paths from the process environment.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{BuildConfig, PageRule, ServeConfig};
pub use types::{ConfigDiagnostics, ConfigError};

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing devloop.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub pages: Vec<PageRule>,
}

impl SiteConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd to find the config file. The project root is
    /// the config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path =
            find_config_file(&cli.config).ok_or_else(|| ConfigError::NotFound(cli.config.clone()))?;

        let mut config = Self::from_path(&config_path)?;
        config.config_path = crate::utils::path::normalize_path(&config_path);

        let root = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.set_root(&root);
        config.apply_command_options(cli);
        config.build.normalize(&root);

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    #[cfg(test)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        let fields = fields.join(", ");
        crate::log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields);
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.root = path.to_path_buf();
    }

    /// Get path relative to the site root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Develop {
                host,
                port,
                ws_port,
                mode,
                cache_dir,
                verbose,
            } => {
                crate::logger::set_verbose(*verbose);
                Self::update_option(&mut self.serve.host, host.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.ws_port, ws_port.as_ref());
                Self::update_option(&mut self.build.mode, mode.as_ref());
                Self::update_option(&mut self.build.cache_dir, cache_dir.as_ref());
            }
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration, collecting all errors and returning them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.build.validate(&mut diag);
        self.serve.validate(&mut diag);
        for (index, rule) in self.pages.iter().enumerate() {
            rule.validate(index, &mut diag);
        }

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_str_invalid_toml() {
        let result = SiteConfig::from_str("[build\nmode = \"development\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_site_config_default() {
        let config = SiteConfig::default();
        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.serve.port, 8080);
        assert!(config.pages.is_empty());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[serve]\nport = 1234\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = SiteConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.serve.port, 1234);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_root_relative() {
        let mut config = SiteConfig::default();
        config.set_root(Path::new("/site"));
        assert_eq!(
            config.root_relative("/site/content/post/a.json"),
            PathBuf::from("content/post/a.json")
        );
        assert_eq!(config.root_relative("/elsewhere"), PathBuf::from("/elsewhere"));
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from(["devloop", "develop", "--port", "9000", "--mode", "production"]);
        let mut config = test_parse_config("[serve]\nport = 8000\nws_port = 8001");
        config.apply_command_options(&cli);

        assert_eq!(config.serve.port, 9000);
        assert_eq!(config.serve.ws_port, 8001);
        assert_eq!(config.build.mode, crate::core::Mode::Production);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = test_parse_config(
            "[build]\ndebounce_ms = 0\n[serve]\nport = 5000\nws_port = 5000\n[[pages]]\npath = \"nope\"",
        );
        let err = config.validate().unwrap_err();
        let Some(ConfigError::Diagnostics(diag)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected diagnostics, got {err}");
        };
        assert_eq!(diag.len(), 3);
    }
}
