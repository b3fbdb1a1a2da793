//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! mode = "development"        # development | production
//! content = "content"         # Node source directory (relative to site root)
//! output = "dist"             # Bundle directory served by the dev server
//! cache_dir = ".devloop"      # Route manifest and scratch files, emptied on start
//! public_path = "/"           # URL prefix the bundle is served under
//! debounce_ms = 16            # Window for coalescing rebuild triggers
//!
//! [build.entries]
//! app = "src/main.js"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::core::Mode;

/// Build settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub mode: Mode,

    /// Directory holding `*.json` / `*.toml` content nodes.
    pub content: PathBuf,

    /// Bundle output served by the dev server.
    pub output: PathBuf,

    /// Scratch directory for generated artifacts (`routes.json`).
    pub cache_dir: PathBuf,

    /// URL prefix for bundle assets.
    pub public_path: String,

    /// Debounce window shared by all rebuild actions.
    pub debounce_ms: u64,

    /// Bundle entry points: name -> module.
    pub entries: BTreeMap<String, String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Development,
            content: "content".into(),
            output: "dist".into(),
            cache_dir: ".devloop".into(),
            public_path: "/".into(),
            debounce_ms: 16,
            entries: BTreeMap::from([("app".to_string(), "src/main.js".to_string())]),
        }
    }
}

impl BuildConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Resolve directory paths against the project root.
    pub fn normalize(&mut self, root: &Path) {
        use crate::utils::path::normalize_path;

        self.content = normalize_path(&root.join(&self.content));
        self.output = normalize_path(&root.join(&self.output));
        self.cache_dir = normalize_path(&root.join(&self.cache_dir));
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.debounce_ms == 0 {
            diag.error_with_hint(
                "build.debounce_ms",
                "debounce window must be positive",
                "the default of 16ms batches same-tick bursts",
            );
        }
        if !self.public_path.starts_with('/') {
            diag.error(
                "build.public_path",
                format!("`{}` must start with `/`", self.public_path),
            );
        }
        if self.cache_dir == self.output {
            diag.error_with_hint(
                "build.cache_dir",
                "cache dir must not be the output dir",
                "the cache dir is emptied on start",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_build_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.mode, Mode::Development);
        assert_eq!(config.build.debounce(), Duration::from_millis(16));
        assert_eq!(config.build.entries["app"], "src/main.js");
        assert_eq!(config.build.public_path, "/");
    }

    #[test]
    fn test_build_config_override() {
        let config = test_parse_config(
            "[build]\nmode = \"production\"\ndebounce_ms = 50\n[build.entries]\nadmin = \"src/admin.js\"",
        );
        assert_eq!(config.build.mode, Mode::Production);
        assert_eq!(config.build.debounce_ms, 50);
        assert_eq!(config.build.entries.len(), 1);
        assert!(config.build.entries.contains_key("admin"));
    }

    #[test]
    fn test_build_config_validation() {
        let config = test_parse_config(
            "[build]\ndebounce_ms = 0\npublic_path = \"assets\"\noutput = \"x\"\ncache_dir = \"x\"",
        );
        let mut diag = ConfigDiagnostics::new();
        config.build.validate(&mut diag);
        assert_eq!(diag.len(), 3);
    }
}
