//! Build mode for development/production runs.

use serde::{Deserialize, Serialize};

/// Build mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Live updates, unminified bundle, cache cleared on start.
    #[default]
    Development,
    Production,
}

impl Mode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serde() {
        let mode: Mode = serde_json::from_str("\"production\"").unwrap();
        assert_eq!(mode, Mode::Production);
        assert_eq!(serde_json::to_string(&Mode::Development).unwrap(), "\"development\"");
    }

    #[test]
    fn test_mode_default() {
        assert_eq!(Mode::default(), Mode::Development);
        assert_eq!(Mode::Production.to_string(), "production");
    }
}
