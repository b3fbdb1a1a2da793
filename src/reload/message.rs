//! Live-update message protocol.
//!
//! JSON objects tagged by `type`:
//!
//! - `connected`: handshake, carries the server version
//! - `fetch`: re-run page data queries
//! - `reload`: full page reload
//! - `error`: show the error overlay
//! - `clear_error`: hide the error overlay

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LiveMessage {
    Connected {
        version: String,
    },

    Fetch,

    Reload {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    Error {
        /// Failed action or source file.
        path: String,
        error: String,
    },

    #[serde(rename = "clear_error")]
    ClearError,
}

impl LiveMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn reload(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: Some(reason.into()),
        }
    }

    pub fn error(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Error {
            path: path.into(),
            error: error.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }

    #[cfg(test)]
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_is_minimal() {
        assert_eq!(LiveMessage::Fetch.to_json(), r#"{"type":"fetch"}"#);
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(LiveMessage::ClearError.to_json(), r#"{"type":"clear_error"}"#);
        assert_eq!(
            LiveMessage::error("routes", "disk full").to_json(),
            r#"{"type":"error","path":"routes","error":"disk full"}"#
        );
        assert_eq!(
            LiveMessage::Reload { reason: None }.to_json(),
            r#"{"type":"reload"}"#
        );
        let connected = LiveMessage::connected().to_json();
        assert!(connected.starts_with(r#"{"type":"connected","version":"#));
    }

    #[test]
    fn test_parse() {
        assert_eq!(LiveMessage::from_json(r#"{"type":"fetch"}"#), Some(LiveMessage::Fetch));
        assert_eq!(
            LiveMessage::from_json(r#"{"type":"reload"}"#),
            Some(LiveMessage::Reload { reason: None })
        );
        assert!(LiveMessage::from_json(r#"{"type":"patch"}"#).is_none());
    }
}
