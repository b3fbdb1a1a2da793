//! Content nodes from the content directory.
//!
//! Every `*.json` or `*.toml` file is one node. Its collection is the first
//! directory below the content root (files at the root land in
//! [`DEFAULT_COLLECTION`]); its id is the remaining path without extension.
//!
//! ```text
//! content/
//! ├── about.toml            default / about
//! └── post/
//!     ├── hello.json        post / hello
//!     └── 2024/recap.toml   post / 2024/recap
//! ```

pub mod watch;

use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::store::{DEFAULT_COLLECTION, Node};
use crate::utils::path::is_temp_file;

pub use watch::ContentWatcher;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("{path} must contain a table at the top level")]
    NotATable { path: PathBuf },
}

/// Node location derived from a content file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeKey {
    pub collection: String,
    pub id: String,
}

impl NodeKey {
    /// `None` for paths outside `content`, temp files, and unsupported
    /// extensions.
    pub fn from_path(content: &Path, path: &Path) -> Option<Self> {
        if is_temp_file(path) || !is_content_file(path) {
            return None;
        }
        let relative = path.strip_prefix(content).ok()?.with_extension("");

        let mut parts: Vec<String> = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?.to_string()),
                _ => return None,
            }
        }

        match parts.len() {
            0 => None,
            1 => Some(Self {
                collection: DEFAULT_COLLECTION.to_string(),
                id: parts.remove(0),
            }),
            _ => {
                let collection = parts.remove(0);
                Some(Self {
                    collection,
                    id: parts.join("/"),
                })
            }
        }
    }
}

pub fn is_content_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("json" | "toml")
    )
}

/// Parse one content file into its node.
pub fn load_node(key: NodeKey, path: &Path) -> Result<Node, SourceError> {
    let text = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let fields = parse_fields(path, &text)?;
    Ok(Node::new(key.collection, key.id, fields))
}

fn parse_fields(path: &Path, text: &str) -> Result<Map<String, Value>, SourceError> {
    let parse_error = |reason: String| SourceError::Parse {
        path: path.to_path_buf(),
        reason,
    };

    let value = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => {
            let table: toml::Table = toml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
            serde_json::to_value(table).map_err(|e| parse_error(e.to_string()))?
        }
        _ => serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?,
    };

    match value {
        Value::Object(fields) => Ok(fields),
        _ => Err(SourceError::NotATable {
            path: path.to_path_buf(),
        }),
    }
}

/// Load every node under `content`. Files that fail to parse are reported
/// and skipped.
pub fn load_all(content: &Path) -> Result<Vec<Node>> {
    if !content.exists() {
        crate::log!("source"; "content directory {} does not exist", content.display());
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = jwalk::WalkDir::new(content)
        .skip_hidden(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path())
        .collect();
    files.sort();

    let mut nodes = Vec::with_capacity(files.len());
    for path in files {
        let Some(key) = NodeKey::from_path(content, &path) else {
            continue;
        };
        match load_node(key, &path) {
            Ok(node) => nodes.push(node),
            Err(e) => crate::log!("source"; "{}", e),
        }
    }
    crate::debug!("source"; "loaded {} nodes from {}", nodes.len(), content.display());
    Ok(nodes)
}
