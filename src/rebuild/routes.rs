//! Route manifest generation.
//!
//! The manifest is the static route table the client router consumes. It
//! lists one entry per route key: static pages by path, dynamic pages by
//! their template.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::page::Page;

pub const MANIFEST_FILE: &str = "routes.json";

/// Optional page-number segment appended to paginated routes.
const PAGINATE_SUFFIX: &str = "/:page(\\d+)?";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub path: String,
    /// Registry id of the page that produced the route.
    pub page: String,
    pub dynamic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteManifest {
    pub routes: Vec<RouteEntry>,
}

impl RouteManifest {
    /// Build the route table: deduplicated by route key, sorted by path.
    /// The first page for a key wins.
    pub fn from_pages(pages: &[Page]) -> Self {
        let mut seen = FxHashSet::default();
        let mut routes: Vec<RouteEntry> = pages
            .iter()
            .filter(|page| seen.insert(page.route_key()))
            .map(|page| RouteEntry {
                path: route_path(page),
                page: page.id.clone(),
                dynamic: page.internal.is_dynamic,
                query: page.query.document.clone(),
            })
            .collect();
        routes.sort_by(|a, b| a.path.cmp(&b.path));
        Self { routes }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn route_path(page: &Page) -> String {
    let key = page.route_key();
    if !page.query.paginate {
        return key.to_string();
    }
    // `/` + suffix would start with `//`
    match key.trim_end_matches('/') {
        "" => PAGINATE_SUFFIX.to_string(),
        base => format!("{base}{PAGINATE_SUFFIX}"),
    }
}

/// Regenerates the route artifact from the current page set.
pub trait RouteGenerator: Send + Sync {
    fn generate(&self, pages: &[Page]) -> Result<RouteManifest>;
}

/// Writes `routes.json` into the cache directory.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    path: PathBuf,
}

impl ManifestWriter {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(MANIFEST_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back the last written manifest, if any.
    pub fn read(&self) -> Result<Option<RouteManifest>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let manifest = serde_json::from_str(&json)
            .with_context(|| format!("invalid route manifest {}", self.path.display()))?;
        Ok(Some(manifest))
    }

    fn write(&self, json: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        if fs::read_to_string(&self.path).is_ok_and(|existing| existing == json) {
            crate::debug!("routes"; "manifest unchanged, skipping write");
            return Ok(());
        }

        // Readers never observe a partial file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl RouteGenerator for ManifestWriter {
    fn generate(&self, pages: &[Page]) -> Result<RouteManifest> {
        let manifest = RouteManifest::from_pages(pages);
        let json = serde_json::to_string_pretty(&manifest)?;
        self.write(&json)?;
        crate::debug!("routes"; "{} routes -> {}", manifest.len(), self.path.display());
        Ok(manifest)
    }
}
