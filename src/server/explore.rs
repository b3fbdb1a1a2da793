//! Page data inspection endpoints.
//!
//! - `/___explore` - HTML listing of every registered page
//! - `/___graphql?path=/x` - data and query variables of one page
//! - `/__devloop/routes.json` - the last written route manifest

use std::fmt::Write;
use std::sync::Arc;

use serde_json::json;

use super::endpoints::{EXPLORE_PATH, GRAPHQL_PATH};
use super::middleware::{Middleware, Reply, RequestInfo};
use crate::embed::serve::{EXPLORE_HTML, ExploreVars};
use crate::page::PageRegistry;
use crate::rebuild::ManifestWriter;
use crate::utils::html::escape;
use crate::utils::mime::types;

pub const ROUTES_PATH: &str = "/__devloop/routes.json";

pub struct PageExplorer {
    registry: Arc<PageRegistry>,
    manifest: ManifestWriter,
}

impl PageExplorer {
    pub fn new(registry: Arc<PageRegistry>, manifest: ManifestWriter) -> Self {
        Self { registry, manifest }
    }

    fn explore(&self) -> Reply {
        let pages = self.registry.pages();
        let mut rows = String::new();
        for page in &pages {
            let data = serde_json::to_string(&page.data).unwrap_or_default();
            let _ = writeln!(
                rows,
                "<tr><td><a href=\"{path}\">{path}</a></td><td><code>{route}</code></td><td>{query}</td><td><code>{data}</code></td></tr>",
                path = escape(&page.path),
                route = escape(page.route_key()),
                query = escape(page.query.document.as_deref().unwrap_or("-")),
                data = escape(&data),
            );
        }
        let body = EXPLORE_HTML.render(&ExploreVars {
            rows,
            count: pages.len(),
        });
        Reply::ok(types::HTML, body)
    }

    fn page_data(&self, request: &RequestInfo) -> Reply {
        let Some(path) = request.query_param("path") else {
            return Reply::new(400, types::PLAIN, "missing `path` parameter");
        };
        let page = self
            .registry
            .pages()
            .into_iter()
            .find(|page| {
                page.path == path || page.path.trim_end_matches('/') == path.trim_end_matches('/')
            });

        match page {
            Some(page) => Reply::json(&json!({
                "path": page.path,
                "data": page.data,
                "variables": page.query.variables,
            })),
            None => Reply::new(404, types::JSON, r#"{"error":"no such page"}"#),
        }
    }

    fn routes(&self) -> Reply {
        match self.manifest.read() {
            Ok(Some(manifest)) => Reply::json(&manifest),
            Ok(None) => Reply::new(404, types::JSON, r#"{"routes":[]}"#),
            Err(e) => Reply::new(500, types::PLAIN, format!("{e:#}")),
        }
    }
}

impl Middleware for PageExplorer {
    fn handle(&self, request: &RequestInfo) -> Option<Reply> {
        match request.path.as_str() {
            EXPLORE_PATH => Some(self.explore()),
            GRAPHQL_PATH => Some(self.page_data(request)),
            ROUTES_PATH => Some(self.routes()),
            _ => None,
        }
    }
}
