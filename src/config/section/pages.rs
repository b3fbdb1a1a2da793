//! `[[pages]]` rules.
//!
//! Each rule describes one route. Rules with a `collection` produce one page
//! per node of that collection; `:field` segments are filled from the node.
//!
//! # Example
//!
//! ```toml
//! [[pages]]
//! path = "/"
//! paginate = true
//! query = "src/pages/Index.graphql"
//!
//! [[pages]]
//! path = "/blog/:slug"
//! collection = "post"
//! query = "src/templates/Post.graphql"
//!
//! [[pages]]
//! path = "/user/:id"         # resolved by the client router
//! collection = "user"
//! dynamic = true
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRule {
    /// Route template; `:name` segments are parameters.
    pub path: String,

    /// Node collection this rule expands over.
    #[serde(default)]
    pub collection: Option<String>,

    /// Route accepts a trailing page number.
    #[serde(default)]
    pub paginate: bool,

    /// Page-query document attached to the page.
    #[serde(default)]
    pub query: Option<String>,

    /// Route is matched on the client (the route template is stable).
    #[serde(default)]
    pub dynamic: bool,
}

impl PageRule {
    /// `:name` parameters in the template, in order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.path
            .split('/')
            .filter_map(|segment| segment.strip_prefix(':'))
    }

    pub fn validate(&self, index: usize, diag: &mut ConfigDiagnostics) {
        let field = format!("pages[{index}].path");

        if !self.path.starts_with('/') {
            diag.error(&field, format!("`{}` must start with `/`", self.path));
        }
        if self.params().any(str::is_empty) {
            diag.error(&field, format!("`{}` has an unnamed parameter", self.path));
        }
        if self.collection.is_none() && !self.dynamic && self.params().next().is_some() {
            diag.error_with_hint(
                &field,
                format!("`{}` has parameters but no collection to fill them", self.path),
                "set `collection`, or `dynamic = true` for client-side routes",
            );
        }
        if matches!(self.collection.as_deref(), Some("")) {
            diag.error(format!("pages[{index}].collection"), "collection name is empty");
        }
    }
}
