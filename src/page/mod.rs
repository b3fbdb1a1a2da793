//! Pages derived from store content.
//!
//! - `registry` - page storage and create/update/remove events
//! - `source` - `PageSource` trait and the config-driven `TemplatePages`

pub mod registry;
pub mod source;

use serde::Serialize;
use serde_json::{Map, Value};

pub use registry::{PageEvent, PageRegistry};
pub use source::{PageSource, TemplatePages};

/// A routable page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// Stable identity: the rule template, plus the node id for
    /// collection pages. Survives path changes.
    pub id: String,
    /// Concrete URL path.
    pub path: String,
    pub query: Query,
    /// Context handed to the page query (node fields for collection pages).
    pub data: Map<String, Value>,
    pub internal: PageInternal,
}

/// Page query metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    pub paginate: bool,
    /// Page-query document, if the page has one.
    pub document: Option<String>,
    /// Non-structural query inputs.
    pub variables: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageInternal {
    /// Matched by the client router; the route template stays stable while
    /// the concrete path may change.
    pub is_dynamic: bool,
    /// Route template the page was created from.
    pub route: String,
    pub collection: Option<String>,
    pub node: Option<String>,
}

impl Page {
    /// Key of this page in the route table.
    pub fn route_key(&self) -> &str {
        if self.internal.is_dynamic {
            &self.internal.route
        } else {
            &self.path
        }
    }
}
