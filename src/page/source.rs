//! Page creation from store content.

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use thiserror::Error;

use super::{Page, PageInternal, Query};
use crate::config::PageRule;
use crate::store::{Node, StoreSnapshot};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("page template `{template}` needs field `{field}`, missing on {collection}/{node}")]
    MissingField {
        template: String,
        field: String,
        collection: String,
        node: String,
    },

    #[error("pages `{first}` and `{second}` both resolve to `{path}`")]
    DuplicatePath {
        path: String,
        first: String,
        second: String,
    },
}

/// Turns store content into the complete set of pages.
pub trait PageSource: Send + Sync {
    fn create_pages(&self, store: &StoreSnapshot) -> Result<Vec<Page>, PageError>;
}

/// Page source driven by the `[[pages]]` config rules.
#[derive(Debug, Clone, Default)]
pub struct TemplatePages {
    rules: Vec<PageRule>,
}

impl TemplatePages {
    pub fn new(rules: Vec<PageRule>) -> Self {
        Self { rules }
    }

    fn single_page(rule: &PageRule) -> Page {
        Page {
            id: rule.path.clone(),
            path: rule.path.clone(),
            query: Self::query(rule, Map::new()),
            data: Map::new(),
            internal: PageInternal {
                is_dynamic: rule.dynamic,
                route: rule.path.clone(),
                collection: None,
                node: None,
            },
        }
    }

    fn node_page(rule: &PageRule, node: &Node) -> Result<Page, PageError> {
        let path = fill_template(rule, node)?;

        let mut variables = Map::new();
        variables.insert("id".into(), Value::String(node.id.clone()));
        for param in rule.params() {
            if let Some(value) = node.field_str(param) {
                variables.insert(param.to_string(), Value::String(value));
            }
        }

        Ok(Page {
            id: format!("{}#{}", rule.path, node.id),
            path,
            query: Self::query(rule, variables),
            data: node.fields.clone(),
            internal: PageInternal {
                is_dynamic: rule.dynamic,
                route: rule.path.clone(),
                collection: Some(node.collection.clone()),
                node: Some(node.id.clone()),
            },
        })
    }

    fn query(rule: &PageRule, variables: Map<String, Value>) -> Query {
        Query {
            paginate: rule.paginate,
            document: rule.query.clone(),
            variables,
        }
    }
}

impl PageSource for TemplatePages {
    fn create_pages(&self, store: &StoreSnapshot) -> Result<Vec<Page>, PageError> {
        let mut pages = Vec::new();
        for rule in &self.rules {
            match &rule.collection {
                None => pages.push(Self::single_page(rule)),
                Some(collection) => {
                    for node in store.collection(collection) {
                        pages.push(Self::node_page(rule, node)?);
                    }
                }
            }
        }
        check_unique_paths(&pages)?;
        Ok(pages)
    }
}

/// Static pages must not share a path; dynamic pages are resolved by the
/// client router and may.
fn check_unique_paths(pages: &[Page]) -> Result<(), PageError> {
    let mut seen: FxHashMap<&str, &str> = FxHashMap::default();
    for page in pages.iter().filter(|p| !p.internal.is_dynamic) {
        if let Some(first) = seen.insert(&page.path, &page.id) {
            return Err(PageError::DuplicatePath {
                path: page.path.clone(),
                first: first.to_string(),
                second: page.id.clone(),
            });
        }
    }
    Ok(())
}

/// Substitute `:field` segments with slugified node values.
fn fill_template(rule: &PageRule, node: &Node) -> Result<String, PageError> {
    let mut segments = Vec::new();
    for segment in rule.path.split('/') {
        match segment.strip_prefix(':') {
            Some(field) => {
                let slug = node
                    .field_str(field)
                    .map(|value| slugify(&value))
                    .filter(|slug| !slug.is_empty())
                    .ok_or_else(|| PageError::MissingField {
                        template: rule.path.clone(),
                        field: field.to_string(),
                        collection: node.collection.clone(),
                        node: node.id.clone(),
                    })?;
                segments.push(slug);
            }
            None => segments.push(segment.to_string()),
        }
    }
    Ok(segments.join("/"))
}

/// ASCII slug: transliterated, lowercase, runs of other characters as `-`.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text).to_ascii_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}
