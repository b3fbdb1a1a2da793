//! Request middleware chain.
//!
//! Middleware sees a [`RequestInfo`] and either answers with a [`Reply`]
//! or passes. The first answer ends the chain.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

use crate::utils::mime::types;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Other,
}

/// The parts of an HTTP request middleware may inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: Method,
    /// Percent-decoded path, without query string.
    pub path: String,
    pub query: Option<String>,
    pub accept: Option<String>,
}

impl RequestInfo {
    pub fn new(method: Method, url: &str, accept: Option<String>) -> Self {
        let (raw_path, query) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (url, None),
        };
        let path = percent_decode_str(raw_path)
            .decode_utf8()
            .map(Cow::into_owned)
            .unwrap_or_else(|_| raw_path.to_string());

        Self {
            method,
            path,
            query,
            accept,
        }
    }

    /// Shorthand for a GET without headers.
    pub fn get(url: &str) -> Self {
        Self::new(Method::Get, url, None)
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::Head
    }

    pub fn accepts_html(&self) -> bool {
        self.accept
            .as_deref()
            .is_some_and(|accept| accept.contains("text/html") || accept.contains("*/*"))
    }

    /// Value of a `key=value` query parameter, percent-decoded.
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (k == key).then(|| {
                percent_decode_str(&v.replace('+', " "))
                    .decode_utf8_lossy()
                    .into_owned()
            })
        })
    }
}

/// A middleware answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub headers: Vec<(&'static str, String)>,
}

impl Reply {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    pub fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, content_type, body)
    }

    pub fn json(value: &impl serde::Serialize) -> Self {
        match serde_json::to_vec_pretty(value) {
            Ok(body) => Self::ok(types::JSON, body),
            Err(e) => Self::new(500, types::PLAIN, format!("serialization failed: {e}")),
        }
    }

    pub fn not_found() -> Self {
        Self::new(404, types::PLAIN, "404 Not Found")
    }

    pub fn unavailable() -> Self {
        Self::new(503, types::PLAIN, "503 Service Unavailable")
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

pub trait Middleware: Send + Sync {
    fn handle(&self, request: &RequestInfo) -> Option<Reply>;
}

impl<F> Middleware for F
where
    F: Fn(&RequestInfo) -> Option<Reply> + Send + Sync,
{
    fn handle(&self, request: &RequestInfo) -> Option<Reply> {
        self(request)
    }
}

#[derive(Default)]
pub struct MiddlewareChain {
    stack: Vec<Box<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn push(&mut self, middleware: impl Middleware + 'static) {
        self.stack.push(Box::new(middleware));
    }

    /// Run middleware in registration order; unanswered requests get 404.
    pub fn handle(&self, request: &RequestInfo) -> Reply {
        self.stack
            .iter()
            .find_map(|m| m.handle(request))
            .unwrap_or_else(Reply::not_found)
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
