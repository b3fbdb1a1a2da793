//! Serving the bundle output directory.

use std::fs;
use std::path::{Path, PathBuf};

use super::middleware::{Middleware, Reply, RequestInfo};
use crate::utils::{html, mime};

/// Serves files under `root`, injecting the live client into HTML.
#[derive(Debug, Clone)]
pub struct BundleFiles {
    root: PathBuf,
    public_path: String,
    /// Markup inserted before `</body>` of every served HTML document.
    inject: Option<String>,
    history_fallback: bool,
}

impl BundleFiles {
    pub fn new(root: impl Into<PathBuf>, public_path: &str) -> Self {
        Self {
            root: root.into(),
            public_path: public_path.trim_end_matches('/').to_string(),
            inject: None,
            history_fallback: false,
        }
    }

    pub fn with_injection(mut self, snippet: impl Into<String>) -> Self {
        self.inject = Some(snippet.into());
        self
    }

    /// Answer extension-less HTML navigations with `index.html`.
    pub fn with_history_fallback(mut self) -> Self {
        self.history_fallback = true;
        self
    }

    fn serve(&self, path: &Path) -> Reply {
        let content_type = mime::from_path(path);
        match fs::read(path) {
            Ok(body) => {
                let body = match &self.inject {
                    Some(snippet) if mime::is_html(content_type) => {
                        html::inject_before_body(&body, snippet)
                    }
                    _ => body,
                };
                Reply::ok(content_type, body).with_header("Cache-Control", "no-cache")
            }
            Err(e) => {
                crate::log!("serve"; "failed to read {}: {}", path.display(), e);
                Reply::new(500, mime::types::PLAIN, "500 Internal Server Error")
            }
        }
    }

    fn fallback(&self, request: &RequestInfo) -> Option<Reply> {
        let last = request.path.rsplit('/').next().unwrap_or_default();
        if !self.history_fallback || last.contains('.') || !request.accepts_html() {
            return None;
        }
        let index = self.root.join("index.html");
        index.is_file().then(|| self.serve(&index))
    }
}

impl Middleware for BundleFiles {
    fn handle(&self, request: &RequestInfo) -> Option<Reply> {
        let relative = request.path.strip_prefix(self.public_path.as_str())?;
        if !relative.is_empty() && !relative.starts_with('/') {
            return None;
        }
        match resolve_path(relative, &self.root) {
            Some(path) => Some(self.serve(&path)),
            None => self.fallback(request),
        }
    }
}

/// Map a decoded URL path to a file under `root`, with `index.html` for
/// directories. Paths escaping `root` resolve to nothing.
pub fn resolve_path(url_path: &str, root: &Path) -> Option<PathBuf> {
    let clean = url_path.trim_matches('/');
    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    // Canonicalize so symlinks cannot escape the root either
    let canonical = root.join(clean).canonicalize().ok()?;
    let root_canonical = root.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }
    let index = canonical.join("index.html");
    (canonical.is_dir() && index.is_file()).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::middleware::Method;
    use tempfile::TempDir;

    fn bundle() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html><body>app</body></html>").unwrap();
        fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/index.html"), "<p>docs</p>").unwrap();
        dir
    }

    fn navigate(path: &str) -> RequestInfo {
        RequestInfo::new(Method::Get, path, Some("text/html".into()))
    }

    #[test]
    fn test_resolve_path() {
        let dir = bundle();
        assert!(resolve_path("/app.js", dir.path()).unwrap().ends_with("app.js"));
        assert!(resolve_path("/docs/", dir.path()).unwrap().ends_with("docs/index.html"));
        assert!(resolve_path("/", dir.path()).unwrap().ends_with("index.html"));
        assert!(resolve_path("/missing.js", dir.path()).is_none());
        assert!(resolve_path("/../etc/passwd", dir.path()).is_none());
    }

    #[test]
    fn test_serves_and_injects() {
        let dir = bundle();
        let files = BundleFiles::new(dir.path(), "/").with_injection("<script>x</script>");

        let page = files.handle(&RequestInfo::get("/")).unwrap();
        assert_eq!(page.body, b"<html><body>app<script>x</script></body></html>");

        let js = files.handle(&RequestInfo::get("/app.js")).unwrap();
        assert_eq!(js.content_type, mime::types::JAVASCRIPT);
        assert_eq!(js.body, b"console.log(1)");
    }

    #[test]
    fn test_history_fallback() {
        let dir = bundle();
        let plain = BundleFiles::new(dir.path(), "/");
        assert!(plain.handle(&navigate("/blog/post")).is_none());

        let spa = BundleFiles::new(dir.path(), "/").with_history_fallback();
        let reply = spa.handle(&navigate("/blog/post")).unwrap();
        assert_eq!(reply.body, b"<html><body>app</body></html>");
        // Missing assets and non-HTML requests still fall through
        assert!(spa.handle(&navigate("/missing.js")).is_none());
        assert!(spa.handle(&RequestInfo::get("/blog/post")).is_none());
    }

    #[test]
    fn test_public_path_prefix() {
        let dir = bundle();
        let files = BundleFiles::new(dir.path(), "/static/");
        assert!(files.handle(&RequestInfo::get("/static/app.js")).is_some());
        assert!(files.handle(&RequestInfo::get("/app.js")).is_none());
        assert!(files.handle(&RequestInfo::get("/staticapp.js")).is_none());
    }
}
