//! Embedded static resources.
//!
//! - `template` - typed placeholder substitution
//! - `serve` - dev server assets (live client, explore page)

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// URL the live client is served under.
    pub const CLIENT_PATH: &str = "/__devloop/client.js";

    /// Endpoint constants substituted into the live client.
    pub struct ClientVars {
        pub socket_endpoint: String,
        pub graphql_endpoint: String,
    }

    impl TemplateVars for ClientVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__SOCKET_ENDPOINT__", &js_string(&self.socket_endpoint))
                .replace("__GRAPHQL_ENDPOINT__", &js_string(&self.graphql_endpoint))
        }
    }

    pub const CLIENT_JS: Template<ClientVars> =
        Template::new(include_str!("serve/client.js"));

    /// `<script>` tag loading the live client.
    pub fn client_tag() -> String {
        format!(r#"<script src="{CLIENT_PATH}" defer></script>"#)
    }

    pub struct ExploreVars {
        /// Pre-rendered `<tr>` rows.
        pub rows: String,
        pub count: usize,
    }

    impl TemplateVars for ExploreVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__ROWS__", &self.rows)
                .replace("__COUNT__", &self.count.to_string())
                .replace("__VERSION__", env!("CARGO_PKG_VERSION"))
        }
    }

    pub const EXPLORE_HTML: Template<ExploreVars> =
        Template::new(include_str!("serve/explore.html"));

    fn js_string(value: &str) -> String {
        serde_json::to_string(value).unwrap_or_else(|_| "\"\"".into())
    }

}
