//! Bundler configuration for develop mode.
//!
//! The bundler itself is out of scope; this module assembles what it is
//! handed: output location, entries with the live client prepended, and
//! the constants it substitutes at build time.

pub mod compiler;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

pub use compiler::{CompileStats, CompilerHooks};

use crate::config::SiteConfig;
use crate::core::Mode;
use crate::embed::serve::CLIENT_PATH;
use crate::server::ServerEndpoints;

pub const SOCKET_ENDPOINT_DEFINE: &str = "process.env.SOCKET_ENDPOINT";
pub const GRAPHQL_ENDPOINT_DEFINE: &str = "process.env.GRAPHQL_ENDPOINT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleConfig {
    pub mode: Mode,
    pub output_dir: PathBuf,
    pub public_path: String,
    /// Entry name -> modules, live client first.
    pub entries: BTreeMap<String, Vec<String>>,
    /// Identifier -> JSON literal replacing it in bundled code.
    pub defines: BTreeMap<String, String>,
}

impl BundleConfig {
    pub fn assemble(config: &SiteConfig, endpoints: &ServerEndpoints) -> Self {
        let entries = config
            .build
            .entries
            .iter()
            .map(|(name, module)| (name.clone(), vec![CLIENT_PATH.to_string(), module.clone()]))
            .collect();

        let defines = BTreeMap::from([
            (SOCKET_ENDPOINT_DEFINE.to_string(), json_literal(&endpoints.socket.url)),
            (GRAPHQL_ENDPOINT_DEFINE.to_string(), json_literal(&endpoints.graphql.url)),
        ]);

        Self {
            mode: config.build.mode,
            output_dir: config.build.output.clone(),
            public_path: config.build.public_path.clone(),
            entries,
            defines,
        }
    }
}

fn json_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
