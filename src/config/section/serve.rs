//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! host = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 8080            # HTTP port number
//! ws_port = 35729        # Live-update channel port
//! ```
//!
//! Use `host = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Development server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub host: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// WebSocket port for the live-update channel.
    pub ws_port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            ws_port: 35729,
        }
    }
}

impl ServeConfig {
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn ws_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.ws_port)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        // Port 0 means "any free port" and is allowed for both.
        if self.port != 0 && self.port == self.ws_port {
            diag.error_with_hint(
                "serve.ws_port",
                format!("live-update port {} clashes with the HTTP port", self.ws_port),
                "choose a different `ws_port`",
            );
        }
    }
}
