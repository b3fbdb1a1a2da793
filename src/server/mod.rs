//! Development HTTP server with lifecycle hooks.
//!
//! ```text
//! DevServer (Created) --listen()--> ListeningServer (Listening) --close()--> Closed
//!                          |
//!                          +-- bind, fire setup, fire after_setup, on_listen
//! ```
//!
//! # Modules
//!
//! - `endpoints` - public URLs (local, network, graphql, socket, explore)
//! - `hooks` - `setup` / `after_setup` stages
//! - `middleware` - request chain
//! - `client` - live client script
//! - `static_files` - bundle directory serving
//! - `explore` - page data inspection
//! - `response` - tiny_http glue

pub mod client;
pub mod endpoints;
pub mod explore;
pub mod hooks;
pub mod middleware;
mod response;
pub mod static_files;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use thiserror::Error;
use tiny_http::Server;

pub use endpoints::ServerEndpoints;
pub use hooks::{HookPipeline, ServerSetup};
pub use middleware::MiddlewareChain;

use crate::config::ServeConfig;

/// Request handler threads.
const POOL_THREADS: usize = 4;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: SocketAddr, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerState {
    Created = 0,
    Listening = 1,
    Closed = 2,
}

impl ServerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Listening,
            _ => Self::Closed,
        }
    }
}

/// A server that has not been bound yet. Hooks are registered here.
#[derive(Debug)]
pub struct DevServer {
    addr: SocketAddr,
    ws_port: u16,
    endpoints: ServerEndpoints,
    hooks: HookPipeline,
}

impl DevServer {
    /// `ws_port` is the bound port of the live-update channel.
    pub fn new(serve: &ServeConfig, ws_port: u16) -> Self {
        let addr = serve.http_addr();
        Self {
            addr,
            ws_port,
            endpoints: ServerEndpoints::prepare(addr, ws_port),
            hooks: HookPipeline::default(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ServerState {
        ServerState::Created
    }

    /// Endpoints from the configured address. With port 0 the final
    /// endpoints are only known once listening.
    pub fn endpoints(&self) -> &ServerEndpoints {
        &self.endpoints
    }

    pub fn hooks_mut(&mut self) -> &mut HookPipeline {
        &mut self.hooks
    }

    /// Bind, run the lifecycle hooks, then call `on_listen`.
    ///
    /// Bind failure is returned as is; nothing is retried.
    pub fn listen(
        mut self,
        on_listen: impl FnOnce(&ServerEndpoints),
    ) -> Result<ListeningServer, ServerError> {
        let server = Server::http(self.addr).map_err(|e| ServerError::Bind {
            addr: self.addr,
            reason: e.to_string(),
        })?;
        let addr = server.server_addr().to_ip().unwrap_or(self.addr);

        let endpoints = ServerEndpoints::prepare(addr, self.ws_port);
        let mut setup = ServerSetup::new(endpoints.clone());
        self.hooks.fire(&mut setup);
        let chain = setup.into_chain();
        crate::debug!("serve"; "{} middleware installed", chain.len());

        let listening = ListeningServer {
            server: Arc::new(server),
            addr,
            endpoints,
            chain: Arc::new(chain),
            state: Arc::new(AtomicU8::new(ServerState::Listening as u8)),
        };
        on_listen(&listening.endpoints);
        Ok(listening)
    }
}

pub struct ListeningServer {
    server: Arc<Server>,
    addr: SocketAddr,
    endpoints: ServerEndpoints,
    chain: Arc<MiddlewareChain>,
    state: Arc<AtomicU8>,
}

impl ListeningServer {
    #[cfg(test)]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn endpoints(&self) -> &ServerEndpoints {
        &self.endpoints
    }

    pub fn state(&self) -> ServerState {
        ServerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// A handle that can close the server from another thread.
    pub fn closer(&self) -> ServerCloser {
        ServerCloser {
            server: Arc::clone(&self.server),
            state: Arc::clone(&self.state),
        }
    }

    /// Serve requests until closed (blocking).
    pub fn run(&self) -> anyhow::Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(POOL_THREADS)
            .thread_name(|i| format!("devloop-http-{i}"))
            .build()?;

        for request in self.server.incoming_requests() {
            if self.is_closed() {
                if let Err(e) = response::respond_unavailable(request) {
                    crate::debug!("serve"; "late request: {e}");
                }
                break;
            }
            let chain = Arc::clone(&self.chain);
            let state = Arc::clone(&self.state);
            pool.spawn(move || {
                if let Err(e) = handle_request(request, &chain, &state) {
                    crate::log!("serve"; "request error: {e}");
                }
            });
        }

        self.state.store(ServerState::Closed as u8, Ordering::SeqCst);
        crate::debug!("serve"; "request loop stopped");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.state() == ServerState::Closed || crate::core::is_shutdown()
    }
}

#[derive(Clone)]
pub struct ServerCloser {
    server: Arc<Server>,
    state: Arc<AtomicU8>,
}

impl ServerCloser {
    pub fn close(&self) {
        self.state.store(ServerState::Closed as u8, Ordering::SeqCst);
        self.server.unblock();
    }
}

fn handle_request(
    request: tiny_http::Request,
    chain: &MiddlewareChain,
    state: &AtomicU8,
) -> anyhow::Result<()> {
    if ServerState::from_u8(state.load(Ordering::SeqCst)) == ServerState::Closed
        || crate::core::is_shutdown()
    {
        return response::respond_unavailable(request);
    }

    let info = response::request_info(&request);
    crate::debug!("serve"; "{:?} {}", info.method, info.path);
    let reply = chain.handle(&info);
    response::respond(request, reply, info.is_head())
}

#[cfg(test)]
mod tests;
