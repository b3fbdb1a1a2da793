//! The live-update client script.

use super::endpoints::ServerEndpoints;
use super::middleware::{Middleware, Reply, RequestInfo};
use crate::embed::serve::{CLIENT_JS, CLIENT_PATH, ClientVars};
use crate::utils::mime::types::JAVASCRIPT;

/// Serves the client with the endpoint constants baked in.
pub struct LiveClient {
    script: String,
}

impl LiveClient {
    pub fn new(endpoints: &ServerEndpoints) -> Self {
        let script = CLIENT_JS.render(&ClientVars {
            socket_endpoint: endpoints.socket.url.clone(),
            graphql_endpoint: endpoints.graphql.url.clone(),
        });
        Self { script }
    }
}

impl Middleware for LiveClient {
    fn handle(&self, request: &RequestInfo) -> Option<Reply> {
        (request.path == CLIENT_PATH).then(|| {
            Reply::ok(JAVASCRIPT, self.script.clone()).with_header("Cache-Control", "no-store")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serves_only_client_path() {
        let endpoints = ServerEndpoints::prepare("127.0.0.1:8080".parse().unwrap(), 35729);
        let client = LiveClient::new(&endpoints);

        let reply = client.handle(&RequestInfo::get(CLIENT_PATH)).unwrap();
        let body = String::from_utf8(reply.body).unwrap();
        assert!(body.contains("ws://localhost:35729"));
        assert!(client.handle(&RequestInfo::get("/app.js")).is_none());
    }
}
