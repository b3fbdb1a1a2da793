//! Public URLs of a running dev server.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use owo_colors::OwoColorize;
use serde::Serialize;

pub const EXPLORE_PATH: &str = "/___explore";
pub const GRAPHQL_PATH: &str = "/___graphql";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub url: String,
    /// `url` with the port highlighted, for terminal output.
    #[serde(skip)]
    pub pretty: String,
}

impl Endpoint {
    fn new(scheme: &str, host: &str, port: u16, path: &str) -> Self {
        Self {
            url: format!("{scheme}://{host}:{port}{path}"),
            pretty: format!("{scheme}://{host}:{}{path}", port.bold()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerEndpoints {
    pub local: Endpoint,
    /// LAN address, when bound to a non-loopback interface.
    pub network: Option<Endpoint>,
    pub graphql: Endpoint,
    pub socket: Endpoint,
    pub explore: Endpoint,
}

impl ServerEndpoints {
    pub fn prepare(http: SocketAddr, ws_port: u16) -> Self {
        let local_host = match http.ip() {
            ip if ip.is_unspecified() || ip.is_loopback() => "localhost".to_string(),
            ip => display_host(ip),
        };
        let network = network_ip(http.ip())
            .map(|ip| Endpoint::new("http", &display_host(ip), http.port(), "/"));

        Self {
            local: Endpoint::new("http", &local_host, http.port(), "/"),
            network,
            graphql: Endpoint::new("http", &local_host, http.port(), GRAPHQL_PATH),
            socket: Endpoint::new("ws", &local_host, ws_port, ""),
            explore: Endpoint::new("http", &local_host, http.port(), EXPLORE_PATH),
        }
    }
}

fn display_host(ip: IpAddr) -> String {
    match ip {
        IpAddr::V6(v6) => format!("[{v6}]"),
        IpAddr::V4(v4) => v4.to_string(),
    }
}

/// Address other machines can reach: the bound interface itself, or the
/// primary outbound interface when bound to all of them.
fn network_ip(bound: IpAddr) -> Option<IpAddr> {
    if bound.is_loopback() {
        return None;
    }
    if !bound.is_unspecified() {
        return Some(bound);
    }
    // Connecting a UDP socket sends nothing; it only selects a route.
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(10, 255, 255, 255), 1)).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_loopback() && !ip.is_unspecified()).then_some(ip)
}
