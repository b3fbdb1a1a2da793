//! Actor message definitions.
//!
//! ```text
//! Store/PageRegistry --events--> Dispatcher --trigger--> Workers --WsMsg--> WsActor
//! ```

use std::net::TcpStream;

use crate::reload::message::LiveMessage;

/// Messages to the WebSocket actor.
#[derive(Debug)]
pub enum WsMsg {
    /// Send to every connected client.
    Broadcast(LiveMessage),
    /// Rebuild failure: show the overlay now and on every new client.
    Error { path: String, error: String },
    /// Rebuild succeeded after a failure.
    ClearError,
    /// Accepted TCP stream awaiting the WebSocket handshake.
    AddClient(TcpStream),
    Shutdown,
}
