//! Live-update channel.
//!
//! - `message` - wire protocol
//! - `server` - WebSocket listener feeding the WsActor

pub mod message;
pub mod server;
