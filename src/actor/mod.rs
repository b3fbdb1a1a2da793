//! Actor system for the develop loop.
//!
//! ```text
//! Store ----signal---+
//!                    v
//!               Dispatcher --trigger--> Workers --WsMsg--> WsActor --> clients
//!                    ^                    |
//! PageRegistry --events------------------+
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `debounce` - Keyed deadline table
//! - `ws` - WebSocket broadcast
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod debounce;
pub mod messages;
pub mod ws;

pub use coordinator::{Collaborators, Coordinator};
