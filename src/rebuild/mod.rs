//! Rebuild decisions and route artifacts.
//!
//! - `action` - the three rebuild actions
//! - `classify` - page mutation to action
//! - `routes` - route manifest generation

pub mod action;
pub mod classify;
pub mod routes;

pub use action::RebuildAction;
pub use classify::classify_event;
pub use routes::{ManifestWriter, RouteGenerator};
