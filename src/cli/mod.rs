//! Command-line interface module.

mod args;
pub mod develop;

pub use args::{Cli, Commands};
