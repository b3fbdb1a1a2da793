//! Configuration section definitions.
//!
//! Each module corresponds to a section in `devloop.toml`:
//!
//! | Module  | TOML Section | Purpose                                 |
//! |---------|--------------|-----------------------------------------|
//! | `build` | `[build]`    | Mode, content/output/cache paths, entries |
//! | `serve` | `[serve]`    | Development server host and ports       |
//! | `pages` | `[[pages]]`  | Page rules turning nodes into routes    |

mod build;
mod pages;
mod serve;

pub use build::BuildConfig;
pub use pages::PageRule;
pub use serve::ServeConfig;
