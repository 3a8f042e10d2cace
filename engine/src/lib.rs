//! Core pipeline: scan a mission folder tree, fuse the telemetry sources
//! into per-photo records, classify quality and assemble the three layers
//! handed to the rendering host.
//!
//! Every stage consumes an immutable snapshot and returns a new one; there
//! is no shared mutable state between stages and nothing outlives one run.
//!

// Re-export for a shorter import path.
//
pub use config::*;
pub use error::*;
pub use flight::*;
pub use fuse::*;
pub use layers::*;
pub use pipeline::*;
pub use quality::*;
pub use scan::*;

mod config;
mod error;
mod flight;
mod fuse;
mod layers;
mod pipeline;
mod quality;
mod scan;

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
