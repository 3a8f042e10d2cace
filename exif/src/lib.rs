//! Boundary to the external image-metadata extraction tool.
//!
//! The pipeline never reads image files itself; everything arrives through
//! an [`Extractor`]. The shipped implementation drives `exiftool` as a
//! subprocess in batches; tests substitute a canned implementation, so the
//! core stays testable without any external process.
//!

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::PathBuf;

use thiserror::Error;

use rtkqa_formats::ImageMetadataRecord;

pub use exiftool::*;

mod exiftool;

/// Errors from the extraction boundary.
///
/// `ToolUnavailable` is the one hard failure of a run: without metadata
/// every photo record would be empty, so it aborts before any batch.
///
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("metadata tool unavailable: {hint}")]
    ToolUnavailable { hint: String },
    #[error("batch invocation failed: {0}")]
    BatchFailed(String),
    #[error("cannot decode tool output: {0}")]
    BadOutput(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A callable metadata-extraction capability.
///
pub trait Extractor: Debug {
    /// Human-readable tool identifier.
    fn name(&self) -> String;

    /// Liveness check, run once before any batch. Returns the tool version.
    fn ensure(&self) -> Result<String, ExtractError>;

    /// Read metadata for `files` in batches of `chunk`, keyed by path.
    ///
    /// Batches are independent units of work; results join by file path,
    /// so dispatch order never affects the outcome. Every requested file
    /// gets an entry, null-fielded when its metadata could not be read.
    fn batch_read(
        &self,
        files: &[PathBuf],
        chunk: usize,
    ) -> Result<BTreeMap<PathBuf, ImageMetadataRecord>, ExtractError>;
}

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
