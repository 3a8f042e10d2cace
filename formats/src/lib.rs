//! Typed records and parsers for the survey telemetry sources.
//!
//! Three kinds of files feed the pipeline:
//!
//! - the survey report (`.RPT`), one JSON document with route, capture and
//!   summary sections ([`parse_report`]),
//! - the per-capture timestamp log (`.MRK`), one text row per exposure
//!   ([`parse_log`]),
//! - per-image metadata, decoded from the extraction tool output into
//!   [`ImageMetadataRecord`] by the `rtkqa-exif` crate.
//!
//! All records are plain immutable values linked only by value (file path,
//! flight identifier, sequence index, spatial proximity).
//!

use std::path::PathBuf;

use thiserror::Error;

// Re-export for a shorter import path.
//
pub use mrk::*;
pub use photo::*;
pub use rpt::*;
pub use status::*;

mod mrk;
mod photo;
mod rpt;
mod status;

/// Errors raised while decoding a single telemetry source file.
///
/// These are local to one file: the caller records a warning and keeps
/// scanning, a bad file never aborts the run.
///
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed report {path}: {source}")]
    BadReport {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn version() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
