use std::path::PathBuf;

use thiserror::Error;

use rtkqa_exif::ExtractError;

/// Hard failures that abort a run. Everything file-local is collected as
/// a warning on the run summary instead.
///
#[derive(Debug, Error)]
pub enum RunError {
    #[error("not a folder: {0}")]
    NotAFolder(PathBuf),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
