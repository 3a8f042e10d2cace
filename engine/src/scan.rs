//! Recursive discovery of mission files under the chosen root.
//!
//! One flight identifier is assigned per folder that holds mission files.
//! The identifier is the folder path relative to the root (`.` for the
//! root itself); should two folders ever resolve to the same identifier,
//! a numeric suffix keeps them apart rather than failing the run.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::RunError;

/// Image formats handed to the extraction tool.
const IMAGE_EXTS: [&str; 5] = ["jpg", "jpeg", "tif", "tiff", "dng"];

/// One source file plus the flight identifier of its folder.
///
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub flight_id: String,
    pub path: PathBuf,
}

/// All mission files found under one root, in deterministic (sorted
/// traversal) order.
///
#[derive(Clone, Debug, Default)]
pub struct ScanSet {
    pub reports: Vec<SourceFile>,
    pub logs: Vec<SourceFile>,
    pub images: Vec<SourceFile>,
}

/// Allocates one stable identifier per mission folder.
///
#[derive(Debug, Default)]
struct FlightIds {
    by_dir: BTreeMap<PathBuf, String>,
    used: BTreeSet<String>,
}

impl FlightIds {
    fn id_for(&mut self, root: &Path, dir: &Path) -> String {
        if let Some(id) = self.by_dir.get(dir) {
            return id.clone();
        }
        let base = rel_id(root, dir);
        let id = if self.used.insert(base.clone()) {
            base
        } else {
            // identifier collision between distinct folders
            let mut n = 2;
            loop {
                let cand = format!("{base}-{n}");
                if self.used.insert(cand.clone()) {
                    break cand;
                }
                n += 1;
            }
        };
        self.by_dir.insert(dir.to_path_buf(), id.clone());
        id
    }
}

/// Folder path relative to the scan root, forward slashes, `.` at the root.
///
fn rel_id(root: &Path, dir: &Path) -> String {
    let rel = dir.strip_prefix(root).unwrap_or(dir);
    let s = rel.to_string_lossy().replace('\\', "/");
    if s.is_empty() {
        String::from(".")
    } else {
        s
    }
}

/// Walk the tree and sort every file into reports, logs and images by
/// extension. Anything else is ignored.
///
#[tracing::instrument]
pub fn scan_folder(root: &Path) -> Result<ScanSet, RunError> {
    if !root.is_dir() {
        return Err(RunError::NotAFolder(root.to_path_buf()));
    }

    let mut set = ScanSet::default();
    let mut ids = FlightIds::default();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        let dir = path.parent().unwrap_or(root);

        match ext.as_str() {
            "rpt" => set.reports.push(SourceFile {
                flight_id: ids.id_for(root, dir),
                path: path.to_path_buf(),
            }),
            "mrk" => set.logs.push(SourceFile {
                flight_id: ids.id_for(root, dir),
                path: path.to_path_buf(),
            }),
            e if IMAGE_EXTS.contains(&e) => set.images.push(SourceFile {
                flight_id: ids.id_for(root, dir),
                path: path.to_path_buf(),
            }),
            _ => {}
        }
    }

    debug!(
        "{}: {} reports, {} logs, {} images",
        root.display(),
        set.reports.len(),
        set.logs.len(),
        set.images.len()
    );
    Ok(set)
}
