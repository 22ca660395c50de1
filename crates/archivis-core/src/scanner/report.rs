/// Scan results and the non-fatal problems met along the way.
use crate::model::DirectoryStat;
use std::path::{Path, PathBuf};

/// A directory the scanner could not list (permission denied, I/O error).
///
/// Its own record is still emitted when it is within the depth bound; only
/// its children are missing from the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub message: String,
}

impl ScanIssue {
    pub fn new(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Issue for a walker error, attributed to the path jwalk reports or,
    /// failing that, to `fallback`.
    pub fn from_walk_error(fallback: &Path, err: &jwalk::Error) -> Self {
        let path = err.path().unwrap_or(fallback);
        match err.io_error() {
            Some(io) => Self::new(path, io.to_string()),
            None => Self::new(path, err.to_string()),
        }
    }
}

/// Output of one tree scan.
#[derive(Debug, Clone, Default)]
pub struct TreeScan {
    /// Emitted directories in pre-order. Sibling order follows jwalk's
    /// unsorted enumeration.
    pub directories: Vec<DirectoryStat>,
    pub issues: Vec<ScanIssue>,
}

impl TreeScan {
    pub fn root(&self) -> Option<&DirectoryStat> {
        self.directories.first()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}
