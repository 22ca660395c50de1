/// Scanner module: shallow directory-tree snapshots of a mounted drive.
///
/// [`tree::scan_tree`] walks the drive depth-first and emits one
/// [`DirectoryStat`](crate::model::DirectoryStat) per directory down to a
/// depth bound, each carrying the full recursive size and file count of its
/// subtree. Unreadable entries never abort a scan; they are collected as
/// [`ScanIssue`]s alongside the results.
pub mod report;
pub mod tree;

pub use report::{ScanIssue, TreeScan};
pub use tree::{scan_tree, subtree_totals, DEFAULT_MAX_DEPTH};
