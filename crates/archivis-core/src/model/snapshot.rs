/// Snapshot records: one shallow directory scan of one drive.
///
/// Snapshots are write-once-per-day artifacts keyed by drive id and local
/// calendar date. Nothing in the inventory pass reads them back.
use super::volume::VolumeDescriptor;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate statistics for one emitted directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryStat {
    /// Path relative to the scan root, `/`-separated. The root itself is `/`.
    pub relative_path: String,
    /// 0 for the root.
    pub depth: usize,
    /// Sum of every regular file beneath this directory, at any depth.
    pub size_bytes: u64,
    /// Number of regular files beneath this directory, at any depth.
    pub file_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub drive_id: String,
    pub scan_date: DateTime<Utc>,
    pub drive_info: VolumeDescriptor,
    pub directories: Vec<DirectoryStat>,
}

impl Snapshot {
    /// File name for a snapshot of `drive_id` taken on `day`,
    /// e.g. `NOVA-2024-03-01.json`.
    pub fn file_name(drive_id: &str, day: NaiveDate) -> String {
        format!("{drive_id}-{}.json", day.format("%Y-%m-%d"))
    }

    /// The root record, if the scan emitted one.
    pub fn root(&self) -> Option<&DirectoryStat> {
        self.directories.iter().find(|d| d.depth == 0)
    }
}
