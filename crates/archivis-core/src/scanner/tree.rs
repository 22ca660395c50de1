/// Bounded-depth directory tree scanner.
///
/// Emission is bounded, aggregation is not: a directory at depth
/// `max_depth` is emitted but not descended into, yet its size and file
/// count still cover everything beneath it. The bounded walk is a serial
/// `jwalk` pass capped at `max_depth`; each emitted directory then runs its
/// own unbounded pass for those totals, so shared subtrees are walked
/// once per ancestor. Drive snapshots are shallow (depth 2 by default), which
/// keeps the repeated work to a small multiple of one full walk.
///
/// Only regular files count. Symlinks are neither followed nor counted, so a
/// link cycle on the drive cannot make the scan diverge.
use super::report::{ScanIssue, TreeScan};
use crate::model::DirectoryStat;
use jwalk::{Parallelism, WalkDir};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

/// Depth bound used for drive snapshots unless the caller overrides it.
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Scan `root` and emit a record for every directory at depth `<= max_depth`.
///
/// Traversal is depth-first pre-order: a directory's record precedes those
/// of its children. The root is always emitted, with relative path `/`,
/// even when it cannot be read.
pub fn scan_tree(root: &Path, max_depth: usize) -> TreeScan {
    let start = Instant::now();
    let mut scan = TreeScan::default();

    // jwalk does not read the children of entries at `max_depth`, so an
    // unreadable directory on the boundary is not an issue.
    let walker = WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .max_depth(max_depth)
        .parallelism(Parallelism::Serial);

    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Error walking {}: {err}", root.display());
                scan.issues.push(ScanIssue::from_walk_error(root, &err));
                continue;
            }
        };

        let path = if entry.depth == 0 {
            root.to_path_buf()
        } else {
            entry.path()
        };
        if !entry.file_type().is_dir() {
            if entry.depth == 0 {
                warn!("Scan root {} is not a directory", path.display());
                scan.issues.push(ScanIssue::new(&path, "not a directory"));
            }
            continue;
        }

        let (size_bytes, file_count) = subtree_totals(&path);
        scan.directories.push(DirectoryStat {
            relative_path: relative_path(root, &path),
            depth: entry.depth,
            size_bytes,
            file_count,
        });

        if let Some(err) = &entry.read_children_error {
            warn!("Cannot list {}: {err}", path.display());
            scan.issues.push(ScanIssue::from_walk_error(&path, err));
        }
    }

    if scan.root().map_or(true, |first| first.depth != 0) {
        scan.directories.insert(
            0,
            DirectoryStat {
                relative_path: "/".to_string(),
                depth: 0,
                size_bytes: 0,
                file_count: 0,
            },
        );
    }

    debug!(
        "Tree scan of {} complete: {} directories, {} issues in {:?}",
        root.display(),
        scan.directories.len(),
        scan.issues.len(),
        start.elapsed()
    );
    scan
}

/// Total size and count of regular files anywhere beneath `dir`.
///
/// Unreadable directories and files are skipped silently; their bytes are
/// simply missing from the totals.
pub fn subtree_totals(dir: &Path) -> (u64, u64) {
    let walker = WalkDir::new(dir)
        .skip_hidden(false)
        .follow_links(false)
        .parallelism(Parallelism::Serial);

    let mut size: u64 = 0;
    let mut count: u64 = 0;
    for entry in walker.into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(meta) = fs::symlink_metadata(entry.path()) {
            size += meta.len();
            count += 1;
        }
    }
    (size, count)
}

/// `/`-separated path of `path` below `root`; the root itself is `/`.
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = match path.strip_prefix(root) {
        Ok(rel) => rel,
        Err(_) => return path.to_string_lossy().into_owned(),
    };
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn root_is_slash() {
        let root = PathBuf::from("/mnt/drive");
        assert_eq!(relative_path(&root, &root), "/");
    }

    #[test]
    fn nested_paths_are_slash_prefixed() {
        let root = PathBuf::from("/mnt/drive");
        assert_eq!(relative_path(&root, &root.join("a")), "/a");
        assert_eq!(relative_path(&root, &root.join("a").join("b")), "/a/b");
    }

    #[test]
    fn file_root_is_an_issue_with_an_empty_root_record() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("image.iso");
        fs::write(&file, b"abc").unwrap();

        let scan = scan_tree(&file, 2);
        assert_eq!(scan.directories.len(), 1);
        assert_eq!(scan.directories[0].relative_path, "/");
        assert_eq!(scan.directories[0].file_count, 0);
        assert_eq!(scan.issues, vec![ScanIssue::new(&file, "not a directory")]);
    }

    #[test]
    fn hidden_directories_are_walked() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".cache/inner")).unwrap();
        fs::write(tmp.path().join(".cache/inner/blob"), b"12345").unwrap();

        let scan = scan_tree(tmp.path(), 2);
        let paths: Vec<&str> = scan
            .directories
            .iter()
            .map(|d| d.relative_path.as_str())
            .collect();
        assert_eq!(paths, ["/", "/.cache", "/.cache/inner"]);
        assert_eq!(scan.directories[0].size_bytes, 5);
    }

    #[test]
    fn missing_directory_totals_are_zero() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert_eq!(subtree_totals(&tmp.path().join("nope")), (0, 0));
    }
}
