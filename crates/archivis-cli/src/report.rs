/// Text rendering for terminal output.
///
/// Every function here returns a `String` so the command layer decides where
/// it goes and tests can check the wording without a terminal.
use archivis_core::inventory::{DriveReport, InventoryEvent, RunSummary};
use archivis_core::model::size::{bytes_to_tib, format_count, format_size};
use archivis_core::model::Registry;
use archivis_core::store::Catalog;

const HEAVY_RULE: char = '=';
const LIGHT_RULE: char = '─';
const RULE_WIDTH: usize = 60;

fn rule(ch: char) -> String {
    std::iter::repeat(ch).take(RULE_WIDTH).collect()
}

pub fn scan_header() -> String {
    format!(
        "ARCHIVIS: External Drive Scanner\n{}\n\nDetecting external drives...",
        rule(HEAVY_RULE)
    )
}

/// Line(s) to print for one inventory event, if the event is user-visible.
pub fn event_lines(event: &InventoryEvent<'_>) -> Option<String> {
    match event {
        InventoryEvent::Detected { count: 0 } => Some("No external drives detected.".into()),
        InventoryEvent::Detected { count } => Some(format!("Found {count} external drive(s)")),
        InventoryEvent::Processing { volume } => Some(format!(
            "\nProcessing: {}\nDevice: {}\nMount point: {}",
            volume.volume_name,
            volume.device_identifier,
            volume.mount_point.display()
        )),
        InventoryEvent::Identified { volume, resolution } => Some(if resolution.is_new() {
            format!(
                "✓ Registered new drive: {} ({})",
                resolution.drive_id(),
                volume.volume_name
            )
        } else {
            format!("✓ Known drive: {}", resolution.drive_id())
        }),
        InventoryEvent::Skipped { volume, reason } => {
            Some(format!("⚠ Skipping {}: {reason}", volume.volume_name))
        }
        InventoryEvent::Scanning { drive_id } => Some(format!(
            "\nScanning {drive_id}...\n(This may take a few minutes for large drives)"
        )),
        InventoryEvent::Finished { report } => Some(drive_summary(report)),
    }
}

/// Boxed one-line summary of a scanned drive.
pub fn drive_summary(report: &DriveReport) -> String {
    let mut out = String::new();
    match &report.snapshot_path {
        Some(path) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            out.push_str(&format!("✓ Snapshot saved: {name}\n"));
        }
        None => out.push_str("⚠ Snapshot could not be written (see log)\n"),
    }
    out.push_str(&format!(
        "  {} in {} files\n",
        format_size(report.total_bytes),
        format_count(report.total_files)
    ));
    if report.issues > 0 {
        out.push_str(&format!(
            "⚠ {} director{} could not be read\n",
            report.issues,
            if report.issues == 1 { "y" } else { "ies" }
        ));
    }
    out.push_str(&format!(
        "\n{rule}\n✓ {} — {:.1} TB, {:.1} TB free, {} directories scanned\n{rule}",
        report.drive_id,
        bytes_to_tib(report.volume.capacity_bytes),
        bytes_to_tib(report.volume.free_bytes),
        format_count(report.directories as u64),
        rule = rule(LIGHT_RULE),
    ));
    out
}

/// Closing block of a scan run.
pub fn run_footer(summary: &RunSummary, catalog: &Catalog) -> String {
    let mut out = format!("\n{}\nScan complete!\n", rule(HEAVY_RULE));
    let scanned = summary.scanned().count();
    out.push_str(&format!(
        "Drives: {} found, {scanned} scanned, {} newly registered, {} skipped\n",
        summary.volumes_found(),
        summary.registered_count(),
        summary.skipped_count()
    ));
    if summary.snapshot_failures() > 0 {
        out.push_str(&format!(
            "Snapshot failures: {}\n",
            summary.snapshot_failures()
        ));
    }
    out.push_str(&format!(
        "Registry: {}\nSnapshots: {}",
        catalog.registry_path().display(),
        catalog.snapshots_dir().display()
    ));
    out
}

/// Fixed-width table of every registry entry.
pub fn registry_table(registry: &Registry) -> String {
    if registry.is_empty() {
        return "No drives registered yet.".into();
    }

    let id_width = registry
        .entries()
        .iter()
        .map(|e| e.id.chars().count())
        .max()
        .unwrap_or(0)
        .max("ID".len());

    let mut out = format!(
        "{:<id_width$}  {:<8}  {:>10}  {:<10}  {:<10}  UUID\n",
        "ID", "STATUS", "CAPACITY", "FIRST SEEN", "LAST SCAN"
    );
    for entry in registry.entries() {
        out.push_str(&format!(
            "{:<id_width$}  {:<8}  {:>10}  {:<10}  {:<10}  {}\n",
            entry.id,
            entry.status.label(),
            format_size(entry.capacity_bytes),
            entry.first_seen.format("%Y-%m-%d"),
            entry.last_scanned.format("%Y-%m-%d"),
            if entry.volume_uuid.is_empty() {
                "-"
            } else {
                entry.volume_uuid.as_str()
            },
        ));
    }
    out.push_str(&format!("{} drive(s)", registry.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivis_core::identity::Resolution;
    use archivis_core::inventory::VolumeOutcome;
    use archivis_core::model::size::TIB;
    use archivis_core::model::{DriveStatus, RegistryEntry, VolumeDescriptor};
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn volume() -> VolumeDescriptor {
        VolumeDescriptor {
            device_identifier: "sdb1".into(),
            volume_uuid: "ABC-123".into(),
            volume_name: "Media".into(),
            mount_point: PathBuf::from("/media/media"),
            capacity_bytes: (1.8 * TIB) as u64,
            free_bytes: (0.9 * TIB) as u64,
            file_system: "exfat".into(),
        }
    }

    fn report(snapshot: Option<&str>) -> DriveReport {
        DriveReport {
            drive_id: "NOVA".into(),
            volume: volume(),
            newly_registered: true,
            directories: 42,
            total_bytes: 3 * 1024 * 1024,
            total_files: 12_345,
            issues: 0,
            snapshot_path: snapshot.map(PathBuf::from),
        }
    }

    #[test]
    fn summary_line_has_capacity_free_and_directory_count() {
        let text = drive_summary(&report(Some("/cat/snapshots/NOVA-2024-03-01.json")));
        assert!(text.contains("✓ Snapshot saved: NOVA-2024-03-01.json"));
        assert!(text.contains("✓ NOVA — 1.8 TB, 0.9 TB free, 42 directories scanned"));
        assert!(text.contains("3.0 MB in 12,345 files"));
    }

    #[test]
    fn large_directory_counts_get_separators() {
        let mut r = report(None);
        r.directories = 12_000;
        assert!(drive_summary(&r).contains("12,000 directories scanned"));
    }

    #[test]
    fn summary_flags_missing_snapshot_and_unreadable_dirs() {
        let mut r = report(None);
        r.issues = 2;
        let text = drive_summary(&r);
        assert!(text.contains("Snapshot could not be written"));
        assert!(text.contains("2 directories could not be read"));
    }

    #[test]
    fn identified_event_distinguishes_new_and_known() {
        let vol = volume();
        let new = Resolution::Registered("NOVA".into());
        let known = Resolution::Known("NOVA".into());
        let line = event_lines(&InventoryEvent::Identified {
            volume: &vol,
            resolution: &new,
        })
        .unwrap();
        assert_eq!(line, "✓ Registered new drive: NOVA (Media)");
        let line = event_lines(&InventoryEvent::Identified {
            volume: &vol,
            resolution: &known,
        })
        .unwrap();
        assert_eq!(line, "✓ Known drive: NOVA");
    }

    #[test]
    fn zero_detected_says_so() {
        assert_eq!(
            event_lines(&InventoryEvent::Detected { count: 0 }).unwrap(),
            "No external drives detected."
        );
    }

    #[test]
    fn footer_names_registry_and_snapshot_locations() {
        let catalog = Catalog::new("/cat");
        let summary = RunSummary {
            outcomes: vec![VolumeOutcome::Scanned(report(None))],
        };
        let text = run_footer(&summary, &catalog);
        assert!(text.contains("1 found, 1 scanned, 1 newly registered, 0 skipped"));
        assert!(text.contains("Snapshot failures: 1"));
        assert!(text.contains(&format!(
            "Registry: {}",
            catalog.registry_path().display()
        )));
        assert!(text.contains(&format!(
            "Snapshots: {}",
            catalog.snapshots_dir().display()
        )));
    }

    #[test]
    fn table_lists_every_entry() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut reg = Registry::new();
        reg.register(RegistryEntry::new_external("nova", &volume(), at))
            .unwrap();
        let mut other = volume();
        other.volume_uuid.clear();
        reg.register(RegistryEntry::new_external("groot", &other, at))
            .unwrap();
        reg.set_status("GROOT", DriveStatus::Retired);

        let table = registry_table(&reg);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].starts_with("NOVA"));
        assert!(lines[1].contains("2024-03-01"));
        assert!(lines[2].contains("retired"));
        assert!(lines[2].trim_end().ends_with('-'));
        assert_eq!(lines[3], "2 drive(s)");
    }

    #[test]
    fn empty_registry_table() {
        assert_eq!(registry_table(&Registry::new()), "No drives registered yet.");
    }
}
