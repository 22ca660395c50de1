/// Inventory pass: identify, scan and snapshot every attached external drive.
///
/// Volumes are processed strictly one after another, in the order the query
/// returned them:
///
/// 1. resolve identity (a new identity is persisted before anything else),
/// 2. scan the tree to the configured depth,
/// 3. write the day's snapshot,
/// 4. stamp `last_scanned` and persist the registry.
///
/// A volume that cannot be named is skipped. A snapshot that cannot be
/// written is reported and the identity stays registered; nothing is rolled
/// back. Only a registry that cannot be saved ends the run early.
use crate::error::CatalogError;
use crate::identity::{ConfirmName, IdentityResolver, Resolution, ResolveError};
use crate::model::{Registry, Snapshot, VolumeDescriptor};
use crate::naming::NamingRules;
use crate::platform::VolumeQuery;
use crate::scanner::{scan_tree, DEFAULT_MAX_DEPTH};
use crate::store::Catalog;
use chrono::{Local, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

/// Progress notifications for a frontend, sent as the pass advances.
#[derive(Debug)]
pub enum InventoryEvent<'a> {
    /// The query finished; this many volumes will be processed.
    Detected { count: usize },
    /// About to resolve this volume.
    Processing { volume: &'a VolumeDescriptor },
    /// Identity resolved (existing or newly registered).
    Identified {
        volume: &'a VolumeDescriptor,
        resolution: &'a Resolution,
    },
    /// Volume skipped without scanning.
    Skipped {
        volume: &'a VolumeDescriptor,
        reason: &'a ResolveError,
    },
    /// Tree scan starting.
    Scanning { drive_id: &'a str },
    /// Drive fully handled.
    Finished { report: &'a DriveReport },
}

/// What happened to one scanned drive.
#[derive(Debug, Clone)]
pub struct DriveReport {
    pub drive_id: String,
    pub volume: VolumeDescriptor,
    pub newly_registered: bool,
    pub directories: usize,
    /// Size and count of every regular file on the drive (the root record).
    pub total_bytes: u64,
    pub total_files: u64,
    pub issues: usize,
    /// `None` when the snapshot could not be written.
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum VolumeOutcome {
    Scanned(DriveReport),
    Skipped {
        volume: VolumeDescriptor,
        reason: ResolveError,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outcomes: Vec<VolumeOutcome>,
}

impl RunSummary {
    pub fn volumes_found(&self) -> usize {
        self.outcomes.len()
    }

    pub fn scanned(&self) -> impl Iterator<Item = &DriveReport> {
        self.outcomes.iter().filter_map(|o| match o {
            VolumeOutcome::Scanned(report) => Some(report),
            VolumeOutcome::Skipped { .. } => None,
        })
    }

    pub fn registered_count(&self) -> usize {
        self.scanned().filter(|r| r.newly_registered).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, VolumeOutcome::Skipped { .. }))
            .count()
    }

    pub fn snapshot_failures(&self) -> usize {
        self.scanned().filter(|r| r.snapshot_path.is_none()).count()
    }
}

pub struct Inventory<'a> {
    catalog: &'a Catalog,
    resolver: IdentityResolver<'a>,
    max_depth: usize,
}

impl<'a> Inventory<'a> {
    pub fn new(catalog: &'a Catalog, rules: &'a NamingRules) -> Self {
        Self {
            catalog,
            resolver: IdentityResolver::new(rules),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Process every volume `query` reports.
    ///
    /// `registry` is the loaded registry; it is saved through the catalog
    /// after each mutation.
    pub fn run(
        &self,
        registry: &mut Registry,
        query: &dyn VolumeQuery,
        confirm: &mut dyn ConfirmName,
        on_event: &mut dyn FnMut(InventoryEvent<'_>),
    ) -> Result<RunSummary, CatalogError> {
        let volumes = query.external_volumes();
        info!("Found {} external volume(s)", volumes.len());
        on_event(InventoryEvent::Detected {
            count: volumes.len(),
        });

        let mut summary = RunSummary::default();
        for volume in volumes {
            let outcome = self.process(&volume, registry, confirm, on_event)?;
            summary.outcomes.push(outcome);
        }
        Ok(summary)
    }

    fn process(
        &self,
        volume: &VolumeDescriptor,
        registry: &mut Registry,
        confirm: &mut dyn ConfirmName,
        on_event: &mut dyn FnMut(InventoryEvent<'_>),
    ) -> Result<VolumeOutcome, CatalogError> {
        on_event(InventoryEvent::Processing { volume });

        let resolution = match self.resolver.resolve(volume, registry, confirm, Utc::now()) {
            Ok(resolution) => resolution,
            Err(reason) => {
                warn!("Skipping volume {}: {reason}", volume.volume_name);
                on_event(InventoryEvent::Skipped {
                    volume,
                    reason: &reason,
                });
                return Ok(VolumeOutcome::Skipped {
                    volume: volume.clone(),
                    reason,
                });
            }
        };
        if resolution.is_new() {
            self.catalog.save_registry(registry)?;
        }
        on_event(InventoryEvent::Identified {
            volume,
            resolution: &resolution,
        });

        let drive_id = resolution.drive_id().to_string();
        on_event(InventoryEvent::Scanning {
            drive_id: &drive_id,
        });
        info!(
            "Scanning {drive_id} at {} (depth {})",
            volume.mount_point.display(),
            self.max_depth
        );
        let tree = scan_tree(&volume.mount_point, self.max_depth);
        let directories = tree.directories.len();
        let issues = tree.issues.len();
        let (total_bytes, total_files) = tree
            .root()
            .map_or((0, 0), |root| (root.size_bytes, root.file_count));

        let snapshot = Snapshot {
            drive_id: drive_id.clone(),
            scan_date: Utc::now(),
            drive_info: volume.clone(),
            directories: tree.directories,
        };
        let snapshot_path = match self
            .catalog
            .write_snapshot(&snapshot, Local::now().date_naive())
        {
            Ok(path) => {
                info!("Snapshot saved: {}", path.display());
                Some(path)
            }
            Err(err) => {
                warn!("Failed to write snapshot for {drive_id}: {err}");
                None
            }
        };

        if !registry.touch_scanned(&drive_id, Utc::now()) {
            warn!("Drive {drive_id} vanished from the registry before its timestamp update");
        }
        self.catalog.save_registry(registry)?;

        let report = DriveReport {
            drive_id,
            volume: volume.clone(),
            newly_registered: resolution.is_new(),
            directories,
            total_bytes,
            total_files,
            issues,
            snapshot_path,
        };
        on_event(InventoryEvent::Finished { report: &report });
        Ok(VolumeOutcome::Scanned(report))
    }
}
