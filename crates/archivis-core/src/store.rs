/// On-disk catalog layout and JSON persistence.
///
/// ```text
/// <home>/
///   config/naming_rules.json
///   registry/drives.json
///   snapshots/<ID>-<YYYY-MM-DD>.json
///   notes/
/// ```
///
/// The registry is always rewritten in full (load, modify, store). That is
/// only safe because a single archivis process owns the catalog at a time.
use crate::error::CatalogError;
use crate::model::{Registry, Snapshot};
use crate::naming::NamingRules;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const NAMING_RULES_FILE: &str = "naming_rules.json";
pub const REGISTRY_FILE: &str = "drives.json";

#[derive(Debug, Clone)]
pub struct Catalog {
    home: PathBuf,
}

impl Catalog {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config_dir(&self) -> PathBuf {
        self.home.join("config")
    }

    pub fn registry_dir(&self) -> PathBuf {
        self.home.join("registry")
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.home.join("snapshots")
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.home.join("notes")
    }

    pub fn naming_rules_path(&self) -> PathBuf {
        self.config_dir().join(NAMING_RULES_FILE)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.registry_dir().join(REGISTRY_FILE)
    }

    pub fn snapshot_path(&self, drive_id: &str, day: NaiveDate) -> PathBuf {
        self.snapshots_dir().join(Snapshot::file_name(drive_id, day))
    }

    /// Create every catalog directory and, if absent, a starter naming-rules
    /// document. Returns `true` when the rules file was written.
    pub fn init_layout(&self) -> Result<bool, CatalogError> {
        for dir in [
            self.config_dir(),
            self.registry_dir(),
            self.snapshots_dir(),
            self.notes_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(|e| CatalogError::io(&dir, e))?;
        }

        let rules_path = self.naming_rules_path();
        if rules_path.exists() {
            return Ok(false);
        }
        write_json(&rules_path, &NamingRules::starter(), "naming rules")?;
        info!("Wrote starter naming rules to {}", rules_path.display());
        Ok(true)
    }

    /// Load and validate the naming rules. Missing or malformed is fatal.
    pub fn load_naming_rules(&self) -> Result<NamingRules, CatalogError> {
        let path = self.naming_rules_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CatalogError::NamingRulesMissing(path));
            }
            Err(e) => return Err(CatalogError::io(&path, e)),
        };
        let rules: NamingRules = serde_json::from_str(&text)
            .map_err(|source| CatalogError::NamingRulesMalformed { path, source })?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load the registry, creating and persisting an empty one on first use.
    ///
    /// Ids that clash case-insensitively make the document unusable, since
    /// lookups could only ever reach the first of them.
    pub fn load_registry(&self) -> Result<Registry, CatalogError> {
        let path = self.registry_path();
        match fs::read_to_string(&path) {
            Ok(text) => {
                let registry: Registry = match serde_json::from_str(&text) {
                    Ok(registry) => registry,
                    Err(source) => return Err(CatalogError::RegistryMalformed { path, source }),
                };
                if let Some(id) = registry.duplicate_id() {
                    return Err(CatalogError::RegistryDuplicateId {
                        id: id.to_string(),
                        path,
                    });
                }
                Ok(registry)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No registry at {}; creating an empty one", path.display());
                let registry = Registry::new();
                self.save_registry(&registry)?;
                Ok(registry)
            }
            Err(e) => Err(CatalogError::io(&path, e)),
        }
    }

    /// Rewrite the registry document in full.
    pub fn save_registry(&self, registry: &Registry) -> Result<(), CatalogError> {
        let path = self.registry_path();
        write_json(&path, registry, "registry")?;
        debug!(
            "Saved registry ({} entries) to {}",
            registry.len(),
            path.display()
        );
        Ok(())
    }

    /// Write `snapshot` as the snapshot of its drive for `day`, replacing any
    /// earlier snapshot from the same day.
    pub fn write_snapshot(
        &self,
        snapshot: &Snapshot,
        day: NaiveDate,
    ) -> Result<PathBuf, CatalogError> {
        let path = self.snapshot_path(&snapshot.drive_id, day);
        write_json(&path, snapshot, "snapshot")?;
        Ok(path)
    }

    pub fn read_snapshot(&self, path: &Path) -> Result<Snapshot, CatalogError> {
        let text = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| CatalogError::Json {
            what: "snapshot",
            source,
        })
    }
}

/// Pretty-print `value` to `path` via a sibling temp file and a rename, so a
/// crash mid-write never leaves a truncated document behind.
fn write_json<T: Serialize>(path: &Path, value: &T, what: &'static str) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
    }
    let mut text =
        serde_json::to_string_pretty(value).map_err(|source| CatalogError::Json { what, source })?;
    text.push('\n');

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text).map_err(|e| CatalogError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| CatalogError::io(path, e))
}
