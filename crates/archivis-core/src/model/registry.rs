/// The persistent drive registry.
///
/// A single JSON document (`{"locations": [...]}`) holding one
/// [`RegistryEntry`] per drive identity ever assigned. Entries are only ever
/// appended; after creation the only fields that change are `last_scanned`
/// and `status`, which is why the entry list is not exposed mutably.
use super::volume::VolumeDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// What kind of storage location an entry describes.
///
/// Only external drives are managed here, but the registry may also hold
/// entries written by other tools. Their kind is kept verbatim so a load and
/// save cycle never loses or rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LocationKind {
    ExternalDrive,
    Other(String),
}

impl LocationKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ExternalDrive => "external_drive",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for LocationKind {
    fn from(kind: String) -> Self {
        if kind == "external_drive" {
            Self::ExternalDrive
        } else {
            Self::Other(kind)
        }
    }
}

impl From<LocationKind> for String {
    fn from(kind: LocationKind) -> Self {
        match kind {
            LocationKind::ExternalDrive => "external_drive".to_string(),
            LocationKind::Other(kind) => kind,
        }
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle tag of a registered drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveStatus {
    #[default]
    Active,
    /// Decommissioned by the owner; the codename stays reserved.
    Retired,
    /// Not seen for a long time or believed lost.
    Missing,
}

impl DriveStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Retired => "retired",
            Self::Missing => "missing",
        }
    }
}

impl fmt::Display for DriveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DriveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "retired" => Ok(Self::Retired),
            "missing" => Ok(Self::Missing),
            other => Err(format!(
                "unknown status '{other}' (expected active, retired or missing)"
            )),
        }
    }
}

/// Persistent record of one drive identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Uppercase codename. Primary key, never changes once assigned.
    pub id: String,
    pub kind: LocationKind,
    #[serde(default)]
    pub volume_uuid: String,
    #[serde(default)]
    pub device_identifier: String,
    pub name: String,
    #[serde(default)]
    pub capacity_bytes: u64,
    pub first_seen: DateTime<Utc>,
    pub last_scanned: DateTime<Utc>,
    #[serde(default)]
    pub status: DriveStatus,
    /// Fields this version does not know about, written back unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RegistryEntry {
    /// Build a fresh `external_drive` entry for a newly named volume.
    ///
    /// `name` is normalised to uppercase for the `id`; `first_seen` and
    /// `last_scanned` both start at `now`.
    pub fn new_external(name: &str, volume: &VolumeDescriptor, now: DateTime<Utc>) -> Self {
        let id = normalize_id(name);
        Self {
            name: id.clone(),
            id,
            kind: LocationKind::ExternalDrive,
            volume_uuid: volume.volume_uuid.clone(),
            device_identifier: volume.device_identifier.clone(),
            capacity_bytes: volume.capacity_bytes,
            first_seen: now,
            last_scanned: now,
            status: DriveStatus::Active,
            extra: serde_json::Map::new(),
        }
    }
}

/// Canonical form of a drive id: trimmed and uppercased.
pub fn normalize_id(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Why a name cannot be used as a drive id.
///
/// The id doubles as the stem of every snapshot file name, so it must be a
/// single plain path component.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum InvalidId {
    #[error("the name is empty")]
    Empty,
    #[error("'.' and '..' are reserved")]
    DotName,
    #[error("path separators are not allowed")]
    Separator,
    #[error("control characters are not allowed")]
    Control,
}

/// Check that `id` can name a drive and its snapshot files.
pub fn check_id(id: &str) -> Result<(), InvalidId> {
    let id = id.trim();
    if id.is_empty() {
        return Err(InvalidId::Empty);
    }
    if id == "." || id == ".." {
        return Err(InvalidId::DotName);
    }
    if id.contains(['/', '\\']) {
        return Err(InvalidId::Separator);
    }
    if id.chars().any(char::is_control) {
        return Err(InvalidId::Control);
    }
    Ok(())
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("drive id '{0}' is already registered")]
pub struct DuplicateId(pub String);

/// Ordered collection of registry entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    locations: Vec<RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Look up an entry by id, ignoring case.
    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        let wanted = normalize_id(id);
        self.locations
            .iter()
            .find(|loc| normalize_id(&loc.id) == wanted)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// First id that appears more than once, ignoring case.
    pub fn duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.locations
            .iter()
            .find(|loc| !seen.insert(normalize_id(&loc.id)))
            .map(|loc| loc.id.as_str())
    }

    /// Every id currently in use, uppercased.
    pub fn used_ids(&self) -> HashSet<String> {
        self.locations
            .iter()
            .map(|loc| normalize_id(&loc.id))
            .collect()
    }

    /// External drive entry whose volume UUID equals `uuid` exactly.
    /// An empty `uuid` never matches.
    pub fn find_by_uuid(&self, uuid: &str) -> Option<&RegistryEntry> {
        if uuid.is_empty() {
            return None;
        }
        self.external_drives().find(|loc| loc.volume_uuid == uuid)
    }

    /// External drive entry whose device identifier equals `device` exactly.
    /// An empty `device` never matches.
    pub fn find_by_device(&self, device: &str) -> Option<&RegistryEntry> {
        if device.is_empty() {
            return None;
        }
        self.external_drives()
            .find(|loc| loc.device_identifier == device)
    }

    fn external_drives(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.locations
            .iter()
            .filter(|loc| loc.kind == LocationKind::ExternalDrive)
    }

    /// Append a new entry. Rejects an id that collides case-insensitively.
    pub fn register(&mut self, entry: RegistryEntry) -> Result<(), DuplicateId> {
        if self.contains_id(&entry.id) {
            return Err(DuplicateId(entry.id));
        }
        self.locations.push(entry);
        Ok(())
    }

    /// Stamp `last_scanned` on the entry with `id`. Returns `false` if absent.
    pub fn touch_scanned(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        match self.get_mut(id) {
            Some(loc) => {
                loc.last_scanned = now;
                true
            }
            None => false,
        }
    }

    /// Change the lifecycle tag of the entry with `id`. Returns `false` if absent.
    pub fn set_status(&mut self, id: &str, status: DriveStatus) -> bool {
        match self.get_mut(id) {
            Some(loc) => {
                loc.status = status;
                true
            }
            None => false,
        }
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut RegistryEntry> {
        let wanted = normalize_id(id);
        self.locations
            .iter_mut()
            .find(|loc| normalize_id(&loc.id) == wanted)
    }
}
