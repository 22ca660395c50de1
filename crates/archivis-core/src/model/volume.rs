/// A mounted external volume as reported by the platform query.
///
/// Descriptors are produced fresh on every query and never stored directly;
/// they are matched against [`RegistryEntry`](super::RegistryEntry) values
/// and copied into each [`Snapshot`](super::Snapshot).
use serde::{Deserialize, Serialize, Serializer};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeDescriptor {
    /// Platform device handle, e.g. "disk4s2", "sdb1" or "E:". May be empty.
    pub device_identifier: String,
    /// Filesystem UUID (or volume serial). May be empty.
    pub volume_uuid: String,
    /// Volume label. Always non-empty for descriptors returned by a query.
    pub volume_name: String,
    /// Written lossily: a mount point that is not valid UTF-8 must not make
    /// the whole snapshot unwritable.
    #[serde(serialize_with = "serialize_lossy")]
    pub mount_point: PathBuf,
    pub capacity_bytes: u64,
    pub free_bytes: u64,
    /// Filesystem type, "unknown" when the platform does not report one.
    pub file_system: String,
}

fn serialize_lossy<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}
