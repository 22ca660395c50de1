/// Platform-specific functionality: enumerating the external volumes that
/// are currently attached and mounted.
///
/// Only Linux and Windows have a native implementation. Elsewhere the
/// system query reports no volumes and logs a warning.
#[cfg(target_os = "linux")]
pub mod linux;
pub mod volumes;
#[cfg(windows)]
pub mod windows;

pub use volumes::{enumerate_external_volumes, Candidate, SystemVolumes, VolumeQuery};
