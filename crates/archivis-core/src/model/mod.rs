/// Data model for the drive catalog.
///
/// Re-exports the persistent registry types, the transient volume
/// descriptor, snapshot records and size helpers.
pub mod registry;
pub mod size;
pub mod snapshot;
pub mod volume;

pub use registry::{DriveStatus, LocationKind, Registry, RegistryEntry};
pub use snapshot::{DirectoryStat, Snapshot};
pub use volume::VolumeDescriptor;
