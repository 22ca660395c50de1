/// Archivis Core: drive identity, naming, registry and tree scanning.
///
/// This crate contains all business logic with no terminal dependencies.
/// Frontends supply the two external capabilities (volume enumeration and
/// name confirmation) and drive the [`inventory`] orchestrator.
///
/// # Modules
///
/// - [`model`]: Registry entries, volume descriptors, snapshots and size formatting.
/// - [`naming`]: Capacity-tiered codename pools and the name allocator.
/// - [`identity`]: Matching detected volumes to registry identities.
/// - [`scanner`]: Bounded-depth directory tree scanner.
/// - [`platform`]: External volume enumeration per operating system.
/// - [`store`]: On-disk catalog layout (config, registry, snapshots).
/// - [`inventory`]: One full pass over every attached external drive.
pub mod error;
pub mod identity;
pub mod inventory;
pub mod model;
pub mod naming;
pub mod platform;
pub mod scanner;
pub mod store;

pub use error::CatalogError;
