/// The volume-enumeration capability and the filter every platform shares.
use crate::model::VolumeDescriptor;

/// Source of currently attached external volumes.
///
/// A failing platform call must yield an empty list (after logging), never
/// an error: "no volumes" is a valid, if unproductive, run.
pub trait VolumeQuery {
    fn external_volumes(&self) -> Vec<VolumeDescriptor>;
}

impl<F> VolumeQuery for F
where
    F: Fn() -> Vec<VolumeDescriptor>,
{
    fn external_volumes(&self) -> Vec<VolumeDescriptor> {
        self()
    }
}

/// The real operating-system query.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemVolumes;

impl VolumeQuery for SystemVolumes {
    fn external_volumes(&self) -> Vec<VolumeDescriptor> {
        enumerate_external_volumes()
    }
}

/// A volume seen by a platform enumerator, before filtering.
///
/// Platforms fill in the flags from whatever signals they have; the
/// decision of what counts as a real external drive lives in [`Candidate::keep`].
#[derive(Debug, Clone)]
pub struct Candidate {
    pub descriptor: VolumeDescriptor,
    pub is_external: bool,
    pub is_mounted: bool,
    /// Backed by an image file (loop device, attached .dmg/.vhd, network block device).
    pub is_disk_image: bool,
    pub is_ram_disk: bool,
}

impl Candidate {
    pub fn keep(&self) -> bool {
        self.is_external
            && self.is_mounted
            && !self.descriptor.volume_name.trim().is_empty()
            && !self.is_disk_image
            && !self.is_ram_disk
            && !is_ephemeral_mount(&self.descriptor.mount_point.to_string_lossy())
    }
}

/// Mount points that belong to tooling rather than to a drive owner,
/// such as developer simulator runtimes.
fn is_ephemeral_mount(mount_point: &str) -> bool {
    mount_point.contains("/CoreSimulator/")
}

/// Enumerate external, mounted, physical volumes on this machine.
pub fn enumerate_external_volumes() -> Vec<VolumeDescriptor> {
    #[cfg(target_os = "linux")]
    {
        super::linux::enumerate()
    }
    #[cfg(windows)]
    {
        super::windows::enumerate()
    }
    #[cfg(not(any(target_os = "linux", windows)))]
    {
        tracing::warn!("External volume enumeration is not supported on this platform");
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn candidate(name: &str, mount: &str) -> Candidate {
        Candidate {
            descriptor: VolumeDescriptor {
                device_identifier: "sdb1".into(),
                volume_uuid: "1234-ABCD".into(),
                volume_name: name.into(),
                mount_point: PathBuf::from(mount),
                capacity_bytes: 1,
                free_bytes: 1,
                file_system: "exfat".into(),
            },
            is_external: true,
            is_mounted: true,
            is_disk_image: false,
            is_ram_disk: false,
        }
    }

    #[test]
    fn plain_external_volume_is_kept() {
        assert!(candidate("Photos", "/media/me/Photos").keep());
    }

    #[test]
    fn unnamed_volume_is_dropped() {
        assert!(!candidate("  ", "/media/me/x").keep());
    }

    #[test]
    fn virtual_volumes_are_dropped() {
        let mut c = candidate("Img", "/mnt/img");
        c.is_disk_image = true;
        assert!(!c.keep());

        let mut c = candidate("Ram", "/mnt/ram");
        c.is_ram_disk = true;
        assert!(!c.keep());

        let c = candidate(
            "iOS 17",
            "/Library/Developer/CoreSimulator/Volumes/iOS_21A328",
        );
        assert!(!c.keep());
    }

    #[test]
    fn internal_or_unmounted_volumes_are_dropped() {
        let mut c = candidate("Data", "/data");
        c.is_external = false;
        assert!(!c.keep());

        let mut c = candidate("Data", "");
        c.is_mounted = false;
        assert!(!c.keep());
    }

    #[test]
    fn closures_are_volume_queries() {
        let query = || vec![candidate("A", "/a").descriptor];
        assert_eq!(query.external_volumes().len(), 1);
    }
}
