/// Linux volume enumeration from the mount table and sysfs.
///
/// A block device counts as external when sysfs marks it (or its parent
/// disk) removable, or when its device path runs through a USB or
/// Thunderbolt controller. Loop and network block devices are disk images;
/// `ram` and `zram` devices are RAM disks. UUIDs and labels come from the
/// udev symlinks under `/dev/disk/by-uuid` and `/dev/disk/by-label`.
use super::volumes::Candidate;
use crate::model::VolumeDescriptor;
use std::collections::{HashMap, HashSet};
use std::ffi::CString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const MOUNT_TABLE: &str = "/proc/self/mounts";

/// One line of the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: PathBuf,
    pub fs_type: String,
}

pub fn enumerate() -> Vec<VolumeDescriptor> {
    let table = match fs::read_to_string(MOUNT_TABLE) {
        Ok(t) => t,
        Err(err) => {
            warn!("Cannot read {MOUNT_TABLE}: {err}");
            return Vec::new();
        }
    };

    let uuids = udev_links(Path::new("/dev/disk/by-uuid"));
    let labels = udev_links(Path::new("/dev/disk/by-label"));
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut volumes = Vec::new();

    for mount in parse_mount_table(&table) {
        if !mount.device.starts_with("/dev/") {
            continue;
        }
        let device = fs::canonicalize(&mount.device).unwrap_or_else(|_| PathBuf::from(&mount.device));
        // Bind mounts repeat the same device; keep the first mount point.
        if !seen.insert(device.clone()) {
            continue;
        }
        let kernel_name = match device.file_name() {
            Some(n) => n.to_string_lossy().into_owned(),
            None => continue,
        };

        let (capacity_bytes, free_bytes) = fs_space(&mount.mount_point).unwrap_or_else(|| {
            debug!("statvfs failed for {}", mount.mount_point.display());
            (0, 0)
        });

        let candidate = Candidate {
            descriptor: VolumeDescriptor {
                device_identifier: kernel_name.clone(),
                volume_uuid: uuids.get(&device).cloned().unwrap_or_default(),
                volume_name: labels.get(&device).cloned().unwrap_or_default(),
                mount_point: mount.mount_point.clone(),
                capacity_bytes,
                free_bytes,
                file_system: if mount.fs_type.is_empty() {
                    "unknown".to_string()
                } else {
                    mount.fs_type.clone()
                },
            },
            is_external: is_external_block(&kernel_name),
            is_mounted: !mount.mount_point.as_os_str().is_empty(),
            is_disk_image: is_image_device(&kernel_name),
            is_ram_disk: is_ram_device(&kernel_name),
        };

        if candidate.keep() {
            volumes.push(candidate.descriptor);
        } else {
            debug!("Ignoring {} mounted at {}", kernel_name, mount.mount_point.display());
        }
    }

    volumes
}

/// Parse `/proc/mounts` format: `device mountpoint fstype options dump pass`.
pub fn parse_mount_table(table: &str) -> Vec<MountEntry> {
    table
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mount_point = fields.next()?;
            let fs_type = fields.next().unwrap_or_default();
            Some(MountEntry {
                device: unescape_octal(device),
                mount_point: PathBuf::from(unescape_octal(mount_point)),
                fs_type: fs_type.to_string(),
            })
        })
        .collect()
}

/// Undo the kernel's `\ooo` escaping of spaces, tabs and backslashes.
pub fn unescape_octal(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 4 <= bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let v = digits.iter().fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                if let Ok(v) = u8::try_from(v) {
                    out.push(v);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Undo udev's `\xHH` escaping in `/dev/disk/by-label` names.
pub fn unescape_hex(name: &str) -> String {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && bytes.get(i + 1) == Some(&b'x') && i + 4 <= bytes.len() {
            let digits = std::str::from_utf8(&bytes[i + 2..i + 4]).unwrap_or("");
            if let Ok(v) = u8::from_str_radix(digits, 16) {
                out.push(v);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Map canonical device path -> decoded link name for a udev symlink dir.
fn udev_links(dir: &Path) -> HashMap<PathBuf, String> {
    let mut map = HashMap::new();
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(err) => {
            debug!("Cannot read {}: {err}", dir.display());
            return map;
        }
    };
    for entry in entries.flatten() {
        if let Ok(target) = fs::canonicalize(entry.path()) {
            let name = unescape_hex(&entry.file_name().to_string_lossy());
            map.insert(target, name);
        }
    }
    map
}

fn is_image_device(kernel_name: &str) -> bool {
    kernel_name.starts_with("loop") || kernel_name.starts_with("nbd")
}

fn is_ram_device(kernel_name: &str) -> bool {
    kernel_name.starts_with("ram") || kernel_name.starts_with("zram")
}

/// Removable flag or a USB/Thunderbolt hop in the sysfs device path.
fn is_external_block(kernel_name: &str) -> bool {
    let sys_path = match fs::canonicalize(Path::new("/sys/class/block").join(kernel_name)) {
        Ok(p) => p,
        Err(_) => return false,
    };
    if bus_is_hotplug(&sys_path.to_string_lossy()) {
        return true;
    }
    // Partitions carry no `removable` attribute; their parent disk does.
    let disk = if sys_path.join("partition").exists() {
        sys_path.parent().map(Path::to_path_buf).unwrap_or(sys_path)
    } else {
        sys_path
    };
    fs::read_to_string(disk.join("removable"))
        .map(|v| v.trim() == "1")
        .unwrap_or(false)
}

fn bus_is_hotplug(sys_path: &str) -> bool {
    sys_path.contains("/usb") || sys_path.contains("/thunderbolt")
}

/// Total and available bytes of the filesystem mounted at `mount_point`.
fn fs_space(mount_point: &Path) -> Option<(u64, u64)> {
    let c_path = CString::new(mount_point.as_os_str().as_bytes()).ok()?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return None;
    }
    let block = stat.f_frsize as u64;
    Some((stat.f_blocks as u64 * block, stat.f_bavail as u64 * block))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mount_lines_and_escapes() {
        let table = "\
/dev/sda2 / ext4 rw,relatime 0 0
proc /proc proc rw,nosuid 0 0
/dev/sdb1 /media/me/My\\040Photos exfat rw,nosuid 0 0
";
        let mounts = parse_mount_table(table);
        assert_eq!(mounts.len(), 3);
        assert_eq!(mounts[2].device, "/dev/sdb1");
        assert_eq!(mounts[2].mount_point, PathBuf::from("/media/me/My Photos"));
        assert_eq!(mounts[2].fs_type, "exfat");
    }

    #[test]
    fn unescape_octal_handles_backslash_and_trailing_text() {
        assert_eq!(unescape_octal("a\\134b"), "a\\b");
        assert_eq!(unescape_octal("tab\\011"), "tab\t");
        assert_eq!(unescape_octal("plain"), "plain");
        assert_eq!(unescape_octal("short\\04"), "short\\04");
    }

    #[test]
    fn unescape_hex_decodes_udev_labels() {
        assert_eq!(unescape_hex("My\\x20Drive"), "My Drive");
        assert_eq!(unescape_hex("NoEscapes"), "NoEscapes");
        assert_eq!(unescape_hex("bad\\xZZ"), "bad\\xZZ");
    }

    #[test]
    fn device_classes() {
        assert!(is_image_device("loop3"));
        assert!(is_image_device("nbd0p1"));
        assert!(is_ram_device("zram0"));
        assert!(!is_image_device("sdb1"));
        assert!(bus_is_hotplug(
            "/sys/devices/pci0000:00/0000:00:14.0/usb2/2-1/2-1:1.0/host6/target6:0:0/6:0:0:0/block/sdb/sdb1"
        ));
        assert!(!bus_is_hotplug("/sys/devices/pci0000:00/0000:00:17.0/ata1/host0/block/sda"));
    }
}
