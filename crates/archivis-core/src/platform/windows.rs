/// Drive enumeration using the Windows API.
///
/// Removable drives always count as external. Fixed drives count too,
/// except the system drive, because USB hard disks report themselves as
/// fixed. Network, optical and RAM-disk drive types are skipped. The volume
/// serial number stands in for the filesystem UUID and the drive letter is
/// the device identifier.
use super::volumes::Candidate;
use crate::model::VolumeDescriptor;
use ::windows::core::PCWSTR;
use ::windows::Win32::Storage::FileSystem::{
    GetDiskFreeSpaceExW, GetDriveTypeW, GetLogicalDriveStringsW, GetVolumeInformationW,
};
use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use std::path::PathBuf;

// Drive type constants from the Windows API.
const DRIVE_REMOVABLE_VAL: u32 = 2;
const DRIVE_FIXED_VAL: u32 = 3;
const DRIVE_RAMDISK_VAL: u32 = 6;

pub fn enumerate() -> Vec<VolumeDescriptor> {
    let mut volumes = Vec::new();

    // GetLogicalDriveStringsW returns null-separated drive root strings.
    let mut buffer = [0u16; 256];
    let len = unsafe { GetLogicalDriveStringsW(Some(&mut buffer)) };

    if len == 0 {
        tracing::warn!("GetLogicalDriveStringsW returned 0");
        return volumes;
    }

    let system_drive = std::env::var("SystemDrive")
        .unwrap_or_else(|_| "C:".to_string())
        .to_ascii_uppercase();

    let full = OsString::from_wide(&buffer[..len as usize]);
    let full_str = full.to_string_lossy();

    for root in full_str.split('\0').filter(|s| !s.is_empty()) {
        let root_wide: Vec<u16> = root.encode_utf16().chain(std::iter::once(0)).collect();
        let root_pcwstr = PCWSTR(root_wide.as_ptr());
        let letter = root.trim_end_matches('\\').to_ascii_uppercase();

        let raw_type = unsafe { GetDriveTypeW(root_pcwstr) };
        let is_external = match raw_type {
            DRIVE_REMOVABLE_VAL => true,
            DRIVE_FIXED_VAL => letter != system_drive,
            _ => false,
        };

        let mut label_buf = [0u16; 256];
        let mut fs_buf = [0u16; 256];
        let mut serial: u32 = 0;
        let has_volume_info = unsafe {
            GetVolumeInformationW(
                root_pcwstr,
                Some(&mut label_buf),
                Some(&mut serial as *mut u32),
                None,
                None,
                Some(&mut fs_buf),
            )
            .is_ok()
        };

        let (label, filesystem, volume_uuid) = if has_volume_info {
            (
                wide_to_string(&label_buf),
                wide_to_string(&fs_buf),
                format!("{:04X}-{:04X}", serial >> 16, serial & 0xFFFF),
            )
        } else {
            (String::new(), String::new(), String::new())
        };

        let mut free_caller: u64 = 0;
        let mut total: u64 = 0;
        let mut free_total: u64 = 0;
        let has_space = unsafe {
            GetDiskFreeSpaceExW(
                root_pcwstr,
                Some(&mut free_caller as *mut u64),
                Some(&mut total as *mut u64),
                Some(&mut free_total as *mut u64),
            )
            .is_ok()
        };
        let (capacity_bytes, free_bytes) = if has_space {
            (total, free_caller)
        } else {
            (0, 0)
        };

        let candidate = Candidate {
            descriptor: VolumeDescriptor {
                device_identifier: letter.clone(),
                volume_uuid,
                volume_name: label,
                mount_point: PathBuf::from(root),
                capacity_bytes,
                free_bytes,
                file_system: if filesystem.is_empty() {
                    "unknown".to_string()
                } else {
                    filesystem
                },
            },
            is_external,
            // A drive letter only exists while the volume is mounted.
            is_mounted: has_volume_info,
            is_disk_image: false,
            is_ram_disk: raw_type == DRIVE_RAMDISK_VAL,
        };

        if candidate.keep() {
            volumes.push(candidate.descriptor);
        } else {
            tracing::debug!("Ignoring drive {letter}");
        }
    }

    volumes
}

fn wide_to_string(buf: &[u16]) -> String {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..end])
}
