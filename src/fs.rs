//! Mounted file systems.

use crate::collection::{increment, Collection};
use crate::platform::OsBackend;
use crate::types::{FileSystem, FsType};
use crate::{Collector, Result};

/// Classification of types only this OS knows about.
fn os_fs_type(sys_type: &str) -> Option<FsType> {
    match sys_type {
        "ext2" | "ext3" | "ext4" | "xfs" | "btrfs" | "jfs" | "reiserfs" => Some(FsType::LocalDisk),
        "tmpfs" | "ramfs" => Some(FsType::RamDisk),
        "nfs4" | "cifs" => Some(FsType::Network),
        _ => None,
    }
}

/// Classification shared by every unix.
fn common_fs_type(sys_type: &str) -> Option<FsType> {
    match sys_type {
        "nfs" | "smbfs" | "afs" => Some(FsType::Network),
        "swap" => Some(FsType::Swap),
        "iso9660" => Some(FsType::Cdrom),
        "msdos" | "minix" | "hpfs" | "vfat" => Some(FsType::LocalDisk),
        _ => None,
    }
}

/// Classify a file system type name, OS-specific names first.
#[must_use]
pub fn fs_type(sys_type: &str) -> FsType {
    os_fs_type(sys_type)
        .or_else(|| common_fs_type(sys_type))
        .unwrap_or(FsType::None)
}

/// Undo the octal escapes the kernel applies to blanks in mount table fields.
fn unescape_mount_field(field: &str) -> String {
    if !field.contains('\\') {
        return field.to_string();
    }

    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let code = field
                .get(i + 1..i + 4)
                .and_then(|oct| u8::from_str_radix(oct, 8).ok());
            if let Some(code) = code {
                out.push(code);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn parse_mount_line(line: &str) -> Option<FileSystem> {
    let mut fields = line.split_whitespace();
    let dev_name = unescape_mount_field(fields.next()?);
    let dir_name = unescape_mount_field(fields.next()?);
    let sys_type_name = fields.next()?.to_string();
    let options = fields.next().unwrap_or_default().to_string();
    let fs_type = fs_type(&sys_type_name);

    Some(FileSystem {
        dir_name,
        dev_name,
        sys_type_name,
        options,
        fs_type,
    })
}

impl<B: OsBackend> Collector<B> {
    /// Every entry of the kernel mount table.
    ///
    /// # Errors
    /// Returns an error if the mount table cannot be read
    pub fn file_system_list(&self) -> Result<Collection<FileSystem>> {
        let mounts = self.backend.read_procfs("mounts")?;
        let mut list = Collection::create(increment::FILE_SYSTEM_LIST)?;

        for fs in mounts.lines().filter_map(parse_mount_line) {
            if list.is_full() {
                list.grow()?;
            }
            list.push(fs);
        }

        Ok(list)
    }
}
