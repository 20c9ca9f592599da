//! Storage layer over the two build-selected filesystems.
//!
//! ```text
//!   rtdb backup/restore, application code
//!                 │
//!                 ▼
//!        FileSystem (port trait)
//!          │                 │
//!   esp::EspFs          sim::SimFs
//!   (ESP-IDF VFS)       (host simulation)
//! ```
//!
//! [`local_flash`] and [`removable`] mount whatever driver the build resolved
//! into [`RESOLVED`](crate::config::RESOLVED). On ESP-IDF only the selected
//! driver's mount code is compiled (`flash_fs` / `removable_fs` cfgs).
//!
//! A removable driver the board cannot drive (`sd_mmc` without an SDMMC host
//! or wiring) is not caught at build time. It shows up here, as
//! [`StorageError::BusUnavailable`] from the mount.
//!
//! Mounting is repeatable. Handles to the same storage share its contents,
//! and what was written stays there after every handle is dropped.

#[cfg(target_os = "espidf")]
pub mod esp;
#[cfg(not(target_os = "espidf"))]
pub mod sim;

use core::fmt;

use crate::config::{FlashFs, RESOLVED, RemovableFs, StorageConfig};

/// Filesystem operations used by the client. Paths are absolute within the
/// mount point (`/backup.json`), never VFS-absolute.
pub trait FileSystem {
    /// Canonical driver name (`spiffs`, `sd_mmc`, ...).
    fn driver(&self) -> &'static str;

    /// VFS prefix the driver is mounted at.
    fn mount_point(&self) -> &'static str;

    /// Read a whole file.
    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Create or truncate `path` and write `data`.
    fn write(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Append `data`, creating the file if needed.
    fn append(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a file. `Ok(())` if it did not exist.
    fn remove(&mut self, path: &str) -> Result<(), StorageError>;

    fn exists(&self, path: &str) -> bool;
}

/// Which of the two selector slots a filesystem came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    LocalFlash,
    Removable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Nothing is mounted (no card inserted, mount skipped).
    NotMounted,
    /// The driver refused to mount.
    MountFailed(&'static str),
    /// The selected driver needs an SDMMC host bus the board lacks.
    BusUnavailable,
    NotFound,
    /// Partition or card is full.
    Full,
    /// Empty, relative, `..`-containing or over-long path.
    InvalidPath,
    /// Any other I/O failure.
    Io,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotMounted => write!(f, "filesystem not mounted"),
            Self::MountFailed(msg) => write!(f, "mount failed: {msg}"),
            Self::BusUnavailable => write!(f, "SDMMC bus unavailable"),
            Self::NotFound => write!(f, "file not found"),
            Self::Full => write!(f, "storage full"),
            Self::InvalidPath => write!(f, "invalid path"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for StorageError {}

#[cfg(target_os = "espidf")]
pub type LocalFlash = esp::EspFs;
#[cfg(target_os = "espidf")]
pub type Removable = esp::EspFs;

#[cfg(not(target_os = "espidf"))]
pub type LocalFlash = sim::SimFs;
#[cfg(not(target_os = "espidf"))]
pub type Removable = sim::SimFs;

/// Mount the local flash filesystem chosen at build time.
pub fn local_flash(cfg: &StorageConfig) -> Result<LocalFlash, StorageError> {
    #[cfg(target_os = "espidf")]
    {
        esp::EspFs::mount_flash(cfg)
    }

    #[cfg(not(target_os = "espidf"))]
    {
        sim::SimFs::mount_flash(sim::SimBoard::host(), RESOLVED.local_flash, cfg)
    }
}

/// Mount the removable card filesystem chosen at build time.
pub fn removable(cfg: &StorageConfig) -> Result<Removable, StorageError> {
    #[cfg(target_os = "espidf")]
    {
        esp::EspFs::mount_removable(cfg)
    }

    #[cfg(not(target_os = "espidf"))]
    {
        sim::SimFs::mount_removable(sim::SimBoard::host(), RESOLVED.removable, cfg)
    }
}

/// Longest path (without the mount point) the driver accepts.
pub const fn flash_name_limit(fs: FlashFs) -> usize {
    match fs {
        // CONFIG_SPIFFS_OBJ_NAME_LEN (32) including the terminator
        FlashFs::Spiffs => 31,
        FlashFs::LittleFs | FlashFs::FatFs => 255,
    }
}

pub const fn removable_name_limit(_fs: RemovableFs) -> usize {
    255
}

/// Validate a mount-relative path.
pub fn check_path(path: &str, max_len: usize) -> Result<&str, StorageError> {
    if !path.starts_with('/') || path.len() < 2 || path.len() > max_len {
        return Err(StorageError::InvalidPath);
    }
    if path.ends_with('/')
        || path
            .split('/')
            .skip(1)
            .any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(StorageError::InvalidPath);
    }
    if path.chars().any(char::is_control) {
        return Err(StorageError::InvalidPath);
    }
    Ok(path)
}
