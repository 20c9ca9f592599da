//! Host simulation backend.
//!
//! Models a board rather than a chip: the same family can be wired with or
//! without an SDMMC card slot, with or without a card inserted. That is what
//! lets tests reproduce the deferred hardware-mismatch failure.
//!
//! A board owns its flash and card contents. Every [`SimFs`] mounted from the
//! same board (or a clone of it) sees the same files, and they survive
//! unmounting, as on real hardware.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use super::{FileSystem, StorageError, check_path, flash_name_limit, removable_name_limit};
use crate::config::selection::capability::removable_bus_note;
use crate::config::{FlashFs, HardwareFamily, RESOLVED, RemovableFs, StorageConfig};

/// Stored contents of a flash partition or card.
#[derive(Debug, Default)]
struct Volume {
    /// Driver the volume was formatted with.
    format: Option<&'static str>,
    files: BTreeMap<String, Vec<u8>>,
}

/// A simulated board.
#[derive(Debug, Clone)]
pub struct SimBoard {
    pub family: HardwareFamily,
    /// Card slot routed to the SDMMC host pins.
    pub sdmmc_wired: bool,
    pub card_inserted: bool,
    pub flash_capacity: usize,
    pub card_capacity: usize,
    flash: Arc<Mutex<Volume>>,
    card: Arc<Mutex<Volume>>,
}

/// Board behind [`storage::local_flash`](super::local_flash) and
/// [`storage::removable`](super::removable) on the host.
static HOST_BOARD: LazyLock<SimBoard> = LazyLock::new(|| SimBoard::for_family(RESOLVED.family));

impl SimBoard {
    /// A typical dev board: SDMMC slot if the chip has the peripheral, card in.
    pub fn for_family(family: HardwareFamily) -> Self {
        Self {
            family,
            sdmmc_wired: family.has_sdmmc_bus(),
            card_inserted: true,
            flash_capacity: 1024 * 1024,
            card_capacity: 32 * 1024 * 1024,
            flash: Arc::default(),
            card: Arc::default(),
        }
    }

    /// The process-wide board the build-selected mounts use.
    pub fn host() -> &'static SimBoard {
        &HOST_BOARD
    }

    pub fn with_sdmmc_wiring(mut self, wired: bool) -> Self {
        self.sdmmc_wired = wired;
        self
    }

    pub fn with_card(mut self, inserted: bool) -> Self {
        self.card_inserted = inserted;
        self
    }

    pub fn with_flash_capacity(mut self, bytes: usize) -> Self {
        self.flash_capacity = bytes;
        self
    }
}

/// Filesystem handle on a simulated board.
#[derive(Debug)]
pub struct SimFs {
    driver: &'static str,
    mount_point: &'static str,
    name_limit: usize,
    capacity: usize,
    volume: Arc<Mutex<Volume>>,
}

impl SimFs {
    /// Mount `fs` on the board's flash. A partition formatted by another
    /// driver is reformatted only if `cfg` allows it.
    pub fn mount_flash(
        board: &SimBoard,
        fs: FlashFs,
        cfg: &StorageConfig,
    ) -> Result<Self, StorageError> {
        if !board.family.supports_flash(fs) {
            warn!("SimFs: {} not available on {}", fs, board.family);
            return Err(StorageError::MountFailed("driver not available on this chip"));
        }
        {
            let mut volume = lock(&board.flash);
            match volume.format {
                Some(existing) if existing != fs.name() => {
                    if !cfg.format_if_mount_failed {
                        warn!("SimFs: partition holds {}, not {}", existing, fs);
                        return Err(StorageError::MountFailed("partition holds another filesystem"));
                    }
                    warn!("SimFs: reformatting {} partition as {}", existing, fs);
                    volume.files.clear();
                    volume.format = Some(fs.name());
                }
                Some(_) => {}
                None => volume.format = Some(fs.name()),
            }
        }
        info!(
            "SimFs: mounted {} at {} (max_files={})",
            fs,
            fs.mount_point(),
            cfg.max_open_files
        );
        Ok(Self {
            driver: fs.name(),
            mount_point: fs.mount_point(),
            name_limit: flash_name_limit(fs),
            capacity: board.flash_capacity,
            volume: Arc::clone(&board.flash),
        })
    }

    /// Mount the card through `fs`.
    pub fn mount_removable(
        board: &SimBoard,
        fs: RemovableFs,
        cfg: &StorageConfig,
    ) -> Result<Self, StorageError> {
        if fs.requires_sdmmc_bus() && !board.sdmmc_wired {
            let note = removable_bus_note(board.family, fs)
                .unwrap_or("card slot is not wired to the SDMMC host pins");
            warn!("SimFs: {} mount failed on {}: {}", fs, board.family, note);
            return Err(StorageError::BusUnavailable);
        }
        if !board.card_inserted {
            warn!("SimFs: no card in slot");
            return Err(StorageError::NotMounted);
        }
        info!(
            "SimFs: mounted {} at {} (max_files={})",
            fs,
            fs.mount_point(),
            cfg.max_open_files
        );
        Ok(Self {
            driver: fs.name(),
            mount_point: fs.mount_point(),
            name_limit: removable_name_limit(fs),
            capacity: board.card_capacity,
            volume: Arc::clone(&board.card),
        })
    }

    /// Bytes currently stored.
    pub fn used(&self) -> usize {
        lock(&self.volume).used()
    }
}

impl Volume {
    fn used(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    fn reserve(&self, capacity: usize, path: &str, new_len: usize) -> Result<(), StorageError> {
        let current = self.files.get(path).map_or(0, Vec::len);
        if self.used() - current + new_len > capacity {
            return Err(StorageError::Full);
        }
        Ok(())
    }
}

fn lock(volume: &Mutex<Volume>) -> MutexGuard<'_, Volume> {
    volume.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FileSystem for SimFs {
    fn driver(&self) -> &'static str {
        self.driver
    }

    fn mount_point(&self) -> &'static str {
        self.mount_point
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let path = check_path(path, self.name_limit)?;
        lock(&self.volume).files.get(path).cloned().ok_or(StorageError::NotFound)
    }

    fn write(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = check_path(path, self.name_limit)?;
        let mut volume = lock(&self.volume);
        volume.reserve(self.capacity, path, data.len())?;
        volume.files.insert(path.to_owned(), data.to_vec());
        Ok(())
    }

    fn append(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = check_path(path, self.name_limit)?;
        let mut volume = lock(&self.volume);
        let current = volume.files.get(path).map_or(0, Vec::len);
        volume.reserve(self.capacity, path, current + data.len())?;
        volume
            .files
            .entry(path.to_owned())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    fn remove(&mut self, path: &str) -> Result<(), StorageError> {
        let path = check_path(path, self.name_limit)?;
        lock(&self.volume).files.remove(path);
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        check_path(path, self.name_limit).is_ok_and(|p| lock(&self.volume).files.contains_key(p))
    }
}
