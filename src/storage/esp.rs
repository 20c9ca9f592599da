//! ESP-IDF VFS backend.
//!
//! Only the drivers named by the `flash_fs` and `removable_fs` cfgs are
//! compiled in. Files are accessed through `std::fs` once a driver is
//! registered with the VFS.
//!
//! The flash registration is shared. Every [`EspFs`] from
//! [`EspFs::mount_flash`] holds a lease on it, and the partition is
//! unregistered when the last lease drops. A card mount is owned by its
//! handle and unmounted when the handle drops. `sd_mmc` on a chip without the
//! SDMMC host fails at mount with [`StorageError::BusUnavailable`].

use core::any::Any;
use std::ffi::CString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::sync::{Mutex, PoisonError};

use esp_idf_svc::sys::*;
use log::{info, warn};

use super::{FileSystem, StorageError, check_path, flash_name_limit, removable_name_limit};
use crate::config::{FlashFs, RESOLVED, StorageConfig};

#[cfg(all(flash_fs = "littlefs", not(esp_idf_comp_joltwallet__littlefs_enabled)))]
compile_error!(
    "flash-littlefs needs the joltwallet/littlefs component; add it to \
     [package.metadata.esp-idf-sys] extra_components"
);

#[derive(Debug)]
pub struct EspFs {
    driver: &'static str,
    mount_point: &'static str,
    name_limit: usize,
    mount: Mount,
}

#[derive(Debug)]
enum Mount {
    /// Lease on the shared flash registration.
    Flash,
    /// Card driver stack, unmounted on drop.
    Card(Box<dyn Any>),
}

impl EspFs {
    /// Register the selected flash driver with the VFS, or join the existing
    /// registration.
    pub fn mount_flash(cfg: &StorageConfig) -> Result<Self, StorageError> {
        let fs = RESOLVED.local_flash;
        let mut shared = FLASH.lock().unwrap_or_else(PoisonError::into_inner);
        if shared.registration.is_none() {
            shared.registration = Some(FlashRegistration::register(fs, cfg)?);
            info!("EspFs: {} mounted at {}", fs, fs.mount_point());
        }
        shared.leases += 1;

        Ok(Self {
            driver: fs.name(),
            mount_point: fs.mount_point(),
            name_limit: flash_name_limit(fs),
            mount: Mount::Flash,
        })
    }

    /// Bring up the card bus and mount FAT at the driver's mount point.
    pub fn mount_removable(cfg: &StorageConfig) -> Result<Self, StorageError> {
        let fs = RESOLVED.removable;
        let card = mount_card(cfg)?;
        info!("EspFs: {} mounted at {}", fs, fs.mount_point());

        Ok(Self {
            driver: fs.name(),
            mount_point: fs.mount_point(),
            name_limit: removable_name_limit(fs),
            mount: Mount::Card(card),
        })
    }

    fn full_path(&self, path: &str) -> Result<String, StorageError> {
        let path = check_path(path, self.name_limit)?;
        Ok(format!("{}{}", self.mount_point, path))
    }
}

impl Drop for EspFs {
    fn drop(&mut self) {
        if matches!(self.mount, Mount::Flash) {
            let mut shared = FLASH.lock().unwrap_or_else(PoisonError::into_inner);
            shared.leases = shared.leases.saturating_sub(1);
            if shared.leases == 0 {
                shared.registration = None;
            }
        }
    }
}

// ── Flash registration ────────────────────────────────────────

struct SharedFlash {
    registration: Option<FlashRegistration>,
    leases: usize,
}

static FLASH: Mutex<SharedFlash> = Mutex::new(SharedFlash {
    registration: None,
    leases: 0,
});

/// A live VFS registration. Dropping it unregisters the partition.
struct FlashRegistration {
    fs: FlashFs,
    base: CString,
    label: CString,
    #[cfg(flash_fs = "fatfs")]
    wl_handle: wl_handle_t,
}

impl FlashRegistration {
    #[cfg(flash_fs = "spiffs")]
    fn register(fs: FlashFs, cfg: &StorageConfig) -> Result<Self, StorageError> {
        let (base, label) = flash_names(fs)?;
        let conf = esp_vfs_spiffs_conf_t {
            base_path: base.as_ptr(),
            partition_label: label.as_ptr(),
            max_files: usize::from(cfg.max_open_files),
            format_if_mount_failed: cfg.format_if_mount_failed,
        };
        // SAFETY: `conf` and the strings it points to outlive the call.
        let ret = unsafe { esp_vfs_spiffs_register(&conf) };
        esp_result(ret, "esp_vfs_spiffs_register failed")?;
        Ok(Self { fs, base, label })
    }

    #[cfg(all(flash_fs = "littlefs", esp_idf_comp_joltwallet__littlefs_enabled))]
    fn register(fs: FlashFs, cfg: &StorageConfig) -> Result<Self, StorageError> {
        let (base, label) = flash_names(fs)?;
        let mut conf = esp_vfs_littlefs_conf_t::default();
        conf.base_path = base.as_ptr();
        conf.partition_label = label.as_ptr();
        conf.set_format_if_mount_failed(u8::from(cfg.format_if_mount_failed));
        // SAFETY: as for SPIFFS.
        let ret = unsafe { esp_vfs_littlefs_register(&conf) };
        esp_result(ret, "esp_vfs_littlefs_register failed")?;
        Ok(Self { fs, base, label })
    }

    #[cfg(flash_fs = "fatfs")]
    fn register(fs: FlashFs, cfg: &StorageConfig) -> Result<Self, StorageError> {
        let (base, label) = flash_names(fs)?;
        let mount_config = esp_vfs_fat_mount_config_t {
            format_if_mount_failed: cfg.format_if_mount_failed,
            max_files: i32::from(cfg.max_open_files),
            ..Default::default()
        };
        let mut wl_handle: wl_handle_t = -1;
        // SAFETY: all pointers are valid for the duration of the call.
        let ret = unsafe {
            esp_vfs_fat_spiflash_mount_rw_wl(base.as_ptr(), label.as_ptr(), &mount_config, &mut wl_handle)
        };
        esp_result(ret, "esp_vfs_fat_spiflash_mount_rw_wl failed")?;
        Ok(Self {
            fs,
            base,
            label,
            wl_handle,
        })
    }
}

impl Drop for FlashRegistration {
    fn drop(&mut self) {
        // SAFETY: the registration was made with these exact strings (and
        // handle) and is torn down once.
        #[cfg(flash_fs = "spiffs")]
        let ret = unsafe { esp_vfs_spiffs_unregister(self.label.as_ptr()) };
        #[cfg(all(flash_fs = "littlefs", esp_idf_comp_joltwallet__littlefs_enabled))]
        let ret = unsafe { esp_vfs_littlefs_unregister(self.label.as_ptr()) };
        #[cfg(flash_fs = "fatfs")]
        let ret = unsafe { esp_vfs_fat_spiflash_unmount_rw_wl(self.base.as_ptr(), self.wl_handle) };

        if ret == ESP_OK {
            info!("EspFs: {} unmounted from {:?}", self.fs, self.base);
        } else {
            warn!("EspFs: unmounting {} failed (err={})", self.fs, ret);
        }
    }
}

fn flash_names(fs: FlashFs) -> Result<(CString, CString), StorageError> {
    let base = CString::new(fs.mount_point()).map_err(|_| StorageError::InvalidPath)?;
    let label = CString::new(fs.partition_label()).map_err(|_| StorageError::InvalidPath)?;
    Ok((base, label))
}

// ── Card mounts ───────────────────────────────────────────────

/// SD card over SPI2.
#[cfg(removable_fs = "sd")]
fn mount_card(cfg: &StorageConfig) -> Result<Box<dyn Any>, StorageError> {
    use esp_idf_svc::fs::fatfs::Fatfs;
    use esp_idf_svc::hal::gpio::AnyIOPin;
    use esp_idf_svc::hal::sd::spi::SdSpiHostDriver;
    use esp_idf_svc::hal::sd::{SdCardConfiguration, SdCardDriver};
    use esp_idf_svc::hal::spi::{SPI2, SpiDriver, config::DriverConfig};
    use esp_idf_svc::io::vfs::MountedFatfs;

    let pins = cfg.card;
    // SAFETY: SPI2 and the card pins are reserved for the card slot by the
    // board wiring in `StorageConfig::card`; nothing else claims them.
    let (spi, sclk, mosi, miso, cs) = unsafe {
        (
            SPI2::new(),
            AnyIOPin::new(i32::from(pins.spi_sclk)),
            AnyIOPin::new(i32::from(pins.spi_mosi)),
            AnyIOPin::new(i32::from(pins.spi_miso)),
            AnyIOPin::new(i32::from(pins.spi_cs)),
        )
    };

    let bus = SpiDriver::new(spi, sclk, mosi, Some(miso), &DriverConfig::default())
        .map_err(|e| esp_failure(&e, "SPI bus init failed"))?;
    let host = SdSpiHostDriver::new(
        bus,
        Some(cs),
        AnyIOPin::none(),
        AnyIOPin::none(),
        AnyIOPin::none(),
        #[cfg(not(any(
            esp_idf_version_major = "4",
            all(esp_idf_version_major = "5", esp_idf_version_minor = "0"),
            all(esp_idf_version_major = "5", esp_idf_version_minor = "1"),
        )))]
        None,
    )
    .map_err(|e| esp_failure(&e, "SD SPI host init failed"))?;
    let card = SdCardDriver::new_spi(host, &SdCardConfiguration::new()).map_err(|e| {
        warn!("EspFs: no card answered on SPI (err={})", e.code());
        StorageError::NotMounted
    })?;

    let fatfs = Fatfs::new_sdcard(0, card).map_err(|e| esp_failure(&e, "FAT driver init failed"))?;
    let mounted = MountedFatfs::mount(
        fatfs,
        crate::config::RemovableFs::Sd.mount_point(),
        usize::from(cfg.max_open_files),
    )
    .map_err(|e| esp_failure(&e, "card FAT mount failed"))?;
    Ok(Box::new(mounted))
}

/// SD card on SDMMC slot 1, 4-bit bus.
#[cfg(all(removable_fs = "sd_mmc", esp_idf_soc_sdmmc_host_supported))]
fn mount_card(cfg: &StorageConfig) -> Result<Box<dyn Any>, StorageError> {
    use esp_idf_svc::fs::fatfs::Fatfs;
    use esp_idf_svc::hal::gpio::AnyIOPin;
    use esp_idf_svc::hal::sd::mmc::{SDMMC1, SdMmcHostConfiguration, SdMmcHostDriver};
    use esp_idf_svc::hal::sd::{SdCardConfiguration, SdCardDriver};
    use esp_idf_svc::io::vfs::MountedFatfs;

    let pins = cfg.card;
    // SAFETY: the SDMMC slot and its pins are reserved for the card by the
    // board wiring in `StorageConfig::card`.
    let (slot, cmd, clk, d0, d1, d2, d3) = unsafe {
        (
            SDMMC1::new(),
            AnyIOPin::new(i32::from(pins.mmc_cmd)),
            AnyIOPin::new(i32::from(pins.mmc_clk)),
            AnyIOPin::new(i32::from(pins.mmc_d0)),
            AnyIOPin::new(i32::from(pins.mmc_d1)),
            AnyIOPin::new(i32::from(pins.mmc_d2)),
            AnyIOPin::new(i32::from(pins.mmc_d3)),
        )
    };

    let host = SdMmcHostDriver::new_4bits(
        slot,
        cmd,
        clk,
        d0,
        d1,
        d2,
        d3,
        None::<AnyIOPin>,
        None::<AnyIOPin>,
        &SdMmcHostConfiguration::new(),
    )
    .map_err(|e| esp_failure(&e, "SDMMC host init failed"))?;
    let card = SdCardDriver::new_mmc(host, &SdCardConfiguration::new()).map_err(|e| {
        warn!("EspFs: no card answered on SDMMC (err={})", e.code());
        StorageError::NotMounted
    })?;

    let fatfs = Fatfs::new_sdcard(0, card).map_err(|e| esp_failure(&e, "FAT driver init failed"))?;
    let mounted = MountedFatfs::mount(
        fatfs,
        crate::config::RemovableFs::SdMmc.mount_point(),
        usize::from(cfg.max_open_files),
    )
    .map_err(|e| esp_failure(&e, "card FAT mount failed"))?;
    Ok(Box::new(mounted))
}

/// The chip has no SDMMC host; accepted at build time, refused here.
#[cfg(all(removable_fs = "sd_mmc", not(esp_idf_soc_sdmmc_host_supported)))]
fn mount_card(_cfg: &StorageConfig) -> Result<Box<dyn Any>, StorageError> {
    use crate::config::selection::capability::removable_bus_note;

    let fs = RESOLVED.removable;
    let note = removable_bus_note(RESOLVED.family, fs).unwrap_or("no SDMMC host on this chip");
    warn!("EspFs: {} not mounted on {}: {}", fs, RESOLVED.family, note);
    Err(StorageError::BusUnavailable)
}

// ── Helpers ───────────────────────────────────────────────────

fn map_io(e: &std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound,
        ErrorKind::StorageFull => StorageError::Full,
        _ => StorageError::Io,
    }
}

fn esp_result(ret: esp_err_t, what: &'static str) -> Result<(), StorageError> {
    if ret == ESP_OK {
        Ok(())
    } else {
        warn!("EspFs: {} (err={})", what, ret);
        Err(StorageError::MountFailed(what))
    }
}

#[allow(dead_code)]
fn esp_failure(e: &EspError, what: &'static str) -> StorageError {
    warn!("EspFs: {} (err={})", what, e.code());
    StorageError::MountFailed(what)
}

impl FileSystem for EspFs {
    fn driver(&self) -> &'static str {
        self.driver
    }

    fn mount_point(&self) -> &'static str {
        self.mount_point
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full = self.full_path(path)?;
        fs::read(full).map_err(|e| map_io(&e))
    }

    fn write(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let full = self.full_path(path)?;
        fs::write(full, data).map_err(|e| map_io(&e))
    }

    fn append(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let full = self.full_path(path)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(full)
            .map_err(|e| map_io(&e))?;
        file.write_all(data).map_err(|e| map_io(&e))
    }

    fn remove(&mut self, path: &str) -> Result<(), StorageError> {
        let full = self.full_path(path)?;
        match fs::remove_file(full) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io(&e)),
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.full_path(path)
            .is_ok_and(|full| fs::metadata(full).is_ok())
    }
}
