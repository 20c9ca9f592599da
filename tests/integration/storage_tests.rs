//! Storage layer against the simulated boards.

use firebase_esp::config::{FlashFs, HardwareFamily, RESOLVED, RemovableFs, StorageConfig};
use firebase_esp::storage::sim::{SimBoard, SimFs};
use firebase_esp::storage::{self, FileSystem, StorageError};
use firebase_esp::{Error, config::FeatureSelector};

#[test]
fn selected_drivers_mount_on_the_host() {
    let cfg = StorageConfig::default();
    let flash = storage::local_flash(&cfg).unwrap();
    assert_eq!(flash.driver(), RESOLVED.local_flash.name());

    let card = storage::removable(&cfg).unwrap();
    assert_eq!(card.driver(), RESOLVED.removable.name());
    assert_eq!(card.mount_point(), RESOLVED.removable.mount_point());
}

#[test]
fn sd_mmc_on_chip_without_bus_builds_then_fails_at_mount() {
    // Build-time half: the selection is accepted.
    let mut selector = FeatureSelector::new();
    selector.select_removable_storage_filesystem("SD_MMC").unwrap();
    let sel = selector.finalize(HardwareFamily::Esp32C3).unwrap();
    assert_eq!(sel.removable, RemovableFs::SdMmc);

    // Run-time half: the storage call fails instead of panicking.
    let board = SimBoard::for_family(sel.family);
    let err = SimFs::mount_removable(&board, sel.removable, &StorageConfig::default()).unwrap_err();
    assert_eq!(err, StorageError::BusUnavailable);
    assert_eq!(Error::from(err).to_string(), "storage: SDMMC bus unavailable");
}

#[test]
fn each_supported_flash_driver_round_trips_a_file() {
    for family in HardwareFamily::ALL {
        for fs in FlashFs::ALL.into_iter().filter(|fs| family.supports_flash(*fs)) {
            let board = SimBoard::for_family(family);
            let mut mounted = SimFs::mount_flash(&board, fs, &StorageConfig::default()).unwrap();
            mounted.write("/token.json", br#"{"t":1}"#).unwrap();
            assert_eq!(mounted.read("/token.json").unwrap(), br#"{"t":1}"#, "{family}/{fs}");
        }
    }
}

#[test]
fn spiffs_rejects_long_names_that_littlefs_takes() {
    let board = SimBoard::for_family(HardwareFamily::Esp32);
    let name = format!("/{}.json", "n".repeat(40));

    let mut spiffs = SimFs::mount_flash(&board, FlashFs::Spiffs, &StorageConfig::default()).unwrap();
    assert_eq!(spiffs.write(&name, b"x"), Err(StorageError::InvalidPath));

    let mut littlefs =
        SimFs::mount_flash(&board, FlashFs::LittleFs, &StorageConfig::default()).unwrap();
    assert!(littlefs.write(&name, b"x").is_ok());
}

#[test]
fn second_local_flash_mount_sees_first_mounts_file() {
    let cfg = StorageConfig::default();
    let mut first = storage::local_flash(&cfg).unwrap();
    first.write("/remount_it", b"x").unwrap();

    let second = storage::local_flash(&cfg).unwrap();
    assert!(second.exists("/remount_it"));
    assert_eq!(second.read("/remount_it").unwrap(), b"x");
}

#[test]
fn card_contents_survive_pulling_the_handle() {
    let board = SimBoard::for_family(HardwareFamily::Esp32);
    let cfg = StorageConfig::default();
    {
        let mut card = SimFs::mount_removable(&board, RemovableFs::Sd, &cfg).unwrap();
        card.write("/backup.json", b"{}").unwrap();
    }
    let card = SimFs::mount_removable(&board, RemovableFs::Sd, &cfg).unwrap();
    assert_eq!(card.read("/backup.json").unwrap(), b"{}");
}
