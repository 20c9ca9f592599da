//! firebase-esp — on-device bring-up check.
//!
//! Boots, reports the build's storage and module selection, mounts the
//! selected filesystems and keeps a boot counter on flash. Network use is left
//! to the application, which supplies an `HttpTransport`.
//!
//! ```text
//!   build.rs ──▶ RESOLVED (flash_fs, removable_fs, rtdb, fcm)
//!                   │
//!      ┌────────────┼──────────────┐
//!      ▼            ▼              ▼
//!   storage     rtdb (opt)     fcm (opt)
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use firebase_esp::config::ClientConfig;
use firebase_esp::diagnostics;
use firebase_esp::storage::{self, FileSystem, StorageError};

const CONFIG_FILE: &str = "/firebase.json";
const BOOT_COUNT_FILE: &str = "/boot_count";

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    // ── 2. Build configuration ────────────────────────────────
    let report = diagnostics::log_build_configuration();

    // ── 3. Local flash ────────────────────────────────────────
    let defaults = ClientConfig::default();
    let mut flash = storage::local_flash(&defaults.storage)?;

    let config = match flash.read(CONFIG_FILE) {
        Ok(bytes) => match ClientConfig::from_json(&String::from_utf8_lossy(&bytes)) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("{} rejected ({}), using defaults", CONFIG_FILE, e);
                defaults
            }
        },
        Err(StorageError::NotFound) => {
            info!("no {} on {}, using defaults", CONFIG_FILE, flash.driver());
            defaults
        }
        Err(e) => return Err(anyhow::anyhow!("reading {CONFIG_FILE}: {e}")),
    };

    let boots = flash
        .read(BOOT_COUNT_FILE)
        .ok()
        .and_then(|b| <[u8; 4]>::try_from(b.as_slice()).ok())
        .map_or(0, u32::from_le_bytes)
        .wrapping_add(1);
    flash
        .write(BOOT_COUNT_FILE, &boots.to_le_bytes())
        .map_err(|e| anyhow::anyhow!("writing boot counter: {e}"))?;
    info!("boot #{} ({} at {})", boots, flash.driver(), flash.mount_point());

    // ── 4. Removable card (optional hardware) ─────────────────
    match storage::removable(&config.storage) {
        Ok(card) => info!("card ready: {} at {}", card.driver(), card.mount_point()),
        Err(e) => warn!(
            "card unavailable ({}); selected driver {} on {}",
            e, report.removable, report.family
        ),
    }

    // ── 5. Modules ────────────────────────────────────────────
    #[cfg(feature = "rtdb")]
    info!("rtdb: database_url={:?}", config.database_root());
    #[cfg(feature = "fcm")]
    info!("fcm: server key {}", if config.fcm_server_key.is_some() { "set" } else { "missing" });

    Ok(())
}
