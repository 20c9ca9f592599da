//! Client configuration.
//!
//! Two layers:
//! - [`RESOLVED`]: the storage drivers and modules fixed by the build script
//!   (see [`selection`]). Immutable; changing it means rebuilding.
//! - [`ClientConfig`]: runtime settings (database URL, credentials, storage
//!   mount options), loadable from JSON.

pub mod selection;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use selection::{
    FeatureSelector, FlashFs, HardwareFamily, Module, RemovableFs, Selection, SelectionError, Slot,
};

include!(concat!(env!("OUT_DIR"), "/resolved_selection.rs"));

/// Runtime client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Realtime Database root, e.g. `https://<project>.firebaseio.com`.
    pub database_url: String,
    /// ID token or legacy database secret, sent as `auth=`.
    pub database_auth: Option<String>,
    /// Legacy Cloud Messaging server key.
    pub fcm_server_key: Option<String>,
    /// Per-request timeout handed to the transport (milliseconds).
    pub request_timeout_ms: u32,
    pub storage: StorageConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            database_auth: None,
            fcm_server_key: None,
            request_timeout_ms: 10_000,
            storage: StorageConfig::default(),
        }
    }
}

/// Mount options shared by both storage classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Maximum files open at once through the VFS.
    pub max_open_files: u8,
    /// Format the flash partition if it cannot be mounted (first boot).
    pub format_if_mount_failed: bool,
    /// Card slot wiring, read by whichever removable driver is compiled in.
    pub card: CardPins,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_open_files: 5,
            format_if_mount_failed: true,
            card: CardPins::default(),
        }
    }
}

/// GPIO numbers of the card slot. Defaults are the ESP32 dev-kit wiring:
/// VSPI for `sd`, slot 1 IOMUX pins for `sd_mmc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardPins {
    pub spi_sclk: u8,
    pub spi_mosi: u8,
    pub spi_miso: u8,
    pub spi_cs: u8,
    pub mmc_clk: u8,
    pub mmc_cmd: u8,
    pub mmc_d0: u8,
    pub mmc_d1: u8,
    pub mmc_d2: u8,
    pub mmc_d3: u8,
}

impl CardPins {
    /// Highest GPIO number on any supported chip (ESP32-S3).
    pub const MAX_GPIO: u8 = 48;

    fn all(&self) -> [u8; 10] {
        [
            self.spi_sclk,
            self.spi_mosi,
            self.spi_miso,
            self.spi_cs,
            self.mmc_clk,
            self.mmc_cmd,
            self.mmc_d0,
            self.mmc_d1,
            self.mmc_d2,
            self.mmc_d3,
        ]
    }
}

impl Default for CardPins {
    fn default() -> Self {
        Self {
            spi_sclk: 18,
            spi_mosi: 23,
            spi_miso: 19,
            spi_cs: 5,
            mmc_clk: 14,
            mmc_cmd: 15,
            mmc_d0: 2,
            mmc_d1: 4,
            mmc_d2: 12,
            mmc_d3: 13,
        }
    }
}

impl ClientConfig {
    /// Parse a JSON config document and validate it.
    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(text).map_err(|_| Error::Config("malformed config JSON"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range-check every field. Bad values are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        if !self.database_url.is_empty() {
            if !self.database_url.starts_with("https://") {
                return Err(Error::Config("database_url must start with https://"));
            }
            if self.database_url.trim_start_matches("https://").trim_end_matches('/').is_empty() {
                return Err(Error::Config("database_url has no host"));
            }
        }
        if let Some(auth) = &self.database_auth {
            if auth.is_empty() || auth.chars().any(|c| c.is_whitespace()) {
                return Err(Error::Config("database_auth must be a non-empty token"));
            }
        }
        if let Some(key) = &self.fcm_server_key {
            if key.is_empty() || key.chars().any(|c| c.is_whitespace()) {
                return Err(Error::Config("fcm_server_key must be a non-empty key"));
            }
        }
        if !(1_000..=120_000).contains(&self.request_timeout_ms) {
            return Err(Error::Config("request_timeout_ms must be 1000–120000"));
        }
        if !(1..=20).contains(&self.storage.max_open_files) {
            return Err(Error::Config("storage.max_open_files must be 1–20"));
        }
        if self.storage.card.all().iter().any(|&pin| pin > CardPins::MAX_GPIO) {
            return Err(Error::Config("storage.card pins must be GPIO 0–48"));
        }
        Ok(())
    }

    /// `database_url` without a trailing slash.
    pub fn database_root(&self) -> &str {
        self.database_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn resolved_matches_cargo_features() {
        assert_eq!(RESOLVED.rtdb, cfg!(feature = "rtdb"));
        assert_eq!(RESOLVED.fcm, cfg!(feature = "fcm"));
        if cfg!(feature = "flash-littlefs") {
            assert_eq!(RESOLVED.local_flash, FlashFs::LittleFs);
        } else if cfg!(feature = "flash-fatfs") {
            assert_eq!(RESOLVED.local_flash, FlashFs::FatFs);
        } else {
            assert_eq!(RESOLVED.local_flash, FlashFs::Spiffs);
        }
        if cfg!(feature = "sd-mmc") {
            assert_eq!(RESOLVED.removable, RemovableFs::SdMmc);
        } else {
            assert_eq!(RESOLVED.removable, RemovableFs::Sd);
        }
    }

    #[test]
    fn resolved_flash_cfg_agrees_with_constant() {
        let cfg_name = if cfg!(flash_fs = "littlefs") {
            "littlefs"
        } else if cfg!(flash_fs = "fatfs") {
            "fatfs"
        } else {
            "spiffs"
        };
        assert_eq!(RESOLVED.local_flash.name(), cfg_name);

        let card = if cfg!(removable_fs = "sd_mmc") { "sd_mmc" } else { "sd" };
        assert_eq!(RESOLVED.removable.name(), card);
    }

    #[test]
    fn card_pins_partially_overridden_from_json() {
        let cfg = ClientConfig::from_json(r#"{"storage":{"card":{"spi_cs":10,"mmc_d0":40}}}"#)
            .unwrap();
        assert_eq!(cfg.storage.card.spi_cs, 10);
        assert_eq!(cfg.storage.card.mmc_d0, 40);
        assert_eq!(cfg.storage.card.spi_sclk, CardPins::default().spi_sclk);
    }

    #[test]
    fn rejects_card_pin_beyond_last_gpio() {
        let mut cfg = ClientConfig::default();
        cfg.storage.card.mmc_clk = 49;
        assert_eq!(
            cfg.validate(),
            Err(Error::Config("storage.card pins must be GPIO 0–48"))
        );
    }

    #[test]
    fn rejects_plain_http_url() {
        let cfg = ClientConfig {
            database_url: "http://demo.firebaseio.com".into(),
            ..ClientConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_out_of_range_timeout() {
        let cfg = ClientConfig {
            request_timeout_ms: 50,
            ..ClientConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_open_files() {
        let mut cfg = ClientConfig::default();
        cfg.storage.max_open_files = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn json_fills_missing_fields_from_defaults() {
        let cfg = ClientConfig::from_json(
            r#"{"database_url":"https://demo.firebaseio.com/","fcm_server_key":"AAAAkey"}"#,
        )
        .unwrap();
        assert_eq!(cfg.database_root(), "https://demo.firebaseio.com");
        assert_eq!(cfg.request_timeout_ms, 10_000);
        assert_eq!(cfg.storage, StorageConfig::default());
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert_eq!(
            ClientConfig::from_json("{not json"),
            Err(Error::Config("malformed config JSON"))
        );
    }
}
