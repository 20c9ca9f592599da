//! Symbolic driver and module names bound to selector slots.

use core::fmt;
use core::str::FromStr;

/// Driver backing the microcontroller's internal flash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlashFs {
    /// SPIFFS. Supported everywhere, the documented default.
    Spiffs,
    /// LittleFS (power-loss resilient, directories).
    LittleFs,
    /// FAT on a wear-levelled flash partition. ESP32 family only.
    FatFs,
}

impl FlashFs {
    pub const ALL: [Self; 3] = [Self::Spiffs, Self::LittleFs, Self::FatFs];
    pub const DEFAULT: Self = Self::Spiffs;

    /// Canonical name, also the value of the `flash_fs` cfg.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Spiffs => "spiffs",
            Self::LittleFs => "littlefs",
            Self::FatFs => "fatfs",
        }
    }

    /// Where the VFS exposes the filesystem.
    pub const fn mount_point(self) -> &'static str {
        match self {
            Self::Spiffs => "/spiffs",
            Self::LittleFs => "/littlefs",
            Self::FatFs => "/ffat",
        }
    }

    /// Flash partition label the driver mounts.
    pub const fn partition_label(self) -> &'static str {
        match self {
            Self::Spiffs => "spiffs",
            Self::LittleFs => "littlefs",
            Self::FatFs => "ffat",
        }
    }
}

impl fmt::Display for FlashFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FlashFs {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match normalise(s).as_str() {
            "spiffs" => Ok(Self::Spiffs),
            "littlefs" => Ok(Self::LittleFs),
            "fatfs" | "ffat" | "fat" => Ok(Self::FatFs),
            _ => Err(()),
        }
    }
}

/// Driver backing an inserted removable card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovableFs {
    /// SD card over SPI. Any family with a free SPI bus.
    Sd,
    /// SD card over the SDMMC host (1/4-bit). Needs the SDMMC peripheral and
    /// matching wiring; neither is checked at build time.
    SdMmc,
}

impl RemovableFs {
    pub const ALL: [Self; 2] = [Self::Sd, Self::SdMmc];
    pub const DEFAULT: Self = Self::Sd;

    /// Canonical name, also the value of the `removable_fs` cfg.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sd => "sd",
            Self::SdMmc => "sd_mmc",
        }
    }

    pub const fn mount_point(self) -> &'static str {
        match self {
            Self::Sd => "/sd",
            Self::SdMmc => "/sdcard",
        }
    }

    /// Whether this driver only works on a dedicated SDMMC host bus.
    pub const fn requires_sdmmc_bus(self) -> bool {
        matches!(self, Self::SdMmc)
    }
}

impl fmt::Display for RemovableFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RemovableFs {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match normalise(s).as_str() {
            "sd" | "sd_spi" => Ok(Self::Sd),
            "sd_mmc" | "sdmmc" => Ok(Self::SdMmc),
            _ => Err(()),
        }
    }
}

/// Optional protocol modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    /// Realtime Database.
    Rtdb,
    /// Cloud Messaging.
    Fcm,
}

impl Module {
    pub const ALL: [Self; 2] = [Self::Rtdb, Self::Fcm];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Rtdb => "rtdb",
            Self::Fcm => "fcm",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Module {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match normalise(s).as_str() {
            "rtdb" => Ok(Self::Rtdb),
            "fcm" => Ok(Self::Fcm),
            _ => Err(()),
        }
    }
}

// Case-insensitive, `-` and `_` interchangeable.
fn normalise(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == '-' { '_' } else { c.to_ascii_lowercase() })
        .collect()
}
