//! Hardware family × driver validity.
//!
//! | Family   | spiffs | littlefs | fatfs | sd (SPI) | SDMMC host bus |
//! |----------|--------|----------|-------|----------|----------------|
//! | host     | yes    | yes      | yes   | yes      | yes (simulated)|
//! | esp8266  | yes    | yes      | no    | yes      | no             |
//! | esp32    | yes    | yes      | yes   | yes      | yes            |
//! | esp32s2  | yes    | yes      | yes   | yes      | no             |
//! | esp32s3  | yes    | yes      | yes   | yes      | yes            |
//! | esp32c3  | yes    | yes      | yes   | yes      | no             |
//! | esp32c6  | yes    | yes      | yes   | yes      | no             |
//!
//! The flash columns are enforced when a selection is finalized. The SDMMC
//! column is NOT: `sd_mmc` on a family without the host peripheral (or on a
//! board whose card slot is wired for SPI only) builds fine and fails when the
//! storage layer tries to mount the card. The column exists so that failure
//! can be explained.

use core::fmt;
use core::str::FromStr;

use super::drivers::{FlashFs, RemovableFs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareFamily {
    /// Any non-Espressif target; storage is simulated.
    Host,
    Esp8266,
    Esp32,
    Esp32S2,
    Esp32S3,
    Esp32C3,
    Esp32C6,
}

impl HardwareFamily {
    pub const ALL: [Self; 7] = [
        Self::Host,
        Self::Esp8266,
        Self::Esp32,
        Self::Esp32S2,
        Self::Esp32S3,
        Self::Esp32C3,
        Self::Esp32C6,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Esp8266 => "esp8266",
            Self::Esp32 => "esp32",
            Self::Esp32S2 => "esp32s2",
            Self::Esp32S3 => "esp32s3",
            Self::Esp32C3 => "esp32c3",
            Self::Esp32C6 => "esp32c6",
        }
    }

    /// Guess the family from a target triple.
    ///
    /// The RISC-V Espressif triples do not name the chip; `riscv32imc` is
    /// taken as the C3 and `riscv32imac` as the C6. Set `MCU` to be exact.
    pub fn from_target(triple: &str) -> Self {
        let t = triple.to_ascii_lowercase();
        if t.contains("esp8266") {
            Self::Esp8266
        } else if t.contains("esp32s3") {
            Self::Esp32S3
        } else if t.contains("esp32s2") {
            Self::Esp32S2
        } else if t.contains("esp32") {
            Self::Esp32
        } else if t.starts_with("riscv32imc-esp") {
            Self::Esp32C3
        } else if t.starts_with("riscv32imac-esp") {
            Self::Esp32C6
        } else {
            Self::Host
        }
    }

    /// This family's row in [`CAPABILITIES`].
    pub fn capabilities(self) -> &'static Capabilities {
        // Every family has exactly one row.
        CAPABILITIES
            .iter()
            .find(|row| row.family == self)
            .unwrap_or(&CAPABILITIES[0])
    }

    pub fn supports_flash(self, fs: FlashFs) -> bool {
        self.capabilities().flash.contains(&fs)
    }

    pub fn has_sdmmc_bus(self) -> bool {
        self.capabilities().sdmmc_bus
    }
}

impl fmt::Display for HardwareFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HardwareFamily {
    type Err = ();

    /// Parses the chip names ESP-IDF uses for `MCU` (`esp32s3`, `esp32c3`, ...).
    fn from_str(s: &str) -> Result<Self, ()> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|family| family.name() == s)
            .ok_or(())
    }
}

/// One row of the matrix.
#[derive(Debug)]
pub struct Capabilities {
    pub family: HardwareFamily,
    /// Flash drivers the family's SDK ships.
    pub flash: &'static [FlashFs],
    /// Whether the chip has an SDMMC host peripheral.
    pub sdmmc_bus: bool,
}

const ALL_FLASH: &[FlashFs] = &[FlashFs::Spiffs, FlashFs::LittleFs, FlashFs::FatFs];

pub static CAPABILITIES: [Capabilities; 7] = [
    Capabilities {
        family: HardwareFamily::Host,
        flash: ALL_FLASH,
        sdmmc_bus: true,
    },
    Capabilities {
        family: HardwareFamily::Esp8266,
        flash: &[FlashFs::Spiffs, FlashFs::LittleFs],
        sdmmc_bus: false,
    },
    Capabilities {
        family: HardwareFamily::Esp32,
        flash: ALL_FLASH,
        sdmmc_bus: true,
    },
    Capabilities {
        family: HardwareFamily::Esp32S2,
        flash: ALL_FLASH,
        sdmmc_bus: false,
    },
    Capabilities {
        family: HardwareFamily::Esp32S3,
        flash: ALL_FLASH,
        sdmmc_bus: true,
    },
    Capabilities {
        family: HardwareFamily::Esp32C3,
        flash: ALL_FLASH,
        sdmmc_bus: false,
    },
    Capabilities {
        family: HardwareFamily::Esp32C6,
        flash: ALL_FLASH,
        sdmmc_bus: false,
    },
];

/// Operator-facing note for a removable driver the family cannot drive, if any.
pub fn removable_bus_note(family: HardwareFamily, fs: RemovableFs) -> Option<&'static str> {
    if fs.requires_sdmmc_bus() && !family.has_sdmmc_bus() {
        Some(
            "sd_mmc needs the SDMMC host peripheral (esp32, esp32s3); \
             select `sd-spi` for cards wired to a SPI bus",
        )
    } else {
        None
    }
}
