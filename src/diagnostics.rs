//! Build configuration report.
//!
//! Operators chasing a storage failure need to know which drivers the image
//! was built with and whether the chip can drive them. [`BuildReport`] carries
//! that, serialisable for a status endpoint, and
//! [`log_build_configuration`] prints it at boot.

use log::{info, warn};
use serde::Serialize;

use crate::config::selection::capability::removable_bus_note;
use crate::config::{FlashFs, Module, RESOLVED, Selection};

const MODULES: usize = Module::ALL.len();
const FLASH_DRIVERS: usize = FlashFs::ALL.len();

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub version: &'static str,
    pub family: &'static str,
    pub local_flash: &'static str,
    pub removable: &'static str,
    pub modules: heapless::Vec<&'static str, MODULES>,
    /// Flash drivers this family supports.
    pub supported_flash: heapless::Vec<&'static str, FLASH_DRIVERS>,
    pub sdmmc_bus: bool,
    /// Set when the removable driver needs hardware the family lacks.
    pub removable_warning: Option<&'static str>,
}

impl BuildReport {
    pub fn for_selection(sel: &Selection) -> Self {
        // Both lists are bounded by the enum tables they are drawn from.
        let modules = Module::ALL
            .into_iter()
            .filter(|m| sel.module_enabled(*m))
            .map(Module::name)
            .collect();

        let caps = sel.family.capabilities();
        let supported_flash = caps.flash.iter().map(|fs| fs.name()).collect();

        Self {
            version: env!("CARGO_PKG_VERSION"),
            family: sel.family.name(),
            local_flash: sel.local_flash.name(),
            removable: sel.removable.name(),
            modules,
            supported_flash,
            sdmmc_bus: caps.sdmmc_bus,
            removable_warning: removable_bus_note(sel.family, sel.removable),
        }
    }

    /// Report for this build.
    pub fn current() -> Self {
        Self::for_selection(&RESOLVED)
    }
}

/// Log the resolved build configuration.
pub fn log_build_configuration() -> BuildReport {
    let report = BuildReport::current();
    info!(
        "firebase-esp v{} | chip={} | flash={} | card={} | modules={:?}",
        report.version, report.family, report.local_flash, report.removable, report.modules
    );
    if let Some(note) = report.removable_warning {
        warn!("card driver {} on {}: {}", report.removable, report.family, note);
    }
    report
}
