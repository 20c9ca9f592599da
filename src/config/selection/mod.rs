//! Build-time feature selection.
//!
//! Four slots are bound before the firmware exists:
//!
//! | Slot             | Values                      | Unset       |
//! |------------------|-----------------------------|-------------|
//! | `local_flash_fs` | `spiffs`, `littlefs`, `fatfs` | `spiffs`  |
//! | `removable_fs`   | `sd`, `sd_mmc`              | `sd`        |
//! | `module.rtdb`    | on / off                    | off         |
//! | `module.fcm`     | on / off                    | off         |
//!
//! Binding a slot again replaces the earlier value. [`FeatureSelector::finalize`]
//! checks the flash driver against the target's row in the
//! [`capability`] matrix and freezes the result into a [`Selection`].
//!
//! This file is also compiled into `build.rs`, so it depends on `core`/`std`
//! only and never names `crate::` paths.

pub mod capability;
pub mod drivers;

use core::fmt;

pub use capability::HardwareFamily;
pub use drivers::{FlashFs, Module, RemovableFs};

/// A bindable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    LocalFlash,
    Removable,
    Module(Module),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalFlash => f.write_str("local_flash_fs"),
            Self::Removable => f.write_str("removable_fs"),
            Self::Module(m) => write!(f, "module.{m}"),
        }
    }
}

/// A binding the build must not proceed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// The value is not a driver this slot knows.
    UnknownDriver { slot: Slot, value: String },
    /// The module name is neither `rtdb` nor `fcm`.
    UnknownModule { value: String },
    /// Two values were bound to one slot at once, with no order between them.
    Conflict {
        slot: Slot,
        first: &'static str,
        second: &'static str,
    },
    /// The driver exists but the target family does not ship it.
    Unsupported {
        slot: Slot,
        value: &'static str,
        family: HardwareFamily,
    },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownDriver { slot, value } => {
                let expected: Vec<&str> = match slot {
                    Slot::LocalFlash => FlashFs::ALL.iter().map(|d| d.name()).collect(),
                    Slot::Removable => RemovableFs::ALL.iter().map(|d| d.name()).collect(),
                    Slot::Module(_) => Vec::new(),
                };
                write!(
                    f,
                    "{slot}: unknown driver `{value}` (expected one of: {})",
                    expected.join(", ")
                )
            }
            Self::UnknownModule { value } => {
                write!(f, "module: unknown module `{value}` (expected rtdb or fcm)")
            }
            Self::Conflict {
                slot,
                first,
                second,
            } => write!(
                f,
                "{slot}: `{first}` and `{second}` selected together; pick exactly one"
            ),
            Self::Unsupported {
                slot,
                value,
                family,
            } => write!(f, "{slot}: `{value}` is not available on {family}"),
        }
    }
}

impl std::error::Error for SelectionError {}

/// Accumulates bindings; later bindings of a slot win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSelector {
    local_flash: Option<FlashFs>,
    removable: Option<RemovableFs>,
    rtdb: Option<bool>,
    fcm: Option<bool>,
}

impl FeatureSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the local flash slot by name.
    pub fn select_local_flash_filesystem(
        &mut self,
        driver: &str,
    ) -> Result<&mut Self, SelectionError> {
        let fs = driver
            .parse::<FlashFs>()
            .map_err(|()| SelectionError::UnknownDriver {
                slot: Slot::LocalFlash,
                value: driver.to_owned(),
            })?;
        Ok(self.bind_local_flash(fs))
    }

    /// Bind the removable card slot by name.
    pub fn select_removable_storage_filesystem(
        &mut self,
        driver: &str,
    ) -> Result<&mut Self, SelectionError> {
        let fs = driver
            .parse::<RemovableFs>()
            .map_err(|()| SelectionError::UnknownDriver {
                slot: Slot::Removable,
                value: driver.to_owned(),
            })?;
        Ok(self.bind_removable(fs))
    }

    /// Turn a module on or off by name.
    pub fn set_module_enabled(
        &mut self,
        module_name: &str,
        enabled: bool,
    ) -> Result<&mut Self, SelectionError> {
        let module = module_name
            .parse::<Module>()
            .map_err(|()| SelectionError::UnknownModule {
                value: module_name.to_owned(),
            })?;
        Ok(self.bind_module(module, enabled))
    }

    pub fn bind_local_flash(&mut self, fs: FlashFs) -> &mut Self {
        self.local_flash = Some(fs);
        self
    }

    pub fn bind_removable(&mut self, fs: RemovableFs) -> &mut Self {
        self.removable = Some(fs);
        self
    }

    pub fn bind_module(&mut self, module: Module, enabled: bool) -> &mut Self {
        match module {
            Module::Rtdb => self.rtdb = Some(enabled),
            Module::Fcm => self.fcm = Some(enabled),
        }
        self
    }

    /// Resolve unset slots to their defaults and validate against `family`.
    ///
    /// Only the flash driver is checked. A removable driver the hardware
    /// cannot drive is accepted and fails at mount time.
    pub fn finalize(&self, family: HardwareFamily) -> Result<Selection, SelectionError> {
        let local_flash = self.local_flash.unwrap_or(FlashFs::DEFAULT);
        if !family.supports_flash(local_flash) {
            return Err(SelectionError::Unsupported {
                slot: Slot::LocalFlash,
                value: local_flash.name(),
                family,
            });
        }

        Ok(Selection {
            family,
            local_flash,
            removable: self.removable.unwrap_or(RemovableFs::DEFAULT),
            rtdb: self.rtdb.unwrap_or(false),
            fcm: self.fcm.unwrap_or(false),
        })
    }
}

/// The frozen outcome of a [`FeatureSelector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub family: HardwareFamily,
    pub local_flash: FlashFs,
    pub removable: RemovableFs,
    pub rtdb: bool,
    pub fcm: bool,
}

impl Selection {
    /// The library's documented baseline: default drivers, both modules on.
    pub const fn baseline(family: HardwareFamily) -> Self {
        Self {
            family,
            local_flash: FlashFs::DEFAULT,
            removable: RemovableFs::DEFAULT,
            rtdb: true,
            fcm: true,
        }
    }

    pub const fn module_enabled(&self, module: Module) -> bool {
        match module {
            Module::Rtdb => self.rtdb,
            Module::Fcm => self.fcm,
        }
    }

    /// `cfg` name/value pairs the build script hands to rustc.
    pub fn cfg_pairs(&self) -> [(&'static str, &'static str); 2] {
        [
            ("flash_fs", self.local_flash.name()),
            ("removable_fs", self.removable.name()),
        ]
    }

    /// Rust source for a `RESOLVED` constant equal to `self`.
    pub fn to_rust_source(&self) -> String {
        format!(
            "/// Selection resolved by the build script for this build.\n\
             pub const RESOLVED: Selection = Selection {{\n    \
             family: HardwareFamily::{:?},\n    \
             local_flash: FlashFs::{:?},\n    \
             removable: RemovableFs::{:?},\n    \
             rtdb: {},\n    \
             fcm: {},\n\
             }};\n",
            self.family, self.local_flash, self.removable, self.rtdb, self.fcm
        )
    }
}

/// Build a selection from Cargo feature names.
///
/// Defaults are bound first, then the feature-driven bindings. Two filesystem
/// features for the same slot have no order between them and are a
/// [`SelectionError::Conflict`]. Module slots are always bound: present
/// feature means on. Names that are not selection features are ignored.
pub fn resolve_features<'a, I>(features: I, family: HardwareFamily) -> Result<Selection, SelectionError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut selector = FeatureSelector::new();
    selector
        .bind_local_flash(FlashFs::DEFAULT)
        .bind_removable(RemovableFs::DEFAULT);

    let mut flash: Option<FlashFs> = None;
    let mut removable: Option<RemovableFs> = None;
    let mut modules = [false; 2];

    for feature in features {
        let feature = feature.trim().to_ascii_lowercase().replace('_', "-");
        if let Some(name) = feature.strip_prefix("flash-") {
            let fs = name
                .parse::<FlashFs>()
                .map_err(|()| SelectionError::UnknownDriver {
                    slot: Slot::LocalFlash,
                    value: name.to_owned(),
                })?;
            match flash {
                Some(prev) if prev != fs => {
                    return Err(SelectionError::Conflict {
                        slot: Slot::LocalFlash,
                        first: prev.name(),
                        second: fs.name(),
                    });
                }
                _ => flash = Some(fs),
            }
        } else if let Some(name) = feature.strip_prefix("sd-") {
            // `sd-spi` names the plain SD driver.
            let fs = if name == "spi" {
                RemovableFs::Sd
            } else {
                format!("sd-{name}")
                    .parse::<RemovableFs>()
                    .map_err(|()| SelectionError::UnknownDriver {
                        slot: Slot::Removable,
                        value: feature.clone(),
                    })?
            };
            match removable {
                Some(prev) if prev != fs => {
                    return Err(SelectionError::Conflict {
                        slot: Slot::Removable,
                        first: prev.name(),
                        second: fs.name(),
                    });
                }
                _ => removable = Some(fs),
            }
        } else if let Ok(module) = feature.parse::<Module>() {
            modules[module as usize] = true;
        }
    }

    if let Some(fs) = flash {
        selector.bind_local_flash(fs);
    }
    if let Some(fs) = removable {
        selector.bind_removable(fs);
    }
    for module in Module::ALL {
        selector.bind_module(module, modules[module as usize]);
    }

    selector.finalize(family)
}
