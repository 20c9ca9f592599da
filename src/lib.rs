//! Firebase client for ESP32/ESP8266 firmware.
//!
//! What ends up in the image is decided at build time:
//!
//! | Cargo feature                      | Slot             | Default  |
//! |------------------------------------|------------------|----------|
//! | `flash-spiffs` / `flash-littlefs` / `flash-fatfs` | local flash fs | spiffs |
//! | `sd-spi` / `sd-mmc`                | removable card fs | sd      |
//! | `rtdb`                             | Realtime Database | on      |
//! | `fcm`                              | Cloud Messaging   | on      |
//!
//! `build.rs` resolves the features into [`config::RESOLVED`] and the
//! `flash_fs` / `removable_fs` cfgs, and fails the build on an unknown,
//! conflicting or chip-unsupported choice. Disabled modules are not compiled:
//! `firebase_esp::rtdb` and `firebase_esp::fcm` do not exist without their
//! features. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.
//!
//! The database client only exists in builds with `rtdb`:
//!
#![cfg_attr(feature = "rtdb", doc = "```")]
#![cfg_attr(not(feature = "rtdb"), doc = "```compile_fail")]
//! use firebase_esp::rtdb::{DatabasePath, Rtdb};
//! ```
//!
//! and the message sender only in builds with `fcm`:
//!
#![cfg_attr(feature = "fcm", doc = "```")]
#![cfg_attr(not(feature = "fcm"), doc = "```compile_fail")]
//! use firebase_esp::fcm::{FcmMessage, Messaging};
//! ```

#![deny(unused_must_use)]

pub mod config;
pub mod diagnostics;
pub mod storage;
pub mod transport;

mod error;

#[cfg(feature = "rtdb")]
pub mod rtdb;

#[cfg(feature = "fcm")]
pub mod fcm;

pub use error::{Error, Result};
