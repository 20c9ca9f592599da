//! Integration test driver for `tests/integration/` submodules.
//!
//! Each `mod` below exercises one consumer of the build-time selection
//! against mock transports and the simulated storage backend. All tests run
//! on the host (x86_64) with no real hardware required.

mod mock_transport;
mod module_surface_tests;
mod storage_tests;

#[cfg(feature = "rtdb")]
mod rtdb_tests;

#[cfg(feature = "fcm")]
mod fcm_tests;
