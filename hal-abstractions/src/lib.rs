//! Hardware abstraction traits for the glacier probe firmware
//!
//! This crate defines the capabilities the probe logic consumes. Board
//! support packages implement these traits; the core crate never touches a
//! register, pin or peripheral directly.
//!
//! - [`serial`]: addressed request/response link to a bus sensor
//! - [`power`]: socket power rails and the ON/OFF contract for drivers
//! - [`storage`]: removable storage medium with `embedded-io` file handles
//! - [`clock`]: wall-clock and monotonic time
//! - [`uplink`]: remote collection endpoint (form POST and file transfer)
//!
//! Delays use [`embedded_hal::delay::DelayNs`], re-exported here as
//! [`DelayNs`].

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod power;
pub mod serial;
pub mod storage;
pub mod uplink;

pub use clock::Clock;
pub use embedded_hal::delay::DelayNs;
pub use power::{PowerControllable, SensorSocket, Socket};
pub use serial::{LinkState, SerialLink};
pub use storage::{OpenMode, Storage, StorageFile};
pub use uplink::{PostRequest, Uploader};
