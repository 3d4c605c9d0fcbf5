//! Platform-agnostic core logic for the glacier probe datalogger
//!
//! This crate contains everything between "the scheduler woke up" and "the
//! scheduler may sleep again". It has NO hardware dependencies: every
//! peripheral is reached through the traits in `glacier-probe-hal`.
//!
//! ```text
//! scheduler
//!    │ Ds2::on / read / off            (sensors)
//!    ▼
//! Record ──► serializer::serialize ──► DurableLog::append  (datalog)
//!                                          │ day rollover
//!                                          ▼
//!                             UploadPipeline::flush_unsent (upload)
//! ```
//!
//! ## Cargo features
//!
//! - `defmt`: log through `defmt` and derive `defmt::Format` on public types
//! - `log`: log through the `log` facade (host tools)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod datalog;
pub mod field;
pub mod record;
pub mod sensors;
pub mod serializer;
pub mod time;
pub mod upload;

#[cfg(test)]
mod testing;

pub use config::ProbeConfig;
pub use datalog::{Datalogger, DurableLog, FileNaming, StorageError};
pub use field::{CapacityError, Field};
pub use record::{Record, RecordError};
pub use sensors::{Ds2, Ds2Error, SocketRegistry};
pub use serializer::{serialize, RecordFormat, SerializeError};
pub use time::DateTime;
pub use upload::{FlushStatus, UploadError, UploadPipeline, UploadPolicy};

// reexport heapless so callers can name buffer types without a direct dependency
pub use heapless;
