//! Durable local storage
//!
//! - [`durable`]: append-only writes with strict medium power sequencing
//! - [`filename`]: daily filenames and remote paths
//! - [`index`]: the unsent-file index line format
//! - [`rollover`]: day and hour change detection
//! - [`datalogger`]: one logging cycle, rollover included

use core::fmt;

pub mod datalogger;
pub mod durable;
pub mod filename;
pub mod index;
pub mod rollover;

pub use datalogger::{CycleReport, Datalogger};
pub use durable::DurableLog;
pub use filename::{filename, remote_path, FileNaming};
pub use index::{IndexEntry, Step};
pub use rollover::{Rollover, RolloverChange};

/// Storage errors
///
/// Every variant leaves the medium powered down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Medium failed to power on or mount
    Init,
    /// Target file missing and could not be created
    Create,
    /// Open or write of the target file failed
    Append,
    /// Closing the file failed; the write may not be durable
    Close,
    /// Index could not be opened or read
    Read,
    /// Sent marker could not be written
    WriteMarker,
    /// No index entry for the file
    EntryNotFound,
    /// Record does not fit the line budget; nothing was written
    Overflow,
    /// Filename or index entry does not fit its buffer
    FilenameOverflow,
}

impl StorageError {
    /// Status code reported to the scheduler
    pub const fn code(self) -> u8 {
        match self {
            Self::Init => 1,
            Self::Create => 2,
            Self::Append => 3,
            Self::Close => 4,
            Self::Read => 5,
            Self::WriteMarker => 6,
            Self::EntryNotFound => 7,
            Self::Overflow => 8,
            Self::FilenameOverflow => 9,
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "storage init failed"),
            Self::Create => write!(f, "file create failed"),
            Self::Append => write!(f, "append failed"),
            Self::Close => write!(f, "file close failed"),
            Self::Read => write!(f, "index read failed"),
            Self::WriteMarker => write!(f, "marker write failed"),
            Self::EntryNotFound => write!(f, "no index entry for file"),
            Self::Overflow => write!(f, "record exceeds line budget"),
            Self::FilenameOverflow => write!(f, "filename exceeds buffer"),
        }
    }
}

impl core::error::Error for StorageError {}
