//! Upload of finalized daily files
//!
//! Files are queued in the unsent index at rollover and flushed in index
//! order whenever the upload policy says so. A failed upload leaves its
//! entry pending; it is retried on the next flush. A flush never runs past
//! its time budget and never touches the file still being written.

use core::fmt;

use probe_hal::{Clock, Storage, Uploader};

use crate::config::UploadConfig;
use crate::datalog::filename::remote_path;
use crate::datalog::index::{IndexEntry, Step};
use crate::datalog::rollover::RolloverChange;
use crate::datalog::{DurableLog, StorageError};
use crate::record::Record;

pub mod form;

pub use form::post_record;

/// When a flush is due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UploadPolicy {
    Never,
    /// On the first cycle of a new day
    Daily,
    /// On the first cycle of a new hour
    Hourly,
}

impl UploadPolicy {
    pub fn should_flush(self, change: RolloverChange) -> bool {
        match self {
            UploadPolicy::Never => false,
            UploadPolicy::Daily => change.day,
            UploadPolicy::Hourly => change.hour,
        }
    }
}

/// Why a flush stopped
///
/// None of these is a failure: the scheduler uses them to decide when to
/// flush again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushStatus {
    /// Every entry was visited, or a blank entry ended the index
    EndOfIndex,
    /// The next entry is the file still being written
    ReachedOpenFile,
    /// Out of time; remaining entries wait for the next flush
    TimeBudgetExceeded,
    /// An entry does not fit the path buffers
    IndexCorrupt,
}

impl FlushStatus {
    /// Status code reported to the scheduler
    pub const fn code(self) -> u8 {
        match self {
            Self::EndOfIndex => 1,
            Self::ReachedOpenFile => 2,
            Self::TimeBudgetExceeded => 3,
            Self::IndexCorrupt => 4,
        }
    }
}

/// Upload errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UploadError {
    /// Reading or marking the index failed
    Storage(StorageError),
    /// The modem reported a failure
    Transport,
    /// Resource or body does not fit its buffer
    Capacity,
}

impl UploadError {
    /// Status code reported to the scheduler
    pub const fn code(self) -> u8 {
        match self {
            Self::Storage(_) => 1,
            Self::Transport => 2,
            Self::Capacity => 3,
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {}", e),
            Self::Transport => write!(f, "transport failure"),
            Self::Capacity => write!(f, "request exceeds buffer"),
        }
    }
}

impl core::error::Error for UploadError {}

impl From<StorageError> for UploadError {
    fn from(e: StorageError) -> Self {
        UploadError::Storage(e)
    }
}

/// Moves finalized files to the server
pub struct UploadPipeline<U> {
    uploader: U,
    config: UploadConfig,
}

impl<U: Uploader> UploadPipeline<U> {
    pub fn new(uploader: U, config: UploadConfig) -> Self {
        Self { uploader, config }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    /// Queue `filename` for upload
    pub fn record_unsent<S: Storage>(
        &mut self,
        log: &mut DurableLog<S>,
        filename: &str,
    ) -> Result<(), UploadError> {
        log.enqueue_unsent(filename)?;
        Ok(())
    }

    /// Flush with the configured time budget
    pub fn flush<S: Storage, C: Clock>(
        &mut self,
        log: &mut DurableLog<S>,
        clock: &mut C,
        current_file: Option<&str>,
    ) -> Result<FlushStatus, UploadError> {
        let budget = self.config.time_budget_ms;
        self.flush_unsent(log, clock, current_file, budget)
    }

    /// Upload pending entries in index order until a stop condition
    ///
    /// Each successful upload is marked in the index before the next entry
    /// is read. Upload failures are logged and skipped.
    pub fn flush_unsent<S: Storage, C: Clock>(
        &mut self,
        log: &mut DurableLog<S>,
        clock: &mut C,
        current_file: Option<&str>,
        budget_ms: u64,
    ) -> Result<FlushStatus, UploadError> {
        let started = clock.uptime_ms();
        let base_dir = log.config().remote_base_dir;
        let uploader = &mut self.uploader;
        let mut uploaded = 0u32;
        let mut failed = 0u32;

        let stopped = log.walk_index(|entry| {
            let elapsed = clock.uptime_ms().wrapping_sub(started);
            if elapsed > budget_ms {
                return Step::Stop(FlushStatus::TimeBudgetExceeded);
            }

            let name = match entry {
                IndexEntry::Empty => return Step::Stop(FlushStatus::EndOfIndex),
                IndexEntry::Corrupt => return Step::Stop(FlushStatus::IndexCorrupt),
                IndexEntry::Sent(name) | IndexEntry::Pending(name)
                    if Some(name) == current_file =>
                {
                    return Step::Stop(FlushStatus::ReachedOpenFile)
                }
                IndexEntry::Sent(_) => return Step::Next,
                IndexEntry::Pending(name) => name,
            };

            let Ok(path) = remote_path(base_dir, name) else {
                return Step::Stop(FlushStatus::IndexCorrupt);
            };
            match uploader.upload_file(name, &path) {
                Ok(()) => {
                    info!("uploaded {} to {}", name, path.as_str());
                    uploaded += 1;
                    Step::Mark
                }
                Err(_) => {
                    warn!("upload of {} failed, left pending", name);
                    failed += 1;
                    Step::Next
                }
            }
        })?;

        let status = stopped.unwrap_or(FlushStatus::EndOfIndex);
        info!(
            "flush stopped: {:?} ({} uploaded, {} failed)",
            status, uploaded, failed
        );
        Ok(status)
    }

    /// Send one record to the key-value endpoint
    pub fn post_record(&mut self, record: &Record) -> Result<(), UploadError> {
        form::post_record(&mut self.uploader, &self.config.dweet, record)
    }
}
