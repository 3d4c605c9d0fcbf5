//! One logging cycle
//!
//! The scheduler hands over the cycle's record and the RTC time. The record
//! goes to today's file; when the date has moved on, yesterday's file is
//! finalized into the unsent index.

use heapless::String;
use probe_hal::Storage;

use crate::config::FILENAME_SIZE;
use crate::datalog::filename::filename;
use crate::datalog::rollover::Rollover;
use crate::datalog::{DurableLog, StorageError};
use crate::record::Record;
use crate::time::DateTime;
use crate::upload::UploadPolicy;

/// Outcome of [`Datalogger::log_cycle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// File the record was written to
    pub filename: String<FILENAME_SIZE>,
    /// File closed by this cycle and queued for upload
    pub finalized: Option<String<FILENAME_SIZE>>,
    /// The upload policy asks for a flush now
    pub flush_due: bool,
}

/// Daily-file logger
pub struct Datalogger<S> {
    log: DurableLog<S>,
    policy: UploadPolicy,
    rollover: Rollover,
    current: Option<String<FILENAME_SIZE>>,
}

impl<S: Storage> Datalogger<S> {
    pub fn new(log: DurableLog<S>, policy: UploadPolicy) -> Self {
        Self {
            log,
            policy,
            rollover: Rollover::new(),
            current: None,
        }
    }

    pub fn log(&mut self) -> &mut DurableLog<S> {
        &mut self.log
    }

    /// File currently being appended to; it must not be uploaded
    pub fn current_file(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Continue an existing daily file after a reset
    ///
    /// Without this the first cycle after boot cannot tell that the previous
    /// file needs finalizing.
    pub fn resume(&mut self, current: &str) -> Result<(), StorageError> {
        let mut name = String::new();
        name.push_str(current)
            .map_err(|_| StorageError::FilenameOverflow)?;
        self.current = Some(name);
        Ok(())
    }

    /// Append `record` to the file for `now`
    ///
    /// The append and the finalization of the previous file are independent:
    /// a failed append does not stop the previous file from being queued,
    /// and a failed queue leaves it to be retried next cycle.
    pub fn log_cycle(
        &mut self,
        record: &Record,
        now: DateTime,
    ) -> Result<CycleReport, StorageError> {
        let change = self.rollover.observe(now);
        let naming = self.log.config().naming;
        let today = filename(&now, naming).map_err(|_| StorageError::FilenameOverflow)?;

        let appended = self.log.write_record(&today, record);
        let finalized = self.finalize_previous(&today);

        appended?;
        let finalized = finalized?;
        Ok(CycleReport {
            filename: today,
            finalized,
            flush_due: self.policy.should_flush(change),
        })
    }

    fn finalize_previous(
        &mut self,
        today: &String<FILENAME_SIZE>,
    ) -> Result<Option<String<FILENAME_SIZE>>, StorageError> {
        match self.current.take() {
            Some(previous) if previous != *today => match self.log.enqueue_unsent(&previous) {
                Ok(()) => {
                    info!("day rollover: {} -> {}", previous.as_str(), today.as_str());
                    self.current = Some(today.clone());
                    Ok(Some(previous))
                }
                Err(e) => {
                    error!("could not queue {}: {:?}", previous.as_str(), e);
                    self.current = Some(previous);
                    Err(e)
                }
            },
            _ => {
                self.current = Some(today.clone());
                Ok(None)
            }
        }
    }
}
