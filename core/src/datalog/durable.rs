//! Append-only log on a power-gated medium
//!
//! Every public operation powers the medium, does its work and powers it
//! down again, on success and on every error path. Nothing is cached
//! between calls: a power cut can only lose the line being written.

use embedded_io::Write;
use probe_hal::{OpenMode, Storage, StorageFile};

use crate::config::{LogConfig, LOG_LINE_BUDGET};
use crate::datalog::index::{self, entry_line, IndexEntry, Step, WalkError};
use crate::datalog::StorageError;
use crate::record::Record;
use crate::serializer::serialize;

/// Append-only record log plus its unsent-file index
pub struct DurableLog<S> {
    storage: S,
    config: LogConfig,
}

impl<S: Storage> DurableLog<S> {
    pub fn new(storage: S, config: LogConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Give back the medium
    pub fn release(self) -> S {
        self.storage
    }

    /// Append `line` and a newline to `filename`, creating it if needed
    pub fn append(&mut self, filename: &str, line: &str) -> Result<(), StorageError> {
        let result = self.with_medium(|storage| append_line(storage, filename, line));
        match result {
            Ok(()) => debug!("appended {} bytes to {}", line.len() + 1, filename),
            Err(e) => error!("append to {} failed: {:?}", filename, e),
        }
        result
    }

    /// Serialize `record` and append it to `filename`
    ///
    /// The line is built before the medium is touched; a record over the
    /// line budget writes nothing.
    pub fn write_record(&mut self, filename: &str, record: &Record) -> Result<(), StorageError> {
        let line = serialize::<LOG_LINE_BUDGET>(record).map_err(|_| StorageError::Overflow)?;
        self.append(filename, &line)
    }

    /// Add a pending entry for `filename` to the unsent index
    pub fn enqueue_unsent(&mut self, filename: &str) -> Result<(), StorageError> {
        let line = entry_line(filename).map_err(|_| StorageError::FilenameOverflow)?;
        let index = self.config.unsent_index;
        self.append(index, &line)?;
        info!("{} queued for upload", filename);
        Ok(())
    }

    /// Mark the index entry of `filename` as uploaded
    ///
    /// Only the entry's marker byte is rewritten. Marking an entry that is
    /// already marked succeeds without writing.
    pub fn mark_uploaded(&mut self, filename: &str) -> Result<(), StorageError> {
        let mut already_sent = false;
        let marked = self.walk_index(|entry| match entry {
            IndexEntry::Pending(name) if name == filename => Step::MarkAndStop(()),
            // a bare entry loses its first character when marked
            IndexEntry::Sent(name)
                if name == filename || filename.get(1..) == Some(name) =>
            {
                already_sent = true;
                Step::Next
            }
            _ => Step::Next,
        })?;

        match marked {
            Some(()) => {
                info!("{} marked uploaded", filename);
                Ok(())
            }
            None if already_sent => Ok(()),
            None => Err(StorageError::EntryNotFound),
        }
    }

    /// Walk the unsent index from the start
    ///
    /// A missing index is an empty one. Returns `None` if the walk reached
    /// the end of the index without stopping.
    pub fn walk_index<T>(
        &mut self,
        visit: impl FnMut(IndexEntry<'_>) -> Step<T>,
    ) -> Result<Option<T>, StorageError> {
        let name = self.config.unsent_index;
        self.with_medium(|storage| {
            if !storage.exists(name).map_err(|_| StorageError::Read)? {
                return Ok(None);
            }
            let mut file = storage
                .open(name, OpenMode::ReadWrite)
                .map_err(|_| StorageError::Read)?;
            let walked = index::walk(&mut file, visit);
            let closed = file.close();

            let outcome = walked.map_err(|e| match e {
                WalkError::Read => StorageError::Read,
                WalkError::WriteMarker => StorageError::WriteMarker,
            })?;
            closed.map_err(|_| StorageError::Close)?;
            Ok(outcome)
        })
    }

    /// Run `op` with the medium powered, then power it down
    fn with_medium<T>(
        &mut self,
        op: impl FnOnce(&mut S) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        if self.storage.power_on().is_err() {
            self.storage.power_off();
            error!("storage power on failed");
            return Err(StorageError::Init);
        }
        let result = op(&mut self.storage);
        self.storage.power_off();
        result
    }
}

fn append_line<S: Storage>(
    storage: &mut S,
    filename: &str,
    line: &str,
) -> Result<(), StorageError> {
    let exists = storage.exists(filename).map_err(|_| StorageError::Create)?;
    if !exists {
        storage.create(filename).map_err(|_| StorageError::Create)?;
        info!("created {}", filename);
    }

    let mut file = storage
        .open(filename, OpenMode::Append)
        .map_err(|_| StorageError::Append)?;
    let written = file
        .write_all(line.as_bytes())
        .and_then(|()| file.write_all(b"\n"));
    if written.is_err() {
        // the handle is dropped either way; the append error is what matters
        let _ = file.close();
        return Err(StorageError::Append);
    }
    file.close().map_err(|_| StorageError::Close)
}
