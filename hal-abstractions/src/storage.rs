//! Storage medium abstraction
//!
//! Models an SD card that is powered only while in use. Files are opened by
//! name and exposed as `embedded-io` handles so the core crate can stream
//! lines and patch single bytes in place with `Seek`.

use embedded_io::{Read, Seek, Write};

/// How a file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenMode {
    /// Read from the start
    Read,
    /// Every write lands at the end of the file
    Append,
    /// Read and overwrite in place; the cursor starts at 0
    ReadWrite,
}

/// An open file on the medium
///
/// Dropping a handle without calling [`StorageFile::close`] may lose
/// buffered data.
pub trait StorageFile: Read + Write + Seek {
    /// Flush and release the handle
    fn close(self) -> Result<(), Self::Error>;
}

/// Port for a removable storage medium
///
/// # Example Implementation
///
/// ```ignore
/// impl Storage for SdCard {
///     type Error = SdError;
///     type File<'a> = SdFile<'a>;
///
///     fn power_on(&mut self) -> Result<(), SdError> {
///         self.enable.set_high();
///         self.volume.mount()
///     }
///     // ...
/// }
/// ```
pub trait Storage {
    /// Error type shared by the medium and its files
    type Error: embedded_io::Error;

    /// Open file handle, borrowing the medium
    type File<'a>: StorageFile<Error = Self::Error>
    where
        Self: 'a;

    /// Power and mount the medium
    fn power_on(&mut self) -> Result<(), Self::Error>;

    /// Unmount and remove power
    fn power_off(&mut self);

    /// Whether `name` exists
    fn exists(&mut self, name: &str) -> Result<bool, Self::Error>;

    /// Create an empty file called `name`
    fn create(&mut self, name: &str) -> Result<(), Self::Error>;

    /// Open an existing file
    fn open(&mut self, name: &str, mode: OpenMode) -> Result<Self::File<'_>, Self::Error>;
}
