//! Daily filenames
//!
//! A filename is a pure function of the date and the naming policy, short
//! enough for an 8.3 FAT volume: `DD-MM-YY.csv` or `YY-MM-DD.csv`.

use core::fmt::Write;

use heapless::String;

use crate::config::{FILENAME_SIZE, REMOTE_PATH_SIZE};
use crate::field::CapacityError;
use crate::time::DateTime;

/// Name of the only file in [`FileNaming::SingleFile`] mode
pub const SINGLE_FILE_NAME: &str = "SENSOR_DATA";

/// How the log file is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FileNaming {
    /// `DD-MM-YY.csv`
    DayMonthYear,
    /// `YY-MM-DD.csv`, sorts chronologically within a century
    YearMonthDay,
    /// Everything goes to [`SINGLE_FILE_NAME`]; never rolls over
    SingleFile,
}

impl FileNaming {
    /// Whether the filename changes with the date
    pub const fn is_dated(self) -> bool {
        !matches!(self, FileNaming::SingleFile)
    }
}

/// Log filename for `date`
pub fn filename(
    date: &DateTime,
    naming: FileNaming,
) -> Result<String<FILENAME_SIZE>, CapacityError> {
    let mut name = String::new();
    let yy = date.year % 100;
    let written = match naming {
        FileNaming::DayMonthYear => {
            write!(name, "{:02}-{:02}-{:02}.csv", date.day, date.month, yy)
        }
        FileNaming::YearMonthDay => {
            write!(name, "{:02}-{:02}-{:02}.csv", yy, date.month, date.day)
        }
        FileNaming::SingleFile => name
            .push_str(SINGLE_FILE_NAME)
            .map_err(|_| core::fmt::Error),
    };
    written.map_err(|_| CapacityError)?;
    if name.len() >= FILENAME_SIZE {
        return Err(CapacityError);
    }
    Ok(name)
}

/// Remote path of `filename` under `base_dir`
///
/// Same capacity rule as every bounded buffer: the result must leave the
/// terminator slot free.
pub fn remote_path(
    base_dir: &str,
    filename: &str,
) -> Result<String<REMOTE_PATH_SIZE>, CapacityError> {
    if base_dir.len() + filename.len() >= REMOTE_PATH_SIZE {
        return Err(CapacityError);
    }
    let mut path = String::new();
    path.push_str(base_dir).map_err(|_| CapacityError)?;
    path.push_str(filename).map_err(|_| CapacityError)?;
    Ok(path)
}
