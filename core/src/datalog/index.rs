//! Unsent-file index
//!
//! One entry per finalized daily file, appended at rollover:
//!
//! ```text
//!  18-07-05.csv      pending
//! *18-07-06.csv      uploaded
//! ```
//!
//! The first byte of every entry is a marker slot, written as a space and
//! overwritten with `*` in place once the file is uploaded. Entries are
//! never removed, so the file only grows and a marker is the only byte that
//! ever changes.
//!
//! Older firmware wrote bare filenames with no slot. Such a line is read as
//! a pending entry for the whole line; marking it overwrites its first
//! character, so once sent it reads back as `Sent` with that character
//! missing.

use core::str;

use embedded_io::{Read, Seek, SeekFrom, Write};
use heapless::String;

use crate::config::FILENAME_SIZE;
use crate::field::CapacityError;

/// Marker slot of an entry that still has to be uploaded
pub const PENDING: u8 = b' ';

/// Marker slot of an uploaded entry
pub const SENT: u8 = b'*';

/// Longest entry line accepted: marker, filename, optional CR
pub const INDEX_LINE_SIZE: usize = FILENAME_SIZE + 1;

/// One parsed index line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexEntry<'a> {
    Pending(&'a str),
    Sent(&'a str),
    /// Blank line
    Empty,
    /// Too long, empty name or not printable ASCII
    Corrupt,
}

impl<'a> IndexEntry<'a> {
    pub fn parse(line: &'a [u8]) -> Self {
        let line = match line.last() {
            Some(b'\r') => &line[..line.len() - 1],
            _ => line,
        };
        let Some((&marker, rest)) = line.split_first() else {
            return IndexEntry::Empty;
        };
        let (name, sent) = match marker {
            PENDING => (rest, false),
            SENT => (rest, true),
            // bare filename without a marker slot
            _ => (line, false),
        };
        if name.is_empty() || !name.iter().all(u8::is_ascii_graphic) {
            return IndexEntry::Corrupt;
        }
        let Ok(name) = str::from_utf8(name) else {
            return IndexEntry::Corrupt;
        };
        if sent {
            IndexEntry::Sent(name)
        } else {
            IndexEntry::Pending(name)
        }
    }

    /// Filename of a pending or sent entry
    pub fn name(&self) -> Option<&'a str> {
        match *self {
            IndexEntry::Pending(name) | IndexEntry::Sent(name) => Some(name),
            IndexEntry::Empty | IndexEntry::Corrupt => None,
        }
    }
}

/// Pending entry line for `filename`, without the newline
pub fn entry_line(filename: &str) -> Result<String<INDEX_LINE_SIZE>, CapacityError> {
    if filename.is_empty() || 1 + filename.len() >= INDEX_LINE_SIZE {
        return Err(CapacityError);
    }
    let mut line = String::new();
    line.push(char::from(PENDING)).map_err(|_| CapacityError)?;
    line.push_str(filename).map_err(|_| CapacityError)?;
    Ok(line)
}

/// What an index walk does after visiting an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<T> {
    Next,
    /// Mark the entry sent, then continue
    Mark,
    /// Mark the entry sent, then stop with a value
    MarkAndStop(T),
    Stop(T),
}

/// Failure while walking an index handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkError {
    Read,
    WriteMarker,
}

/// A line read from the index
struct Line {
    /// Bytes stored in the buffer
    len: usize,
    /// Bytes consumed from the file, newline included
    consumed: usize,
    /// The line did not fit the buffer
    overflowed: bool,
}

/// Read up to the next `\n`; `None` at end of file
///
/// An oversized line is consumed completely so the next read starts on the
/// following entry.
fn read_line<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<Option<Line>, R::Error> {
    let mut line = Line {
        len: 0,
        consumed: 0,
        overflowed: false,
    };
    let mut byte = [0u8; 1];
    loop {
        if reader.read(&mut byte)? == 0 {
            break;
        }
        line.consumed += 1;
        if byte[0] == b'\n' {
            break;
        }
        if line.len < buf.len() {
            buf[line.len] = byte[0];
            line.len += 1;
        } else {
            line.overflowed = true;
        }
    }
    Ok((line.consumed > 0).then_some(line))
}

/// Visit every entry of an open index, marking entries in place on request
///
/// Returns `None` when the end of the file is reached without a stop.
pub fn walk<F, T>(
    file: &mut F,
    mut visit: impl FnMut(IndexEntry<'_>) -> Step<T>,
) -> Result<Option<T>, WalkError>
where
    F: Read + Write + Seek,
{
    let mut buf = [0u8; INDEX_LINE_SIZE];
    let mut offset = 0u64;

    while let Some(line) = read_line(file, &mut buf).map_err(|_| WalkError::Read)? {
        let start = offset;
        offset += line.consumed as u64;

        let entry = if line.overflowed {
            IndexEntry::Corrupt
        } else {
            IndexEntry::parse(&buf[..line.len])
        };

        match visit(entry) {
            Step::Next => {}
            Step::Mark => write_marker(file, start, offset)?,
            Step::MarkAndStop(value) => {
                write_marker(file, start, offset)?;
                return Ok(Some(value));
            }
            Step::Stop(value) => return Ok(Some(value)),
        }
    }
    Ok(None)
}

/// Overwrite the marker slot at `entry_start`, then resume at `resume_at`
fn write_marker<F: Write + Seek>(
    file: &mut F,
    entry_start: u64,
    resume_at: u64,
) -> Result<(), WalkError> {
    file.seek(SeekFrom::Start(entry_start))
        .map_err(|_| WalkError::WriteMarker)?;
    file.write_all(&[SENT]).map_err(|_| WalkError::WriteMarker)?;
    file.seek(SeekFrom::Start(resume_at))
        .map_err(|_| WalkError::Read)?;
    Ok(())
}
