//! Record serialization
//!
//! Stored line layout: `key=value` pairs joined with `,`, terminated by `;`.
//! The same pairs joined with `&` and no terminator form the body of the
//! key-value POST.
//!
//! Serialization is all-or-nothing: the line is assembled in a bounded
//! buffer and the budget is checked before each pair is written, so a
//! record that does not fit produces an error and no partial output.

use core::fmt;

use heapless::String;

use crate::record::{Record, RecordError};

/// Separators used to lay out a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RecordFormat {
    /// Between two `key=value` pairs
    pub pair_separator: char,
    /// After the last pair
    pub terminator: Option<char>,
}

impl RecordFormat {
    /// Layout of a line in the daily log file
    pub const LOG: Self = Self {
        pair_separator: ',',
        terminator: Some(';'),
    };

    /// Layout of a form POST body
    pub const FORM: Self = Self {
        pair_separator: '&',
        terminator: None,
    };
}

/// Serialization errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerializeError {
    /// The record does not fit in the output budget
    Overflow,
}

impl SerializeError {
    /// Status code reported to the scheduler
    pub const fn code(self) -> u8 {
        1
    }
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "serialized record exceeds budget")
    }
}

impl core::error::Error for SerializeError {}

/// Errors reading a stored line back into a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// The line does not end with the record terminator
    MissingTerminator,
    /// A pair has no `=`
    MalformedPair,
    /// The pairs do not form a valid record
    Record(RecordError),
}

impl ParseError {
    /// Status code reported to the scheduler
    pub const fn code(self) -> u8 {
        match self {
            Self::MissingTerminator => 1,
            Self::MalformedPair => 2,
            Self::Record(_) => 3,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTerminator => write!(f, "record terminator missing"),
            Self::MalformedPair => write!(f, "pair without '='"),
            Self::Record(e) => write!(f, "invalid record: {}", e),
        }
    }
}

impl core::error::Error for ParseError {}

impl From<RecordError> for ParseError {
    fn from(e: RecordError) -> Self {
        ParseError::Record(e)
    }
}

/// Serialize `record` as a log line of at most `N` bytes
pub fn serialize<const N: usize>(record: &Record) -> Result<String<N>, SerializeError> {
    serialize_with(record, RecordFormat::LOG)
}

/// Serialize `record` with an explicit layout into at most `N` bytes
pub fn serialize_with<const N: usize>(
    record: &Record,
    format: RecordFormat,
) -> Result<String<N>, SerializeError> {
    let mut out = String::<N>::new();

    for (idx, (key, value)) in record.iter().enumerate() {
        let separator = if idx > 0 {
            format.pair_separator.len_utf8()
        } else {
            0
        };
        let needed = separator + key.len() + 1 + value.len();
        if out.len() + needed > N {
            warn!("record overflow at '{}' ({} + {} > {})", key, out.len(), needed, N);
            return Err(SerializeError::Overflow);
        }
        if idx > 0 {
            push_char(&mut out, format.pair_separator)?;
        }
        push_str(&mut out, key)?;
        push_char(&mut out, '=')?;
        push_str(&mut out, value)?;
    }

    if let Some(terminator) = format.terminator {
        if out.len() + terminator.len_utf8() > N {
            warn!("record overflow at terminator ({} of {})", out.len(), N);
            return Err(SerializeError::Overflow);
        }
        push_char(&mut out, terminator)?;
    }

    Ok(out)
}

fn push_str<const N: usize>(out: &mut String<N>, text: &str) -> Result<(), SerializeError> {
    out.push_str(text).map_err(|_| SerializeError::Overflow)
}

fn push_char<const N: usize>(out: &mut String<N>, c: char) -> Result<(), SerializeError> {
    out.push(c).map_err(|_| SerializeError::Overflow)
}

/// Parse one stored log line back into a record
///
/// Trailing line endings are ignored.
pub fn parse_line(line: &str) -> Result<Record, ParseError> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    let body = line
        .strip_suffix(';')
        .ok_or(ParseError::MissingTerminator)?;

    let mut record = Record::new();
    if body.is_empty() {
        return Ok(record);
    }
    for pair in body.split(',') {
        let (key, value) = pair.split_once('=').ok_or(ParseError::MalformedPair)?;
        record.push(key, value)?;
    }
    Ok(record)
}
