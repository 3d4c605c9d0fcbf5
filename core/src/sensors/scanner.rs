//! Positional field scanner for sensor answers
//!
//! The anemometer answers its two data queries with two different grammars:
//!
//! - `aD0!` (sign-delimited): `0+1.23+180+5.2`. Each `+`/`-` opens the next
//!   field and is kept as the field's first character. Anything before the
//!   first sign (the address) is skipped.
//! - `aR3!` (whitespace-delimited): `+012 -034 056`. Fields start at the
//!   first byte, runs of spaces/tabs close the current field and are not
//!   stored, and signs are ordinary characters.
//!
//! Both are the same three-field state machine with a different delimiter
//! predicate. Scanning stops at a CR/LF, when a field would overflow, or
//! when the delimiter after the third field is reached.

use crate::field::Field;

/// Number of fields in each answer grammar
pub const FIELD_COUNT: usize = 3;

/// Delimiter grammar of an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Delimiter {
    /// `+` or `-` opens a field and is stored with it
    Sign,
    /// Space or tab separates fields and is dropped
    Whitespace,
}

impl Delimiter {
    fn matches(self, byte: u8) -> bool {
        match self {
            Delimiter::Sign => byte == b'+' || byte == b'-',
            Delimiter::Whitespace => byte == b' ' || byte == b'\t',
        }
    }

    fn initial_state(self) -> ScanState {
        match self {
            Delimiter::Sign => ScanState::BeforeField0,
            Delimiter::Whitespace => ScanState::InField0,
        }
    }
}

/// Position of the scanner within an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanState {
    /// Skipping the address prefix
    BeforeField0,
    InField0,
    InField1,
    InField2,
    /// No further bytes are consumed
    Done,
}

impl ScanState {
    fn next_field(self) -> Self {
        match self {
            ScanState::BeforeField0 => ScanState::InField0,
            ScanState::InField0 => ScanState::InField1,
            ScanState::InField1 => ScanState::InField2,
            ScanState::InField2 | ScanState::Done => ScanState::Done,
        }
    }

    fn field_index(self) -> Option<usize> {
        match self {
            ScanState::InField0 => Some(0),
            ScanState::InField1 => Some(1),
            ScanState::InField2 => Some(2),
            ScanState::BeforeField0 | ScanState::Done => None,
        }
    }
}

/// What a finished scan saw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanSummary {
    /// Delimiters that opened or closed a field
    pub delimiters: u8,
    /// A field ran out of room and scanning stopped early
    pub overflowed: bool,
    /// Where the scanner stopped
    pub state: ScanState,
}

/// Three-field scanner over a byte stream
pub struct FieldScanner<'a, const N: usize> {
    fields: &'a mut [Field<N>; FIELD_COUNT],
    delimiter: Delimiter,
    state: ScanState,
    delimiters: u8,
    overflowed: bool,
}

impl<'a, const N: usize> FieldScanner<'a, N> {
    /// Start a scan; every destination field is cleared
    pub fn new(fields: &'a mut [Field<N>; FIELD_COUNT], delimiter: Delimiter) -> Self {
        for field in fields.iter_mut() {
            field.clear();
        }
        Self {
            fields,
            delimiter,
            state: delimiter.initial_state(),
            delimiters: 0,
            overflowed: false,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Consume one byte; returns `false` once the scan is done
    pub fn feed(&mut self, byte: u8) -> bool {
        if self.state == ScanState::Done {
            return false;
        }

        if byte == b'\r' || byte == b'\n' {
            self.state = ScanState::Done;
        } else if self.delimiter.matches(byte) {
            self.on_delimiter(byte);
        } else if let Some(idx) = self.state.field_index() {
            self.store(idx, byte);
        }

        self.state != ScanState::Done
    }

    /// Feed every byte of `bytes` until the scan is done
    pub fn feed_all(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if !self.feed(byte) {
                break;
            }
        }
    }

    pub fn finish(self) -> ScanSummary {
        ScanSummary {
            delimiters: self.delimiters,
            overflowed: self.overflowed,
            state: self.state,
        }
    }

    fn on_delimiter(&mut self, byte: u8) {
        match self.delimiter {
            Delimiter::Sign => {
                self.delimiters += 1;
                self.state = self.state.next_field();
                if let Some(idx) = self.state.field_index() {
                    self.fields[idx].clear();
                    self.store(idx, byte);
                }
            }
            Delimiter::Whitespace => {
                // a run of blanks closes the field once; leading blanks are skipped
                let has_content = self
                    .state
                    .field_index()
                    .is_some_and(|idx| !self.fields[idx].is_empty());
                if has_content {
                    self.delimiters += 1;
                    self.state = self.state.next_field();
                }
            }
        }
    }

    fn store(&mut self, idx: usize, byte: u8) {
        if !byte.is_ascii_graphic() {
            trace!("skipping byte {} in field {}", byte, idx);
            return;
        }
        if self.fields[idx].push(char::from(byte)).is_err() {
            self.overflowed = true;
            self.state = ScanState::Done;
        }
    }
}

/// Scan `bytes` into `fields` with the given grammar
pub fn scan<const N: usize>(
    bytes: &[u8],
    fields: &mut [Field<N>; FIELD_COUNT],
    delimiter: Delimiter,
) -> ScanSummary {
    let mut scanner = FieldScanner::new(fields, delimiter);
    scanner.feed_all(bytes);
    scanner.finish()
}
