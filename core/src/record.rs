//! Measurement record
//!
//! An ordered set of named fields. Keys are fixed at boot; values are
//! cleared at the start of every cycle and filled in by the sensor reads.

use core::fmt;

use heapless::Vec;

use crate::config::{KV_STRING_SIZE, MAX_RECORD_FIELDS};
use crate::field::{CapacityError, Field};

/// Characters that would break the stored line or the form body
pub const RESERVED: [char; 6] = [',', '=', ';', '&', '\r', '\n'];

/// Record operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// No field with that key
    UnknownKey,
    /// Key already present
    DuplicateKey,
    /// No room for another field
    Full,
    /// Key or value does not fit its buffer
    Capacity,
    /// Key or value contains a separator character
    ReservedCharacter,
    /// Keys must not be empty
    EmptyKey,
}

impl RecordError {
    /// Status code reported to the scheduler
    pub const fn code(self) -> u8 {
        match self {
            Self::UnknownKey => 1,
            Self::DuplicateKey => 2,
            Self::Full => 3,
            Self::Capacity => 4,
            Self::ReservedCharacter => 5,
            Self::EmptyKey => 6,
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKey => write!(f, "unknown key"),
            Self::DuplicateKey => write!(f, "duplicate key"),
            Self::Full => write!(f, "record full"),
            Self::Capacity => write!(f, "value exceeds field capacity"),
            Self::ReservedCharacter => write!(f, "reserved character in key or value"),
            Self::EmptyKey => write!(f, "empty key"),
        }
    }
}

impl core::error::Error for RecordError {}

impl From<CapacityError> for RecordError {
    fn from(_: CapacityError) -> Self {
        RecordError::Capacity
    }
}

/// Record field buffer
pub type KvField = Field<KV_STRING_SIZE>;

/// One named value
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyValue {
    pub key: KvField,
    pub value: KvField,
}

/// Ordered key-value measurement record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Record {
    pairs: Vec<KeyValue, MAX_RECORD_FIELDS>,
}

fn check_reserved(text: &str) -> Result<(), RecordError> {
    if text.contains(&RESERVED[..]) {
        return Err(RecordError::ReservedCharacter);
    }
    Ok(())
}

impl Record {
    /// Create a record with no fields
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Create a record with the given keys and empty values
    pub fn with_keys(keys: &[&str]) -> Result<Self, RecordError> {
        let mut record = Self::new();
        for key in keys {
            record.add_key(key)?;
        }
        Ok(record)
    }

    /// Append a field with an empty value
    pub fn add_key(&mut self, key: &str) -> Result<(), RecordError> {
        self.push(key, "")
    }

    /// Append a field with a value
    pub fn push(&mut self, key: &str, value: &str) -> Result<(), RecordError> {
        if key.is_empty() {
            return Err(RecordError::EmptyKey);
        }
        check_reserved(key)?;
        check_reserved(value)?;
        if self.position(key).is_some() {
            return Err(RecordError::DuplicateKey);
        }
        let pair = KeyValue {
            key: key.parse::<KvField>()?,
            value: value.parse::<KvField>()?,
        };
        self.pairs.push(pair).map_err(|_| RecordError::Full)
    }

    /// Replace the value stored under `key`
    ///
    /// On a capacity or character error the value is left cleared.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), RecordError> {
        let field = self.value_mut(key).ok_or(RecordError::UnknownKey)?;
        if value.contains(&RESERVED[..]) {
            field.clear();
            return Err(RecordError::ReservedCharacter);
        }
        field.set(value).map_err(RecordError::from)
    }

    /// Value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|idx| self.pairs[idx].value.as_str())
    }

    fn value_mut(&mut self, key: &str) -> Option<&mut KvField> {
        let idx = self.position(key)?;
        Some(&mut self.pairs[idx].value)
    }

    /// Zero every value, keeping the keys
    pub fn clear(&mut self) {
        for pair in self.pairs.iter_mut() {
            pair.value.clear();
        }
    }

    /// Strip leading blanks from every value
    pub fn strip_padding(&mut self) {
        for pair in self.pairs.iter_mut() {
            pair.value.trim_leading_spaces();
        }
    }

    /// Pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|pair| (pair.key.as_str(), pair.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.pairs.iter().position(|pair| pair.key.as_str() == key)
    }
}
