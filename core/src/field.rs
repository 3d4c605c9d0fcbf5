//! Capacity-checked short strings
//!
//! A [`Field<N>`] models a fixed `N`-byte buffer that always keeps room for a
//! terminator: it holds at most `N - 1` bytes. Writes that would not fit are
//! rejected before any byte lands, and the destination is left cleared, so a
//! value is either complete or empty, never truncated.

use core::fmt;
use core::str::FromStr;

use heapless::String;

/// A write did not fit in its destination buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CapacityError;

impl CapacityError {
    /// Status code reported to the scheduler
    pub const fn code(self) -> u8 {
        1
    }
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value does not fit in destination buffer")
    }
}

impl core::error::Error for CapacityError {}

/// Bounded text buffer of `N` bytes including the terminator slot
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field<const N: usize> {
    buf: String<N>,
}

impl<const N: usize> Field<N> {
    /// Create an empty field
    pub const fn new() -> Self {
        Self { buf: String::new() }
    }

    /// Allocated size in bytes, terminator slot included
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Longest value the field accepts
    pub const fn max_len(&self) -> usize {
        N.saturating_sub(1)
    }

    pub fn as_str(&self) -> &str {
        self.buf.as_str()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Whether another byte would overflow the field
    pub fn is_full(&self) -> bool {
        self.buf.len() >= self.max_len()
    }

    /// Zero the value
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Replace the value with `value`
    ///
    /// The field is cleared first. The copy only happens when the field is
    /// strictly larger than `value`; otherwise the field stays empty and
    /// `CapacityError` is returned.
    pub fn set(&mut self, value: &str) -> Result<(), CapacityError> {
        self.buf.clear();
        if N <= value.len() {
            return Err(CapacityError);
        }
        self.buf.push_str(value).map_err(|_| CapacityError)
    }

    /// Append one character, keeping the terminator slot free
    pub fn push(&mut self, c: char) -> Result<(), CapacityError> {
        if self.buf.len() + c.len_utf8() > self.max_len() {
            return Err(CapacityError);
        }
        self.buf.push(c).map_err(|_| CapacityError)
    }

    /// Copy this value into a caller-supplied buffer
    ///
    /// Same policy as [`Field::set`]: `dest` is cleared, and the copy only
    /// succeeds if `M > self.len()`.
    pub fn copy_into<const M: usize>(&self, dest: &mut Field<M>) -> Result<(), CapacityError> {
        dest.set(self.as_str())
    }

    /// Drop leading blanks left by fixed-width number formatting
    pub fn trim_leading_spaces(&mut self) {
        let trimmed = self.buf.trim_start_matches(' ');
        if trimmed.len() == self.buf.len() {
            return;
        }
        let mut out = String::<N>::new();
        // a suffix of a value that fit always fits
        let _ = out.push_str(trimmed);
        self.buf = out;
    }

    /// Sum of all `N` bytes of the buffer, zero padding included
    ///
    /// Unused bytes are zero, so they add nothing; the sum is still defined
    /// over the whole fixed width.
    pub fn fixed_width_sum(&self) -> u32 {
        self.buf
            .as_bytes()
            .iter()
            .copied()
            .chain(core::iter::repeat(0).take(N - self.buf.len()))
            .map(u32::from)
            .sum()
    }
}

impl<const N: usize> Default for Field<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FromStr for Field<N> {
    type Err = CapacityError;

    fn from_str(value: &str) -> Result<Self, CapacityError> {
        let mut field = Self::new();
        field.set(value)?;
        Ok(field)
    }
}

impl<const N: usize> fmt::Display for Field<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_requires_strictly_larger_buffer() {
        let mut field = Field::<5>::new();
        assert!(field.set("abcd").is_ok());
        assert_eq!(field.as_str(), "abcd");

        // equal length fails and leaves the field cleared
        assert_eq!(field.set("abcde"), Err(CapacityError));
        assert!(field.is_empty());
    }

    #[test]
    fn test_copy_into_equal_length_buffer_fails() {
        let source: Field<7> = "+1.234".parse().unwrap();
        let mut dest: Field<6> = "stale".parse().unwrap();
        assert_eq!(source.copy_into(&mut dest), Err(CapacityError));
        assert_eq!(dest.as_str(), "");

        let mut roomy = Field::<7>::new();
        assert!(source.copy_into(&mut roomy).is_ok());
        assert_eq!(roomy.as_str(), "+1.234");
    }

    #[test]
    fn test_parse_applies_capacity() {
        let field: Field<5> = "abcd".parse().unwrap();
        assert_eq!(field.as_str(), "abcd");
        assert_eq!("abcde".parse::<Field<5>>(), Err(CapacityError));
    }

    #[test]
    fn test_push_keeps_terminator_slot() {
        let mut field = Field::<3>::new();
        assert!(field.push('a').is_ok());
        assert!(field.push('b').is_ok());
        assert!(field.is_full());
        assert_eq!(field.push('c'), Err(CapacityError));
        assert_eq!(field.as_str(), "ab");
    }

    #[test]
    fn test_trim_leading_spaces() {
        let mut field = Field::<16>::from_str("    -3.250").unwrap();
        field.trim_leading_spaces();
        assert_eq!(field.as_str(), "-3.250");

        let mut blank = Field::<16>::from_str("   ").unwrap();
        blank.trim_leading_spaces();
        assert!(blank.is_empty());
    }

    #[test]
    fn test_fixed_width_sum_ignores_padding() {
        let field = Field::<7>::from_str("+012").unwrap();
        assert_eq!(field.fixed_width_sum(), 43 + 48 + 49 + 50);
        assert_eq!(Field::<7>::new().fixed_width_sum(), 0);
    }
}
