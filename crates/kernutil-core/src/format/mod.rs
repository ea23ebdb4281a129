//! # Field-Width Formats
//!
//! A format string describes one record as a sequence of fields:
//!
//! | char | field                | wire width |
//! |------|----------------------|------------|
//! | `1`  | unsigned byte        | 1          |
//! | `2`  | unsigned word        | 2          |
//! | `4`  | unsigned dword       | 4          |
//! | `8`  | unsigned qword       | 8          |
//! | `s`  | pointer to C string  | 8          |
//!
//! A leading `:` prints a separator line between records, which helps when
//! dumping arrays of structs.
//!
//! ```rust
//! use kernutil_core::format::{FormatField, FormatSpec, Width};
//!
//! let spec = FormatSpec::compile(":ss8")?;
//! assert!(spec.delimiter());
//! assert_eq!(spec.record_size(), 24);
//! assert_eq!(spec.fields()[2], FormatField::Fixed(Width::Eight));
//! # Ok::<(), kernutil_core::KernError>(())
//! ```

use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::error::{KernError, KernResult};

/// Width of a fixed integer field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width
{
    One,
    Two,
    Four,
    Eight,
}

impl Width
{
    /// Width in bytes
    pub const fn bytes(self) -> usize
    {
        match self {
            Width::One => 1,
            Width::Two => 2,
            Width::Four => 4,
            Width::Eight => 8,
        }
    }

    /// Width for a byte count, if it is one of 1, 2, 4 or 8
    pub const fn from_bytes(bytes: usize) -> Option<Self>
    {
        match bytes {
            1 => Some(Width::One),
            2 => Some(Width::Two),
            4 => Some(Width::Four),
            8 => Some(Width::Eight),
            _ => None,
        }
    }

    /// Decode a little-endian unsigned integer from the first `self.bytes()` bytes
    ///
    /// Returns `None` if `bytes` is too short.
    pub fn decode(self, bytes: &[u8]) -> Option<u64>
    {
        let raw = bytes.get(..self.bytes())?;
        let mut buf = [0u8; 8];
        buf[..raw.len()].copy_from_slice(raw);
        Some(u64::from_le_bytes(buf))
    }

    /// Encode the low `self.bytes()` bytes of `value`, little-endian
    ///
    /// Inverse of [`Width::decode`] for values that fit the width; higher
    /// bytes are dropped.
    pub fn encode(self, value: u64) -> SmallVec<[u8; 8]>
    {
        SmallVec::from_slice(&value.to_le_bytes()[..self.bytes()])
    }

    /// Whether `value` fits in this width without truncation
    pub fn fits(self, value: u64) -> bool
    {
        match self {
            Width::Eight => true,
            _ => value >> (self.bytes() * 8) == 0,
        }
    }
}

/// One field of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatField
{
    /// Unsigned integer of the given width
    Fixed(Width),
    /// 8-byte pointer, followed to a NUL-terminated string
    StringPointer,
}

impl FormatField
{
    /// Bytes this field occupies in the record
    pub const fn wire_width(self) -> usize
    {
        match self {
            FormatField::Fixed(width) => width.bytes(),
            FormatField::StringPointer => 8,
        }
    }

    fn from_char(c: char) -> Option<Self>
    {
        match c {
            '1' => Some(FormatField::Fixed(Width::One)),
            '2' => Some(FormatField::Fixed(Width::Two)),
            '4' => Some(FormatField::Fixed(Width::Four)),
            '8' => Some(FormatField::Fixed(Width::Eight)),
            's' => Some(FormatField::StringPointer),
            _ => None,
        }
    }

    fn to_char(self) -> char
    {
        match self {
            FormatField::Fixed(Width::One) => '1',
            FormatField::Fixed(Width::Two) => '2',
            FormatField::Fixed(Width::Four) => '4',
            FormatField::Fixed(Width::Eight) => '8',
            FormatField::StringPointer => 's',
        }
    }
}

/// A compiled format string
///
/// Immutable once compiled; a single spec drives every record of a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec
{
    fields: SmallVec<[FormatField; 16]>,
    delimiter: bool,
    record_size: usize,
}

impl FormatSpec
{
    /// Compile a format string
    ///
    /// ## Errors
    ///
    /// `InvalidFormat` if the string (after an optional leading `:`) is empty
    /// or contains anything other than `1`, `2`, `4`, `8` and `s`.
    pub fn compile(format: &str) -> KernResult<Self>
    {
        let (delimiter, body) = match format.strip_prefix(':') {
            Some(rest) => (true, rest),
            None => (false, format),
        };

        if body.is_empty() {
            return Err(KernError::InvalidFormat {
                format: format.to_string(),
                reason: "format must describe at least one field".to_string(),
            });
        }

        let mut fields = SmallVec::new();
        let mut record_size = 0usize;
        for (position, c) in body.chars().enumerate() {
            let field = FormatField::from_char(c).ok_or_else(|| KernError::InvalidFormat {
                format: format.to_string(),
                reason: format!(
                    "unexpected '{c}' at position {}; only 1, 2, 4, 8 and s are allowed",
                    position + usize::from(delimiter)
                ),
            })?;
            record_size += field.wire_width();
            fields.push(field);
        }

        Ok(Self {
            fields,
            delimiter,
            record_size,
        })
    }

    /// Fields in record order
    pub fn fields(&self) -> &[FormatField]
    {
        &self.fields
    }

    /// Whether records are separated by a delimiter line
    pub fn delimiter(&self) -> bool
    {
        self.delimiter
    }

    /// Bytes per record: the sum of every field's wire width
    pub fn record_size(&self) -> usize
    {
        self.record_size
    }

    /// Whether any field needs a second, indirected read
    pub fn has_indirection(&self) -> bool
    {
        self.fields.contains(&FormatField::StringPointer)
    }
}

impl FromStr for FormatSpec
{
    type Err = KernError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        FormatSpec::compile(s)
    }
}

impl fmt::Display for FormatSpec
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if self.delimiter {
            f.write_str(":")?;
        }
        for field in &self.fields {
            write!(f, "{}", field.to_char())?;
        }
        Ok(())
    }
}
