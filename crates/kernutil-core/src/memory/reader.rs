//! Typed record reader.
//!
//! Each record costs one bulk read of `record_size` bytes, which is then
//! sliced locally field by field. `s` fields add a second, separate read per
//! field to follow the pointer. Every decoded field carries the remote address
//! it came from, not its offset in the local buffer.

use std::fmt;
use std::iter::FusedIterator;

use tracing::debug;

use super::{read_c_string, read_exact, AddressSpace, RemoteString, DEFAULT_STRING_CAP};
use crate::error::{KernError, KernResult};
use crate::format::{FormatField, FormatSpec, Width};
use crate::types::Address;

/// A decoded field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue
{
    /// A fixed-width unsigned integer
    Integer
    {
        width: Width,
        value: u64,
    },
    /// A pointer and the string it points at
    String
    {
        pointer: u64,
        text: RemoteString,
    },
}

/// One decoded field and the remote address it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field
{
    pub address: Address,
    pub value: FieldValue,
}

impl fmt::Display for Field
{
    /// `[0xADDR]: 0xVALUE`, zero-padded to the field width, with
    /// ` => text` appended for string fields.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match &self.value {
            FieldValue::Integer { width, value } => {
                write!(f, "[{}]: 0x{:0digits$x}", self.address, value, digits = width.bytes() * 2)
            }
            FieldValue::String { pointer, text } => write!(f, "[{}]: 0x{pointer:016x} => {text}", self.address),
        }
    }
}

/// One decoded record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record
{
    /// Position of the record in the sequence, starting at 0
    pub index: usize,
    /// Remote address of the first byte of the record
    pub address: Address,
    /// `true` if a separator line precedes this record when rendered
    pub separated: bool,
    pub fields: Vec<Field>,
}

/// Lazy sequence of records, created by [`read_records`]
///
/// Stops after `count` records or at the first error, whichever comes
/// first. Records already yielded stay valid after an error.
pub struct Records<'a, S: AddressSpace + ?Sized>
{
    space: &'a S,
    spec: &'a FormatSpec,
    /// `None` once the previous record ended at the top of the address space
    cursor: Option<Address>,
    index: usize,
    count: usize,
    string_cap: usize,
    failed: bool,
}

impl<'a, S: AddressSpace + ?Sized> Records<'a, S>
{
    /// Override the cap on indirected string length
    #[must_use]
    pub fn with_string_cap(mut self, cap: usize) -> Self
    {
        self.string_cap = cap;
        self
    }

    /// Remote address the next record will be read from
    ///
    /// `None` if the last record ended exactly at the top of the address
    /// space; reading another one then faults.
    pub fn cursor(&self) -> Option<Address>
    {
        self.cursor
    }

    fn read_record(&mut self) -> KernResult<Record>
    {
        let size = self.spec.record_size();
        let address = self.cursor.ok_or_else(|| KernError::ReadFault {
            address: Address::new(u64::MAX),
            requested: size,
            reason: "record runs past the end of the address space".to_string(),
        })?;
        let buffer = read_exact(self.space, address, size)?;

        let mut fields = Vec::with_capacity(self.spec.fields().len());
        let mut offset = 0usize;
        for field in self.spec.fields() {
            let width = field.wire_width();
            let bytes = &buffer[offset..offset + width];
            let field_address = address + offset as u64;
            let value = match field {
                FormatField::Fixed(width) => FieldValue::Integer {
                    width: *width,
                    value: little_endian(bytes),
                },
                FormatField::StringPointer => {
                    let pointer = little_endian(bytes);
                    let text = read_c_string(self.space, Address::new(pointer), self.string_cap)?;
                    FieldValue::String { pointer, text }
                }
            };
            fields.push(Field {
                address: field_address,
                value,
            });
            offset += width;
        }

        // a record ending at u64::MAX is still valid; only a following one faults
        self.cursor = address.checked_add(size as u64);

        Ok(Record {
            index: self.index,
            address,
            separated: self.spec.delimiter() && self.index > 0,
            fields,
        })
    }
}

/// Unsigned little-endian value of a field slice of at most 8 bytes
fn little_endian(bytes: &[u8]) -> u64
{
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

impl<S: AddressSpace + ?Sized> Iterator for Records<'_, S>
{
    type Item = KernResult<Record>;

    fn next(&mut self) -> Option<Self::Item>
    {
        if self.failed || self.index >= self.count {
            return None;
        }
        match self.read_record() {
            Ok(record) => {
                self.index += 1;
                Some(Ok(record))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>)
    {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(self.count - self.index))
        }
    }
}

impl<S: AddressSpace + ?Sized> FusedIterator for Records<'_, S> {}

/// Decode `count` consecutive records laid out as `spec`, starting at `base`
///
/// Nothing is read until the iterator is advanced, so a `count` of 0 never
/// touches the address space.
///
/// ## Example
///
/// ```rust
/// use kernutil_core::format::FormatSpec;
/// use kernutil_core::memory::{read_records, LocalSpace};
/// use kernutil_core::types::Address;
///
/// let mut space = LocalSpace::new();
/// space.map(Address::new(0x1000), vec![0x2a, 0x00, 0x01, 0x00]);
///
/// let spec = FormatSpec::compile("22")?;
/// let record = read_records(&space, Address::new(0x1000), &spec, 1).next().unwrap()?;
/// assert_eq!(record.fields[1].to_string(), "[0x0000000000001002]: 0x0001");
/// # Ok::<(), kernutil_core::KernError>(())
/// ```
pub fn read_records<'a, S: AddressSpace + ?Sized>(
    space: &'a S,
    base: Address,
    spec: &'a FormatSpec,
    count: usize,
) -> Records<'a, S>
{
    debug!(%base, format = %spec, count, record_size = spec.record_size(), "reading records");
    Records {
        space,
        spec,
        cursor: Some(base),
        index: 0,
        count,
        string_cap: *DEFAULT_STRING_CAP,
        failed: false,
    }
}
