//! # Remote Memory
//!
//! The [`AddressSpace`] trait is the only thing this crate needs from a
//! privileged memory source: exact-length reads and single-byte writes.
//! On macOS it is implemented by
//! [`KernelTask`](crate::platform::macos::KernelTask); [`LocalSpace`] is
//! an in-memory implementation for tests and captured memory.
//!
//! On top of it sit the typed record reader ([`reader`]) and C string
//! indirection ([`read_c_string`]).

use std::fmt;

use once_cell::sync::Lazy;
use tracing::{trace, warn};

use crate::error::{KernError, KernResult};
use crate::types::Address;

pub mod local;
pub mod reader;

pub use local::LocalSpace;
pub use reader::{read_records, Field, FieldValue, Record, Records};

/// Default cap on an indirected string: one page
///
/// A corrupt pointer can land in a region with no NUL for a long way; the
/// scan stops after this many bytes.
pub static DEFAULT_STRING_CAP: Lazy<usize> = Lazy::new(system_page_size);

#[cfg(unix)]
fn system_page_size() -> usize
{
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 { 4096 } else { size as usize }
}

#[cfg(not(unix))]
fn system_page_size() -> usize
{
    4096
}

/// A readable and writable address space
///
/// ## Contract
///
/// - `read` returns exactly `len` bytes or fails with `ReadFault`. A short
///   read is never returned as success.
/// - `write` stores one byte. There is no read-back verification.
pub trait AddressSpace
{
    /// Read `len` bytes starting at `address`
    fn read(&self, address: Address, len: usize) -> KernResult<Vec<u8>>;

    /// Write a single byte at `address`
    fn write(&mut self, address: Address, byte: u8) -> KernResult<()>;
}

impl<T: AddressSpace + ?Sized> AddressSpace for &mut T
{
    fn read(&self, address: Address, len: usize) -> KernResult<Vec<u8>>
    {
        (**self).read(address, len)
    }

    fn write(&mut self, address: Address, byte: u8) -> KernResult<()>
    {
        (**self).write(address, byte)
    }
}

impl<T: AddressSpace + ?Sized> AddressSpace for Box<T>
{
    fn read(&self, address: Address, len: usize) -> KernResult<Vec<u8>>
    {
        (**self).read(address, len)
    }

    fn write(&mut self, address: Address, byte: u8) -> KernResult<()>
    {
        (**self).write(address, byte)
    }
}

/// `space.read`, with the exact-length contract enforced on the result
pub(crate) fn read_exact<S: AddressSpace + ?Sized>(space: &S, address: Address, len: usize) -> KernResult<Vec<u8>>
{
    trace!(%address, len, "remote read");
    let bytes = space.read(address, len)?;
    if bytes.len() != len {
        return Err(KernError::ReadFault {
            address,
            requested: len,
            reason: format!("short read of {} byte(s)", bytes.len()),
        });
    }
    Ok(bytes)
}

/// A NUL-terminated string read from remote memory
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteString
{
    /// Bytes before the terminator (or before the cap)
    pub bytes: Vec<u8>,
    /// `true` if the cap was reached before a NUL was seen
    pub truncated: bool,
}

impl fmt::Display for RemoteString
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(&String::from_utf8_lossy(&self.bytes))?;
        if self.truncated {
            f.write_str("...")?;
        }
        Ok(())
    }
}

/// Read a C string one byte at a time starting at `address`
///
/// Stops at the first zero byte, or after `cap` bytes with
/// [`RemoteString::truncated`] set.
///
/// ## Errors
///
/// `ReadFault` if any single-byte read fails or the address wraps.
pub fn read_c_string<S: AddressSpace + ?Sized>(space: &S, address: Address, cap: usize) -> KernResult<RemoteString>
{
    let mut bytes = Vec::new();
    let mut cursor = address;

    while bytes.len() < cap {
        let byte = read_exact(space, cursor, 1)?[0];
        if byte == 0 {
            return Ok(RemoteString { bytes, truncated: false });
        }
        bytes.push(byte);
        cursor = cursor.checked_add(1).ok_or_else(|| KernError::ReadFault {
            address: cursor,
            requested: 1,
            reason: "string runs past the end of the address space".to_string(),
        })?;
    }

    warn!(%address, cap, "string not terminated within cap; truncating");
    Ok(RemoteString { bytes, truncated: true })
}
