//! # Read and Write Drivers
//!
//! The two top-level operations of the tool, independent of how the address
//! space was acquired or where the target address came from.
//!
//! - [`run_read`]: typed records when a format is given, a hexdump otherwise
//! - [`write_stream`] / [`write_value`]: sequential single-byte writes

use std::io::{self, ErrorKind, Read, Write};

use tracing::{debug, info};

use crate::error::{KernError, KernResult};
use crate::format::{FormatSpec, Width};
use crate::hexdump;
use crate::memory::{read_exact, read_records, AddressSpace, DEFAULT_STRING_CAP};
use crate::types::Address;

/// Line printed between records when the format starts with `:`
pub const RECORD_SEPARATOR: &str = "----------------------------------";

/// Parameters of a read
#[derive(Debug, Clone)]
pub struct ReadRequest
{
    /// Remote address, slide already applied
    pub address: Address,
    /// Records to decode with a format, bytes to dump without one
    pub count: usize,
    pub format: Option<FormatSpec>,
    /// Print the `[i] reading ...` banner before reading
    pub verbose: bool,
    /// Cap for `s` fields
    pub string_cap: usize,
}

impl ReadRequest
{
    pub fn new(address: Address, count: usize) -> Self
    {
        Self {
            address,
            count,
            format: None,
            verbose: false,
            string_cap: *DEFAULT_STRING_CAP,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: FormatSpec) -> Self
    {
        self.format = Some(format);
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self
    {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_string_cap(mut self, cap: usize) -> Self
    {
        self.string_cap = cap;
        self
    }

    /// Total bytes covered by the read
    pub fn byte_len(&self) -> KernResult<usize>
    {
        let per_record = self.format.as_ref().map_or(1, FormatSpec::record_size);
        self.count.checked_mul(per_record).ok_or_else(|| KernError::ReadFault {
            address: self.address,
            requested: usize::MAX,
            reason: format!("{} record(s) of {per_record} byte(s) overflow the read size", self.count),
        })
    }
}

/// Perform a read and render it to `out`
///
/// With a format, each record is written and flushed as soon as it is decoded,
/// so a fault part-way through leaves the earlier records on `out` and then
/// returns the error. Without one, `count` bytes are read in one request and
/// hexdumped.
pub fn run_read<S, W>(space: &S, request: &ReadRequest, out: &mut W) -> KernResult<()>
where
    S: AddressSpace + ?Sized,
    W: Write,
{
    let total = request.byte_len()?;
    if request.verbose {
        writeln!(out, "[i] reading {total} byte(s) from: 0x{:x}.", request.address.value())?;
    }
    info!(address = %request.address, bytes = total, formatted = request.format.is_some(), "read");

    match &request.format {
        Some(spec) => {
            let records = read_records(space, request.address, spec, request.count).with_string_cap(request.string_cap);
            for record in records {
                let record = record?;
                if record.separated {
                    writeln!(out, "{RECORD_SEPARATOR}")?;
                }
                for field in &record.fields {
                    writeln!(out, "{field}")?;
                }
                out.flush()?;
            }
        }
        None => {
            if total == 0 {
                return Ok(());
            }
            let bytes = read_exact(space, request.address, total)?;
            for row in hexdump::rows(&bytes, request.address) {
                writeln!(out, "{row}")?;
            }
            out.flush()?;
        }
    }
    Ok(())
}

/// Stream `input` to remote memory starting at `address`, one byte per write
///
/// Bytes land in input order at consecutive addresses. Returns the number of
/// bytes written; the first fault aborts the stream. The stream never wraps
/// past `u64::MAX` to address 0.
pub fn write_stream<S, R>(space: &mut S, address: Address, input: R) -> KernResult<u64>
where
    S: AddressSpace + ?Sized,
    R: Read,
{
    // `None` once the last write landed on u64::MAX
    let mut cursor = Some(address);
    let mut written = 0u64;
    for byte in io::BufReader::new(input).bytes() {
        let byte = match byte {
            Ok(byte) => byte,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        let target = cursor.ok_or_else(|| KernError::WriteFault {
            address: Address::new(u64::MAX),
            reason: "write runs past the end of the address space".to_string(),
        })?;
        space.write(target, byte)?;
        written += 1;
        cursor = target.checked_add(1);
    }
    debug!(%address, written, "write complete");
    Ok(written)
}

/// Write `value` as a little-endian integer of `width` bytes at `address`
///
/// ## Errors
///
/// `InvalidFormat` if `value` does not fit in `width`; otherwise any fault
/// from the address space.
pub fn write_value<S>(space: &mut S, address: Address, width: Width, value: u64) -> KernResult<u64>
where
    S: AddressSpace + ?Sized,
{
    if !width.fits(value) {
        return Err(KernError::InvalidFormat {
            format: width.bytes().to_string(),
            reason: format!("value 0x{value:x} does not fit in {} byte(s)", width.bytes()),
        });
    }
    write_stream(space, address, width.encode(value).as_slice())
}
