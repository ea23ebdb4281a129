//! # Error Types
//!
//! Error handling for image parsing, format compilation and remote memory access.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Address;

/// What a failed lookup was looking for
///
/// Carried by [`KernError::NotFound`] so callers can tell a missing symbol
/// apart from a missing segment without parsing the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup
{
    /// A load command with the given `cmd` tag
    LoadCommand(u32),
    /// A segment with the given name
    Segment(String),
    /// A symbol with the given name
    Symbol(String),
    /// The image file itself
    Image(PathBuf),
}

impl fmt::Display for Lookup
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Lookup::LoadCommand(cmd) => write!(f, "load command 0x{cmd:x}"),
            Lookup::Segment(name) => write!(f, "segment '{name}'"),
            Lookup::Symbol(name) => write!(f, "symbol '{name}'"),
            Lookup::Image(path) => write!(f, "image {}", path.display()),
        }
    }
}

/// Main error type for kernutil operations
///
/// ## Error Categories
///
/// 1. **Image errors**: MalformedImage
/// 2. **Lookup errors**: NotFound
/// 3. **Format errors**: InvalidFormat
/// 4. **Memory errors**: ReadFault, WriteFault
/// 5. **Privilege errors**: AccessDenied
/// 6. **Platform errors**: Mach (macOS-specific)
/// 7. **I/O errors**: Io
#[derive(Error, Debug)]
pub enum KernError
{
    /// The image is structurally invalid
    ///
    /// Raised for a truncated header, an unsupported magic, a load command
    /// whose declared size is zero, misaligned, or runs past the buffer, and
    /// symbol or string tables that point outside the image.
    #[error("Malformed image at offset 0x{offset:x}: {reason}")]
    MalformedImage
    {
        /// Byte offset in the image where the problem was detected
        offset: usize,
        /// What was wrong
        reason: String,
    },

    /// A segment, load command, symbol or image was not present
    ///
    /// Whether this is fatal is up to the caller. Optional probes return
    /// `Ok(None)` instead of this variant.
    #[error("Not found: {0}")]
    NotFound(Lookup),

    /// The field-width format string could not be compiled
    #[error("Invalid format '{format}': {reason}")]
    InvalidFormat
    {
        /// The format string as supplied by the user
        format: String,
        /// Why it was rejected
        reason: String,
    },

    /// The address space could not satisfy a read exactly
    ///
    /// A short read is always a fault, never a partial result.
    #[error("Read fault at {address} ({requested} byte(s)): {reason}")]
    ReadFault
    {
        /// Remote address the read started at
        address: Address,
        /// Number of bytes requested
        requested: usize,
        /// Details from the address space
        reason: String,
    },

    /// The address space rejected a write
    #[error("Write fault at {address}: {reason}")]
    WriteFault
    {
        /// Remote address of the byte that failed
        address: Address,
        /// Details from the address space
        reason: String,
    },

    /// The privileged capability could not be acquired
    ///
    /// On macOS this means the kernel task port was not exported through
    /// host special port 4, or the process is not running as root.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// macOS-specific Mach API error
    #[cfg(target_os = "macos")]
    #[error("Mach API error: {0}")]
    Mach(#[from] crate::platform::macos::error::MachError),

    /// I/O error (image loading, stdin streaming, output rendering)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KernError
{
    /// Shorthand for building a [`KernError::MalformedImage`]
    pub fn malformed(offset: usize, reason: impl Into<String>) -> Self
    {
        KernError::MalformedImage {
            offset,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error reports an absent lookup target
    pub fn is_not_found(&self) -> bool
    {
        matches!(self, KernError::NotFound(_))
    }
}

/// Convenience type alias for `Result<T, KernError>`
///
/// ```rust
/// use kernutil_core::error::KernResult;
/// fn foo() -> KernResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type KernResult<T> = std::result::Result<T, KernError>;
