//! # Binary Images
//!
//! Read-only introspection of 64-bit Mach-O images held in memory.
//!
//! The image is an owned byte buffer; everything derived from it (load
//! commands, segments, symbol entries) borrows from it and is re-derived on
//! every lookup. Nothing is cached between calls.
//!
//! ## Layout
//!
//! ```text
//! +------------------+  0
//! | mach_header_64   |  32 bytes, ncmds / sizeofcmds
//! +------------------+  32
//! | load commands    |  ncmds entries, each cmd + cmdsize + payload
//! +------------------+  32 + sizeofcmds
//! | segment data,    |
//! | symbol table,    |  located through LC_SEGMENT_64 / LC_SYMTAB
//! | string table ... |
//! +------------------+
//! ```
//!
//! ## References
//!
//! - [`<mach-o/loader.h>`](https://github.com/apple-oss-distributions/xnu/blob/main/EXTERNAL_HEADERS/mach-o/loader.h)
//! - [`<mach-o/nlist.h>`](https://github.com/apple-oss-distributions/cctools/blob/main/include/mach-o/nlist.h)

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::{KernError, KernResult, Lookup};

pub mod load_command;
pub mod macho;
pub mod segment;
pub mod symbols;
pub mod view;

pub use load_command::{find_load_command, load_commands, require_load_command, LoadCommand, LoadCommands};
pub use macho::MachHeader;
pub use segment::{find_base, find_segment, segments, Segment, SegmentName};
pub use symbols::{resolve, symbols, SymbolEntry, SymbolTable};
pub use view::ByteView;

/// An immutable Mach-O image
///
/// ```rust
/// use kernutil_core::image::BinaryImage;
///
/// let image = BinaryImage::from_bytes(vec![0u8; 4]);
/// assert_eq!(image.len(), 4);
/// assert!(image.header().is_err()); // too short for a mach_header_64
/// ```
#[derive(Debug, Clone)]
pub struct BinaryImage
{
    bytes: Vec<u8>,
}

impl BinaryImage
{
    /// Wrap an in-memory buffer
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self
    {
        Self { bytes: bytes.into() }
    }

    /// Load an image from disk
    ///
    /// ## Errors
    ///
    /// - `NotFound(Lookup::Image)`: the path does not exist
    /// - `Io`: any other failure reading the file
    pub fn open(path: impl AsRef<Path>) -> KernResult<Self>
    {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => KernError::NotFound(Lookup::Image(path.to_path_buf())),
            _ => KernError::Io(err),
        })?;
        debug!(path = %path.display(), len = bytes.len(), "loaded image");
        Ok(Self::from_bytes(bytes))
    }

    /// Total length of the image in bytes
    pub fn len(&self) -> usize
    {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.bytes.is_empty()
    }

    /// A bounds-checked view over the whole image
    pub fn view(&self) -> ByteView<'_>
    {
        ByteView::new(&self.bytes, 0)
    }

    /// Parse and validate the 64-bit header
    pub fn header(&self) -> KernResult<MachHeader>
    {
        MachHeader::parse(self.view())
    }
}
