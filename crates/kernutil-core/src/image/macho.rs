//! Mach-O constants and the 64-bit header.

use super::view::ByteView;
use crate::error::{KernError, KernResult};

// Magic numbers as read little-endian from offset 0, load command tags, and
// the name of the segment whose `vmaddr` is the image base
pub use object::macho::{
    FAT_CIGAM, FAT_MAGIC, LC_DYSYMTAB, LC_SEGMENT_64, LC_SYMTAB, LC_UUID, MH_CIGAM, MH_CIGAM_64, MH_MAGIC, MH_MAGIC_64,
    SEG_TEXT,
};

/// `sizeof(struct mach_header_64)`
pub const MACH_HEADER_64_SIZE: usize = 32;
/// `sizeof(struct load_command)`: every command starts with `cmd` + `cmdsize`
pub const LOAD_COMMAND_HEADER_SIZE: usize = 8;
/// `cmdsize` must be a multiple of this in 64-bit images
pub const LOAD_COMMAND_ALIGN: u32 = 8;
/// `sizeof(struct segment_command_64)`
pub const SEGMENT_COMMAND_64_SIZE: usize = 72;
/// `sizeof(struct symtab_command)`
pub const SYMTAB_COMMAND_SIZE: usize = 24;
/// `sizeof(struct nlist_64)`
pub const NLIST_64_SIZE: usize = 16;

/// The fields of `mach_header_64` this crate needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachHeader
{
    pub cputype: u32,
    pub cpusubtype: u32,
    pub filetype: u32,
    /// Number of load commands following the header
    pub ncmds: u32,
    /// Total size of the load command region in bytes
    pub sizeofcmds: u32,
    pub flags: u32,
}

impl MachHeader
{
    /// Parse the header at the start of `view`.
    ///
    /// Only 64-bit little-endian images are accepted. 32-bit, byte-swapped
    /// and fat images are reported as malformed with a reason naming the
    /// layout that was found.
    pub fn parse(view: ByteView<'_>) -> KernResult<Self>
    {
        if view.len() < MACH_HEADER_64_SIZE {
            return Err(KernError::malformed(
                0,
                format!(
                    "image of {} byte(s) is too short for a {MACH_HEADER_64_SIZE}-byte mach_header_64",
                    view.len()
                ),
            ));
        }

        let magic = view.u32_at(0)?;
        match magic {
            MH_MAGIC_64 => {}
            MH_MAGIC | MH_CIGAM => return Err(KernError::malformed(0, "32-bit images are not supported")),
            MH_CIGAM_64 => return Err(KernError::malformed(0, "big-endian images are not supported")),
            FAT_MAGIC | FAT_CIGAM => {
                return Err(KernError::malformed(0, "fat images must be thinned to a single slice first"))
            }
            other => return Err(KernError::malformed(0, format!("bad magic 0x{other:08x}"))),
        }

        Ok(Self {
            cputype: view.u32_at(4)?,
            cpusubtype: view.u32_at(8)?,
            filetype: view.u32_at(12)?,
            ncmds: view.u32_at(16)?,
            sizeofcmds: view.u32_at(20)?,
            flags: view.u32_at(24)?,
        })
    }
}
