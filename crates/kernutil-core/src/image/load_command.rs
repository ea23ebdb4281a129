//! Load command walking.
//!
//! The walker starts right after the header, reads `cmd` and `cmdsize`,
//! yields the command and advances by `cmdsize`. It stops after `ncmds`
//! commands, as recorded in the header, rather than at the end of the buffer.
//!
//! Every advance is checked before it happens: a `cmdsize` of zero, one that is
//! not 8-byte aligned, or one that would run past `sizeofcmds` or the end of
//! the image ends the walk with `MalformedImage`.

use std::iter::FusedIterator;

use tracing::trace;

use super::macho::{LOAD_COMMAND_ALIGN, LOAD_COMMAND_HEADER_SIZE, MACH_HEADER_64_SIZE};
use super::view::ByteView;
use super::BinaryImage;
use crate::error::{KernError, KernResult, Lookup};

/// One load command, as a view over its own `cmdsize` bytes
#[derive(Debug, Clone, Copy)]
pub struct LoadCommand<'a>
{
    cmd: u32,
    view: ByteView<'a>,
}

impl<'a> LoadCommand<'a>
{
    /// The `cmd` type tag (e.g. `LC_SEGMENT_64`)
    pub fn cmd(&self) -> u32
    {
        self.cmd
    }

    /// The declared `cmdsize`, which is also the length of [`Self::view`]
    pub fn size(&self) -> usize
    {
        self.view.len()
    }

    /// Absolute image offset of the command header
    pub fn offset(&self) -> usize
    {
        self.view.base()
    }

    /// Absolute image offset of the payload following `cmd` + `cmdsize`
    pub fn payload_offset(&self) -> usize
    {
        self.view.base() + LOAD_COMMAND_HEADER_SIZE
    }

    /// The whole command, header included; field offsets match `<mach-o/loader.h>`
    pub fn view(&self) -> ByteView<'a>
    {
        self.view
    }

    /// Reject commands too short to hold their fixed-size struct
    pub(crate) fn require_size(&self, minimum: usize, what: &str) -> KernResult<()>
    {
        if self.size() < minimum {
            return Err(KernError::malformed(
                self.offset(),
                format!("{what} command of {} byte(s) is shorter than {minimum}", self.size()),
            ));
        }
        Ok(())
    }
}

/// Iterator over the load commands of an image
///
/// Created by [`load_commands`]. Yields `Err` at most once; the sequence ends
/// after the first error.
#[derive(Debug, Clone)]
pub struct LoadCommands<'a>
{
    image: ByteView<'a>,
    remaining: u32,
    cursor: usize,
    end: usize,
    failed: bool,
}

impl LoadCommands<'_>
{
    /// Image offset of the next command, or one past the last command once
    /// the walk is complete
    pub fn position(&self) -> usize
    {
        self.cursor
    }

    /// Number of commands not yet yielded
    pub fn remaining(&self) -> u32
    {
        self.remaining
    }

    fn fail<T>(&mut self, offset: usize, reason: String) -> Option<KernResult<T>>
    {
        self.failed = true;
        Some(Err(KernError::malformed(offset, reason)))
    }
}

impl<'a> Iterator for LoadCommands<'a>
{
    type Item = KernResult<LoadCommand<'a>>;

    fn next(&mut self) -> Option<Self::Item>
    {
        if self.failed || self.remaining == 0 {
            return None;
        }

        let cursor = self.cursor;
        let header = match self.image.sub(cursor, LOAD_COMMAND_HEADER_SIZE) {
            Ok(header) => header,
            Err(err) => {
                self.failed = true;
                return Some(Err(err));
            }
        };
        let (cmd, cmdsize) = match (header.u32_at(0), header.u32_at(4)) {
            (Ok(cmd), Ok(cmdsize)) => (cmd, cmdsize),
            (Err(err), _) | (_, Err(err)) => {
                self.failed = true;
                return Some(Err(err));
            }
        };

        if cmdsize == 0 {
            return self.fail(cursor, format!("load command 0x{cmd:x} declares cmdsize 0"));
        }
        if cmdsize % LOAD_COMMAND_ALIGN != 0 {
            return self.fail(
                cursor,
                format!("load command 0x{cmd:x} cmdsize {cmdsize} is not a multiple of {LOAD_COMMAND_ALIGN}"),
            );
        }
        let size = cmdsize as usize;
        if size < LOAD_COMMAND_HEADER_SIZE {
            return self.fail(cursor, format!("load command 0x{cmd:x} cmdsize {cmdsize} is below the header size"));
        }
        let next = match cursor.checked_add(size) {
            Some(next) if next <= self.end && next <= self.image.len() => next,
            _ => {
                return self.fail(
                    cursor,
                    format!("load command 0x{cmd:x} cmdsize {cmdsize} runs past the load command region"),
                )
            }
        };

        let view = match self.image.sub(cursor, size) {
            Ok(view) => view,
            Err(err) => {
                self.failed = true;
                return Some(Err(err));
            }
        };

        trace!(cmd = format_args!("0x{cmd:x}"), cmdsize, offset = cursor, "load command");
        self.cursor = next;
        self.remaining -= 1;
        Some(Ok(LoadCommand { cmd, view }))
    }

    fn size_hint(&self) -> (usize, Option<usize>)
    {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(self.remaining as usize))
        }
    }
}

impl FusedIterator for LoadCommands<'_> {}

/// Walk the load commands of `image`
///
/// The iterator is re-derived from the header each time this is called.
///
/// ## Errors
///
/// The header itself is validated up front; per-command problems surface as
/// an `Err` item from the iterator.
///
/// ## Example
///
/// ```rust,no_run
/// use kernutil_core::image::{load_commands, BinaryImage};
///
/// let image = BinaryImage::open("/System/Library/Kernels/kernel")?;
/// for command in load_commands(&image)? {
///     let command = command?;
///     println!("cmd 0x{:x} ({} bytes)", command.cmd(), command.size());
/// }
/// # Ok::<(), kernutil_core::KernError>(())
/// ```
pub fn load_commands(image: &BinaryImage) -> KernResult<LoadCommands<'_>>
{
    let header = image.header()?;
    let end = MACH_HEADER_64_SIZE
        .checked_add(header.sizeofcmds as usize)
        .ok_or_else(|| KernError::malformed(20, "sizeofcmds overflows"))?;
    if end > image.len() {
        return Err(KernError::malformed(
            20,
            format!("sizeofcmds {} exceeds image length {}", header.sizeofcmds, image.len()),
        ));
    }

    Ok(LoadCommands {
        image: image.view(),
        remaining: header.ncmds,
        cursor: MACH_HEADER_64_SIZE,
        end,
        failed: false,
    })
}

/// Find the first load command with the given tag, if any
///
/// Absence is `Ok(None)`, so this is suitable for optional probes.
pub fn find_load_command(image: &BinaryImage, cmd: u32) -> KernResult<Option<LoadCommand<'_>>>
{
    for command in load_commands(image)? {
        let command = command?;
        if command.cmd() == cmd {
            return Ok(Some(command));
        }
    }
    Ok(None)
}

/// Find the first load command with the given tag, failing with `NotFound`
pub fn require_load_command(image: &BinaryImage, cmd: u32) -> KernResult<LoadCommand<'_>>
{
    find_load_command(image, cmd)?.ok_or(KernError::NotFound(Lookup::LoadCommand(cmd)))
}
