//! Segment lookup.

use std::borrow::Cow;
use std::fmt;

use tracing::debug;

use super::load_command::{load_commands, LoadCommand};
use super::macho::{LC_SEGMENT_64, SEGMENT_COMMAND_64_SIZE, SEG_TEXT};
use super::BinaryImage;
use crate::error::{KernError, KernResult, Lookup};
use crate::types::Address;

/// The 16-byte, NUL-padded `segname` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentName([u8; 16]);

impl SegmentName
{
    /// Name bytes up to the first NUL (all 16 if the field is full)
    pub fn as_bytes(&self) -> &[u8]
    {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(self.0.len());
        &self.0[..len]
    }

    /// Exact comparison against `name`; a prefix never matches
    pub fn matches(&self, name: &str) -> bool
    {
        self.as_bytes() == name.as_bytes()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str>
    {
        String::from_utf8_lossy(self.as_bytes())
    }
}

impl fmt::Display for SegmentName
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(&self.to_string_lossy())
    }
}

/// A decoded `segment_command_64`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment
{
    pub name: SegmentName,
    pub vmaddr: Address,
    pub vmsize: u64,
    pub fileoff: u64,
    pub filesize: u64,
    pub maxprot: u32,
    pub initprot: u32,
    pub nsects: u32,
    pub flags: u32,
}

impl Segment
{
    /// Decode a segment from an `LC_SEGMENT_64` command
    pub fn parse(command: &LoadCommand<'_>) -> KernResult<Self>
    {
        command.require_size(SEGMENT_COMMAND_64_SIZE, "LC_SEGMENT_64")?;
        let view = command.view();
        Ok(Self {
            name: SegmentName(view.bytes_at::<16>(8)?),
            vmaddr: Address::new(view.u64_at(24)?),
            vmsize: view.u64_at(32)?,
            fileoff: view.u64_at(40)?,
            filesize: view.u64_at(48)?,
            maxprot: view.u32_at(56)?,
            initprot: view.u32_at(60)?,
            nsects: view.u32_at(64)?,
            flags: view.u32_at(68)?,
        })
    }
}

/// Every `LC_SEGMENT_64` in command order
pub fn segments(image: &BinaryImage) -> KernResult<impl Iterator<Item = KernResult<Segment>> + '_>
{
    Ok(load_commands(image)?.filter_map(|command| match command {
        Ok(command) if command.cmd() == LC_SEGMENT_64 => Some(Segment::parse(&command)),
        Ok(_) => None,
        Err(err) => Some(Err(err)),
    }))
}

/// First segment named exactly `name`
///
/// ## Errors
///
/// - `NotFound(Lookup::Segment)`: no segment carries that name
/// - `MalformedImage`: the command chain is broken before a match is found
pub fn find_segment(image: &BinaryImage, name: &str) -> KernResult<Segment>
{
    for segment in segments(image)? {
        let segment = segment?;
        if segment.name.matches(name) {
            debug!(segment = name, vmaddr = %segment.vmaddr, "found segment");
            return Ok(segment);
        }
    }
    Err(KernError::NotFound(Lookup::Segment(name.to_string())))
}

/// Unslid base address of the image: the `vmaddr` of `__TEXT`
pub fn find_base(image: &BinaryImage) -> KernResult<Address>
{
    find_segment(image, SEG_TEXT).map(|segment| segment.vmaddr)
}
