//! Shared fixtures: a synthetic Mach-O builder and an address space that
//! records every call made to it.

#![allow(dead_code)]

use std::cell::RefCell;

use kernutil_core::image::macho::{LC_SEGMENT_64, LC_SYMTAB, MH_MAGIC_64};
use kernutil_core::memory::{AddressSpace, LocalSpace};
use kernutil_core::{Address, BinaryImage, KernResult};

const CPU_TYPE_X86_64: u32 = 0x0100_0007;
const MH_EXECUTE: u32 = 0x2;

enum Command
{
    Raw(Vec<u8>),
    Symtab(Vec<(String, u64)>),
}

impl Command
{
    fn len(&self) -> usize
    {
        match self {
            Command::Raw(bytes) => bytes.len(),
            Command::Symtab(_) => 24,
        }
    }
}

/// Builds a little-endian 64-bit Mach-O image in memory
///
/// `ncmds` and `sizeofcmds` are derived from the commands added unless
/// overridden. Symbol and string tables are placed right after the load
/// command region.
#[derive(Default)]
pub struct MachOBuilder
{
    commands: Vec<Command>,
    ncmds: Option<u32>,
    sizeofcmds: Option<u32>,
    trailer: Vec<u8>,
}

impl MachOBuilder
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Add an `LC_SEGMENT_64` with the given name and `vmaddr`
    pub fn segment(mut self, name: &str, vmaddr: u64) -> Self
    {
        let mut bytes = Vec::with_capacity(72);
        bytes.extend_from_slice(&LC_SEGMENT_64.to_le_bytes());
        bytes.extend_from_slice(&72u32.to_le_bytes());
        let mut segname = [0u8; 16];
        segname[..name.len()].copy_from_slice(name.as_bytes());
        bytes.extend_from_slice(&segname);
        bytes.extend_from_slice(&vmaddr.to_le_bytes());
        bytes.extend_from_slice(&0x1000u64.to_le_bytes()); // vmsize
        bytes.extend_from_slice(&0u64.to_le_bytes()); // fileoff
        bytes.extend_from_slice(&0x1000u64.to_le_bytes()); // filesize
        bytes.extend_from_slice(&7u32.to_le_bytes()); // maxprot
        bytes.extend_from_slice(&5u32.to_le_bytes()); // initprot
        bytes.extend_from_slice(&0u32.to_le_bytes()); // nsects
        bytes.extend_from_slice(&0u32.to_le_bytes()); // flags
        self.commands.push(Command::Raw(bytes));
        self
    }

    /// Add an `LC_SYMTAB` describing `symbols`, in order
    pub fn symtab(mut self, symbols: &[(&str, u64)]) -> Self
    {
        let symbols = symbols.iter().map(|(name, value)| ((*name).to_string(), *value)).collect();
        self.commands.push(Command::Symtab(symbols));
        self
    }

    /// Add an `LC_SYMTAB` with explicit table locations
    pub fn symtab_at(self, symoff: u32, nsyms: u32, stroff: u32, strsize: u32) -> Self
    {
        let mut payload = Vec::with_capacity(16);
        for field in [symoff, nsyms, stroff, strsize] {
            payload.extend_from_slice(&field.to_le_bytes());
        }
        self.command(LC_SYMTAB, 24, &payload)
    }

    /// Add a command with an arbitrary declared `cmdsize`
    ///
    /// Only the header and `payload` are emitted, so the declared size can
    /// disagree with the bytes actually present.
    pub fn command(mut self, cmd: u32, cmdsize: u32, payload: &[u8]) -> Self
    {
        let mut bytes = Vec::with_capacity(8 + payload.len());
        bytes.extend_from_slice(&cmd.to_le_bytes());
        bytes.extend_from_slice(&cmdsize.to_le_bytes());
        bytes.extend_from_slice(payload);
        self.commands.push(Command::Raw(bytes));
        self
    }

    pub fn ncmds(mut self, ncmds: u32) -> Self
    {
        self.ncmds = Some(ncmds);
        self
    }

    pub fn sizeofcmds(mut self, sizeofcmds: u32) -> Self
    {
        self.sizeofcmds = Some(sizeofcmds);
        self
    }

    /// Bytes appended after everything else
    pub fn trailer(mut self, bytes: &[u8]) -> Self
    {
        self.trailer.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8>
    {
        let region: usize = self.commands.iter().map(Command::len).sum();
        let ncmds = self.ncmds.unwrap_or(self.commands.len() as u32);
        let sizeofcmds = self.sizeofcmds.unwrap_or(region as u32);

        let mut out = Vec::new();
        out.extend_from_slice(&MH_MAGIC_64.to_le_bytes());
        out.extend_from_slice(&CPU_TYPE_X86_64.to_le_bytes());
        out.extend_from_slice(&3u32.to_le_bytes());
        out.extend_from_slice(&MH_EXECUTE.to_le_bytes());
        out.extend_from_slice(&ncmds.to_le_bytes());
        out.extend_from_slice(&sizeofcmds.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // flags
        out.extend_from_slice(&0u32.to_le_bytes()); // reserved

        let mut tables = Vec::new();
        let data_start = 32 + region;
        for command in &self.commands {
            match command {
                Command::Raw(bytes) => out.extend_from_slice(bytes),
                Command::Symtab(symbols) => {
                    let symoff = data_start + tables.len();
                    let mut strings = vec![0u8];
                    let mut entries = Vec::with_capacity(symbols.len() * 16);
                    for (name, value) in symbols {
                        entries.extend_from_slice(&(strings.len() as u32).to_le_bytes());
                        entries.push(0x0f); // N_SECT | N_EXT
                        entries.push(1);
                        entries.extend_from_slice(&0u16.to_le_bytes());
                        entries.extend_from_slice(&value.to_le_bytes());
                        strings.extend_from_slice(name.as_bytes());
                        strings.push(0);
                    }
                    let stroff = symoff + entries.len();

                    out.extend_from_slice(&LC_SYMTAB.to_le_bytes());
                    out.extend_from_slice(&24u32.to_le_bytes());
                    out.extend_from_slice(&(symoff as u32).to_le_bytes());
                    out.extend_from_slice(&(symbols.len() as u32).to_le_bytes());
                    out.extend_from_slice(&(stroff as u32).to_le_bytes());
                    out.extend_from_slice(&(strings.len() as u32).to_le_bytes());

                    tables.extend_from_slice(&entries);
                    tables.extend_from_slice(&strings);
                }
            }
        }
        out.extend_from_slice(&tables);
        out.extend_from_slice(&self.trailer);
        out
    }

    pub fn image(self) -> BinaryImage
    {
        BinaryImage::from_bytes(self.build())
    }
}

/// An address space that logs every read and write before delegating
#[derive(Default)]
pub struct CountingSpace
{
    pub inner: LocalSpace,
    reads: RefCell<Vec<(Address, usize)>>,
    pub writes: Vec<(Address, u8)>,
}

impl CountingSpace
{
    pub fn new(inner: LocalSpace) -> Self
    {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn mapped(base: u64, bytes: impl Into<Vec<u8>>) -> Self
    {
        let mut inner = LocalSpace::new();
        inner.map(Address::new(base), bytes);
        Self::new(inner)
    }

    /// Every read so far, as `(address, len)`
    pub fn reads(&self) -> Vec<(Address, usize)>
    {
        self.reads.borrow().clone()
    }

    pub fn read_count(&self) -> usize
    {
        self.reads.borrow().len()
    }
}

impl AddressSpace for CountingSpace
{
    fn read(&self, address: Address, len: usize) -> KernResult<Vec<u8>>
    {
        self.reads.borrow_mut().push((address, len));
        self.inner.read(address, len)
    }

    fn write(&mut self, address: Address, byte: u8) -> KernResult<()>
    {
        self.writes.push((address, byte));
        self.inner.write(address, byte)
    }
}
