//! Symbol table resolution through `LC_SYMTAB`.
//!
//! Resolution is a linear scan in table order. The first entry whose name
//! matches wins, so duplicate names resolve to the earliest entry.

use std::borrow::Cow;

use tracing::{debug, trace};

use super::load_command::require_load_command;
use super::macho::{LC_SYMTAB, NLIST_64_SIZE, SYMTAB_COMMAND_SIZE};
use super::view::ByteView;
use super::BinaryImage;
use crate::error::{KernError, KernResult, Lookup};
use crate::types::Address;

/// The symbol and string tables located by `LC_SYMTAB`
///
/// Both tables are range-checked against the image when this is built, so the
/// per-entry reads below can only fail on a bad `n_strx`.
#[derive(Debug, Clone, Copy)]
pub struct SymbolTable<'a>
{
    entries: ByteView<'a>,
    strings: ByteView<'a>,
    count: u32,
}

/// One `nlist_64` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolEntry<'a>
{
    /// Index of the entry in the symbol table
    pub index: u32,
    /// `n_strx`: offset of the name in the string table
    pub name_offset: u32,
    pub n_type: u8,
    pub n_sect: u8,
    pub n_desc: u16,
    /// `n_value`: the unslid address for defined symbols
    pub value: Address,
    name: &'a [u8],
}

impl<'a> SymbolEntry<'a>
{
    /// The raw name bytes, without the terminating NUL
    pub fn name_bytes(&self) -> &'a [u8]
    {
        self.name
    }

    pub fn name(&self) -> Cow<'a, str>
    {
        String::from_utf8_lossy(self.name)
    }
}

impl<'a> SymbolTable<'a>
{
    /// Locate the tables through the image's `LC_SYMTAB` command
    ///
    /// ## Errors
    ///
    /// - `NotFound(Lookup::LoadCommand(LC_SYMTAB))`: the image has no symbol table
    /// - `MalformedImage`: either table lies outside the image
    pub fn parse(image: &'a BinaryImage) -> KernResult<Self>
    {
        let command = require_load_command(image, LC_SYMTAB)?;
        command.require_size(SYMTAB_COMMAND_SIZE, "LC_SYMTAB")?;
        let view = command.view();
        let symoff = view.u32_at(8)? as usize;
        let nsyms = view.u32_at(12)?;
        let stroff = view.u32_at(16)? as usize;
        let strsize = view.u32_at(20)? as usize;

        let table_len = (nsyms as usize)
            .checked_mul(NLIST_64_SIZE)
            .ok_or_else(|| KernError::malformed(command.offset() + 12, "nsyms overflows"))?;
        let image_view = image.view();
        let entries = image_view.sub(symoff, table_len).map_err(|_| {
            KernError::malformed(
                command.offset() + 8,
                format!("symbol table of {nsyms} entries at 0x{symoff:x} lies outside the image"),
            )
        })?;
        let strings = image_view.sub(stroff, strsize).map_err(|_| {
            KernError::malformed(
                command.offset() + 16,
                format!("string table of {strsize} byte(s) at 0x{stroff:x} lies outside the image"),
            )
        })?;

        debug!(symoff, nsyms, stroff, strsize, "located symbol table");
        Ok(Self {
            entries,
            strings,
            count: nsyms,
        })
    }

    /// Number of entries (`nsyms`)
    pub fn len(&self) -> u32
    {
        self.count
    }

    pub fn is_empty(&self) -> bool
    {
        self.count == 0
    }

    /// Decode the entry at `index`, resolving its name
    pub fn entry(&self, index: u32) -> KernResult<SymbolEntry<'a>>
    {
        let raw = self.entries.sub(index as usize * NLIST_64_SIZE, NLIST_64_SIZE)?;
        let name_offset = raw.u32_at(0)?;
        let name = self.strings.c_str_at(name_offset as usize).map_err(|_| {
            KernError::malformed(
                raw.base(),
                format!("symbol {index} name offset 0x{name_offset:x} is outside the string table"),
            )
        })?;
        Ok(SymbolEntry {
            index,
            name_offset,
            n_type: raw.u8_at(4)?,
            n_sect: raw.u8_at(5)?,
            n_desc: raw.u16_at(6)?,
            value: Address::new(raw.u64_at(8)?),
            name,
        })
    }

    /// All entries in table order
    pub fn iter(&self) -> impl Iterator<Item = KernResult<SymbolEntry<'a>>> + '_
    {
        (0..self.count).map(move |index| self.entry(index))
    }

    /// First entry named exactly `name`, if any
    pub fn lookup(&self, name: &str) -> KernResult<Option<SymbolEntry<'a>>>
    {
        let wanted = name.as_bytes();
        for entry in self.iter() {
            let entry = entry?;
            trace!(index = entry.index, "symbol candidate");
            if entry.name_bytes() == wanted {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }
}

/// Every symbol of `image` in table order
pub fn symbols(image: &BinaryImage) -> KernResult<Vec<SymbolEntry<'_>>>
{
    let table = SymbolTable::parse(image)?;
    table.iter().collect()
}

/// Resolve `name` to its unslid address
///
/// ## Errors
///
/// - `NotFound(Lookup::Symbol)`: the table was scanned and no entry matched
/// - `NotFound(Lookup::LoadCommand)`: the image has no `LC_SYMTAB`
/// - `MalformedImage`: the tables or an entry's name are out of range
///
/// ## Example
///
/// ```rust,no_run
/// use kernutil_core::image::{resolve, BinaryImage};
///
/// let image = BinaryImage::open("/System/Library/Kernels/kernel")?;
/// let allproc = resolve(&image, "_allproc")?;
/// println!("_allproc is at {allproc}");
/// # Ok::<(), kernutil_core::KernError>(())
/// ```
pub fn resolve(image: &BinaryImage, name: &str) -> KernResult<Address>
{
    let table = SymbolTable::parse(image)?;
    match table.lookup(name)? {
        Some(entry) => {
            debug!(symbol = name, index = entry.index, value = %entry.value, "resolved symbol");
            Ok(entry.value)
        }
        None => Err(KernError::NotFound(Lookup::Symbol(name.to_string()))),
    }
}
