//! Tests for symbol resolution

mod common;

use common::MachOBuilder;
use kernutil_core::image::macho::LC_SYMTAB;
use kernutil_core::image::{resolve, symbols, SymbolTable};
use kernutil_core::{Address, KernError, Lookup};

#[test]
fn test_resolve_returns_value()
{
    let image = MachOBuilder::new()
        .segment("__TEXT", 0xffff_ff80_0000_0000)
        .symtab(&[("_bar", 0x2000), ("foo", 0x1000)])
        .image();

    assert_eq!(resolve(&image, "foo").unwrap(), Address::new(0x1000));
    assert_eq!(resolve(&image, "_bar").unwrap(), Address::new(0x2000));
}

#[test]
fn test_first_duplicate_wins()
{
    let image = MachOBuilder::new()
        .symtab(&[("_allproc", 0xffff_ff80_0100_0000), ("_allproc", 0xdead)])
        .image();

    assert_eq!(resolve(&image, "_allproc").unwrap(), Address::new(0xffff_ff80_0100_0000));
}

#[test]
fn test_missing_symbol_is_not_found()
{
    let image = MachOBuilder::new().symtab(&[("_foo", 0x1000)]).image();

    match resolve(&image, "_fo") {
        Err(KernError::NotFound(Lookup::Symbol(name))) => assert_eq!(name, "_fo"),
        other => panic!("Expected NotFound(Symbol), got {other:?}"),
    }
}

#[test]
fn test_missing_symtab_is_distinct()
{
    let image = MachOBuilder::new().segment("__TEXT", 0x1000).image();

    match resolve(&image, "_foo") {
        Err(KernError::NotFound(Lookup::LoadCommand(cmd))) => assert_eq!(cmd, LC_SYMTAB),
        other => panic!("Expected NotFound(LoadCommand), got {other:?}"),
    }
}

#[test]
fn test_symbol_table_outside_image_is_malformed()
{
    let image = MachOBuilder::new().symtab_at(0x10_0000, 4, 56, 0).image();
    assert!(matches!(resolve(&image, "_foo"), Err(KernError::MalformedImage { .. })));
}

#[test]
fn test_string_table_outside_image_is_malformed()
{
    let image = MachOBuilder::new().symtab_at(56, 0, 0x10_0000, 16).image();
    assert!(matches!(resolve(&image, "_foo"), Err(KernError::MalformedImage { .. })));
}

#[test]
fn test_name_offset_outside_string_table_is_malformed()
{
    // One nlist_64 at 56 whose n_strx points far beyond the 2-byte string table at 72
    let mut entry = Vec::new();
    entry.extend_from_slice(&0x400u32.to_le_bytes());
    entry.extend_from_slice(&[0x0f, 1, 0, 0]);
    entry.extend_from_slice(&0x1000u64.to_le_bytes());
    let image = MachOBuilder::new()
        .symtab_at(56, 1, 72, 2)
        .trailer(&entry)
        .trailer(&[b'x', 0])
        .image();

    assert!(matches!(resolve(&image, "x"), Err(KernError::MalformedImage { .. })));
}

#[test]
fn test_table_lists_every_entry()
{
    let image = MachOBuilder::new()
        .symtab(&[("_a", 1), ("_b", 2), ("_c", 3)])
        .image();

    let table = SymbolTable::parse(&image).unwrap();
    assert_eq!(table.len(), 3);
    assert!(table.lookup("_d").unwrap().is_none());

    let names: Vec<String> = symbols(&image).unwrap().iter().map(|entry| entry.name().into_owned()).collect();
    assert_eq!(names, vec!["_a", "_b", "_c"]);
    assert_eq!(table.entry(1).unwrap().value, Address::new(2));
}
