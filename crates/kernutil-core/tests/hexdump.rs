//! Tests for hexdump rendering

use kernutil_core::hexdump::{render, rows, ROW_WIDTH};
use kernutil_core::Address;

#[test]
fn test_short_final_row_is_padded()
{
    let bytes: Vec<u8> = (0u8..20).collect();
    let lines = render(&bytes, Address::new(0x1000));

    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[1],
        format!("[0x0000000000001010]  10 11 12 13{}  ....", "   ".repeat(ROW_WIDTH - 4))
    );
    // the ASCII column starts at the same place on both rows
    assert_eq!(lines[0].len() - ROW_WIDTH, lines[1].len() - 4);
}

#[test]
fn test_ascii_column()
{
    let lines = render(&[0x41, 0x01, 0x7e, 0x7f, 0x20], Address::ZERO);
    assert!(lines[0].ends_with("  A.~. "));
}

#[test]
fn test_empty_input_has_no_rows()
{
    assert_eq!(rows(&[], Address::new(0x1000)).count(), 0);
    assert!(render(&[], Address::ZERO).is_empty());
}

#[test]
fn test_labels_advance_by_row()
{
    let bytes = vec![0u8; 48];
    let labels: Vec<String> = rows(&bytes, Address::new(0xffff_ff80_0000_0000))
        .map(|row| row[..20].to_string())
        .collect();
    assert_eq!(
        labels,
        vec!["[0xffffff8000000000]", "[0xffffff8000000010]", "[0xffffff8000000020]"]
    );
}
