//! Canonical hex + ASCII dumps.
//!
//! ```text
//! [0xffffff80001961a3]  de ad be ef 41 42 43 44 00 01 02 03 04 05 06 07  ....ABCD........
//! [0xffffff80001961b3]  41 42 43 44                                      ABCD
//! ```
//!
//! Rows hold 16 bytes. The label is the row's absolute address; a short final
//! row is padded with blank cells so the ASCII column stays aligned.

use std::iter::FusedIterator;

use crate::types::Address;

/// Bytes per row
pub const ROW_WIDTH: usize = 16;

const BLANK_CELL: &str = "   ";

/// Iterator over rendered rows, created by [`rows`]
#[derive(Debug, Clone)]
pub struct HexRows<'a>
{
    chunks: std::slice::Chunks<'a, u8>,
    base: Address,
    row: u64,
}

impl Iterator for HexRows<'_>
{
    type Item = String;

    fn next(&mut self) -> Option<Self::Item>
    {
        let chunk = self.chunks.next()?;
        let label = self.base + self.row * ROW_WIDTH as u64;
        self.row += 1;
        Some(format_row(label, chunk))
    }

    fn size_hint(&self) -> (usize, Option<usize>)
    {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for HexRows<'_> {}

impl FusedIterator for HexRows<'_> {}

/// Render one row of at most [`ROW_WIDTH`] bytes labelled with `address`
pub fn format_row(address: Address, chunk: &[u8]) -> String
{
    debug_assert!(chunk.len() <= ROW_WIDTH);
    let mut line = String::with_capacity(22 + ROW_WIDTH * 4);
    line.push('[');
    line.push_str(&address.to_string());
    line.push_str("] ");

    for byte in chunk {
        line.push_str(&format!(" {byte:02x}"));
    }
    for _ in chunk.len()..ROW_WIDTH {
        line.push_str(BLANK_CELL);
    }

    line.push_str("  ");
    line.extend(chunk.iter().map(|&byte| printable(byte)));
    line
}

/// Rows for `bytes`, labelled starting at `base`
///
/// An empty buffer produces no rows.
pub fn rows(bytes: &[u8], base: Address) -> HexRows<'_>
{
    HexRows {
        chunks: bytes.chunks(ROW_WIDTH),
        base,
        row: 0,
    }
}

/// All rows for `bytes`, collected
pub fn render(bytes: &[u8], base: Address) -> Vec<String>
{
    rows(bytes, base).collect()
}

fn printable(byte: u8) -> char
{
    if (0x20..=0x7e).contains(&byte) {
        byte as char
    } else {
        '.'
    }
}
