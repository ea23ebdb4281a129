//! Bounds-checked byte views.
//!
//! Every structure in the image is read through a [`ByteView`]: a slice plus
//! the absolute offset it starts at. Reads are relative to the view and are
//! checked against its length before any byte is touched; errors report the
//! absolute image offset so a malformed field can be located with a hex editor.

use crate::error::{KernError, KernResult};

/// A borrowed, bounds-checked window into a [`BinaryImage`](super::BinaryImage)
#[derive(Debug, Clone, Copy)]
pub struct ByteView<'a>
{
    bytes: &'a [u8],
    base: usize,
}

impl<'a> ByteView<'a>
{
    pub(crate) fn new(bytes: &'a [u8], base: usize) -> Self
    {
        Self { bytes, base }
    }

    /// Absolute image offset of the first byte of this view
    pub fn base(&self) -> usize
    {
        self.base
    }

    /// Length of the view in bytes
    pub fn len(&self) -> usize
    {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.bytes.is_empty()
    }

    /// The raw bytes covered by this view
    pub fn as_bytes(&self) -> &'a [u8]
    {
        self.bytes
    }

    /// A sub-view of `len` bytes starting `offset` bytes into this one.
    pub fn sub(&self, offset: usize, len: usize) -> KernResult<ByteView<'a>>
    {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| KernError::malformed(self.base.saturating_add(offset), "range length overflows"))?;
        let bytes = self.bytes.get(offset..end).ok_or_else(|| {
            KernError::malformed(
                self.base.saturating_add(offset),
                format!(
                    "range of {len} byte(s) exceeds view of {} byte(s) at 0x{:x}",
                    self.bytes.len(),
                    self.base
                ),
            )
        })?;
        Ok(ByteView::new(bytes, self.base + offset))
    }

    /// The view from `offset` to its end.
    pub fn tail(&self, offset: usize) -> KernResult<ByteView<'a>>
    {
        let len = self
            .bytes
            .len()
            .checked_sub(offset)
            .ok_or_else(|| KernError::malformed(self.base.saturating_add(offset), "offset past end of view"))?;
        self.sub(offset, len)
    }

    fn array<const N: usize>(&self, offset: usize) -> KernResult<[u8; N]>
    {
        let view = self.sub(offset, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(view.bytes);
        Ok(out)
    }

    /// Little-endian `u16` at `offset`
    pub fn u16_at(&self, offset: usize) -> KernResult<u16>
    {
        self.array::<2>(offset).map(u16::from_le_bytes)
    }

    /// Little-endian `u32` at `offset`
    pub fn u32_at(&self, offset: usize) -> KernResult<u32>
    {
        self.array::<4>(offset).map(u32::from_le_bytes)
    }

    /// Little-endian `u64` at `offset`
    pub fn u64_at(&self, offset: usize) -> KernResult<u64>
    {
        self.array::<8>(offset).map(u64::from_le_bytes)
    }

    /// Single byte at `offset`
    pub fn u8_at(&self, offset: usize) -> KernResult<u8>
    {
        self.array::<1>(offset).map(|b| b[0])
    }

    /// Fixed-size byte array at `offset` (e.g. a 16-byte segment name)
    pub fn bytes_at<const N: usize>(&self, offset: usize) -> KernResult<[u8; N]>
    {
        self.array::<N>(offset)
    }

    /// NUL-terminated byte string starting at `offset`, without the terminator.
    ///
    /// The terminator must lie inside the view; running off the end is a
    /// malformed image, not a truncated name.
    pub fn c_str_at(&self, offset: usize) -> KernResult<&'a [u8]>
    {
        let rest = self.tail(offset)?;
        let len = rest
            .bytes
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| KernError::malformed(rest.base, "unterminated string"))?;
        Ok(&rest.bytes[..len])
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_reads_are_little_endian()
    {
        let bytes = [0x78, 0x56, 0x34, 0x12, 0xef, 0xcd, 0xab, 0x89];
        let view = ByteView::new(&bytes, 0);
        assert_eq!(view.u32_at(0).unwrap(), 0x1234_5678);
        assert_eq!(view.u64_at(0).unwrap(), 0x89ab_cdef_1234_5678);
        assert_eq!(view.u16_at(6).unwrap(), 0x89ab);
    }

    #[test]
    fn test_out_of_range_reports_absolute_offset()
    {
        let bytes = [0u8; 8];
        let view = ByteView::new(&bytes, 0x100);
        match view.u64_at(4) {
            Err(KernError::MalformedImage { offset, .. }) => assert_eq!(offset, 0x104),
            other => panic!("expected MalformedImage, got {other:?}"),
        }
        assert!(view.sub(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_c_str_requires_terminator()
    {
        let bytes = *b"_foo\0_bar";
        let view = ByteView::new(&bytes, 0);
        assert_eq!(view.c_str_at(0).unwrap(), b"_foo");
        assert!(view.c_str_at(5).is_err());
        assert_eq!(view.c_str_at(4).unwrap(), b"");
    }
}
