//! Remote address type.

use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use thiserror::Error;

/// Strongly typed address in the inspected address space
///
/// Everything the memory reader emits is tagged with one of these, so a
/// remote address never gets mixed up with an offset into a local buffer.
///
/// Display renders the fixed 16-digit form used by every output line:
///
/// ```rust
/// use kernutil_core::types::Address;
///
/// let addr = Address::new(0xffffff8000c48090);
/// assert_eq!(addr.to_string(), "0xffffff8000c48090");
/// assert_eq!((addr + 8).value(), 0xffffff8000c48098);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Advance by `offset` bytes, returning `None` on overflow
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Apply a slide (kASLR offset) to an unslid address
    ///
    /// The slide is added modulo 2^64, matching how the unslid value and the
    /// slide are summed on the command line.
    pub const fn slid(self, slide: u64) -> Self
    {
        Address(self.0.wrapping_add(slide))
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

/// Failure to parse a hexadecimal address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid hexadecimal address: '{0}'")]
pub struct ParseAddressError(pub String);

impl FromStr for Address
{
    type Err = ParseAddressError;

    /// Parses hexadecimal with or without a `0x`/`0X` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(ParseAddressError(s.to_string()));
        }
        u64::from_str_radix(digits, 16)
            .map(Address)
            .map_err(|_| ParseAddressError(s.to_string()))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_parse_with_and_without_prefix()
    {
        assert_eq!("0x1000".parse::<Address>().unwrap(), Address::new(0x1000));
        assert_eq!("FFFFFF8000C48090".parse::<Address>().unwrap(), Address::new(0xffff_ff80_00c4_8090));
        assert!("0x".parse::<Address>().is_err());
        assert!("xyz".parse::<Address>().is_err());
    }

    #[test]
    fn test_slide_wraps()
    {
        assert_eq!(Address::new(0x1000).slid(0x800_0000), Address::new(0x800_1000));
        assert_eq!(Address::new(u64::MAX).slid(1), Address::ZERO);
    }
}
