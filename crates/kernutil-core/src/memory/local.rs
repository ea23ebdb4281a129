//! In-memory address space.

use std::collections::BTreeMap;

use super::AddressSpace;
use crate::error::{KernError, KernResult};
use crate::types::Address;

/// A sparse address space made of byte regions mapped at fixed addresses
///
/// Reads and writes must fall entirely inside one region; anything touching a
/// gap faults, like unmapped kernel memory would.
///
/// ```rust
/// use kernutil_core::memory::{AddressSpace, LocalSpace};
/// use kernutil_core::types::Address;
///
/// let mut space = LocalSpace::new();
/// space.map(Address::new(0x1000), vec![0xde, 0xad, 0xbe, 0xef]);
/// assert_eq!(space.read(Address::new(0x1001), 2)?, vec![0xad, 0xbe]);
/// assert!(space.read(Address::new(0x1002), 4).is_err());
/// # Ok::<(), kernutil_core::KernError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct LocalSpace
{
    regions: BTreeMap<u64, Vec<u8>>,
}

impl LocalSpace
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Map `bytes` at `base`, replacing any region that starts there
    pub fn map(&mut self, base: Address, bytes: impl Into<Vec<u8>>) -> &mut Self
    {
        self.regions.insert(base.value(), bytes.into());
        self
    }

    /// Region containing `address` and the offset of `address` inside it
    fn locate(&self, address: Address) -> Option<(u64, usize)>
    {
        let (&base, bytes) = self.regions.range(..=address.value()).next_back()?;
        let offset = usize::try_from(address.value() - base).ok()?;
        (offset < bytes.len()).then_some((base, offset))
    }
}

impl AddressSpace for LocalSpace
{
    fn read(&self, address: Address, len: usize) -> KernResult<Vec<u8>>
    {
        if len == 0 {
            return Ok(Vec::new());
        }
        let fault = |reason: &str| KernError::ReadFault {
            address,
            requested: len,
            reason: reason.to_string(),
        };
        let (base, offset) = self.locate(address).ok_or_else(|| fault("address is not mapped"))?;
        let region = &self.regions[&base];
        offset
            .checked_add(len)
            .and_then(|end| region.get(offset..end))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| fault("read runs past the end of the mapped region"))
    }

    fn write(&mut self, address: Address, byte: u8) -> KernResult<()>
    {
        let (base, offset) = self.locate(address).ok_or_else(|| KernError::WriteFault {
            address,
            reason: "address is not mapped".to_string(),
        })?;
        if let Some(region) = self.regions.get_mut(&base) {
            region[offset] = byte;
        }
        Ok(())
    }
}
