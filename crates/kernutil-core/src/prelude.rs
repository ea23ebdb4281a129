//! Common module for library exports

pub use crate::commands::{run_read, write_stream, write_value, ReadRequest};
pub use crate::error::{KernError, KernResult, Lookup};
pub use crate::format::{FormatField, FormatSpec, Width};
pub use crate::image::{find_base, find_segment, resolve, BinaryImage};
pub use crate::memory::{read_records, AddressSpace, LocalSpace};
#[cfg(target_os = "macos")]
pub use crate::platform::macos::KernelTask;
pub use crate::types::Address;
