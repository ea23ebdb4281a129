//! # Types
//!
//! Small value types shared by the image parser and the memory reader.

pub mod address;

// Re-export all public types
pub use address::{Address, ParseAddressError};
