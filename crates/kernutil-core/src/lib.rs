//! # kernutil-core
//!
//! Mach-O symbol resolution and typed kernel memory inspection.
//!
//! This crate provides:
//! - Bounds-checked parsing of 64-bit Mach-O images ([`image`]): load
//!   commands, segments, and `LC_SYMTAB` symbol lookup
//! - A compiler for field-width format strings such as `"1448"` or `":ss8"`
//!   ([`format`])
//! - A record reader that decodes remote memory through any
//!   [`AddressSpace`], following `s` fields to their C strings ([`memory`])
//! - Hexdump rendering ([`hexdump`]) and the read/write drivers
//!   ([`commands`])
//!
//! ## Platform Support
//!
//! - **macOS**: [`KernelTask`](platform::macos::KernelTask) reads and writes
//!   kernel memory through host special port 4
//! - Everything else is platform-agnostic and works on any [`AddressSpace`]
//!
//! ## Why unsafe code is needed
//!
//! Only the Mach calls in [`platform`] and the page size query use `unsafe`.
//! Image parsing never touches raw pointers: every field is read through a
//! [`ByteView`](image::ByteView) that checks its range first.

#![allow(unsafe_code)] // Required for Mach APIs and sysconf

pub mod commands;
pub mod error;
pub mod format;
pub mod hexdump;
pub mod image;
pub mod memory;
pub mod platform;
pub mod prelude;
pub mod types;

// Re-export commonly used types
pub use error::{KernError, KernResult, Lookup};
pub use format::FormatSpec;
pub use image::BinaryImage;
pub use memory::AddressSpace;
#[cfg(target_os = "macos")]
pub use platform::macos::KernelTask;
pub use types::Address;
