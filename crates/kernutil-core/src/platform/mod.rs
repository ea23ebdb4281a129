//! # Platform-Specific Implementations
//!
//! Concrete [`AddressSpace`](crate::memory::AddressSpace) capabilities.
//!
//! - **macOS**: the kernel task port exported through host special port 4
//!   - See: [Apple Mach Kernel Programming](https://developer.apple.com/library/archive/documentation/Darwin/Conceptual/KernelProgramming/Mach/Mach.html)
//!
//! Everything outside this module is platform-agnostic and runs against any
//! address space, including the in-memory one used by the tests.

#[cfg(target_os = "macos")]
pub mod macos;
