//! # macOS Kernel Memory
//!
//! Access to kernel memory through the kernel task port.
//!
//! The port (`tfp0`) is not obtainable with `task_for_pid(0)` on modern
//! systems; a patched or jailbroken kernel instead exports it as host special
//! port 4, which is what [`KernelTask::obtain`] asks for.
//!
//! ## Key Mach APIs Used
//!
//! - `host_get_special_port()`: Fetch the exported kernel task port (declared ourselves)
//! - `mach_vm_read_overwrite()`: Copy kernel memory into a local buffer (from `mach2`)
//! - `vm_write()`: Copy a local buffer into kernel memory (declared ourselves)
//!
//! ## References
//!
//! - [host_get_special_port(3)](https://developer.apple.com/documentation/kernel/1585397-host_get_special_port)
//! - [XNU osfmk/kern/host.c](https://github.com/apple-oss-distributions/xnu)

pub mod error;
pub mod ffi;
pub mod kernel;

pub use kernel::KernelTask;
