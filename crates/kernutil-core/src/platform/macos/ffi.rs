//! # macOS Mach API FFI Declarations
//!
//! Mach functions this crate needs that the `mach2` crate does not export.
//!
//! All functions in this module are `unsafe` because they hand raw pointers
//! and port names to the kernel. They are wrapped by [`super::kernel`].

// Allow doc comments in extern blocks - they're useful for developers even if rustdoc doesn't generate docs
#![allow(unused_doc_comments)]

use libc::{c_int, kern_return_t, mach_msg_type_number_t, mach_port_t, vm_address_t, vm_map_t, vm_offset_t};

/// `HOST_LOCAL_NODE` from `<mach/host_special_ports.h>`
pub const HOST_LOCAL_NODE: c_int = -1;

/// Host special port slot conventionally used to export the kernel task port
pub const HOST_KERNEL_TASK_SPECIAL_PORT: c_int = 4;

#[link(name = "c", kind = "dylib")]
extern "C" {
    /// Send right to the host port of the current machine
    pub fn mach_host_self() -> mach_port_t;

    /// Fetch a special port registered on the host
    ///
    /// ## Parameters
    ///
    /// - `host_priv`: Host port (`mach_host_self()`)
    /// - `node`: `HOST_LOCAL_NODE`
    /// - `which`: Special port slot (4 for the exported kernel task)
    /// - `port`: Output parameter - receives the port, or `MACH_PORT_NULL`
    ///
    /// See: [host_get_special_port(3)](https://developer.apple.com/documentation/kernel/1585397-host_get_special_port)
    pub fn host_get_special_port(
        host_priv: mach_port_t,
        node: c_int,
        which: c_int,
        port: *mut mach_port_t,
    ) -> kern_return_t;

    /// Copy `data_count` bytes from our address space to `address` in `target_task`
    ///
    /// See: [vm_write(3) man page](https://developer.apple.com/documentation/kernel/1585462-vm_write/)
    pub fn vm_write(
        target_task: vm_map_t,
        address: vm_address_t,
        data: vm_offset_t,
        data_count: mach_msg_type_number_t,
    ) -> kern_return_t;

    /// Release a port right obtained from the kernel
    ///
    /// See: [mach_port_deallocate(3) man page](https://developer.apple.com/documentation/kernel/1578777-mach_port_deallocate/)
    pub fn mach_port_deallocate(target_task: mach_port_t, name: mach_port_t) -> kern_return_t;
}
