//! Kernel task port as an [`AddressSpace`].

use std::cmp::min;

use libc::{mach_port_t, vm_address_t, vm_map_t, vm_offset_t};
use mach2::kern_return::KERN_SUCCESS;
use mach2::message::mach_msg_type_number_t;
use mach2::port::MACH_PORT_NULL;
use mach2::traps::mach_task_self;
use mach2::vm::mach_vm_read_overwrite;
use mach2::vm_types::{mach_vm_address_t, mach_vm_size_t};
use tracing::{debug, trace};

use super::error::MachError;
use super::ffi;
use crate::error::{KernError, KernResult};
use crate::memory::AddressSpace;
use crate::types::Address;

/// Largest single `mach_vm_read_overwrite` request
///
/// Bigger reads are split into chunks of this size.
pub const MAX_VM_READ_CHUNK: usize = 64 * 1024;

/// Send right to the kernel task
///
/// The right is released when this is dropped.
#[derive(Debug)]
pub struct KernelTask
{
    port: mach_port_t,
}

impl KernelTask
{
    /// Fetch the kernel task port from host special port 4
    ///
    /// ## Errors
    ///
    /// - `AccessDenied`: the port is not exported (stock kernel) or we lack
    ///   the privilege to ask for it
    /// - `Mach`: `host_get_special_port()` failed outright
    pub fn obtain() -> KernResult<Self>
    {
        let mut port: mach_port_t = MACH_PORT_NULL;
        let result = unsafe {
            ffi::host_get_special_port(
                ffi::mach_host_self(),
                ffi::HOST_LOCAL_NODE,
                ffi::HOST_KERNEL_TASK_SPECIAL_PORT,
                &mut port,
            )
        };

        if result != KERN_SUCCESS {
            return Err(MachError::from(result).into());
        }
        if port == MACH_PORT_NULL {
            return Err(KernError::AccessDenied(
                "failed to obtain the kernel task port from host special port 4".to_string(),
            ));
        }

        debug!(port, "obtained kernel task port");
        Ok(Self { port })
    }

    /// The raw port name
    pub fn port(&self) -> mach_port_t
    {
        self.port
    }
}

impl AddressSpace for KernelTask
{
    fn read(&self, address: Address, len: usize) -> KernResult<Vec<u8>>
    {
        let mut buffer = vec![0u8; len];
        let mut total = 0usize;

        while total < len {
            let chunk_len = min(MAX_VM_READ_CHUNK, len - total);
            let remote = address.value().wrapping_add(total as u64);
            let mut actual: mach_vm_size_t = 0;

            let result = unsafe {
                mach_vm_read_overwrite(
                    self.port as vm_map_t,
                    remote,
                    chunk_len as mach_vm_size_t,
                    buffer[total..].as_mut_ptr() as mach_vm_address_t,
                    &mut actual,
                )
            };

            if result != KERN_SUCCESS {
                return Err(KernError::ReadFault {
                    address,
                    requested: len,
                    reason: format!("mach_vm_read_overwrite failed at 0x{remote:x}: {}", MachError::from(result)),
                });
            }
            if actual as usize != chunk_len {
                return Err(KernError::ReadFault {
                    address,
                    requested: len,
                    reason: format!(
                        "intended to read {chunk_len} byte(s) at 0x{remote:x}, actually read {actual}; maybe reading too much?"
                    ),
                });
            }

            trace!(remote = format_args!("0x{remote:x}"), chunk_len, "vm read chunk");
            total += chunk_len;
        }

        Ok(buffer)
    }

    fn write(&mut self, address: Address, byte: u8) -> KernResult<()>
    {
        let result = unsafe {
            ffi::vm_write(
                self.port as vm_map_t,
                address.value() as vm_address_t,
                &byte as *const u8 as vm_offset_t,
                1 as mach_msg_type_number_t,
            )
        };

        if result != KERN_SUCCESS {
            return Err(KernError::WriteFault {
                address,
                reason: format!("vm_write failed: {}", MachError::from(result)),
            });
        }
        Ok(())
    }
}

impl Drop for KernelTask
{
    fn drop(&mut self)
    {
        // Best effort release - ignore errors
        unsafe {
            let _ = ffi::mach_port_deallocate(mach_task_self(), self.port);
        }
    }
}
