//! # macOS Mach API Errors
//!
//! Mach APIs return `kern_return_t` values, which are integer error codes.
//! This module converts the ones kernel memory access runs into.

use mach2::kern_return::{
    kern_return_t, KERN_FAILURE, KERN_INVALID_ADDRESS, KERN_INVALID_ARGUMENT, KERN_PROTECTION_FAILURE,
};
use thiserror::Error;

/// Mach kernel API error
///
/// ## References
///
/// - [kern_return_t documentation](https://developer.apple.com/documentation/kernel/kern_return_t)
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachError
{
    /// `KERN_INVALID_ADDRESS` (1): the range is not mapped in the kernel map
    #[error("KERN_INVALID_ADDRESS: Address is not mapped")]
    InvalidAddress,

    /// `KERN_PROTECTION_FAILURE` (2): the range does not allow the access
    #[error("KERN_PROTECTION_FAILURE: Permission denied")]
    ProtectionFailure,

    /// `KERN_INVALID_ARGUMENT` (4)
    ///
    /// Usually a dead or null port, or a zero-length request.
    #[error("KERN_INVALID_ARGUMENT: Invalid port or argument")]
    InvalidArgument,

    /// `KERN_FAILURE` (5)
    #[error("KERN_FAILURE: Operation failed")]
    Failure,

    /// Unknown Mach error code
    ///
    /// The integer value is preserved so you can look it up.
    #[error("Unknown Mach error: {0}")]
    Unknown(i32),
}

impl From<kern_return_t> for MachError
{
    fn from(code: kern_return_t) -> Self
    {
        match code {
            KERN_INVALID_ADDRESS => MachError::InvalidAddress,
            KERN_PROTECTION_FAILURE => MachError::ProtectionFailure,
            KERN_INVALID_ARGUMENT => MachError::InvalidArgument,
            KERN_FAILURE => MachError::Failure,
            _ => MachError::Unknown(code),
        }
    }
}
