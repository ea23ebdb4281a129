//! Tests for error handling

use std::path::PathBuf;

use kernutil_core::error::{KernError, KernResult, Lookup};
#[cfg(target_os = "macos")]
use kernutil_core::platform::macos::error::MachError;
use kernutil_core::{Address, BinaryImage};

#[cfg(target_os = "macos")]
#[test]
fn test_mach_error_protection_failure()
{
    let error = MachError::ProtectionFailure;
    let message = format!("{}", error);
    assert!(message.contains("Permission denied"));
}

#[cfg(target_os = "macos")]
#[test]
fn test_mach_error_unknown()
{
    let error = MachError::Unknown(999);
    let message = format!("{}", error);
    assert!(message.contains("999"));
}

#[cfg(target_os = "macos")]
#[test]
fn test_mach_error_to_kern_error()
{
    let kern_err: KernError = MachError::InvalidAddress.into();

    match kern_err {
        KernError::Mach(MachError::InvalidAddress) => {}
        _ => panic!("Expected Mach variant"),
    }
}

#[test]
fn test_malformed_image_display()
{
    let error = KernError::malformed(0x48, "cmdsize 0");
    let message = format!("{}", error);
    assert!(message.contains("0x48"));
    assert!(message.contains("cmdsize 0"));
}

#[test]
fn test_not_found_names_the_target()
{
    let error = KernError::NotFound(Lookup::Symbol("_allproc".to_string()));
    assert!(error.is_not_found());
    assert!(error.to_string().contains("symbol '_allproc'"));

    let error = KernError::NotFound(Lookup::Segment("__TEXT".to_string()));
    assert!(error.to_string().contains("segment '__TEXT'"));

    let error = KernError::NotFound(Lookup::LoadCommand(0x2));
    assert!(error.to_string().contains("load command 0x2"));
}

#[test]
fn test_read_fault_display()
{
    let error = KernError::ReadFault {
        address: Address::new(0xffff_ff80_0000_1000),
        requested: 16,
        reason: "KERN_INVALID_ADDRESS".to_string(),
    };
    let message = format!("{}", error);
    assert!(message.contains("0xffffff8000001000"));
    assert!(message.contains("16 byte(s)"));
    assert!(!error.is_not_found());
}

#[test]
fn test_access_denied_display()
{
    let error = KernError::AccessDenied("test reason".to_string());
    let message = format!("{}", error);
    assert!(message.contains("Access denied"));
    assert!(message.contains("test reason"));
}

#[test]
fn test_io_error_conversion()
{
    let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
    let kern_err: KernError = io_err.into();
    assert!(matches!(kern_err, KernError::Io(_)));
}

#[test]
fn test_missing_image_is_not_found()
{
    let path = PathBuf::from("/nonexistent/kernutil/kernel");
    match BinaryImage::open(&path) {
        Err(KernError::NotFound(Lookup::Image(missing))) => assert_eq!(missing, path),
        other => panic!("Expected NotFound(Image), got {other:?}"),
    }
}

#[test]
fn test_result_type()
{
    fn returns_ok() -> KernResult<u64>
    {
        Ok(42)
    }

    fn returns_err() -> KernResult<u64>
    {
        Err(KernError::AccessDenied("no port".to_string()))
    }

    assert_eq!(returns_ok().unwrap(), 42);
    assert!(returns_err().is_err());
}
