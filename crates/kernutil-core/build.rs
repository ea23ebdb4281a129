//! Build script for kernutil-core
//!
//! Checks the toolchain and, on macOS, the host OS version before compiling.
//!
//! ## Requirements
//!
//! - **Rust**: Edition 2021 (Rust 1.56.0 or newer)
//! - **macOS**: 10.9+ for Intel, 11.0+ for Apple Silicon

fn main()
{
    // Edition 2021 requires Rust 1.56.0
    if let Ok(rustc_version) = rustc_version::version() {
        let min_rust_version = rustc_version::Version::new(1, 56, 0);

        if rustc_version < min_rust_version {
            panic!(
                "kernutil-core requires Rust {} or newer (Edition 2021), found {}",
                min_rust_version, rustc_version
            );
        }
    } else {
        // If we can't get version (e.g., in some build environments), just warn
        println!("cargo:warning=could not verify Rust version");
    }

    #[cfg(target_os = "macos")]
    check_macos_requirements();
}

#[cfg(target_os = "macos")]
fn check_macos_requirements()
{
    // mach_vm_read_overwrite() on 64-bit kernels is reliable from 10.9 on;
    // Apple Silicon kernels start at 11.0
    let min_macos_version = if cfg!(target_arch = "aarch64") { (11, 0, 0) } else { (10, 9, 0) };

    match get_macos_version() {
        Some(version) if version < min_macos_version => panic!(
            "kernutil-core requires macOS {}.{}.{} or newer, found {}.{}.{}",
            min_macos_version.0, min_macos_version.1, min_macos_version.2, version.0, version.1, version.2
        ),
        Some(_) => {}
        // Might be cross-compiling
        None => println!("cargo:warning=could not detect macOS version"),
    }
}

#[cfg(target_os = "macos")]
fn get_macos_version() -> Option<(u32, u32, u32)>
{
    use std::process::Command;

    let output = Command::new("sw_vers").arg("-productVersion").output().ok()?;
    let version_str = String::from_utf8(output.stdout).ok()?;

    // e.g. "14.2.1" or "11.0"
    let mut parts = version_str.trim().split('.');
    let major = parts.next()?.parse::<u32>().ok()?;
    let minor = parts.next()?.parse::<u32>().ok()?;
    let patch = parts.next().and_then(|s| s.parse::<u32>().ok()).unwrap_or(0);

    Some((major, minor, patch))
}
