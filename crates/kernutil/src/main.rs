use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use kernutil_core::commands::{run_read, write_stream, write_value, ReadRequest};
use kernutil_core::format::{FormatSpec, Width};
use kernutil_core::image::{find_base, resolve};
use kernutil_core::{Address, AddressSpace, BinaryImage, KernError, KernResult};
use kernutil_utils::{info, init_logging, LogLevel, Settings};

/// Read, write and symbolicate kernel memory.
#[derive(Parser, Debug)]
#[command(name = "kernutil")]
#[command(version)]
#[command(about = "Read, write and symbolicate kernel memory through the kernel task port", long_about = None)]
#[command(after_help = "Examples:
    sudo kernutil read -l 0x8000000 -s _allproc -w 8 -c 20
    sudo kernutil read -l 0x8000000 -a 0xffffff80001961a3 -c 10
    sudo kernutil read -l 0x8000000 -a 0xFFFFFF8000C48090 -w :88422 -c 100
    echo -ne \"\\xde\\xad\\xbe\\xef\" | sudo kernutil write -l 0x8000000 -a 0xffffff80001961a3")]
struct Cli
{
    /// Print the read size banner and debug logs
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Read kernel memory as a hexdump or as formatted fields
    Read
    {
        #[command(flatten)]
        target: Target,
        /// Bytes to dump, or records to decode with -w
        #[arg(short, long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,
        /// Field widths per record: 1, 2, 4, 8 or s (string pointer). Prefix with ':' to separate records
        #[arg(short = 'w', long = "format")]
        format: Option<String>,
    },
    /// Write stdin (or --value) to kernel memory, one byte at a time
    Write
    {
        #[command(flatten)]
        target: Target,
        /// Hexadecimal integer to write instead of reading stdin
        #[arg(long, value_parser = parse_hex_u64, requires = "width")]
        value: Option<u64>,
        /// Width of --value in bytes: 1, 2, 4 or 8
        #[arg(long, value_parser = parse_width, requires = "value")]
        width: Option<Width>,
    },
    /// Resolve a symbol in the kernel image
    Symbol
    {
        /// Symbol name, e.g. _allproc
        name: String,
        /// Slide (kASLR offset) added to the result, in hex
        #[arg(short = 'l', long = "slide", default_value = "0")]
        slide: Address,
        /// Kernel image (default: $KERNUTIL_KERNEL_PATH or /System/Library/Kernels/kernel)
        #[arg(long)]
        kernel: Option<PathBuf>,
    },
    /// Print the unslid base address (__TEXT vmaddr) of the kernel image
    Base
    {
        /// Kernel image (default: $KERNUTIL_KERNEL_PATH or /System/Library/Kernels/kernel)
        #[arg(long)]
        kernel: Option<PathBuf>,
    },
}

/// Where a read or write lands
#[derive(Args, Debug)]
struct Target
{
    /// Address in hex
    #[arg(short, long, conflicts_with = "symbol", required_unless_present = "symbol")]
    address: Option<Address>,
    /// Symbol resolved through the kernel image
    #[arg(short, long)]
    symbol: Option<String>,
    /// Slide (kASLR offset, or any positive offset) added to the address, in hex
    #[arg(short = 'l', long = "slide", default_value = "0")]
    slide: Address,
    /// Kernel image used for -s (default: $KERNUTIL_KERNEL_PATH or /System/Library/Kernels/kernel)
    #[arg(long)]
    kernel: Option<PathBuf>,
}

impl Target
{
    fn resolve(&self, settings: &Settings) -> KernResult<Address>
    {
        let unslid = match (self.address, self.symbol.as_deref()) {
            (Some(address), _) => address,
            (None, Some(symbol)) => {
                let image = BinaryImage::open(kernel_path(self.kernel.as_deref(), settings))?;
                resolve(&image, symbol)?
            }
            (None, None) => unreachable!("clap requires one of -a / -s"),
        };
        Ok(unslid.slid(self.slide.value()))
    }
}

fn kernel_path<'a>(explicit: Option<&'a Path>, settings: &'a Settings) -> &'a Path
{
    explicit.unwrap_or(&settings.kernel_path)
}

fn parse_hex_u64(s: &str) -> Result<u64, String>
{
    s.parse::<Address>().map(Address::value).map_err(|err| err.to_string())
}

fn parse_width(s: &str) -> Result<Width, String>
{
    s.parse::<usize>()
        .ok()
        .and_then(Width::from_bytes)
        .ok_or_else(|| format!("invalid width '{s}'; only 1, 2, 4 or 8 allowed"))
}

fn main() -> ExitCode
{
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let level = cli.verbose.then_some(LogLevel::Debug);
    let _guard = match init_logging(settings.log_format, level, settings.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run_command(cli, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_command(cli: Cli, settings: &Settings) -> KernResult<()>
{
    match cli.command {
        Commands::Read { target, count, format } => {
            let address = target.resolve(settings)?;
            let mut request = ReadRequest::new(address, count as usize).verbose(cli.verbose);
            if let Some(cap) = settings.string_cap {
                request = request.with_string_cap(cap);
            }
            if let Some(format) = format {
                request = request.with_format(FormatSpec::compile(&format)?);
            }

            require_root()?;
            let space = open_kernel()?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            run_read(&*space, &request, &mut out)?;
            out.flush()?;
            Ok(())
        }
        Commands::Write { target, value, width } => {
            let address = target.resolve(settings)?;
            require_root()?;
            let mut space = open_kernel()?;
            let written = match (value, width) {
                (Some(value), Some(width)) => write_value(&mut *space, address, width, value)?,
                _ => write_stream(&mut *space, address, io::stdin().lock())?,
            };
            info!("wrote {} byte(s) to {}", written, address);
            if cli.verbose {
                println!("[i] wrote {written} byte(s) to: 0x{:x}.", address.value());
            }
            Ok(())
        }
        Commands::Symbol { name, slide, kernel } => {
            let image = BinaryImage::open(kernel_path(kernel.as_deref(), settings))?;
            let address = resolve(&image, &name)?;
            println!("{name}: {}", address.slid(slide.value()));
            Ok(())
        }
        Commands::Base { kernel } => {
            let image = BinaryImage::open(kernel_path(kernel.as_deref(), settings))?;
            println!("{}", find_base(&image)?);
            Ok(())
        }
    }
}

fn require_root() -> KernResult<()>
{
    if unsafe { libc::geteuid() } != 0 {
        return Err(KernError::AccessDenied("kernutil must be run as root".to_string()));
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn open_kernel() -> KernResult<Box<dyn AddressSpace>>
{
    Ok(Box::new(kernutil_core::KernelTask::obtain()?))
}

#[cfg(not(target_os = "macos"))]
fn open_kernel() -> KernResult<Box<dyn AddressSpace>>
{
    Err(KernError::AccessDenied(
        "kernel memory access is only supported on macOS".to_string(),
    ))
}

#[cfg(test)]
mod tests
{
    use kernutil_core::Lookup;

    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error>
    {
        Cli::try_parse_from(std::iter::once("kernutil").chain(args.iter().copied()))
    }

    #[test]
    fn test_read_defaults()
    {
        let cli = parse(&["read", "-a", "0xffffff80001961a3"]).unwrap();
        match cli.command {
            Commands::Read { target, count, format } => {
                assert_eq!(target.address, Some(Address::new(0xffff_ff80_0019_61a3)));
                assert_eq!(target.slide, Address::ZERO);
                assert_eq!(count, 8);
                assert!(format.is_none());
            }
            other => panic!("Expected Read, got {other:?}"),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn test_target_applies_slide()
    {
        let cli = parse(&["-v", "read", "-l", "0x8000000", "-a", "ffffff8000c48090", "-w", ":88422", "-c", "100"]).unwrap();
        assert!(cli.verbose);
        let Commands::Read { target, count, format } = cli.command else {
            panic!("Expected Read");
        };
        let address = target.resolve(&Settings::default()).unwrap();
        assert_eq!(address, Address::new(0xffff_ff80_08c4_8090));
        assert_eq!(count, 100);
        assert_eq!(format.as_deref(), Some(":88422"));
    }

    #[test]
    fn test_symbol_target_uses_given_name_and_kernel()
    {
        let cli = parse(&["read", "-s", "_allproc", "--kernel", "/nonexistent/kernutil/kernel"]).unwrap();
        let Commands::Read { target, .. } = cli.command else {
            panic!("Expected Read");
        };
        assert_eq!(target.symbol.as_deref(), Some("_allproc"));
        assert!(target.address.is_none());
        match target.resolve(&Settings::default()) {
            Err(KernError::NotFound(Lookup::Image(path))) => {
                assert_eq!(path, PathBuf::from("/nonexistent/kernutil/kernel"));
            }
            other => panic!("Expected NotFound(Image), got {other:?}"),
        }
    }

    #[test]
    fn test_address_and_symbol_conflict()
    {
        assert!(parse(&["read", "-a", "0x1000", "-s", "_allproc"]).is_err());
        assert!(parse(&["read"]).is_err());
    }

    #[test]
    fn test_count_must_be_positive()
    {
        assert!(parse(&["read", "-a", "0x1000", "-c", "0"]).is_err());
        assert!(parse(&["read", "-a", "0x1000", "-c", "-3"]).is_err());
    }

    #[test]
    fn test_write_value_requires_width()
    {
        assert!(parse(&["write", "-a", "0x1000", "--value", "ff"]).is_err());
        let cli = parse(&["write", "-a", "0x1000", "--value", "0xff", "--width", "1"]).unwrap();
        let Commands::Write { value, width, .. } = cli.command else {
            panic!("Expected Write");
        };
        assert_eq!(value, Some(0xff));
        assert_eq!(width, Some(Width::One));
        assert!(parse(&["write", "-a", "0x1000", "--value", "0xff", "--width", "3"]).is_err());
    }
}
