//! # Configuration
//!
//! Settings read from the environment, overridden by command-line flags.
//!
//! | Variable               | Default                          |
//! |------------------------|----------------------------------|
//! | `KERNUTIL_KERNEL_PATH` | `/System/Library/Kernels/kernel` |
//! | `KERNUTIL_STRING_CAP`  | unset (one page)                 |
//! | `KERNUTIL_LOG_FORMAT`  | `pretty`                         |
//! | `KERNUTIL_LOG_FILE`    | unset (console only)             |

use std::env;
use std::path::PathBuf;

use crate::logging::{LogFormat, LoggingError};

/// Kernel image used for symbol lookups when none is given
pub const DEFAULT_KERNEL_PATH: &str = "/System/Library/Kernels/kernel";

pub const KERNEL_PATH_VAR: &str = "KERNUTIL_KERNEL_PATH";
pub const STRING_CAP_VAR: &str = "KERNUTIL_STRING_CAP";
pub const LOG_FORMAT_VAR: &str = "KERNUTIL_LOG_FORMAT";
pub const LOG_FILE_VAR: &str = "KERNUTIL_LOG_FILE";

/// Resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings
{
    pub kernel_path: PathBuf,
    /// Cap on a string followed through an `s` field; `None` keeps the
    /// core's page-sized default
    pub string_cap: Option<usize>,
    pub log_format: LogFormat,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings
{
    fn default() -> Self
    {
        Self {
            kernel_path: PathBuf::from(DEFAULT_KERNEL_PATH),
            string_cap: None,
            log_format: LogFormat::Pretty,
            log_file: None,
        }
    }
}

impl Settings
{
    /// Read settings from the process environment
    ///
    /// ## Errors
    ///
    /// Returns an error if a variable is set to a value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError>
    {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(path) = lookup(KERNEL_PATH_VAR).filter(|value| !value.is_empty()) {
            settings.kernel_path = PathBuf::from(path);
        }

        if let Some(cap) = lookup(STRING_CAP_VAR) {
            let parsed = cap.trim().parse::<usize>();
            settings.string_cap = match parsed {
                Ok(cap) if cap > 0 => Some(cap),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        variable: STRING_CAP_VAR,
                        value: cap,
                        reason: "expected a positive byte count".to_string(),
                    })
                }
            };
        }

        if let Some(format) = lookup(LOG_FORMAT_VAR) {
            settings.log_format = format.parse().map_err(|err: LoggingError| ConfigError::InvalidValue {
                variable: LOG_FORMAT_VAR,
                value: format.clone(),
                reason: err.to_string(),
            })?;
        }

        settings.log_file = lookup(LOG_FILE_VAR).filter(|value| !value.is_empty()).map(PathBuf::from);

        Ok(settings)
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError
{
    /// An environment variable holds a value that does not parse
    #[error("Invalid value '{value}' for {variable}: {reason}")]
    InvalidValue
    {
        variable: &'static str,
        value: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests
{
    use std::collections::HashMap;

    use super::*;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String>
    {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset()
    {
        let settings = Settings::from_lookup(lookup_in(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.kernel_path, PathBuf::from(DEFAULT_KERNEL_PATH));
        assert_eq!(settings.string_cap, None);
    }

    #[test]
    fn test_overrides_from_environment()
    {
        let settings = Settings::from_lookup(lookup_in(&[
            (KERNEL_PATH_VAR, "/tmp/kernel.development"),
            (STRING_CAP_VAR, "256"),
            (LOG_FORMAT_VAR, "json"),
            (LOG_FILE_VAR, "/tmp/kernutil.log"),
        ]))
        .unwrap();
        assert_eq!(settings.kernel_path, PathBuf::from("/tmp/kernel.development"));
        assert_eq!(settings.string_cap, Some(256));
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.log_file, Some(PathBuf::from("/tmp/kernutil.log")));
    }

    #[test]
    fn test_rejects_bad_values()
    {
        assert!(Settings::from_lookup(lookup_in(&[(STRING_CAP_VAR, "0")])).is_err());
        assert!(Settings::from_lookup(lookup_in(&[(STRING_CAP_VAR, "lots")])).is_err());
        assert!(Settings::from_lookup(lookup_in(&[(LOG_FORMAT_VAR, "xml")])).is_err());
    }
}
