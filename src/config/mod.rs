//! Configuration file loading and parsing.
//!
//! # Configuration File Locations
//!
//! 1. Path given as the `CONFIG_FILE` argument (must exist)
//! 2. Default location, used only if present:
//!    - **Linux/macOS:** `~/.capability-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.capability-mcp\config.json`
//!
//! With no file at all the built-in defaults apply.

mod settings;

pub use settings::{Config, LoggingConfig, ServerConfig, LOG_LEVELS};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.capability-mcp/`
/// - **Windows:** `%USERPROFILE%\.capability-mcp\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".capability-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Resolves which configuration file to read.
///
/// An explicit `path` must exist. Without one, the default location is
/// used if a file is present there; `None` means the built-in defaults
/// apply.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] if an explicit `path` does not exist.
pub fn find_config(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    match path {
        Some(p) if !p.exists() => Err(ConfigError::NotFound {
            path: p.to_path_buf(),
        }),
        Some(p) => Ok(Some(p.to_path_buf())),
        None => Ok(default_config_path().filter(|p| p.exists())),
    }
}

/// Reads, parses and validates the configuration file at `path`.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The JSON is malformed
/// - A field fails validation
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    config.validate()?;

    Ok(config)
}

/// Loads and validates the configuration.
///
/// If `path` is `None`, the default location is tried and a missing file
/// yields [`Config::default`]. Nothing is logged here, so this is safe to
/// call before the tracing subscriber exists.
///
/// # Errors
///
/// Returns an error if:
/// - An explicit `path` does not exist
/// - The file cannot be read
/// - The JSON is malformed
/// - A field fails validation
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    find_config(path)?.map_or_else(|| Ok(Config::default()), |p| read_config(&p))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config_path_exists() {
        let path = default_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains(".capability-mcp"));
        assert!(path.to_string_lossy().ends_with("config.json"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("absent.json")));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn find_config_reports_the_file_it_will_read() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(
            find_config(Some(file.path())).unwrap().as_deref(),
            Some(file.path())
        );

        let dir = tempfile::tempdir().unwrap();
        let result = find_config(Some(&dir.path().join("absent.json")));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn loads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "server": {{ "name": "tutor" }}, "builtin_tools": false }}"#).unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.server.name, "tutor");
        assert!(!config.builtin_tools);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let result = load_config(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "logging": {{ "level": "chatty" }} }}"#).unwrap();

        let result = load_config(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
}
