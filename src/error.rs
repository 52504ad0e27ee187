//! Error types for capability-mcp.
//!
//! Protocol-level failures never use these types directly: the dispatcher
//! converts everything into JSON-RPC error envelopes. These cover the
//! plumbing around it (configuration, the prompt file, registration).

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors raised by the file-backed prompt store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The prompt file could not be read.
    #[error("failed to read prompt file: {path}")]
    Read {
        /// Path to the prompt file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The prompt file could not be written.
    #[error("failed to write prompt file: {path}")]
    Write {
        /// Path to the prompt file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The prompt file is not valid JSON in the expected shape.
    #[error("failed to parse prompt file: {path}")]
    Parse {
        /// Path to the prompt file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The prompt data could not be encoded as JSON for writing.
    #[error("failed to serialise prompt file: {path}")]
    Serialize {
        /// Path to the prompt file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A prompt with this id is already stored.
    #[error("prompt '{id}' already exists")]
    DuplicateId {
        /// The conflicting id.
        id: String,
    },

    /// No stored prompt has this id.
    #[error("no prompt with id '{id}'")]
    UnknownId {
        /// The id that was looked up.
        id: String,
    },

    /// The id contains characters other than ASCII letters, digits and hyphens.
    #[error("invalid prompt id '{id}': use ASCII letters, digits and hyphens only")]
    InvalidId {
        /// The rejected id.
        id: String,
    },

    /// The prompt would not register, e.g. an undeclared placeholder.
    #[error("prompt would be rejected at registration")]
    InvalidPrompt(#[from] RegistryError),
}

/// Errors raised when an entity violates a registration invariant.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// A prompt template references a placeholder with no parameter entry.
    #[error("prompt '{prompt}' references undeclared placeholder '{placeholder}'")]
    UndeclaredPlaceholder {
        /// Prompt id.
        prompt: String,
        /// The placeholder name found in the template.
        placeholder: String,
    },

    /// A tool lists a required key that its schema does not declare.
    #[error("tool '{tool}' requires undeclared parameter '{param}'")]
    UndeclaredRequired {
        /// Tool name.
        tool: String,
        /// The required key.
        param: String,
    },

    /// A declared default does not satisfy its own parameter spec.
    #[error("'{owner}' declares an invalid default for '{param}': {reason}")]
    InvalidDefault {
        /// Prompt id or tool name.
        owner: String,
        /// Parameter name.
        param: String,
        /// Why the default was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn validation_error_display() {
        let error = ConfigError::ValidationError {
            message: "invalid setting".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("invalid setting"));
    }

    #[test]
    fn serialise_failure_is_not_reported_as_parse() {
        use std::collections::BTreeMap;

        let source = serde_json::to_string(&BTreeMap::from([((1, 2), 3)])).unwrap_err();
        let error = StoreError::Serialize {
            path: PathBuf::from("prompts.json"),
            source,
        };
        let msg = error.to_string();
        assert!(msg.contains("serialise"));
        assert!(!msg.contains("parse"));
        assert!(msg.contains("prompts.json"));
    }

    #[test]
    fn store_error_names_the_id() {
        let error = StoreError::DuplicateId {
            id: "math-tutor".to_string(),
        };
        assert!(error.to_string().contains("math-tutor"));
    }

    #[test]
    fn registry_error_display() {
        let error = RegistryError::UndeclaredPlaceholder {
            prompt: "sql-helper".to_string(),
            placeholder: "task".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("sql-helper"));
        assert!(msg.contains("'task'"));
    }
}
