//! Error types for system configuration operations.

use std::path::PathBuf;

use pando_addrmap::AddressError;

/// Errors that can occur while loading or applying a system configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading/writing system files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// System file not found.
    #[error("system file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Validation error in a system definition.
    #[error("validation error: {detail}")]
    Validation {
        /// Description of the validation failure.
        detail: String,
    },

    /// The address map rejected the configuration.
    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Result type for system configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
