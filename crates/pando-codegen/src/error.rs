//! Code generation error types.

use pando_addrmap::AddressError;

/// Errors that can occur while rendering generated files.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// An address the output depends on could not be encoded.
    #[error("address error: {0}")]
    Address(#[from] AddressError),

    /// Writing to the output buffer failed.
    #[error("format error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Result type alias for code generation.
pub type Result<T> = std::result::Result<T, CodegenError>;
