//! Firmware build artifacts derived from a PANDO address map.
//!
//! ## Modules
//!
//! - [`cheader`]: `#define`s for every address bit field
//! - [`ldscript`]: GNU ld script placing sections in the relative windows

pub mod cheader;
pub mod error;
pub mod ldscript;

pub use cheader::CHeaderBuilder;
pub use error::{CodegenError, Result};
pub use ldscript::LdScriptBuilder;
