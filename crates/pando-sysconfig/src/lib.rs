//! System configuration for the PANDO simulator.
//!
//! A [`SystemConfig`] names the machine's topology and the size of every
//! memory tier. From it the address map is planned and every memory bank's
//! interleaved address range is derived:
//! - **L1SP:** one scratchpad per core, plus a control register window
//! - **L2SP:** banked scratchpad per pod
//! - **DRAM:** banked main memory per PXN

pub mod banks;
pub mod error;
pub mod parse;
pub mod system;

pub use banks::{memory_banks, BankRange};
pub use error::{ConfigError, Result};
pub use parse::{
    discover_systems, generate_template, load_system_toml, parse_system_toml, system_to_toml,
    validate_system, ValidationIssue,
};
pub use system::{BankedMemoryConfig, CtrlConfig, ScratchpadConfig, SystemConfig};
