//! `pandomap ranges`: the interleaved address range of every memory bank.

use std::fmt::Write;

use anyhow::Result;

use pando_sysconfig::{BankRange, SystemConfig};

use crate::Format;

/// Render the bank table.
pub fn render(system: &SystemConfig, banks: &[BankRange], format: Format) -> Result<String> {
    if format == Format::Json {
        return Ok(serde_json::to_string_pretty(banks)? + "\n");
    }

    let mut out = String::new();
    writeln!(out, "Memory banks of '{}' ({} total):", system.name, banks.len())?;
    writeln!(out)?;
    for bank in banks {
        writeln!(out, "  {bank}")?;
    }
    Ok(out)
}

/// Print every bank range of `system`.
pub fn run(system: &SystemConfig, format: Format) -> Result<()> {
    let banks = system.memory_banks()?;
    print!("{}", render(system, &banks, format)?);
    Ok(())
}
