//! `pandomap cheader` and `pandomap ldscript`: firmware build artifacts.

use std::path::Path;

use anyhow::{Context, Result};

use pando_codegen::{CHeaderBuilder, LdScriptBuilder};
use pando_sysconfig::SystemConfig;

/// Generate the C header for `system`.
pub fn cheader(system: &SystemConfig, output: Option<&Path>) -> Result<()> {
    let map = system.address_map()?;
    let header = CHeaderBuilder::new(&map).build();
    emit(&header, output, "C header")
}

/// Generate the linker script for `system`.
pub fn ldscript(system: &SystemConfig, output: Option<&Path>) -> Result<()> {
    let map = system.address_map()?;
    let script = LdScriptBuilder::new(&map).build()?;
    emit(&script, output, "linker script")
}

fn emit(content: &str, output: Option<&Path>, what: &str) -> Result<()> {
    let Some(path) = output else {
        print!("{content}");
        return Ok(());
    };
    write_output(path, content)?;
    println!("Generated {what} → {}", path.display());
    Ok(())
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cheader_to_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("include").join("address_map.h");
        cheader(&SystemConfig::pandohammer(), Some(&path)).unwrap();
        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.contains("#define ABSOLUTE_POD_HI 60ul"));
        assert!(header.contains("#define ABSOLUTE_POD_LO 58ul"));
    }

    #[test]
    fn ldscript_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pando.ld");
        ldscript(&SystemConfig::single_core(), Some(&path)).unwrap();
        let script = std::fs::read_to_string(&path).unwrap();
        assert!(script.starts_with("MEMORY"));
        assert!(script.contains("ENTRY(_start)"));
    }

    #[test]
    fn bad_topology_is_reported() {
        let mut system = SystemConfig::single_core();
        system.pod_cores = 0;
        assert!(cheader(&system, None).is_err());
    }
}
