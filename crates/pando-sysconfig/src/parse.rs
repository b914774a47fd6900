//! TOML parsing, serialization, validation, and discovery for system definitions.
//!
//! System definitions are stored as `.system.toml` files in the `systems/`
//! directory of a simulator project.

use std::path::{Path, PathBuf};

use pando_addrmap::{AddressLayout, AddressMap, AddressMode, AddressType};

use crate::error::{ConfigError, Result};
use crate::system::{BankedMemoryConfig, SystemConfig};

const SYSTEM_SUFFIX: &str = ".system.toml";

/// A validation issue found in a system definition.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: "error",
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: "warning",
            message: message.into(),
        }
    }

    /// Whether this issue makes the system unusable.
    pub fn is_error(&self) -> bool {
        self.severity == "error"
    }
}

/// Load a system from a `.system.toml` file.
pub fn load_system_toml(path: &Path) -> Result<SystemConfig> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let system = parse_system_toml(&content)?;
    log::debug!("loaded system '{}' from {}", system.name, path.display());
    Ok(system)
}

/// Parse a system from a TOML string.
pub fn parse_system_toml(toml_str: &str) -> Result<SystemConfig> {
    let system: SystemConfig = toml::from_str(toml_str)?;
    Ok(system)
}

/// Serialize a system to pretty TOML.
pub fn system_to_toml(system: &SystemConfig) -> Result<String> {
    let toml_str = toml::to_string_pretty(system)?;
    Ok(toml_str)
}

/// Validate a system definition against the address layout it implies.
///
/// Returns `Ok(())` if valid, or `Err(issues)` with a list of problems.
pub fn validate_system(system: &SystemConfig) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    // 1. Hardware threads
    if system.core_threads == 0 {
        issues.push(ValidationIssue::error("core-threads must be at least 1"));
    }

    // 2. Topology fits the id bits; nothing below can be checked without it
    let layout = match AddressLayout::plan(system) {
        Ok(layout) => layout,
        Err(e) => {
            issues.push(ValidationIssue::error(e.to_string()));
            return Err(issues);
        }
    };

    // 3. Per-core windows fit the shared L1SP/CTRL offset field
    let core_window = window(&layout, AddressType::L1sp, AddressMode::Absolute);
    for (label, size) in [("l1sp", system.l1sp.size), ("ctrl", system.ctrl.size)] {
        if size == 0 {
            issues.push(ValidationIssue::error(format!("{label} size must be non-zero")));
        } else if size > core_window {
            issues.push(ValidationIssue::error(format!(
                "{label} size 0x{size:x} exceeds the 0x{core_window:x}-byte per-core window"
            )));
        }
    }

    // 4. Banked memories split evenly and fit their windows
    check_banked(&mut issues, &layout, "l2sp", AddressType::L2sp, &system.l2sp);
    check_banked(&mut issues, &layout, "dram", AddressType::Dram, &system.dram);

    // 5. Every tier's last bank encodes for the last core
    if !issues.iter().any(ValidationIssue::is_error) {
        if let Err(e) = check_ranges(system, AddressMap::from_layout(layout)) {
            issues.push(ValidationIssue::error(e.to_string()));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn window(layout: &AddressLayout, kind: AddressType, mode: AddressMode) -> u64 {
    layout.window_size(kind, mode).unwrap_or(0)
}

fn check_banked(
    issues: &mut Vec<ValidationIssue>,
    layout: &AddressLayout,
    label: &str,
    kind: AddressType,
    memory: &BankedMemoryConfig,
) {
    if memory.size == 0 {
        issues.push(ValidationIssue::error(format!("{label} size must be non-zero")));
        return;
    }
    if memory.banks == 0 {
        issues.push(ValidationIssue::error(format!("{label} has 0 banks")));
        return;
    }
    if memory.size % memory.banks != 0 {
        issues.push(ValidationIssue::error(format!(
            "{label} size 0x{:x} does not divide into {} banks",
            memory.size, memory.banks
        )));
    }
    if memory.interleave != 0 && memory.bank_size() % memory.interleave != 0 {
        issues.push(ValidationIssue::error(format!(
            "{label} bank size 0x{:x} is not a multiple of interleave {}",
            memory.bank_size(),
            memory.interleave
        )));
    }

    let absolute = window(layout, kind, AddressMode::Absolute);
    if memory.size > absolute {
        issues.push(ValidationIssue::error(format!(
            "{label} size 0x{:x} exceeds the 0x{absolute:x}-byte absolute window",
            memory.size
        )));
    }
    let relative = window(layout, kind, AddressMode::Relative);
    if memory.size > relative {
        issues.push(ValidationIssue::warning(format!(
            "{label} size 0x{:x} exceeds the 0x{relative:x}-byte relative window; \
             the excess is only reachable by absolute address",
            memory.size
        )));
    }
}

fn check_ranges(system: &SystemConfig, map: AddressMap) -> Result<()> {
    let pxn = system.num_pxn - 1;
    let pod = system.pxn_pods - 1;
    let core = system.pod_cores - 1;

    system.l1sp_builder(&map)?.range(pxn, pod, core)?;
    system.ctrl_builder(&map)?.range(pxn, pod, core)?;
    let l2sp = system.l2sp_builder(&map)?;
    l2sp.range(pxn, pod, l2sp.base().banks() - 1)?;
    let dram = system.dram_builder(&map)?;
    dram.range(pxn, dram.base().banks() - 1)?;
    Ok(())
}

/// Generate a template `.system.toml` for a new system.
///
/// Seeds from the single-core preset with the given custom name.
pub fn generate_template(name: &str) -> Result<String> {
    let mut system = SystemConfig::single_core();
    system.name = name.into();
    system_to_toml(&system)
}

/// Discover all `.system.toml` files in a project's `systems/` directory.
///
/// Returns a list of (system_name, file_path) pairs.
pub fn discover_systems(project_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let systems_dir = project_dir.join("systems");
    if !systems_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut systems = Vec::new();
    for entry in std::fs::read_dir(&systems_dir)? {
        let path = entry?.path();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(SYSTEM_SUFFIX))
            .map(str::to_string);
        if let Some(name) = name {
            systems.push((name, path));
        }
    }
    systems.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(systems)
}
