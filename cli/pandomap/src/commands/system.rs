//! `pandomap validate`, `pandomap template`, and `pandomap presets`.

use std::path::Path;

use anyhow::Result;

use pando_sysconfig::{
    discover_systems, generate_template, validate_system, ConfigError, SystemConfig,
};

/// Validate `system`, printing every issue. Fails if any issue is an error.
pub fn validate(system: &SystemConfig) -> Result<()> {
    let issues = match validate_system(system) {
        Ok(()) => {
            println!("System '{}' is valid.", system.name);
            return Ok(());
        }
        Err(issues) => issues,
    };

    for issue in &issues {
        println!("  [{}] {}", issue.severity, issue.message);
    }
    let errors = issues.iter().filter(|i| i.is_error()).count();
    if errors > 0 {
        return Err(ConfigError::Validation {
            detail: format!("system '{}' has {errors} error(s)", system.name),
        }
        .into());
    }
    println!(
        "System '{}' is valid with {} warning(s).",
        system.name,
        issues.len()
    );
    Ok(())
}

/// Print a template `.system.toml`.
pub fn template(name: &str) -> Result<()> {
    print!("{}", generate_template(name)?);
    Ok(())
}

/// List all built-in presets and the systems defined under `project_dir`.
pub fn presets(project_dir: &Path) -> Result<()> {
    println!("Built-in presets:");
    println!();
    for (name, description) in SystemConfig::builtin_presets() {
        println!("  {name:<15} {description}");
    }

    let systems = discover_systems(project_dir)?;
    if !systems.is_empty() {
        println!();
        println!("Project systems:");
        println!();
        for (name, path) in &systems {
            println!("  {name:<15} {}", path.display());
        }
    }
    println!();
    println!("Use 'pandomap --preset <name> validate' or 'pandomap --config <file> validate' to check one.");
    Ok(())
}
