//! Selecting the system a command operates on.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use pando_sysconfig::{load_system_toml, SystemConfig};

/// Where the system definition comes from: a `.system.toml` file, a
/// built-in preset, or explicit counts on top of the single-core preset.
#[derive(Debug, Default, Args)]
pub struct TopologySource {
    /// System definition file (.system.toml)
    #[arg(long, global = true, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Built-in system preset (see `pandomap presets`)
    #[arg(long, global = true)]
    pub preset: Option<String>,

    /// Number of PXNs
    #[arg(long, global = true)]
    pub num_pxn: Option<u64>,

    /// Pods per PXN
    #[arg(long, global = true)]
    pub pxn_pods: Option<u64>,

    /// Cores per pod
    #[arg(long, global = true)]
    pub pod_cores: Option<u64>,
}

impl TopologySource {
    /// Load or build the selected system.
    ///
    /// Explicit counts override whatever the file or preset specifies.
    pub fn resolve(&self) -> Result<SystemConfig> {
        let mut system = if let Some(path) = &self.config {
            load_system_toml(path).with_context(|| format!("loading {}", path.display()))?
        } else if let Some(name) = &self.preset {
            match SystemConfig::preset(name) {
                Some(system) => system,
                None => {
                    bail!("unknown preset: '{name}'. Use 'pandomap presets' to see available presets.")
                }
            }
        } else {
            SystemConfig::single_core()
        };

        let overridden = self.num_pxn.is_some() || self.pxn_pods.is_some() || self.pod_cores.is_some();
        if let Some(n) = self.num_pxn {
            system.num_pxn = n;
        }
        if let Some(n) = self.pxn_pods {
            system.pxn_pods = n;
        }
        if let Some(n) = self.pod_cores {
            system.pod_cores = n;
        }
        if overridden && self.config.is_none() && self.preset.is_none() {
            system.name = format!(
                "custom-{}x{}x{}",
                system.num_pxn, system.pxn_pods, system.pod_cores
            );
        }

        log::info!(
            "system '{}': {} pxns x {} pods x {} cores",
            system.name,
            system.num_pxn,
            system.pxn_pods,
            system.pod_cores
        );
        Ok(system)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pando_sysconfig::generate_template;

    #[test]
    fn defaults_to_single_core() {
        let system = TopologySource::default().resolve().unwrap();
        assert_eq!(system, SystemConfig::single_core());
    }

    #[test]
    fn counts_override_single_core() {
        let source = TopologySource {
            num_pxn: Some(2),
            pod_cores: Some(8),
            ..Default::default()
        };
        let system = source.resolve().unwrap();
        assert_eq!(
            (system.num_pxn, system.pxn_pods, system.pod_cores),
            (2, 1, 8)
        );
        assert_eq!(system.name, "custom-2x1x8");
    }

    #[test]
    fn preset_by_name() {
        let source = TopologySource {
            preset: Some("pandohammer".into()),
            ..Default::default()
        };
        assert_eq!(source.resolve().unwrap(), SystemConfig::pandohammer());
    }

    #[test]
    fn counts_override_preset_but_keep_name() {
        let source = TopologySource {
            preset: Some("pandohammer".into()),
            pxn_pods: Some(2),
            ..Default::default()
        };
        let system = source.resolve().unwrap();
        assert_eq!(system.pxn_pods, 2);
        assert_eq!(system.name, "pandohammer");
    }

    #[test]
    fn unknown_preset() {
        let source = TopologySource {
            preset: Some("nonexistent".into()),
            ..Default::default()
        };
        let err = source.resolve().unwrap_err();
        assert!(err.to_string().contains("unknown preset"));
    }

    #[test]
    fn config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lab.system.toml");
        std::fs::write(&path, generate_template("lab").unwrap()).unwrap();
        let source = TopologySource {
            config: Some(path),
            ..Default::default()
        };
        assert_eq!(source.resolve().unwrap().name, "lab");
    }

    #[test]
    fn missing_config_file_has_context() {
        let source = TopologySource {
            config: Some(PathBuf::from("/nonexistent/x.system.toml")),
            ..Default::default()
        };
        let err = source.resolve().unwrap_err();
        assert!(format!("{err:#}").contains("loading /nonexistent/x.system.toml"));
    }
}
