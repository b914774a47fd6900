//! Complete system model.
//!
//! Combines the topology with the sizing of each memory tier into the
//! description the simulator build consumes.

use serde::{Deserialize, Serialize};

use pando_addrmap::{
    AddressMap, CtrlAddressBuilder, DramAddressBuilder, L1spAddressBuilder, L2spAddressBuilder,
    TopologyConfig, TopologyDescriptor,
};

use crate::banks::{self, BankRange};
use crate::error::Result;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Per-core scratchpad sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScratchpadConfig {
    /// Bytes per core.
    pub size: u64,
}

/// Per-core control register window sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CtrlConfig {
    /// Bytes of MMIO space per core.
    pub size: u64,
}

impl Default for CtrlConfig {
    fn default() -> Self {
        Self { size: 4 * KIB }
    }
}

/// A memory split into interleaved banks (L2SP per pod, DRAM per PXN).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BankedMemoryConfig {
    /// Total bytes across all banks.
    pub size: u64,
    /// Number of banks.
    pub banks: u64,
    /// Stripe size in bytes; 0 means one bank-sized stripe per bank.
    #[serde(default)]
    pub interleave: u64,
}

impl BankedMemoryConfig {
    /// Bytes held by each bank.
    pub fn bank_size(&self) -> u64 {
        self.size.checked_div(self.banks).unwrap_or(0)
    }

    /// Effective stripe size.
    pub fn interleave_size(&self) -> u64 {
        if self.interleave == 0 {
            self.bank_size()
        } else {
            self.interleave
        }
    }

    /// Distance between consecutive stripes of one bank.
    pub fn interleave_step(&self) -> u64 {
        self.interleave_size().saturating_mul(self.banks)
    }
}

/// A complete system description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SystemConfig {
    /// System name (e.g., "pandohammer").
    pub name: String,
    /// Number of PXNs.
    pub num_pxn: u64,
    /// Pods per PXN.
    pub pxn_pods: u64,
    /// Cores per pod.
    pub pod_cores: u64,
    /// Hardware threads per core.
    #[serde(default = "default_core_threads")]
    pub core_threads: u64,
    /// Per-core L1 scratchpad.
    pub l1sp: ScratchpadConfig,
    /// Per-pod L2 scratchpad.
    pub l2sp: BankedMemoryConfig,
    /// Per-PXN DRAM.
    pub dram: BankedMemoryConfig,
    /// Per-core control registers.
    #[serde(default)]
    pub ctrl: CtrlConfig,
}

fn default_core_threads() -> u64 {
    16
}

impl TopologyDescriptor for SystemConfig {
    fn pxns(&self) -> u64 {
        self.num_pxn
    }

    fn pods(&self) -> u64 {
        self.pxn_pods
    }

    fn cores(&self) -> u64 {
        self.pod_cores
    }
}

impl SystemConfig {
    /// The topology as a plain value.
    pub fn topology(&self) -> TopologyConfig {
        TopologyConfig::from_descriptor(self)
    }

    /// Plan the address map for this system.
    pub fn address_map(&self) -> Result<AddressMap> {
        let map = AddressMap::new(self)?;
        log::debug!(
            "system '{}': address map planned for {} cores",
            self.name,
            self.topology().total_cores().unwrap_or(u64::MAX)
        );
        Ok(map)
    }

    /// Range builder for per-core L1 scratchpads.
    pub fn l1sp_builder<'a>(&self, map: &'a AddressMap) -> Result<L1spAddressBuilder<'a>> {
        Ok(L1spAddressBuilder::new(map, self.l1sp.size)?)
    }

    /// Range builder for per-core control register windows.
    pub fn ctrl_builder<'a>(&self, map: &'a AddressMap) -> Result<CtrlAddressBuilder<'a>> {
        Ok(CtrlAddressBuilder::new(map, self.ctrl.size)?)
    }

    /// Range builder for the L2 scratchpad banks of a pod.
    pub fn l2sp_builder<'a>(&self, map: &'a AddressMap) -> Result<L2spAddressBuilder<'a>> {
        Ok(L2spAddressBuilder::new(
            map,
            self.l2sp.bank_size(),
            self.l2sp.interleave_size(),
            self.l2sp.interleave_step(),
        )?)
    }

    /// Range builder for the DRAM banks of a PXN.
    pub fn dram_builder<'a>(&self, map: &'a AddressMap) -> Result<DramAddressBuilder<'a>> {
        Ok(DramAddressBuilder::new(
            map,
            self.dram.bank_size(),
            self.dram.interleave_size(),
            self.dram.interleave_step(),
        )?)
    }

    /// Every bank of every tier with its address range.
    pub fn memory_banks(&self) -> Result<Vec<BankRange>> {
        let map = self.address_map()?;
        banks::memory_banks(self, &map)
    }

    /// The smallest system: one core, unbanked memories.
    pub fn single_core() -> Self {
        Self {
            name: "single-core".into(),
            num_pxn: 1,
            pxn_pods: 1,
            pod_cores: 1,
            core_threads: default_core_threads(),
            l1sp: ScratchpadConfig { size: 128 * KIB },
            l2sp: BankedMemoryConfig {
                size: MIB,
                banks: 1,
                interleave: 0,
            },
            dram: BankedMemoryConfig {
                size: GIB,
                banks: 1,
                interleave: 0,
            },
            ctrl: CtrlConfig::default(),
        }
    }

    /// One PXN of 8 pods with 64 cores each, banked and 64-byte interleaved.
    pub fn pandohammer() -> Self {
        Self {
            name: "pandohammer".into(),
            num_pxn: 1,
            pxn_pods: 8,
            pod_cores: 64,
            core_threads: default_core_threads(),
            l1sp: ScratchpadConfig { size: 128 * KIB },
            l2sp: BankedMemoryConfig {
                size: 4 * MIB,
                banks: 4,
                interleave: 64,
            },
            dram: BankedMemoryConfig {
                size: GIB,
                banks: 8,
                interleave: 64,
            },
            ctrl: CtrlConfig::default(),
        }
    }

    /// `pxns` PXNs of 4 pods with 16 cores each.
    pub fn multi_pxn(pxns: u64) -> Self {
        Self {
            name: format!("multi-pxn-{pxns}"),
            num_pxn: pxns,
            pxn_pods: 4,
            pod_cores: 16,
            core_threads: default_core_threads(),
            l1sp: ScratchpadConfig { size: 64 * KIB },
            l2sp: BankedMemoryConfig {
                size: MIB,
                banks: 2,
                interleave: 64,
            },
            dram: BankedMemoryConfig {
                size: GIB,
                banks: 4,
                interleave: 4 * KIB,
            },
            ctrl: CtrlConfig::default(),
        }
    }

    /// Look up a built-in preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "single-core" => Some(Self::single_core()),
            "pandohammer" => Some(Self::pandohammer()),
            "multi-pxn" => Some(Self::multi_pxn(4)),
            _ => None,
        }
    }

    /// Built-in preset names with a one-line description.
    pub fn builtin_presets() -> Vec<(&'static str, &'static str)> {
        vec![
            ("single-core", "1 PXN x 1 pod x 1 core, unbanked memories"),
            (
                "pandohammer",
                "1 PXN x 8 pods x 64 cores, 4 L2SP banks, 8 DRAM banks, 64 B interleave",
            ),
            (
                "multi-pxn",
                "4 PXNs x 4 pods x 16 cores, 2 L2SP banks, 4 DRAM banks",
            ),
        ]
    }
}
