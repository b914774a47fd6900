//! Enumeration of every memory bank in a system with its address range.

use std::fmt;

use serde::Serialize;

use pando_addrmap::{AddressMap, AddressRange, AddressType};

use crate::error::Result;
use crate::system::SystemConfig;

/// One memory bank (or control window) and the range its decoder claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BankRange {
    /// Memory tier.
    pub kind: AddressType,
    /// Owning PXN.
    pub pxn: u64,
    /// Owning pod (L1SP, CTRL, and L2SP banks).
    pub pod: Option<u64>,
    /// Owning core (L1SP and CTRL).
    pub core: Option<u64>,
    /// Bank index within its region.
    pub bank: u64,
    /// Configured address range.
    pub range: AddressRange,
}

impl BankRange {
    /// Component-style label, e.g. `pxn0_pod1_l2sp2`.
    pub fn label(&self) -> String {
        let mut label = format!("pxn{}", self.pxn);
        if let Some(pod) = self.pod {
            label.push_str(&format!("_pod{pod}"));
        }
        if let Some(core) = self.core {
            label.push_str(&format!("_core{core}"));
        }
        match self.kind {
            AddressType::L1sp => label.push_str("_l1sp"),
            AddressType::Ctrl => label.push_str("_ctrl"),
            AddressType::L2sp => label.push_str(&format!("_l2sp{}", self.bank)),
            AddressType::Dram => label.push_str(&format!("_dram{}", self.bank)),
        }
        label
    }
}

impl fmt::Display for BankRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<24} {}", self.label(), self.range)
    }
}

/// Compute the range of every bank in `system`.
///
/// Banks are listed per PXN: its DRAM banks, then per pod its L2SP banks,
/// then per core its L1SP and control window.
pub fn memory_banks(system: &SystemConfig, map: &AddressMap) -> Result<Vec<BankRange>> {
    let l1sp = system.l1sp_builder(map)?;
    let ctrl = system.ctrl_builder(map)?;
    let l2sp = system.l2sp_builder(map)?;
    let dram = system.dram_builder(map)?;

    let mut banks = Vec::new();
    for pxn in 0..system.num_pxn {
        for bank in 0..dram.base().banks() {
            banks.push(BankRange {
                kind: AddressType::Dram,
                pxn,
                pod: None,
                core: None,
                bank,
                range: dram.range(pxn, bank)?,
            });
        }
        for pod in 0..system.pxn_pods {
            for bank in 0..l2sp.base().banks() {
                banks.push(BankRange {
                    kind: AddressType::L2sp,
                    pxn,
                    pod: Some(pod),
                    core: None,
                    bank,
                    range: l2sp.range(pxn, pod, bank)?,
                });
            }
            for core in 0..system.pod_cores {
                banks.push(BankRange {
                    kind: AddressType::L1sp,
                    pxn,
                    pod: Some(pod),
                    core: Some(core),
                    bank: 0,
                    range: l1sp.range(pxn, pod, core)?,
                });
                banks.push(BankRange {
                    kind: AddressType::Ctrl,
                    pxn,
                    pod: Some(pod),
                    core: Some(core),
                    bank: 0,
                    range: ctrl.range(pxn, pod, core)?,
                });
            }
        }
    }
    log::debug!("system '{}': {} bank ranges", system.name, banks.len());
    Ok(banks)
}
