//! Topology descriptors consumed when planning an address layout.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Anything that can report the machine's topology cardinalities.
pub trait TopologyDescriptor {
    /// Number of PXNs in the machine.
    fn pxns(&self) -> u64;
    /// Number of pods in each PXN.
    fn pods(&self) -> u64;
    /// Number of cores in each pod.
    fn cores(&self) -> u64;
}

/// An explicit, immutable topology: PXN count, pods per PXN, cores per pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TopologyConfig {
    /// Number of PXNs.
    pub pxns: u64,
    /// Pods per PXN.
    pub pods: u64,
    /// Cores per pod.
    pub cores: u64,
}

impl TopologyConfig {
    /// Create a topology from its three counts.
    pub const fn new(pxns: u64, pods: u64, cores: u64) -> Self {
        Self { pxns, pods, cores }
    }

    /// Capture any descriptor as a plain value.
    pub fn from_descriptor(descriptor: &impl TopologyDescriptor) -> Self {
        Self::new(descriptor.pxns(), descriptor.pods(), descriptor.cores())
    }

    /// Total number of cores in the machine, if it fits in a `u64`.
    pub fn total_cores(&self) -> Option<u64> {
        self.pxns.checked_mul(self.pods)?.checked_mul(self.cores)
    }

}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl TopologyDescriptor for TopologyConfig {
    fn pxns(&self) -> u64 {
        self.pxns
    }

    fn pods(&self) -> u64 {
        self.pods
    }

    fn cores(&self) -> u64 {
        self.cores
    }
}

/// Fully-qualified identity of one core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoreId {
    /// PXN the core belongs to.
    pub pxn: u64,
    /// Pod within the PXN.
    pub pod: u64,
    /// Core within the pod.
    pub core: u64,
}

impl CoreId {
    /// Create a core identity.
    pub const fn new(pxn: u64, pod: u64, core: u64) -> Self {
        Self { pxn, pod, core }
    }
}

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pxn{}.pod{}.core{}", self.pxn, self.pod, self.core)
    }
}
