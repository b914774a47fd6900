//! Structured description of a single address.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AddressError, Result};
use crate::topology::CoreId;

/// Which memory tier an address targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    /// Per-core scratchpad.
    L1sp,
    /// Per-pod shared scratchpad.
    L2sp,
    /// Per-PXN main memory.
    Dram,
    /// A core's control register window.
    Ctrl,
}

impl AddressType {
    /// All tiers, innermost first.
    pub const ALL: [AddressType; 4] = [Self::L1sp, Self::L2sp, Self::Dram, Self::Ctrl];

    /// Upper-case tier name used in renderings and generated code.
    pub fn name(self) -> &'static str {
        match self {
            Self::L1sp => "L1SP",
            Self::L2sp => "L2SP",
            Self::Dram => "DRAM",
            Self::Ctrl => "CTRL",
        }
    }

    /// Whether absolute addresses of this tier carry a pod coordinate.
    pub fn has_pod(self) -> bool {
        !matches!(self, Self::Dram)
    }

    /// Whether absolute addresses of this tier carry a core coordinate.
    pub fn has_core(self) -> bool {
        matches!(self, Self::L1sp | Self::Ctrl)
    }

    /// Whether the tier may be addressed relative to the issuing core.
    pub fn allows_relative(self) -> bool {
        !matches!(self, Self::Ctrl)
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AddressType {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "l1sp" => Ok(Self::L1sp),
            "l2sp" => Ok(Self::L2sp),
            "dram" => Ok(Self::Dram),
            "ctrl" => Ok(Self::Ctrl),
            other => Err(AddressError::invalid_kind(format!(
                "unknown address type '{other}' (expected l1sp, l2sp, dram, or ctrl)"
            ))),
        }
    }
}

/// Whether an address carries its own topology coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressMode {
    /// Fully qualified, routable from anywhere in the machine.
    Absolute,
    /// Interpreted against the issuing core's own identity.
    #[default]
    Relative,
}

impl AddressMode {
    /// Upper-case mode name used in renderings.
    pub fn name(self) -> &'static str {
        match self {
            Self::Absolute => "ABSOLUTE",
            Self::Relative => "RELATIVE",
        }
    }
}

impl fmt::Display for AddressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AddressMode {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "absolute" | "abs" => Ok(Self::Absolute),
            "relative" | "rel" => Ok(Self::Relative),
            other => Err(AddressError::invalid_kind(format!(
                "unknown address mode '{other}' (expected absolute or relative)"
            ))),
        }
    }
}

/// A validated address description: tier, mode, coordinates, and offset.
///
/// Only valid combinations can be constructed. Absolute addresses carry
/// exactly the coordinates their tier needs (DRAM: pxn; L2SP: pxn, pod;
/// L1SP and CTRL: pxn, pod, core). Relative addresses carry none, and CTRL
/// is never relative.
///
/// A relative address produced by [`AddressMap::decode`](crate::AddressMap::decode)
/// additionally records the core it was decoded on behalf of, see
/// [`AddressInfo::issuer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressInfo {
    kind: AddressType,
    mode: AddressMode,
    offset: u64,
    pxn: Option<u64>,
    pod: Option<u64>,
    core: Option<u64>,
    issuer: Option<CoreId>,
}

impl AddressInfo {
    const fn absolute(
        kind: AddressType,
        pxn: u64,
        pod: Option<u64>,
        core: Option<u64>,
        offset: u64,
    ) -> Self {
        Self {
            kind,
            mode: AddressMode::Absolute,
            offset,
            pxn: Some(pxn),
            pod,
            core,
            issuer: None,
        }
    }

    const fn relative(kind: AddressType, offset: u64) -> Self {
        Self {
            kind,
            mode: AddressMode::Relative,
            offset,
            pxn: None,
            pod: None,
            core: None,
            issuer: None,
        }
    }

    /// Absolute address in a core's L1 scratchpad.
    pub const fn absolute_l1sp(pxn: u64, pod: u64, core: u64, offset: u64) -> Self {
        Self::absolute(AddressType::L1sp, pxn, Some(pod), Some(core), offset)
    }

    /// Absolute address in a core's control register window.
    pub const fn absolute_ctrl(pxn: u64, pod: u64, core: u64, offset: u64) -> Self {
        Self::absolute(AddressType::Ctrl, pxn, Some(pod), Some(core), offset)
    }

    /// Absolute address in a pod's L2 scratchpad.
    pub const fn absolute_l2sp(pxn: u64, pod: u64, offset: u64) -> Self {
        Self::absolute(AddressType::L2sp, pxn, Some(pod), None, offset)
    }

    /// Absolute address in a PXN's DRAM.
    pub const fn absolute_dram(pxn: u64, offset: u64) -> Self {
        Self::absolute(AddressType::Dram, pxn, None, None, offset)
    }

    /// Address in the issuing core's own L1 scratchpad.
    pub const fn relative_l1sp(offset: u64) -> Self {
        Self::relative(AddressType::L1sp, offset)
    }

    /// Address in the issuing core's pod's L2 scratchpad.
    pub const fn relative_l2sp(offset: u64) -> Self {
        Self::relative(AddressType::L2sp, offset)
    }

    /// Address in the issuing core's PXN's DRAM.
    pub const fn relative_dram(offset: u64) -> Self {
        Self::relative(AddressType::Dram, offset)
    }

    /// Base of the issuing core's L1 scratchpad.
    pub const fn relative_l1sp_base() -> Self {
        Self::relative_l1sp(0)
    }

    /// Base of the issuing core's pod's L2 scratchpad.
    pub const fn relative_l2sp_base() -> Self {
        Self::relative_l2sp(0)
    }

    /// Base of the issuing core's PXN's DRAM.
    pub const fn relative_dram_base() -> Self {
        Self::relative_dram(0)
    }

    /// Absolute address of `kind` at `offset` owned by (or shared with) `id`.
    ///
    /// Coordinates that `kind` does not carry are dropped.
    pub const fn absolute_for(kind: AddressType, id: CoreId, offset: u64) -> Self {
        match kind {
            AddressType::L1sp => Self::absolute_l1sp(id.pxn, id.pod, id.core, offset),
            AddressType::Ctrl => Self::absolute_ctrl(id.pxn, id.pod, id.core, offset),
            AddressType::L2sp => Self::absolute_l2sp(id.pxn, id.pod, offset),
            AddressType::Dram => Self::absolute_dram(id.pxn, offset),
        }
    }

    /// Start a fluent description that is validated by
    /// [`AddressInfoBuilder::build`].
    pub fn builder() -> AddressInfoBuilder {
        AddressInfoBuilder::default()
    }

    /// Record the core a relative address is interpreted against.
    ///
    /// Absolute addresses are returned unchanged.
    pub fn with_issuer(mut self, issuer: CoreId) -> Self {
        if self.is_relative() {
            self.issuer = Some(issuer);
        }
        self
    }

    /// The memory tier.
    pub fn kind(&self) -> AddressType {
        self.kind
    }

    /// The addressing mode.
    pub fn mode(&self) -> AddressMode {
        self.mode
    }

    /// Byte offset within the tier.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// PXN coordinate, for absolute addresses.
    pub fn pxn(&self) -> Option<u64> {
        self.pxn
    }

    /// Pod coordinate, for absolute L2SP, L1SP and CTRL addresses.
    pub fn pod(&self) -> Option<u64> {
        self.pod
    }

    /// Core coordinate, for absolute L1SP and CTRL addresses.
    pub fn core(&self) -> Option<u64> {
        self.core
    }

    /// The core a decoded relative address belongs to, if known.
    pub fn issuer(&self) -> Option<CoreId> {
        self.issuer
    }

    pub fn is_l1sp(&self) -> bool {
        self.kind == AddressType::L1sp
    }

    pub fn is_l2sp(&self) -> bool {
        self.kind == AddressType::L2sp
    }

    pub fn is_dram(&self) -> bool {
        self.kind == AddressType::Dram
    }

    pub fn is_core_ctrl(&self) -> bool {
        self.kind == AddressType::Ctrl
    }

    pub fn is_absolute(&self) -> bool {
        self.mode == AddressMode::Absolute
    }

    pub fn is_relative(&self) -> bool {
        self.mode == AddressMode::Relative
    }
}

impl fmt::Display for AddressInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{},{},", self.mode, self.kind)?;
        if let Some(pxn) = self.pxn {
            write!(f, "PXN={pxn},")?;
        }
        if let Some(pod) = self.pod {
            write!(f, "POD={pod},")?;
        }
        if let Some(core) = self.core {
            write!(f, "CORE={core},")?;
        }
        write!(f, "0x{:x}}}", self.offset)
    }
}

/// Fluent, unvalidated address description.
///
/// Setters may be chained in any order; [`AddressInfoBuilder::build`] checks
/// the combination. The mode defaults to relative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressInfoBuilder {
    kind: Option<AddressType>,
    mode: AddressMode,
    offset: u64,
    pxn: Option<u64>,
    pod: Option<u64>,
    core: Option<u64>,
}

impl AddressInfoBuilder {
    pub fn set_l1sp(mut self) -> Self {
        self.kind = Some(AddressType::L1sp);
        self
    }

    pub fn set_l2sp(mut self) -> Self {
        self.kind = Some(AddressType::L2sp);
        self
    }

    pub fn set_dram(mut self) -> Self {
        self.kind = Some(AddressType::Dram);
        self
    }

    pub fn set_core_ctrl(mut self) -> Self {
        self.kind = Some(AddressType::Ctrl);
        self
    }

    /// Set the tier directly.
    pub fn set_type(mut self, kind: AddressType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn set_absolute(mut self) -> Self {
        self.mode = AddressMode::Absolute;
        self
    }

    pub fn set_relative(mut self) -> Self {
        self.mode = AddressMode::Relative;
        self
    }

    /// Set the mode directly.
    pub fn set_mode(mut self, mode: AddressMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn set_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn set_pxn(mut self, pxn: u64) -> Self {
        self.pxn = Some(pxn);
        self
    }

    pub fn set_pod(mut self, pod: u64) -> Self {
        self.pod = Some(pod);
        self
    }

    pub fn set_core(mut self, core: u64) -> Self {
        self.core = Some(core);
        self
    }

    /// Validate the combination and produce an [`AddressInfo`].
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::InvalidAddressKind`] if no tier was set, if a
    /// relative address names CTRL or carries coordinates, or if an absolute
    /// address is missing a coordinate its tier needs or carries one it
    /// does not.
    pub fn build(self) -> Result<AddressInfo> {
        let kind = self
            .kind
            .ok_or_else(|| AddressError::invalid_kind("no address type set"))?;

        match self.mode {
            AddressMode::Relative => {
                if !kind.allows_relative() {
                    return Err(AddressError::invalid_kind(format!(
                        "{kind} addresses must be absolute"
                    )));
                }
                for (name, value) in [("pxn", self.pxn), ("pod", self.pod), ("core", self.core)] {
                    if value.is_some() {
                        return Err(AddressError::invalid_kind(format!(
                            "relative {kind} address cannot carry a {name} coordinate"
                        )));
                    }
                }
                Ok(AddressInfo::relative(kind, self.offset))
            }
            AddressMode::Absolute => {
                let pxn = require(kind, "pxn", self.pxn, true)?;
                let pod = require(kind, "pod", self.pod, kind.has_pod())?;
                let core = require(kind, "core", self.core, kind.has_core())?;
                Ok(AddressInfo::absolute(
                    kind,
                    pxn.unwrap_or_default(),
                    pod,
                    core,
                    self.offset,
                ))
            }
        }
    }
}

fn require(
    kind: AddressType,
    name: &'static str,
    value: Option<u64>,
    needed: bool,
) -> Result<Option<u64>> {
    match (value, needed) {
        (Some(_), true) | (None, false) => Ok(value),
        (None, true) => Err(AddressError::invalid_kind(format!(
            "absolute {kind} address requires a {name} coordinate"
        ))),
        (Some(_), false) => Err(AddressError::invalid_kind(format!(
            "absolute {kind} address cannot carry a {name} coordinate"
        ))),
    }
}

impl TryFrom<AddressInfoBuilder> for AddressInfo {
    type Error = AddressError;

    fn try_from(builder: AddressInfoBuilder) -> Result<Self> {
        builder.build()
    }
}

/// Conversion into a validated [`AddressInfo`], accepted by
/// [`AddressMap::encode`](crate::AddressMap::encode).
pub trait IntoAddressInfo {
    /// Produce the validated description.
    fn into_address_info(self) -> Result<AddressInfo>;
}

impl IntoAddressInfo for AddressInfo {
    fn into_address_info(self) -> Result<AddressInfo> {
        Ok(self)
    }
}

impl IntoAddressInfo for &AddressInfo {
    fn into_address_info(self) -> Result<AddressInfo> {
        Ok(*self)
    }
}

impl IntoAddressInfo for AddressInfoBuilder {
    fn into_address_info(self) -> Result<AddressInfo> {
        self.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_factories_carry_tier_coordinates() {
        let dram = AddressInfo::absolute_dram(3, 0x40);
        assert!(dram.is_dram() && dram.is_absolute());
        assert_eq!((dram.pxn(), dram.pod(), dram.core()), (Some(3), None, None));

        let l2 = AddressInfo::absolute_l2sp(1, 2, 0x10);
        assert_eq!((l2.pxn(), l2.pod(), l2.core()), (Some(1), Some(2), None));

        let l1 = AddressInfo::absolute_l1sp(1, 2, 3, 0);
        assert_eq!((l1.pxn(), l1.pod(), l1.core()), (Some(1), Some(2), Some(3)));

        let ctrl = AddressInfo::absolute_ctrl(0, 0, 7, 8);
        assert!(ctrl.is_core_ctrl());
        assert_eq!(ctrl.core(), Some(7));
    }

    #[test]
    fn relative_factories_carry_no_coordinates() {
        for info in [
            AddressInfo::relative_l1sp(4),
            AddressInfo::relative_l2sp(4),
            AddressInfo::relative_dram(4),
        ] {
            assert!(info.is_relative());
            assert_eq!((info.pxn(), info.pod(), info.core()), (None, None, None));
            assert_eq!(info.issuer(), None);
        }
        assert_eq!(AddressInfo::relative_dram_base().offset(), 0);
    }

    #[test]
    fn builder_matches_factory() {
        let built = AddressInfo::builder()
            .set_absolute()
            .set_l2sp()
            .set_pxn(1)
            .set_pod(3)
            .set_offset(0x100)
            .build()
            .unwrap();
        assert_eq!(built, AddressInfo::absolute_l2sp(1, 3, 0x100));
    }

    #[test]
    fn builder_rejects_relative_ctrl() {
        let err = AddressInfo::builder()
            .set_relative()
            .set_core_ctrl()
            .build()
            .unwrap_err();
        assert!(matches!(err, AddressError::InvalidAddressKind { .. }));
    }

    #[test]
    fn builder_rejects_missing_type() {
        let err = AddressInfo::builder().set_absolute().build().unwrap_err();
        assert!(matches!(err, AddressError::InvalidAddressKind { .. }));
        assert!(err.to_string().contains("no address type"));
    }

    #[test]
    fn builder_rejects_coordinates_on_relative() {
        let err = AddressInfo::builder()
            .set_relative()
            .set_l1sp()
            .set_core(2)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("core coordinate"));
    }

    #[test]
    fn builder_checks_absolute_coordinates() {
        let missing = AddressInfo::builder()
            .set_absolute()
            .set_l1sp()
            .set_pxn(0)
            .set_pod(0)
            .build();
        assert!(missing.unwrap_err().to_string().contains("requires a core"));

        let extra = AddressInfo::builder()
            .set_absolute()
            .set_dram()
            .set_pxn(0)
            .set_pod(1)
            .build();
        assert!(extra.unwrap_err().to_string().contains("cannot carry a pod"));
    }

    #[test]
    fn last_type_setter_wins() {
        let info = AddressInfo::builder()
            .set_l1sp()
            .set_dram()
            .set_offset(1)
            .build()
            .unwrap();
        assert!(info.is_dram());
        assert!(!info.is_l1sp());
    }

    #[test]
    fn issuer_only_attaches_to_relative() {
        let id = CoreId::new(1, 2, 3);
        assert_eq!(AddressInfo::relative_l1sp(0).with_issuer(id).issuer(), Some(id));
        assert_eq!(AddressInfo::absolute_dram(0, 0).with_issuer(id).issuer(), None);
    }

    #[test]
    fn rendering_varies_with_type_and_mode() {
        assert_eq!(
            AddressInfo::absolute_dram(2, 0x40).to_string(),
            "{ABSOLUTE,DRAM,PXN=2,0x40}"
        );
        assert_eq!(
            AddressInfo::absolute_l2sp(0, 1, 0x8).to_string(),
            "{ABSOLUTE,L2SP,PXN=0,POD=1,0x8}"
        );
        assert_eq!(
            AddressInfo::absolute_l1sp(0, 1, 5, 0xff).to_string(),
            "{ABSOLUTE,L1SP,PXN=0,POD=1,CORE=5,0xff}"
        );
        assert_eq!(
            AddressInfo::absolute_ctrl(0, 0, 1, 0).to_string(),
            "{ABSOLUTE,CTRL,PXN=0,POD=0,CORE=1,0x0}"
        );
        assert_eq!(AddressInfo::relative_l2sp(0x20).to_string(), "{RELATIVE,L2SP,0x20}");
    }

    #[test]
    fn parse_type_and_mode() {
        assert_eq!("DRAM".parse::<AddressType>().unwrap(), AddressType::Dram);
        assert_eq!("ctrl".parse::<AddressType>().unwrap(), AddressType::Ctrl);
        assert!("l3sp".parse::<AddressType>().is_err());
        assert_eq!("abs".parse::<AddressMode>().unwrap(), AddressMode::Absolute);
        assert!("sideways".parse::<AddressMode>().is_err());
    }

    #[test]
    fn into_address_info_validates_builders() {
        let ok = AddressInfo::builder().set_l1sp().into_address_info();
        assert_eq!(ok.unwrap(), AddressInfo::relative_l1sp(0));
        let bad = AddressInfo::builder().set_core_ctrl().into_address_info();
        assert!(bad.is_err());
    }
}
