//! Bit layout planning.
//!
//! The layout of an address word is fixed at the top and bottom and variable
//! in the middle:
//!
//! ```text
//! absolute:  63 | 62      | 61      | 60 ... pxn | pod | core ... 30 | 29      | 28 ... 0
//!            1  | IS_DRAM | IS_L2SP |   id fields, packed downward    | IS_CTRL | offset
//! relative:  63 | 62 ... 31 | 30      | 29      | 28 ... 0
//!            0  |  unused   | IS_DRAM | IS_L2SP | offset
//! ```
//!
//! The id fields are sized from the topology (`ceil(log2(count))` bits each)
//! and tiers that carry fewer coordinates extend their offset field upward
//! into the space the missing coordinates would use: absolute DRAM offsets
//! run up to the bottom of the pxn field and absolute L2SP offsets up to the
//! bottom of the pod field. Absolute L1SP and CTRL share the `[28:0]` offset
//! field and are told apart only by `IS_CTRL`. Relative DRAM offsets use
//! bit 29 as well.

use std::fmt;

use crate::bitfield::Bitfield;
use crate::error::{AddressError, Result};
use crate::info::{AddressMode, AddressType};
use crate::topology::{TopologyConfig, TopologyDescriptor};

const IS_ABSOLUTE: Bitfield = Bitfield::bit(63);
const ABSOLUTE_IS_DRAM: Bitfield = Bitfield::bit(62);
const ABSOLUTE_IS_L2SP: Bitfield = Bitfield::bit(61);
const ABSOLUTE_IS_CTRL: Bitfield = Bitfield::bit(29);
const ABSOLUTE_L1SP_OFFSET: Bitfield = Bitfield::new(28, 0);
const RELATIVE_IS_DRAM: Bitfield = Bitfield::bit(30);
const RELATIVE_IS_L2SP: Bitfield = Bitfield::bit(29);
const RELATIVE_L1SP_OFFSET: Bitfield = Bitfield::new(28, 0);
const RELATIVE_L2SP_OFFSET: Bitfield = Bitfield::new(28, 0);
const RELATIVE_DRAM_OFFSET: Bitfield = Bitfield::new(29, 0);

/// Bits available to the pxn, pod, and core fields together.
pub const ID_BITS_AVAILABLE: u32 = ABSOLUTE_IS_L2SP.lo() - ABSOLUTE_IS_CTRL.hi() - 1;

/// Every named field of the layout.
///
/// The names are stable and double as C macro prefixes in generated
/// firmware headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldName {
    IsAbsolute,
    AbsoluteIsDram,
    AbsoluteIsL2sp,
    AbsoluteIsCtrl,
    AbsolutePxn,
    AbsolutePod,
    AbsoluteCore,
    AbsoluteDramOffset,
    AbsoluteL2spOffset,
    AbsoluteL1spOffset,
    AbsoluteCtrlOffset,
    RelativeIsDram,
    RelativeIsL2sp,
    RelativeL1spOffset,
    RelativeL2spOffset,
    RelativeDramOffset,
}

impl FieldName {
    /// All fields in header order.
    pub const ALL: [FieldName; 16] = [
        Self::IsAbsolute,
        Self::AbsoluteIsDram,
        Self::AbsoluteIsL2sp,
        Self::AbsoluteIsCtrl,
        Self::AbsolutePxn,
        Self::AbsolutePod,
        Self::AbsoluteCore,
        Self::AbsoluteDramOffset,
        Self::AbsoluteL2spOffset,
        Self::AbsoluteL1spOffset,
        Self::AbsoluteCtrlOffset,
        Self::RelativeIsDram,
        Self::RelativeIsL2sp,
        Self::RelativeL1spOffset,
        Self::RelativeL2spOffset,
        Self::RelativeDramOffset,
    ];

    /// Upper snake case name, e.g. `ABSOLUTE_PXN`.
    pub fn macro_name(self) -> &'static str {
        match self {
            Self::IsAbsolute => "IS_ABSOLUTE",
            Self::AbsoluteIsDram => "ABSOLUTE_IS_DRAM",
            Self::AbsoluteIsL2sp => "ABSOLUTE_IS_L2SP",
            Self::AbsoluteIsCtrl => "ABSOLUTE_IS_CTRL",
            Self::AbsolutePxn => "ABSOLUTE_PXN",
            Self::AbsolutePod => "ABSOLUTE_POD",
            Self::AbsoluteCore => "ABSOLUTE_CORE",
            Self::AbsoluteDramOffset => "ABSOLUTE_DRAM_OFFSET",
            Self::AbsoluteL2spOffset => "ABSOLUTE_L2SP_OFFSET",
            Self::AbsoluteL1spOffset => "ABSOLUTE_L1SP_OFFSET",
            Self::AbsoluteCtrlOffset => "ABSOLUTE_CTRL_OFFSET",
            Self::RelativeIsDram => "RELATIVE_IS_DRAM",
            Self::RelativeIsL2sp => "RELATIVE_IS_L2SP",
            Self::RelativeL1spOffset => "RELATIVE_L1SP_OFFSET",
            Self::RelativeL2spOffset => "RELATIVE_L2SP_OFFSET",
            Self::RelativeDramOffset => "RELATIVE_DRAM_OFFSET",
        }
    }

    /// Whether the field belongs to the absolute encoding.
    pub fn is_absolute(self) -> bool {
        matches!(
            self,
            Self::AbsoluteIsDram
                | Self::AbsoluteIsL2sp
                | Self::AbsoluteIsCtrl
                | Self::AbsolutePxn
                | Self::AbsolutePod
                | Self::AbsoluteCore
                | Self::AbsoluteDramOffset
                | Self::AbsoluteL2spOffset
                | Self::AbsoluteL1spOffset
                | Self::AbsoluteCtrlOffset
        )
    }

    /// Whether the field belongs to the relative encoding.
    pub fn is_relative(self) -> bool {
        self != Self::IsAbsolute && !self.is_absolute()
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.macro_name())
    }
}

/// Number of bits needed to select one of `count` instances.
///
/// A count of one needs no selector bits.
pub fn id_bits(count: u64) -> u32 {
    u64::BITS - count.saturating_sub(1).leading_zeros()
}

/// Field positions for one topology, computed once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressLayout {
    topology: TopologyConfig,
    pxn: Bitfield,
    pod: Bitfield,
    core: Bitfield,
    absolute_dram_offset: Bitfield,
    absolute_l2sp_offset: Bitfield,
}

impl AddressLayout {
    /// Plan the layout for a topology.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Configuration`] if any count is zero or if the
    /// pxn, pod, and core fields together need more than
    /// [`ID_BITS_AVAILABLE`] bits.
    pub fn plan(topology: &impl TopologyDescriptor) -> Result<Self> {
        let topology = TopologyConfig::from_descriptor(topology);
        for (name, count) in [
            ("pxn", topology.pxns),
            ("pod", topology.pods),
            ("core", topology.cores),
        ] {
            if count == 0 {
                return Err(AddressError::configuration(format!(
                    "{name} count must be at least 1"
                )));
            }
        }

        let pxn_bits = id_bits(topology.pxns);
        let pod_bits = id_bits(topology.pods);
        let core_bits = id_bits(topology.cores);
        let id_total = pxn_bits + pod_bits + core_bits;
        if id_total > ID_BITS_AVAILABLE {
            return Err(AddressError::configuration(format!(
                "topology of {} pxns x {} pods x {} cores needs {id_total} id bits \
                 ({pxn_bits}+{pod_bits}+{core_bits}), only {ID_BITS_AVAILABLE} available",
                topology.pxns, topology.pods, topology.cores
            )));
        }

        let pxn = place_below(ABSOLUTE_IS_L2SP.lo(), pxn_bits)?;
        let pod = place_below(pxn.lo(), pod_bits)?;
        let core = place_below(pod.lo(), core_bits)?;
        let absolute_dram_offset = place_below(pxn.lo(), pxn.lo())?;
        let absolute_l2sp_offset = place_below(pod.lo(), pod.lo())?;

        let layout = Self {
            topology,
            pxn,
            pod,
            core,
            absolute_dram_offset,
            absolute_l2sp_offset,
        };
        layout.check_disjoint()?;

        log::debug!(
            "planned address layout for {}x{}x{}: pxn {pxn}, pod {pod}, core {core}, \
             dram offset {absolute_dram_offset}, l2sp offset {absolute_l2sp_offset}",
            topology.pxns,
            topology.pods,
            topology.cores,
        );
        Ok(layout)
    }

    /// The topology this layout was planned for.
    pub fn topology(&self) -> &TopologyConfig {
        &self.topology
    }

    /// Position of a named field.
    pub fn field(&self, name: FieldName) -> Bitfield {
        match name {
            FieldName::IsAbsolute => IS_ABSOLUTE,
            FieldName::AbsoluteIsDram => ABSOLUTE_IS_DRAM,
            FieldName::AbsoluteIsL2sp => ABSOLUTE_IS_L2SP,
            FieldName::AbsoluteIsCtrl => ABSOLUTE_IS_CTRL,
            FieldName::AbsolutePxn => self.pxn,
            FieldName::AbsolutePod => self.pod,
            FieldName::AbsoluteCore => self.core,
            FieldName::AbsoluteDramOffset => self.absolute_dram_offset,
            FieldName::AbsoluteL2spOffset => self.absolute_l2sp_offset,
            FieldName::AbsoluteL1spOffset | FieldName::AbsoluteCtrlOffset => ABSOLUTE_L1SP_OFFSET,
            FieldName::RelativeIsDram => RELATIVE_IS_DRAM,
            FieldName::RelativeIsL2sp => RELATIVE_IS_L2SP,
            FieldName::RelativeL1spOffset => RELATIVE_L1SP_OFFSET,
            FieldName::RelativeL2spOffset => RELATIVE_L2SP_OFFSET,
            FieldName::RelativeDramOffset => RELATIVE_DRAM_OFFSET,
        }
    }

    /// Every named field with its position, in header order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldName, Bitfield)> + '_ {
        FieldName::ALL.into_iter().map(|name| (name, self.field(name)))
    }

    /// Fields that make up one tier/mode encoding: the selector flags that
    /// are tested to reach it, its coordinates, and its offset.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::InvalidAddressKind`] for relative CTRL.
    pub fn encoding(&self, kind: AddressType, mode: AddressMode) -> Result<Vec<FieldName>> {
        use FieldName::*;
        let names = match (mode, kind) {
            (AddressMode::Absolute, AddressType::Dram) => {
                vec![IsAbsolute, AbsoluteIsDram, AbsolutePxn, AbsoluteDramOffset]
            }
            (AddressMode::Absolute, AddressType::L2sp) => vec![
                IsAbsolute,
                AbsoluteIsDram,
                AbsoluteIsL2sp,
                AbsolutePxn,
                AbsolutePod,
                AbsoluteL2spOffset,
            ],
            (AddressMode::Absolute, AddressType::L1sp) => vec![
                IsAbsolute,
                AbsoluteIsDram,
                AbsoluteIsL2sp,
                AbsolutePxn,
                AbsolutePod,
                AbsoluteCore,
                AbsoluteIsCtrl,
                AbsoluteL1spOffset,
            ],
            (AddressMode::Absolute, AddressType::Ctrl) => vec![
                IsAbsolute,
                AbsoluteIsDram,
                AbsoluteIsL2sp,
                AbsolutePxn,
                AbsolutePod,
                AbsoluteCore,
                AbsoluteIsCtrl,
                AbsoluteCtrlOffset,
            ],
            (AddressMode::Relative, AddressType::Dram) => {
                vec![IsAbsolute, RelativeIsDram, RelativeDramOffset]
            }
            (AddressMode::Relative, AddressType::L2sp) => {
                vec![IsAbsolute, RelativeIsDram, RelativeIsL2sp, RelativeL2spOffset]
            }
            (AddressMode::Relative, AddressType::L1sp) => {
                vec![IsAbsolute, RelativeIsDram, RelativeIsL2sp, RelativeL1spOffset]
            }
            (AddressMode::Relative, AddressType::Ctrl) => {
                return Err(AddressError::invalid_kind(
                    "CTRL addresses cannot be relative",
                ))
            }
        };
        Ok(names)
    }

    /// Offset field of a tier/mode encoding.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::InvalidAddressKind`] for relative CTRL.
    pub fn offset_field(&self, kind: AddressType, mode: AddressMode) -> Result<Bitfield> {
        let name = match (mode, kind) {
            (AddressMode::Absolute, AddressType::Dram) => FieldName::AbsoluteDramOffset,
            (AddressMode::Absolute, AddressType::L2sp) => FieldName::AbsoluteL2spOffset,
            (AddressMode::Absolute, AddressType::L1sp) => FieldName::AbsoluteL1spOffset,
            (AddressMode::Absolute, AddressType::Ctrl) => FieldName::AbsoluteCtrlOffset,
            (AddressMode::Relative, AddressType::Dram) => FieldName::RelativeDramOffset,
            (AddressMode::Relative, AddressType::L2sp) => FieldName::RelativeL2spOffset,
            (AddressMode::Relative, AddressType::L1sp) => FieldName::RelativeL1spOffset,
            (AddressMode::Relative, AddressType::Ctrl) => {
                return Err(AddressError::invalid_kind(
                    "CTRL addresses cannot be relative",
                ))
            }
        };
        Ok(self.field(name))
    }

    /// Size in bytes of the window a tier/mode offset field can address.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::InvalidAddressKind`] for relative CTRL.
    pub fn window_size(&self, kind: AddressType, mode: AddressMode) -> Result<u64> {
        Ok(self.offset_field(kind, mode)?.mask().saturating_add(1))
    }

    fn check_disjoint(&self) -> Result<()> {
        for mode in [AddressMode::Absolute, AddressMode::Relative] {
            for kind in AddressType::ALL {
                let Ok(names) = self.encoding(kind, mode) else {
                    continue;
                };
                for (i, a) in names.iter().enumerate() {
                    for b in &names[i + 1..] {
                        if self.field(*a).overlaps(&self.field(*b)) {
                            return Err(AddressError::configuration(format!(
                                "{mode} {kind} fields {a} {} and {b} {} overlap",
                                self.field(*a),
                                self.field(*b)
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn place_below(top: u32, width: u32) -> Result<Bitfield> {
    Bitfield::below(top, width).ok_or_else(|| {
        AddressError::configuration(format!(
            "a {width}-bit field does not fit below bit {top}"
        ))
    })
}
