//! Encoding and decoding between [`AddressInfo`] and raw 64-bit addresses.

use crate::bitfield::Bitfield;
use crate::error::{AddressError, Result};
use crate::info::{AddressInfo, AddressMode, AddressType, IntoAddressInfo};
use crate::layout::{AddressLayout, FieldName};
use crate::topology::{CoreId, TopologyConfig, TopologyDescriptor};

/// The address map of one machine.
///
/// Built once from the topology and never mutated afterwards; it is `Send`
/// and `Sync` and can be shared freely between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMap {
    layout: AddressLayout,
}

impl AddressMap {
    /// Plan the layout for `topology`.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Configuration`] if the topology cannot be
    /// addressed within 64 bits.
    pub fn new(topology: &impl TopologyDescriptor) -> Result<Self> {
        Ok(Self {
            layout: AddressLayout::plan(topology)?,
        })
    }

    /// Wrap an already planned layout.
    pub fn from_layout(layout: AddressLayout) -> Self {
        Self { layout }
    }

    /// The underlying field layout.
    pub fn layout(&self) -> &AddressLayout {
        &self.layout
    }

    /// The topology the map was built for.
    pub fn topology(&self) -> &TopologyConfig {
        self.layout.topology()
    }

    /// Position of a named field.
    pub fn field(&self, name: FieldName) -> Bitfield {
        self.layout.field(name)
    }

    /// Pack an address description into a raw address.
    ///
    /// Accepts an [`AddressInfo`] or an unvalidated
    /// [`AddressInfoBuilder`](crate::AddressInfoBuilder).
    ///
    /// # Errors
    ///
    /// - [`AddressError::InvalidAddressKind`] if a builder describes relative
    ///   CTRL or has no tier set.
    /// - [`AddressError::CoordinateOutOfRange`] if a coordinate is not below
    ///   the topology count.
    /// - [`AddressError::FieldOverflow`] if the offset is wider than the
    ///   tier's offset field.
    pub fn encode(&self, info: impl IntoAddressInfo) -> Result<u64> {
        let info = info.into_address_info()?;
        self.check_coordinates(&info)?;

        let raw = match info.mode() {
            AddressMode::Absolute => self.encode_absolute(&info)?,
            AddressMode::Relative => self.encode_relative(&info)?,
        };
        log::trace!("encode {info} -> 0x{raw:016x}");
        Ok(raw)
    }

    fn encode_absolute(&self, info: &AddressInfo) -> Result<u64> {
        let pxn = info.pxn().unwrap_or_default();
        let pod = info.pod().unwrap_or_default();
        let core = info.core().unwrap_or_default();

        let mut raw = self.put(0, FieldName::IsAbsolute, 1)?;
        match info.kind() {
            AddressType::Dram => {
                raw = self.put(raw, FieldName::AbsoluteIsDram, 1)?;
                raw = self.put(raw, FieldName::AbsolutePxn, pxn)?;
                raw = self.put(raw, FieldName::AbsoluteDramOffset, info.offset())?;
            }
            AddressType::L2sp => {
                raw = self.put(raw, FieldName::AbsoluteIsL2sp, 1)?;
                raw = self.put(raw, FieldName::AbsolutePxn, pxn)?;
                raw = self.put(raw, FieldName::AbsolutePod, pod)?;
                raw = self.put(raw, FieldName::AbsoluteL2spOffset, info.offset())?;
            }
            AddressType::L1sp => {
                raw = self.put(raw, FieldName::AbsolutePxn, pxn)?;
                raw = self.put(raw, FieldName::AbsolutePod, pod)?;
                raw = self.put(raw, FieldName::AbsoluteCore, core)?;
                raw = self.put(raw, FieldName::AbsoluteL1spOffset, info.offset())?;
            }
            AddressType::Ctrl => {
                raw = self.put(raw, FieldName::AbsoluteIsCtrl, 1)?;
                raw = self.put(raw, FieldName::AbsolutePxn, pxn)?;
                raw = self.put(raw, FieldName::AbsolutePod, pod)?;
                raw = self.put(raw, FieldName::AbsoluteCore, core)?;
                raw = self.put(raw, FieldName::AbsoluteCtrlOffset, info.offset())?;
            }
        }
        Ok(raw)
    }

    fn encode_relative(&self, info: &AddressInfo) -> Result<u64> {
        match info.kind() {
            AddressType::Dram => {
                let raw = self.put(0, FieldName::RelativeIsDram, 1)?;
                self.put(raw, FieldName::RelativeDramOffset, info.offset())
            }
            AddressType::L2sp => {
                let raw = self.put(0, FieldName::RelativeIsL2sp, 1)?;
                self.put(raw, FieldName::RelativeL2spOffset, info.offset())
            }
            AddressType::L1sp => self.put(0, FieldName::RelativeL1spOffset, info.offset()),
            AddressType::Ctrl => Err(AddressError::invalid_kind(
                "CTRL addresses cannot be relative",
            )),
        }
    }

    fn put(&self, raw: u64, name: FieldName, value: u64) -> Result<u64> {
        let field = self.layout.field(name);
        field
            .try_set(raw, value)
            .ok_or(AddressError::FieldOverflow {
                field: name.macro_name(),
                value,
                bits: field.bits(),
            })
    }

    fn check_coordinates(&self, info: &AddressInfo) -> Result<()> {
        let topology = self.topology();
        for (coordinate, value, count) in [
            ("pxn", info.pxn(), topology.pxns),
            ("pod", info.pod(), topology.pods),
            ("core", info.core(), topology.cores),
        ] {
            if let Some(value) = value {
                if value >= count {
                    return Err(AddressError::CoordinateOutOfRange {
                        coordinate,
                        value,
                        count,
                    });
                }
            }
        }
        Ok(())
    }

    /// Unpack a raw address.
    ///
    /// Dispatches on the `IS_ABSOLUTE` bit alone. Absolute addresses are
    /// reconstructed entirely from `raw`. Relative addresses carry no
    /// coordinates; `issuer` is attached to the result only to record whose
    /// address it is (see [`AddressInfo::issuer`]).
    pub fn decode(&self, raw: u64, issuer: CoreId) -> AddressInfo {
        let info = if self.get(raw, FieldName::IsAbsolute) != 0 {
            self.decode_absolute(raw)
        } else {
            self.decode_relative(raw).with_issuer(issuer)
        };
        log::trace!("decode 0x{raw:016x} -> {info}");
        info
    }

    fn decode_absolute(&self, raw: u64) -> AddressInfo {
        let pxn = self.get(raw, FieldName::AbsolutePxn);
        let pod = self.get(raw, FieldName::AbsolutePod);
        let core = self.get(raw, FieldName::AbsoluteCore);

        if self.get(raw, FieldName::AbsoluteIsDram) != 0 {
            AddressInfo::absolute_dram(pxn, self.get(raw, FieldName::AbsoluteDramOffset))
        } else if self.get(raw, FieldName::AbsoluteIsL2sp) != 0 {
            AddressInfo::absolute_l2sp(pxn, pod, self.get(raw, FieldName::AbsoluteL2spOffset))
        } else if self.get(raw, FieldName::AbsoluteIsCtrl) != 0 {
            AddressInfo::absolute_ctrl(pxn, pod, core, self.get(raw, FieldName::AbsoluteCtrlOffset))
        } else {
            AddressInfo::absolute_l1sp(pxn, pod, core, self.get(raw, FieldName::AbsoluteL1spOffset))
        }
    }

    fn decode_relative(&self, raw: u64) -> AddressInfo {
        if self.get(raw, FieldName::RelativeIsDram) != 0 {
            AddressInfo::relative_dram(self.get(raw, FieldName::RelativeDramOffset))
        } else if self.get(raw, FieldName::RelativeIsL2sp) != 0 {
            AddressInfo::relative_l2sp(self.get(raw, FieldName::RelativeL2spOffset))
        } else {
            AddressInfo::relative_l1sp(self.get(raw, FieldName::RelativeL1spOffset))
        }
    }

    fn get(&self, raw: u64, name: FieldName) -> u64 {
        self.layout.field(name).get(raw)
    }

    /// Rewrite `raw` as an absolute address as seen from `issuer`.
    ///
    /// Absolute addresses are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::CoordinateOutOfRange`] if `issuer` is not a
    /// core of this machine.
    pub fn to_absolute(&self, raw: u64, issuer: CoreId) -> Result<u64> {
        let info = self.decode(raw, issuer);
        if info.is_absolute() {
            return Ok(raw);
        }
        self.encode(AddressInfo::absolute_for(info.kind(), issuer, info.offset()))
    }

    /// Absolute base address of `id`'s L1 scratchpad.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::CoordinateOutOfRange`] if `id` is not a core
    /// of this machine.
    pub fn absolute_l1sp_base(&self, id: CoreId) -> Result<u64> {
        self.encode(AddressInfo::absolute_for(AddressType::L1sp, id, 0))
    }

    /// Absolute base address of the L2 scratchpad of `id`'s pod.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::CoordinateOutOfRange`] if `id` is not a core
    /// of this machine.
    pub fn absolute_l2sp_base(&self, id: CoreId) -> Result<u64> {
        self.encode(AddressInfo::absolute_for(AddressType::L2sp, id, 0))
    }

    /// Absolute base address of the DRAM of `id`'s PXN.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::CoordinateOutOfRange`] if `id` is not a core
    /// of this machine.
    pub fn absolute_dram_base(&self, id: CoreId) -> Result<u64> {
        self.encode(AddressInfo::absolute_for(AddressType::Dram, id, 0))
    }

    /// Absolute base address of `id`'s control registers.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::CoordinateOutOfRange`] if `id` is not a core
    /// of this machine.
    pub fn absolute_ctrl_base(&self, id: CoreId) -> Result<u64> {
        self.encode(AddressInfo::absolute_for(AddressType::Ctrl, id, 0))
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn map(pxns: u64, pods: u64, cores: u64) -> AddressMap {
        AddressMap::new(&TopologyConfig::new(pxns, pods, cores)).unwrap()
    }

    const HERE: CoreId = CoreId::new(0, 0, 0);

    #[test]
    fn absolute_bit_patterns() {
        let m = map(4, 8, 64);
        assert_eq!(
            m.encode(AddressInfo::absolute_dram(0, 0)).unwrap(),
            0xC000_0000_0000_0000
        );
        assert_eq!(
            m.encode(AddressInfo::absolute_dram(3, 0x40)).unwrap(),
            0xC000_0000_0000_0000 | (3 << 59) | 0x40
        );
        assert_eq!(
            m.encode(AddressInfo::absolute_l2sp(1, 2, 0x10)).unwrap(),
            (1 << 63) | (1 << 61) | (1 << 59) | (2 << 56) | 0x10
        );
        assert_eq!(
            m.encode(AddressInfo::absolute_l1sp(1, 2, 5, 0x8)).unwrap(),
            (1 << 63) | (1 << 59) | (2 << 56) | (5 << 50) | 0x8
        );
        assert_eq!(
            m.encode(AddressInfo::absolute_ctrl(1, 2, 5, 0x8)).unwrap(),
            (1 << 63) | (1 << 59) | (2 << 56) | (5 << 50) | (1 << 29) | 0x8
        );
    }

    #[test]
    fn relative_bit_patterns() {
        let m = map(1, 1, 1);
        assert_eq!(m.encode(AddressInfo::relative_l1sp(0x100)).unwrap(), 0x100);
        assert_eq!(
            m.encode(AddressInfo::relative_l2sp(0x100)).unwrap(),
            0x2000_0100
        );
        assert_eq!(
            m.encode(AddressInfo::relative_dram(0x100)).unwrap(),
            0x4000_0100
        );
        assert_eq!(m.encode(AddressInfo::relative_l1sp_base()).unwrap(), 0);
        assert_eq!(
            m.encode(AddressInfo::relative_l2sp_base()).unwrap(),
            0x2000_0000
        );
        assert_eq!(
            m.encode(AddressInfo::relative_dram_base()).unwrap(),
            0x4000_0000
        );
    }

    #[test]
    fn relative_dram_uses_bit_29_for_offset() {
        let m = map(1, 1, 1);
        let raw = m.encode(AddressInfo::relative_dram(1 << 29)).unwrap();
        assert_eq!(raw, 0x6000_0000);
        let info = m.decode(raw, HERE);
        assert!(info.is_dram());
        assert_eq!(info.offset(), 1 << 29);
    }

    #[test]
    fn round_trip_at_full_budget() {
        let m = map(1 << 11, 1 << 10, 1 << 10);
        let last = CoreId::new((1 << 11) - 1, (1 << 10) - 1, (1 << 10) - 1);
        for kind in AddressType::ALL {
            let max = m
                .layout()
                .offset_field(kind, AddressMode::Absolute)
                .unwrap()
                .mask();
            let info = AddressInfo::absolute_for(kind, last, max);
            assert_eq!(m.decode(m.encode(info).unwrap(), HERE), info);
        }
    }

    #[test]
    fn round_trip_relative_attaches_issuer() {
        let m = map(2, 4, 16);
        let me = CoreId::new(1, 3, 15);
        for info in [
            AddressInfo::relative_l1sp(0x1FFF_FFFF),
            AddressInfo::relative_l2sp(0x40),
            AddressInfo::relative_dram(0x3FFF_FFFF),
        ] {
            let decoded = m.decode(m.encode(info).unwrap(), me);
            assert_eq!(decoded, info.with_issuer(me));
            assert_eq!(decoded.kind(), info.kind());
            assert_eq!(decoded.offset(), info.offset());
            assert_eq!(decoded.pxn(), None);
            assert_eq!(decoded.issuer(), Some(me));
        }
    }

    #[test]
    fn decode_ignores_issuer_for_absolute() {
        let m = map(2, 2, 2);
        let raw = m.encode(AddressInfo::absolute_l1sp(1, 1, 1, 4)).unwrap();
        assert_eq!(
            m.decode(raw, CoreId::new(0, 0, 0)),
            m.decode(raw, CoreId::new(1, 0, 1))
        );
    }

    #[test]
    fn encode_rejects_relative_ctrl_builder() {
        let m = map(1, 1, 1);
        let err = m
            .encode(AddressInfo::builder().set_relative().set_core_ctrl())
            .unwrap_err();
        assert!(matches!(err, AddressError::InvalidAddressKind { .. }));
    }

    #[test]
    fn encode_rejects_untyped_builder() {
        let m = map(1, 1, 1);
        let err = m
            .encode(AddressInfo::builder().set_absolute().set_offset(4))
            .unwrap_err();
        assert!(matches!(err, AddressError::InvalidAddressKind { .. }));
    }

    #[test]
    fn encode_rejects_wide_offset() {
        let m = map(1, 1, 1);
        let err = m.encode(AddressInfo::relative_l1sp(1 << 29)).unwrap_err();
        assert_eq!(
            err,
            AddressError::FieldOverflow {
                field: "RELATIVE_L1SP_OFFSET",
                value: 1 << 29,
                bits: 29,
            }
        );
        assert!(m.encode(AddressInfo::absolute_l1sp(0, 0, 0, 1 << 29)).is_err());
    }

    #[test]
    fn encode_rejects_out_of_range_coordinates() {
        let m = map(3, 2, 2);
        // pxn 3 would fit the 2-bit field but is not a real pxn
        let err = m.encode(AddressInfo::absolute_dram(3, 0)).unwrap_err();
        assert_eq!(
            err,
            AddressError::CoordinateOutOfRange {
                coordinate: "pxn",
                value: 3,
                count: 3,
            }
        );
        assert!(m.encode(AddressInfo::absolute_l1sp(0, 0, 2, 0)).is_err());
    }

    #[test]
    fn to_absolute_uses_issuer_coordinates() {
        let m = map(2, 2, 8);
        let me = CoreId::new(1, 0, 6);
        let rel = m.encode(AddressInfo::relative_l1sp(0x80)).unwrap();
        let abs = m.to_absolute(rel, me).unwrap();
        assert_eq!(m.decode(abs, HERE), AddressInfo::absolute_l1sp(1, 0, 6, 0x80));

        let rel = m.encode(AddressInfo::relative_dram(0x80)).unwrap();
        let abs = m.to_absolute(rel, me).unwrap();
        assert_eq!(m.decode(abs, HERE), AddressInfo::absolute_dram(1, 0x80));

        assert_eq!(m.to_absolute(abs, HERE).unwrap(), abs);
    }

    #[test]
    fn per_core_bases() {
        let m = map(1, 2, 4);
        let id = CoreId::new(0, 1, 3);
        assert_eq!(
            m.decode(m.absolute_l1sp_base(id).unwrap(), HERE),
            AddressInfo::absolute_l1sp(0, 1, 3, 0)
        );
        assert_eq!(
            m.decode(m.absolute_ctrl_base(id).unwrap(), HERE),
            AddressInfo::absolute_ctrl(0, 1, 3, 0)
        );
        assert_eq!(
            m.decode(m.absolute_l2sp_base(id).unwrap(), HERE),
            AddressInfo::absolute_l2sp(0, 1, 0)
        );
        assert_eq!(
            m.decode(m.absolute_dram_base(id).unwrap(), HERE),
            AddressInfo::absolute_dram(0, 0)
        );
        assert!(m.absolute_l1sp_base(CoreId::new(0, 2, 0)).is_err());
    }

    #[test]
    fn address_map_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AddressMap>();
    }

    // Every count up to these limits plans within the 31-bit budget.
    fn topology() -> impl Strategy<Value = TopologyConfig> {
        (1u64..=1 << 11, 1u64..=1 << 10, 1u64..=1 << 10)
            .prop_map(|(pxns, pods, cores)| TopologyConfig::new(pxns, pods, cores))
    }

    fn core_of(topology: TopologyConfig) -> impl Strategy<Value = CoreId> {
        (0..topology.pxns, 0..topology.pods, 0..topology.cores)
            .prop_map(|(pxn, pod, core)| CoreId::new(pxn, pod, core))
    }

    fn machine_and_cores() -> impl Strategy<Value = (TopologyConfig, CoreId, CoreId)> {
        topology().prop_flat_map(|t| (Just(t), core_of(t), core_of(t)))
    }

    fn absolute_kind() -> impl Strategy<Value = AddressType> {
        prop::sample::select(AddressType::ALL.to_vec())
    }

    fn relative_kind() -> impl Strategy<Value = AddressType> {
        prop::sample::select(vec![AddressType::L1sp, AddressType::L2sp, AddressType::Dram])
    }

    proptest! {
        #[test]
        fn absolute_round_trip(
            (topology, id, _) in machine_and_cores(),
            kind in absolute_kind(),
            offset in any::<u64>(),
        ) {
            let m = AddressMap::new(&topology).unwrap();
            let mask = m.layout().offset_field(kind, AddressMode::Absolute).unwrap().mask();
            let info = AddressInfo::absolute_for(kind, id, offset & mask);
            let raw = m.encode(info).unwrap();
            prop_assert_eq!(m.decode(raw, HERE), info);
        }

        #[test]
        fn relative_round_trip(
            (topology, issuer, _) in machine_and_cores(),
            kind in relative_kind(),
            offset in any::<u64>(),
        ) {
            let m = AddressMap::new(&topology).unwrap();
            let mask = m.layout().offset_field(kind, AddressMode::Relative).unwrap().mask();
            let info = AddressInfo::absolute_for(kind, issuer, offset & mask);
            let relative = AddressInfo::builder()
                .set_type(kind)
                .set_mode(AddressMode::Relative)
                .set_offset(info.offset())
                .into_address_info()
                .unwrap();
            let raw = m.encode(relative).unwrap();
            prop_assert_eq!(m.decode(raw, issuer), relative.with_issuer(issuer));
            prop_assert_eq!(m.decode(m.to_absolute(raw, issuer).unwrap(), HERE), info);
        }

        #[test]
        fn absolute_windows_are_identical_or_disjoint(
            (topology, a, b) in machine_and_cores(),
            kind_a in absolute_kind(),
            kind_b in absolute_kind(),
        ) {
            let m = AddressMap::new(&topology).unwrap();
            let window = |kind: AddressType, id: CoreId| {
                let info = AddressInfo::absolute_for(kind, id, 0);
                let start = m.encode(info).unwrap();
                let size = m.layout().window_size(kind, AddressMode::Absolute).unwrap();
                (info, start, start + (size - 1))
            };
            let (info_a, start_a, end_a) = window(kind_a, a);
            let (info_b, start_b, end_b) = window(kind_b, b);
            if info_a == info_b {
                prop_assert_eq!((start_a, end_a), (start_b, end_b));
            } else {
                prop_assert!(
                    end_a < start_b || end_b < start_a,
                    "{} and {} overlap", info_a, info_b
                );
            }
        }
    }
}
