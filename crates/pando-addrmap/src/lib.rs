//! Hierarchical physical-address encoding for the PANDO many-core simulator.
//!
//! A 64-bit address word names one location in a three-tier memory hierarchy:
//! - **L1SP:** per-core scratchpad (plus the core's control register window)
//! - **L2SP:** per-pod shared scratchpad
//! - **DRAM:** per-PXN main memory
//!
//! The bit layout depends on the machine's topology (PXN count, pods per PXN,
//! cores per pod) and is planned once by [`AddressLayout::plan`]. An
//! [`AddressMap`] packs and unpacks [`AddressInfo`] values against that
//! layout, and the [`range`] builders derive the interleaved address window
//! each memory bank's decoder is configured with.

pub mod bitfield;
pub mod error;
pub mod info;
pub mod layout;
pub mod map;
pub mod range;
pub mod topology;

pub use bitfield::Bitfield;
pub use error::{AddressError, Result};
pub use info::{AddressInfo, AddressInfoBuilder, AddressMode, AddressType, IntoAddressInfo};
pub use layout::{AddressLayout, FieldName};
pub use map::AddressMap;
pub use range::{
    AddressRange, AddressRangeBuilder, CtrlAddressBuilder, DramAddressBuilder, L1spAddressBuilder,
    L2spAddressBuilder,
};
pub use topology::{CoreId, TopologyConfig, TopologyDescriptor};
