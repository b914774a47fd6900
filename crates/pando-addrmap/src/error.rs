//! Error types for address encoding and range computation.

/// Errors that can occur while planning a layout or encoding an address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// The topology or a bank configuration cannot be represented.
    #[error("configuration error: {detail}")]
    Configuration {
        /// Description of the configuration problem.
        detail: String,
    },

    /// The type/mode combination cannot be encoded.
    #[error("invalid address kind: {detail}")]
    InvalidAddressKind {
        /// Description of the rejected combination.
        detail: String,
    },

    /// A value is wider than the bit field allocated to it.
    #[error("value 0x{value:x} does not fit in {bits}-bit field {field}")]
    FieldOverflow {
        /// Name of the field.
        field: &'static str,
        /// The rejected value.
        value: u64,
        /// Width of the field in bits.
        bits: u32,
    },

    /// A topology coordinate is not below the configured count.
    #[error("{coordinate} {value} out of range (topology has {count})")]
    CoordinateOutOfRange {
        /// Which coordinate ("pxn", "pod" or "core").
        coordinate: &'static str,
        /// The rejected coordinate.
        value: u64,
        /// Number of instances in the topology.
        count: u64,
    },

    /// A range was requested for a bank that does not exist.
    #[error("bank {bank} out of range ({banks} banks)")]
    BankOutOfRange {
        /// The requested bank index.
        bank: u64,
        /// Number of banks in the region.
        banks: u64,
    },
}

impl AddressError {
    pub(crate) fn configuration(detail: impl Into<String>) -> Self {
        Self::Configuration {
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_kind(detail: impl Into<String>) -> Self {
        Self::InvalidAddressKind {
            detail: detail.into(),
        }
    }
}

/// Result type for address operations.
pub type Result<T> = std::result::Result<T, AddressError>;
