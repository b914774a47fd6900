//! Interleaved address ranges for memory banks.
//!
//! A region striped across `banks` banks gives each bank `interleave_size`
//! byte chunks repeating every `interleave_step` bytes. A bank's decoder is
//! configured with the envelope `[start, end]` that spans its first and last
//! chunk together with the size and step, from which it works out which
//! stripes inside the envelope belong to it:
//!
//! ```text
//! 4 banks, interleave_size 64, interleave_step 256, 256 bytes per bank
//!
//! offset   0    64   128  192  256  320  384  448  ...  960  1023
//!          | b0 | b1 | b2 | b3 | b0 | b1 | b2 | b3 | ... | b3 |
//!
//! bank 0: start 0,   end 831
//! bank 3: start 192, end 1023
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AddressError, Result};
use crate::info::AddressInfo;
use crate::map::AddressMap;

/// The address window one bank's decoder is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddressRange {
    /// First byte of the envelope (encoded address).
    pub start: u64,
    /// Last byte of the envelope, inclusive (encoded address).
    pub end: u64,
    /// Stripe size in bytes (0 when not interleaved).
    pub interleave_size: u64,
    /// Distance between consecutive stripes of this bank (0 when not interleaved).
    pub interleave_step: u64,
}

impl AddressRange {
    /// `(start, end, interleave_size, interleave_step)`.
    pub fn as_tuple(&self) -> (u64, u64, u64, u64) {
        (self.start, self.end, self.interleave_size, self.interleave_step)
    }

    /// Bytes spanned by the envelope.
    pub fn span(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Whether the bank decodes `address`.
    pub fn owns(&self, address: u64) -> bool {
        if address < self.start || address > self.end {
            return false;
        }
        if self.interleave_size == 0 || self.interleave_step == 0 {
            return true;
        }
        (address - self.start) % self.interleave_step < self.interleave_size
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}..=0x{:016x}", self.start, self.end)?;
        if self.interleave_size != 0 {
            write!(
                f,
                " every {}B of {}B",
                self.interleave_size, self.interleave_step
            )?;
        }
        Ok(())
    }
}

/// Interleaving arithmetic shared by every tier.
#[derive(Debug, Clone, Copy)]
pub struct AddressRangeBuilder<'a> {
    map: &'a AddressMap,
    memsize: u64,
    interleave_size: u64,
    interleave_step: u64,
}

impl<'a> AddressRangeBuilder<'a> {
    /// Describe a region of banks of `memsize` bytes each.
    ///
    /// An `interleave_size` of zero means the region is one bank and is not
    /// striped; `interleave_step` is then carried through unused.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Configuration`] if `memsize` is zero, if the
    /// step is not a whole multiple of the stripe size, or if the region size
    /// overflows.
    pub fn new(
        map: &'a AddressMap,
        memsize: u64,
        interleave_size: u64,
        interleave_step: u64,
    ) -> Result<Self> {
        if memsize == 0 {
            return Err(AddressError::configuration("bank size must be non-zero"));
        }
        if interleave_size != 0
            && (interleave_step < interleave_size || interleave_step % interleave_size != 0)
        {
            return Err(AddressError::configuration(format!(
                "interleave step {interleave_step} is not a multiple of interleave size \
                 {interleave_size}"
            )));
        }

        let builder = Self {
            map,
            memsize,
            interleave_size,
            interleave_step,
        };
        if memsize.checked_mul(builder.banks()).is_none() {
            return Err(AddressError::configuration(format!(
                "{} banks of {memsize} bytes overflow the address space",
                builder.banks()
            )));
        }
        Ok(builder)
    }

    /// Number of banks the region is striped across.
    pub fn banks(&self) -> u64 {
        if self.interleave_size == 0 {
            return 1;
        }
        self.interleave_step / self.interleave_size
    }

    /// Size of the whole region (all banks) in bytes.
    pub fn total_size(&self) -> u64 {
        self.memsize * self.banks()
    }

    /// Offsets of the first and last byte of `bank`'s envelope.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::BankOutOfRange`] if `bank` is not below
    /// [`AddressRangeBuilder::banks`].
    pub fn interleaved_address_range(&self, bank: u64) -> Result<(u64, u64)> {
        let banks = self.banks();
        if bank >= banks {
            return Err(AddressError::BankOutOfRange { bank, banks });
        }
        let start = bank * self.interleave_size;
        let end = self.total_size() - (banks - bank - 1) * self.interleave_size - 1;
        Ok((start, end))
    }

    /// Encode `bank`'s envelope, tagging both boundary offsets with `tag`.
    ///
    /// # Errors
    ///
    /// Propagates [`AddressError::BankOutOfRange`] and any error from
    /// [`AddressMap::encode`].
    pub fn build(&self, bank: u64, tag: impl Fn(u64) -> AddressInfo) -> Result<AddressRange> {
        let (start, end) = self.interleaved_address_range(bank)?;
        let start_info = tag(start);
        let range = AddressRange {
            start: self.map.encode(start_info)?,
            end: self.map.encode(tag(end))?,
            interleave_size: self.interleave_size,
            interleave_step: self.interleave_step,
        };
        log::debug!(
            "{} bank {bank}/{}: offsets {start:#x}..={end:#x} -> {range}",
            start_info.kind(),
            self.banks()
        );
        Ok(range)
    }
}

/// Address range of one core's L1 scratchpad. Never interleaved.
#[derive(Debug, Clone, Copy)]
pub struct L1spAddressBuilder<'a> {
    base: AddressRangeBuilder<'a>,
}

impl<'a> L1spAddressBuilder<'a> {
    /// # Errors
    ///
    /// Returns [`AddressError::Configuration`] if `memsize` is zero.
    pub fn new(map: &'a AddressMap, memsize: u64) -> Result<Self> {
        Ok(Self {
            base: AddressRangeBuilder::new(map, memsize, 0, 0)?,
        })
    }

    /// The shared interleaving arithmetic.
    pub fn base(&self) -> &AddressRangeBuilder<'a> {
        &self.base
    }

    /// Range of core `(pxn, pod, core)`'s scratchpad.
    ///
    /// # Errors
    ///
    /// Propagates coordinate and offset errors from [`AddressMap::encode`].
    pub fn range(&self, pxn: u64, pod: u64, core: u64) -> Result<AddressRange> {
        self.base
            .build(0, |offset| AddressInfo::absolute_l1sp(pxn, pod, core, offset))
    }
}

/// Address range of one core's control register window. Never interleaved.
#[derive(Debug, Clone, Copy)]
pub struct CtrlAddressBuilder<'a> {
    base: AddressRangeBuilder<'a>,
}

impl<'a> CtrlAddressBuilder<'a> {
    /// # Errors
    ///
    /// Returns [`AddressError::Configuration`] if `memsize` is zero.
    pub fn new(map: &'a AddressMap, memsize: u64) -> Result<Self> {
        Ok(Self {
            base: AddressRangeBuilder::new(map, memsize, 0, 0)?,
        })
    }

    pub fn base(&self) -> &AddressRangeBuilder<'a> {
        &self.base
    }

    /// Range of core `(pxn, pod, core)`'s control registers.
    ///
    /// # Errors
    ///
    /// Propagates coordinate and offset errors from [`AddressMap::encode`].
    pub fn range(&self, pxn: u64, pod: u64, core: u64) -> Result<AddressRange> {
        self.base
            .build(0, |offset| AddressInfo::absolute_ctrl(pxn, pod, core, offset))
    }
}

/// Address ranges of the banks of one pod's L2 scratchpad.
#[derive(Debug, Clone, Copy)]
pub struct L2spAddressBuilder<'a> {
    base: AddressRangeBuilder<'a>,
}

impl<'a> L2spAddressBuilder<'a> {
    /// # Errors
    ///
    /// See [`AddressRangeBuilder::new`].
    pub fn new(
        map: &'a AddressMap,
        memsize: u64,
        interleave_size: u64,
        interleave_step: u64,
    ) -> Result<Self> {
        Ok(Self {
            base: AddressRangeBuilder::new(map, memsize, interleave_size, interleave_step)?,
        })
    }

    pub fn base(&self) -> &AddressRangeBuilder<'a> {
        &self.base
    }

    /// Range of `bank` within pod `(pxn, pod)`'s L2 scratchpad.
    ///
    /// # Errors
    ///
    /// Propagates bank, coordinate, and offset errors.
    pub fn range(&self, pxn: u64, pod: u64, bank: u64) -> Result<AddressRange> {
        self.base
            .build(bank, |offset| AddressInfo::absolute_l2sp(pxn, pod, offset))
    }
}

/// Address ranges of the banks of one PXN's DRAM.
#[derive(Debug, Clone, Copy)]
pub struct DramAddressBuilder<'a> {
    base: AddressRangeBuilder<'a>,
}

impl<'a> DramAddressBuilder<'a> {
    /// # Errors
    ///
    /// See [`AddressRangeBuilder::new`].
    pub fn new(
        map: &'a AddressMap,
        memsize: u64,
        interleave_size: u64,
        interleave_step: u64,
    ) -> Result<Self> {
        Ok(Self {
            base: AddressRangeBuilder::new(map, memsize, interleave_size, interleave_step)?,
        })
    }

    pub fn base(&self) -> &AddressRangeBuilder<'a> {
        &self.base
    }

    /// Range of `bank` within `pxn`'s DRAM.
    ///
    /// # Errors
    ///
    /// Propagates bank, coordinate, and offset errors.
    pub fn range(&self, pxn: u64, bank: u64) -> Result<AddressRange> {
        self.base
            .build(bank, |offset| AddressInfo::absolute_dram(pxn, offset))
    }
}
