//! Contiguous bit ranges within a 64-bit address word.

use std::fmt;

/// Width of the address word every field lives in.
pub const WORD_BITS: u32 = 64;

/// A contiguous range of bits `[hi:lo]` within a 64-bit word.
///
/// A field may be empty (zero bits wide). Empty fields arise when a topology
/// level has a single instance and needs no selector bits; they read as zero
/// and ignore writes. An empty field placed at `lo` reports `hi() == lo - 1`,
/// the same convention firmware headers use for the degenerate case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bitfield {
    lo: u32,
    /// One past the most significant bit.
    top: u32,
}

impl Bitfield {
    /// Create the field `[hi:lo]`.
    ///
    /// # Panics
    ///
    /// Panics if `hi < lo` or `hi` lies outside the word. Intended for
    /// fixed positions known when the program is written; computed
    /// positions go through [`Bitfield::below`].
    pub const fn new(hi: u32, lo: u32) -> Self {
        assert!(hi >= lo, "bitfield hi bit must not be below lo bit");
        assert!(hi < WORD_BITS, "bitfield must lie within a 64-bit word");
        Self { lo, top: hi + 1 }
    }

    /// A single-bit flag at position `at`.
    pub const fn bit(at: u32) -> Self {
        Self::new(at, at)
    }

    /// A field `width` bits wide whose most significant bit sits just below
    /// bit `top`.
    ///
    /// Returns `None` if the field would extend below bit 0 or above the word,
    /// or if `top` is 0 (an empty field there would have no `hi`).
    pub const fn below(top: u32, width: u32) -> Option<Self> {
        if top == 0 || top > WORD_BITS || width > top {
            return None;
        }
        Some(Self {
            lo: top - width,
            top,
        })
    }

    /// Lowest bit of the field.
    pub const fn lo(&self) -> u32 {
        self.lo
    }

    /// Highest bit of the field (`lo - 1` for an empty field).
    pub const fn hi(&self) -> u32 {
        self.top - 1
    }

    /// Number of bits in the field.
    pub const fn bits(&self) -> u32 {
        self.top - self.lo
    }

    /// Whether the field is zero bits wide.
    pub const fn is_empty(&self) -> bool {
        self.top == self.lo
    }

    /// `(1 << bits) - 1`, unshifted.
    pub const fn mask(&self) -> u64 {
        match u64::MAX.checked_shr(WORD_BITS - self.bits()) {
            Some(mask) => mask,
            None => 0,
        }
    }

    /// Whether `value` can be stored without losing bits.
    pub const fn fits(&self, value: u64) -> bool {
        value & !self.mask() == 0
    }

    /// Extract the field from `word`.
    pub const fn get(&self, word: u64) -> u64 {
        match word.checked_shr(self.lo) {
            Some(shifted) => shifted & self.mask(),
            None => 0,
        }
    }

    /// Return `word` with the field replaced by `value`.
    ///
    /// Bits of `value` above the field width are discarded; every bit of
    /// `word` outside `[hi:lo]` is preserved.
    pub const fn set(&self, word: u64, value: u64) -> u64 {
        let placed_mask = match self.mask().checked_shl(self.lo) {
            Some(m) => m,
            None => 0,
        };
        let placed_value = match (value & self.mask()).checked_shl(self.lo) {
            Some(v) => v,
            None => 0,
        };
        (word & !placed_mask) | placed_value
    }

    /// Like [`Bitfield::set`], but returns `None` instead of truncating a
    /// value that is wider than the field.
    pub const fn try_set(&self, word: u64, value: u64) -> Option<u64> {
        if self.fits(value) {
            Some(self.set(word, value))
        } else {
            None
        }
    }

    /// Whether the bits of `self` and `other` intersect.
    pub const fn overlaps(&self, other: &Bitfield) -> bool {
        self.lo < other.top && other.lo < self.top
    }
}

impl fmt::Display for Bitfield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.hi(), self.lo())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn width_and_mask() {
        let f = Bitfield::new(28, 0);
        assert_eq!(f.bits(), 29);
        assert_eq!(f.mask(), (1 << 29) - 1);

        let flag = Bitfield::bit(63);
        assert_eq!(flag.bits(), 1);
        assert_eq!(flag.mask(), 1);
        assert_eq!(flag.hi(), 63);
        assert_eq!(flag.lo(), 63);
    }

    #[test]
    fn full_word_field() {
        let f = Bitfield::new(63, 0);
        assert_eq!(f.bits(), 64);
        assert_eq!(f.mask(), u64::MAX);
        assert_eq!(f.get(0xDEAD_BEEF_0000_0001), 0xDEAD_BEEF_0000_0001);
        assert_eq!(f.set(0, u64::MAX), u64::MAX);
    }

    #[test]
    fn empty_field() {
        let f = Bitfield::below(61, 0).unwrap();
        assert!(f.is_empty());
        assert_eq!(f.bits(), 0);
        assert_eq!(f.mask(), 0);
        assert_eq!(f.lo(), 61);
        assert_eq!(f.hi(), 60);
        assert_eq!(f.get(u64::MAX), 0);
        assert_eq!(f.set(0x1234, 7), 0x1234);
        assert_eq!(f.try_set(0x1234, 0), Some(0x1234));
        assert_eq!(f.try_set(0x1234, 1), None);
    }

    #[test]
    fn empty_field_at_top_of_word() {
        let f = Bitfield::below(64, 0).unwrap();
        assert_eq!(f.get(u64::MAX), 0);
        assert_eq!(f.set(42, 1), 42);
    }

    #[test]
    fn below_rejects_out_of_word() {
        assert!(Bitfield::below(65, 1).is_none());
        assert!(Bitfield::below(3, 4).is_none());
        assert!(Bitfield::below(0, 0).is_none());
        assert_eq!(Bitfield::below(1, 0).unwrap().hi(), 0);
        assert_eq!(Bitfield::below(61, 3), Some(Bitfield::new(60, 58)));
    }

    #[test]
    fn set_truncates_wide_values() {
        let f = Bitfield::new(7, 4);
        assert_eq!(f.set(0, 0x1F), 0xF0);
        assert_eq!(f.get(f.set(0, 0x1F)), 0xF);
        assert_eq!(f.try_set(0, 0x1F), None);
        assert_eq!(f.try_set(0, 0xF), Some(0xF0));
    }

    #[test]
    fn overlap_detection() {
        let a = Bitfield::new(60, 58);
        assert!(a.overlaps(&Bitfield::new(58, 50)));
        assert!(!a.overlaps(&Bitfield::new(57, 0)));
        assert!(!a.overlaps(&Bitfield::below(58, 0).unwrap()));
    }

    #[test]
    fn display_shows_range() {
        assert_eq!(Bitfield::new(28, 0).to_string(), "[28:0]");
    }

    fn field() -> impl Strategy<Value = Bitfield> {
        (0u32..WORD_BITS)
            .prop_flat_map(|hi| (Just(hi), 0..=hi))
            .prop_map(|(hi, lo)| Bitfield::new(hi, lo))
    }

    proptest! {
        #[test]
        fn set_then_get_keeps_masked_value(
            f in field(),
            word in any::<u64>(),
            value in any::<u64>(),
        ) {
            prop_assert_eq!(f.get(f.set(word, value)), value & f.mask());
        }

        #[test]
        fn set_preserves_bits_outside_field(
            f in field(),
            word in any::<u64>(),
            value in any::<u64>(),
        ) {
            let outside = !(f.mask() << f.lo());
            let out = f.set(word, value);
            prop_assert_eq!(out & outside, word & outside, "field {} touched outside bits", f);
        }

        #[test]
        fn try_set_accepts_exactly_fitting_values(
            f in field(),
            word in any::<u64>(),
            value in any::<u64>(),
        ) {
            prop_assert_eq!(f.try_set(word, value).is_some(), value <= f.mask());
        }

        #[test]
        fn empty_fields_read_zero(
            top in 1u32..=WORD_BITS,
            word in any::<u64>(),
            value in any::<u64>(),
        ) {
            let f = Bitfield::below(top, 0).unwrap();
            prop_assert_eq!(f.hi() + 1, f.lo());
            prop_assert_eq!(f.get(word), 0);
            prop_assert_eq!(f.set(word, value), word);
        }
    }
}
