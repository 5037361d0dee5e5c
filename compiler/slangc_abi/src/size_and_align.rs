use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
/// Specifies both the ABI-required and preferred alignment for a type, in bytes.
///
/// Both `abi` and `pref` are powers of two. The ABI alignment (`abi`) is the minimum
/// required alignment for correct program execution, as defined by the platform's ABI.
/// The preferred alignment (`pref`) is a potentially larger value that may yield better
/// performance on some architectures.
///
/// For example, in LLVM, if a preferred alignment is not explicitly set, it defaults to
/// the ABI alignment.
///
/// This type is commonly used during layout computation and codegen to determine
/// how types should be aligned in memory.
pub struct AbiAndPrefAlign {
    /// The alignment required by the ABI for this type.
    pub abi: Align,
    /// The preferred alignment for this type, which may be larger than the ABI alignment.
    pub pref: Align,
}

impl AbiAndPrefAlign {
    /// Creates a new `AbiAndPrefAlign` with the specified ABI and preferred
    /// alignment in bytes.
    pub fn new(abi: u64, pref: u64) -> Self {
        Self {
            abi: Align::from_bytes(abi).unwrap(),
            pref: Align::from_bytes(pref).unwrap(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// Size of a type in bytes.
pub struct Size(u64);

impl Size {
    pub const ZERO: Size = Size(0);

    /// Rounds `bits` up to the next-higher byte boundary, if `bits` is
    /// not a multiple of 8.
    pub fn from_bits(bits: impl TryInto<u64>) -> Size {
        let bits = bits.try_into().ok().unwrap();
        // Avoid potential overflow from `bits + 7`.
        Size(bits / 8 + (bits % 8).div_ceil(8))
    }

    /// Builds a `Size` directly from a byte count. `const fn` so `Primitive::size`
    /// and friends can be evaluated in const position.
    pub const fn from_bytes_const(bytes: u64) -> Size {
        Size(bytes)
    }

    pub fn from_bytes(bytes: impl TryInto<u64>) -> Size {
        Size(bytes.try_into().ok().unwrap())
    }

    /// Returns the size in bytes.
    pub const fn bytes(&self) -> u64 {
        self.0
    }

    pub fn align_to(self, align: Align) -> Size {
        let mask = align.bytes() - 1;
        Size((self.0 + mask) & !mask)
    }

    pub fn checked_add(self, other: Size) -> Option<Size> {
        self.0.checked_add(other.0).map(Size)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord)]
/// Alignment of a type in bytes (always a power of two).
///
/// `Align::from_bytes(0)` is normalized to an alignment of one byte rather
/// than a literal zero alignment, matching the convention LLVM itself uses
/// for "no particular alignment requirement" — a genuine zero alignment is
/// not representable in any backend this crate targets.
pub struct Align(u64);

#[derive(Debug, Error)]
pub enum AlignError {
    #[error("alignment {0} is larger than the maximum representable alignment")]
    TooLarge(u64),
    #[error("alignment {0} is not a power of two")]
    NotPowerOfTwo(u64),
}

impl Align {
    pub const ONE: Align = Align(1);

    #[inline]
    pub fn from_bits(bits: u64) -> Result<Align, AlignError> {
        Align::from_bytes(Size::from_bits(bits).bytes())
    }

    #[inline]
    /// Creates an `Align` from a byte count.
    pub const fn from_bytes(align: u64) -> Result<Align, AlignError> {
        // Treat an alignment of 0 bytes like 1-byte alignment; see the
        // doc comment on `Align` for why this differs from a literal zero.
        if align == 0 {
            return Ok(Align(1));
        }

        #[cold]
        const fn not_power_of_2(align: u64) -> AlignError {
            AlignError::NotPowerOfTwo(align)
        }

        #[cold]
        const fn too_large(align: u64) -> AlignError {
            AlignError::TooLarge(align)
        }

        let tz = align.trailing_zeros();
        if align != (1 << tz) {
            return Err(not_power_of_2(align));
        }

        if align > u64::MAX / 8 {
            return Err(too_large(align));
        }

        Ok(Align(align))
    }

    #[inline]
    pub const fn bytes(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_from_bytes_zero_normalizes_to_one() {
        assert_eq!(Align::from_bytes(0).unwrap().bytes(), 1);
    }

    #[test]
    fn align_rejects_non_power_of_two() {
        assert!(matches!(
            Align::from_bytes(3),
            Err(AlignError::NotPowerOfTwo(3))
        ));
    }

    #[test]
    fn size_align_to_rounds_up() {
        let s = Size::from_bytes(5u64);
        let a = Align::from_bytes(8).unwrap();
        assert_eq!(s.align_to(a).bytes(), 8);
    }
}
