//! Capability traits carried on type descriptors.
//!
//! Traits are computed once when a type descriptor is built and consulted
//! before invoking an operation, enabling O(1) "can this value do X" checks
//! without touching the value itself.

use bitflags::bitflags;

bitflags! {
    /// Capability markers on a CEL type.
    ///
    /// A dispatcher overload may declare an operand trait; the call node then
    /// only invokes the implementation when the first argument's type carries
    /// that trait.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct Traits: u16 {
        /// Supports `+` (addition or concatenation).
        const ADDER = 1 << 0;
        /// Supports `-` between two values.
        const SUBTRACTOR = 1 << 1;
        /// Supports unary `-`.
        const NEGATER = 1 << 2;
        /// Supports `*`.
        const MULTIPLIER = 1 << 3;
        /// Supports `/`.
        const DIVIDER = 1 << 4;
        /// Supports `%`.
        const MODDER = 1 << 5;
        /// Supports ordering comparisons.
        const COMPARER = 1 << 6;
        /// Supports `size(...)`.
        const SIZER = 1 << 7;
        /// Supports membership tests (`in`).
        const CONTAINER = 1 << 8;
        /// Supports positional or keyed element access.
        const INDEXER = 1 << 9;
        /// Supports keyed lookup that can report absence (maps).
        const MAPPER = 1 << 10;
        /// Supports field presence tests (`has(...)`).
        const FIELD_TESTER = 1 << 11;
        /// Produces an element iterator.
        const ITERABLE = 1 << 12;
        /// Accepts method-style calls routed through the value itself.
        const RECEIVER = 1 << 13;
    }
}

impl Traits {
    /// The arithmetic traits shared by signed integers.
    pub const INT_ARITH: Traits = Traits::ADDER
        .union(Traits::SUBTRACTOR)
        .union(Traits::NEGATER)
        .union(Traits::MULTIPLIER)
        .union(Traits::DIVIDER)
        .union(Traits::MODDER)
        .union(Traits::COMPARER);

    /// The arithmetic traits shared by unsigned integers (no negation).
    pub const UINT_ARITH: Traits = Traits::ADDER
        .union(Traits::SUBTRACTOR)
        .union(Traits::MULTIPLIER)
        .union(Traits::DIVIDER)
        .union(Traits::MODDER)
        .union(Traits::COMPARER);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_sets() {
        assert!(Traits::INT_ARITH.contains(Traits::NEGATER));
        assert!(!Traits::UINT_ARITH.contains(Traits::NEGATER));
        assert!(Traits::UINT_ARITH.contains(Traits::MODDER));
    }

    #[test]
    fn empty_matches_nothing() {
        assert!(!Traits::empty().contains(Traits::ADDER));
        // but every set contains the empty set
        assert!(Traits::SIZER.contains(Traits::empty()));
    }
}
