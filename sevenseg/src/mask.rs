//! Segment bitmasks and the canonical glyph shapes.
//!
//! ```text
//!  ---        HORIZ_UP
//! |   |       VERT_LEFT_UP, VERT_RIGHT_UP
//!  ---        HORIZ_MID
//! |   |       VERT_LEFT_DOWN, VERT_RIGHT_DOWN
//!  ---        HORIZ_DOWN
//! ```

use std::{fmt, ops::BitOr};

use serde::{Deserialize, Serialize};

/// A set of lit segments.  Bits above `ALL_SEGS` are only used for the
/// `DECIMAL` token.
#[derive(Clone, Copy, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SegmentMask(u8);

impl SegmentMask {
    /// No segments at all.
    pub const EMPTY: SegmentMask = SegmentMask(0);
    /// The top horizontal segment.
    pub const HORIZ_UP: SegmentMask = SegmentMask(1);
    /// The upper left vertical segment.
    pub const VERT_LEFT_UP: SegmentMask = SegmentMask(2);
    /// The upper right vertical segment.
    pub const VERT_RIGHT_UP: SegmentMask = SegmentMask(4);
    /// The middle horizontal segment.
    pub const HORIZ_MID: SegmentMask = SegmentMask(8);
    /// The lower left vertical segment.
    pub const VERT_LEFT_DOWN: SegmentMask = SegmentMask(16);
    /// The lower right vertical segment.
    pub const VERT_RIGHT_DOWN: SegmentMask = SegmentMask(32);
    /// The bottom horizontal segment.
    pub const HORIZ_DOWN: SegmentMask = SegmentMask(64);
    /// All seven segments.
    pub const ALL_SEGS: SegmentMask = SegmentMask(127);
    /// Token used for a decimal point.
    pub const DECIMAL: SegmentMask = SegmentMask(128);
    /// Token used for a minus sign.
    pub const MINUS: SegmentMask = SegmentMask::HORIZ_MID;

    /// Build a mask from raw bits.
    pub const fn from_bits(bits: u8) -> SegmentMask {
        SegmentMask(bits)
    }

    /// The raw bits of this mask.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// The union of two masks.
    pub const fn union(self, other: SegmentMask) -> SegmentMask {
        SegmentMask(self.0 | other.0)
    }

    /// This mask with every segment of `other` removed.
    pub const fn without(self, other: SegmentMask) -> SegmentMask {
        SegmentMask(self.0 & !other.0)
    }

    /// Does this mask include every segment in `other`?
    pub const fn contains(self, other: SegmentMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SegmentMask {
    type Output = SegmentMask;

    fn bitor(self, rhs: SegmentMask) -> SegmentMask {
        self.union(rhs)
    }
}

impl fmt::Debug for SegmentMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SegmentMask({:#04x})", self.0)
    }
}

impl fmt::LowerHex for SegmentMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Masks for the shapes we know how to name.
pub mod glyph {
    #![allow(missing_docs)]

    use super::SegmentMask as M;

    const UP: M = M::HORIZ_UP;
    const LU: M = M::VERT_LEFT_UP;
    const RU: M = M::VERT_RIGHT_UP;
    const MID: M = M::HORIZ_MID;
    const LD: M = M::VERT_LEFT_DOWN;
    const RD: M = M::VERT_RIGHT_DOWN;
    const DOWN: M = M::HORIZ_DOWN;
    const ALL: M = M::ALL_SEGS;

    pub const ZERO: M = ALL.without(MID);
    pub const ONE: M = RU.union(RD);
    pub const TWO: M = ALL.without(LU.union(RD));
    pub const THREE: M = ALL.without(LU.union(LD));
    pub const FOUR: M = ALL.without(UP.union(LD).union(DOWN));
    pub const FIVE: M = ALL.without(RU.union(LD));
    pub const SIX: M = ALL.without(RU);
    pub const SEVEN: M = UP.union(RU).union(RD);
    /// A seven drawn with the upper left segment as well.
    pub const ALT_SEVEN: M = LU.union(SEVEN);
    pub const EIGHT: M = ALL;
    pub const NINE: M = ALL.without(LD);
    /// A nine drawn without its bottom segment.
    pub const ALT_NINE: M = NINE.without(DOWN);

    pub const HEX_A: M = ALL.without(DOWN);
    pub const HEX_B: M = ALL.without(UP.union(RU));
    pub const HEX_C: M = ALL.without(RU.union(MID).union(RD));
    /// Lowercase `c`.
    pub const HEX_C_SMALL: M = MID.union(LD).union(DOWN);
    pub const HEX_D: M = ALL.without(UP.union(LU));
    pub const HEX_E: M = ALL.without(RU.union(RD));
    pub const HEX_F: M = ALL.without(RU.union(RD).union(DOWN));

    pub const U: M = LD.union(DOWN).union(RD);
    pub const T: M = LU.union(MID).union(LD).union(DOWN);
    pub const L: M = LU.union(LD).union(DOWN);
    pub const H: M = LU.union(MID).union(LD).union(RD);
    pub const R: M = MID.union(LD);
    pub const P: M = ALL.without(RD.union(DOWN));
    pub const N: M = MID.union(LD).union(RD);
    /// Lowercase `o`.
    pub const O: M = MID.union(LD).union(RD).union(DOWN);

    /// The ten digits, indexed by value.
    pub const DIGITS: [M; 10] = [ZERO, ONE, TWO, THREE, FOUR, FIVE, SIX, SEVEN, EIGHT, NINE];
}
