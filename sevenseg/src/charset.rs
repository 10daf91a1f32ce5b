//! Mapping segment masks to characters.

use std::{fmt, str::FromStr};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::candidate::Classification;
use crate::errors::*;
use crate::mask::{glyph, SegmentMask};

/// The character printed for anything we couldn't recognize.
pub const UNKNOWN_CHAR: char = '_';

/// A lookup table from every possible mask to a character.
type Table = [Option<char>; 256];

/// Which characters to recognize.  Shapes outside the charset are reported
/// as unknown.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Charset {
    /// Digits, decimal point, minus, hex letters and `u t l h r p n`.
    #[default]
    Full,
    /// Digits only.
    Digits,
    /// Digits, decimal point and minus.
    Decimal,
    /// Digits, decimal point, minus and hex letters.
    Hex,
    /// The characters shown by table tennis robot displays: digits, minus,
    /// decimal point and the lowercase letters they use in messages.
    TtRobot,
}

impl Charset {
    /// Every charset, in the order we list them in help output.
    pub const ALL: [Charset; 5] = [
        Charset::Full,
        Charset::Digits,
        Charset::Decimal,
        Charset::Hex,
        Charset::TtRobot,
    ];

    /// The keyword used to select this charset.
    pub fn keyword(self) -> &'static str {
        match self {
            Charset::Full => "full",
            Charset::Digits => "digits",
            Charset::Decimal => "decimal",
            Charset::Hex => "hex",
            Charset::TtRobot => "tt_robot",
        }
    }

    fn table(self) -> &'static Table {
        match self {
            Charset::Full => &FULL,
            Charset::Digits => &DIGITS,
            Charset::Decimal => &DECIMAL,
            Charset::Hex => &HEX,
            Charset::TtRobot => &TT_ROBOT,
        }
    }

    /// Look up `mask`, returning `None` if it has no character.
    pub fn lookup(self, mask: SegmentMask) -> Option<char> {
        self.table()[usize::from(mask.bits())]
    }

    /// The character for `classification`, or `UNKNOWN_CHAR`.
    pub fn character(self, classification: Classification) -> char {
        classification
            .mask()
            .and_then(|mask| self.lookup(mask))
            .unwrap_or(UNKNOWN_CHAR)
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Charset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Charset::ALL
            .iter()
            .copied()
            .find(|cs| cs.keyword().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::unknown_keyword("charset", s))
    }
}

/// Build a table from `(mask, char)` pairs.
fn table(entries: &[&[(SegmentMask, char)]]) -> Table {
    let mut table = [None; 256];
    for &(mask, c) in entries.iter().flat_map(|e| e.iter()) {
        table[usize::from(mask.bits())] = Some(c);
    }
    table
}

const DIGIT_ENTRIES: &[(SegmentMask, char)] = &[
    (glyph::ZERO, '0'),
    (glyph::ONE, '1'),
    (glyph::TWO, '2'),
    (glyph::THREE, '3'),
    (glyph::FOUR, '4'),
    (glyph::FIVE, '5'),
    (glyph::SIX, '6'),
    (glyph::SEVEN, '7'),
    (glyph::ALT_SEVEN, '7'),
    (glyph::EIGHT, '8'),
    (glyph::NINE, '9'),
    (glyph::ALT_NINE, '9'),
];

/// A six without its top segment looks like a `b`; in digit-only charsets
/// it can only be a six.
const SIX_WITHOUT_TOP: &[(SegmentMask, char)] = &[(glyph::HEX_B, '6')];

const SIGNS: &[(SegmentMask, char)] = &[(SegmentMask::DECIMAL, '.'), (SegmentMask::MINUS, '-')];

const HEX_LETTERS: &[(SegmentMask, char)] = &[
    (glyph::HEX_A, 'a'),
    (glyph::HEX_B, 'b'),
    (glyph::HEX_C, 'c'),
    (glyph::HEX_C_SMALL, 'c'),
    (glyph::HEX_D, 'd'),
    (glyph::HEX_E, 'e'),
    (glyph::HEX_F, 'f'),
];

const OTHER_LETTERS: &[(SegmentMask, char)] = &[
    (glyph::U, 'u'),
    (glyph::T, 't'),
    (glyph::L, 'l'),
    (glyph::H, 'h'),
    (glyph::R, 'r'),
    (glyph::P, 'p'),
    (glyph::N, 'n'),
];

const ROBOT_LETTERS: &[(SegmentMask, char)] = &[
    (glyph::HEX_B, 'b'),
    (glyph::HEX_C_SMALL, 'c'),
    (glyph::HEX_D, 'd'),
    (glyph::HEX_E, 'e'),
    (glyph::HEX_F, 'f'),
    (glyph::H, 'h'),
    (glyph::L, 'l'),
    (glyph::N, 'n'),
    (glyph::O, 'o'),
    (glyph::P, 'p'),
    (glyph::R, 'r'),
    (glyph::T, 't'),
    (glyph::U, 'u'),
];

lazy_static! {
    static ref FULL: Table = table(&[DIGIT_ENTRIES, SIGNS, HEX_LETTERS, OTHER_LETTERS]);
    static ref DIGITS: Table = table(&[DIGIT_ENTRIES, SIX_WITHOUT_TOP]);
    static ref DECIMAL: Table = table(&[DIGIT_ENTRIES, SIX_WITHOUT_TOP, SIGNS]);
    static ref HEX: Table = table(&[DIGIT_ENTRIES, SIGNS, HEX_LETTERS]);
    static ref TT_ROBOT: Table = table(&[DIGIT_ENTRIES, SIGNS, ROBOT_LETTERS]);
}
