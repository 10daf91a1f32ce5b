//! Candidate character cells and what we've decided about them.

use serde::Serialize;

use crate::mask::{glyph, SegmentMask};

/// What a candidate has been recognized as.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "mask")]
pub enum Classification {
    /// Not classified yet, or could not be classified.
    #[default]
    Unknown,
    /// Classified by scanning for lit segments.
    SegmentMask(SegmentMask),
    /// Tall and narrow: the digit one.
    One,
    /// Wide and flat: a minus sign.
    Minus,
    /// Small compared to its neighbors: a decimal point.
    Decimal,
}

impl Classification {
    /// The segment mask used to look this classification up in a charset,
    /// or `None` if the candidate was never classified.
    pub fn mask(self) -> Option<SegmentMask> {
        match self {
            Classification::Unknown => None,
            Classification::SegmentMask(mask) => Some(mask),
            Classification::One => Some(glyph::ONE),
            Classification::Minus => Some(SegmentMask::MINUS),
            Classification::Decimal => Some(SegmentMask::DECIMAL),
        }
    }

    /// Has this candidate been classified yet?
    pub fn is_unknown(self) -> bool {
        self == Classification::Unknown
    }
}

/// A candidate character cell.
///
/// `x2` and `y2` are the first column and row where the cell returned to
/// background, or the last column and row of the image.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct CandidateBox {
    /// Left edge.
    pub x1: usize,
    /// Right edge.
    pub x2: usize,
    /// Top edge.
    pub y1: usize,
    /// Bottom edge.
    pub y2: usize,
    /// What we've recognized this as.
    pub classification: Classification,
    /// The number of spaces to print after this character.
    pub spaces: u32,
}

impl CandidateBox {
    /// Create an unclassified candidate.
    pub fn new(x1: usize, y1: usize, x2: usize, y2: usize) -> CandidateBox {
        debug_assert!(x1 <= x2 && y1 <= y2);
        CandidateBox {
            x1,
            x2,
            y1,
            y2,
            classification: Classification::Unknown,
            spaces: 0,
        }
    }

    /// `x2 - x1`.
    pub fn width(&self) -> usize {
        self.x2 - self.x1
    }

    /// `y2 - y1`.
    pub fn height(&self) -> usize {
        self.y2 - self.y1
    }

    /// Record a classification, unless one was already made.
    pub fn classify(&mut self, classification: Classification) {
        if self.classification.is_unknown() {
            self.classification = classification;
        }
    }
}

#[test]
fn first_classification_wins() {
    let mut b = CandidateBox::new(0, 0, 2, 10);
    b.classify(Classification::One);
    b.classify(Classification::Minus);
    assert_eq!(b.classification, Classification::One);
    assert_eq!(b.width(), 2);
    assert_eq!(b.height(), 10);
}

#[test]
fn special_classifications_have_masks() {
    assert_eq!(Classification::Unknown.mask(), None);
    assert_eq!(Classification::One.mask(), Some(glyph::ONE));
    assert_eq!(Classification::Minus.mask(), Some(SegmentMask::HORIZ_MID));
    assert_eq!(Classification::Decimal.mask(), Some(SegmentMask::DECIMAL));
}
