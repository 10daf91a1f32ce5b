//! Classifying a candidate by looking for lit segments.
//!
//! We sample three lines through each cell: one vertical line through the
//! middle (crossing the three horizontal segments) and two horizontal lines
//! at one and three quarters of the height (crossing the four vertical
//! segments).  A segment is lit when enough of the pixels on its part of a
//! line are foreground.

use std::ops::Range;

use log::trace;

use crate::annotate::{Annotator, ScanPart};
use crate::candidate::{CandidateBox, Classification};
use crate::mask::SegmentMask;
use crate::raster::Raster;
use crate::threshold::PixelPredicate;

/// Scans candidates for segments.
#[derive(Clone, Copy, Debug)]
pub struct SegmentScanner {
    predicate: PixelPredicate,
    need_pixels: usize,
    min_segment: usize,
}

impl SegmentScanner {
    /// A segment needs at least `need_pixels` foreground pixels on a scan
    /// line, and cells smaller than `min_segment` in either direction are
    /// not scanned at all.
    pub fn new(
        predicate: PixelPredicate,
        need_pixels: usize,
        min_segment: usize,
    ) -> SegmentScanner {
        SegmentScanner {
            predicate,
            need_pixels,
            min_segment,
        }
    }

    /// Count the foreground pixels in `pixels`, annotating each of them.
    fn count<R, A, I>(&self, raster: &R, annotator: &mut A, part: ScanPart, pixels: I) -> usize
    where
        R: Raster + ?Sized,
        A: Annotator + ?Sized,
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut found = 0;
        for (x, y) in pixels {
            if self.predicate.is_set_at(raster, x, y) {
                annotator.scanned_pixel(x, y, part);
                found += 1;
            }
        }
        found
    }

    /// Work out which segments of `c` are lit.
    pub fn scan<R, A>(&self, raster: &R, c: &CandidateBox, annotator: &mut A) -> SegmentMask
    where
        R: Raster + ?Sized,
        A: Annotator + ?Sized,
    {
        let (x1, x2, y1, y2) = (c.x1, c.x2, c.y1, c.y2);
        let mid_x = (x1 + x2) / 2;
        let third = (y2 - y1) / 3;
        let q1 = y1 + (y2 - y1) / 4;
        let q3 = y1 + 3 * (y2 - y1) / 4;

        let need = self.need_pixels;
        let lit = |count: usize, segment: SegmentMask| {
            if count >= need {
                segment
            } else {
                SegmentMask::EMPTY
            }
        };

        let vertical = |ys: Range<usize>| ys.map(move |y| (mid_x, y));
        let up = self.count(raster, annotator, ScanPart::UpperThird, vertical(y1..y1 + third));
        let mid = self.count(
            raster,
            annotator,
            ScanPart::MiddleThird,
            vertical(y1 + third..y1 + 2 * third),
        );
        let down = self.count(
            raster,
            annotator,
            ScanPart::LowerThird,
            vertical(y1 + 2 * third..y2 + 1),
        );
        let mut mask = lit(up, SegmentMask::HORIZ_UP)
            | lit(mid, SegmentMask::HORIZ_MID)
            | lit(down, SegmentMask::HORIZ_DOWN);

        for (y, left_segment, right_segment) in [
            (q1, SegmentMask::VERT_LEFT_UP, SegmentMask::VERT_RIGHT_UP),
            (q3, SegmentMask::VERT_LEFT_DOWN, SegmentMask::VERT_RIGHT_DOWN),
        ] {
            let left = self.count(
                raster,
                annotator,
                ScanPart::LeftHalf,
                (x1..=mid_x).map(|x| (x, y)),
            );
            let right = self.count(
                raster,
                annotator,
                ScanPart::RightHalf,
                (mid_x + 1..=x2).map(|x| (x, y)),
            );
            mask = mask | lit(left, left_segment) | lit(right, right_segment);
        }

        trace!("candidate at x={} has segments {:?}", c.x1, mask);
        mask
    }

    /// Scan every candidate which geometry couldn't classify.
    pub fn classify_all<R, A>(&self, raster: &R, candidates: &mut [CandidateBox], annotator: &mut A)
    where
        R: Raster + ?Sized,
        A: Annotator + ?Sized,
    {
        for c in candidates.iter_mut().filter(|c| c.classification.is_unknown()) {
            if c.width() < self.min_segment || c.height() < self.min_segment {
                trace!("candidate at x={} is too small to scan", c.x1);
                continue;
            }
            let mask = self.scan(raster, c, annotator);
            c.classify(Classification::SegmentMask(mask));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::annotate::NoAnnotations;
    use crate::mask::glyph;
    use crate::test_util::{render_glyphs, GLYPH_HEIGHT, GLYPH_WIDTH, MARGIN};
    use crate::threshold::Polarity;

    fn scanner() -> SegmentScanner {
        SegmentScanner::new(PixelPredicate::new(Polarity::ForegroundDark, 50.0), 1, 1)
    }

    /// The box the segmenter would produce for a full-height glyph drawn at
    /// the first position.
    fn first_cell() -> CandidateBox {
        CandidateBox::new(
            MARGIN,
            MARGIN,
            MARGIN + GLYPH_WIDTH,
            MARGIN + GLYPH_HEIGHT,
        )
    }

    #[test]
    fn scans_every_digit() {
        for (digit, &mask) in glyph::DIGITS.iter().enumerate() {
            if mask == glyph::ONE {
                // A lone one is narrower than its cell.
                continue;
            }
            let raster = render_glyphs(&[mask]);
            let found = scanner().scan(&raster, &first_cell(), &mut NoAnnotations);
            assert_eq!(found, mask, "digit {}", digit);
        }
    }

    #[test]
    fn need_pixels_rejects_thin_strokes() {
        let raster = render_glyphs(&[glyph::EIGHT]);
        let strict = SegmentScanner::new(PixelPredicate::new(Polarity::ForegroundDark, 50.0), 3, 1);
        // Strokes are two pixels thick.
        assert_eq!(strict.scan(&raster, &first_cell(), &mut NoAnnotations), SegmentMask::EMPTY);
    }

    #[test]
    fn tiny_candidates_stay_unknown() {
        let raster = render_glyphs(&[glyph::EIGHT]);
        let mut cells = vec![first_cell()];
        let picky = SegmentScanner::new(PixelPredicate::new(Polarity::ForegroundDark, 50.0), 1, 50);
        picky.classify_all(&raster, &mut cells, &mut NoAnnotations);
        assert_eq!(cells[0].classification, Classification::Unknown);
        scanner().classify_all(&raster, &mut cells, &mut NoAnnotations);
        assert_eq!(cells[0].classification, Classification::SegmentMask(glyph::EIGHT));
    }
}
