//! Splitting an image into candidate character cells.
//!
//! We walk the image column by column.  A column is "dark" when it contains
//! more than `ignore_pixels` foreground pixels, and each run of dark columns
//! becomes one candidate.  Each candidate's top and bottom are then found
//! the same way, walking its rows.

use log::{debug, trace};

use crate::annotate::Annotator;
use crate::candidate::CandidateBox;
use crate::raster::Raster;
use crate::threshold::PixelPredicate;

/// The state of a column or row scan.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ScanState {
    /// Looking for the start of a character.
    SeekDark,
    /// Inside a character, looking for its end.
    SeekLight,
}

/// Everything the segmenter needs to know about a pass.
#[derive(Clone, Copy, Debug)]
pub struct Segmenter {
    predicate: PixelPredicate,
    ignore_pixels: usize,
}

impl Segmenter {
    /// Create a segmenter which ignores up to `ignore_pixels` stray
    /// foreground pixels per column or row.
    pub fn new(predicate: PixelPredicate, ignore_pixels: usize) -> Segmenter {
        Segmenter {
            predicate,
            ignore_pixels,
        }
    }

    /// Does this run of pixels contain enough foreground to count as dark?
    fn is_dark<I>(&self, luminances: I) -> bool
    where
        I: IntoIterator<Item = u8>,
    {
        let mut found = 0;
        for lum in luminances {
            if self.predicate.is_set(lum) {
                found += 1;
                if found > self.ignore_pixels {
                    return true;
                }
            }
        }
        false
    }

    /// Find runs of dark columns.  Each candidate spans the full height of
    /// the image until `refine_vertical` tightens it.
    pub fn horizontal<R, A>(&self, raster: &R, annotator: &mut A) -> Vec<CandidateBox>
    where
        R: Raster + ?Sized,
        A: Annotator + ?Sized,
    {
        let (width, height) = (raster.width(), raster.height());
        let mut candidates = vec![];
        if width == 0 || height == 0 {
            return candidates;
        }

        let mut state = ScanState::SeekDark;
        let mut x1 = 0;
        for x in 0..width {
            let dark = self.is_dark((0..height).map(|y| raster.luminance(x, y)));
            match (state, dark) {
                (ScanState::SeekDark, true) => {
                    annotator.column_start(x);
                    x1 = x;
                    state = ScanState::SeekLight;
                }
                (ScanState::SeekLight, false) => {
                    annotator.column_end(x);
                    trace!("candidate columns {}..={}", x1, x);
                    candidates.push(CandidateBox::new(x1, 0, x, height - 1));
                    state = ScanState::SeekDark;
                }
                _ => {}
            }
        }
        if state == ScanState::SeekLight {
            annotator.column_end(width - 1);
            trace!("candidate columns {}..={} (image edge)", x1, width - 1);
            candidates.push(CandidateBox::new(x1, 0, width - 1, height - 1));
        }
        debug!("found {} candidates by column", candidates.len());
        candidates
    }

    /// Tighten the top and bottom of `candidate` to its dark rows.
    ///
    /// `y1` is the first dark row.  `y2` is where the last run of dark rows
    /// ends, which lets gaps between segments stay inside the cell.
    pub fn refine_vertical<R, A>(&self, raster: &R, candidate: &mut CandidateBox, annotator: &mut A)
    where
        R: Raster + ?Sized,
        A: Annotator + ?Sized,
    {
        let height = raster.height();
        let (x1, x2) = (candidate.x1, candidate.x2);
        let mut state = ScanState::SeekDark;
        let mut found_top = false;
        for y in 0..height {
            let dark = self.is_dark((x1..=x2).map(|x| raster.luminance(x, y)));
            match (state, dark) {
                (ScanState::SeekDark, true) => {
                    if found_top {
                        candidate.y2 = y;
                    } else {
                        candidate.y1 = y;
                        found_top = true;
                    }
                    annotator.row_boundary(x1, x2, y);
                    state = ScanState::SeekLight;
                }
                (ScanState::SeekLight, false) => {
                    candidate.y2 = y;
                    annotator.row_boundary(x1, x2, y);
                    state = ScanState::SeekDark;
                }
                _ => {}
            }
        }
        if state == ScanState::SeekLight {
            candidate.y2 = height - 1;
            annotator.row_boundary(x1, x2, height - 1);
        }
        trace!(
            "candidate columns {}..={} has rows {}..={}",
            x1,
            x2,
            candidate.y1,
            candidate.y2
        );
    }

    /// Find all candidates and refine each of them.
    pub fn segment<R, A>(&self, raster: &R, annotator: &mut A) -> Vec<CandidateBox>
    where
        R: Raster + ?Sized,
        A: Annotator + ?Sized,
    {
        let mut candidates = self.horizontal(raster, annotator);
        for candidate in &mut candidates {
            self.refine_vertical(raster, candidate, annotator);
        }
        candidates
    }
}
