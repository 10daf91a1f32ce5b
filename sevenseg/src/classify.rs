//! Recognizing characters by their shape alone.
//!
//! Ones, minus signs and decimal points are easy to misread by scanning for
//! segments, but they have distinctive proportions.  Each rule here looks
//! at one candidate (and the largest candidate dimensions) and may claim
//! it.  Rules are tried in order and the first match wins.

use log::{debug, trace};

use crate::candidate::{CandidateBox, Classification};
use crate::config::RecognitionConfig;

/// What a geometry rule knows about the whole set of candidates.
#[derive(Clone, Copy, Debug)]
pub struct Geometry<'a> {
    config: &'a RecognitionConfig,
    max_width: usize,
    max_height: usize,
}

impl<'a> Geometry<'a> {
    /// Measure `candidates`.
    pub fn new(config: &'a RecognitionConfig, candidates: &[CandidateBox]) -> Geometry<'a> {
        Geometry {
            config,
            max_width: candidates.iter().map(|c| c.width()).max().unwrap_or(0),
            max_height: candidates.iter().map(|c| c.height()).max().unwrap_or(0),
        }
    }

    /// How many times larger than `part` is `whole`?
    fn ratio(whole: usize, part: usize) -> f64 {
        cast::f64(whole) / cast::f64(part)
    }
}

/// A single shape rule.
pub type Rule = fn(&CandidateBox, &Geometry) -> Option<Classification>;

/// The rules, in the order they're tried.
pub const RULES: &[(&str, Rule)] = &[("one", one), ("decimal", decimal), ("minus", minus)];

/// Much taller than wide.
pub fn one(c: &CandidateBox, g: &Geometry) -> Option<Classification> {
    let (w, h) = (c.width(), c.height());
    (w >= 1 && Geometry::ratio(h, w) > g.config.one_ratio).then_some(Classification::One)
}

/// Much smaller than the largest candidate in both directions.
pub fn decimal(c: &CandidateBox, g: &Geometry) -> Option<Classification> {
    let (w, h) = (c.width(), c.height());
    (w > 0
        && h > 0
        && Geometry::ratio(g.max_height, h) > g.config.dec_h_ratio
        && Geometry::ratio(g.max_width, w) > g.config.dec_w_ratio)
        .then_some(Classification::Decimal)
}

/// Much wider than tall.
pub fn minus(c: &CandidateBox, g: &Geometry) -> Option<Classification> {
    let (w, h) = (c.width(), c.height());
    (h > 0 && h >= g.config.min_segment && Geometry::ratio(w, h) >= g.config.minus_ratio)
        .then_some(Classification::Minus)
}

/// Apply `RULES` to every unclassified candidate.
pub fn classify_geometry(config: &RecognitionConfig, candidates: &mut [CandidateBox]) {
    let geometry = Geometry::new(config, candidates);
    for c in candidates.iter_mut().filter(|c| c.classification.is_unknown()) {
        let found = RULES
            .iter()
            .find_map(|&(name, rule)| rule(c, &geometry).map(|class| (name, class)));
        if let Some((name, class)) = found {
            trace!("candidate at x={} matched the {} rule", c.x1, name);
            c.classify(class);
        }
    }
}

/// When the widest candidate is a one, every other candidate is too narrow
/// for the width test in `decimal`, so look for decimal points by height
/// alone.  The leftmost of equally wide candidates counts as the widest.
pub fn decimal_repass(config: &RecognitionConfig, candidates: &mut [CandidateBox]) {
    let geometry = Geometry::new(config, candidates);
    let widest = candidates.iter().find(|c| c.width() == geometry.max_width);
    if widest.map(|c| c.classification) != Some(Classification::One) {
        return;
    }
    debug!("widest candidate is a one, looking for decimal points by height");
    for c in candidates.iter_mut().filter(|c| c.classification.is_unknown()) {
        let h = c.height();
        if h > 0 && Geometry::ratio(geometry.max_height, h) > config.dec_h_ratio {
            trace!("candidate at x={} is a decimal point by height", c.x1);
            c.classify(Classification::Decimal);
        }
    }
}
