//! Discarding candidates which are too small, and checking that we found as
//! many characters as expected.

use std::{fmt, str::FromStr};

use log::debug;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::annotate::Annotator;
use crate::candidate::CandidateBox;
use crate::errors::*;

/// How many characters we expect to find.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExpectedCount {
    /// Accept any number of characters, as long as there's at least one.
    Auto,
    /// Accept between `min` and `max` characters, inclusive.
    Range {
        /// The fewest characters we accept.
        min: usize,
        /// The most characters we accept.
        max: usize,
    },
}

impl ExpectedCount {
    /// Expect exactly `n` characters.
    pub fn exactly(n: usize) -> ExpectedCount {
        ExpectedCount::Range { min: n, max: n }
    }

    /// Check `found` against this expectation.
    pub fn check(self, found: usize) -> Result<()> {
        if found == 0 {
            return Err(Error::NoCandidates);
        }
        match self {
            ExpectedCount::Auto => Ok(()),
            ExpectedCount::Range { min, max } if found < min || found > max => {
                Err(Error::CountMismatch { found, min, max })
            }
            ExpectedCount::Range { .. } => Ok(()),
        }
    }
}

impl Default for ExpectedCount {
    fn default() -> Self {
        ExpectedCount::exactly(6)
    }
}

impl fmt::Display for ExpectedCount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ExpectedCount::Auto => write!(f, "-1"),
            ExpectedCount::Range { min, max } if min == max => write!(f, "{}", min),
            ExpectedCount::Range { min, max } => write!(f, "{}-{}", min, max),
        }
    }
}

impl FromStr for ExpectedCount {
    type Err = Error;

    /// Parse `N`, `MIN-MAX` or `-1` (meaning "any number").
    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::unknown_keyword("number of digits", s);
        let s = s.trim();
        if s == "-1" {
            return Ok(ExpectedCount::Auto);
        }
        let parse = |n: &str| n.trim().parse::<usize>().map_err(|_| bad());
        let (min, max) = match s.split_once('-') {
            Some((min, max)) => (parse(min)?, parse(max)?),
            None => {
                let n = parse(s)?;
                (n, n)
            }
        };
        if min == 0 || min > max {
            return Err(bad());
        }
        Ok(ExpectedCount::Range { min, max })
    }
}

impl Serialize for ExpectedCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ExpectedCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n.to_string().parse().map_err(de::Error::custom),
            Raw::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

/// The smallest candidate we'll consider a character.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MinCharDims {
    /// Minimum width, in pixels.
    pub width: usize,
    /// Minimum height, in pixels.
    pub height: usize,
}

impl Default for MinCharDims {
    fn default() -> Self {
        MinCharDims {
            width: 1,
            height: 1,
        }
    }
}

impl FromStr for MinCharDims {
    type Err = Error;

    /// Parse `WIDTHxHEIGHT`.
    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::unknown_keyword("character dimensions", s);
        let (w, h) = s.split_once(|c| c == 'x' || c == 'X').ok_or_else(bad)?;
        Ok(MinCharDims {
            width: w.trim().parse().map_err(|_| bad())?,
            height: h.trim().parse().map_err(|_| bad())?,
        })
    }
}

/// Remove undersized candidates, then make sure the right number are left.
pub fn filter_candidates<A>(
    mut candidates: Vec<CandidateBox>,
    min_dims: MinCharDims,
    expected: ExpectedCount,
    annotator: &mut A,
) -> Result<Vec<CandidateBox>>
where
    A: Annotator + ?Sized,
{
    let before = candidates.len();
    candidates.retain(|c| c.width() >= min_dims.width && c.height() >= min_dims.height);
    debug!(
        "{} of {} candidates are at least {}x{}",
        candidates.len(),
        before,
        min_dims.width,
        min_dims.height
    );
    expected.check(candidates.len())?;
    for c in &candidates {
        annotator.candidate(c);
    }
    Ok(candidates)
}
