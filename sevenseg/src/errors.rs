//! Error and result types.

use std::result;

use thiserror::Error;

/// Our standard result type.
pub type Result<T, E = Error> = result::Result<T, E>;

/// Errors which can be returned by this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// We found a different number of characters than the caller expected.
    #[error("found {found}, expected {}", describe_expected(.min, .max))]
    CountMismatch {
        /// The number of candidates which survived filtering.
        found: usize,
        /// The minimum number of characters we expected.
        min: usize,
        /// The maximum number of characters we expected.
        max: usize,
    },

    /// Segmentation did not find anything that looks like a character.
    #[error("no characters found in image")]
    NoCandidates,

    /// A coordinate or count did not fit into the integer type we needed.
    #[error("{what} is out of range: {value}")]
    Overflow {
        /// The quantity that overflowed.
        what: &'static str,
        /// The value that could not be converted, as text.
        value: String,
    },

    /// We were given a keyword we don't recognize.
    #[error("unknown {kind} {keyword:?}")]
    UnknownKeyword {
        /// What kind of keyword we were parsing (`"charset"`, etc.).
        kind: &'static str,
        /// The keyword we were given.
        keyword: String,
    },
}

impl Error {
    /// Build an `Overflow` error for `value`.
    pub(crate) fn overflow(what: &'static str, value: impl ToString) -> Error {
        Error::Overflow {
            what,
            value: value.to_string(),
        }
    }

    /// Build an `UnknownKeyword` error.
    pub(crate) fn unknown_keyword(kind: &'static str, keyword: &str) -> Error {
        Error::UnknownKeyword {
            kind,
            keyword: keyword.to_owned(),
        }
    }
}

fn describe_expected(min: &usize, max: &usize) -> String {
    if min == max {
        min.to_string()
    } else {
        format!("between {} and {}", min, max)
    }
}

#[test]
fn count_mismatch_describes_expected_range() {
    let exact = Error::CountMismatch {
        found: 3,
        min: 4,
        max: 4,
    };
    assert_eq!(exact.to_string(), "found 3, expected 4");

    let range = Error::CountMismatch {
        found: 7,
        min: 2,
        max: 5,
    };
    assert_eq!(range.to_string(), "found 7, expected between 2 and 5");
}
