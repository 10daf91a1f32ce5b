//! Recognize the characters shown on seven-segment displays.
//!
//! ```no_run
//! use sevenseg::{NoAnnotations, RecognitionConfig, Recognizer};
//!
//! let image = sevenseg::image::open("meter.png").unwrap().to_rgba8();
//! let recognizer = Recognizer::new(RecognitionConfig::default());
//! let recognition = recognizer.recognize_image(&image, &mut NoAnnotations).unwrap();
//! println!("{}", recognition.text());
//! ```
//!
//! Recognition works in stages:
//!
//! 1. Pick a luminance threshold separating segments from background.
//! 2. Split the image into runs of foreground columns, then tighten each
//!    run to its foreground rows.
//! 3. Drop tiny candidates and check that the expected number remain.
//! 4. Recognize ones, minus signs and decimal points by their proportions.
//! 5. Scan everything else for lit segments.
//! 6. Optionally infer spaces, then map everything to characters.

#![warn(missing_docs)]

pub use image;

pub mod annotate;
pub mod candidate;
pub mod charset;
pub mod classify;
pub mod config;
mod errors;
pub mod filter;
pub mod luminance;
pub mod mask;
pub mod raster;
pub mod recognizer;
pub mod scan;
pub mod segment;
pub mod spacing;
#[cfg(test)]
mod test_util;
pub mod threshold;

pub use self::annotate::{Annotator, DebugImage, NoAnnotations};
pub use self::candidate::{CandidateBox, Classification};
pub use self::charset::Charset;
pub use self::config::RecognitionConfig;
pub use self::errors::{Error, Result};
pub use self::filter::{ExpectedCount, MinCharDims};
pub use self::luminance::LuminanceFormula;
pub use self::mask::SegmentMask;
pub use self::raster::{LumaMap, Raster};
pub use self::recognizer::{Recognition, RecognizedChar, Recognizer, Status};
pub use self::spacing::{SpacingBase, SpacingConfig};
pub use self::threshold::{Polarity, Region, ThresholdMode};
