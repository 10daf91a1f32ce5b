//! Recognition settings.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::charset::Charset;
use crate::filter::{ExpectedCount, MinCharDims};
use crate::luminance::LuminanceFormula;
use crate::spacing::SpacingConfig;
use crate::threshold::{Polarity, Region, ThresholdMode, DEFAULT_THRESHOLD};

/// Everything which controls a recognition pass.
///
/// Deserializing fills in defaults for missing fields; call `validated`
/// afterwards to replace out-of-range values.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecognitionConfig {
    /// Are the segments darker or lighter than the background?
    pub polarity: Polarity,
    /// How to turn colors into luminance.
    pub luminance: LuminanceFormula,
    /// How to choose the foreground threshold.
    pub threshold: ThresholdMode,
    /// Which part of the image to derive the threshold from.
    pub threshold_region: Region,
    /// Foreground pixels a column or row may contain and still count as
    /// background.
    pub ignore_pixels: usize,
    /// Foreground pixels a scan line needs before its segment counts as lit.
    pub need_pixels: usize,
    /// Cells smaller than this in either direction are not scanned, and
    /// minus signs must be at least this tall.
    pub min_segment: usize,
    /// Height-to-width ratio above which a cell is a one.
    pub one_ratio: f64,
    /// Width-to-height ratio at or above which a cell is a minus sign.
    pub minus_ratio: f64,
    /// How many times shorter than the tallest cell a decimal point is.
    pub dec_h_ratio: f64,
    /// How many times narrower than the widest cell a decimal point is.
    pub dec_w_ratio: f64,
    /// How many characters we expect.
    pub expected: ExpectedCount,
    /// Cells smaller than this are discarded as noise.
    pub min_char_dims: MinCharDims,
    /// Detect spaces between characters, if set.
    pub spacing: Option<SpacingConfig>,
    /// Which characters to recognize.
    pub charset: Charset,
    /// Leave decimal points out of the text output.
    pub omit_decimal_point: bool,
}

impl RecognitionConfig {
    /// Default height-to-width ratio for ones.
    pub const ONE_RATIO: f64 = 3.0;
    /// Default width-to-height ratio for minus signs.
    pub const MINUS_RATIO: f64 = 2.0;
    /// Default height ratio for decimal points.
    pub const DEC_H_RATIO: f64 = 5.0;
    /// Default width ratio for decimal points.
    pub const DEC_W_RATIO: f64 = 2.0;

    /// Replace every invalid setting with its default, logging a warning for
    /// each one.
    pub fn validated(mut self) -> RecognitionConfig {
        let defaults = RecognitionConfig::default();

        let t = self.threshold.value();
        if !(0.0..=100.0).contains(&t) {
            warn!("threshold {} is not between 0 and 100, using {}", t, DEFAULT_THRESHOLD);
            self.threshold = self.threshold.with_value(DEFAULT_THRESHOLD);
        }
        if self.need_pixels < 1 {
            warn!("need_pixels must be at least 1, using {}", defaults.need_pixels);
            self.need_pixels = defaults.need_pixels;
        }
        if self.min_segment < 1 {
            warn!("min_segment must be at least 1, using {}", defaults.min_segment);
            self.min_segment = defaults.min_segment;
        }
        for (name, value, default) in [
            ("one_ratio", &mut self.one_ratio, defaults.one_ratio),
            ("minus_ratio", &mut self.minus_ratio, defaults.minus_ratio),
            ("dec_h_ratio", &mut self.dec_h_ratio, defaults.dec_h_ratio),
            ("dec_w_ratio", &mut self.dec_w_ratio, defaults.dec_w_ratio),
        ] {
            // Also rejects NaN.
            if !(*value >= 1.0) {
                warn!("{} must be at least 1, using {}", name, default);
                *value = default;
            }
        }
        if let Some(spacing) = &mut self.spacing {
            if !(spacing.factor > 0.0) {
                warn!(
                    "space factor must be positive, using {}",
                    SpacingConfig::DEFAULT_FACTOR
                );
                spacing.factor = SpacingConfig::DEFAULT_FACTOR;
            }
        }
        self
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        RecognitionConfig {
            polarity: Polarity::default(),
            luminance: LuminanceFormula::default(),
            threshold: ThresholdMode::default(),
            threshold_region: Region::Full,
            ignore_pixels: 0,
            need_pixels: 1,
            min_segment: 1,
            one_ratio: RecognitionConfig::ONE_RATIO,
            minus_ratio: RecognitionConfig::MINUS_RATIO,
            dec_h_ratio: RecognitionConfig::DEC_H_RATIO,
            dec_w_ratio: RecognitionConfig::DEC_W_RATIO,
            expected: ExpectedCount::default(),
            min_char_dims: MinCharDims::default(),
            spacing: None,
            charset: Charset::default(),
            omit_decimal_point: false,
        }
    }
}
