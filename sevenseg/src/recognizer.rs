//! Running the whole recognition pipeline over one image.

use std::fmt::Write as _;

use image::RgbaImage;
use log::{debug, info};
use serde::Serialize;

use crate::annotate::Annotator;
use crate::candidate::{CandidateBox, Classification};
use crate::charset::{Charset, UNKNOWN_CHAR};
use crate::classify::{classify_geometry, decimal_repass};
use crate::config::RecognitionConfig;
use crate::errors::*;
use crate::filter::filter_candidates;
use crate::mask::SegmentMask;
use crate::raster::{LumaMap, Raster};
use crate::scan::SegmentScanner;
use crate::segment::Segmenter;
use crate::spacing::infer_spaces;
use crate::threshold::{resolve_threshold, PixelPredicate, ThresholdAnomaly, ThresholdEstimate};

/// How well recognition went.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Every character was recognized.
    Success,
    /// Some characters could not be recognized.
    PartialUnknown,
}

/// One recognized character.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecognizedChar {
    /// Where we found it.
    pub bbox: CandidateBox,
    /// The character, or `UNKNOWN_CHAR`.
    pub character: char,
}

impl RecognizedChar {
    /// Did we fail to recognize this character?
    pub fn is_unknown(&self) -> bool {
        self.character == UNKNOWN_CHAR
    }
}

/// The result of recognizing an image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recognition {
    /// The threshold we used, as a percentage.
    pub threshold: f64,
    /// Set if threshold estimation hit a problem.
    pub threshold_anomaly: Option<ThresholdAnomaly>,
    /// The characters, left to right.
    pub characters: Vec<RecognizedChar>,
    /// How many characters we couldn't recognize.
    pub unknown_count: usize,
    /// Our overall verdict.
    pub status: Status,
    /// Whether `text` leaves out decimal points.
    #[serde(skip)]
    omit_decimal_point: bool,
}

impl Recognition {
    /// The recognized text, with inferred spaces.
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(self.characters.len());
        for c in &self.characters {
            if !(self.omit_decimal_point && c.bbox.classification == Classification::Decimal) {
                text.push(c.character);
            }
            text.extend((0..c.bbox.spaces).map(|_| ' '));
        }
        text
    }

    /// Each character's segment mask as two hex digits, with inferred
    /// spaces.  Unrecognized characters are `00`.
    pub fn hex(&self) -> String {
        let mut hex = String::with_capacity(2 * self.characters.len());
        for c in &self.characters {
            let mask = c.bbox.classification.mask().unwrap_or(SegmentMask::EMPTY);
            // Writing to a `String` can't fail.
            let _ = write!(hex, "{:02x}", mask);
            hex.extend((0..c.bbox.spaces).map(|_| ' '));
        }
        hex
    }
}

/// Recognizes seven-segment displays.
#[derive(Clone, Debug)]
pub struct Recognizer {
    config: RecognitionConfig,
}

impl Recognizer {
    /// Create a recognizer.  Invalid settings are replaced by defaults.
    pub fn new(config: RecognitionConfig) -> Recognizer {
        Recognizer {
            config: config.validated(),
        }
    }

    /// Our settings.
    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    /// Recognize the display in `image`, deriving the threshold from it.
    pub fn recognize_image<A>(&self, image: &RgbaImage, annotator: &mut A) -> Result<Recognition>
    where
        A: Annotator + ?Sized,
    {
        let raster = LumaMap::from_rgba(image, self.config.luminance);
        self.recognize(&raster, annotator)
    }

    /// Recognize the display in `raster`, deriving the threshold from it.
    pub fn recognize<R, A>(&self, raster: &R, annotator: &mut A) -> Result<Recognition>
    where
        R: Raster + ?Sized,
        A: Annotator + ?Sized,
    {
        let estimate =
            resolve_threshold(raster, self.config.threshold_region, self.config.threshold);
        self.recognize_with_estimate(raster, estimate, annotator)
    }

    /// Recognize the display in `raster` using a threshold estimated
    /// earlier, keeping any anomaly the estimate ran into.
    pub fn recognize_with_estimate<R, A>(
        &self,
        raster: &R,
        estimate: ThresholdEstimate,
        annotator: &mut A,
    ) -> Result<Recognition>
    where
        R: Raster + ?Sized,
        A: Annotator + ?Sized,
    {
        let mut recognition = self.recognize_with_threshold(raster, estimate.value, annotator)?;
        recognition.threshold_anomaly = estimate.anomaly;
        Ok(recognition)
    }

    /// Recognize the display in `raster` using a threshold we already know.
    pub fn recognize_with_threshold<R, A>(
        &self,
        raster: &R,
        threshold: f64,
        annotator: &mut A,
    ) -> Result<Recognition>
    where
        R: Raster + ?Sized,
        A: Annotator + ?Sized,
    {
        let config = &self.config;
        info!(
            "recognizing {}x{} image at threshold {:.2}%",
            raster.width(),
            raster.height(),
            threshold
        );
        let predicate = PixelPredicate::new(config.polarity, threshold);

        let segmenter = Segmenter::new(predicate, config.ignore_pixels);
        let candidates = segmenter.segment(raster, annotator);
        let mut candidates =
            filter_candidates(candidates, config.min_char_dims, config.expected, annotator)?;

        classify_geometry(config, &mut candidates);
        decimal_repass(config, &mut candidates);
        SegmentScanner::new(predicate, config.need_pixels, config.min_segment).classify_all(
            raster,
            &mut candidates,
            annotator,
        );
        if let Some(spacing) = &config.spacing {
            infer_spaces(spacing, &mut candidates)?;
        }

        Ok(self.finish(threshold, candidates))
    }

    fn finish(&self, threshold: f64, candidates: Vec<CandidateBox>) -> Recognition {
        let charset: Charset = self.config.charset;
        let characters = candidates
            .into_iter()
            .map(|bbox| RecognizedChar {
                character: charset.character(bbox.classification),
                bbox,
            })
            .collect::<Vec<_>>();
        let unknown_count = characters.iter().filter(|c| c.is_unknown()).count();
        let status = if unknown_count == 0 {
            Status::Success
        } else {
            Status::PartialUnknown
        };
        debug!(
            "recognized {} characters, {} unknown",
            characters.len(),
            unknown_count
        );
        Recognition {
            threshold,
            threshold_anomaly: None,
            characters,
            unknown_count,
            status,
            omit_decimal_point: self.config.omit_decimal_point,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::annotate::{DebugImage, NoAnnotations};
    use crate::filter::ExpectedCount;
    use crate::mask::glyph;
    use crate::spacing::SpacingConfig;
    use crate::test_util::{render_glyphs, render_layout, GAP};
    use crate::threshold::{Polarity, ThresholdMode};

    fn recognizer(expected: ExpectedCount) -> Recognizer {
        Recognizer::new(RecognitionConfig {
            expected,
            ..RecognitionConfig::default()
        })
    }

    fn read(masks: &[SegmentMask]) -> Recognition {
        let _ = env_logger::builder().is_test(true).try_init();
        let raster = render_glyphs(masks);
        recognizer(ExpectedCount::Auto)
            .recognize(&raster, &mut NoAnnotations)
            .unwrap()
    }

    #[test]
    fn reads_all_digits() {
        let recognition = read(&glyph::DIGITS);
        assert_eq!(recognition.text(), "0123456789");
        assert_eq!(recognition.status, Status::Success);
        assert_eq!(recognition.unknown_count, 0);
    }

    #[test]
    fn reads_signs() {
        let recognition = read(&[
            SegmentMask::MINUS,
            glyph::FOUR,
            glyph::TWO,
            SegmentMask::DECIMAL,
            glyph::SEVEN,
        ]);
        assert_eq!(recognition.text(), "-42.7");
        assert_eq!(recognition.hex(), "082e5d8025");
    }

    #[test]
    fn omits_decimal_point_on_request() {
        let raster = render_glyphs(&[glyph::THREE, SegmentMask::DECIMAL, glyph::FIVE]);
        let recognizer = Recognizer::new(RecognitionConfig {
            expected: ExpectedCount::Auto,
            omit_decimal_point: true,
            ..RecognitionConfig::default()
        });
        let recognition = recognizer.recognize(&raster, &mut NoAnnotations).unwrap();
        assert_eq!(recognition.text(), "35");
        assert_eq!(recognition.characters.len(), 3);
    }

    #[test]
    fn decimal_point_after_ones() {
        let recognition = read(&[glyph::ONE, SegmentMask::DECIMAL, glyph::ONE]);
        assert_eq!(recognition.text(), "1.1");
    }

    #[test]
    fn recognition_is_idempotent() {
        let raster = render_glyphs(&[glyph::NINE, glyph::ZERO, glyph::ONE]);
        let recognizer = recognizer(ExpectedCount::exactly(3));
        let first = recognizer.recognize(&raster, &mut NoAnnotations).unwrap();
        let second = recognizer.recognize(&raster, &mut NoAnnotations).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn characters_are_in_left_to_right_order() {
        let recognition = read(&[glyph::EIGHT, glyph::ONE, glyph::SIX, glyph::TWO]);
        let lefts = recognition
            .characters
            .iter()
            .map(|c| c.bbox.x1)
            .collect::<Vec<_>>();
        assert!(lefts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn wrong_count_is_an_error() {
        let raster = render_glyphs(&[glyph::ONE, glyph::TWO, glyph::THREE]);
        let err = recognizer(ExpectedCount::exactly(4))
            .recognize(&raster, &mut NoAnnotations)
            .unwrap_err();
        assert_eq!(err.to_string(), "found 3, expected 4");
    }

    #[test]
    fn blank_image_has_no_candidates() {
        let raster = render_glyphs(&[]);
        let err = recognizer(ExpectedCount::Auto)
            .recognize_with_threshold(&raster, 50.0, &mut NoAnnotations)
            .unwrap_err();
        assert!(matches!(err, Error::NoCandidates));
    }

    #[test]
    fn unknown_shapes_are_reported() {
        let odd = SegmentMask::HORIZ_UP | SegmentMask::VERT_LEFT_UP | SegmentMask::VERT_LEFT_DOWN;
        let recognition = read(&[glyph::TWO, odd, glyph::FIVE]);
        assert_eq!(recognition.text(), "2_5");
        assert_eq!(recognition.unknown_count, 1);
        assert_eq!(recognition.status, Status::PartialUnknown);
    }

    #[test]
    fn spaces_are_inferred() {
        let raster = render_layout(&[
            (glyph::ONE, GAP),
            (glyph::TWO, GAP),
            (glyph::THREE, 3 * GAP),
            (glyph::FOUR, GAP),
        ]);
        let recognizer = Recognizer::new(RecognitionConfig {
            expected: ExpectedCount::Auto,
            spacing: Some(SpacingConfig::default()),
            ..RecognitionConfig::default()
        });
        let recognition = recognizer.recognize(&raster, &mut NoAnnotations).unwrap();
        assert_eq!(recognition.text(), "12 34");
    }

    #[test]
    fn light_on_dark_display() {
        let mut raster = render_glyphs(&[glyph::FIVE, glyph::EIGHT]);
        for y in 0..raster.height() {
            for x in 0..raster.width() {
                let lum = raster.luminance(x, y);
                raster.set(x, y, 255 - lum);
            }
        }
        let recognizer = Recognizer::new(RecognitionConfig {
            polarity: Polarity::ForegroundLight,
            threshold: ThresholdMode::Iterative(50.0),
            expected: ExpectedCount::exactly(2),
            ..RecognitionConfig::default()
        });
        let recognition = recognizer.recognize(&raster, &mut NoAnnotations).unwrap();
        assert_eq!(recognition.text(), "58");
    }

    #[test]
    fn threshold_anomalies_are_reported() {
        // Seeding at 100% puts every pixel in the dark class.
        let raster = render_glyphs(&[glyph::THREE, glyph::SEVEN]);
        let recognizer = Recognizer::new(RecognitionConfig {
            threshold: ThresholdMode::Iterative(100.0),
            expected: ExpectedCount::exactly(2),
            ..RecognitionConfig::default()
        });
        let recognition = recognizer.recognize(&raster, &mut NoAnnotations).unwrap();
        assert_eq!(recognition.threshold_anomaly, Some(ThresholdAnomaly::NoWhitePixels));
        assert_eq!(recognition.text(), "37");

        let recognition = recognizer
            .recognize_with_estimate(
                &raster,
                ThresholdEstimate {
                    value: 50.0,
                    anomaly: Some(ThresholdAnomaly::NoBlackPixels),
                },
                &mut NoAnnotations,
            )
            .unwrap();
        assert_eq!(recognition.threshold_anomaly, Some(ThresholdAnomaly::NoBlackPixels));
        assert_eq!(recognition.threshold, 50.0);
    }

    #[test]
    fn recognizes_rgba_images_and_annotates() {
        let raster = render_glyphs(&[glyph::SIX]);
        let image = RgbaImage::from_fn(
            u32::try_from(raster.width()).unwrap(),
            u32::try_from(raster.height()).unwrap(),
            |x, y| {
                let lum = raster.luminance(x as usize, y as usize);
                image::Rgba([lum, lum, lum, 255])
            },
        );
        let mut debug = DebugImage::new(&image);
        let recognition = recognizer(ExpectedCount::exactly(1))
            .recognize_image(&image, &mut debug)
            .unwrap();
        assert_eq!(recognition.text(), "6");
        assert_ne!(debug.into_image(), image);
    }
}
