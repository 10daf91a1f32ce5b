//! Deciding which pixels belong to the display's foreground.
//!
//! A threshold is always expressed as a percentage of full-scale luminance
//! (`0.0..=100.0`).  It can be supplied directly, derived from the range of
//! luminance values in an image, or refined with the iterative Isodata
//! method.

use std::{fmt, str::FromStr};

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::raster::Raster;

/// The threshold used when none is given, or when the given one is invalid.
pub const DEFAULT_THRESHOLD: f64 = 50.0;

/// The iterative method stops once the threshold moves by less than this
/// (expressed as a fraction, not a percentage).
const EPSILON: f64 = 1e-7;

/// Give up on the iterative method after this many rounds.
const MAX_ITERATIONS: usize = 1000;

/// Is the display's foreground darker or lighter than its background?
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Dark segments on a light background (LCDs, printed displays).
    #[default]
    ForegroundDark,
    /// Light segments on a dark background (LED and VFD displays).
    ForegroundLight,
}

impl Polarity {
    /// The opposite polarity.
    pub fn inverted(self) -> Polarity {
        match self {
            Polarity::ForegroundDark => Polarity::ForegroundLight,
            Polarity::ForegroundLight => Polarity::ForegroundDark,
        }
    }
}

impl FromStr for Polarity {
    type Err = Error;

    /// Parse the color of the foreground: `black` or `white`.
    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("black") {
            Ok(Polarity::ForegroundDark)
        } else if s.eq_ignore_ascii_case("white") {
            Ok(Polarity::ForegroundLight)
        } else {
            Err(Error::unknown_keyword("color", s))
        }
    }
}

/// Decides whether a single pixel is part of the foreground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelPredicate {
    polarity: Polarity,
    /// The threshold scaled to luminance units.
    cutoff: f64,
}

impl PixelPredicate {
    /// Create a predicate for `threshold` (a percentage).
    pub fn new(polarity: Polarity, threshold: f64) -> PixelPredicate {
        PixelPredicate {
            polarity,
            cutoff: threshold / 100.0 * 255.0,
        }
    }

    /// Is a pixel with this luminance part of the foreground?
    pub fn is_set(&self, luminance: u8) -> bool {
        let lum = f64::from(luminance);
        match self.polarity {
            Polarity::ForegroundDark => lum < self.cutoff,
            Polarity::ForegroundLight => lum >= self.cutoff,
        }
    }

    /// Is the pixel at `x` and `y` of `raster` part of the foreground?
    pub fn is_set_at<R: Raster + ?Sized>(&self, raster: &R, x: usize, y: usize) -> bool {
        self.is_set(raster.luminance(x, y))
    }
}

/// How to obtain the threshold for an image.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "value")]
pub enum ThresholdMode {
    /// Use this percentage as is.
    Fixed(f64),
    /// Place the threshold this percentage of the way between the darkest
    /// and the brightest pixel.
    Adaptive(f64),
    /// Like `Adaptive`, then refine the result with the Isodata method.
    Iterative(f64),
}

impl ThresholdMode {
    /// The percentage supplied by the user.
    pub fn value(self) -> f64 {
        match self {
            ThresholdMode::Fixed(v) | ThresholdMode::Adaptive(v) | ThresholdMode::Iterative(v) => v,
        }
    }

    /// The same mode with a different percentage.
    pub fn with_value(self, value: f64) -> ThresholdMode {
        match self {
            ThresholdMode::Fixed(_) => ThresholdMode::Fixed(value),
            ThresholdMode::Adaptive(_) => ThresholdMode::Adaptive(value),
            ThresholdMode::Iterative(_) => ThresholdMode::Iterative(value),
        }
    }
}

impl Default for ThresholdMode {
    fn default() -> Self {
        ThresholdMode::Adaptive(DEFAULT_THRESHOLD)
    }
}

/// The part of an image we compute a threshold over.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// The entire image.
    #[default]
    Full,
    /// A rectangle, clamped to the image if necessary.
    Rect {
        /// Left edge.
        x: usize,
        /// Top edge.
        y: usize,
        /// Width in pixels.
        width: usize,
        /// Height in pixels.
        height: usize,
    },
}

/// A region, clamped to a specific raster.  Coordinates are half-open.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Bounds {
    x1: usize,
    y1: usize,
    x2: usize,
    y2: usize,
}

impl Region {
    /// Clamp this region to a `width × height` raster.  Oversized rectangles
    /// are first shifted back inside the raster, then clipped.
    fn clamp(self, width: usize, height: usize) -> Bounds {
        match self {
            Region::Full => Bounds {
                x1: 0,
                y1: 0,
                x2: width,
                y2: height,
            },
            Region::Rect {
                x,
                y,
                width: w,
                height: h,
            } => {
                let w = w.min(width);
                let h = h.min(height);
                let x = x.min(width - w);
                let y = y.min(height - h);
                Bounds {
                    x1: x,
                    y1: y,
                    x2: x + w,
                    y2: y + h,
                }
            }
        }
    }
}

impl Bounds {
    fn luminances<'a, R: Raster + ?Sized>(&self, raster: &'a R) -> impl Iterator<Item = u8> + 'a {
        let Bounds { x1, y1, x2, y2 } = *self;
        (y1..y2).flat_map(move |y| (x1..x2).map(move |x| raster.luminance(x, y)))
    }
}

/// Something unexpected which happened while refining a threshold.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdAnomaly {
    /// Every pixel fell at or below the threshold.
    NoWhitePixels,
    /// Every pixel fell above the threshold.
    NoBlackPixels,
    /// The threshold kept moving and never settled.
    NotConverged,
}

impl fmt::Display for ThresholdAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ThresholdAnomaly::NoWhitePixels => write!(f, "no white pixels"),
            ThresholdAnomaly::NoBlackPixels => write!(f, "no black pixels"),
            ThresholdAnomaly::NotConverged => write!(f, "threshold did not converge"),
        }
    }
}

/// The outcome of threshold estimation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ThresholdEstimate {
    /// The threshold to use, as a percentage.
    pub value: f64,
    /// Set if the iterative method stopped early.
    pub anomaly: Option<ThresholdAnomaly>,
}

impl ThresholdEstimate {
    fn exact(value: f64) -> ThresholdEstimate {
        ThresholdEstimate {
            value,
            anomaly: None,
        }
    }
}

/// The darkest and brightest luminance in `region`, or `None` if the region
/// is empty.
pub fn luminance_range<R: Raster + ?Sized>(raster: &R, region: Region) -> Option<(u8, u8)> {
    let bounds = region.clamp(raster.width(), raster.height());
    bounds.luminances(raster).fold(None, |range, lum| match range {
        None => Some((lum, lum)),
        Some((min, max)) => Some((min.min(lum), max.max(lum))),
    })
}

/// Place a threshold `fraction` of the way from the darkest to the brightest
/// pixel of `region`, returning a percentage.
pub fn adaptive_threshold<R: Raster + ?Sized>(raster: &R, region: Region, fraction: f64) -> f64 {
    let Some((min, max)) = luminance_range(raster, region) else {
        return fraction * 100.0;
    };
    let (min, max) = (f64::from(min), f64::from(max));
    let threshold = (min + fraction * (max - min)) * 100.0 / 255.0;
    trace!(
        "adaptive threshold: luminance {}..={}, fraction {} -> {:.2}%",
        min,
        max,
        fraction,
        threshold
    );
    threshold
}

/// Refine `seed` (a percentage) with the Isodata method over `region`.
///
/// Pixels at or below the threshold count as "black", the rest as "white".
/// The new threshold is the midpoint of the two classes' mean luminances,
/// repeated until it stops moving.  If either class is ever empty, the
/// previous threshold is returned along with an anomaly.
pub fn iterative_threshold<R: Raster + ?Sized>(
    raster: &R,
    region: Region,
    seed: f64,
) -> ThresholdEstimate {
    let bounds = region.clamp(raster.width(), raster.height());
    let mut current = seed / 100.0;
    for iteration in 0..MAX_ITERATIONS {
        // Truncation matches how we compare against integer luminances.
        let cutoff = (255.0 * current).clamp(0.0, 255.0) as u8;
        let (mut black_sum, mut black_count) = (0u64, 0u64);
        let (mut white_sum, mut white_count) = (0u64, 0u64);
        for lum in bounds.luminances(raster) {
            if lum <= cutoff {
                black_sum += u64::from(lum);
                black_count += 1;
            } else {
                white_sum += u64::from(lum);
                white_count += 1;
            }
        }
        let anomaly = if white_count == 0 {
            Some(ThresholdAnomaly::NoWhitePixels)
        } else if black_count == 0 {
            Some(ThresholdAnomaly::NoBlackPixels)
        } else {
            None
        };
        if let Some(anomaly) = anomaly {
            warn!("iterative threshold: {}, keeping {:.2}%", anomaly, current * 100.0);
            return ThresholdEstimate {
                value: current * 100.0,
                anomaly: Some(anomaly),
            };
        }

        // Integer means, as in the classic formulation.
        let black_avg = black_sum / black_count;
        let white_avg = white_sum / white_count;
        let next = cast::f64(black_avg + white_avg) / (2.0 * 255.0);
        trace!(
            "iterative threshold round {}: black avg {}, white avg {}, {:.6} -> {:.6}",
            iteration,
            black_avg,
            white_avg,
            current,
            next
        );
        let delta = (next - current).abs();
        current = next;
        if delta <= EPSILON {
            debug!("iterative threshold converged to {:.2}%", current * 100.0);
            return ThresholdEstimate::exact(current * 100.0);
        }
    }
    warn!(
        "iterative threshold did not settle after {} rounds, using {:.2}%",
        MAX_ITERATIONS,
        current * 100.0
    );
    ThresholdEstimate {
        value: current * 100.0,
        anomaly: Some(ThresholdAnomaly::NotConverged),
    }
}

/// Work out the threshold for `raster` according to `mode`.
pub fn resolve_threshold<R: Raster + ?Sized>(
    raster: &R,
    region: Region,
    mode: ThresholdMode,
) -> ThresholdEstimate {
    match mode {
        ThresholdMode::Fixed(value) => ThresholdEstimate::exact(value),
        ThresholdMode::Adaptive(value) => {
            ThresholdEstimate::exact(adaptive_threshold(raster, region, value / 100.0))
        }
        ThresholdMode::Iterative(value) => {
            let seed = adaptive_threshold(raster, region, value / 100.0);
            iterative_threshold(raster, region, seed)
        }
    }
}
