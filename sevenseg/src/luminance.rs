//! Converting colored pixels to a single luminance value.

use std::{fmt, str::FromStr};

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::errors::*;

/// How to compute the luminance of an RGB pixel.
///
/// Alpha is ignored. Results are truncated towards zero, so they always fit
/// in `0..=255`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LuminanceFormula {
    /// ITU-R BT.601 weights (`0.299 R + 0.587 G + 0.114 B`).
    Rec601,
    /// ITU-R BT.709 weights (`0.2125 R + 0.7154 G + 0.0721 B`).
    #[default]
    Rec709,
    /// The unweighted mean of the three channels.
    Linear,
    /// The darkest channel.
    Minimum,
    /// The brightest channel.
    Maximum,
    /// The red channel only.
    Red,
    /// The green channel only.
    Green,
    /// The blue channel only.
    Blue,
}

impl LuminanceFormula {
    /// Every formula, in the order we list them in help output.
    pub const ALL: [LuminanceFormula; 8] = [
        LuminanceFormula::Rec601,
        LuminanceFormula::Rec709,
        LuminanceFormula::Linear,
        LuminanceFormula::Minimum,
        LuminanceFormula::Maximum,
        LuminanceFormula::Red,
        LuminanceFormula::Green,
        LuminanceFormula::Blue,
    ];

    /// The keyword used to select this formula.
    pub fn keyword(self) -> &'static str {
        match self {
            LuminanceFormula::Rec601 => "rec601",
            LuminanceFormula::Rec709 => "rec709",
            LuminanceFormula::Linear => "linear",
            LuminanceFormula::Minimum => "minimum",
            LuminanceFormula::Maximum => "maximum",
            LuminanceFormula::Red => "red",
            LuminanceFormula::Green => "green",
            LuminanceFormula::Blue => "blue",
        }
    }

    /// Compute the luminance of `pixel`.
    pub fn luminance(self, pixel: Rgba<u8>) -> u8 {
        let [r, g, b, _] = pixel.0;
        let weighted = |wr: f64, wg: f64, wb: f64| -> u8 {
            let lum = wr * cast::f64(r) + wg * cast::f64(g) + wb * cast::f64(b);
            // Truncation is intended, and the weights sum to at most 1.
            lum.clamp(0.0, 255.0) as u8
        };
        match self {
            LuminanceFormula::Rec601 => weighted(0.299, 0.587, 0.114),
            LuminanceFormula::Rec709 => weighted(0.2125, 0.7154, 0.0721),
            LuminanceFormula::Linear => {
                let sum = u16::from(r) + u16::from(g) + u16::from(b);
                // At most 765 / 3.
                (sum / 3) as u8
            }
            LuminanceFormula::Minimum => r.min(g).min(b),
            LuminanceFormula::Maximum => r.max(g).max(b),
            LuminanceFormula::Red => r,
            LuminanceFormula::Green => g,
            LuminanceFormula::Blue => b,
        }
    }
}

impl fmt::Display for LuminanceFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for LuminanceFormula {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        LuminanceFormula::ALL
            .iter()
            .copied()
            .find(|formula| formula.keyword().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::unknown_keyword("luminance formula", s))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn black_is_dark_under_every_formula() {
        for formula in LuminanceFormula::ALL {
            assert_eq!(formula.luminance(Rgba([0, 0, 0, 255])), 0);
            assert!(formula.luminance(Rgba([250, 250, 250, 0])) >= 249);
        }
    }

    #[test]
    fn colored_pixels() {
        let pixel = Rgba([200, 100, 50, 255]);
        // 0.2125*200 + 0.7154*100 + 0.0721*50 = 42.5 + 71.54 + 3.605
        assert_eq!(LuminanceFormula::Rec709.luminance(pixel), 117);
        // 0.299*200 + 0.587*100 + 0.114*50 = 59.8 + 58.7 + 5.7
        assert_eq!(LuminanceFormula::Rec601.luminance(pixel), 124);
        assert_eq!(LuminanceFormula::Linear.luminance(pixel), 116);
        assert_eq!(LuminanceFormula::Minimum.luminance(pixel), 50);
        assert_eq!(LuminanceFormula::Maximum.luminance(pixel), 200);
        assert_eq!(LuminanceFormula::Red.luminance(pixel), 200);
        assert_eq!(LuminanceFormula::Green.luminance(pixel), 100);
        assert_eq!(LuminanceFormula::Blue.luminance(pixel), 50);
    }

    #[test]
    fn parse_keywords() {
        assert_eq!("REC601".parse::<LuminanceFormula>().unwrap(), LuminanceFormula::Rec601);
        assert_eq!("green".parse::<LuminanceFormula>().unwrap(), LuminanceFormula::Green);
        assert!("purple".parse::<LuminanceFormula>().is_err());
        assert_eq!(LuminanceFormula::default(), LuminanceFormula::Rec709);
    }
}
