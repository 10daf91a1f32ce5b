//! Read-only luminance rasters.
//!
//! The recognizer only ever asks "how bright is this pixel?", so everything
//! downstream works against the small `Raster` trait.  `LumaMap` is the
//! usual implementation, computed once from an RGBA image.

use image::RgbaImage;

use crate::luminance::LuminanceFormula;

/// An image which can report the luminance of each of its pixels.
pub trait Raster {
    /// The width of the raster, in pixels.
    fn width(&self) -> usize;

    /// The height of the raster, in pixels.
    fn height(&self) -> usize;

    /// The luminance at `x` and `y`.  May panic if out of bounds.
    fn luminance(&self, x: usize, y: usize) -> u8;
}

/// A precomputed grid of luminance values.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LumaMap {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl LumaMap {
    /// Create a new `LumaMap` filled with `luminance`.
    pub fn filled(width: usize, height: usize, luminance: u8) -> LumaMap {
        LumaMap {
            data: vec![luminance; width * height],
            width,
            height,
        }
    }

    /// Compute the luminance of every pixel in `image` using `formula`.
    pub fn from_rgba(image: &RgbaImage, formula: LuminanceFormula) -> LumaMap {
        let width = cast::usize(image.width());
        let height = cast::usize(image.height());
        let data = image.pixels().map(|&p| formula.luminance(p)).collect();
        LumaMap {
            data,
            width,
            height,
        }
    }

    /// If `x` and `y` do not fit within the raster, panic.
    fn bounds_check(&self, x: usize, y: usize) {
        if x >= self.width {
            panic!("out of bounds x: {} width: {}", x, self.width);
        }
        if y >= self.height {
            panic!("out of bounds y: {} height: {}", y, self.height);
        }
    }

    /// Set the luminance at `x` and `y`, or panic if out of bounds.
    pub fn set(&mut self, x: usize, y: usize, luminance: u8) {
        self.bounds_check(x, y);
        self.data[y * self.width + x] = luminance;
    }

    /// Fill the half-open rectangle `[x1, x2) × [y1, y2)` with `luminance`.
    pub fn fill_rect(&mut self, x1: usize, y1: usize, x2: usize, y2: usize, luminance: u8) {
        for y in y1..y2 {
            for x in x1..x2 {
                self.set(x, y, luminance);
            }
        }
    }
}

impl Raster for LumaMap {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn luminance(&self, x: usize, y: usize) -> u8 {
        self.bounds_check(x, y);
        self.data[y * self.width + x]
    }
}
