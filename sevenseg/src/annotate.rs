//! Visualizing what the recognizer looked at.
//!
//! Every stage reports what it found to an `Annotator`.  Annotations never
//! influence recognition; they exist so that a human can see why a display
//! was misread.  `DebugImage` paints them onto a copy of the input.

use image::{Rgba, RgbaImage};

use crate::candidate::CandidateBox;

/// Which part of a cell a scanned pixel contributed to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScanPart {
    /// Top third of the vertical scan line.
    UpperThird,
    /// Middle third of the vertical scan line.
    MiddleThird,
    /// Bottom third of the vertical scan line.
    LowerThird,
    /// Left half of a horizontal scan line.
    LeftHalf,
    /// Right half of a horizontal scan line.
    RightHalf,
}

/// A sink for annotations.  All methods default to doing nothing.
pub trait Annotator {
    /// A character starts at column `x`.
    fn column_start(&mut self, _x: usize) {}

    /// A character ends at column `x`.
    fn column_end(&mut self, _x: usize) {}

    /// A character's top or bottom edge was found at row `y`, spanning
    /// columns `x1..=x2`.
    fn row_boundary(&mut self, _x1: usize, _x2: usize, _y: usize) {}

    /// A candidate survived filtering.
    fn candidate(&mut self, _candidate: &CandidateBox) {}

    /// A foreground pixel was found while scanning for segments.
    fn scanned_pixel(&mut self, _x: usize, _y: usize, _part: ScanPart) {}
}

/// An annotator which ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAnnotations;

impl Annotator for NoAnnotations {}

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const GRAY: Rgba<u8> = Rgba([128, 128, 128, 255]);

/// Paints annotations onto an image.
///
/// Character starts are red columns, ends are blue columns, top and bottom
/// edges are green, accepted candidates are outlined in gray, and scanned
/// pixels are colored red, green or blue by third (vertical scan) and red or
/// green by half (horizontal scans).
pub struct DebugImage {
    image: RgbaImage,
}

impl DebugImage {
    /// Start annotating a copy of `image`.
    pub fn new(image: &RgbaImage) -> DebugImage {
        DebugImage {
            image: image.clone(),
        }
    }

    /// The annotated image.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Set a pixel, silently ignoring anything outside the image (candidate
    /// edges may sit one past the last foreground pixel).
    fn put(&mut self, x: usize, y: usize, color: Rgba<u8>) {
        if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
            if x < self.image.width() && y < self.image.height() {
                self.image.put_pixel(x, y, color);
            }
        }
    }

    fn column(&mut self, x: usize, color: Rgba<u8>) {
        for y in 0..cast::usize(self.image.height()) {
            self.put(x, y, color);
        }
    }
}

impl Annotator for DebugImage {
    fn column_start(&mut self, x: usize) {
        self.column(x, RED);
    }

    fn column_end(&mut self, x: usize) {
        self.column(x, BLUE);
    }

    fn row_boundary(&mut self, x1: usize, x2: usize, y: usize) {
        for x in x1..=x2 {
            self.put(x, y, GREEN);
        }
    }

    fn candidate(&mut self, c: &CandidateBox) {
        for x in c.x1..=c.x2 {
            self.put(x, c.y1, GRAY);
            self.put(x, c.y2, GRAY);
        }
        for y in c.y1..=c.y2 {
            self.put(c.x1, y, GRAY);
            self.put(c.x2, y, GRAY);
        }
    }

    fn scanned_pixel(&mut self, x: usize, y: usize, part: ScanPart) {
        let color = match part {
            ScanPart::UpperThird | ScanPart::LeftHalf => RED,
            ScanPart::MiddleThird | ScanPart::RightHalf => GREEN,
            ScanPart::LowerThird => BLUE,
        };
        self.put(x, y, color);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn debug_image_draws_inside_bounds_only() {
        let image = RgbaImage::from_pixel(4, 3, Rgba([255, 255, 255, 255]));
        let mut debug = DebugImage::new(&image);
        debug.column_start(1);
        debug.column_end(4);
        debug.scanned_pixel(3, 2, ScanPart::LowerThird);
        let out = debug.into_image();
        assert_eq!(*out.get_pixel(1, 0), RED);
        assert_eq!(*out.get_pixel(1, 2), RED);
        assert_eq!(*out.get_pixel(3, 2), BLUE);
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn candidates_are_outlined() {
        let image = RgbaImage::new(5, 5);
        let mut debug = DebugImage::new(&image);
        debug.candidate(&CandidateBox::new(1, 1, 3, 4));
        let out = debug.into_image();
        assert_eq!(*out.get_pixel(1, 1), GRAY);
        assert_eq!(*out.get_pixel(3, 4), GRAY);
        assert_eq!(*out.get_pixel(2, 2), Rgba([0, 0, 0, 0]));
    }
}
