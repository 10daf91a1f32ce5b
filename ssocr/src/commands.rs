//! Image-processing commands applied before recognition.

use std::f64::consts::PI;

use anyhow::{bail, format_err, Context};
use image::{imageops, Rgba, RgbaImage};
use log::debug;
use sevenseg::{
    threshold::{adaptive_threshold, luminance_range, PixelPredicate},
    LumaMap, LuminanceFormula, Polarity, Raster, Region,
};

/// A single image-processing step.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Grow the foreground by one pixel, `n` times.
    Dilation(usize),
    /// Shrink the foreground by one pixel, `n` times.
    Erosion(usize),
    /// `n` dilations followed by `n` erosions.
    Closing(usize),
    /// `n` erosions followed by `n` dilations.
    Opening(usize),
    /// Remove foreground pixels without foreground neighbors.
    RemoveIsolated,
    /// Make pixels foreground if at least this many pixels of their 3x3
    /// block (counting themselves) are foreground, background otherwise.
    SetPixelsFilter(usize),
    /// Keep only foreground pixels with more than this many foreground
    /// pixels in their 3x3 block (counting themselves).
    KeepPixelsFilter(usize),
    /// Make every pixel pure foreground or background.
    MakeMono,
    /// Like `MakeMono`, with the threshold adapted to a window of this size
    /// around each pixel.
    DynamicThreshold {
        /// Window width.
        width: usize,
        /// Window height.
        height: usize,
    },
    /// Make pixels foreground based on their raw color channels.
    ChannelThreshold(Channel),
    /// Replace colors with their luminance.
    Grayscale,
    /// Invert every color channel.
    Invert,
    /// Map luminance `t1..=t2` onto `0..=255`.
    GrayStretch(f64, f64),
    /// Paint a background-colored border this wide.
    WhiteBorder(u32),
    /// Shift rows right, from zero at the top to this many pixels at the
    /// bottom.
    Shear(i64),
    /// Rotate counterclockwise by this many degrees.
    Rotate(f64),
    /// Flip left to right.
    MirrorHorizontal,
    /// Flip top to bottom.
    MirrorVertical,
    /// Keep only this rectangle.
    Crop {
        /// Left edge.
        x: u32,
        /// Top edge.
        y: u32,
        /// Width.
        width: u32,
        /// Height.
        height: u32,
    },
}

/// Which color channels `ChannelThreshold` looks at.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Channel {
    /// Foreground if any channel is.
    All,
    /// Red only.
    Red,
    /// Green only.
    Green,
    /// Blue only.
    Blue,
}

/// A cursor over command-line words.
struct Words<'a> {
    words: &'a [String],
    pos: usize,
}

impl<'a> Words<'a> {
    fn next(&mut self) -> Option<&'a str> {
        let word = self.words.get(self.pos)?;
        self.pos += 1;
        Some(word)
    }

    fn required<T: std::str::FromStr>(&mut self, command: &str, what: &str) -> anyhow::Result<T> {
        let word = self
            .next()
            .ok_or_else(|| format_err!("{} needs {}", command, what))?;
        word.parse()
            .map_err(|_| format_err!("{} expected {}, found {:?}", command, what, word))
    }

    /// Consume the next word if it parses as a `T`.
    fn optional<T: std::str::FromStr>(&mut self) -> Option<T> {
        let value = self.words.get(self.pos)?.parse().ok()?;
        self.pos += 1;
        Some(value)
    }
}

/// Parse a list of commands such as `crop 10 0 200 80 invert closing 2`.
pub fn parse_commands(words: &[String]) -> anyhow::Result<Vec<Command>> {
    let mut words = Words { words, pos: 0 };
    let mut commands = vec![];
    while let Some(name) = words.next() {
        let command = match name.to_ascii_lowercase().as_str() {
            "dilation" => Command::Dilation(words.optional().unwrap_or(1)),
            "erosion" => Command::Erosion(words.optional().unwrap_or(1)),
            "closing" => Command::Closing(words.optional().unwrap_or(1)),
            "opening" => Command::Opening(words.optional().unwrap_or(1)),
            "remove_isolated" => Command::RemoveIsolated,
            "set_pixels_filter" => Command::SetPixelsFilter(words.required(name, "a count")?),
            "keep_pixels_filter" => Command::KeepPixelsFilter(words.required(name, "a count")?),
            "make_mono" => Command::MakeMono,
            "dynamic_threshold" => {
                let width = words.required(name, "a window width and height")?;
                let height = words.required(name, "a window width and height")?;
                if width == 0 || height == 0 {
                    bail!("dynamic_threshold window must not be empty");
                }
                Command::DynamicThreshold { width, height }
            }
            "rgb_threshold" => Command::ChannelThreshold(Channel::All),
            "r_threshold" => Command::ChannelThreshold(Channel::Red),
            "g_threshold" => Command::ChannelThreshold(Channel::Green),
            "b_threshold" => Command::ChannelThreshold(Channel::Blue),
            "grayscale" | "greyscale" => Command::Grayscale,
            "invert" => Command::Invert,
            "gray_stretch" | "grey_stretch" => Command::GrayStretch(
                words.required(name, "two luminance values")?,
                words.required(name, "two luminance values")?,
            ),
            "white_border" => Command::WhiteBorder(words.optional().unwrap_or(1)),
            "shear" => Command::Shear(words.required(name, "an offset")?),
            "rotate" => Command::Rotate(words.required(name, "an angle")?),
            "mirror" => match words.next() {
                Some("horiz") => Command::MirrorHorizontal,
                Some("vert") => Command::MirrorVertical,
                other => bail!("mirror expected horiz or vert, found {:?}", other),
            },
            "crop" => Command::Crop {
                x: words.required(name, "X Y W H")?,
                y: words.required(name, "X Y W H")?,
                width: words.required(name, "X Y W H")?,
                height: words.required(name, "X Y W H")?,
            },
            _ => bail!("unknown command {:?}", name),
        };
        commands.push(command);
    }
    Ok(commands)
}

/// How commands decide what counts as foreground.
#[derive(Clone, Copy, Debug)]
pub struct Ink {
    /// Which side of the threshold the foreground is on.
    pub polarity: Polarity,
    /// How to compute luminance.
    pub luminance: LuminanceFormula,
    /// The current threshold, as a percentage.
    pub threshold: f64,
    /// The threshold percentage as requested, before adapting it to the
    /// image.  `dynamic_threshold` adapts it to each window instead.
    pub requested: f64,
    /// Interpret `gray_stretch` arguments as percentages of the luminance
    /// range actually used by the image.
    pub adjust_gray: bool,
}

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

impl Ink {
    fn is_set(&self, pixel: Rgba<u8>) -> bool {
        PixelPredicate::new(self.polarity, self.threshold).is_set(self.luminance.luminance(pixel))
    }

    fn foreground(&self) -> Rgba<u8> {
        match self.polarity {
            Polarity::ForegroundDark => BLACK,
            Polarity::ForegroundLight => WHITE,
        }
    }

    fn background(&self) -> Rgba<u8> {
        match self.polarity {
            Polarity::ForegroundDark => WHITE,
            Polarity::ForegroundLight => BLACK,
        }
    }

    fn mono(&self, set: bool) -> Rgba<u8> {
        if set {
            self.foreground()
        } else {
            self.background()
        }
    }

    /// Count the foreground pixels in the 3x3 block centered on `x`, `y`,
    /// including the pixel itself.  Pixels outside the image don't count.
    fn block_set(&self, image: &RgbaImage, x: u32, y: u32) -> usize {
        let mut count = 0;
        for ny in y.saturating_sub(1)..=(y + 1).min(image.height() - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(image.width() - 1) {
                if self.is_set(*image.get_pixel(nx, ny)) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Set pixels whose block has at least `needed` foreground pixels, and
    /// clear all the others.
    fn set_pixels(&self, image: &RgbaImage, needed: usize) -> RgbaImage {
        RgbaImage::from_fn(image.width(), image.height(), |x, y| {
            self.mono(self.block_set(image, x, y) >= needed)
        })
    }

    /// Keep foreground pixels whose block has more than `more_than`
    /// foreground pixels, and clear all the others.
    fn keep_pixels(&self, image: &RgbaImage, more_than: usize) -> RgbaImage {
        RgbaImage::from_fn(image.width(), image.height(), |x, y| {
            let keep =
                self.is_set(*image.get_pixel(x, y)) && self.block_set(image, x, y) > more_than;
            self.mono(keep)
        })
    }

    /// Threshold each pixel against the luminance range of the window
    /// around it.
    fn dynamic_threshold(&self, image: &RgbaImage, width: usize, height: usize) -> RgbaImage {
        let raster = LumaMap::from_rgba(image, self.luminance);
        let fraction = self.requested / 100.0;
        RgbaImage::from_fn(image.width(), image.height(), |x, y| {
            let (x, y) = (cast::usize(x), cast::usize(y));
            let window = Region::Rect {
                x: x.saturating_sub(width / 2),
                y: y.saturating_sub(height / 2),
                width,
                height,
            };
            let threshold = adaptive_threshold(&raster, window, fraction);
            let predicate = PixelPredicate::new(self.polarity, threshold);
            self.mono(predicate.is_set(raster.luminance(x, y)))
        })
    }

    /// Threshold the raw color channels instead of the luminance.
    fn channel_threshold(&self, image: &RgbaImage, channel: Channel) -> RgbaImage {
        let predicate = PixelPredicate::new(self.polarity, self.threshold);
        RgbaImage::from_fn(image.width(), image.height(), |x, y| {
            let [r, g, b, _] = image.get_pixel(x, y).0;
            let set = match channel {
                Channel::All => [r, g, b].into_iter().any(|c| predicate.is_set(c)),
                Channel::Red => predicate.is_set(r),
                Channel::Green => predicate.is_set(g),
                Channel::Blue => predicate.is_set(b),
            };
            self.mono(set)
        })
    }

    fn repeat<F>(&self, image: RgbaImage, times: usize, f: F) -> RgbaImage
    where
        F: Fn(&RgbaImage) -> RgbaImage,
    {
        (0..times).fold(image, |image, _| f(&image))
    }

    fn dilate(&self, image: RgbaImage, times: usize) -> RgbaImage {
        self.repeat(image, times, |i| self.set_pixels(i, 1))
    }

    fn erode(&self, image: RgbaImage, times: usize) -> RgbaImage {
        self.repeat(image, times, |i| self.set_pixels(i, 9))
    }

    fn gray_stretch(&self, image: &RgbaImage, t1: f64, t2: f64) -> anyhow::Result<RgbaImage> {
        let (t1, t2) = if self.adjust_gray {
            let raster = LumaMap::from_rgba(image, self.luminance);
            let (min, max) = luminance_range(&raster, Region::Full).unwrap_or((0, 255));
            let range = f64::from(max.saturating_sub(min));
            (
                f64::from(min) + t1 / 100.0 * range,
                f64::from(min) + t2 / 100.0 * range,
            )
        } else {
            (t1, t2)
        };
        if !(t1 < t2) {
            bail!("gray_stretch needs T1 < T2, found {} and {}", t1, t2);
        }
        Ok(RgbaImage::from_fn(image.width(), image.height(), |x, y| {
            let pixel = *image.get_pixel(x, y);
            let lum = f64::from(self.luminance.luminance(pixel));
            let stretched = ((lum - t1) * 255.0 / (t2 - t1)).clamp(0.0, 255.0) as u8;
            Rgba([stretched, stretched, stretched, pixel.0[3]])
        }))
    }

    fn shear(&self, image: &RgbaImage, offset: i64) -> anyhow::Result<RgbaImage> {
        let (width, height) = (image.width(), image.height());
        let mut out = RgbaImage::from_pixel(width, height, self.background());
        let last_row = i64::from(height.saturating_sub(1)).max(1);
        for (x, y, pixel) in image.enumerate_pixels() {
            let shift = offset
                .checked_mul(i64::from(y))
                .ok_or_else(|| format_err!("shear offset {} is too large", offset))?
                / last_row;
            if let Ok(nx) = u32::try_from(i64::from(x) + shift) {
                if nx < width {
                    out.put_pixel(nx, y, *pixel);
                }
            }
        }
        Ok(out)
    }

    fn rotate(&self, image: &RgbaImage, degrees: f64) -> RgbaImage {
        let (width, height) = (image.width(), image.height());
        let (cx, cy) = (f64::from(width) / 2.0, f64::from(height) / 2.0);
        let (sin, cos) = (degrees * PI / 180.0).sin_cos();
        RgbaImage::from_fn(width, height, |x, y| {
            // Sample the source pixel which lands here.  The y axis points
            // down, so counterclockwise on screen is clockwise in image
            // coordinates.
            let (dx, dy) = (f64::from(x) + 0.5 - cx, f64::from(y) + 0.5 - cy);
            let sx = (cos * dx - sin * dy + cx).floor();
            let sy = (sin * dx + cos * dy + cy).floor();
            if sx >= 0.0 && sy >= 0.0 && sx < f64::from(width) && sy < f64::from(height) {
                *image.get_pixel(sx as u32, sy as u32)
            } else {
                self.background()
            }
        })
    }

    fn border(&self, mut image: RgbaImage, border: u32) -> anyhow::Result<RgbaImage> {
        let (width, height) = (image.width(), image.height());
        let background = self.background();
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let right = x.checked_add(border);
            let bottom = y.checked_add(border);
            let (Some(right), Some(bottom)) = (right, bottom) else {
                bail!("white_border width {} is too large", border);
            };
            if x < border || y < border || right >= width || bottom >= height {
                *pixel = background;
            }
        }
        Ok(image)
    }
}

/// Clamp a crop rectangle to the image, using each dimension on its own
/// axis.
fn crop(image: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> anyhow::Result<RgbaImage> {
    if x >= image.width() || y >= image.height() {
        bail!(
            "crop origin {},{} is outside the {}x{} image",
            x,
            y,
            image.width(),
            image.height()
        );
    }
    let width = width.min(image.width() - x);
    let height = height.min(image.height() - y);
    Ok(imageops::crop_imm(image, x, y, width, height).to_image())
}

impl Command {
    /// Does this command change the size of the image?
    pub fn changes_extent(&self) -> bool {
        matches!(self, Command::Crop { .. })
    }

    /// Apply this command to `image`.
    pub fn apply(&self, image: RgbaImage, ink: &Ink) -> anyhow::Result<RgbaImage> {
        debug!("applying {:?}", self);
        if image.width() == 0 || image.height() == 0 {
            return Ok(image);
        }
        let out = match *self {
            Command::Dilation(n) => ink.dilate(image, n),
            Command::Erosion(n) => ink.erode(image, n),
            Command::Closing(n) => ink.erode(ink.dilate(image, n), n),
            Command::Opening(n) => ink.dilate(ink.erode(image, n), n),
            Command::RemoveIsolated => ink.keep_pixels(&image, 1),
            Command::SetPixelsFilter(n) => ink.set_pixels(&image, n),
            Command::KeepPixelsFilter(n) => ink.keep_pixels(&image, n),
            Command::MakeMono => RgbaImage::from_fn(image.width(), image.height(), |x, y| {
                ink.mono(ink.is_set(*image.get_pixel(x, y)))
            }),
            Command::DynamicThreshold { width, height } => {
                ink.dynamic_threshold(&image, width, height)
            }
            Command::ChannelThreshold(channel) => ink.channel_threshold(&image, channel),
            Command::Grayscale => RgbaImage::from_fn(image.width(), image.height(), |x, y| {
                let pixel = *image.get_pixel(x, y);
                let lum = ink.luminance.luminance(pixel);
                Rgba([lum, lum, lum, pixel.0[3]])
            }),
            Command::Invert => {
                let mut image = image;
                imageops::invert(&mut image);
                image
            }
            Command::GrayStretch(t1, t2) => ink.gray_stretch(&image, t1, t2)?,
            Command::WhiteBorder(width) => ink.border(image, width)?,
            Command::Shear(offset) => ink.shear(&image, offset)?,
            Command::Rotate(degrees) => ink.rotate(&image, degrees),
            Command::MirrorHorizontal => imageops::flip_horizontal(&image),
            Command::MirrorVertical => imageops::flip_vertical(&image),
            Command::Crop {
                x,
                y,
                width,
                height,
            } => crop(&image, x, y, width, height).context("could not crop image")?,
        };
        Ok(out)
    }
}
