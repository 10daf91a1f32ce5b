//! Read the digits shown on a seven-segment display.

use std::{
    env,
    ffi::OsString,
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    process,
};

use anyhow::{format_err, Context};
use clap::Parser;
use image::RgbaImage;
use log::{debug, info};
use serde::Serialize;
use sevenseg::{
    threshold::{luminance_range, resolve_threshold, ThresholdEstimate},
    Charset, DebugImage, ExpectedCount, LumaMap, LuminanceFormula, MinCharDims, NoAnnotations,
    Polarity, Raster, RecognitionConfig, Recognition, Recognizer, Region, SpacingBase,
    SpacingConfig, Status, ThresholdMode,
};

use crate::commands::{parse_commands, Command, Ink};

mod commands;

/// Exit code for a successful recognition.
const EXIT_OK: i32 = 0;
/// Exit code when we found the wrong number of characters.
const EXIT_COUNT_MISMATCH: i32 = 1;
/// Exit code when some characters couldn't be recognized.
const EXIT_UNKNOWN_CHAR: i32 = 2;
/// Exit code after `--process-only`.
const EXIT_PROCESS_ONLY: i32 = 3;
/// Exit code for every other failure.
const EXIT_OTHER: i32 = 99;

/// Read the characters shown on a seven-segment display.
///
/// Image COMMANDS (applied in order before recognition): dilation [N],
/// erosion [N], closing [N], opening [N], remove_isolated,
/// set_pixels_filter MASK, keep_pixels_filter MASK, make_mono, grayscale,
/// invert, gray_stretch T1 T2, white_border [WIDTH], shear OFFSET,
/// rotate THETA, mirror horiz|vert, crop X Y W H.
#[derive(Debug, Parser)]
#[command(name = "ssocr", version)]
struct Args {
    /// Threshold as a percentage of the luminance range (or of full scale
    /// with --absolute-threshold).
    #[arg(short = 't', long)]
    threshold: Option<f64>,

    /// Use the threshold as given instead of adapting it to the image.
    #[arg(short = 'a', long)]
    absolute_threshold: bool,

    /// Refine the threshold with the iterative Isodata method.
    #[arg(short = 'T', long)]
    iter_threshold: bool,

    /// Foreground pixels needed on a scan line for a segment to be lit.
    #[arg(short = 'n', long = "number-pixels")]
    need_pixels: Option<usize>,

    /// Minimum size of a cell worth scanning, and minimum height of a minus.
    #[arg(short = 'N', long)]
    min_segment: Option<usize>,

    /// Foreground pixels per column or row to ignore as noise.
    #[arg(short = 'i', long)]
    ignore_pixels: Option<usize>,

    /// Number of characters: N, MIN-MAX, or -1 for any number.
    #[arg(short = 'd', long = "number-digits", allow_hyphen_values = true)]
    expected: Option<ExpectedCount>,

    /// Height-to-width ratio above which a character is a one.
    #[arg(short = 'r', long)]
    one_ratio: Option<f64>,

    /// Width-to-height ratio at or above which a character is a minus.
    #[arg(short = 'm', long)]
    minus_ratio: Option<f64>,

    /// Height ratio (tallest character to this one) for decimal points.
    #[arg(short = 'H', long)]
    dec_h_ratio: Option<f64>,

    /// Width ratio (widest character to this one) for decimal points.
    #[arg(short = 'W', long)]
    dec_w_ratio: Option<f64>,

    /// Minimum character size, as WIDTHxHEIGHT.
    #[arg(short = 'M', long)]
    min_char_dims: Option<MinCharDims>,

    /// Print spaces between characters that are far apart.
    #[arg(short = 's', long)]
    print_spaces: bool,

    /// Base spacing on the average distance instead of the minimum.
    #[arg(short = 'A', long)]
    space_average: bool,

    /// A distance of this many base distances is one space.
    #[arg(long)]
    space_factor: Option<f64>,

    /// Characters to recognize: full, digits, decimal, hex or tt_robot.
    #[arg(short = 'c', long)]
    charset: Option<Charset>,

    /// Foreground color: black or white.
    #[arg(short = 'f', long)]
    foreground: Option<Polarity>,

    /// Background color: black or white.
    #[arg(short = 'b', long, conflicts_with = "foreground")]
    background: Option<Polarity>,

    /// Luminance formula: rec601, rec709, linear, minimum, maximum, red,
    /// green or blue.
    #[arg(short = 'l', long)]
    luminance: Option<LuminanceFormula>,

    /// Write the processed image to this file.
    #[arg(short = 'o', long)]
    output_image: Option<PathBuf>,

    /// Only process the image, don't recognize anything.
    #[arg(short = 'p', long)]
    process_only: bool,

    /// Write an image showing what the recognizer looked at (`-D`,
    /// `-DFILE`, `-D=FILE` or `--debug-image=FILE`).
    #[arg(
        short = 'D',
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "testbild.png"
    )]
    debug_image: Option<PathBuf>,

    /// Print each character's segments in hex instead of characters.
    #[arg(short = 'X', long)]
    print_as_hex: bool,

    /// Leave decimal points out of the output.
    #[arg(short = 'C', long)]
    omit_decimal_point: bool,

    /// Print image size, luminance range and threshold to stderr.
    #[arg(short = 'I', long)]
    print_info: bool,

    /// Treat gray_stretch arguments as percentages of the luminance range.
    #[arg(short = 'g', long)]
    adjust_gray: bool,

    /// Compute the threshold after cropping instead of before.
    #[arg(long)]
    adapt_after_crop: bool,

    /// Load recognition settings from a JSON file.  Other options override
    /// it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the full recognition result as JSON.
    #[arg(long)]
    json: bool,

    /// Log progress.
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Log debugging details.
    #[arg(short = 'P', long)]
    debug_output: bool,

    /// Image COMMANDS followed by the IMAGE file (`-` for standard input).
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND... IMAGE"
    )]
    words: Vec<String>,
}

impl Args {
    /// Build our recognition settings from `--config` and the other options.
    fn recognition_config(&self) -> anyhow::Result<RecognitionConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("could not read {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("could not parse {}", path.display()))?
            }
            None => RecognitionConfig::default(),
        };

        let value = self.threshold.unwrap_or_else(|| config.threshold.value());
        config.threshold = if self.absolute_threshold {
            ThresholdMode::Fixed(value)
        } else if self.iter_threshold {
            ThresholdMode::Iterative(value)
        } else {
            config.threshold.with_value(value)
        };

        if let Some(polarity) = self.foreground {
            config.polarity = polarity;
        } else if let Some(background) = self.background {
            // `--background black` means the foreground is white.
            config.polarity = background.inverted();
        }
        set(&mut config.luminance, self.luminance);
        set(&mut config.need_pixels, self.need_pixels);
        set(&mut config.min_segment, self.min_segment);
        set(&mut config.ignore_pixels, self.ignore_pixels);
        set(&mut config.expected, self.expected);
        set(&mut config.one_ratio, self.one_ratio);
        set(&mut config.minus_ratio, self.minus_ratio);
        set(&mut config.dec_h_ratio, self.dec_h_ratio);
        set(&mut config.dec_w_ratio, self.dec_w_ratio);
        set(&mut config.min_char_dims, self.min_char_dims);
        set(&mut config.charset, self.charset);
        config.omit_decimal_point |= self.omit_decimal_point;

        if self.print_spaces || self.space_average || self.space_factor.is_some() {
            let spacing = config.spacing.get_or_insert_with(SpacingConfig::default);
            if self.space_average {
                spacing.base = SpacingBase::Average;
            }
            set(&mut spacing.factor, self.space_factor);
        }
        Ok(config.validated())
    }

    /// Our log level, unless `RUST_LOG` overrides it.
    fn log_level(&self) -> &'static str {
        if self.debug_output {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}

/// Rewrite `-DFILE` and `-D=FILE` as `--debug-image=FILE`.  The image
/// commands take every word after the options, so a short option with an
/// attached value would otherwise be read as a command.
fn expand_debug_image<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut options_done = false;
    args.into_iter()
        .map(|arg| {
            if options_done {
                return arg;
            }
            match arg.to_str() {
                Some("--") => {
                    options_done = true;
                    arg
                }
                Some(word) if word.len() > 2 && word.starts_with("-D") => {
                    let file = word[2..].strip_prefix('=').unwrap_or(&word[2..]);
                    OsString::from(format!("--debug-image={}", file))
                }
                _ => arg,
            }
        })
        .collect()
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Load an image from a file, or from standard input if `path` is `-`.
fn load_image(path: &str) -> anyhow::Result<RgbaImage> {
    let image = if path == "-" {
        let mut data = vec![];
        io::stdin()
            .read_to_end(&mut data)
            .context("could not read standard input")?;
        image::load_from_memory(&data).context("could not decode image on standard input")?
    } else {
        image::open(path).with_context(|| format!("could not open image {}", path))?
    };
    Ok(image.to_rgba8())
}

fn save_image(image: &RgbaImage, path: &Path) -> anyhow::Result<()> {
    image
        .save(path)
        .with_context(|| format!("could not write {}", path.display()))
}

fn threshold_for(image: &RgbaImage, config: &RecognitionConfig) -> ThresholdEstimate {
    let raster = LumaMap::from_rgba(image, config.luminance);
    resolve_threshold(&raster, config.threshold_region, config.threshold)
}

fn print_info(image: &RgbaImage, config: &RecognitionConfig, threshold: f64) {
    let raster = LumaMap::from_rgba(image, config.luminance);
    eprintln!("image width: {}", raster.width());
    eprintln!("image height: {}", raster.height());
    eprintln!("luminance formula: {}", config.luminance);
    if let Some((min, max)) = luminance_range(&raster, Region::Full) {
        eprintln!("luminance range: {}..={}", min, max);
    }
    eprintln!("threshold: {:.2}%", threshold);
}

/// What we print with `--json`.
#[derive(Serialize)]
struct JsonReport<'a> {
    text: String,
    hex: String,
    #[serde(flatten)]
    recognition: &'a Recognition,
}

fn run() -> anyhow::Result<i32> {
    let args = Args::parse_from(expand_debug_image(env::args_os()));
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level()))
        .init();

    let config = args.recognition_config()?;
    debug!("recognition settings: {:?}", config);
    let (image_path, command_words) = args
        .words
        .split_last()
        .ok_or_else(|| format_err!("no image given"))?;
    let commands = parse_commands(command_words)?;

    let mut image = load_image(image_path)?;
    let mut estimate = threshold_for(&image, &config);
    for command in &commands {
        let ink = Ink {
            polarity: config.polarity,
            luminance: config.luminance,
            threshold: estimate.value,
            requested: config.threshold.value(),
            adjust_gray: args.adjust_gray,
        };
        image = command.apply(image, &ink)?;
        if command.changes_extent() && args.adapt_after_crop {
            estimate = threshold_for(&image, &config);
            info!("threshold after {:?} is {:.2}%", command, estimate.value);
        }
    }
    if args.print_info {
        print_info(&image, &config, estimate.value);
    }
    if let Some(path) = &args.output_image {
        save_image(&image, path)?;
    }
    if args.process_only {
        return Ok(EXIT_PROCESS_ONLY);
    }

    let recognizer = Recognizer::new(config);
    let raster = LumaMap::from_rgba(&image, recognizer.config().luminance);
    let recognition = match &args.debug_image {
        Some(path) => {
            let mut debug = DebugImage::new(&image);
            let result = recognizer.recognize_with_estimate(&raster, estimate, &mut debug);
            save_image(&debug.into_image(), path)?;
            result?
        }
        None => recognizer.recognize_with_estimate(&raster, estimate, &mut NoAnnotations)?,
    };

    if args.json {
        let report = JsonReport {
            text: recognition.text(),
            hex: recognition.hex(),
            recognition: &recognition,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if args.print_as_hex {
        println!("{}", recognition.hex());
    } else {
        println!("{}", recognition.text());
    }

    Ok(match recognition.status {
        Status::Success => EXIT_OK,
        Status::PartialUnknown => {
            eprintln!(
                "ssocr: could not recognize {} character(s)",
                recognition.unknown_count
            );
            EXIT_UNKNOWN_CHAR
        }
    })
}

/// Pick an exit code for `err`.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<sevenseg::Error>() {
        Some(sevenseg::Error::CountMismatch { .. }) | Some(sevenseg::Error::NoCandidates) => {
            EXIT_COUNT_MISMATCH
        }
        _ => EXIT_OTHER,
    }
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("ssocr: error: {:#}", err);
            exit_code(&err)
        }
    };
    process::exit(code);
}

#[cfg(test)]
mod test {
    use super::*;

    fn expand(args: &[&str]) -> Vec<OsString> {
        expand_debug_image(args.iter().map(OsString::from))
    }

    #[test]
    fn attached_debug_image_names_become_long_options() {
        assert_eq!(
            expand(&["ssocr", "-D=a.png", "-Db.png", "-D", "-d", "2", "x.png"]),
            expand(&[
                "ssocr",
                "--debug-image=a.png",
                "--debug-image=b.png",
                "-D",
                "-d",
                "2",
                "x.png"
            ]),
        );
        assert_eq!(expand(&["ssocr", "--", "-Dx.png"])[2], OsString::from("-Dx.png"));
    }

    #[test]
    fn debug_image_forms_parse() {
        let parse = |args: &[&str]| Args::try_parse_from(expand(args)).unwrap();
        let args = parse(&["ssocr", "-d", "2", "-D=a.png", "x.png"]);
        assert_eq!(args.debug_image, Some(PathBuf::from("a.png")));
        assert_eq!(args.words, vec!["x.png"]);
        let args = parse(&["ssocr", "-Db.png", "invert", "x.png"]);
        assert_eq!(args.debug_image, Some(PathBuf::from("b.png")));
        assert_eq!(args.words, vec!["invert", "x.png"]);
        let args = parse(&["ssocr", "-D", "x.png"]);
        assert_eq!(args.debug_image, Some(PathBuf::from("testbild.png")));
        assert_eq!(args.words, vec!["x.png"]);
    }
}
