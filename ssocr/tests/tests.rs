//! Integration tests for our command-line interface.  We actually run the
//! binary on rendered displays and check what it prints.

use std::io::Cursor;

use cli_test_dir::{CommandExt, ExpectStatus, OutputExt, TestDir};
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

const MARGIN: u32 = 5;
const WIDTH: u32 = 10;
const HEIGHT: u32 = 20;
const STROKE: u32 = 2;
const GAP: u32 = 6;

/// Segment masks for the digits 0-9.
const DIGITS: [u8; 10] = [0x77, 0x24, 0x5d, 0x6d, 0x2e, 0x6b, 0x7b, 0x25, 0x7f, 0x6f];

/// Render digits as dark segments on a light background, encoded as PNG.
fn display_png(digits: &str) -> Vec<u8> {
    let masks = digits
        .chars()
        .map(|c| DIGITS[c.to_digit(10).expect("only digits") as usize])
        .collect::<Vec<_>>();
    let count = masks.len() as u32;
    let width = 2 * MARGIN + count * WIDTH + count.saturating_sub(1) * GAP;
    let mut image = RgbaImage::from_pixel(width, HEIGHT + 2 * MARGIN, Rgba([240, 240, 240, 255]));
    let half = HEIGHT / 2;
    let segments = [
        (0x01, (0, 0, WIDTH, STROKE)),
        (0x02, (0, 0, STROKE, half)),
        (0x04, (WIDTH - STROKE, 0, WIDTH, half)),
        (0x08, (0, half - STROKE / 2, WIDTH, half + STROKE / 2)),
        (0x10, (0, half, STROKE, HEIGHT)),
        (0x20, (WIDTH - STROKE, half, WIDTH, HEIGHT)),
        (0x40, (0, HEIGHT - STROKE, WIDTH, HEIGHT)),
    ];
    for (i, mask) in masks.iter().enumerate() {
        let left = MARGIN + i as u32 * (WIDTH + GAP);
        for &(bit, (x1, y1, x2, y2)) in &segments {
            if mask & bit != 0 {
                for y in y1..y2 {
                    for x in x1..x2 {
                        image.put_pixel(left + x, MARGIN + y, Rgba([20, 20, 20, 255]));
                    }
                }
            }
        }
    }
    let mut png = vec![];
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
        .expect("could not encode PNG");
    png
}

#[test]
fn show_help() {
    let testdir = TestDir::new("ssocr", "show_help");
    let output = testdir.cmd().arg("--help").expect_success();
    assert!(output.stdout_str().contains("Usage"));
    assert!(output.stdout_str().contains("--number-digits"));
}

#[test]
fn show_version() {
    let testdir = TestDir::new("ssocr", "show_version");
    let output = testdir.cmd().arg("--version").expect_success();
    assert!(output.stdout_str().contains("ssocr "));
}

#[test]
fn reads_digits() {
    let testdir = TestDir::new("ssocr", "reads_digits");
    testdir.create_file("display.png", display_png("2718"));
    let output = testdir
        .cmd()
        .args(["-d", "4", "display.png"])
        .expect_success();
    assert_eq!(output.stdout_str(), "2718\n");
}

#[test]
fn reads_any_number_of_digits() {
    let testdir = TestDir::new("ssocr", "reads_any_number_of_digits");
    testdir.create_file("display.png", display_png("9034156"));
    let output = testdir
        .cmd()
        .args(["-d", "-1", "display.png"])
        .expect_success();
    assert_eq!(output.stdout_str(), "9034156\n");
}

#[test]
fn wrong_digit_count_exits_with_1() {
    let testdir = TestDir::new("ssocr", "wrong_digit_count_exits_with_1");
    testdir.create_file("display.png", display_png("314"));
    let output = testdir
        .cmd()
        .args(["--number-digits", "4", "display.png"])
        .expect_failure();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stderr_str().contains("found 3, expected 4"));
}

#[test]
fn prints_hex_and_json() {
    let testdir = TestDir::new("ssocr", "prints_hex_and_json");
    testdir.create_file("display.png", display_png("47"));
    let output = testdir
        .cmd()
        .args(["-d", "2", "-X", "display.png"])
        .expect_success();
    assert_eq!(output.stdout_str(), "2e25\n");

    let output = testdir
        .cmd()
        .args(["-d", "2", "--json", "display.png"])
        .expect_success();
    assert!(output.stdout_str().contains(r#""text": "47""#));
    assert!(output.stdout_str().contains(r#""status": "success""#));
}

#[test]
fn crop_then_adapt() {
    let testdir = TestDir::new("ssocr", "crop_then_adapt");
    testdir.create_file("display.png", display_png("5820"));
    // Keep the first two digits and their margin.
    let output = testdir
        .cmd()
        .args(["-d", "2", "--adapt-after-crop", "crop", "0", "0", "33", "30", "display.png"])
        .expect_success();
    assert_eq!(output.stdout_str(), "58\n");
}

#[test]
fn inverted_display_with_white_foreground() {
    let testdir = TestDir::new("ssocr", "inverted_display_with_white_foreground");
    testdir.create_file("display.png", display_png("601"));
    let output = testdir
        .cmd()
        .args(["-d", "3", "-f", "white", "invert", "display.png"])
        .expect_success();
    assert_eq!(output.stdout_str(), "601\n");
}

#[test]
fn reads_standard_input() {
    let testdir = TestDir::new("ssocr", "reads_standard_input");
    let output = testdir
        .cmd()
        .args(["-d", "2", "-"])
        .output_with_stdin(display_png("13"))
        .expect_success();
    assert_eq!(output.stdout_str(), "13\n");
}

#[test]
fn process_only_writes_image() {
    let testdir = TestDir::new("ssocr", "process_only_writes_image");
    testdir.create_file("display.png", display_png("8"));
    let output = testdir
        .cmd()
        .args(["-p", "-o", "processed.png", "make_mono", "display.png"])
        .expect_failure();
    assert_eq!(output.status.code(), Some(3));
    testdir.expect_path("processed.png");
}

#[test]
fn writes_debug_image() {
    let testdir = TestDir::new("ssocr", "writes_debug_image");
    testdir.create_file("display.png", display_png("42"));
    testdir
        .cmd()
        .args(["-d", "2", "-D=annotated.png", "display.png"])
        .expect_success();
    testdir.expect_path("annotated.png");

    testdir.cmd().args(["-d", "2", "-D", "display.png"]).expect_success();
    testdir.expect_path("testbild.png");
}

#[test]
fn unknown_character_exits_with_2() {
    let testdir = TestDir::new("ssocr", "unknown_character_exits_with_2");
    testdir.create_file("display.png", display_png("52"));
    // A huge need_pixels value means no segment is ever lit.
    let output = testdir
        .cmd()
        .args(["-d", "2", "-n", "50", "display.png"])
        .expect_failure();
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(output.stdout_str(), "__\n");
}

#[test]
fn missing_image_is_an_error() {
    let testdir = TestDir::new("ssocr", "missing_image_is_an_error");
    let output = testdir.cmd().arg("no-such-file.png").expect_failure();
    assert_eq!(output.status.code(), Some(99));
    assert!(output.stderr_str().contains("no-such-file.png"));
}
