//! Test-only utilities.

use crate::mask::SegmentMask;
use crate::raster::LumaMap;

/// Blank space around the display.
pub const MARGIN: usize = 5;
/// Width of a full-size glyph.
pub const GLYPH_WIDTH: usize = 10;
/// Height of a full-size glyph.
pub const GLYPH_HEIGHT: usize = 20;
/// Thickness of a segment.
pub const STROKE: usize = 2;
/// Default blank space between glyphs.
pub const GAP: usize = 6;

const INK: u8 = 0;
const PAPER: u8 = 255;

/// How far a glyph advances the pen.  Decimal points are a single dot.
fn advance(mask: SegmentMask) -> usize {
    if mask == SegmentMask::DECIMAL {
        STROKE
    } else {
        GLYPH_WIDTH
    }
}

/// Draw `mask` with its top left corner at `x`, `MARGIN`.
fn draw(map: &mut LumaMap, x: usize, mask: SegmentMask) {
    let (w, h, t, top) = (GLYPH_WIDTH, GLYPH_HEIGHT, STROKE, MARGIN);
    let half = h / 2;
    if mask == SegmentMask::DECIMAL {
        map.fill_rect(x, top + h - t, x + t, top + h, INK);
        return;
    }
    let segments = [
        (SegmentMask::HORIZ_UP, (0, 0, w, t)),
        (SegmentMask::HORIZ_MID, (0, half - t / 2, w, half + t / 2)),
        (SegmentMask::HORIZ_DOWN, (0, h - t, w, h)),
        (SegmentMask::VERT_LEFT_UP, (0, 0, t, half)),
        (SegmentMask::VERT_RIGHT_UP, (w - t, 0, w, half)),
        (SegmentMask::VERT_LEFT_DOWN, (0, half, t, h)),
        (SegmentMask::VERT_RIGHT_DOWN, (w - t, half, w, h)),
    ];
    for (segment, (x1, y1, x2, y2)) in segments {
        if mask.contains(segment) {
            map.fill_rect(x + x1, top + y1, x + x2, top + y2, INK);
        }
    }
}

/// Render glyphs left to right, each preceded by the given gap (the first
/// gap is ignored).
pub fn render_layout(glyphs: &[(SegmentMask, usize)]) -> LumaMap {
    let mut width = 2 * MARGIN;
    for (i, &(mask, gap)) in glyphs.iter().enumerate() {
        if i > 0 {
            width += gap;
        }
        width += advance(mask);
    }
    let mut map = LumaMap::filled(width, GLYPH_HEIGHT + 2 * MARGIN, PAPER);
    let mut x = MARGIN;
    for (i, &(mask, gap)) in glyphs.iter().enumerate() {
        if i > 0 {
            x += gap;
        }
        draw(&mut map, x, mask);
        x += advance(mask);
    }
    map
}

/// Render glyphs separated by `GAP`.
pub fn render_glyphs(glyphs: &[SegmentMask]) -> LumaMap {
    let layout = glyphs.iter().map(|&m| (m, GAP)).collect::<Vec<_>>();
    render_layout(&layout)
}
