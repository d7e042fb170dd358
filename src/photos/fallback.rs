//! Fallback photo card
//!
//! A dark card with a gold border and a "JOYEUX NOEL" greeting, drawn with a
//! small built-in bitmap font so no font files are needed.

use image::{Rgba, RgbaImage};

pub const CARD_SIZE: u32 = 512;

const BACKGROUND: Rgba<u8> = Rgba([0x05, 0x05, 0x05, 0xff]);
const GOLD: Rgba<u8> = Rgba([0xee, 0xbb, 0x66, 0xff]);

/// Border rectangle inset and stroke width
const BORDER_INSET: u32 = 20;
const BORDER_WIDTH: u32 = 15;

/// Pixel size of one glyph cell
const GLYPH_SCALE: u32 = 6;
const GLYPH_COLUMNS: u32 = 5;
const GLYPH_ROWS: u32 = 7;

/// Text baselines, one per line
const LINES: [(&str, u32); 2] = [("JOYEUX", 230), ("NOEL", 300)];

/// 5x7 glyphs, one byte per row, most significant of the low five bits on the left
fn glyph(c: char) -> [u8; 7] {
    match c {
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        _ => [0; 7],
    }
}

fn fill_rect(image: &mut RgbaImage, x0: u32, y0: u32, width: u32, height: u32, color: Rgba<u8>) {
    let x1 = (x0 + width).min(image.width());
    let y1 = (y0 + height).min(image.height());
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, color);
        }
    }
}

/// Draws `text` centered horizontally with its baseline at `baseline`
fn draw_text(image: &mut RgbaImage, text: &str, baseline: u32, color: Rgba<u8>) {
    let advance = (GLYPH_COLUMNS + 1) * GLYPH_SCALE;
    let count = text.chars().count() as u32;
    let width = (count * advance).saturating_sub(GLYPH_SCALE);
    let left = (image.width() - width) / 2;
    let top = baseline - GLYPH_ROWS * GLYPH_SCALE;

    for (index, c) in text.chars().enumerate() {
        let origin_x = left + index as u32 * advance;
        for (row, bits) in glyph(c).iter().enumerate() {
            for column in 0..GLYPH_COLUMNS {
                if bits & (1 << (GLYPH_COLUMNS - 1 - column)) != 0 {
                    fill_rect(
                        image,
                        origin_x + column * GLYPH_SCALE,
                        top + row as u32 * GLYPH_SCALE,
                        GLYPH_SCALE,
                        GLYPH_SCALE,
                        color,
                    );
                }
            }
        }
    }
}

/// Draws the default greeting card
pub fn fallback_card() -> RgbaImage {
    let mut card = RgbaImage::from_pixel(CARD_SIZE, CARD_SIZE, BACKGROUND);

    // Stroke centered on the inset rectangle
    let outer = BORDER_INSET - BORDER_WIDTH / 2;
    let span = CARD_SIZE - 2 * outer;
    fill_rect(&mut card, outer, outer, span, BORDER_WIDTH, GOLD);
    fill_rect(&mut card, outer, outer + span - BORDER_WIDTH, span, BORDER_WIDTH, GOLD);
    fill_rect(&mut card, outer, outer, BORDER_WIDTH, span, GOLD);
    fill_rect(&mut card, outer + span - BORDER_WIDTH, outer, BORDER_WIDTH, span, GOLD);

    for (text, baseline) in LINES {
        draw_text(&mut card, text, baseline, GOLD);
    }

    card
}
