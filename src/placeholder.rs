use image::{Rgb, RgbImage};

use crate::raster::NormalizedImage;

pub const DEFAULT_SIZE: (u32, u32) = (256, 256);
pub const DEFAULT_CAPTION: &str = "No image available";

const BACKGROUND: Rgb<u8> = Rgb([200, 200, 200]);
const INK: Rgb<u8> = Rgb([50, 50, 50]);

// 5x7 glyphs for ASCII 32..=126; each row's low 5 bits, MSB on the left.
const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
const CELL_W: u32 = 6;
const MAX_SCALE: u32 = 3;

#[rustfmt::skip]
const FONT_5X7: [[u8; 7]; 95] = [
    [0x00,0x00,0x00,0x00,0x00,0x00,0x00], // 32 ' '
    [0x04,0x04,0x04,0x04,0x04,0x00,0x04], // 33 '!'
    [0x0A,0x0A,0x0A,0x00,0x00,0x00,0x00], // 34 '"'
    [0x0A,0x0A,0x1F,0x0A,0x1F,0x0A,0x0A], // 35 '#'
    [0x04,0x0F,0x14,0x0E,0x05,0x1E,0x04], // 36 '$'
    [0x18,0x19,0x02,0x04,0x08,0x13,0x03], // 37 '%'
    [0x0C,0x12,0x14,0x08,0x15,0x12,0x0D], // 38 '&'
    [0x04,0x04,0x08,0x00,0x00,0x00,0x00], // 39 '''
    [0x02,0x04,0x08,0x08,0x08,0x04,0x02], // 40 '('
    [0x08,0x04,0x02,0x02,0x02,0x04,0x08], // 41 ')'
    [0x00,0x04,0x15,0x0E,0x15,0x04,0x00], // 42 '*'
    [0x00,0x04,0x04,0x1F,0x04,0x04,0x00], // 43 '+'
    [0x00,0x00,0x00,0x00,0x00,0x04,0x08], // 44 ','
    [0x00,0x00,0x00,0x1F,0x00,0x00,0x00], // 45 '-'
    [0x00,0x00,0x00,0x00,0x00,0x00,0x04], // 46 '.'
    [0x00,0x01,0x02,0x04,0x08,0x10,0x00], // 47 '/'
    [0x0E,0x11,0x13,0x15,0x19,0x11,0x0E], // 48 '0'
    [0x04,0x0C,0x04,0x04,0x04,0x04,0x0E], // 49 '1'
    [0x0E,0x11,0x01,0x02,0x04,0x08,0x1F], // 50 '2'
    [0x1F,0x02,0x04,0x02,0x01,0x11,0x0E], // 51 '3'
    [0x02,0x06,0x0A,0x12,0x1F,0x02,0x02], // 52 '4'
    [0x1F,0x10,0x1E,0x01,0x01,0x11,0x0E], // 53 '5'
    [0x06,0x08,0x10,0x1E,0x11,0x11,0x0E], // 54 '6'
    [0x1F,0x01,0x02,0x04,0x08,0x08,0x08], // 55 '7'
    [0x0E,0x11,0x11,0x0E,0x11,0x11,0x0E], // 56 '8'
    [0x0E,0x11,0x11,0x0F,0x01,0x02,0x0C], // 57 '9'
    [0x00,0x00,0x04,0x00,0x00,0x04,0x00], // 58 ':'
    [0x00,0x00,0x04,0x00,0x00,0x04,0x08], // 59 ';'
    [0x02,0x04,0x08,0x10,0x08,0x04,0x02], // 60 '<'
    [0x00,0x00,0x1F,0x00,0x1F,0x00,0x00], // 61 '='
    [0x08,0x04,0x02,0x01,0x02,0x04,0x08], // 62 '>'
    [0x0E,0x11,0x01,0x02,0x04,0x00,0x04], // 63 '?'
    [0x0E,0x11,0x17,0x15,0x17,0x10,0x0E], // 64 '@'
    [0x0E,0x11,0x11,0x1F,0x11,0x11,0x11], // 65 'A'
    [0x1E,0x11,0x11,0x1E,0x11,0x11,0x1E], // 66 'B'
    [0x0E,0x11,0x10,0x10,0x10,0x11,0x0E], // 67 'C'
    [0x1C,0x12,0x11,0x11,0x11,0x12,0x1C], // 68 'D'
    [0x1F,0x10,0x10,0x1E,0x10,0x10,0x1F], // 69 'E'
    [0x1F,0x10,0x10,0x1E,0x10,0x10,0x10], // 70 'F'
    [0x0E,0x11,0x10,0x17,0x11,0x11,0x0F], // 71 'G'
    [0x11,0x11,0x11,0x1F,0x11,0x11,0x11], // 72 'H'
    [0x0E,0x04,0x04,0x04,0x04,0x04,0x0E], // 73 'I'
    [0x07,0x02,0x02,0x02,0x02,0x12,0x0C], // 74 'J'
    [0x11,0x12,0x14,0x18,0x14,0x12,0x11], // 75 'K'
    [0x10,0x10,0x10,0x10,0x10,0x10,0x1F], // 76 'L'
    [0x11,0x1B,0x15,0x15,0x11,0x11,0x11], // 77 'M'
    [0x11,0x11,0x19,0x15,0x13,0x11,0x11], // 78 'N'
    [0x0E,0x11,0x11,0x11,0x11,0x11,0x0E], // 79 'O'
    [0x1E,0x11,0x11,0x1E,0x10,0x10,0x10], // 80 'P'
    [0x0E,0x11,0x11,0x11,0x15,0x12,0x0D], // 81 'Q'
    [0x1E,0x11,0x11,0x1E,0x14,0x12,0x11], // 82 'R'
    [0x0F,0x10,0x10,0x0E,0x01,0x01,0x1E], // 83 'S'
    [0x1F,0x04,0x04,0x04,0x04,0x04,0x04], // 84 'T'
    [0x11,0x11,0x11,0x11,0x11,0x11,0x0E], // 85 'U'
    [0x11,0x11,0x11,0x11,0x11,0x0A,0x04], // 86 'V'
    [0x11,0x11,0x11,0x15,0x15,0x1B,0x11], // 87 'W'
    [0x11,0x11,0x0A,0x04,0x0A,0x11,0x11], // 88 'X'
    [0x11,0x11,0x0A,0x04,0x04,0x04,0x04], // 89 'Y'
    [0x1F,0x01,0x02,0x04,0x08,0x10,0x1F], // 90 'Z'
    [0x0E,0x08,0x08,0x08,0x08,0x08,0x0E], // 91 '['
    [0x00,0x10,0x08,0x04,0x02,0x01,0x00], // 92 '\'
    [0x0E,0x02,0x02,0x02,0x02,0x02,0x0E], // 93 ']'
    [0x04,0x0A,0x11,0x00,0x00,0x00,0x00], // 94 '^'
    [0x00,0x00,0x00,0x00,0x00,0x00,0x1F], // 95 '_'
    [0x08,0x04,0x02,0x00,0x00,0x00,0x00], // 96 '`'
    [0x00,0x00,0x0E,0x01,0x0F,0x11,0x0F], // 97 'a'
    [0x10,0x10,0x16,0x19,0x11,0x11,0x1E], // 98 'b'
    [0x00,0x00,0x0E,0x10,0x10,0x11,0x0E], // 99 'c'
    [0x01,0x01,0x0D,0x13,0x11,0x11,0x0F], // 100 'd'
    [0x00,0x00,0x0E,0x11,0x1F,0x10,0x0E], // 101 'e'
    [0x06,0x09,0x08,0x1C,0x08,0x08,0x08], // 102 'f'
    [0x00,0x00,0x0F,0x11,0x0F,0x01,0x0E], // 103 'g'
    [0x10,0x10,0x16,0x19,0x11,0x11,0x11], // 104 'h'
    [0x04,0x00,0x0C,0x04,0x04,0x04,0x0E], // 105 'i'
    [0x02,0x00,0x06,0x02,0x02,0x12,0x0C], // 106 'j'
    [0x10,0x10,0x12,0x14,0x18,0x14,0x12], // 107 'k'
    [0x0C,0x04,0x04,0x04,0x04,0x04,0x0E], // 108 'l'
    [0x00,0x00,0x1A,0x15,0x15,0x11,0x11], // 109 'm'
    [0x00,0x00,0x16,0x19,0x11,0x11,0x11], // 110 'n'
    [0x00,0x00,0x0E,0x11,0x11,0x11,0x0E], // 111 'o'
    [0x00,0x00,0x1E,0x11,0x1E,0x10,0x10], // 112 'p'
    [0x00,0x00,0x0D,0x13,0x0F,0x01,0x01], // 113 'q'
    [0x00,0x00,0x16,0x19,0x10,0x10,0x10], // 114 'r'
    [0x00,0x00,0x0E,0x10,0x0E,0x01,0x1E], // 115 's'
    [0x08,0x08,0x1C,0x08,0x08,0x09,0x06], // 116 't'
    [0x00,0x00,0x11,0x11,0x11,0x13,0x0D], // 117 'u'
    [0x00,0x00,0x11,0x11,0x11,0x0A,0x04], // 118 'v'
    [0x00,0x00,0x11,0x11,0x15,0x15,0x0A], // 119 'w'
    [0x00,0x00,0x11,0x0A,0x04,0x0A,0x11], // 120 'x'
    [0x00,0x00,0x11,0x11,0x0F,0x01,0x0E], // 121 'y'
    [0x00,0x00,0x1F,0x02,0x04,0x08,0x1F], // 122 'z'
    [0x02,0x04,0x04,0x08,0x04,0x04,0x02], // 123 '{'
    [0x04,0x04,0x04,0x04,0x04,0x04,0x04], // 124 '|'
    [0x08,0x04,0x04,0x02,0x04,0x04,0x08], // 125 '}'
    [0x00,0x00,0x08,0x15,0x02,0x00,0x00], // 126 '~'
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderSpec {
    pub width: u32,
    pub height: u32,
    pub caption: String,
}

impl Default for PlaceholderSpec {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIZE.0,
            height: DEFAULT_SIZE.1,
            caption: DEFAULT_CAPTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlaceholderFactory {
    spec: PlaceholderSpec,
}

impl PlaceholderFactory {
    pub fn new(spec: PlaceholderSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &PlaceholderSpec {
        &self.spec
    }

    /// Placeholder carrying the configured caption.
    pub fn standard(&self) -> NormalizedImage {
        self.create(&self.spec.caption)
    }

    pub fn create(&self, caption: &str) -> NormalizedImage {
        self.create_sized(caption, self.spec.width, self.spec.height)
    }

    pub fn create_sized(&self, caption: &str, width: u32, height: u32) -> NormalizedImage {
        let mut canvas = RgbImage::from_pixel(width.max(1), height.max(1), BACKGROUND);
        draw_caption(&mut canvas, caption);
        NormalizedImage::Rgb(canvas)
    }
}

fn draw_caption(canvas: &mut RgbImage, caption: &str) {
    let (width, height) = canvas.dimensions();
    let chars = caption.chars().count() as u32;
    if chars == 0 || width < GLYPH_W || height < GLYPH_H {
        return;
    }

    // Largest integer scale that fits, then truncate if even 1x is too wide.
    let scale = (1..=MAX_SCALE)
        .rev()
        .find(|s| text_width(chars, *s) <= width && GLYPH_H * s <= height)
        .unwrap_or(1);
    let fit = ((width + scale) / (CELL_W * scale)).max(1).min(chars);

    let text_w = text_width(fit, scale);
    let x0 = width.saturating_sub(text_w) / 2;
    let y0 = height.saturating_sub(GLYPH_H * scale) / 2;
    for (i, ch) in caption.chars().take(fit as usize).enumerate() {
        draw_char(canvas, x0 + i as u32 * CELL_W * scale, y0, ch, scale);
    }
}

fn text_width(chars: u32, scale: u32) -> u32 {
    (chars * CELL_W - 1) * scale
}

fn draw_char(canvas: &mut RgbImage, x: u32, y: u32, ch: char, scale: u32) {
    let code = ch as u32;
    if !(32..=126).contains(&code) {
        return;
    }
    let glyph = &FONT_5X7[(code - 32) as usize];
    for (row, &bits) in glyph.iter().enumerate() {
        for col in 0..GLYPH_W {
            if bits & (0x10 >> col) == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let px = x + col * scale + dx;
                    let py = y + row as u32 * scale + dy;
                    if px < canvas.width() && py < canvas.height() {
                        canvas.put_pixel(px, py, INK);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink_pixels(image: &NormalizedImage) -> usize {
        let NormalizedImage::Rgb(img) = image else {
            panic!("placeholder must be RGB");
        };
        img.pixels().filter(|px| **px == INK).count()
    }

    #[test]
    fn default_size_and_background() {
        let factory = PlaceholderFactory::default();
        let image = factory.standard();
        assert_eq!(image.dimensions(), (256, 256));
        assert_eq!(image.channels(), 3);
        assert_eq!(image.pixel_rgb(0, 0), [200, 200, 200]);
        assert_eq!(image.pixel_rgb(255, 255), [200, 200, 200]);
    }

    #[test]
    fn caption_is_drawn_centered() {
        let factory = PlaceholderFactory::default();
        let image = factory.create("No image available");
        assert!(ink_pixels(&image) > 0);

        let NormalizedImage::Rgb(img) = &image else {
            unreachable!()
        };
        let (mut min_x, mut max_x) = (u32::MAX, 0);
        for (x, _, px) in img.enumerate_pixels() {
            if *px == INK {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
            }
        }
        let left = min_x;
        let right = 255 - max_x;
        assert!(left.abs_diff(right) <= 6 * MAX_SCALE);
    }

    #[test]
    fn same_caption_same_pixels() {
        let factory = PlaceholderFactory::default();
        assert_eq!(factory.create("missing"), factory.create("missing"));
    }

    #[test]
    fn tiny_canvas_does_not_panic() {
        let factory = PlaceholderFactory::default();
        let image = factory.create_sized("a very long caption indeed", 8, 8);
        assert_eq!(image.dimensions(), (8, 8));
        let empty = factory.create_sized("", 0, 0);
        assert_eq!(empty.dimensions(), (1, 1));
    }
}
