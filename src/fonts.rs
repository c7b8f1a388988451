//! Font tables and descriptors.
//!
//! Three font families are supported:
//!
//! - The built-in fixed 6x8 font: 5 column bytes per glyph plus one blank
//!   spacing column, always available in slot 1 of a [`FontSet`].
//! - Run-length-encoded proportional fonts ([`RleFont`]): per-glyph bitmaps
//!   stored as alternating foreground/background runs, rendered from a fixed
//!   em height with a shared baseline.
//! - Outline fonts ([`OutlineFont`]): packed 1-bpp glyph bitmaps with
//!   per-glyph advance and offset metrics, in the style of converted
//!   TrueType fonts.
//!
//! Applications provide RLE and outline font data themselves (typically as
//! `static` tables generated by a converter) and register it in a
//! [`FontSet`].

/// Glyph cell width of the fixed font, including the spacing column.
pub const FIXED_WIDTH: u16 = 6;

/// Glyph cell height of the fixed font.
pub const FIXED_HEIGHT: u16 = 8;

/// First character covered by the fixed font table.
const FIXED_FIRST: u8 = 0x20;

/// Classic 5x7 pixel font covering printable ASCII (0x20..=0x7F). Each glyph
/// is five column bytes; bit 0 is the top row. The sixth (blank) column is
/// synthesised by the renderer.
#[rustfmt::skip]
static FIXED_FONT: [[u8; 5]; 96] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // '!'
    [0x00, 0x07, 0x00, 0x07, 0x00], // '"'
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // '#'
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // '$'
    [0x23, 0x13, 0x08, 0x64, 0x62], // '%'
    [0x36, 0x49, 0x56, 0x20, 0x50], // '&'
    [0x00, 0x08, 0x07, 0x03, 0x00], // '\''
    [0x00, 0x1C, 0x22, 0x41, 0x00], // '('
    [0x00, 0x41, 0x22, 0x1C, 0x00], // ')'
    [0x2A, 0x1C, 0x7F, 0x1C, 0x2A], // '*'
    [0x08, 0x08, 0x3E, 0x08, 0x08], // '+'
    [0x00, 0x80, 0x70, 0x30, 0x00], // ','
    [0x08, 0x08, 0x08, 0x08, 0x08], // '-'
    [0x00, 0x00, 0x60, 0x60, 0x00], // '.'
    [0x20, 0x10, 0x08, 0x04, 0x02], // '/'
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // '0'
    [0x00, 0x42, 0x7F, 0x40, 0x00], // '1'
    [0x72, 0x49, 0x49, 0x49, 0x46], // '2'
    [0x21, 0x41, 0x49, 0x4D, 0x33], // '3'
    [0x18, 0x14, 0x12, 0x7F, 0x10], // '4'
    [0x27, 0x45, 0x45, 0x45, 0x39], // '5'
    [0x3C, 0x4A, 0x49, 0x49, 0x31], // '6'
    [0x41, 0x21, 0x11, 0x09, 0x07], // '7'
    [0x36, 0x49, 0x49, 0x49, 0x36], // '8'
    [0x46, 0x49, 0x49, 0x29, 0x1E], // '9'
    [0x00, 0x00, 0x14, 0x00, 0x00], // ':'
    [0x00, 0x40, 0x34, 0x00, 0x00], // ';'
    [0x00, 0x08, 0x14, 0x22, 0x41], // '<'
    [0x14, 0x14, 0x14, 0x14, 0x14], // '='
    [0x00, 0x41, 0x22, 0x14, 0x08], // '>'
    [0x02, 0x01, 0x59, 0x09, 0x06], // '?'
    [0x3E, 0x41, 0x5D, 0x59, 0x4E], // '@'
    [0x7C, 0x12, 0x11, 0x12, 0x7C], // 'A'
    [0x7F, 0x49, 0x49, 0x49, 0x36], // 'B'
    [0x3E, 0x41, 0x41, 0x41, 0x22], // 'C'
    [0x7F, 0x41, 0x41, 0x41, 0x3E], // 'D'
    [0x7F, 0x49, 0x49, 0x49, 0x41], // 'E'
    [0x7F, 0x09, 0x09, 0x09, 0x01], // 'F'
    [0x3E, 0x41, 0x41, 0x51, 0x73], // 'G'
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // 'H'
    [0x00, 0x41, 0x7F, 0x41, 0x00], // 'I'
    [0x20, 0x40, 0x41, 0x3F, 0x01], // 'J'
    [0x7F, 0x08, 0x14, 0x22, 0x41], // 'K'
    [0x7F, 0x40, 0x40, 0x40, 0x40], // 'L'
    [0x7F, 0x02, 0x1C, 0x02, 0x7F], // 'M'
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // 'N'
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // 'O'
    [0x7F, 0x09, 0x09, 0x09, 0x06], // 'P'
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // 'Q'
    [0x7F, 0x09, 0x19, 0x29, 0x46], // 'R'
    [0x26, 0x49, 0x49, 0x49, 0x32], // 'S'
    [0x03, 0x01, 0x7F, 0x01, 0x03], // 'T'
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // 'U'
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // 'V'
    [0x3F, 0x40, 0x38, 0x40, 0x3F], // 'W'
    [0x63, 0x14, 0x08, 0x14, 0x63], // 'X'
    [0x03, 0x04, 0x78, 0x04, 0x03], // 'Y'
    [0x61, 0x59, 0x49, 0x4D, 0x43], // 'Z'
    [0x00, 0x7F, 0x41, 0x41, 0x41], // '['
    [0x02, 0x04, 0x08, 0x10, 0x20], // '\\'
    [0x00, 0x41, 0x41, 0x41, 0x7F], // ']'
    [0x04, 0x02, 0x01, 0x02, 0x04], // '^'
    [0x40, 0x40, 0x40, 0x40, 0x40], // '_'
    [0x00, 0x03, 0x07, 0x08, 0x00], // '`'
    [0x20, 0x54, 0x54, 0x78, 0x40], // 'a'
    [0x7F, 0x28, 0x44, 0x44, 0x38], // 'b'
    [0x38, 0x44, 0x44, 0x44, 0x28], // 'c'
    [0x38, 0x44, 0x44, 0x28, 0x7F], // 'd'
    [0x38, 0x54, 0x54, 0x54, 0x18], // 'e'
    [0x00, 0x08, 0x7E, 0x09, 0x02], // 'f'
    [0x18, 0xA4, 0xA4, 0x9C, 0x78], // 'g'
    [0x7F, 0x08, 0x04, 0x04, 0x78], // 'h'
    [0x00, 0x44, 0x7D, 0x40, 0x00], // 'i'
    [0x20, 0x40, 0x40, 0x3D, 0x00], // 'j'
    [0x7F, 0x10, 0x28, 0x44, 0x00], // 'k'
    [0x00, 0x41, 0x7F, 0x40, 0x00], // 'l'
    [0x7C, 0x04, 0x78, 0x04, 0x78], // 'm'
    [0x7C, 0x08, 0x04, 0x04, 0x78], // 'n'
    [0x38, 0x44, 0x44, 0x44, 0x38], // 'o'
    [0xFC, 0x18, 0x24, 0x24, 0x18], // 'p'
    [0x18, 0x24, 0x24, 0x18, 0xFC], // 'q'
    [0x7C, 0x08, 0x04, 0x04, 0x08], // 'r'
    [0x48, 0x54, 0x54, 0x54, 0x24], // 's'
    [0x04, 0x04, 0x3F, 0x44, 0x24], // 't'
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // 'u'
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // 'v'
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // 'w'
    [0x44, 0x28, 0x10, 0x28, 0x44], // 'x'
    [0x4C, 0x90, 0x90, 0x90, 0x7C], // 'y'
    [0x44, 0x64, 0x54, 0x4C, 0x44], // 'z'
    [0x00, 0x08, 0x36, 0x41, 0x00], // '{'
    [0x00, 0x00, 0x77, 0x00, 0x00], // '|'
    [0x00, 0x41, 0x36, 0x08, 0x00], // '}'
    [0x02, 0x01, 0x02, 0x04, 0x02], // '~'
    [0x3C, 0x26, 0x23, 0x26, 0x3C], // DEL
];

/// Maps a character to the byte code fonts are indexed by. Non-ASCII
/// characters render as `?`; measurement and drawing must share this
/// mapping so layout widths match what is painted.
pub(crate) fn glyph_code(c: char) -> u8 {
    if c.is_ascii() {
        c as u8
    } else {
        b'?'
    }
}

/// Returns the five column bytes for `c`. Characters outside the table map
/// to the first entry (space).
pub(crate) fn fixed_glyph(c: u8) -> &'static [u8; 5] {
    let index = c.wrapping_sub(FIXED_FIRST) as usize;
    FIXED_FONT.get(index).unwrap_or(&FIXED_FONT[0])
}

/// A proportional font with run-length-encoded glyph bitmaps.
///
/// Each glyph bitmap is a stream of control bytes: the top bit selects
/// foreground (set) or background (clear), the low seven bits hold the run
/// length minus one. Runs wrap across rows; a glyph is `width * height`
/// pixels long in total.
#[derive(Debug, Clone, Copy)]
pub struct RleFont<'a> {
    /// One encoded bitmap per character, indexed from [`RleFont::first`].
    pub glyphs: &'a [&'a [u8]],
    /// Rendered width of each character, same indexing as `glyphs`.
    pub widths: &'a [u8],
    /// Em height shared by every glyph.
    pub height: u8,
    /// Rows from the glyph top to the baseline.
    pub baseline: u8,
    /// Character code of the first table entry.
    pub first: u8,
}

impl<'a> RleFont<'a> {
    /// Table index for `c`, clamping characters outside the covered range to
    /// the first entry.
    pub(crate) fn index(&self, c: u8) -> usize {
        let index = c.wrapping_sub(self.first) as usize;
        if index < self.glyphs.len() {
            index
        } else {
            0
        }
    }

    /// Rendered width of `c` in pixels, before text-size scaling.
    pub fn char_width(&self, c: u8) -> u16 {
        self.widths[self.index(c)] as u16
    }
}

/// Metrics and bitmap location for one outline-font glyph.
#[derive(Debug, Clone, Copy)]
pub struct OutlineGlyph {
    /// Byte offset of this glyph's bits in [`OutlineFont::bitmap`].
    pub bitmap_offset: u16,
    /// Bitmap width in pixels.
    pub width: u8,
    /// Bitmap height in pixels.
    pub height: u8,
    /// Horizontal cursor advance after drawing.
    pub x_advance: u8,
    /// Bitmap left edge relative to the cursor.
    pub x_offset: i8,
    /// Bitmap top edge relative to the baseline; negative above it.
    pub y_offset: i8,
}

/// An outline (advance-metric) font: one packed 1-bpp bitmap shared by all
/// glyphs, MSB-first, rows not padded to byte boundaries.
#[derive(Debug, Clone, Copy)]
pub struct OutlineFont<'a> {
    /// Packed glyph bitmaps.
    pub bitmap: &'a [u8],
    /// Per-glyph metrics for characters `first..=last`.
    pub glyphs: &'a [OutlineGlyph],
    /// First character covered.
    pub first: u8,
    /// Last character covered.
    pub last: u8,
    /// Baseline-to-baseline line advance.
    pub y_advance: u8,
}

impl<'a> OutlineFont<'a> {
    /// Metrics for `c`, clamping characters outside `first..=last` to the
    /// first glyph.
    pub fn glyph(&self, c: u8) -> &OutlineGlyph {
        if c < self.first || c > self.last {
            &self.glyphs[0]
        } else {
            &self.glyphs[(c - self.first) as usize]
        }
    }

    /// Rows above the baseline, measured from a representative tall glyph.
    pub fn ascent(&self) -> i32 {
        -(self.glyph(b'T').y_offset as i32)
    }

    /// Rows below the baseline, measured from a representative descender.
    pub fn descent(&self) -> i32 {
        let g = self.glyph(b'y');
        g.height as i32 + g.y_offset as i32
    }

    /// Total line height used for text layout.
    pub fn line_height(&self) -> i32 {
        self.ascent() + self.descent()
    }
}

/// One renderable font.
#[derive(Debug, Clone, Copy)]
pub enum Font<'a> {
    /// The built-in fixed 6x8 font.
    Fixed,
    /// A run-length-encoded proportional font.
    Rle(&'a RleFont<'a>),
    /// An outline font with advance metrics.
    Outline(&'a OutlineFont<'a>),
}

/// Number of selectable font slots.
const SLOTS: usize = 9;

/// The fonts available to the text engine, addressed by slot number.
///
/// Slot 1 always holds the fixed font. RLE fonts occupy the remaining
/// numbered slots; an outline font, when set, takes priority over the
/// numbered selection until cleared.
#[derive(Debug, Clone, Copy)]
pub struct FontSet<'a> {
    slots: [Option<Font<'a>>; SLOTS],
    outline: Option<&'a OutlineFont<'a>>,
}

impl<'a> Default for FontSet<'a> {
    fn default() -> Self {
        FontSet::new()
    }
}

impl<'a> FontSet<'a> {
    /// A set containing only the built-in fixed font.
    pub fn new() -> Self {
        let mut slots = [None; SLOTS];
        slots[1] = Some(Font::Fixed);
        FontSet {
            slots,
            outline: None,
        }
    }

    /// Registers an RLE font in `slot` (2..=8). Slot 0 and 1 are reserved
    /// for the fixed font and out-of-range slots are ignored.
    pub fn with_rle(mut self, slot: u8, font: &'a RleFont<'a>) -> Self {
        let slot = slot as usize;
        if (2..SLOTS).contains(&slot) {
            self.slots[slot] = Some(Font::Rle(font));
        }
        self
    }

    /// The font in `slot`, falling back to the fixed font when the slot is
    /// empty or out of range. An active outline font overrides the slot
    /// selection.
    pub(crate) fn get(&self, slot: u8) -> Font<'a> {
        if let Some(outline) = self.outline {
            return Font::Outline(outline);
        }
        self.slots
            .get(slot as usize)
            .copied()
            .flatten()
            .unwrap_or(Font::Fixed)
    }

    /// Activates (or with `None` clears) the outline font.
    pub(crate) fn set_outline(&mut self, font: Option<&'a OutlineFont<'a>>) {
        self.outline = font;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_glyph_lookup_and_clamp() {
        // 'A' has the classic cap-A column pattern.
        assert_eq!(fixed_glyph(b'A'), &[0x7C, 0x12, 0x11, 0x12, 0x7C]);
        // Control characters and 8-bit codes clamp to space.
        assert_eq!(fixed_glyph(0x00), fixed_glyph(b' '));
        assert_eq!(fixed_glyph(0x80), fixed_glyph(b' '));
    }

    #[test]
    fn test_rle_index_clamps() {
        static GLYPHS: [&[u8]; 2] = [&[0x00], &[0x81]];
        let font = RleFont {
            glyphs: &GLYPHS,
            widths: &[4, 6],
            height: 8,
            baseline: 7,
            first: b' ',
        };
        assert_eq!(font.index(b' '), 0);
        assert_eq!(font.index(b'!'), 1);
        assert_eq!(font.index(b'Z'), 0);
        assert_eq!(font.char_width(b'!'), 6);
        assert_eq!(font.char_width(0x05), 4);
    }

    #[test]
    fn test_outline_metrics() {
        static GLYPHS: [OutlineGlyph; 64] = {
            let mut g = [OutlineGlyph {
                bitmap_offset: 0,
                width: 4,
                height: 8,
                x_advance: 5,
                x_offset: 0,
                y_offset: -8,
            }; 64];
            // 'y' (0x79 - 0x40 = 57) has a descender.
            g[57] = OutlineGlyph {
                bitmap_offset: 0,
                width: 4,
                height: 8,
                x_advance: 5,
                x_offset: 0,
                y_offset: -5,
            };
            g
        };
        let font = OutlineFont {
            bitmap: &[0u8; 4],
            glyphs: &GLYPHS,
            first: 0x40,
            last: 0x7F,
            y_advance: 12,
        };
        assert_eq!(font.ascent(), 8);
        assert_eq!(font.descent(), 3);
        assert_eq!(font.line_height(), 11);
        // Out-of-range characters clamp to the first glyph.
        assert_eq!(font.glyph(0x20).width, 4);
    }

    #[test]
    fn test_font_set_fallback_and_override() {
        static RLE_GLYPHS: [&[u8]; 1] = [&[0x00]];
        static RLE: RleFont = RleFont {
            glyphs: &RLE_GLYPHS,
            widths: &[4],
            height: 16,
            baseline: 13,
            first: b' ',
        };
        static OUTLINE_GLYPHS: [OutlineGlyph; 1] = [OutlineGlyph {
            bitmap_offset: 0,
            width: 1,
            height: 1,
            x_advance: 2,
            x_offset: 0,
            y_offset: -1,
        }];
        static OUTLINE: OutlineFont = OutlineFont {
            bitmap: &[0u8],
            glyphs: &OUTLINE_GLYPHS,
            first: b' ',
            last: b' ',
            y_advance: 2,
        };

        let mut set = FontSet::new().with_rle(2, &RLE);
        assert!(matches!(set.get(1), Font::Fixed));
        assert!(matches!(set.get(2), Font::Rle(_)));
        // Empty and out-of-range slots fall back to the fixed font.
        assert!(matches!(set.get(3), Font::Fixed));
        assert!(matches!(set.get(42), Font::Fixed));

        set.set_outline(Some(&OUTLINE));
        assert!(matches!(set.get(2), Font::Outline(_)));
        set.set_outline(None);
        assert!(matches!(set.get(2), Font::Rle(_)));
    }
}
