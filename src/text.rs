//! Text layout: cursor-based printing with wrapping, and datum-anchored
//! string placement with optional padding.

use core::fmt::Write as _;

use embedded_graphics::{pixelcolor::Rgb565, prelude::RgbColor};

use crate::{
    display::Tft,
    fonts::{glyph_code, Font, OutlineFont, FIXED_HEIGHT, FIXED_WIDTH},
    TftHw,
};

/// Anchor point of a string drawn with [`Tft::draw_string`].
///
/// The datum names the point of the rendered string's bounding box that is
/// placed at the given coordinates. Baseline variants anchor the typographic
/// baseline instead of the box edge.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Datum {
    #[default]
    TopLeft,
    TopCentre,
    TopRight,
    MiddleLeft,
    MiddleCentre,
    MiddleRight,
    BottomLeft,
    BottomCentre,
    BottomRight,
    BaselineLeft,
    BaselineCentre,
    BaselineRight,
}

/// Horizontal bias of a datum, used to decide which side(s) the padding
/// fill goes on.
#[derive(PartialEq, Eq, Clone, Copy)]
enum Bias {
    Left,
    Centre,
    Right,
}

impl Datum {
    fn bias(self) -> Bias {
        match self {
            Datum::TopLeft | Datum::MiddleLeft | Datum::BottomLeft | Datum::BaselineLeft => {
                Bias::Left
            }
            Datum::TopCentre
            | Datum::MiddleCentre
            | Datum::BottomCentre
            | Datum::BaselineCentre => Bias::Centre,
            Datum::TopRight | Datum::MiddleRight | Datum::BottomRight | Datum::BaselineRight => {
                Bias::Right
            }
        }
    }
}

/// Mutable text-engine state carried by the driver.
pub(crate) struct TextState {
    pub cursor_x: i32,
    pub cursor_y: i32,
    /// Selected font slot.
    pub font: u8,
    /// Integer scale factor, 1..=7.
    pub size: u8,
    pub fg: Rgb565,
    pub bg: Rgb565,
    pub wrap: bool,
    pub datum: Datum,
    /// Padded string width in pixels, 0 disables padding.
    pub padding: u16,
}

impl Default for TextState {
    fn default() -> Self {
        TextState {
            cursor_x: 0,
            cursor_y: 0,
            font: 1,
            size: 1,
            fg: Rgb565::WHITE,
            bg: Rgb565::BLACK,
            wrap: true,
            datum: Datum::TopLeft,
            padding: 0,
        }
    }
}

impl<'a, HW: TftHw> Tft<'a, HW> {
    /// Moves the print cursor. For outline fonts the y coordinate is the
    /// baseline; for the fixed and RLE families it is the cell top.
    pub fn set_cursor(&mut self, x: i32, y: i32) {
        self.text.cursor_x = x;
        self.text.cursor_y = y;
    }

    /// Current print cursor position.
    pub fn cursor(&self) -> (i32, i32) {
        (self.text.cursor_x, self.text.cursor_y)
    }

    /// Selects the font slot used by subsequent text calls. Slot 0 is an
    /// alias for the built-in font in slot 1. Selecting a slot also clears
    /// any active outline font.
    pub fn set_text_font(&mut self, slot: u8) {
        self.text.font = if slot == 0 { 1 } else { slot };
        self.fonts.set_outline(None);
    }

    /// Activates an outline font, overriding the numbered slot selection,
    /// or clears it with `None`.
    pub fn set_free_font(&mut self, font: Option<&'a OutlineFont<'a>>) {
        self.fonts.set_outline(font);
    }

    /// Sets the integer text scale, clamped to 1..=7.
    pub fn set_text_size(&mut self, size: u8) {
        self.text.size = size.clamp(1, 7);
    }

    /// Sets the text colours. `None` for the background makes glyphs
    /// transparent: only foreground pixels are drawn.
    pub fn set_text_color(&mut self, fg: Rgb565, bg: Option<Rgb565>) {
        self.text.fg = fg;
        // Transparency is encoded as bg == fg.
        self.text.bg = bg.unwrap_or(fg);
    }

    /// Enables or disables wrapping at the right edge during cursor printing.
    pub fn set_text_wrap(&mut self, wrap: bool) {
        self.text.wrap = wrap;
    }

    /// Sets the anchor used by [`Tft::draw_string`].
    pub fn set_text_datum(&mut self, datum: Datum) {
        self.text.datum = datum;
    }

    /// The datum currently in effect.
    pub fn text_datum(&self) -> Datum {
        self.text.datum
    }

    /// Sets the padded string width in pixels. When a drawn string is
    /// narrower than this, the remainder is filled with the background
    /// colour on the side(s) away from the datum anchor, so shorter values
    /// overwrite longer ones cleanly. 0 disables padding.
    pub fn set_text_padding(&mut self, width: u16) {
        self.text.padding = width;
    }

    /// Height in pixels of one line in the current font and size.
    pub fn font_height(&self) -> i32 {
        let size = self.text.size as i32;
        match self.fonts.get(self.text.font) {
            Font::Fixed => FIXED_HEIGHT as i32 * size,
            Font::Rle(font) => font.height as i32 * size,
            Font::Outline(font) => font.y_advance as i32 * size,
        }
    }

    /// Rendered width in pixels of `text` in the current font and size.
    ///
    /// For outline fonts the final character contributes its tight width
    /// rather than its advance, matching the extent actually painted.
    pub fn text_width(&self, text: &str) -> i32 {
        let size = self.text.size as i32;
        match self.fonts.get(self.text.font) {
            Font::Fixed => text.chars().count() as i32 * FIXED_WIDTH as i32 * size,
            Font::Rle(font) => {
                let mut width = 0;
                for c in text.chars() {
                    width += font.char_width(glyph_code(c)) as i32;
                }
                width * size
            }
            Font::Outline(font) => {
                let mut width = 0;
                let mut chars = text.chars().peekable();
                while let Some(c) = chars.next() {
                    let glyph = font.glyph(glyph_code(c));
                    if chars.peek().is_some() {
                        width += glyph.x_advance as i32;
                    } else {
                        width += glyph.x_offset as i32 + glyph.width as i32;
                    }
                }
                width * size
            }
        }
    }

    /// Prints one character at the cursor and advances it.
    ///
    /// `\n` moves to the start of the next line, `\r` is ignored. When
    /// wrapping is enabled a glyph that would cross the right edge moves to
    /// the next line before being drawn.
    pub fn write_char(&mut self, c: char) -> Result<(), HW::Error> {
        if c == '\r' {
            return Ok(());
        }
        if c == '\n' {
            self.text.cursor_x = 0;
            self.text.cursor_y += self.font_height();
            return Ok(());
        }

        let size = self.text.size as i32;
        let byte = glyph_code(c);

        // Width the glyph will occupy, for the wrap check.
        let extent = match self.fonts.get(self.text.font) {
            Font::Fixed => FIXED_WIDTH as i32 * size,
            Font::Rle(font) => font.char_width(byte) as i32 * size,
            Font::Outline(font) => {
                let glyph = font.glyph(byte);
                (glyph.x_offset as i32 + glyph.width as i32) * size
            }
        };
        if self.text.wrap && self.text.cursor_x + extent > self.width as i32 {
            self.text.cursor_x = 0;
            self.text.cursor_y += self.font_height();
        }

        let advance = self.draw_char(
            self.text.cursor_x,
            self.text.cursor_y,
            c,
            self.text.fg,
            self.text.bg,
            self.text.size,
        )?;
        self.text.cursor_x += advance;
        Ok(())
    }

    /// Prints a string at the cursor with wrapping.
    pub fn print(&mut self, text: &str) -> Result<(), HW::Error> {
        for c in text.chars() {
            self.write_char(c)?;
        }
        Ok(())
    }

    /// Draws `text` anchored at `(x, y)` by the current datum and returns
    /// the rendered width.
    ///
    /// The anchored position is clamped so the string stays on screen, and
    /// when padding is set the unused remainder of the padded width is
    /// filled with the background colour.
    pub fn draw_string(&mut self, text: &str, x: i32, y: i32) -> Result<i32, HW::Error> {
        let size = self.text.size as i32;
        let fg = self.text.fg;
        let bg = self.text.bg;
        let pad_x = self.text.padding as i32;
        let datum = self.text.datum;

        let mut po_x = x;
        let mut po_y = y;
        let mut cwidth = self.text_width(text);
        let mut cheight = self.font_height();
        let mut baseline = 0;

        let outline = match self.fonts.get(self.text.font) {
            Font::Outline(font) => Some(font),
            _ => None,
        };
        if let Some(font) = outline {
            // Reference the baseline: the datum maths below work on the
            // ascent/descent box rather than the line advance.
            baseline = font.ascent() * size;
            po_y += baseline;
            cheight = baseline + font.descent() * size;
        }

        if datum != Datum::TopLeft || pad_x != 0 {
            match datum {
                Datum::TopLeft => {}
                Datum::TopCentre => po_x -= cwidth / 2,
                Datum::TopRight => po_x -= cwidth,
                Datum::MiddleLeft => po_y -= cheight / 2,
                Datum::MiddleCentre => {
                    po_x -= cwidth / 2;
                    po_y -= cheight / 2;
                }
                Datum::MiddleRight => {
                    po_x -= cwidth;
                    po_y -= cheight / 2;
                }
                Datum::BottomLeft => po_y -= cheight,
                Datum::BottomCentre => {
                    po_x -= cwidth / 2;
                    po_y -= cheight;
                }
                Datum::BottomRight => {
                    po_x -= cwidth;
                    po_y -= cheight;
                }
                Datum::BaselineLeft => po_y -= baseline,
                Datum::BaselineCentre => {
                    po_x -= cwidth / 2;
                    po_y -= baseline;
                }
                Datum::BaselineRight => {
                    po_x -= cwidth;
                    po_y -= baseline;
                }
            }

            // Keep the whole string on screen.
            if po_x < 0 {
                po_x = 0;
            }
            if po_x + cwidth > self.width as i32 {
                po_x = self.width as i32 - cwidth;
            }
            if po_y < 0 {
                po_y = 0;
            }
            if po_y + cheight - baseline > self.height as i32 {
                po_y = self.height as i32 - cheight + baseline;
            }
        }

        // Outline glyphs are transparent, so an opaque background is painted
        // as one band behind the whole string before the glyphs go down.
        let mut xo = 0;
        if let Some(font) = outline {
            if fg != bg {
                if let Some(first) = text.chars().next() {
                    xo = font.glyph(glyph_code(first)).x_offset as i32 * size;
                    if xo > 0 {
                        xo = 0;
                    } else {
                        cwidth -= xo;
                    }
                }
                self.fill_rect(po_x + xo, po_y - baseline, cwidth, cheight, bg)?;
            }
        }

        let mut sum_x = 0;
        for c in text.chars() {
            sum_x += self.draw_char(po_x + sum_x, po_y, c, fg, bg, self.text.size)?;
        }

        if pad_x > cwidth && fg != bg {
            let fill_y = po_y - baseline;
            match datum.bias() {
                Bias::Left => {
                    self.fill_rect(po_x + cwidth + xo, fill_y, pad_x - cwidth, cheight, bg)?;
                }
                Bias::Centre => {
                    let half = (pad_x - cwidth) >> 1;
                    self.fill_rect(po_x + cwidth + xo, fill_y, half, cheight, bg)?;
                    self.fill_rect(po_x - half, fill_y, half, cheight, bg)?;
                }
                Bias::Right => {
                    let mut pad_xc = po_x + cwidth + xo;
                    if pad_xc > pad_x {
                        pad_xc = pad_x;
                    }
                    self.fill_rect(po_x + cwidth - pad_xc, fill_y, pad_xc - cwidth, cheight, bg)?;
                }
            }
        }

        Ok(sum_x)
    }

    /// Draws `text` centred on `x`, overriding the datum for this call.
    pub fn draw_centre_string(&mut self, text: &str, x: i32, y: i32) -> Result<i32, HW::Error> {
        let datum = self.text.datum;
        self.text.datum = Datum::TopCentre;
        let result = self.draw_string(text, x, y);
        self.text.datum = datum;
        result
    }

    /// Draws `text` right-aligned to `x`, overriding the datum for this call.
    pub fn draw_right_string(&mut self, text: &str, x: i32, y: i32) -> Result<i32, HW::Error> {
        let datum = self.text.datum;
        self.text.datum = Datum::TopRight;
        let result = self.draw_string(text, x, y);
        self.text.datum = datum;
        result
    }

    /// Draws a decimal integer with the current datum.
    pub fn draw_number(&mut self, number: i32, x: i32, y: i32) -> Result<i32, HW::Error> {
        let mut buf: heapless::String<12> = heapless::String::new();
        // i32 always fits in 12 bytes.
        let _ = write!(buf, "{}", number);
        self.draw_string(&buf, x, y)
    }

    /// Draws a float rounded to `dp` decimal places (at most 7).
    ///
    /// Values too large for the integer conversion render as `"..."`.
    pub fn draw_float(&mut self, value: f32, dp: u8, x: i32, y: i32) -> Result<i32, HW::Error> {
        let mut buf: heapless::String<20> = heapless::String::new();

        if !(value.abs() < 2147483647.0) {
            let _ = buf.push_str("...");
            return self.draw_string(&buf, x, y);
        }

        let dp = dp.min(7);
        let mut rounding = 0.5_f32;
        for _ in 0..dp {
            rounding /= 10.0;
        }

        // Values that round to zero carry no sign.
        let mut value = value;
        if value < -rounding {
            let _ = buf.push('-');
            value = -value;
        }
        value += rounding;

        let whole = value as u32;
        let _ = write!(buf, "{}", whole);

        if dp > 0 {
            let _ = buf.push('.');
            let mut frac = value - whole as f32;
            for _ in 0..dp {
                frac *= 10.0;
                let digit = frac as u32;
                let _ = buf.push((b'0' + digit as u8) as char);
                frac -= digit as f32;
            }
        }

        self.draw_string(&buf, x, y)
    }
}

#[cfg(test)]
mod tests {
    use crate::{fonts::OutlineGlyph, testhw::Harness};

    use super::*;

    fn lit_bounds(h: &Harness, color: Rgb565) -> Option<(i32, i32, i32, i32)> {
        let mut bounds: Option<(i32, i32, i32, i32)> = None;
        for y in 0..h.height() {
            for x in 0..h.width() {
                if h.pixel(x, y) == Some(color) {
                    bounds = Some(match bounds {
                        None => (x, y, x, y),
                        Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                    });
                }
            }
        }
        bounds
    }

    #[test]
    fn test_print_wraps_at_right_edge() {
        // 60 px panel, 6 px cells: ten characters per line.
        let mut h = Harness::new(60, 32);
        h.tft.print("ABCDEFGHIJK").unwrap();

        assert_eq!(h.tft.cursor(), (6, 8));
        // 'K' landed on the second line.
        let (_, y0, _, _) = lit_bounds(&h, Rgb565::WHITE).unwrap();
        assert_eq!(y0, 0);
        assert!((0..6).any(|x| (8..16).any(|y| h.pixel(x, y) == Some(Rgb565::WHITE))));
    }

    #[test]
    fn test_print_without_wrap_clips() {
        let mut h = Harness::new(60, 32);
        h.tft.set_text_wrap(false);
        h.tft.print("ABCDEFGHIJK").unwrap();
        assert_eq!(h.tft.cursor(), (66, 0));
        // Nothing reached a second line.
        for y in 8..32 {
            for x in 0..60 {
                assert_eq!(h.pixel(x, y), Some(Rgb565::BLACK));
            }
        }
    }

    #[test]
    fn test_newline_and_carriage_return() {
        let mut h = Harness::new(60, 32);
        h.tft.print("A\r\nB").unwrap();
        assert_eq!(h.tft.cursor(), (6, 8));
    }

    #[test]
    fn test_datum_middle_centre_matches_top_left_offset() {
        let mut tl = Harness::new(64, 64);
        tl.tft.draw_string("HI", 20, 24).unwrap();

        let mut mc = Harness::new(64, 64);
        mc.tft.set_text_datum(Datum::MiddleCentre);
        // "HI" is 12x8, so MC at (26, 28) lands the box at (20, 24).
        mc.tft.draw_string("HI", 26, 28).unwrap();

        for y in 0..64 {
            for x in 0..64 {
                assert_eq!(tl.pixel(x, y), mc.pixel(x, y), "({x},{y})");
            }
        }
    }

    #[test]
    fn test_datum_bottom_right() {
        let mut h = Harness::new(64, 64);
        h.tft.set_text_datum(Datum::BottomRight);
        h.tft.draw_string("HI", 60, 40).unwrap();
        let (x0, y0, x1, y1) = lit_bounds(&h, Rgb565::WHITE).unwrap();
        // Bounding box sits above-left of the anchor, inside 12x8.
        assert!(x1 < 60 && x0 >= 48);
        assert!(y1 < 40 && y0 >= 32);
    }

    #[test]
    fn test_draw_string_clamps_on_screen() {
        let mut h = Harness::new(64, 64);
        h.tft.set_text_datum(Datum::TopCentre);
        // Anchor at x=2 would push the string off the left edge.
        h.tft.draw_string("WIDE", 2, 0).unwrap();
        let (x0, _, _, _) = lit_bounds(&h, Rgb565::WHITE).unwrap();
        assert!(x0 >= 0);

        let mut h = Harness::new(64, 64);
        h.tft.set_text_datum(Datum::MiddleLeft);
        h.tft.draw_string("HI", 0, 62).unwrap();
        let (_, _, _, y1) = lit_bounds(&h, Rgb565::WHITE).unwrap();
        assert!(y1 < 64);
    }

    #[test]
    fn test_padding_fills_right_of_short_string() {
        let mut h = Harness::new(64, 64);
        // Paint leftovers from a previous, longer string.
        h.tft.fill_rect(0, 0, 40, 8, Rgb565::RED).unwrap();
        h.tft.set_text_padding(36);
        h.tft.draw_string("HI", 0, 0).unwrap();

        // The padded region beyond the 12 px string is background again.
        for x in 12..36 {
            for y in 0..8 {
                assert_eq!(h.pixel(x, y), Some(Rgb565::BLACK), "({x},{y})");
            }
        }
        // Beyond the padding the old pixels survive.
        assert_eq!(h.pixel(38, 2), Some(Rgb565::RED));
    }

    #[test]
    fn test_padding_centre_splits_both_sides() {
        let mut h = Harness::new(64, 64);
        h.tft.fill_screen(Rgb565::RED).unwrap();
        h.tft.set_text_datum(Datum::TopCentre);
        h.tft.set_text_padding(32);
        h.tft.draw_string("HI", 32, 0).unwrap();

        // 32 - 12 = 20 px of padding, 10 on each side: 16..26 and 38..48.
        assert_eq!(h.pixel(20, 4), Some(Rgb565::BLACK));
        assert_eq!(h.pixel(44, 4), Some(Rgb565::BLACK));
        assert_eq!(h.pixel(10, 4), Some(Rgb565::RED));
        assert_eq!(h.pixel(54, 4), Some(Rgb565::RED));
    }

    // A single solid 8x8 glyph sitting on the baseline, advance 9.
    static BLOCK_GLYPHS: [OutlineGlyph; 1] = [OutlineGlyph {
        bitmap_offset: 0,
        width: 8,
        height: 8,
        x_advance: 9,
        x_offset: 0,
        y_offset: -8,
    }];
    static BLOCK_FONT: OutlineFont = OutlineFont {
        bitmap: &[0xFF; 8],
        glyphs: &BLOCK_GLYPHS,
        first: b'A',
        last: b'A',
        y_advance: 10,
    };

    #[test]
    fn test_outline_padding_clears_band_remainder() {
        let mut h = Harness::new(64, 64);
        h.tft.fill_screen(Rgb565::RED).unwrap();
        h.tft.set_free_font(Some(&BLOCK_FONT));
        h.tft.set_text_padding(40);
        h.tft.draw_string("A", 0, 0).unwrap();

        // The glyph cell is drawn...
        assert_eq!(h.pixel(2, 4), Some(Rgb565::WHITE));
        // ...and the rest of the padded width is background, so pixels left
        // over from a previously longer string cannot survive.
        assert_eq!(h.pixel(20, 4), Some(Rgb565::BLACK));
        assert_eq!(h.pixel(39, 4), Some(Rgb565::BLACK));
        assert_eq!(h.pixel(45, 4), Some(Rgb565::RED));
    }

    #[test]
    fn test_non_ascii_measures_like_replacement_glyph() {
        let mut h = Harness::new(64, 64);
        // Non-ASCII renders as '?', so it must measure as one cell too.
        assert_eq!(h.tft.text_width("\u{e9}"), 6);
        let drawn = h.tft.draw_string("\u{e9}", 0, 0).unwrap();
        assert_eq!(drawn, 6);
    }

    #[test]
    fn test_transparent_text_skips_padding() {
        let mut h = Harness::new(64, 64);
        h.tft.fill_screen(Rgb565::RED).unwrap();
        h.tft.set_text_color(Rgb565::WHITE, None);
        h.tft.set_text_padding(36);
        h.tft.draw_string("HI", 0, 0).unwrap();
        assert_eq!(h.pixel(20, 4), Some(Rgb565::RED));
    }

    #[test]
    fn test_centre_and_right_strings_restore_datum() {
        let mut h = Harness::new(64, 64);
        h.tft.set_text_datum(Datum::BottomLeft);
        h.tft.draw_centre_string("A", 32, 0).unwrap();
        h.tft.draw_right_string("A", 60, 8).unwrap();
        assert_eq!(h.tft.text_datum(), Datum::BottomLeft);
    }

    #[test]
    fn test_draw_number_width() {
        let mut h = Harness::new(64, 64);
        let w = h.tft.draw_number(-123, 0, 0).unwrap();
        assert_eq!(w, 4 * 6);
    }

    #[test]
    fn test_draw_float_formatting() {
        let mut h = Harness::new(128, 64);
        // 3.14159 to 2 dp rounds to 3.14: four glyph cells.
        let w = h.tft.draw_float(3.14159, 2, 0, 0).unwrap();
        assert_eq!(w, 4 * 6);

        // dp = 0 renders no decimal point.
        let w = h.tft.draw_float(2.7, 0, 0, 16).unwrap();
        assert_eq!(w, 6);

        // Negative sign counts as a cell.
        let w = h.tft.draw_float(-1.5, 1, 0, 24).unwrap();
        assert_eq!(w, 4 * 6);

        // Out-of-range values degrade to an ellipsis.
        let w = h.tft.draw_float(1.0e12, 2, 0, 32).unwrap();
        assert_eq!(w, 3 * 6);

        // Negatives that round to zero drop the sign: "0.00", not "-0.00".
        let w = h.tft.draw_float(-0.001, 2, 0, 40).unwrap();
        assert_eq!(w, 4 * 6);
    }

    #[test]
    fn test_text_size_clamped() {
        let mut h = Harness::new(64, 64);
        h.tft.set_text_size(0);
        assert_eq!(h.tft.font_height(), 8);
        h.tft.set_text_size(9);
        assert_eq!(h.tft.font_height(), 7 * 8);
    }
}
