//! Glyph rendering for the three font families.
//!
//! Each family has a streaming fast path used when the glyph cell can be
//! covered by a single addressed window (opaque background, no scaling), and
//! a clipping-safe slow path that decomposes the glyph into runs and
//! rectangles.

use embedded_graphics::pixelcolor::Rgb565;

use crate::{
    display::Tft,
    fonts::{self, Font, OutlineFont, RleFont, FIXED_HEIGHT, FIXED_WIDTH},
    TftHw,
};

impl<HW: TftHw> Tft<'_, HW> {
    /// Draws one character of the currently selected font and returns the
    /// horizontal advance in pixels.
    ///
    /// For the fixed and RLE families, `(x, y)` is the top-left corner of
    /// the glyph cell. For outline fonts it is the pen position on the
    /// baseline, matching how converted TrueType fonts express their
    /// metrics.
    pub fn draw_char(
        &mut self,
        x: i32,
        y: i32,
        c: char,
        fg: Rgb565,
        bg: Rgb565,
        size: u8,
    ) -> Result<i32, HW::Error> {
        let size = size.clamp(1, 7) as i32;
        let c = fonts::glyph_code(c);
        match self.fonts.get(self.text.font) {
            Font::Fixed => self.draw_fixed_char(x, y, c, fg, bg, size),
            Font::Rle(font) => self.draw_rle_char(x, y, c, fg, bg, size, font),
            Font::Outline(font) => self.draw_outline_char(x, y, c, fg, size, font),
        }
    }

    /// Renders a fixed-font glyph cell (6x8 before scaling).
    pub(crate) fn draw_fixed_char(
        &mut self,
        x: i32,
        y: i32,
        c: u8,
        fg: Rgb565,
        bg: Rgb565,
        size: i32,
    ) -> Result<i32, HW::Error> {
        let w = FIXED_WIDTH as i32 * size;
        let h = FIXED_HEIGHT as i32 * size;
        if x >= self.width as i32 || y >= self.height as i32 || x + w <= 0 || y + h <= 0 {
            return Ok(w);
        }
        let glyph = fonts::fixed_glyph(c);

        let on_screen =
            x >= 0 && y >= 0 && x + w <= self.width as i32 && y + h <= self.height as i32;
        if size == 1 && fg != bg && on_screen {
            // Fast path: one window, stream the whole cell row by row. The
            // sixth column is the inter-character gap.
            return self.with_bus(|tft| {
                tft.set_addr_window(x as u16, y as u16, (x + 5) as u16, (y + 7) as u16)?;
                for row in 0..8 {
                    let mut line = [bg; 6];
                    for (col, pixel) in line.iter_mut().take(5).enumerate() {
                        if glyph[col] >> row & 1 != 0 {
                            *pixel = fg;
                        }
                    }
                    tft.write_pixels(&line)?;
                }
                Ok(w)
            });
        }

        for col in 0..6 {
            let line = if col == 5 { 0 } else { glyph[col] };
            for row in 0..8 {
                let lit = line >> row & 1 != 0;
                if !lit && fg == bg {
                    continue;
                }
                let color = if lit { fg } else { bg };
                if size == 1 {
                    self.draw_pixel(x + col as i32, y + row, color)?;
                } else {
                    self.fill_rect(
                        x + col as i32 * size,
                        y + row * size,
                        size,
                        size,
                        color,
                    )?;
                }
            }
        }
        Ok(w)
    }

    /// Renders an RLE-font glyph.
    pub(crate) fn draw_rle_char(
        &mut self,
        x: i32,
        y: i32,
        c: u8,
        fg: Rgb565,
        bg: Rgb565,
        size: i32,
        font: &RleFont<'_>,
    ) -> Result<i32, HW::Error> {
        let index = font.index(c);
        let w = font.widths[index] as i32;
        let h = font.height as i32;
        let data = font.glyphs[index];
        let advance = w * size;
        if x >= self.width as i32 || y >= self.height as i32 {
            return Ok(advance);
        }

        let on_screen = x >= 0
            && y >= 0
            && x + w * size <= self.width as i32
            && y + h * size <= self.height as i32;
        if size == 1 && fg != bg && on_screen {
            // Fast path: one window over the glyph, each control byte
            // becomes one colour run. Runs wrap rows inside the window for
            // free.
            return self.with_bus(|tft| {
                tft.set_addr_window(x as u16, y as u16, (x + w - 1) as u16, (y + h - 1) as u16)?;
                for &control in data {
                    let len = (control & 0x7F) as u32 + 1;
                    let color = if control & 0x80 != 0 { fg } else { bg };
                    tft.write_color_run(color, len)?;
                }
                Ok(advance)
            });
        }

        // Slow path: paint the cell background first (when opaque), then
        // decode only the foreground runs, splitting each at row boundaries.
        if fg != bg {
            self.fill_rect(x, y, w * size, h * size, bg)?;
        }
        let mut cursor: i32 = 0;
        for &control in data {
            let mut len = (control & 0x7F) as i32 + 1;
            if control & 0x80 == 0 {
                cursor += len;
                continue;
            }
            while len > 0 {
                let col = cursor % w;
                let row = cursor / w;
                let run = len.min(w - col);
                if size == 1 {
                    self.draw_fast_hline(x + col, y + row, run, fg)?;
                } else {
                    self.fill_rect(x + col * size, y + row * size, run * size, size, fg)?;
                }
                cursor += run;
                len -= run;
            }
        }
        Ok(advance)
    }

    /// Renders an outline-font glyph at the baseline pen position.
    ///
    /// Outline glyphs have no background: set foreground pixels accumulate
    /// into horizontal runs which flush at each background pixel and at row
    /// ends.
    pub(crate) fn draw_outline_char(
        &mut self,
        x: i32,
        y: i32,
        c: u8,
        fg: Rgb565,
        size: i32,
        font: &OutlineFont<'_>,
    ) -> Result<i32, HW::Error> {
        let glyph = font.glyph(c);
        let w = glyph.width as i32;
        let h = glyph.height as i32;
        let xo = glyph.x_offset as i32;
        let yo = glyph.y_offset as i32;

        let mut offset = glyph.bitmap_offset as usize;
        let mut bits: u8 = 0;
        let mut mask: u8 = 0;
        let mut run = 0;

        for row in 0..h {
            for col in 0..w {
                if mask == 0 {
                    bits = font.bitmap[offset];
                    offset += 1;
                    mask = 0x80;
                }
                if bits & mask != 0 {
                    run += 1;
                } else if run > 0 {
                    self.flush_outline_run(x, y, xo + col - run, yo + row, run, size, fg)?;
                    run = 0;
                }
                mask >>= 1;
            }
            if run > 0 {
                self.flush_outline_run(x, y, xo + w - run, yo + row, run, size, fg)?;
                run = 0;
            }
        }
        Ok(glyph.x_advance as i32 * size)
    }

    fn flush_outline_run(
        &mut self,
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
        run: i32,
        size: i32,
        fg: Rgb565,
    ) -> Result<(), HW::Error> {
        if size == 1 {
            self.draw_fast_hline(x + dx, y + dy, run, fg)
        } else {
            self.fill_rect(x + dx * size, y + dy * size, run * size, size, fg)
        }
    }
}
