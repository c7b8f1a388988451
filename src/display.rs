use embedded_graphics::pixelcolor::Rgb565;
use embedded_hal::{delay::DelayNs as _, digital::OutputPin as _, spi::SpiBus as _};

use crate::{
    color565,
    comms::Command,
    fonts::FontSet,
    log::debug,
    text::TextState,
    Config, TftHw,
};

/// Marks an init-table argument count whose record carries a trailing
/// post-command delay byte.
const INIT_DELAY_FLAG: u8 = 0x80;

/// Driver for an SPI-attached TFT panel.
///
/// All drawing streams pixels directly into the controller's graphics RAM
/// through a rectangular addressed window; nothing is buffered host-side.
/// The driver caches the column/row range latched by the last window command
/// and skips re-sending whichever half still matches, which is the main
/// throughput optimisation for single-pixel-heavy shapes.
///
/// Geometry outside the panel is silently clipped; drawing methods only
/// return an error when the underlying bus or pin access fails.
pub struct Tft<'a, HW: TftHw> {
    pub(crate) hw: HW,
    base_width: u16,
    base_height: u16,
    pub(crate) width: u16,
    pub(crate) height: u16,
    rotation: u8,
    madctl: [u8; 4],
    init_sequence: &'a [u8],
    /// Column of the last latched window, `None` when unknown.
    addr_col: Option<u16>,
    /// Row of the last latched window, `None` when unknown.
    addr_row: Option<u16>,
    pub(crate) bus_depth: u8,
    pub(crate) text: TextState,
    pub(crate) fonts: FontSet<'a>,
}

impl<'a, HW: TftHw> Tft<'a, HW> {
    /// Creates a driver for the panel described by `config`. Call
    /// [`Tft::init`] before drawing.
    pub fn new(hw: HW, config: Config<'a>, fonts: FontSet<'a>) -> Self {
        Tft {
            hw,
            base_width: config.width,
            base_height: config.height,
            width: config.width,
            height: config.height,
            rotation: 0,
            madctl: config.madctl,
            init_sequence: config.init_sequence,
            addr_col: None,
            addr_row: None,
            bus_depth: 0,
            text: TextState::default(),
            fonts,
        }
    }

    /// Hardware-resets the controller, then walks the panel's initialisation
    /// table.
    ///
    /// The table is a stream of records: a command byte, an argument-count
    /// byte (top bit set when a delay byte follows the arguments), the
    /// argument bytes, and optionally one delay byte in milliseconds where
    /// `255` encodes 500 ms. The walk stops at the end of the slice.
    pub fn init(&mut self) -> Result<(), HW::Error> {
        debug!("Initialising display");

        self.hw.reset().set_high()?;
        self.hw.delay().delay_ms(5);
        self.hw.reset().set_low()?;
        self.hw.delay().delay_ms(20);
        self.hw.reset().set_high()?;
        self.hw.delay().delay_ms(150);

        self.send(Command::SwReset, &[])?;
        self.hw.delay().delay_ms(5);

        let mut table = self.init_sequence;
        while table.len() >= 2 {
            let command = table[0];
            let nargs = (table[1] & !INIT_DELAY_FLAG) as usize;
            let delay_follows = table[1] & INIT_DELAY_FLAG != 0;
            let record_len = 2 + nargs + usize::from(delay_follows);
            debug_assert!(table.len() >= record_len, "truncated init table record");
            if table.len() < record_len {
                break;
            }

            self.send_raw(command, &table[2..2 + nargs])?;
            if delay_follows {
                let ms = table[2 + nargs];
                self.hw
                    .delay()
                    .delay_ms(if ms == 255 { 500 } else { ms as u32 });
            }
            table = &table[record_len..];
        }

        self.set_rotation(0)
    }

    /// Rotates the display output. `rotation` is taken modulo 4; odd values
    /// swap the panel's width and height.
    ///
    /// Any previously latched addressed window is forgotten.
    pub fn set_rotation(&mut self, rotation: u8) -> Result<(), HW::Error> {
        let rotation = rotation & 3;
        debug!("Setting rotation {}", rotation);
        self.send(Command::MemoryAccessCtrl, &[self.madctl[rotation as usize]])?;
        self.rotation = rotation;
        if rotation % 2 == 0 {
            self.width = self.base_width;
            self.height = self.base_height;
        } else {
            self.width = self.base_height;
            self.height = self.base_width;
        }
        self.addr_col = None;
        self.addr_row = None;
        Ok(())
    }

    /// Inverts (or un-inverts) the display colours.
    pub fn invert_display(&mut self, invert: bool) -> Result<(), HW::Error> {
        let command = if invert {
            Command::InvertOn
        } else {
            Command::InvertOff
        };
        // Some controllers miss a single inversion command; sending it twice
        // is reliable.
        self.send(command, &[])?;
        self.send(command, &[])
    }

    /// Current display width in pixels, accounting for rotation.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Current display height in pixels, accounting for rotation.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// The rotation value last set by [`Tft::set_rotation`].
    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    /// Releases the underlying hardware bundle.
    pub fn release(self) -> HW {
        self.hw
    }

    /// Sends a raw command byte plus data inside one transaction bracket.
    /// Used for vendor-specific registers that are not part of [`Command`].
    pub(crate) fn send_raw(&mut self, command: u8, data: &[u8]) -> Result<(), HW::Error> {
        self.with_bus(|tft| {
            tft.hw.dc().set_low()?;
            tft.hw.spi().write(&[command])?;
            tft.hw.dc().set_high()?;
            if !data.is_empty() {
                tft.hw.spi().write(data)?;
            }
            Ok(())
        })
    }

    /// Latches the addressed window and issues the memory-write command,
    /// leaving the controller ready to accept `(x1-x0+1)*(y1-y0+1)` pixels
    /// in row-major order. Must run inside a transaction bracket.
    ///
    /// Always invalidates the single-pixel address cache: the full bounds
    /// were just replaced, so [`Tft::draw_pixel`] has to re-send both.
    pub(crate) fn set_addr_window(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    ) -> Result<(), HW::Error> {
        self.addr_col = None;
        self.addr_row = None;

        self.write_command(Command::ColumnAddrSet)?;
        self.write_coords(x0, x1)?;
        self.write_command(Command::RowAddrSet)?;
        self.write_coords(y0, y1)?;
        self.write_command(Command::MemoryWrite)
    }

    /// Defines the window that subsequent [`Tft::push_colors`] calls stream
    /// into. Coordinates are inclusive and must lie within the panel.
    pub fn set_window(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) -> Result<(), HW::Error> {
        self.with_bus(|tft| tft.set_addr_window(x0 as u16, y0 as u16, x1 as u16, y1 as u16))
    }

    /// Pushes a single pixel at an arbitrary position.
    ///
    /// This is the single-pixel fast path: the column command is re-sent only
    /// when `x` differs from the cached column, the row command only when `y`
    /// differs from the cached row. Out-of-bounds coordinates are dropped.
    pub fn draw_pixel(&mut self, x: i32, y: i32, color: Rgb565) -> Result<(), HW::Error> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return Ok(());
        }
        let (x, y) = (x as u16, y as u16);

        self.with_bus(|tft| {
            if tft.addr_col != Some(x) {
                tft.write_command(Command::ColumnAddrSet)?;
                tft.write_coords(x, x)?;
                tft.addr_col = Some(x);
            }
            if tft.addr_row != Some(y) {
                tft.write_command(Command::RowAddrSet)?;
                tft.write_coords(y, y)?;
                tft.addr_row = Some(y);
            }
            tft.write_command(Command::MemoryWrite)?;
            tft.write_color(color)
        })
    }

    /// Draws a horizontal run of pixels, clamped to the panel bounds.
    pub fn draw_fast_hline(
        &mut self,
        mut x: i32,
        y: i32,
        mut w: i32,
        color: Rgb565,
    ) -> Result<(), HW::Error> {
        if x < 0 {
            w += x;
            x = 0;
        }
        if y < 0 || y >= self.height as i32 || x >= self.width as i32 || w < 1 {
            return Ok(());
        }
        if x + w - 1 >= self.width as i32 {
            w = self.width as i32 - x;
        }

        self.with_bus(|tft| {
            tft.set_addr_window(x as u16, y as u16, (x + w - 1) as u16, y as u16)?;
            tft.write_color_run(color, w as u32)
        })
    }

    /// Draws a vertical run of pixels, clamped to the panel bounds.
    pub fn draw_fast_vline(
        &mut self,
        x: i32,
        mut y: i32,
        mut h: i32,
        color: Rgb565,
    ) -> Result<(), HW::Error> {
        if y < 0 {
            h += y;
            y = 0;
        }
        if x < 0 || x >= self.width as i32 || y >= self.height as i32 || h < 1 {
            return Ok(());
        }
        if y + h - 1 >= self.height as i32 {
            h = self.height as i32 - y;
        }

        self.with_bus(|tft| {
            tft.set_addr_window(x as u16, y as u16, x as u16, (y + h - 1) as u16)?;
            tft.write_color_run(color, h as u32)
        })
    }

    /// Fills a rectangle, clamped to the panel bounds.
    pub fn fill_rect(
        &mut self,
        mut x: i32,
        mut y: i32,
        mut w: i32,
        mut h: i32,
        color: Rgb565,
    ) -> Result<(), HW::Error> {
        if x < 0 {
            w += x;
            x = 0;
        }
        if y < 0 {
            h += y;
            y = 0;
        }
        if w < 1 || h < 1 || x >= self.width as i32 || y >= self.height as i32 {
            return Ok(());
        }
        if x + w - 1 >= self.width as i32 {
            w = self.width as i32 - x;
        }
        if y + h - 1 >= self.height as i32 {
            h = self.height as i32 - y;
        }

        self.with_bus(|tft| {
            tft.set_addr_window(x as u16, y as u16, (x + w - 1) as u16, (y + h - 1) as u16)?;
            tft.write_color_run(color, (w * h) as u32)
        })
    }

    /// Draws a rectangle outline.
    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgb565) -> Result<(), HW::Error> {
        self.draw_fast_hline(x, y, w, color)?;
        self.draw_fast_hline(x, y + h - 1, w, color)?;
        self.draw_fast_vline(x, y, h, color)?;
        self.draw_fast_vline(x + w - 1, y, h, color)
    }

    /// Clears the whole screen to one colour.
    pub fn fill_screen(&mut self, color: Rgb565) -> Result<(), HW::Error> {
        self.fill_rect(0, 0, self.width as i32, self.height as i32, color)
    }

    /// Draws a 1-bpp bitmap in a single colour, for logos and icons.
    ///
    /// Rows are MSB-first and padded to byte boundaries. Set bits are
    /// painted, clear bits leave the canvas untouched; consecutive set bits
    /// go out as one horizontal run.
    pub fn draw_bitmap(
        &mut self,
        x: i32,
        y: i32,
        bitmap: &[u8],
        w: i32,
        h: i32,
        color: Rgb565,
    ) -> Result<(), HW::Error> {
        let byte_width = ((w + 7) / 8) as usize;
        let mut run = 0;
        for row in 0..h {
            for col in 0..w {
                let byte = bitmap[row as usize * byte_width + (col / 8) as usize];
                if byte & (0x80 >> (col & 7)) != 0 {
                    run += 1;
                } else if run > 0 {
                    self.draw_fast_hline(x + col - run, y + row, run, color)?;
                    run = 0;
                }
            }
            if run > 0 {
                self.draw_fast_hline(x + w - run, y + row, run, color)?;
                run = 0;
            }
        }
        Ok(())
    }

    /// Streams raw pixels into the window last defined by
    /// [`Tft::set_window`]. The controller's write cursor carries over
    /// between calls, so image decoders can feed scanlines in chunks.
    pub fn push_colors(&mut self, pixels: &[Rgb565]) -> Result<(), HW::Error> {
        self.with_bus(|tft| tft.write_pixels(pixels))
    }

    /// Pushes a `w`x`h` block of pixels (row-major) to the given position.
    ///
    /// The rectangle must lie within the panel; fully out-of-range calls are
    /// dropped. `pixels` must hold at least `w * h` entries.
    pub fn push_rect(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        pixels: &[Rgb565],
    ) -> Result<(), HW::Error> {
        if x < 0 || y < 0 || w < 1 || h < 1 || x >= self.width as i32 || y >= self.height as i32 {
            return Ok(());
        }

        self.with_bus(|tft| {
            tft.set_addr_window(x as u16, y as u16, (x + w - 1) as u16, (y + h - 1) as u16)?;
            tft.write_pixels(&pixels[..(w * h) as usize])
        })
    }

    /// Reads a `w`x`h` block of pixels (row-major) back from the panel.
    ///
    /// The controller returns 18-bit colour; each pixel is truncated to the
    /// same RGB565 values produced by [`color565`].
    pub fn read_rect(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        pixels: &mut [Rgb565],
    ) -> Result<(), HW::Error> {
        if x < 0 || y < 0 || w < 1 || h < 1 || x >= self.width as i32 || y >= self.height as i32 {
            return Ok(());
        }

        self.with_bus(|tft| {
            // Latching the window sends a don't-care memory-write command;
            // the read command below replaces it.
            tft.set_addr_window(x as u16, y as u16, (x + w - 1) as u16, (y + h - 1) as u16)?;
            tft.write_command(Command::MemoryRead)?;

            let mut dummy = [0u8; 1];
            tft.read_data(&mut dummy)?;

            for pixel in pixels[..(w * h) as usize].iter_mut() {
                let mut rgb = [0u8; 3];
                tft.read_data(&mut rgb)?;
                *pixel = color565(rgb[0], rgb[1], rgb[2]);
            }
            Ok(())
        })
    }

    /// Reads one pixel back from the panel.
    pub fn read_pixel(&mut self, x: i32, y: i32) -> Result<Rgb565, HW::Error> {
        let mut pixel = [Rgb565::new(0, 0, 0)];
        self.read_rect(x, y, 1, 1, &mut pixel)?;
        Ok(pixel[0])
    }
}
