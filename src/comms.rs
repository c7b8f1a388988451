use embedded_graphics::{pixelcolor::Rgb565, prelude::IntoStorage};
use embedded_hal::{digital::OutputPin as _, spi::SpiBus as _};

use crate::{display::Tft, log::trace, TftHw};

/// Largest number of pixels encoded into one SPI write when streaming a
/// single-colour run.
const RUN_CHUNK: usize = 32;

/// The MIPI-DCS command subset used by the driver. You probably want the
/// drawing methods on [`Tft`] for most operations, but commands can be sent
/// directly with [`Tft::send`] for low-level control or experimentation.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Does nothing; can be used to terminate a memory write or read.
    Nop = 0x00,
    /// Software reset. Needs a settle delay before further commands.
    SwReset = 0x01,
    /// Leaves the minimum-power sleep mode entered at power-on.
    SleepOut = 0x11,
    /// Enters normal display mode (exits partial mode).
    NormalOn = 0x13,
    /// Disables colour inversion.
    InvertOff = 0x20,
    /// Enables colour inversion.
    InvertOn = 0x21,
    /// Turns the display output on.
    DisplayOn = 0x29,
    /// Sets the column bounds of the addressed window. Two big-endian
    /// 16-bit values, start and end, both inclusive.
    ColumnAddrSet = 0x2A,
    /// Sets the row bounds of the addressed window. Same format as
    /// [`Command::ColumnAddrSet`].
    RowAddrSet = 0x2B,
    /// Starts a pixel stream into the addressed window; the write cursor
    /// auto-advances in row-major order.
    MemoryWrite = 0x2C,
    /// Starts a pixel read-back from the addressed window. The controller
    /// first clocks out one dummy byte, then three bytes (18-bit colour)
    /// per pixel.
    MemoryRead = 0x2E,
    /// Memory access control: scan direction and row/column exchange, used
    /// to implement rotation.
    MemoryAccessCtrl = 0x36,
    /// Selects the interface pixel format (0x05 = 16-bit RGB565).
    PixelFormat = 0x3A,
}

impl Command {
    /// Returns the register address for this command.
    pub(crate) fn register(self) -> u8 {
        self as u8
    }
}

impl<HW: TftHw> Tft<'_, HW> {
    /// Opens a bus transaction: asserts chip-select on the outermost call.
    ///
    /// Brackets nest so that compound operations can call primitives which
    /// open their own bracket; only the outermost close releases the bus.
    pub(crate) fn begin_bus(&mut self) -> Result<(), HW::Error> {
        if self.bus_depth == 0 {
            self.hw.cs().set_low()?;
        }
        self.bus_depth += 1;
        Ok(())
    }

    /// Closes a bus transaction; flushes and deasserts chip-select when the
    /// outermost bracket closes.
    pub(crate) fn end_bus(&mut self) -> Result<(), HW::Error> {
        debug_assert!(self.bus_depth > 0, "unbalanced bus transaction");
        self.bus_depth -= 1;
        if self.bus_depth == 0 {
            self.hw.spi().flush()?;
            self.hw.cs().set_high()?;
        }
        Ok(())
    }

    /// Runs `op` inside a transaction bracket, releasing the bus on every
    /// exit path including errors raised by `op` itself.
    pub(crate) fn with_bus<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, HW::Error>,
    ) -> Result<T, HW::Error> {
        self.begin_bus()?;
        let result = op(self);
        let end = self.end_bus();
        let value = result?;
        end?;
        Ok(value)
    }

    /// Sends a raw command byte. The device is left in data mode.
    pub(crate) fn write_command(&mut self, command: Command) -> Result<(), HW::Error> {
        trace!("Sending TFT command {:?}", command);
        self.hw.dc().set_low()?;
        self.hw.spi().write(&[command.register()])?;
        self.hw.dc().set_high()?;
        Ok(())
    }

    /// Sends raw data bytes for the previously issued command.
    pub(crate) fn write_data(&mut self, data: &[u8]) -> Result<(), HW::Error> {
        self.hw.spi().write(data)?;
        Ok(())
    }

    /// Sends an inclusive start/end coordinate pair as two big-endian words.
    pub(crate) fn write_coords(&mut self, start: u16, end: u16) -> Result<(), HW::Error> {
        let [s_hi, s_lo] = start.to_be_bytes();
        let [e_hi, e_lo] = end.to_be_bytes();
        self.hw.spi().write(&[s_hi, s_lo, e_hi, e_lo])?;
        Ok(())
    }

    /// Sends one pixel, big-endian RGB565.
    pub(crate) fn write_color(&mut self, color: Rgb565) -> Result<(), HW::Error> {
        self.hw.spi().write(&color.into_storage().to_be_bytes())?;
        Ok(())
    }

    /// Streams `count` pixels of one colour into the addressed window.
    pub(crate) fn write_color_run(&mut self, color: Rgb565, count: u32) -> Result<(), HW::Error> {
        let [hi, lo] = color.into_storage().to_be_bytes();
        let mut chunk = [0u8; RUN_CHUNK * 2];
        for pair in chunk.chunks_exact_mut(2) {
            pair[0] = hi;
            pair[1] = lo;
        }

        let mut remaining = count as usize;
        while remaining > 0 {
            let n = remaining.min(RUN_CHUNK);
            self.hw.spi().write(&chunk[..n * 2])?;
            remaining -= n;
        }
        Ok(())
    }

    /// Streams a slice of pixels into the addressed window.
    pub(crate) fn write_pixels(&mut self, pixels: &[Rgb565]) -> Result<(), HW::Error> {
        let mut chunk = [0u8; RUN_CHUNK * 2];
        for group in pixels.chunks(RUN_CHUNK) {
            for (pair, color) in chunk.chunks_exact_mut(2).zip(group.iter()) {
                let [hi, lo] = color.into_storage().to_be_bytes();
                pair[0] = hi;
                pair[1] = lo;
            }
            self.hw.spi().write(&chunk[..group.len() * 2])?;
        }
        Ok(())
    }

    /// Reads raw bytes clocked out by the controller.
    pub(crate) fn read_data(&mut self, buf: &mut [u8]) -> Result<(), HW::Error> {
        self.hw.spi().read(buf)?;
        Ok(())
    }

    /// Sends an arbitrary command followed by its data bytes inside one
    /// transaction bracket.
    pub fn send(&mut self, command: Command, data: &[u8]) -> Result<(), HW::Error> {
        self.with_bus(|tft| {
            tft.write_command(command)?;
            if !data.is_empty() {
                tft.write_data(data)?;
            }
            Ok(())
        })
    }
}
