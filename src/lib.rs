//! Framebuffer-less driver for SPI-attached TFT displays (ST7735, ILI9341 and
//! compatible MIPI-DCS controllers).
//!
//! Every drawing operation streams pixels straight into the display's own
//! memory, so the crate runs on microcontrollers that cannot afford a full
//! frame buffer. Shapes are decomposed into horizontal/vertical pixel runs and
//! the column/row address commands for repeated single-pixel writes are elided
//! whenever the previously latched address still matches.
//!
//! ## Core pieces
//!
//! - [`TftHw`]: abstracts the hardware needed to drive the panel: an exclusive
//!   SPI bus, the Data/Command, Chip-Select and Reset pins, and a delay timer.
//!   You implement this trait once for your chosen peripherals, which keeps
//!   the driver generic over a single type parameter.
//!
//! - [`Tft`]: the driver itself. It owns the addressed-window cache, the
//!   rasterizer and the text engine. Construct it with a [`Config`] describing
//!   the panel (dimensions, rotation table, initialisation sequence) and a
//!   [`fonts::FontSet`] describing which fonts are available.
//!
//! Additionally, the crate provides:
//!
//! - `fonts` module: the built-in fixed 6x8 font plus descriptors for
//!   run-length-encoded proportional fonts and outline (advance-metric)
//!   fonts supplied by the application.
//! - Per-controller configuration lives in its own module, such as
//!   [`st7735`] for the ST7735 128x160 panel.
//! - An `embedded_graphics` `DrawTarget` implementation over the driver, so
//!   third-party widgets can render through the same window protocol.
#![no_std]

#[cfg(test)]
extern crate std;

use core::error::Error as CoreError;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType as PinErrorType, OutputPin},
    spi::{ErrorType as SpiErrorType, SpiBus},
};

pub mod fonts;
pub mod st7735;

mod comms;
mod display;
mod glyph;
mod graphics;
mod log;
mod raster;
mod text;

#[cfg(test)]
pub(crate) mod testhw;

pub use comms::Command;
pub use display::Tft;
pub use raster::{Caps, Corners};
pub use text::Datum;

/// Provides access to the hardware needed to control a TFT panel.
///
/// This greatly simplifies the generics needed by [`Tft`] at the cost of
/// implementing this trait. The driver owns the SPI bus exclusively (a
/// [`SpiBus`], not an `SpiDevice`) because the window-addressing protocol
/// interleaves Data/Command transitions with pixel data inside a single
/// chip-select assertion.
///
/// ```rust
/// use core::convert::Infallible;
///
/// use embedded_hal::delay::DelayNs;
/// use embedded_hal::digital::{self, OutputPin};
/// use embedded_hal::spi::{self, SpiBus};
/// use tft_stream::TftHw;
///
/// struct LoopbackSpi;
///
/// impl spi::ErrorType for LoopbackSpi {
///     type Error = Infallible;
/// }
///
/// impl SpiBus for LoopbackSpi {
///     fn read(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
///         words.fill(0);
///         Ok(())
///     }
///     fn write(&mut self, _words: &[u8]) -> Result<(), Infallible> {
///         Ok(())
///     }
///     fn transfer(&mut self, read: &mut [u8], _write: &[u8]) -> Result<(), Infallible> {
///         read.fill(0);
///         Ok(())
///     }
///     fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Infallible> {
///         Ok(())
///     }
///     fn flush(&mut self) -> Result<(), Infallible> {
///         Ok(())
///     }
/// }
///
/// struct NoPin;
///
/// impl digital::ErrorType for NoPin {
///     type Error = Infallible;
/// }
///
/// impl OutputPin for NoPin {
///     fn set_low(&mut self) -> Result<(), Infallible> {
///         Ok(())
///     }
///     fn set_high(&mut self) -> Result<(), Infallible> {
///         Ok(())
///     }
/// }
///
/// struct BusyDelay;
///
/// impl DelayNs for BusyDelay {
///     fn delay_ns(&mut self, _ns: u32) {}
/// }
///
/// struct Hw {
///     spi: LoopbackSpi,
///     dc: NoPin,
///     cs: NoPin,
///     reset: NoPin,
///     delay: BusyDelay,
/// }
///
/// impl TftHw for Hw {
///     type Spi = LoopbackSpi;
///     type Dc = NoPin;
///     type Cs = NoPin;
///     type Reset = NoPin;
///     type Delay = BusyDelay;
///     type Error = Infallible;
///
///     fn spi(&mut self) -> &mut Self::Spi {
///         &mut self.spi
///     }
///     fn dc(&mut self) -> &mut Self::Dc {
///         &mut self.dc
///     }
///     fn cs(&mut self) -> &mut Self::Cs {
///         &mut self.cs
///     }
///     fn reset(&mut self) -> &mut Self::Reset {
///         &mut self.reset
///     }
///     fn delay(&mut self) -> &mut Self::Delay {
///         &mut self.delay
///     }
/// }
/// ```
pub trait TftHw {
    type Spi: SpiBus;
    type Dc: OutputPin;
    type Cs: OutputPin;
    type Reset: OutputPin;
    type Delay: DelayNs;
    type Error: CoreError
        + From<<Self::Spi as SpiErrorType>::Error>
        + From<<Self::Dc as PinErrorType>::Error>
        + From<<Self::Cs as PinErrorType>::Error>
        + From<<Self::Reset as PinErrorType>::Error>;

    fn spi(&mut self) -> &mut Self::Spi;
    fn dc(&mut self) -> &mut Self::Dc;
    fn cs(&mut self) -> &mut Self::Cs;
    fn reset(&mut self) -> &mut Self::Reset;
    fn delay(&mut self) -> &mut Self::Delay;
}

/// Describes one panel variant: its native dimensions, the MADCTL value to
/// send for each of the four rotations, and the controller's power-on command
/// sequence (see [`Tft::init`] for the table format).
///
/// Concrete panels provide ready-made configs, e.g. [`st7735::config`].
#[derive(Debug, Clone, Copy)]
pub struct Config<'a> {
    /// Panel width in pixels at rotation 0.
    pub width: u16,
    /// Panel height in pixels at rotation 0.
    pub height: u16,
    /// Memory-access-control byte per rotation 0..=3.
    pub madctl: [u8; 4],
    /// Power-on initialisation table, walked by [`Tft::init`].
    pub init_sequence: &'a [u8],
}

/// Converts three 8-bit RGB levels to a 16-bit RGB565 colour.
///
/// The conversion is lossy: the top 5/6/5 bits of each channel are kept.
pub fn color565(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}
