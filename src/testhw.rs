//! Test doubles: an in-memory panel model behind mock SPI/pin peripherals.
//!
//! The model interprets the wire protocol the way a MIPI-DCS controller
//! does: it latches column/row windows, applies memory writes to a host
//! framebuffer with an auto-advancing cursor, and serves memory reads as a
//! dummy byte followed by three bytes of 18-bit colour per pixel. Tests can
//! then assert on the resulting pixels as well as on protocol-level
//! counters (address commands sent, chip-select releases, delays).

use core::convert::Infallible;
use std::{cell::RefCell, collections::VecDeque, rc::Rc, vec::Vec};

use embedded_graphics::{
    pixelcolor::{raw::RawU16, Rgb565},
    prelude::{IntoStorage, RgbColor},
};
use embedded_hal::{
    delay::DelayNs,
    digital::{self, OutputPin},
    spi::{self, SpiBus},
};

use crate::{display::Tft, fonts::FontSet, Config, TftHw};

const CASET: u8 = 0x2A;
const PASET: u8 = 0x2B;
const RAMWR: u8 = 0x2C;
const RAMRD: u8 = 0x2E;

pub(crate) struct Model {
    width: i32,
    height: i32,
    framebuffer: Vec<Rgb565>,

    dc_data: bool,
    last_command: u8,
    args: Vec<u8>,
    pending_high_byte: Option<u8>,

    // Latched window and write cursor.
    x0: i32,
    x1: i32,
    y0: i32,
    y1: i32,
    cx: i32,
    cy: i32,

    read_queue: VecDeque<u8>,

    commands: Vec<u8>,
    caset_count: u32,
    paset_count: u32,
    pixels_written: usize,
    cs_releases: u32,
    delays: Vec<u32>,
}

impl Model {
    fn new(width: i32, height: i32) -> Self {
        Model {
            width,
            height,
            framebuffer: std::vec![Rgb565::BLACK; (width * height) as usize],
            dc_data: true,
            last_command: 0,
            args: Vec::new(),
            pending_high_byte: None,
            x0: 0,
            x1: width - 1,
            y0: 0,
            y1: height - 1,
            cx: 0,
            cy: 0,
            read_queue: VecDeque::new(),
            commands: Vec::new(),
            caset_count: 0,
            paset_count: 0,
            pixels_written: 0,
            cs_releases: 0,
            delays: Vec::new(),
        }
    }

    fn command(&mut self, byte: u8) {
        self.last_command = byte;
        self.commands.push(byte);
        self.args.clear();
        self.pending_high_byte = None;
        match byte {
            CASET => self.caset_count += 1,
            PASET => self.paset_count += 1,
            RAMWR => {
                self.cx = self.x0;
                self.cy = self.y0;
            }
            RAMRD => self.queue_read_back(),
            _ => {}
        }
    }

    fn data(&mut self, byte: u8) {
        match self.last_command {
            CASET | PASET => {
                self.args.push(byte);
                if self.args.len() == 4 {
                    let start = i32::from(u16::from_be_bytes([self.args[0], self.args[1]]));
                    let end = i32::from(u16::from_be_bytes([self.args[2], self.args[3]]));
                    if self.last_command == CASET {
                        self.x0 = start;
                        self.x1 = end;
                    } else {
                        self.y0 = start;
                        self.y1 = end;
                    }
                    self.args.clear();
                }
            }
            RAMWR => match self.pending_high_byte.take() {
                None => self.pending_high_byte = Some(byte),
                Some(high) => {
                    let raw = u16::from_be_bytes([high, byte]);
                    self.store_pixel(Rgb565::from(RawU16::new(raw)));
                }
            },
            _ => {}
        }
    }

    fn store_pixel(&mut self, color: Rgb565) {
        self.pixels_written += 1;
        let (x, y) = (self.cx, self.cy);
        if (0..self.width).contains(&x) && (0..self.height).contains(&y) {
            self.framebuffer[(y * self.width + x) as usize] = color;
        }

        self.cx += 1;
        if self.cx > self.x1 {
            self.cx = self.x0;
            self.cy += 1;
            if self.cy > self.y1 {
                self.cy = self.y0;
            }
        }
    }

    /// Serves a memory-read: one dummy byte, then 18-bit colour (three
    /// bytes) for every pixel of the latched window in row-major order.
    fn queue_read_back(&mut self) {
        self.read_queue.clear();
        self.read_queue.push_back(0x00);
        for y in self.y0..=self.y1 {
            for x in self.x0..=self.x1 {
                let raw = if (0..self.width).contains(&x) && (0..self.height).contains(&y) {
                    self.framebuffer[(y * self.width + x) as usize].into_storage()
                } else {
                    0
                };
                self.read_queue.push_back(((raw >> 11) as u8) << 3);
                self.read_queue.push_back(((raw >> 5) as u8 & 0x3F) << 2);
                self.read_queue.push_back((raw as u8 & 0x1F) << 3);
            }
        }
    }
}

type Shared = Rc<RefCell<Model>>;

pub(crate) struct MockSpi(Shared);

impl spi::ErrorType for MockSpi {
    type Error = Infallible;
}

impl SpiBus for MockSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        let mut model = self.0.borrow_mut();
        for word in words.iter_mut() {
            *word = model.read_queue.pop_front().unwrap_or(0);
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
        let mut model = self.0.borrow_mut();
        for &word in words {
            if model.dc_data {
                model.data(word);
            } else {
                model.command(word);
            }
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Infallible> {
        self.write(write)?;
        self.read(read)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        let tx = words.to_vec();
        self.write(&tx)?;
        self.read(words)
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

enum Role {
    Dc,
    Cs,
    Reset,
}

pub(crate) struct MockPin {
    model: Shared,
    role: Role,
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        if let Role::Dc = self.role {
            self.model.borrow_mut().dc_data = false;
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut model = self.model.borrow_mut();
        match self.role {
            Role::Dc => model.dc_data = true,
            Role::Cs => model.cs_releases += 1,
            Role::Reset => {}
        }
        Ok(())
    }
}

pub(crate) struct MockDelay(Shared);

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().delays.push(ms);
    }
}

pub(crate) struct MockHw {
    spi: MockSpi,
    dc: MockPin,
    cs: MockPin,
    reset: MockPin,
    delay: MockDelay,
}

impl TftHw for MockHw {
    type Spi = MockSpi;
    type Dc = MockPin;
    type Cs = MockPin;
    type Reset = MockPin;
    type Delay = MockDelay;
    type Error = Infallible;

    fn spi(&mut self) -> &mut Self::Spi {
        &mut self.spi
    }

    fn dc(&mut self) -> &mut Self::Dc {
        &mut self.dc
    }

    fn cs(&mut self) -> &mut Self::Cs {
        &mut self.cs
    }

    fn reset(&mut self) -> &mut Self::Reset {
        &mut self.reset
    }

    fn delay(&mut self) -> &mut Self::Delay {
        &mut self.delay
    }
}

static EMPTY_INIT: [u8; 0] = [];

/// A driver wired to the in-memory panel model, plus accessors for the
/// model's observable state.
pub(crate) struct Harness {
    pub tft: Tft<'static, MockHw>,
    model: Shared,
}

impl Harness {
    pub fn new(width: u16, height: u16) -> Self {
        Self::with_init_table(width, height, &EMPTY_INIT)
    }

    pub fn with_init_table(width: u16, height: u16, init_sequence: &'static [u8]) -> Self {
        let model = Rc::new(RefCell::new(Model::new(width as i32, height as i32)));
        let hw = MockHw {
            spi: MockSpi(model.clone()),
            dc: MockPin {
                model: model.clone(),
                role: Role::Dc,
            },
            cs: MockPin {
                model: model.clone(),
                role: Role::Cs,
            },
            reset: MockPin {
                model: model.clone(),
                role: Role::Reset,
            },
            delay: MockDelay(model.clone()),
        };
        let config = Config {
            width,
            height,
            madctl: [0x00, 0x60, 0xC0, 0xA0],
            init_sequence,
        };
        Harness {
            tft: Tft::new(hw, config, FontSet::new()),
            model,
        }
    }

    pub fn width(&self) -> i32 {
        self.model.borrow().width
    }

    pub fn height(&self) -> i32 {
        self.model.borrow().height
    }

    /// The framebuffer pixel at panel coordinates, `None` out of range.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb565> {
        let model = self.model.borrow();
        if (0..model.width).contains(&x) && (0..model.height).contains(&y) {
            Some(model.framebuffer[(y * model.width + x) as usize])
        } else {
            None
        }
    }

    /// Total pixels pushed through memory writes.
    pub fn writes(&self) -> usize {
        self.model.borrow().pixels_written
    }

    /// (column, row) address command counts.
    pub fn addr_commands(&self) -> (u32, u32) {
        let model = self.model.borrow();
        (model.caset_count, model.paset_count)
    }

    /// How many times chip-select was released.
    pub fn cs_releases(&self) -> u32 {
        self.model.borrow().cs_releases
    }

    /// Whether the given command byte was ever received.
    pub fn saw_command(&self, command: u8) -> bool {
        self.model.borrow().commands.contains(&command)
    }

    /// Delays requested through the hardware timer, in milliseconds.
    pub fn delays_ms(&self) -> Vec<u32> {
        self.model.borrow().delays.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_wraps_cursor_inside_window() {
        let mut h = Harness::new(8, 8);
        h.tft.set_window(1, 1, 2, 2).unwrap();
        h.tft
            .push_colors(&[Rgb565::RED, Rgb565::GREEN, Rgb565::BLUE, Rgb565::WHITE])
            .unwrap();

        assert_eq!(h.pixel(1, 1), Some(Rgb565::RED));
        assert_eq!(h.pixel(2, 1), Some(Rgb565::GREEN));
        assert_eq!(h.pixel(1, 2), Some(Rgb565::BLUE));
        assert_eq!(h.pixel(2, 2), Some(Rgb565::WHITE));
    }

    #[test]
    fn test_push_colors_continues_across_calls() {
        let mut h = Harness::new(8, 8);
        h.tft.set_window(0, 0, 3, 0).unwrap();
        h.tft.push_colors(&[Rgb565::RED, Rgb565::GREEN]).unwrap();
        h.tft.push_colors(&[Rgb565::BLUE, Rgb565::WHITE]).unwrap();

        assert_eq!(h.pixel(2, 0), Some(Rgb565::BLUE));
        assert_eq!(h.pixel(3, 0), Some(Rgb565::WHITE));
    }

    #[test]
    fn test_read_back_truncates_to_565() {
        let mut h = Harness::new(4, 4);
        h.tft.fill_rect(0, 0, 1, 1, Rgb565::new(0x1F, 0x2A, 0x07)).unwrap();
        assert_eq!(
            h.tft.read_pixel(0, 0).unwrap(),
            Rgb565::new(0x1F, 0x2A, 0x07)
        );
    }
}
