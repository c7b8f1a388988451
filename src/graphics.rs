//! `embedded-graphics` integration.
//!
//! The driver is itself a [`DrawTarget`], so third-party widgets and image
//! crates render through the same windowed streaming protocol as the native
//! drawing methods. Contiguous fills that stay on screen go out as a single
//! addressed window; everything else degrades to clipped per-pixel writes.

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{Dimensions, Point, Size},
    pixelcolor::Rgb565,
    prelude::{PointsIter, RgbColor},
    primitives::Rectangle,
    Pixel,
};

use crate::{display::Tft, TftHw};

/// Pixels buffered per SPI write when streaming an iterator.
const STREAM_CHUNK: usize = 32;

impl<HW: TftHw> Dimensions for Tft<'_, HW> {
    fn bounding_box(&self) -> Rectangle {
        Rectangle::new(
            Point::zero(),
            Size::new(self.width as u32, self.height as u32),
        )
    }
}

impl<HW: TftHw> DrawTarget for Tft<'_, HW> {
    type Color = Rgb565;
    type Error = HW::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.draw_pixel(point.x, point.y, color)?;
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.fill_rect(
            area.top_left.x,
            area.top_left.y,
            area.size.width as i32,
            area.size.height as i32,
            color,
        )
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        if area.size.width == 0 || area.size.height == 0 {
            return Ok(());
        }

        // Only a fully on-screen area can be streamed; a clipped window
        // would fold pixels into the wrong rows.
        if area.intersection(&self.bounding_box()) != *area {
            return self.draw_iter(
                area.points()
                    .zip(colors)
                    .map(|(point, color)| Pixel(point, color)),
            );
        }

        let x1 = area.top_left.x + area.size.width as i32 - 1;
        let y1 = area.top_left.y + area.size.height as i32 - 1;
        self.with_bus(move |tft| {
            tft.set_addr_window(
                area.top_left.x as u16,
                area.top_left.y as u16,
                x1 as u16,
                y1 as u16,
            )?;

            let mut buf = [Rgb565::BLACK; STREAM_CHUNK];
            let mut filled = 0;
            for color in colors {
                buf[filled] = color;
                filled += 1;
                if filled == buf.len() {
                    tft.write_pixels(&buf)?;
                    filled = 0;
                }
            }
            if filled > 0 {
                tft.write_pixels(&buf[..filled])?;
            }
            Ok(())
        })
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill_screen(color)
    }
}
