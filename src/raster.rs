//! Shape rasterization.
//!
//! Every shape is decomposed into horizontal/vertical pixel runs so that the
//! bulk of the data goes out as single-window colour streams rather than
//! per-pixel addressing. Lines coalesce Bresenham steps into runs, circles
//! and ellipses emit midpoint-algorithm spans, triangles are filled as
//! scanlines between interpolated edges.

use bitflags::bitflags;
use embedded_graphics::pixelcolor::Rgb565;

use crate::{display::Tft, TftHw};

bitflags! {
    /// Which quarter-arcs of a circle to draw. Used to compose rounded
    /// rectangle outlines.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Corners: u8 {
        const TOP_LEFT = 0x01;
        const TOP_RIGHT = 0x02;
        const BOTTOM_RIGHT = 0x04;
        const BOTTOM_LEFT = 0x08;
    }
}

bitflags! {
    /// Which half of a filled circle to draw, used for rounded rectangle
    /// end caps.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Caps: u8 {
        const BOTTOM = 0x01;
        const TOP = 0x02;
    }
}

impl<HW: TftHw> Tft<'_, HW> {
    /// Draws a line between two arbitrary points.
    ///
    /// Consecutive Bresenham steps along the major axis are coalesced and
    /// sent as one horizontal or vertical run, so shallow and steep lines
    /// cost far fewer transactions than their pixel count.
    pub fn draw_line(
        &mut self,
        mut x0: i32,
        mut y0: i32,
        mut x1: i32,
        mut y1: i32,
        color: Rgb565,
    ) -> Result<(), HW::Error> {
        let steep = (y1 - y0).abs() > (x1 - x0).abs();
        if steep {
            core::mem::swap(&mut x0, &mut y0);
            core::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            core::mem::swap(&mut x0, &mut x1);
            core::mem::swap(&mut y0, &mut y1);
        }

        let dx = x1 - x0;
        let dy = (y1 - y0).abs();
        let mut err = dx >> 1;
        let ystep = if y0 < y1 { 1 } else { -1 };
        let mut run_start = x0;
        let mut run_len = 0;

        if steep {
            while x0 <= x1 {
                run_len += 1;
                err -= dy;
                if err < 0 {
                    err += dx;
                    if run_len == 1 {
                        self.draw_pixel(y0, run_start, color)?;
                    } else {
                        self.draw_fast_vline(y0, run_start, run_len, color)?;
                    }
                    run_len = 0;
                    y0 += ystep;
                    run_start = x0 + 1;
                }
                x0 += 1;
            }
            if run_len > 0 {
                self.draw_fast_vline(y0, run_start, run_len, color)?;
            }
        } else {
            while x0 <= x1 {
                run_len += 1;
                err -= dy;
                if err < 0 {
                    err += dx;
                    if run_len == 1 {
                        self.draw_pixel(run_start, y0, color)?;
                    } else {
                        self.draw_fast_hline(run_start, y0, run_len, color)?;
                    }
                    run_len = 0;
                    y0 += ystep;
                    run_start = x0 + 1;
                }
                x0 += 1;
            }
            if run_len > 0 {
                self.draw_fast_hline(run_start, y0, run_len, color)?;
            }
        }
        Ok(())
    }

    /// Draws a circle outline.
    pub fn draw_circle(&mut self, x0: i32, y0: i32, mut r: i32, color: Rgb565) -> Result<(), HW::Error> {
        if r < 0 {
            return Ok(());
        }
        let mut x = 0;
        let mut dx = 1;
        let mut dy = r + r;
        let mut p = -(r >> 1);

        self.draw_pixel(x0 + r, y0, color)?;
        self.draw_pixel(x0 - r, y0, color)?;
        self.draw_pixel(x0, y0 - r, color)?;
        self.draw_pixel(x0, y0 + r, color)?;

        while x < r {
            if p >= 0 {
                dy -= 2;
                p -= dy;
                r -= 1;
            }
            dx += 2;
            p += dx;
            x += 1;

            self.draw_pixel(x0 + x, y0 + r, color)?;
            self.draw_pixel(x0 - x, y0 + r, color)?;
            self.draw_pixel(x0 - x, y0 - r, color)?;
            self.draw_pixel(x0 + x, y0 - r, color)?;
            if r != x {
                self.draw_pixel(x0 + r, y0 + x, color)?;
                self.draw_pixel(x0 - r, y0 + x, color)?;
                self.draw_pixel(x0 - r, y0 - x, color)?;
                self.draw_pixel(x0 + r, y0 - x, color)?;
            }
        }
        Ok(())
    }

    /// Draws the selected quarter-arcs of a circle outline.
    pub fn draw_circle_helper(
        &mut self,
        x0: i32,
        y0: i32,
        mut r: i32,
        corners: Corners,
        color: Rgb565,
    ) -> Result<(), HW::Error> {
        let mut f = 1 - r;
        let mut ddf_x = 1;
        let mut ddf_y = -2 * r;
        let mut x = 0;

        while x < r {
            if f >= 0 {
                r -= 1;
                ddf_y += 2;
                f += ddf_y;
            }
            x += 1;
            ddf_x += 2;
            f += ddf_x;

            if corners.contains(Corners::BOTTOM_RIGHT) {
                self.draw_pixel(x0 + x, y0 + r, color)?;
                self.draw_pixel(x0 + r, y0 + x, color)?;
            }
            if corners.contains(Corners::TOP_RIGHT) {
                self.draw_pixel(x0 + x, y0 - r, color)?;
                self.draw_pixel(x0 + r, y0 - x, color)?;
            }
            if corners.contains(Corners::BOTTOM_LEFT) {
                self.draw_pixel(x0 - r, y0 + x, color)?;
                self.draw_pixel(x0 - x, y0 + r, color)?;
            }
            if corners.contains(Corners::TOP_LEFT) {
                self.draw_pixel(x0 - r, y0 - x, color)?;
                self.draw_pixel(x0 - x, y0 - r, color)?;
            }
        }
        Ok(())
    }

    /// Fills a circle as horizontal spans.
    pub fn fill_circle(&mut self, x0: i32, y0: i32, mut r: i32, color: Rgb565) -> Result<(), HW::Error> {
        if r < 0 {
            return Ok(());
        }
        let mut x = 0;
        let mut dx = 1;
        let mut dy = r + r;
        let mut p = -(r >> 1);

        self.draw_fast_hline(x0 - r, y0, dy + 1, color)?;

        while x < r {
            if p >= 0 {
                self.draw_fast_hline(x0 - x, y0 + r, dx, color)?;
                self.draw_fast_hline(x0 - x, y0 - r, dx, color)?;
                dy -= 2;
                p -= dy;
                r -= 1;
            }
            dx += 2;
            p += dx;
            x += 1;

            self.draw_fast_hline(x0 - r, y0 + x, dy + 1, color)?;
            self.draw_fast_hline(x0 - r, y0 - x, dy + 1, color)?;
        }
        Ok(())
    }

    /// Fills one or both halves of a circle, widened by `delta` columns.
    /// Used for the end caps of filled rounded rectangles.
    pub fn fill_circle_helper(
        &mut self,
        x0: i32,
        y0: i32,
        mut r: i32,
        caps: Caps,
        delta: i32,
        color: Rgb565,
    ) -> Result<(), HW::Error> {
        let mut f = 1 - r;
        let mut ddf_x = 1;
        let mut ddf_y = -r - r;
        let mut y = 0;
        let delta = delta + 1;

        while y < r {
            if f >= 0 {
                if caps.contains(Caps::BOTTOM) {
                    self.draw_fast_hline(x0 - y, y0 + r, y + y + delta, color)?;
                }
                if caps.contains(Caps::TOP) {
                    self.draw_fast_hline(x0 - y, y0 - r, y + y + delta, color)?;
                }
                r -= 1;
                ddf_y += 2;
                f += ddf_y;
            }
            y += 1;
            ddf_x += 2;
            f += ddf_x;

            if caps.contains(Caps::BOTTOM) {
                self.draw_fast_hline(x0 - r, y0 + y, r + r + delta, color)?;
            }
            if caps.contains(Caps::TOP) {
                self.draw_fast_hline(x0 - r, y0 - y, r + r + delta, color)?;
            }
        }
        Ok(())
    }

    /// Draws an ellipse outline. Degenerate radii (< 2) draw nothing.
    pub fn draw_ellipse(
        &mut self,
        x0: i32,
        y0: i32,
        rx: i32,
        ry: i32,
        color: Rgb565,
    ) -> Result<(), HW::Error> {
        if rx < 2 || ry < 2 {
            return Ok(());
        }
        let rx2 = rx * rx;
        let ry2 = ry * ry;
        let fx2 = 4 * rx2;
        let fy2 = 4 * ry2;

        // Flat arcs: step x while the tangent slope is below 1.
        let mut x = 0;
        let mut y = ry;
        let mut s = 2 * ry2 + rx2 * (1 - 2 * ry);
        while ry2 * x <= rx2 * y {
            self.draw_pixel(x0 + x, y0 + y, color)?;
            self.draw_pixel(x0 - x, y0 + y, color)?;
            self.draw_pixel(x0 - x, y0 - y, color)?;
            self.draw_pixel(x0 + x, y0 - y, color)?;
            if s >= 0 {
                s += fx2 * (1 - y);
                y -= 1;
            }
            s += ry2 * (4 * x + 6);
            x += 1;
        }

        // Steep arcs: step y for the rest.
        let mut x = rx;
        let mut y = 0;
        let mut s = 2 * rx2 + ry2 * (1 - 2 * rx);
        while rx2 * y <= ry2 * x {
            self.draw_pixel(x0 + x, y0 + y, color)?;
            self.draw_pixel(x0 - x, y0 + y, color)?;
            self.draw_pixel(x0 - x, y0 - y, color)?;
            self.draw_pixel(x0 + x, y0 - y, color)?;
            if s >= 0 {
                s += fy2 * (1 - x);
                x -= 1;
            }
            s += rx2 * (4 * y + 6);
            y += 1;
        }
        Ok(())
    }

    /// Fills an ellipse as horizontal spans. Degenerate radii (< 2) draw
    /// nothing.
    pub fn fill_ellipse(
        &mut self,
        x0: i32,
        y0: i32,
        rx: i32,
        ry: i32,
        color: Rgb565,
    ) -> Result<(), HW::Error> {
        if rx < 2 || ry < 2 {
            return Ok(());
        }
        let rx2 = rx * rx;
        let ry2 = ry * ry;
        let fx2 = 4 * rx2;
        let fy2 = 4 * ry2;

        let mut x = 0;
        let mut y = ry;
        let mut s = 2 * ry2 + rx2 * (1 - 2 * ry);
        while ry2 * x <= rx2 * y {
            self.draw_fast_hline(x0 - x, y0 - y, x + x + 1, color)?;
            self.draw_fast_hline(x0 - x, y0 + y, x + x + 1, color)?;
            if s >= 0 {
                s += fx2 * (1 - y);
                y -= 1;
            }
            s += ry2 * (4 * x + 6);
            x += 1;
        }

        let mut x = rx;
        let mut y = 0;
        let mut s = 2 * rx2 + ry2 * (1 - 2 * rx);
        while rx2 * y <= ry2 * x {
            self.draw_fast_hline(x0 - x, y0 - y, x + x + 1, color)?;
            self.draw_fast_hline(x0 - x, y0 + y, x + x + 1, color)?;
            if s >= 0 {
                s += fy2 * (1 - x);
                x -= 1;
            }
            s += rx2 * (4 * y + 6);
            y += 1;
        }
        Ok(())
    }

    /// Draws a triangle outline.
    pub fn draw_triangle(
        &mut self,
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: Rgb565,
    ) -> Result<(), HW::Error> {
        self.draw_line(x0, y0, x1, y1, color)?;
        self.draw_line(x1, y1, x2, y2, color)?;
        self.draw_line(x2, y2, x0, y0, color)
    }

    /// Fills a triangle as scanlines between its interpolated edges.
    pub fn fill_triangle(
        &mut self,
        mut x0: i32,
        mut y0: i32,
        mut x1: i32,
        mut y1: i32,
        mut x2: i32,
        mut y2: i32,
        color: Rgb565,
    ) -> Result<(), HW::Error> {
        // Sort by y so y0 <= y1 <= y2.
        if y0 > y1 {
            core::mem::swap(&mut y0, &mut y1);
            core::mem::swap(&mut x0, &mut x1);
        }
        if y1 > y2 {
            core::mem::swap(&mut y2, &mut y1);
            core::mem::swap(&mut x2, &mut x1);
        }
        if y0 > y1 {
            core::mem::swap(&mut y0, &mut y1);
            core::mem::swap(&mut x0, &mut x1);
        }

        if y0 == y2 {
            // Degenerate: all vertices on one scanline.
            let mut a = x0;
            let mut b = x0;
            if x1 < a {
                a = x1;
            } else if x1 > b {
                b = x1;
            }
            if x2 < a {
                a = x2;
            } else if x2 > b {
                b = x2;
            }
            return self.draw_fast_hline(a, y0, b - a + 1, color);
        }

        let dx01 = x1 - x0;
        let dy01 = y1 - y0;
        let dx02 = x2 - x0;
        let dy02 = y2 - y0;
        let dx12 = x2 - x1;
        let dy12 = y2 - y1;
        let mut sa = 0;
        let mut sb = 0;

        // The upper part spans scanlines y0..=y1, but when the middle vertex
        // does not share a row with the bottom one its row belongs to the
        // lower part (avoids a zero-height lower edge).
        let last = if y1 == y2 { y1 } else { y1 - 1 };

        let mut y = y0;
        while y <= last {
            let mut a = x0 + sa / dy01;
            let mut b = x0 + sb / dy02;
            sa += dx01;
            sb += dx02;
            if a > b {
                core::mem::swap(&mut a, &mut b);
            }
            self.draw_fast_hline(a, y, b - a + 1, color)?;
            y += 1;
        }

        sa = dx12 * (y - y1);
        sb = dx02 * (y - y0);
        while y <= y2 {
            let mut a = x1 + sa / dy12;
            let mut b = x0 + sb / dy02;
            sa += dx12;
            sb += dx02;
            if a > b {
                core::mem::swap(&mut a, &mut b);
            }
            self.draw_fast_hline(a, y, b - a + 1, color)?;
            y += 1;
        }
        Ok(())
    }

    /// Draws a rounded rectangle outline.
    pub fn draw_round_rect(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        r: i32,
        color: Rgb565,
    ) -> Result<(), HW::Error> {
        self.draw_fast_hline(x + r, y, w - r - r, color)?;
        self.draw_fast_hline(x + r, y + h - 1, w - r - r, color)?;
        self.draw_fast_vline(x, y + r, h - r - r, color)?;
        self.draw_fast_vline(x + w - 1, y + r, h - r - r, color)?;

        self.draw_circle_helper(x + r, y + r, r, Corners::TOP_LEFT, color)?;
        self.draw_circle_helper(x + w - r - 1, y + r, r, Corners::TOP_RIGHT, color)?;
        self.draw_circle_helper(x + w - r - 1, y + h - r - 1, r, Corners::BOTTOM_RIGHT, color)?;
        self.draw_circle_helper(x + r, y + h - r - 1, r, Corners::BOTTOM_LEFT, color)
    }

    /// Fills a rounded rectangle: one central rectangle plus two widened
    /// half-circle caps.
    pub fn fill_round_rect(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        r: i32,
        color: Rgb565,
    ) -> Result<(), HW::Error> {
        self.fill_rect(x, y + r, w, h - r - r, color)?;
        self.fill_circle_helper(x + r, y + h - r - 1, r, Caps::BOTTOM, w - r - r - 1, color)?;
        self.fill_circle_helper(x + r, y + r, r, Caps::TOP, w - r - r - 1, color)
    }
}
