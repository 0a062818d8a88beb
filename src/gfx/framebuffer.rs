/*
 *  gfx/framebuffer.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runtime-sized RGB framebuffer, slot frames and fade captures
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use super::color::blend;
use super::Gfx;

/// A runtime-sized framebuffer, usable both as a `Gfx` and a `DrawTarget`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    buf: Vec<Rgb888>,
    w: usize,
    h: usize,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![Rgb888::BLACK; w * h], w, h }
    }

    /// Immutable raw access
    pub fn as_slice(&self) -> &[Rgb888] { &self.buf }

    /// Mutable raw access
    pub fn as_mut_slice(&mut self) -> &mut [Rgb888] { &mut self.buf }

    /// Clear to a color
    pub fn clear_color(&mut self, color: Rgb888) {
        self.buf.fill(color);
    }

    /// Copy another frame of equal size into this one
    pub fn copy_from(&mut self, other: &FrameBuffer) {
        if self.buf.len() == other.buf.len() {
            self.buf.copy_from_slice(&other.buf);
        }
    }

    /// Write `from` blended towards `to` into self, alpha 0..=1
    ///
    /// All three frames must share the same dimensions; mismatched frames
    /// leave self untouched.
    pub fn blend_from(&mut self, from: &FrameBuffer, to: &FrameBuffer, alpha: f32) {
        if from.buf.len() != self.buf.len() || to.buf.len() != self.buf.len() {
            return;
        }
        for ((dst, a), b) in self.buf.iter_mut().zip(from.buf.iter()).zip(to.buf.iter()) {
            *dst = blend(*a, *b, alpha);
        }
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 {
            let (x, y) = (x as usize, y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl Gfx for FrameBuffer {
    fn width(&self) -> u32 { self.w as u32 }
    fn height(&self) -> u32 { self.h as u32 }

    fn draw_pixel(&mut self, x: i32, y: i32, color: Rgb888) {
        if let Some(i) = self.idx(x, y) {
            self.buf[i] = color;
        }
    }

    fn get_pixel(&self, x: i32, y: i32) -> Option<Rgb888> {
        self.idx(x, y).map(|i| self.buf[i])
    }

    fn fill_screen(&mut self, color: Rgb888) {
        self.clear_color(color);
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p.x, p.y) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.clear_color(color);
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        // fast path, clip once and fill row slices
        let clipped = area.intersection(&self.bounding_box());
        let Size { width, height } = clipped.size;
        if width == 0 || height == 0 { return Ok(()); }
        let (x0, y0) = (clipped.top_left.x as usize, clipped.top_left.y as usize);
        for row in y0..y0 + height as usize {
            let base = row * self.w + x0;
            self.buf[base..base + width as usize].fill(color);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_ignored() {
        let mut fb = FrameBuffer::new(4, 2);
        fb.draw_pixel(-1, 0, Rgb888::RED);
        fb.draw_pixel(4, 0, Rgb888::RED);
        fb.draw_pixel(0, 2, Rgb888::RED);
        assert!(fb.as_slice().iter().all(|&c| c == Rgb888::BLACK));
        assert_eq!(fb.get_pixel(4, 0), None);
    }

    #[test]
    fn test_fill_solid_clips() {
        let mut fb = FrameBuffer::new(4, 4);
        fb.fill_solid(&Rectangle::new(Point::new(2, 2), Size::new(10, 10)), Rgb888::GREEN).ok();
        assert_eq!(fb.get_pixel(3, 3), Some(Rgb888::GREEN));
        assert_eq!(fb.get_pixel(1, 1), Some(Rgb888::BLACK));
    }

    #[test]
    fn test_blend_from_halfway() {
        let mut a = FrameBuffer::new(2, 1);
        let mut b = FrameBuffer::new(2, 1);
        a.clear_color(Rgb888::new(0, 0, 0));
        b.clear_color(Rgb888::new(200, 100, 50));
        let mut out = FrameBuffer::new(2, 1);
        out.blend_from(&a, &b, 0.5);
        assert_eq!(out.get_pixel(1, 0), Some(Rgb888::new(100, 50, 25)));
    }
}
