/*
 *  gfx/mod.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Drawing surface abstraction shared by widgets, canvases and the matrix
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

//! Graphics layer
//!
//! Every drawable in the appliance renders onto a [`Gfx`] surface. The trait is
//! kept dyn compatible so widgets can be stored as trait objects and drawn onto
//! whatever is underneath: the physical matrix, an off-screen [`FrameBuffer`]
//! used by the fade, or a [`CanvasGfx`] view clipped to a sub-region.
//!
//! `DrawTarget` is not dyn compatible (generic methods), so embedded-graphics
//! primitives and fonts reach a `dyn Gfx` through the [`GfxTarget`] adapter.

pub mod canvas;
pub mod color;
pub mod error;
pub mod framebuffer;

use core::convert::Infallible;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

pub use canvas::{Canvas, CanvasGfx};
pub use color::{blend, Color};
pub use error::GfxError;
pub use framebuffer::FrameBuffer;

/// Minimal drawing surface - draw-pixel, fill and blit primitives
pub trait Gfx {
    /// Surface width in pixels
    fn width(&self) -> u32;

    /// Surface height in pixels
    fn height(&self) -> u32;

    /// Set a single pixel, out of range coordinates are ignored
    fn draw_pixel(&mut self, x: i32, y: i32, color: Rgb888);

    /// Read back a pixel, None if out of range
    fn get_pixel(&self, x: i32, y: i32) -> Option<Rgb888>;

    /// Fill a rectangle, clipped to the surface
    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgb888) {
        for dy in 0..height as i32 {
            for dx in 0..width as i32 {
                self.draw_pixel(x + dx, y + dy, color);
            }
        }
    }

    /// Fill the whole surface
    fn fill_screen(&mut self, color: Rgb888) {
        let (w, h) = (self.width(), self.height());
        self.fill_rect(0, 0, w, h, color);
    }

    /// Blit a row-major bitmap with its top-left corner at (x, y)
    fn draw_bitmap(&mut self, x: i32, y: i32, bitmap: &[Rgb888], width: u32, height: u32) {
        for (idx, color) in bitmap.iter().take((width * height) as usize).enumerate() {
            let col = (idx as u32 % width) as i32;
            let row = (idx as u32 / width) as i32;
            self.draw_pixel(x + col, y + row, *color);
        }
    }
}

/// embedded-graphics adapter over a `dyn Gfx`
pub struct GfxTarget<'a> {
    gfx: &'a mut dyn Gfx,
}

impl<'a> GfxTarget<'a> {
    pub fn new(gfx: &'a mut dyn Gfx) -> Self {
        Self { gfx }
    }
}

impl OriginDimensions for GfxTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.gfx.width(), self.gfx.height())
    }
}

impl DrawTarget for GfxTarget<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            self.gfx.draw_pixel(p.x, p.y, c);
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.gfx.fill_rect(area.top_left.x, area.top_left.y, area.size.width, area.size.height, color);
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.gfx.fill_screen(color);
        Ok(())
    }
}
