/*
 *  widget/lamp.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Lamp widget - a small on/off indicator
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

use std::any::Any;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

use super::Widget;
use crate::gfx::Gfx;

/// Small rectangular indicator drawn in one of two colors
#[derive(Debug, Clone, PartialEq)]
pub struct LampWidget {
    pos: Point,
    size: Size,
    on: bool,
    on_color: Rgb888,
    off_color: Rgb888,
}

impl Default for LampWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl LampWidget {
    pub const WIDGET_TYPE: &'static str = "lamp";
    pub const DEFAULT_WIDTH: u32 = 4;

    pub fn new() -> Self {
        Self {
            pos: Point::zero(),
            size: Size::new(Self::DEFAULT_WIDTH, 1),
            on: false,
            on_color: Rgb888::RED,
            off_color: Rgb888::BLACK,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Size::new(width, height);
        self
    }

    pub fn set_on_state(&mut self, on: bool) {
        self.on = on;
    }

    pub fn on_state(&self) -> bool {
        self.on
    }

    pub fn set_colors(&mut self, on: Rgb888, off: Rgb888) {
        self.on_color = on;
        self.off_color = off;
    }
}

impl Widget for LampWidget {
    fn kind(&self) -> &'static str {
        Self::WIDGET_TYPE
    }

    fn position(&self) -> Point {
        self.pos
    }

    fn move_to(&mut self, x: i32, y: i32) {
        self.pos = Point::new(x, y);
    }

    fn update(&mut self, gfx: &mut dyn Gfx) {
        let color = if self.on { self.on_color } else { self.off_color };
        gfx.fill_rect(self.pos.x, self.pos.y, self.size.width, self.size.height, color);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::FrameBuffer;

    #[test]
    fn test_lamp_colors_follow_state() {
        let mut fb = FrameBuffer::new(4, 2);
        let mut lamp = LampWidget::new().with_size(1, 1);
        lamp.move_to(2, 1);
        lamp.set_colors(Rgb888::BLUE, Rgb888::WHITE);
        lamp.update(&mut fb);
        assert_eq!(fb.get_pixel(2, 1), Some(Rgb888::WHITE));
        lamp.set_on_state(true);
        lamp.update(&mut fb);
        assert_eq!(fb.get_pixel(2, 1), Some(Rgb888::BLUE));
    }
}
