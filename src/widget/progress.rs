/*
 *  widget/progress.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Progress bar widget for long running system operations
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

/// Horizontal progress bar
///
/// Fills the surface width it is drawn onto, `height` pixels high, from the
/// widget position. Progress is a percentage clamped to 0..=100.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressBar {
    pos: Point,
    height: u32,
    progress: u8,
    fg: Rgb888,
    bg: Rgb888,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressBar {
    pub const WIDGET_TYPE: &'static str = "progress";

    pub fn new() -> Self {
        Self {
            pos: Point::zero(),
            height: 2,
            progress: 0,
            fg: Rgb888::GREEN,
            bg: Rgb888::new(0x20, 0x20, 0x20),
        }
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height.max(1);
        self
    }

    pub fn set_progress(&mut self, percent: u8) {
        self.progress = percent.min(100);
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn set_colors(&mut self, fg: Rgb888, bg: Rgb888) {
        self.fg = fg;
        self.bg = bg;
    }
}

impl Widget for ProgressBar {
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
        let width = (gfx.width() as i32 - self.pos.x).max(0) as u32;
        let filled = width * self.progress as u32 / 100;
        gfx.fill_rect(self.pos.x, self.pos.y, width, self.height, self.bg);
        gfx.fill_rect(self.pos.x, self.pos.y, filled, self.height, self.fg);
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
    fn test_progress_is_clamped() {
        let mut bar = ProgressBar::new();
        bar.set_progress(250);
        assert_eq!(bar.progress(), 100);
    }

    #[test]
    fn test_half_filled() {
        let mut fb = FrameBuffer::new(10, 4);
        let mut bar = ProgressBar::new().with_height(1);
        bar.move_to(0, 3);
        bar.set_progress(50);
        bar.update(&mut fb);
        assert_eq!(fb.get_pixel(4, 3), Some(Rgb888::GREEN));
        assert_eq!(fb.get_pixel(5, 3), Some(Rgb888::new(0x20, 0x20, 0x20)));
        assert_eq!(fb.get_pixel(0, 2), Some(Rgb888::BLACK));
    }
}
