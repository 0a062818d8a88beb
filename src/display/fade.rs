/*
 *  display/fade.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Cross fade between two captured frames
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

use crate::gfx::FrameBuffer;

/// Linear cross fade
///
/// Both frames are captured when the transition starts; every
/// [`Fade::next_frame`] call moves alpha one step closer to 1.
#[derive(Debug)]
pub struct Fade {
    from: FrameBuffer,
    to: FrameBuffer,
    step: u32,
    steps: u32,
}

impl Fade {
    pub fn new(from: FrameBuffer, to: FrameBuffer, steps: u32) -> Self {
        Self { from, to, step: 0, steps: steps.max(1) }
    }

    /// Current alpha, 0.0 shows `from` and 1.0 shows `to`
    pub fn alpha(&self) -> f32 {
        self.step as f32 / self.steps as f32
    }

    pub fn is_done(&self) -> bool {
        self.step >= self.steps
    }

    /// Advance one step and blend into `out`; false once the fade completed
    pub fn next_frame(&mut self, out: &mut FrameBuffer) -> bool {
        if self.is_done() {
            out.copy_from(&self.to);
            return false;
        }
        self.step += 1;
        out.blend_from(&self.from, &self.to, self.alpha());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
    use crate::gfx::Gfx;

    fn solid(color: Rgb888) -> FrameBuffer {
        let mut fb = FrameBuffer::new(2, 2);
        fb.clear_color(color);
        fb
    }

    #[test]
    fn test_alpha_ramp_is_linear() {
        let mut fade = Fade::new(solid(Rgb888::new(0, 0, 0)), solid(Rgb888::new(200, 0, 0)), 4);
        let mut out = FrameBuffer::new(2, 2);
        let mut reds = Vec::new();
        while fade.next_frame(&mut out) {
            reds.push(out.get_pixel(0, 0).map(|c| c.r()).unwrap_or_default());
        }
        assert_eq!(reds, vec![50, 100, 150, 200]);
        assert!(fade.is_done());
    }

    #[test]
    fn test_zero_steps_is_one_step() {
        let mut fade = Fade::new(solid(Rgb888::new(0, 0, 0)), solid(Rgb888::new(10, 10, 10)), 0);
        let mut out = FrameBuffer::new(2, 2);
        assert!(fade.next_frame(&mut out));
        assert!(!fade.next_frame(&mut out));
        assert_eq!(out.get_pixel(1, 1), Some(Rgb888::new(10, 10, 10)));
    }
}
