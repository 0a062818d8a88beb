/*
 *  display/traits.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  LED matrix driver abstraction
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

use crate::display::error::DisplayError;
use crate::gfx::FrameBuffer;

/// Matrix capabilities and metadata
#[derive(Debug, Clone)]
pub struct MatrixCapabilities {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Maximum recommended frame rate
    pub max_fps: u32,
    pub supports_brightness: bool,
}

/// Minimal hardware abstraction, every matrix driver implements this
///
/// The scheduler composes each frame into a [`FrameBuffer`] of the matrix
/// size and hands it over with [`LedMatrix::show`].
pub trait LedMatrix: Send {
    fn capabilities(&self) -> &MatrixCapabilities;

    /// Returns the matrix dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    fn init(&mut self) -> Result<(), DisplayError>;

    /// Global brightness 0-255
    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError>;

    /// Push a complete frame to the LEDs
    fn show(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError>;

    /// Switch every LED off
    fn clear(&mut self) -> Result<(), DisplayError>;
}

/// Reject frames that do not match the matrix size
pub(crate) fn check_frame(caps: &MatrixCapabilities, frame: &FrameBuffer) -> Result<(), DisplayError> {
    let expected = (caps.width * caps.height) as usize;
    let actual = frame.as_slice().len();
    if expected != actual {
        return Err(DisplayError::BufferSizeMismatch { expected, actual });
    }
    Ok(())
}
