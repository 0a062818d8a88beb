/*
 *  display/drivers/ansi.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Terminal matrix - draws the LEDs with ANSI true color blocks
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

use std::io::{self, Write};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

use crate::display::error::DisplayError;
use crate::display::traits::{check_frame, LedMatrix, MatrixCapabilities};
use crate::gfx::FrameBuffer;

/// Emulated matrix on a true color terminal
///
/// Redraws in place, and only when the frame differs from the last one.
pub struct AnsiMatrix {
    capabilities: MatrixCapabilities,
    brightness: u8,
    last: Option<FrameBuffer>,
}

impl AnsiMatrix {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            capabilities: MatrixCapabilities { width, height, max_fps: 30, supports_brightness: true },
            brightness: 255,
            last: None,
        }
    }

    fn scale(&self, c: u8) -> u32 {
        c as u32 * self.brightness as u32 / 255
    }

    fn render(&self, frame: &FrameBuffer) -> String {
        let w = self.capabilities.width as usize;
        let mut out = String::with_capacity(frame.as_slice().len() * 24);
        // cursor home, keep the matrix at a fixed place
        out.push_str("\x1b[H");
        for row in frame.as_slice().chunks(w) {
            for px in row {
                let px: &Rgb888 = px;
                out.push_str(&format!(
                    "\x1b[38;2;{};{};{}m\u{25cf} ",
                    self.scale(px.r()),
                    self.scale(px.g()),
                    self.scale(px.b())
                ));
            }
            out.push_str("\x1b[0m\r\n");
        }
        out
    }

    fn write(&self, text: &str) -> Result<(), DisplayError> {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(text.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| DisplayError::Other(format!("terminal write failed: {}", e)))
    }
}

impl LedMatrix for AnsiMatrix {
    fn capabilities(&self) -> &MatrixCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        // clear screen, hide cursor
        self.write("\x1b[2J\x1b[?25l")
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        self.brightness = value;
        self.last = None;
        Ok(())
    }

    fn show(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        check_frame(&self.capabilities, frame)?;
        if self.last.as_ref() == Some(frame) {
            return Ok(());
        }
        self.write(&self.render(frame))?;
        match self.last.as_mut() {
            Some(last) => last.copy_from(frame),
            None => self.last = Some(frame.clone()),
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let (w, h) = self.dimensions();
        self.show(&FrameBuffer::new(w, h))
    }
}

impl Drop for AnsiMatrix {
    fn drop(&mut self) {
        // restore the cursor
        let _ = self.write("\x1b[0m\x1b[?25h\r\n");
    }
}
