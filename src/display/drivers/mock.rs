/*
 *  display/drivers/mock.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock matrix driver for tests and headless runs
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

use std::sync::Arc;
use embedded_graphics::pixelcolor::Rgb888;
use parking_lot::Mutex;

use crate::display::error::DisplayError;
use crate::display::traits::{check_frame, LedMatrix, MatrixCapabilities};
use crate::gfx::{FrameBuffer, Gfx};

/// Mock matrix driver
///
/// Records every operation and keeps the last shown frame. The state is
/// shared, so a test keeps a [`MockMatrix::state`] handle after the driver
/// has been moved into the display manager.
pub struct MockMatrix {
    capabilities: MatrixCapabilities,
    state: Arc<Mutex<MockMatrixState>>,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug)]
pub struct MockMatrixState {
    pub init_count: usize,
    pub show_count: usize,
    pub clear_count: usize,
    pub last_brightness: Option<u8>,
    pub is_initialized: bool,
    /// Last frame handed to `show`
    pub frame: FrameBuffer,
    /// Simulate failures (for error testing)
    pub simulate_init_failure: bool,
    pub simulate_show_failure: bool,
}

impl MockMatrix {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            capabilities: MatrixCapabilities { width, height, max_fps: 60, supports_brightness: true },
            state: Arc::new(Mutex::new(MockMatrixState {
                init_count: 0,
                show_count: 0,
                clear_count: 0,
                last_brightness: None,
                is_initialized: false,
                frame: FrameBuffer::new(width, height),
                simulate_init_failure: false,
                simulate_show_failure: false,
            })),
        }
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockMatrixState>> {
        Arc::clone(&self.state)
    }
}

impl MockMatrixState {
    /// Pixel of the last shown frame
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb888> {
        self.frame.get_pixel(x, y)
    }

    /// Count pixels that are not black
    pub fn count_lit_pixels(&self) -> usize {
        self.frame.as_slice().iter().filter(|&&p| p != Rgb888::new(0, 0, 0)).count()
    }
}

impl LedMatrix for MockMatrix {
    fn capabilities(&self) -> &MatrixCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let mut state = self.state.lock();
        if state.simulate_init_failure {
            return Err(DisplayError::InitializationFailed("simulated init failure".to_string()));
        }
        state.init_count += 1;
        state.is_initialized = true;
        Ok(())
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        self.state.lock().last_brightness = Some(value);
        Ok(())
    }

    fn show(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        check_frame(&self.capabilities, frame)?;
        let mut state = self.state.lock();
        if state.simulate_show_failure {
            return Err(DisplayError::Other("simulated show failure".to_string()));
        }
        state.frame.copy_from(frame);
        state.show_count += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let mut state = self.state.lock();
        state.clear_count += 1;
        state.frame.clear_color(Rgb888::new(0, 0, 0));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_rejects_wrong_size() {
        let mut matrix = MockMatrix::new(8, 8);
        let frame = FrameBuffer::new(4, 4);
        assert!(matches!(
            matrix.show(&frame),
            Err(DisplayError::BufferSizeMismatch { expected: 64, actual: 16 })
        ));
        assert_eq!(matrix.state().lock().show_count, 0);
    }

    #[test]
    fn test_simulated_init_failure() {
        let mut matrix = MockMatrix::new(8, 8);
        matrix.state().lock().simulate_init_failure = true;
        assert!(matrix.init().is_err());
        assert!(!matrix.state().lock().is_initialized);
    }
}
