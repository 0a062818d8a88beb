/*
 *  display/mod.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - matrix drivers and the slot scheduler
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

// Core trait definitions
pub mod traits;
pub mod error;

// Matrix drivers
pub mod drivers;

// Slots, fades and the scheduler
pub mod fade;
pub mod slot;
pub mod manager;

// Re-exports for convenience
pub use traits::{LedMatrix, MatrixCapabilities};
pub use error::DisplayError;
pub use drivers::mock::{MockMatrix, MockMatrixState};
#[cfg(feature = "ansi-matrix")]
pub use drivers::ansi::AnsiMatrix;
pub use fade::Fade;
pub use slot::{SlotInfo, SlotState};
pub use manager::{DisplayMgr, SchedulerConfig, DEFAULT_SYS_MSG_DURATION, MAX_SLOTS};
