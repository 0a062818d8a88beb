/*
 *  display/error.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display and scheduler error type
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

use thiserror::Error;

/// Unified error type for matrix and slot operations
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Hardware initialization failed
    #[error("display initialization failed: {0}")]
    InitializationFailed(String),

    /// Slot index outside 0..slot_count
    #[error("slot {0} does not exist")]
    InvalidSlot(usize),

    #[error("slot {0} is already in use")]
    SlotOccupied(usize),

    #[error("slot {0} is empty")]
    SlotEmpty(usize),

    #[error("no free slot available")]
    NoFreeSlot,

    /// Frame size differs from the matrix size
    #[error("frame size mismatch: expected {expected} pixels, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("{0}")]
    Other(String),
}
