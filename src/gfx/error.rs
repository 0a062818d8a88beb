/*
 *  gfx/error.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Graphics error types
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

/// Errors raised while building widget content
#[derive(Debug, Error)]
pub enum GfxError {
    /// Pixel buffer allocation denied
    #[error("bitmap allocation of {0} pixels failed")]
    Allocation(usize),

    /// Image file missing
    #[error("file not found: {0}")]
    NotFound(String),

    /// File exists but could not be read
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    /// Unsupported or corrupt image data
    #[error("incompatible image format: {0}")]
    Format(String),

    /// Bitmap dimensions do not match the supplied buffer
    #[error("bitmap size mismatch: expected {expected} pixels, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}
