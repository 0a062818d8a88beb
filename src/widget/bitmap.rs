/*
 *  widget/bitmap.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Bitmap widget - owned pixel buffer, set from memory or loaded from an image file
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
use std::io::Cursor;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use log::{error, warn};

use super::Widget;
use crate::fs::{FileSystem, FsError};
use crate::gfx::{Gfx, GfxError};

/// Bitmap widget
///
/// The pixel buffer is owned per instance: `clone()` makes a deep copy and a
/// moved widget takes its buffer along. Every mutation either fully succeeds
/// or leaves a well defined state behind, never a half written buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BitmapWidget {
    pos: Point,
    buffer: Vec<Rgb888>,
    width: u16,
    height: u16,
}

impl BitmapWidget {
    pub const WIDGET_TYPE: &'static str = "bitmap";

    /// Empty bitmap, renders nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the bitmap with a copy of `bitmap`
    ///
    /// The old buffer is dropped first. If the new one can not be allocated
    /// the widget is left empty.
    pub fn set(&mut self, bitmap: &[Rgb888], width: u16, height: u16) -> Result<(), GfxError> {
        let size = width as usize * height as usize;
        if bitmap.len() < size {
            return Err(GfxError::SizeMismatch { expected: size, actual: bitmap.len() });
        }

        self.clear();
        let mut buffer = alloc_pixels(size)?;
        buffer.extend_from_slice(&bitmap[..size]);

        self.buffer = buffer;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Current bitmap with its dimensions
    pub fn get(&self) -> (&[Rgb888], u16, u16) {
        (&self.buffer, self.width, self.height)
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop the buffer
    pub fn clear(&mut self) {
        self.buffer = Vec::new();
        self.width = 0;
        self.height = 0;
    }

    /// Load a PNG image from the filesystem
    ///
    /// Missing file, bad format or a failed allocation leave the current
    /// bitmap untouched.
    pub fn load(&mut self, fs: &dyn FileSystem, path: &str) -> Result<(), GfxError> {
        if !fs.exists(path) {
            warn!("File {} doesn't exist.", path);
            return Err(GfxError::NotFound(path.to_string()));
        }

        let bytes = fs.read(path).map_err(|e| match e {
            FsError::NotFound(p) => GfxError::NotFound(p),
            other => GfxError::Read { path: path.to_string(), reason: other.to_string() },
        })?;

        let (buffer, width, height) = decode_png(&bytes).inspect_err(|e| {
            error!("File {} has incompatible bitmap file format: {}", path, e);
        })?;

        self.buffer = buffer;
        self.width = width;
        self.height = height;
        Ok(())
    }
}

impl Widget for BitmapWidget {
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
        if !self.buffer.is_empty() {
            gfx.draw_bitmap(self.pos.x, self.pos.y, &self.buffer, self.width as u32, self.height as u32);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn alloc_pixels(count: usize) -> Result<Vec<Rgb888>, GfxError> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(count).map_err(|_| GfxError::Allocation(count))?;
    Ok(buffer)
}

/// Decode a PNG into row-major Rgb888 pixels
fn decode_png(bytes: &[u8]) -> Result<(Vec<Rgb888>, u16, u16), GfxError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(|e| GfxError::Format(e.to_string()))?;

    let mut raw = Vec::new();
    let raw_size = reader.output_buffer_size();
    raw.try_reserve_exact(raw_size).map_err(|_| GfxError::Allocation(raw_size))?;
    raw.resize(raw_size, 0u8);

    let info = reader.next_frame(&mut raw).map_err(|e| GfxError::Format(e.to_string()))?;
    let (width, height) = (info.width, info.height);
    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(GfxError::Format(format!("{}x{} exceeds bitmap limits", width, height)));
    }

    let channels = match info.color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        png::ColorType::Indexed => {
            return Err(GfxError::Format("palette not expanded".to_string()));
        }
    };

    let count = width as usize * height as usize;
    let mut pixels = alloc_pixels(count)?;
    for px in raw[..info.buffer_size()].chunks_exact(channels).take(count) {
        let color = match channels {
            1 | 2 => Rgb888::new(px[0], px[0], px[0]),
            _ => Rgb888::new(px[0], px[1], px[2]),
        };
        pixels.push(color);
    }
    if pixels.len() != count {
        return Err(GfxError::Format("truncated image data".to_string()));
    }

    Ok((pixels, width as u16, height as u16))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fs::MemFs;
    use crate::gfx::FrameBuffer;

    /// Encode an RGB PNG for fixtures
    pub(crate) fn encode_png(width: u32, height: u32, rgb: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().expect("png header");
            writer.write_image_data(rgb).expect("png data");
        }
        out
    }

    #[test]
    fn test_load_missing_leaves_empty() {
        let fs = MemFs::new();
        let mut bmp = BitmapWidget::new();
        assert!(matches!(bmp.load(&fs, "/nope.png"), Err(GfxError::NotFound(_))));
        assert_eq!(bmp.width(), 0);
        assert_eq!(bmp.height(), 0);
        assert!(bmp.get().0.is_empty());
    }

    #[test]
    fn test_load_valid_png() {
        let fs = MemFs::new();
        let rgb: Vec<u8> = (0..(3 * 2 * 3)).map(|v| v as u8).collect();
        fs.write("/icon.png", &encode_png(3, 2, &rgb)).expect("write");

        let mut bmp = BitmapWidget::new();
        assert!(bmp.load(&fs, "/icon.png").is_ok());
        let (buf, w, h) = bmp.get();
        assert_eq!((w, h), (3, 2));
        assert_eq!(buf.len(), 6);
        assert_eq!(buf[1], Rgb888::new(3, 4, 5));
    }

    #[test]
    fn test_load_bad_format_keeps_previous() {
        let fs = MemFs::new();
        fs.write("/broken.png", b"definitely not a png").expect("write");
        let mut bmp = BitmapWidget::new();
        bmp.set(&[Rgb888::RED; 4], 2, 2).expect("set");
        assert!(matches!(bmp.load(&fs, "/broken.png"), Err(GfxError::Format(_))));
        assert_eq!(bmp.get(), (&[Rgb888::RED; 4][..], 2, 2));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = BitmapWidget::new();
        original.set(&[Rgb888::BLUE; 4], 2, 2).expect("set");
        let mut copy = original.clone();
        copy.set(&[Rgb888::GREEN; 1], 1, 1).expect("set");
        assert_eq!(original.get(), (&[Rgb888::BLUE; 4][..], 2, 2));
        assert_eq!(copy.get(), (&[Rgb888::GREEN; 1][..], 1, 1));
    }

    #[test]
    fn test_set_rejects_short_buffer() {
        let mut bmp = BitmapWidget::new();
        bmp.set(&[Rgb888::RED; 4], 2, 2).expect("set");
        assert!(matches!(bmp.set(&[Rgb888::RED; 3], 2, 2), Err(GfxError::SizeMismatch { .. })));
        // rejected before touching the old buffer
        assert_eq!(bmp.get().0.len(), 4);
    }

    #[test]
    fn test_update_draws_at_position() {
        let mut bmp = BitmapWidget::new();
        bmp.set(&[Rgb888::RED], 1, 1).expect("set");
        bmp.move_to(2, 1);
        let mut fb = FrameBuffer::new(4, 4);
        bmp.update(&mut fb);
        assert_eq!(fb.get_pixel(2, 1), Some(Rgb888::RED));
        assert_eq!(fb.get_pixel(0, 0), Some(Rgb888::BLACK));
    }
}
