/*
 *  gfx/color.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Named colors and the linear blend used by slot fades
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

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

/// Named color palette for widgets and system messages
///
/// Colors are defined once and converted to the matrix native `Rgb888` when
/// drawn, same as field colors adapt to the panel color depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// Black/Off
    Black,
    White,
    Red,
    Green,
    Blue,
    Yellow,
    Orange,
    Cyan,
    Magenta,
    Gray,
    /// Custom 24-bit value (0xRRGGBB)
    Rgb(u32),
}

impl Color {
    /// Convert to the matrix native color
    pub fn to_rgb(&self) -> Rgb888 {
        match self {
            Color::Black => Rgb888::BLACK,
            Color::White => Rgb888::WHITE,
            Color::Red => Rgb888::RED,
            Color::Green => Rgb888::GREEN,
            Color::Blue => Rgb888::BLUE,
            Color::Yellow => Rgb888::YELLOW,
            Color::Orange => Rgb888::new(255, 165, 0),
            Color::Cyan => Rgb888::CYAN,
            Color::Magenta => Rgb888::MAGENTA,
            Color::Gray => Rgb888::new(128, 128, 128),
            Color::Rgb(v) => Rgb888::new((v >> 16) as u8, (v >> 8) as u8, *v as u8),
        }
    }

    /// Parse "#rrggbb" / "0xrrggbb" / a palette name
    pub fn parse(s: &str) -> Option<Color> {
        let s = s.trim();
        let hex = s.strip_prefix('#').or_else(|| s.strip_prefix("0x"));
        if let Some(hex) = hex {
            if hex.len() != 6 {
                return None;
            }
            return u32::from_str_radix(hex, 16).ok().map(Color::Rgb);
        }
        match s.to_ascii_lowercase().as_str() {
            "black" => Some(Color::Black),
            "white" => Some(Color::White),
            "red" => Some(Color::Red),
            "green" => Some(Color::Green),
            "blue" => Some(Color::Blue),
            "yellow" => Some(Color::Yellow),
            "orange" => Some(Color::Orange),
            "cyan" => Some(Color::Cyan),
            "magenta" => Some(Color::Magenta),
            "gray" | "grey" => Some(Color::Gray),
            _ => None,
        }
    }
}

impl From<Color> for Rgb888 {
    fn from(c: Color) -> Self {
        c.to_rgb()
    }
}

/// Linear interpolation between two colors, alpha 0.0 = `from`, 1.0 = `to`
#[inline]
pub fn blend(from: Rgb888, to: Rgb888, alpha: f32) -> Rgb888 {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |f: u8, t: u8| -> u8 {
        let v = f as f32 + (t as f32 - f as f32) * a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgb888::new(mix(from.r(), to.r()), mix(from.g(), to.g()), mix(from.b(), to.b()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_conversion() {
        assert_eq!(Color::Black.to_rgb(), Rgb888::BLACK);
        assert_eq!(Color::Rgb(0x102030).to_rgb(), Rgb888::new(0x10, 0x20, 0x30));
    }

    #[test]
    fn test_parse() {
        assert_eq!(Color::parse("#ff0000"), Some(Color::Rgb(0xff0000)));
        assert_eq!(Color::parse("Yellow"), Some(Color::Yellow));
        assert_eq!(Color::parse("#fff"), None);
        assert_eq!(Color::parse("mauve"), None);
    }

    #[test]
    fn test_blend_endpoints() {
        let a = Rgb888::new(0, 100, 200);
        let b = Rgb888::new(200, 0, 100);
        assert_eq!(blend(a, b, 0.0), a);
        assert_eq!(blend(a, b, 1.0), b);
        assert_eq!(blend(a, b, 0.5), Rgb888::new(100, 50, 150));
        // out of range alpha is clamped
        assert_eq!(blend(a, b, 3.0), b);
    }
}
