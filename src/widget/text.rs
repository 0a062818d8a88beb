/*
 *  widget/text.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Text widget - colored string with time based horizontal scrolling
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
use std::time::{Duration, Instant};
use embedded_graphics::mono_font::ascii::{FONT_4X6, FONT_5X7, FONT_6X9};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use super::Widget;
use crate::gfx::{Gfx, GfxTarget};

/// Gap in pixels between the end of a scrolling text and its repetition
const SCROLL_GAP: i32 = 8;

/// Available text fonts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontKind {
    Small,
    #[default]
    Normal,
    Large,
}

impl FontKind {
    pub fn font(&self) -> &'static MonoFont<'static> {
        match self {
            FontKind::Small => &FONT_4X6,
            FontKind::Normal => &FONT_5X7,
            FontKind::Large => &FONT_6X9,
        }
    }
}

/// Text widget
///
/// Text wider than the surface it is drawn on scrolls to the left one pixel
/// per `scroll_pause`, wrapping around with a gap. Text that fits is drawn
/// static and the cursor stays at 0.
#[derive(Debug, Clone)]
pub struct TextWidget {
    pos: Point,
    text: String,
    color: Rgb888,
    font: FontKind,
    scroll_pause: Duration,
    scroll_offset: i32,
    last_step: Option<Instant>,
}

impl Default for TextWidget {
    fn default() -> Self {
        Self::new("")
    }
}

impl TextWidget {
    pub const WIDGET_TYPE: &'static str = "text";
    pub const DEFAULT_COLOR: Rgb888 = Rgb888::WHITE;
    pub const DEFAULT_SCROLL_PAUSE: Duration = Duration::from_millis(80);

    pub fn new(text: impl Into<String>) -> Self {
        Self {
            pos: Point::zero(),
            text: text.into(),
            color: Self::DEFAULT_COLOR,
            font: FontKind::default(),
            scroll_pause: Self::DEFAULT_SCROLL_PAUSE,
            scroll_offset: 0,
            last_step: None,
        }
    }

    pub fn with_color(mut self, color: Rgb888) -> Self {
        self.color = color;
        self
    }

    /// Replace the text, restarting the scroll only if it changed
    pub fn set_str(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.text != text {
            self.text = text;
            self.reset_scroll();
        }
    }

    pub fn str(&self) -> &str {
        &self.text
    }

    pub fn set_text_color(&mut self, color: Rgb888) {
        self.color = color;
    }

    pub fn text_color(&self) -> Rgb888 {
        self.color
    }

    pub fn set_font(&mut self, font: FontKind) {
        if self.font != font {
            self.font = font;
            self.reset_scroll();
        }
    }

    pub fn font(&self) -> FontKind {
        self.font
    }

    pub fn set_scroll_pause(&mut self, pause: Duration) {
        self.scroll_pause = pause;
    }

    /// Current scroll cursor in pixels
    pub fn scroll_offset(&self) -> i32 {
        self.scroll_offset
    }

    /// Rendered width of the whole string in pixels
    pub fn text_width(&self) -> i32 {
        let font = self.font.font();
        let advance = font.character_size.width + font.character_spacing;
        (self.text.chars().count() as u32 * advance) as i32
    }

    fn reset_scroll(&mut self) {
        self.scroll_offset = 0;
        self.last_step = None;
    }

    /// Advance the cursor if the pause elapsed and the text needs scrolling
    fn step_scroll(&mut self, available: i32, now: Instant) {
        let text_width = self.text_width();
        if text_width <= available {
            self.reset_scroll();
            return;
        }
        match self.last_step {
            None => self.last_step = Some(now),
            Some(last) if now.duration_since(last) >= self.scroll_pause => {
                self.scroll_offset += 1;
                if self.scroll_offset >= text_width + SCROLL_GAP {
                    self.scroll_offset = 0;
                }
                self.last_step = Some(now);
            }
            Some(_) => {}
        }
    }

    pub(crate) fn update_at(&mut self, gfx: &mut dyn Gfx, now: Instant) {
        if self.text.is_empty() {
            return;
        }
        let available = gfx.width() as i32 - self.pos.x;
        self.step_scroll(available, now);

        let style = MonoTextStyle::new(self.font.font(), self.color);
        let x = self.pos.x - self.scroll_offset;
        let mut target = GfxTarget::new(gfx);
        Text::with_baseline(&self.text, Point::new(x, self.pos.y), style, Baseline::Top)
            .draw(&mut target)
            .ok();

        if self.scroll_offset > 0 {
            let loop_x = x + self.text_width() + SCROLL_GAP;
            Text::with_baseline(&self.text, Point::new(loop_x, self.pos.y), style, Baseline::Top)
                .draw(&mut target)
                .ok();
        }
    }
}

impl Widget for TextWidget {
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
        self.update_at(gfx, Instant::now());
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
    fn test_short_text_does_not_scroll() {
        let mut fb = FrameBuffer::new(32, 8);
        let mut text = TextWidget::new("Hi");
        let t0 = Instant::now();
        text.update_at(&mut fb, t0);
        text.update_at(&mut fb, t0 + Duration::from_secs(5));
        assert_eq!(text.scroll_offset(), 0);
        assert!(fb.as_slice().iter().any(|&c| c == Rgb888::WHITE));
    }

    #[test]
    fn test_scroll_advances_only_after_pause() {
        let mut fb = FrameBuffer::new(16, 8);
        let mut text = TextWidget::new("A much longer string");
        text.set_scroll_pause(Duration::from_millis(50));
        let t0 = Instant::now();
        text.update_at(&mut fb, t0);
        assert_eq!(text.scroll_offset(), 0);
        text.update_at(&mut fb, t0 + Duration::from_millis(10));
        assert_eq!(text.scroll_offset(), 0);
        text.update_at(&mut fb, t0 + Duration::from_millis(60));
        assert_eq!(text.scroll_offset(), 1);
        text.update_at(&mut fb, t0 + Duration::from_millis(120));
        assert_eq!(text.scroll_offset(), 2);
    }

    #[test]
    fn test_scroll_wraps() {
        let mut fb = FrameBuffer::new(4, 8);
        let mut text = TextWidget::new("AB");
        text.set_scroll_pause(Duration::from_millis(1));
        let wrap = text.text_width() + SCROLL_GAP;
        let t0 = Instant::now();
        text.update_at(&mut fb, t0);
        for step in 1..=wrap {
            text.update_at(&mut fb, t0 + Duration::from_millis(step as u64 * 2));
        }
        assert_eq!(text.scroll_offset(), 0);
    }

    #[test]
    fn test_set_same_text_keeps_cursor() {
        let mut fb = FrameBuffer::new(8, 8);
        let mut text = TextWidget::new("Scrolling");
        text.set_scroll_pause(Duration::from_millis(1));
        let t0 = Instant::now();
        text.update_at(&mut fb, t0);
        text.update_at(&mut fb, t0 + Duration::from_millis(5));
        assert_eq!(text.scroll_offset(), 1);
        text.set_str("Scrolling");
        assert_eq!(text.scroll_offset(), 1);
        text.set_str("Other");
        assert_eq!(text.scroll_offset(), 0);
    }
}
