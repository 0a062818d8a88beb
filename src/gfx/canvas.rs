/*
 *  gfx/canvas.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Canvas - rectangular composition surface painting an ordered widget list
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
use embedded_graphics::primitives::Rectangle;

use super::Gfx;
use crate::widget::{WidgetArena, WidgetId};

/// Rectangular composition region
///
/// A canvas never owns widgets. It keeps checked handles into the owner's
/// [`WidgetArena`] and paints them in insertion order, so a later widget
/// wins where two overlap. Handles whose widget has been removed from the
/// arena are skipped.
#[derive(Debug, Clone)]
pub struct Canvas {
    bounds: Rectangle,
    widgets: Vec<WidgetId>,
}

impl Canvas {
    /// Create a canvas at (x, y) in its parent, `width` x `height` pixels
    pub fn new(width: u32, height: u32, x: i32, y: i32) -> Self {
        Self {
            bounds: Rectangle::new(Point::new(x, y), Size::new(width, height)),
            widgets: Vec::new(),
        }
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    pub fn width(&self) -> u32 {
        self.bounds.size.width
    }

    pub fn height(&self) -> u32 {
        self.bounds.size.height
    }

    /// Append a widget; returns false if it is already on this canvas
    pub fn add_widget(&mut self, id: WidgetId) -> bool {
        if self.widgets.contains(&id) {
            return false;
        }
        self.widgets.push(id);
        true
    }

    /// Remove a widget by identity; returns false if it was not present
    pub fn remove_widget(&mut self, id: WidgetId) -> bool {
        let before = self.widgets.len();
        self.widgets.retain(|w| *w != id);
        before != self.widgets.len()
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.widgets.contains(&id)
    }

    /// Widgets in paint order
    pub fn widgets(&self) -> &[WidgetId] {
        &self.widgets
    }

    pub fn clear(&mut self) {
        self.widgets.clear();
    }

    /// Paint all widgets onto `gfx`, clipped and translated to this canvas
    ///
    /// Returns the number of stale handles skipped.
    pub fn update(&self, arena: &mut WidgetArena, gfx: &mut dyn Gfx) -> usize {
        let mut view = CanvasGfx::new(gfx, self.bounds);
        let mut stale = 0;
        for id in &self.widgets {
            match arena.get_mut(*id) {
                Some(widget) => widget.update(&mut view),
                None => {
                    log::debug!("canvas skips stale widget handle {:?}", id);
                    stale += 1;
                }
            }
        }
        stale
    }
}

/// Clipping, translating view of a parent surface
///
/// Coordinates are local to the view; anything outside its rectangle is
/// dropped before it reaches the parent.
pub struct CanvasGfx<'a> {
    parent: &'a mut dyn Gfx,
    origin: Point,
    size: Size,
}

impl<'a> CanvasGfx<'a> {
    pub fn new(parent: &'a mut dyn Gfx, bounds: Rectangle) -> Self {
        Self { parent, origin: bounds.top_left, size: bounds.size }
    }

    #[inline]
    fn inside(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.size.width && (y as u32) < self.size.height
    }
}

impl Gfx for CanvasGfx<'_> {
    fn width(&self) -> u32 {
        self.size.width
    }

    fn height(&self) -> u32 {
        self.size.height
    }

    fn draw_pixel(&mut self, x: i32, y: i32, color: Rgb888) {
        if self.inside(x, y) {
            self.parent.draw_pixel(self.origin.x + x, self.origin.y + y, color);
        }
    }

    fn get_pixel(&self, x: i32, y: i32) -> Option<Rgb888> {
        if self.inside(x, y) {
            self.parent.get_pixel(self.origin.x + x, self.origin.y + y)
        } else {
            None
        }
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgb888) {
        let local = Rectangle::new(Point::new(x, y), Size::new(width, height));
        let clipped = local.intersection(&Rectangle::new(Point::zero(), self.size));
        if clipped.size.width == 0 || clipped.size.height == 0 {
            return;
        }
        self.parent.fill_rect(
            self.origin.x + clipped.top_left.x,
            self.origin.y + clipped.top_left.y,
            clipped.size.width,
            clipped.size.height,
            color,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::FrameBuffer;
    use crate::widget::{BitmapWidget, Widget};

    fn solid(color: Rgb888, w: u16, h: u16) -> BitmapWidget {
        let mut bmp = BitmapWidget::new();
        let pixels = vec![color; (w * h) as usize];
        assert!(bmp.set(&pixels, w, h).is_ok());
        bmp
    }

    #[test]
    fn test_paint_order_is_insertion_order() {
        let mut arena = WidgetArena::new();
        let a = arena.insert(solid(Rgb888::RED, 2, 2));
        let mut b_widget = solid(Rgb888::GREEN, 2, 2);
        b_widget.move_to(1, 1);
        let b = arena.insert(b_widget);

        let mut canvas = Canvas::new(4, 4, 0, 0);
        assert!(canvas.add_widget(a));
        assert!(canvas.add_widget(b));
        assert!(!canvas.add_widget(a));

        let mut fb = FrameBuffer::new(4, 4);
        assert_eq!(canvas.update(&mut arena, &mut fb), 0);
        assert_eq!(fb.get_pixel(0, 0), Some(Rgb888::RED));
        // overlap, B painted last
        assert_eq!(fb.get_pixel(1, 1), Some(Rgb888::GREEN));
        assert_eq!(fb.get_pixel(2, 2), Some(Rgb888::GREEN));
    }

    #[test]
    fn test_removed_widget_is_never_touched() {
        let mut arena = WidgetArena::new();
        let a = arena.insert(solid(Rgb888::RED, 4, 4));
        let mut canvas = Canvas::new(4, 4, 0, 0);
        canvas.add_widget(a);
        assert!(canvas.remove_widget(a));
        assert!(!canvas.remove_widget(a));

        let mut fb = FrameBuffer::new(4, 4);
        canvas.update(&mut arena, &mut fb);
        assert!(fb.as_slice().iter().all(|&c| c == Rgb888::BLACK));
    }

    #[test]
    fn test_stale_handle_skipped() {
        let mut arena = WidgetArena::new();
        let a = arena.insert(solid(Rgb888::RED, 1, 1));
        let mut canvas = Canvas::new(2, 2, 0, 0);
        canvas.add_widget(a);
        assert!(arena.remove(a).is_some());
        let mut fb = FrameBuffer::new(2, 2);
        assert_eq!(canvas.update(&mut arena, &mut fb), 1);
    }

    #[test]
    fn test_view_translates_and_clips() {
        let mut fb = FrameBuffer::new(8, 4);
        {
            let mut view = CanvasGfx::new(&mut fb, Rectangle::new(Point::new(4, 1), Size::new(2, 2)));
            view.fill_screen(Rgb888::BLUE);
            view.draw_pixel(5, 0, Rgb888::RED);
        }
        assert_eq!(fb.get_pixel(4, 1), Some(Rgb888::BLUE));
        assert_eq!(fb.get_pixel(5, 2), Some(Rgb888::BLUE));
        assert_eq!(fb.get_pixel(6, 1), Some(Rgb888::BLACK));
        assert_eq!(fb.get_pixel(3, 1), Some(Rgb888::BLACK));
    }
}
