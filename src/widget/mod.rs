/*
 *  widget/mod.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Widget trait and the per-owner widget arena
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

//! Widgets - positioned drawable primitives
//!
//! A widget belongs to exactly one owner (a plugin, or the display manager
//! for system widgets) and lives in that owner's [`WidgetArena`]. Canvases
//! hold [`WidgetId`] handles; a handle carries the slot generation, so a
//! handle to a removed widget can never resolve to whatever reused the slot.

pub mod bitmap;
pub mod lamp;
pub mod progress;
pub mod text;

use std::any::Any;
use embedded_graphics::prelude::Point;

use crate::gfx::Gfx;

pub use bitmap::BitmapWidget;
pub use lamp::LampWidget;
pub use progress::ProgressBar;
pub use text::TextWidget;

/// Positioned drawable primitive
pub trait Widget: Any + Send {
    /// Widget type string, e.g. "bitmap"
    fn kind(&self) -> &'static str;

    /// Top-left position inside the canvas
    fn position(&self) -> Point;

    /// Move the widget inside its canvas
    fn move_to(&mut self, x: i32, y: i32);

    /// Render current content at the stored position
    fn update(&mut self, gfx: &mut dyn Gfx);

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Checked handle into a [`WidgetArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId {
    index: u32,
    generation: u32,
}

struct Entry {
    generation: u32,
    widget: Option<Box<dyn Widget>>,
}

/// Generational storage for the widgets of one owner
#[derive(Default)]
pub struct WidgetArena {
    entries: Vec<Entry>,
    free: Vec<u32>,
}

impl WidgetArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a widget and hand back its handle
    pub fn insert<W: Widget>(&mut self, widget: W) -> WidgetId {
        self.insert_boxed(Box::new(widget))
    }

    pub fn insert_boxed(&mut self, widget: Box<dyn Widget>) -> WidgetId {
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.widget = Some(widget);
            WidgetId { index, generation: entry.generation }
        } else {
            let index = self.entries.len() as u32;
            self.entries.push(Entry { generation: 0, widget: Some(widget) });
            WidgetId { index, generation: 0 }
        }
    }

    /// Destroy a widget, returning it; every handle to it goes stale
    pub fn remove(&mut self, id: WidgetId) -> Option<Box<dyn Widget>> {
        let entry = self.entries.get_mut(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        let widget = entry.widget.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(widget)
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: WidgetId) -> Option<&dyn Widget> {
        let entry = self.entries.get(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        entry.widget.as_deref()
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut (dyn Widget + 'static)> {
        let entry = self.entries.get_mut(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        entry.widget.as_deref_mut()
    }

    /// Typed access, None on a stale handle or a type mismatch
    pub fn get_as<W: Widget>(&self, id: WidgetId) -> Option<&W> {
        self.get(id)?.as_any().downcast_ref::<W>()
    }

    pub fn get_as_mut<W: Widget>(&mut self, id: WidgetId) -> Option<&mut W> {
        self.get_mut(id)?.as_any_mut().downcast_mut::<W>()
    }

    /// Number of live widgets
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.widget.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Destroy every widget
    pub fn clear(&mut self) {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if entry.widget.take().is_some() {
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_goes_stale_after_remove() {
        let mut arena = WidgetArena::new();
        let a = arena.insert(TextWidget::new("a"));
        assert!(arena.contains(a));
        assert!(arena.remove(a).is_some());
        assert!(!arena.contains(a));
        assert!(arena.remove(a).is_none());

        // slot reuse must not revive the old handle
        let b = arena.insert(TextWidget::new("b"));
        assert!(!arena.contains(a));
        assert!(arena.contains(b));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_typed_access() {
        let mut arena = WidgetArena::new();
        let t = arena.insert(TextWidget::new("hello"));
        assert!(arena.get_as::<BitmapWidget>(t).is_none());
        if let Some(text) = arena.get_as_mut::<TextWidget>(t) {
            text.set_str("world");
        }
        assert_eq!(arena.get_as::<TextWidget>(t).map(|w| w.str().to_string()), Some("world".to_string()));
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut arena = WidgetArena::new();
        let a = arena.insert(TextWidget::new("a"));
        let b = arena.insert(ProgressBar::new());
        arena.clear();
        assert!(arena.is_empty());
        assert!(!arena.contains(a));
        assert!(!arena.contains(b));
    }
}
