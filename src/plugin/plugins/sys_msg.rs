/*
 *  plugin/plugins/sys_msg.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  System message plugin - full screen text owned by the display manager
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
use std::time::Duration;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

use crate::gfx::{Canvas, Gfx};
use crate::plugin::{Plugin, PluginCore, PluginLock};
use crate::widget::{TextWidget, Widget, WidgetArena, WidgetId};

struct SysMsgState {
    arena: WidgetArena,
    text_id: WidgetId,
    canvas: Option<Canvas>,
}

/// Not installable; the display manager keeps one instance for
/// boot, connection and update messages.
pub struct SysMsgPlugin {
    core: PluginCore,
    state: PluginLock<SysMsgState>,
}

impl Default for SysMsgPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl SysMsgPlugin {
    pub const TYPE_NAME: &'static str = "SysMsgPlugin";

    pub fn new() -> Self {
        let mut arena = WidgetArena::new();
        let text_id = arena.insert(TextWidget::new("").with_color(Rgb888::new(0xff, 0xa5, 0x00)));
        Self {
            core: PluginCore::new(Self::TYPE_NAME, 0),
            state: PluginLock::new(SysMsgState { arena, text_id, canvas: None }),
        }
    }

    pub fn create() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn show(&self, msg: &str) {
        self.state.with(|s| {
            if let Some(w) = s.arena.get_as_mut::<TextWidget>(s.text_id) {
                w.set_str(msg);
            }
        });
    }

    pub fn message(&self) -> String {
        self.state.read(|s| s.arena.get_as::<TextWidget>(s.text_id).map(|w| w.str().to_string()).unwrap_or_default())
    }
}

impl Plugin for SysMsgPlugin {
    fn core(&self) -> &PluginCore {
        &self.core
    }

    fn active(&self, gfx: &mut dyn Gfx) {
        let (w, h) = (gfx.width(), gfx.height());
        self.state.with(|s| {
            if s.canvas.is_none() {
                let mut canvas = Canvas::new(w, h, 0, 0);
                canvas.add_widget(s.text_id);
                if let Some(text) = s.arena.get_mut(s.text_id) {
                    text.move_to(0, 1);
                }
                s.canvas = Some(canvas);
            }
        });
    }

    fn set_scroll_pause(&self, pause: Duration) {
        self.state.with(|s| {
            if let Some(w) = s.arena.get_as_mut::<TextWidget>(s.text_id) {
                w.set_scroll_pause(pause);
            }
        });
    }

    fn update(&self, gfx: &mut dyn Gfx) {
        self.state.with(|s| {
            gfx.fill_screen(Rgb888::BLACK);
            if let Some(canvas) = s.canvas.as_ref() {
                canvas.update(&mut s.arena, gfx);
            }
        });
    }
}
