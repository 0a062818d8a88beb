/*
 *  plugin/plugins/just_text.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Just text plugin - a single, possibly scrolling, line of text
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
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::text_route;
use crate::fs::FileSystem;
use crate::gfx::{Canvas, Gfx};
use crate::plugin::{config_store, Plugin, PluginCore, PluginLock, TextPlugin};
use crate::web::WebRequest;
use crate::widget::{TextWidget, WidgetArena, WidgetId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct JustTextConfig {
    text: String,
}

impl Default for JustTextConfig {
    fn default() -> Self {
        Self { text: "Hello World".to_string() }
    }
}

struct JustTextState {
    arena: WidgetArena,
    text_id: WidgetId,
    canvas: Option<Canvas>,
    config: JustTextConfig,
    fs: Option<Arc<dyn FileSystem>>,
}

pub struct JustTextPlugin {
    core: PluginCore,
    state: PluginLock<JustTextState>,
}

impl JustTextPlugin {
    pub const TYPE_NAME: &'static str = "JustTextPlugin";

    pub fn new(uid: u16) -> Self {
        let mut arena = WidgetArena::new();
        let text_id = arena.insert(TextWidget::new(""));
        Self {
            core: PluginCore::new(Self::TYPE_NAME, uid),
            state: PluginLock::new(JustTextState {
                arena,
                text_id,
                canvas: None,
                config: JustTextConfig::default(),
                fs: None,
            }),
        }
    }

    pub fn create(uid: u16) -> Arc<dyn Plugin> {
        Arc::new(Self::new(uid))
    }

    fn apply_config(state: &mut JustTextState) {
        let text = state.config.text.clone();
        if let Some(w) = state.arena.get_as_mut::<TextWidget>(state.text_id) {
            w.set_str(text);
        }
    }
}

impl Plugin for JustTextPlugin {
    fn core(&self) -> &PluginCore {
        &self.core
    }

    fn start(&self, fs: &Arc<dyn FileSystem>) {
        let _section = self.state.lock();
        self.state.with(|s| s.fs = Some(Arc::clone(fs)));
        match config_store::load_or_create::<JustTextConfig>(fs.as_ref(), self.uid()) {
            Ok(cfg) => self.state.with(|s| {
                s.config = cfg;
                Self::apply_config(s);
            }),
            Err(e) => warn!("[{}/{}] configuration unavailable: {}", Self::TYPE_NAME, self.uid(), e),
        }
    }

    fn active(&self, gfx: &mut dyn Gfx) {
        let (w, h) = (gfx.width(), gfx.height());
        self.state.with(|s| {
            if s.canvas.is_none() {
                let mut canvas = Canvas::new(w, h, 0, 0);
                canvas.add_widget(s.text_id);
                s.canvas = Some(canvas);
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

    fn web_request(&self, route: &str, req: &dyn WebRequest, _fs: &dyn FileSystem) -> bool {
        if route != "text" {
            return false;
        }
        text_route::serve(self, req);
        true
    }

    fn set_scroll_pause(&self, pause: Duration) {
        self.state.with(|s| {
            if let Some(w) = s.arena.get_as_mut::<TextWidget>(s.text_id) {
                w.set_scroll_pause(pause);
            }
        });
    }

    fn as_text(&self) -> Option<&dyn TextPlugin> {
        Some(self)
    }
}

impl TextPlugin for JustTextPlugin {
    fn text(&self) -> String {
        self.state.read(|s| s.config.text.clone())
    }

    fn set_text(&self, text: &str) {
        let uid = self.uid();
        self.state.with(|s| {
            s.config.text = text.to_string();
            Self::apply_config(s);
            if let Some(fs) = s.fs.as_ref() {
                if let Err(e) = config_store::save(fs.as_ref(), uid, &s.config) {
                    warn!("[{}/{}] text not persisted: {}", Self::TYPE_NAME, uid, e);
                }
            }
        });
        info!("[{}/{}] text set", Self::TYPE_NAME, uid);
    }
}
