/*
 *  plugin/plugins/icon_text_lamp.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Icon, text and lamp plugin - icon text layout with a row of lamps
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
use log::info;
use serde_json::json;

use super::icon_text::{IconTextParts, ICON_WIDTH};
use super::text_route;
use crate::fs::FileSystem;
use crate::gfx::{Canvas, Gfx};
use crate::plugin::{config_store, Plugin, PluginCore, PluginError, PluginLock, TextPlugin};
use crate::web::{rest_error, rest_ok, send_json, status, Method, UploadChunk, WebRequest};
use crate::widget::{LampWidget, Widget, WidgetId};

const MAX_LAMPS: usize = 4;

struct LampState {
    parts: IconTextParts,
    lamps: [WidgetId; MAX_LAMPS],
    lamp_canvas: Option<Canvas>,
}

/// Icon left, text right, and a bar of lamps under the text
///
/// REST routes: `text`, `bitmap`, `lamps` (all states) and
/// `lamp/<id>?set=on|off`.
pub struct IconTextLampPlugin {
    core: PluginCore,
    state: PluginLock<LampState>,
}

impl IconTextLampPlugin {
    pub const TYPE_NAME: &'static str = "IconTextLampPlugin";

    pub fn new(uid: u16) -> Self {
        let mut parts = IconTextParts::new();
        let lamps = std::array::from_fn(|_| parts.arena.insert(LampWidget::new()));
        Self {
            core: PluginCore::new(Self::TYPE_NAME, uid),
            state: PluginLock::new(LampState { parts, lamps, lamp_canvas: None }),
        }
    }

    pub fn create(uid: u16) -> Arc<dyn Plugin> {
        Arc::new(Self::new(uid))
    }

    pub fn lamp(&self, id: usize) -> bool {
        self.state.with(|s| {
            s.lamps
                .get(id)
                .and_then(|lamp| s.parts.arena.get_as::<LampWidget>(*lamp))
                .is_some_and(|w| w.on_state())
        })
    }

    /// Switch a lamp; false for an unknown lamp id
    pub fn set_lamp(&self, id: usize, on: bool) -> bool {
        self.state.with(|s| {
            let Some(lamp) = s.lamps.get(id).copied() else {
                return false;
            };
            match s.parts.arena.get_as_mut::<LampWidget>(lamp) {
                Some(w) => {
                    w.set_on_state(on);
                    true
                }
                None => false,
            }
        })
    }

    fn serve_lamp(&self, id: &str, req: &dyn WebRequest) {
        if req.method() != Method::Post {
            send_json(req, status::NOT_FOUND, &rest_error("HTTP method not supported."));
            return;
        }
        let on = match req.arg("set").as_deref() {
            Some("on") => true,
            Some("off") => false,
            Some(_) => {
                send_json(req, status::NOT_FOUND, &rest_error("Invalid lamp state."));
                return;
            }
            None => {
                send_json(req, status::NOT_FOUND, &rest_error("Set is missing."));
                return;
            }
        };
        match id.parse::<usize>() {
            Ok(id) if self.set_lamp(id, on) => send_json(req, status::OK, &rest_ok(json!({}))),
            _ => send_json(req, status::NOT_FOUND, &rest_error("Lamp id not supported.")),
        }
    }
}

impl Plugin for IconTextLampPlugin {
    fn core(&self) -> &PluginCore {
        &self.core
    }

    fn start(&self, fs: &Arc<dyn FileSystem>) {
        let uid = self.uid();
        self.state.with(|s| s.parts.start(fs, Self::TYPE_NAME, uid));
    }

    fn stop(&self, fs: &dyn FileSystem) {
        if let Err(e) = config_store::remove(fs, self.uid()) {
            log::warn!("[{}/{}] configuration not removed: {}", Self::TYPE_NAME, self.uid(), e);
        }
        IconTextParts::remove_icon(fs, self.uid());
    }

    fn active(&self, gfx: &mut dyn Gfx) {
        let (w, h, uid) = (gfx.width(), gfx.height(), self.uid());
        self.state.with(|s| {
            s.parts.build(w, h.saturating_sub(2), uid);
            if s.lamp_canvas.is_none() {
                let mut canvas = Canvas::new(w.saturating_sub(ICON_WIDTH), 1, ICON_WIDTH as i32, h as i32 - 1);
                for (index, id) in s.lamps.iter().enumerate() {
                    // one space in front, two between lamps
                    let x = (LampWidget::DEFAULT_WIDTH as i32 + 2) * index as i32 + 1;
                    canvas.add_widget(*id);
                    if let Some(lamp) = s.parts.arena.get_mut(*id) {
                        lamp.move_to(x, 0);
                    }
                }
                s.lamp_canvas = Some(canvas);
            }
        });
        info!("[{}/{}] active", Self::TYPE_NAME, uid);
    }

    fn update(&self, gfx: &mut dyn Gfx) {
        self.state.with(|s| {
            s.parts.render(gfx);
            if let Some(canvas) = s.lamp_canvas.as_ref() {
                canvas.update(&mut s.parts.arena, gfx);
            }
        });
    }

    fn web_request(&self, route: &str, req: &dyn WebRequest, _fs: &dyn FileSystem) -> bool {
        let uid = self.uid();
        match route {
            "text" => text_route::serve(self, req),
            "bitmap" => self.state.with(|s| s.parts.serve_bitmap(uid, req)),
            "lamps" => {
                let states: Vec<serde_json::Value> = (0..MAX_LAMPS)
                    .map(|id| json!({ "id": id, "state": if self.lamp(id) { "on" } else { "off" } }))
                    .collect();
                send_json(req, status::OK, &rest_ok(json!({ "lamps": states })));
            }
            other => match other.strip_prefix("lamp/") {
                Some(id) => self.serve_lamp(id, req),
                None => return false,
            },
        }
        true
    }

    fn web_upload(&self, route: &str, chunk: &UploadChunk, fs: &dyn FileSystem) -> Result<(), PluginError> {
        if route != "bitmap" {
            return Err(PluginError::UnknownRoute(route.to_string()));
        }
        let uid = self.uid();
        self.state.with(|s| s.parts.upload(uid, chunk, fs))
    }

    fn set_scroll_pause(&self, pause: Duration) {
        self.state.with(|s| s.parts.set_scroll_pause(pause));
    }

    fn as_text(&self) -> Option<&dyn TextPlugin> {
        Some(self)
    }
}

impl TextPlugin for IconTextLampPlugin {
    fn text(&self) -> String {
        self.state.read(|s| s.parts.config.text.clone())
    }

    fn set_text(&self, text: &str) {
        let uid = self.uid();
        self.state.with(|s| s.parts.set_text(text, Self::TYPE_NAME, uid));
    }
}
