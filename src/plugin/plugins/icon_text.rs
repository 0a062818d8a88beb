/*
 *  plugin/plugins/icon_text.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Icon and text plugin - 8x8 icon on the left, text on the right
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
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use super::text_route;
use crate::fs::FileSystem;
use crate::gfx::{Canvas, Gfx};
use crate::plugin::{config_store, Plugin, PluginCore, PluginError, PluginLock, TextPlugin};
use crate::web::{rest_error, rest_ok, send_json, status, Method, UploadChunk, WebRequest};
use crate::widget::{BitmapWidget, TextWidget, Widget, WidgetArena, WidgetId};

pub(super) const ICON_WIDTH: u32 = 8;
pub(super) const ICON_HEIGHT: u32 = 8;

/// Directory of uploaded plugin icons
pub(super) const UPLOAD_DIR: &str = "/plugins";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct IconTextConfig {
    pub text: String,
}

/// Icon plus text layout, shared with the lamp variant
pub(super) struct IconTextParts {
    pub arena: WidgetArena,
    pub bitmap_id: WidgetId,
    pub text_id: WidgetId,
    icon_canvas: Option<Canvas>,
    text_canvas: Option<Canvas>,
    pub config: IconTextConfig,
    pub fs: Option<Arc<dyn FileSystem>>,
    upload_error: bool,
}

impl IconTextParts {
    pub fn new() -> Self {
        let mut arena = WidgetArena::new();
        let bitmap_id = arena.insert(BitmapWidget::new());
        let text_id = arena.insert(TextWidget::new(""));
        Self {
            arena,
            bitmap_id,
            text_id,
            icon_canvas: None,
            text_canvas: None,
            config: IconTextConfig::default(),
            fs: None,
            upload_error: false,
        }
    }

    pub fn icon_path(uid: u16) -> String {
        format!("{}/{}.png", UPLOAD_DIR, uid)
    }

    pub fn apply_config(&mut self) {
        let text = self.config.text.clone();
        if let Some(w) = self.arena.get_as_mut::<TextWidget>(self.text_id) {
            w.set_str(text);
        }
    }

    pub fn set_scroll_pause(&mut self, pause: Duration) {
        if let Some(w) = self.arena.get_as_mut::<TextWidget>(self.text_id) {
            w.set_scroll_pause(pause);
        }
    }

    /// Create the canvases on first activation; text area is `text_height` high
    pub fn build(&mut self, width: u32, text_height: u32, uid: u16) {
        if self.icon_canvas.is_none() {
            let mut canvas = Canvas::new(ICON_WIDTH, ICON_HEIGHT, 0, 0);
            canvas.add_widget(self.bitmap_id);
            self.icon_canvas = Some(canvas);
            // an icon may already be stored
            if let Err(e) = self.load_icon(uid) {
                info!("no icon for {}: {}", uid, e);
            }
        }
        if self.text_canvas.is_none() {
            let mut canvas = Canvas::new(width.saturating_sub(ICON_WIDTH), text_height, ICON_WIDTH as i32, 0);
            canvas.add_widget(self.text_id);
            // one line lower looks better next to the icon
            if let Some(w) = self.arena.get_mut(self.text_id) {
                w.move_to(0, 1);
            }
            self.text_canvas = Some(canvas);
        }
    }

    pub fn render(&mut self, gfx: &mut dyn Gfx) {
        gfx.fill_screen(Rgb888::BLACK);
        for canvas in [self.icon_canvas.as_ref(), self.text_canvas.as_ref()].into_iter().flatten() {
            canvas.update(&mut self.arena, gfx);
        }
    }

    pub fn load_icon(&mut self, uid: u16) -> Result<(), PluginError> {
        let fs = self.fs.clone().ok_or_else(|| PluginError::Upload("plugin not started".into()))?;
        let bitmap = self
            .arena
            .get_as_mut::<BitmapWidget>(self.bitmap_id)
            .ok_or_else(|| PluginError::Upload("icon widget missing".into()))?;
        bitmap.load(fs.as_ref(), &Self::icon_path(uid))?;
        Ok(())
    }

    pub fn upload(&mut self, uid: u16, chunk: &UploadChunk, fs: &dyn FileSystem) -> Result<(), PluginError> {
        let path = Self::icon_path(uid);
        if chunk.index == 0 {
            self.upload_error = false;
            if !chunk.filename.to_ascii_lowercase().ends_with(".png") {
                self.upload_error = true;
                error!("{} is not a PNG file", chunk.filename);
                return Err(PluginError::Upload("File is not a PNG file.".into()));
            }
            let result = if fs.exists(UPLOAD_DIR) { Ok(()) } else { fs.mkdir(UPLOAD_DIR) };
            if let Err(e) = result.and_then(|_| fs.write(&path, &chunk.data)) {
                self.upload_error = true;
                error!("couldn't create {}: {}", path, e);
                return Err(e.into());
            }
        } else if !self.upload_error {
            if let Err(e) = fs.append(&path, &chunk.data) {
                self.upload_error = true;
                error!("couldn't write {}: {}", path, e);
                return Err(e.into());
            }
        }
        if chunk.is_final && !self.upload_error {
            info!("upload of {} finished", chunk.filename);
        }
        Ok(())
    }

    /// Answer the POST that completes an icon upload
    pub fn serve_bitmap(&mut self, uid: u16, req: &dyn WebRequest) {
        if req.method() != Method::Post {
            send_json(req, status::NOT_FOUND, &rest_error("HTTP method not supported."));
        } else if self.upload_error {
            send_json(req, status::NOT_FOUND, &rest_error("Upload failed."));
        } else if self.load_icon(uid).is_err() {
            send_json(req, status::NOT_FOUND, &rest_error("Incompatible file format."));
        } else {
            send_json(req, status::OK, &rest_ok(serde_json::json!({})));
        }
    }

    pub fn start(&mut self, fs: &Arc<dyn FileSystem>, type_name: &str, uid: u16) {
        self.fs = Some(Arc::clone(fs));
        match config_store::load_or_create::<IconTextConfig>(fs.as_ref(), uid) {
            Ok(cfg) => {
                self.config = cfg;
                self.apply_config();
            }
            Err(e) => warn!("[{}/{}] configuration unavailable: {}", type_name, uid, e),
        }
    }

    pub fn set_text(&mut self, text: &str, type_name: &str, uid: u16) {
        self.config.text = text.to_string();
        self.apply_config();
        if let Some(fs) = self.fs.as_ref() {
            if let Err(e) = config_store::save(fs.as_ref(), uid, &self.config) {
                warn!("[{}/{}] text not persisted: {}", type_name, uid, e);
            }
        }
    }

    /// Drop the stored icon together with the configuration
    pub fn remove_icon(fs: &dyn FileSystem, uid: u16) {
        let path = Self::icon_path(uid);
        if fs.exists(&path) {
            if let Err(e) = fs.remove(&path) {
                warn!("couldn't remove {}: {}", path, e);
            }
        }
    }
}

pub struct IconTextPlugin {
    core: PluginCore,
    state: PluginLock<IconTextParts>,
}

impl IconTextPlugin {
    pub const TYPE_NAME: &'static str = "IconTextPlugin";

    pub fn new(uid: u16) -> Self {
        Self { core: PluginCore::new(Self::TYPE_NAME, uid), state: PluginLock::new(IconTextParts::new()) }
    }

    pub fn create(uid: u16) -> Arc<dyn Plugin> {
        Arc::new(Self::new(uid))
    }

    /// Set the icon from raw pixels, at most 8x8
    pub fn set_bitmap(&self, bitmap: &[Rgb888], width: u16, height: u16) -> Result<(), PluginError> {
        if width as u32 > ICON_WIDTH || height as u32 > ICON_HEIGHT {
            return Err(PluginError::Upload(format!("icon {}x{} too large", width, height)));
        }
        self.state.with(|s| match s.arena.get_as_mut::<BitmapWidget>(s.bitmap_id) {
            Some(b) => b.set(bitmap, width, height).map_err(PluginError::from),
            None => Ok(()),
        })
    }
}

impl Plugin for IconTextPlugin {
    fn core(&self) -> &PluginCore {
        &self.core
    }

    fn start(&self, fs: &Arc<dyn FileSystem>) {
        let uid = self.uid();
        self.state.with(|s| s.start(fs, Self::TYPE_NAME, uid));
    }

    fn stop(&self, fs: &dyn FileSystem) {
        if let Err(e) = config_store::remove(fs, self.uid()) {
            warn!("[{}/{}] configuration not removed: {}", Self::TYPE_NAME, self.uid(), e);
        }
        IconTextParts::remove_icon(fs, self.uid());
    }

    fn active(&self, gfx: &mut dyn Gfx) {
        let (w, h, uid) = (gfx.width(), gfx.height(), self.uid());
        self.state.with(|s| s.build(w, h, uid));
    }

    fn update(&self, gfx: &mut dyn Gfx) {
        self.state.with(|s| s.render(gfx));
    }

    fn web_request(&self, route: &str, req: &dyn WebRequest, _fs: &dyn FileSystem) -> bool {
        match route {
            "text" => text_route::serve(self, req),
            "bitmap" => {
                let uid = self.uid();
                self.state.with(|s| s.serve_bitmap(uid, req));
            }
            _ => return false,
        }
        true
    }

    fn web_upload(&self, route: &str, chunk: &UploadChunk, fs: &dyn FileSystem) -> Result<(), PluginError> {
        if route != "bitmap" {
            return Err(PluginError::UnknownRoute(route.to_string()));
        }
        let uid = self.uid();
        self.state.with(|s| s.upload(uid, chunk, fs))
    }

    fn set_scroll_pause(&self, pause: Duration) {
        self.state.with(|s| s.set_scroll_pause(pause));
    }

    fn as_text(&self) -> Option<&dyn TextPlugin> {
        Some(self)
    }
}

impl TextPlugin for IconTextPlugin {
    fn text(&self) -> String {
        self.state.read(|s| s.config.text.clone())
    }

    fn set_text(&self, text: &str) {
        let uid = self.uid();
        self.state.with(|s| s.set_text(text, Self::TYPE_NAME, uid));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemFs;
    use crate::gfx::FrameBuffer;
    use crate::web::{MemRequest, Method};
    use crate::widget::bitmap::tests::encode_png;

    fn chunk(name: &str, index: usize, data: &[u8], is_final: bool) -> UploadChunk {
        UploadChunk { filename: name.into(), index, data: data.to_vec(), is_final }
    }

    #[test]
    fn test_icon_upload_in_chunks() {
        let fs: Arc<dyn FileSystem> = Arc::new(MemFs::new());
        let plugin = IconTextPlugin::new(77);
        plugin.start(&fs);

        let png = encode_png(2, 2, &[255, 0, 0, 255, 0, 0, 255, 0, 0, 255, 0, 0]);
        let (a, b) = png.split_at(png.len() / 2);
        assert!(plugin.web_upload("bitmap", &chunk("red.png", 0, a, false), fs.as_ref()).is_ok());
        assert!(plugin.web_upload("bitmap", &chunk("red.png", a.len(), b, true), fs.as_ref()).is_ok());
        assert_eq!(fs.read("/plugins/77.png").unwrap(), png);

        let req = MemRequest::new(Method::Post, "/bitmap");
        assert!(plugin.web_request("bitmap", &req, fs.as_ref()));
        assert_eq!(req.last_reply().map(|r| r.status), Some(200));

        let mut fb = FrameBuffer::new(32, 8);
        plugin.active(&mut fb);
        plugin.update(&mut fb);
        assert_eq!(fb.get_pixel(0, 0), Some(Rgb888::RED));
    }

    #[test]
    fn test_non_png_upload_rejected() {
        let fs: Arc<dyn FileSystem> = Arc::new(MemFs::new());
        let plugin = IconTextPlugin::new(5);
        plugin.start(&fs);
        assert!(plugin.web_upload("bitmap", &chunk("x.bmp", 0, b"BM", true), fs.as_ref()).is_err());
        let req = MemRequest::new(Method::Post, "/bitmap");
        plugin.web_request("bitmap", &req, fs.as_ref());
        assert!(req.last_reply().map(|r| r.body.contains("Upload failed.")).unwrap_or(false));
    }

    #[test]
    fn test_stop_removes_files() {
        let fs: Arc<dyn FileSystem> = Arc::new(MemFs::new());
        let plugin = IconTextPlugin::new(8);
        plugin.start(&fs);
        plugin.set_text("hi");
        assert!(fs.exists("/configuration/8.json"));
        plugin.stop(fs.as_ref());
        assert!(!fs.exists("/configuration/8.json"));
    }

    #[test]
    fn test_oversized_bitmap_rejected() {
        let plugin = IconTextPlugin::new(1);
        let pixels = vec![Rgb888::BLUE; 9 * 9];
        assert!(plugin.set_bitmap(&pixels, 9, 9).is_err());
        assert!(plugin.set_bitmap(&pixels[..64], 8, 8).is_ok());
    }
}
