/*
 *  plugin/mod.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Plugin trait, errors and shared plugin plumbing
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

//! Plugins - independently configurable content providers
//!
//! A plugin is installed into a display slot, started once (which loads or
//! creates its configuration), then toggled between active and inactive as
//! the scheduler rotates. All methods take `&self`: mutable state sits
//! behind the plugin's own [`PluginLock`] because the same instance is
//! reached from the render loop, from deferred web handlers and from
//! background completion callbacks.

pub mod config_store;
pub mod lock;
pub mod manager;
pub mod plugins;
pub mod registry;

use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;
use thiserror::Error;

use crate::display::DisplayError;
use crate::fs::{FileSystem, FsError};
use crate::gfx::{Gfx, GfxError};
use crate::settings::SettingsError;
use crate::web::{UploadChunk, WebRequest};

pub use lock::PluginLock;
pub use manager::{InstallEntry, PluginMgr};
pub use registry::{PluginFactory, PluginRegistry};

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin type {0} not found")]
    NotFound(String),

    #[error("no plugin with uid {0}")]
    UnknownUid(u16),

    #[error("no route {0}")]
    UnknownRoute(String),

    #[error("invalid upload: {0}")]
    Upload(String),

    #[error(transparent)]
    Display(#[from] DisplayError),

    #[error("filesystem: {0}")]
    Fs(#[from] FsError),

    #[error("configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("install list: {0}")]
    Store(#[from] SettingsError),

    #[error("image: {0}")]
    Image(#[from] GfxError),
}

/// Identity shared by every plugin instance
#[derive(Debug)]
pub struct PluginCore {
    type_name: &'static str,
    uid: u16,
    alias: Mutex<String>,
}

impl PluginCore {
    pub fn new(type_name: &'static str, uid: u16) -> Self {
        Self { type_name, uid, alias: Mutex::new(String::new()) }
    }
}

/// Content provider hosted by a display slot
pub trait Plugin: Send + Sync {
    fn core(&self) -> &PluginCore;

    fn type_name(&self) -> &'static str {
        self.core().type_name
    }

    fn uid(&self) -> u16 {
        self.core().uid
    }

    /// User given name, empty if none
    fn alias(&self) -> String {
        self.core().alias.lock().clone()
    }

    fn set_alias(&self, alias: &str) {
        *self.core().alias.lock() = alias.to_string();
    }

    /// Called once after install or boot, loads or creates the configuration
    fn start(&self, _fs: &Arc<dyn FileSystem>) {}

    /// Called once before uninstall, removes the configuration
    fn stop(&self, fs: &dyn FileSystem) {
        if let Err(e) = config_store::remove(fs, self.uid()) {
            log::warn!("[{}/{}] configuration not removed: {}", self.type_name(), self.uid(), e);
        }
    }

    /// The plugin goes on screen; `gfx` describes the slot surface
    fn active(&self, _gfx: &mut dyn Gfx) {}

    /// The plugin left the screen
    fn inactive(&self) {}

    /// Periodic housekeeping, called every tick whether on screen or not
    fn process(&self) {}

    /// Time between two scroll steps of text wider than the slot
    fn set_scroll_pause(&self, _pause: Duration) {}

    /// Render the plugin content into the slot surface
    fn update(&self, gfx: &mut dyn Gfx);

    /// Serve a plugin specific REST route; false if the route is unknown
    fn web_request(&self, _route: &str, _req: &dyn WebRequest, _fs: &dyn FileSystem) -> bool {
        false
    }

    /// Accept a chunk of a file uploaded to a plugin route
    fn web_upload(&self, route: &str, _chunk: &UploadChunk, _fs: &dyn FileSystem) -> Result<(), PluginError> {
        Err(PluginError::UnknownRoute(route.to_string()))
    }

    /// Text capability, used by the websocket TEXT command
    fn as_text(&self) -> Option<&dyn TextPlugin> {
        None
    }
}

/// Plugins showing a user settable text
pub trait TextPlugin {
    fn text(&self) -> String;
    fn set_text(&self, text: &str);
}

/// Log prefix of a plugin, `[<type>/<uid>]`
pub(crate) fn tag(plugin: &dyn Plugin) -> String {
    format!("[{}/{}]", plugin.type_name(), plugin.uid())
}
