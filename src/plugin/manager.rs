/*
 *  plugin/manager.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Plugin manager - install, uninstall and the persisted install list
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

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use super::registry::PluginRegistry;
use super::{tag, Plugin, PluginError};
use crate::display::{DisplayError, DisplayMgr};
use crate::fs::FileSystem;
use crate::settings::{KeyValueStore, KEY_PLUGIN_INSTALL};
use crate::widget::TextWidget;

/// One element of the persisted install list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallEntry {
    pub slot: usize,
    pub name: String,
    pub uid: u16,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
}

struct Installed {
    entry: InstallEntry,
    plugin: Arc<dyn Plugin>,
}

pub struct PluginMgr {
    registry: PluginRegistry,
    fs: Arc<dyn FileSystem>,
    store: Arc<dyn KeyValueStore>,
    installed: Vec<Installed>,
    /// Every uid handed out since boot, never reused
    issued: HashSet<u16>,
    scroll_pause: Duration,
}

impl PluginMgr {
    pub fn new(registry: PluginRegistry, fs: Arc<dyn FileSystem>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            registry,
            fs,
            store,
            installed: Vec::new(),
            issued: HashSet::new(),
            scroll_pause: TextWidget::DEFAULT_SCROLL_PAUSE,
        }
    }

    pub fn scroll_pause(&self) -> Duration {
        self.scroll_pause
    }

    /// Text scroll pause for every installed and every later plugin
    pub fn set_scroll_pause(&mut self, pause: Duration) {
        self.scroll_pause = pause;
        for installed in &self.installed {
            installed.plugin.set_scroll_pause(pause);
        }
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.installed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }

    pub fn find(&self, uid: u16) -> Option<Arc<dyn Plugin>> {
        self.installed.iter().find(|i| i.entry.uid == uid).map(|i| Arc::clone(&i.plugin))
    }

    /// Install list as persisted
    pub fn entries(&self) -> Vec<InstallEntry> {
        self.installed.iter().map(|i| i.entry.clone()).collect()
    }

    /// Create, start and place a plugin; returns its uid
    ///
    /// An unknown type leaves the install list untouched.
    pub fn install(&mut self, display: &mut DisplayMgr, type_name: &str, slot: Option<usize>) -> Result<u16, PluginError> {
        if !self.registry.contains(type_name) {
            error!("plugin type {} not found", type_name);
            return Err(PluginError::NotFound(type_name.to_string()));
        }
        let slot = Self::target_slot(display, slot)?;
        let uid = self.generate_uid();
        let plugin = self.registry.create(type_name, uid)?;
        self.issued.insert(uid);

        plugin.set_scroll_pause(self.scroll_pause);
        plugin.start(&self.fs);
        if let Err(e) = display.install_plugin(Arc::clone(&plugin), Some(slot)) {
            plugin.stop(self.fs.as_ref());
            return Err(e.into());
        }
        self.installed.push(Installed {
            entry: InstallEntry { slot, name: type_name.to_string(), uid, alias: String::new() },
            plugin,
        });
        self.save_list();
        Ok(uid)
    }

    /// Remove a plugin from its slot and delete its configuration
    pub fn uninstall(&mut self, display: &mut DisplayMgr, uid: u16) -> Result<(), PluginError> {
        let idx = self
            .installed
            .iter()
            .position(|i| i.entry.uid == uid)
            .ok_or(PluginError::UnknownUid(uid))?;
        let removed = self.installed.remove(idx);
        display.uninstall_plugin(uid);
        removed.plugin.stop(self.fs.as_ref());
        info!("{} uninstalled", tag(removed.plugin.as_ref()));
        self.save_list();
        Ok(())
    }

    pub fn set_alias(&mut self, uid: u16, alias: &str) -> Result<(), PluginError> {
        let installed = self
            .installed
            .iter_mut()
            .find(|i| i.entry.uid == uid)
            .ok_or(PluginError::UnknownUid(uid))?;
        installed.plugin.set_alias(alias);
        installed.entry.alias = alias.to_string();
        self.save_list();
        Ok(())
    }

    /// Rebuild the installed plugins from the persisted list
    ///
    /// Bad entries are skipped. Returns the number of plugins loaded.
    pub fn load(&mut self, display: &mut DisplayMgr) -> usize {
        let Some(raw) = self.store.get(KEY_PLUGIN_INSTALL) else {
            info!("no plugins installed");
            return 0;
        };
        let items: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!("install list unreadable, ignored: {}", e);
                return 0;
            }
        };

        let mut loaded = 0;
        for item in items {
            let entry: InstallEntry = match serde_json::from_value(item) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("install entry skipped: {}", e);
                    continue;
                }
            };
            if self.installed.iter().any(|i| i.entry.uid == entry.uid) {
                warn!("install entry skipped, uid {} used twice", entry.uid);
                continue;
            }
            let plugin = match self.registry.create(&entry.name, entry.uid) {
                Ok(plugin) => plugin,
                Err(e) => {
                    warn!("install entry skipped: {}", e);
                    continue;
                }
            };
            let slot = match Self::target_slot(display, Some(entry.slot)) {
                Ok(slot) => slot,
                Err(e) => {
                    warn!("install entry {}/{} skipped: {}", entry.name, entry.uid, e);
                    continue;
                }
            };
            self.issued.insert(entry.uid);
            if !entry.alias.is_empty() {
                plugin.set_alias(&entry.alias);
            }
            plugin.set_scroll_pause(self.scroll_pause);
            plugin.start(&self.fs);
            if let Err(e) = display.install_plugin(Arc::clone(&plugin), Some(slot)) {
                warn!("{} not placed: {}", tag(plugin.as_ref()), e);
                continue;
            }
            self.installed.push(Installed { entry, plugin });
            loaded += 1;
        }
        info!("{} plugin(s) loaded", loaded);
        loaded
    }

    fn target_slot(display: &DisplayMgr, slot: Option<usize>) -> Result<usize, DisplayError> {
        match slot {
            Some(idx) if idx >= display.slot_count() => Err(DisplayError::InvalidSlot(idx)),
            Some(idx) if !display.is_slot_empty(idx) => Err(DisplayError::SlotOccupied(idx)),
            Some(idx) => Ok(idx),
            None => display.find_empty_slot().ok_or(DisplayError::NoFreeSlot),
        }
    }

    fn generate_uid(&self) -> u16 {
        loop {
            // 0 belongs to the system message
            let uid = rand::random::<u16>();
            if uid != 0 && !self.issued.contains(&uid) && !self.installed.iter().any(|i| i.entry.uid == uid) {
                return uid;
            }
        }
    }

    fn save_list(&self) {
        let entries = self.entries();
        let result = serde_json::to_string(&entries)
            .map_err(PluginError::from)
            .and_then(|json| self.store.set(KEY_PLUGIN_INSTALL, &json).map_err(PluginError::from));
        if let Err(e) = result {
            error!("install list not saved: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{MockMatrix, SchedulerConfig};
    use crate::fs::MemFs;
    use crate::plugin::config_store;
    use crate::plugin::plugins::JustTextPlugin;
    use crate::settings::MemStore;

    fn setup() -> (PluginMgr, DisplayMgr, Arc<MemStore>, Arc<MemFs>) {
        let fs = Arc::new(MemFs::new());
        let store = Arc::new(MemStore::new());
        let mgr = PluginMgr::new(PluginRegistry::with_builtins(), fs.clone(), store.clone());
        let display = DisplayMgr::new(Box::new(MockMatrix::new(32, 8)), &SchedulerConfig::default());
        (mgr, display, store, fs)
    }

    #[test]
    fn test_unknown_type_leaves_list_untouched() {
        let (mut mgr, mut display, store, _fs) = setup();
        assert!(mgr.install(&mut display, JustTextPlugin::TYPE_NAME, None).is_ok());
        let before = store.get(KEY_PLUGIN_INSTALL);
        assert!(matches!(mgr.install(&mut display, "NoSuchPlugin", None), Err(PluginError::NotFound(_))));
        assert_eq!(store.get(KEY_PLUGIN_INSTALL), before);
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn test_uids_are_unique() {
        let (mut mgr, mut display, _store, _fs) = setup();
        let mut seen = HashSet::new();
        for _ in 0..6 {
            let uid = mgr.install(&mut display, JustTextPlugin::TYPE_NAME, None).ok();
            assert!(uid.is_some_and(|uid| seen.insert(uid)));
        }
        // all slots taken
        assert!(matches!(
            mgr.install(&mut display, JustTextPlugin::TYPE_NAME, None),
            Err(PluginError::Display(DisplayError::NoFreeSlot))
        ));
    }

    #[test]
    fn test_uninstall_removes_config_and_entry() {
        let (mut mgr, mut display, store, fs) = setup();
        let Ok(uid) = mgr.install(&mut display, JustTextPlugin::TYPE_NAME, Some(2)) else {
            panic!("install failed");
        };
        assert!(fs.exists(&config_store::config_path(uid)));
        assert!(mgr.uninstall(&mut display, uid).is_ok());
        assert!(!fs.exists(&config_store::config_path(uid)));
        assert!(display.is_slot_empty(2));
        assert_eq!(store.get(KEY_PLUGIN_INSTALL).as_deref(), Some("[]"));
        assert!(matches!(mgr.uninstall(&mut display, uid), Err(PluginError::UnknownUid(_))));
    }

    #[test]
    fn test_load_skips_bad_entries() {
        let (mut mgr, mut display, store, _fs) = setup();
        let list = r#"[
            {"slot":0,"name":"JustTextPlugin","uid":11},
            {"slot":1,"name":"GhostPlugin","uid":12},
            {"slot":"x"},
            {"slot":1,"name":"DateTimePlugin","uid":11},
            {"slot":3,"name":"DateTimePlugin","uid":13,"alias":"clock"}
        ]"#;
        assert!(store.set(KEY_PLUGIN_INSTALL, list).is_ok());
        assert_eq!(mgr.load(&mut display), 2);
        assert!(mgr.find(11).is_some());
        assert_eq!(mgr.find(13).map(|p| p.alias()), Some("clock".to_string()));
        assert_eq!(display.slot_of(13), Some(3));
    }

    #[test]
    fn test_load_garbage_list() {
        let (mut mgr, mut display, store, _fs) = setup();
        assert!(store.set(KEY_PLUGIN_INSTALL, "not json").is_ok());
        assert_eq!(mgr.load(&mut display), 0);
    }
}
