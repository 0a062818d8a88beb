/*
 *  plugin/registry.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Plugin type registry - type name to factory
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

use std::collections::BTreeMap;
use std::sync::Arc;

use super::plugins::{DateTimePlugin, IconTextLampPlugin, IconTextPlugin, JustTextPlugin};
use super::{Plugin, PluginError};

/// Creates a plugin instance for a given uid
pub type PluginFactory = fn(uid: u16) -> Arc<dyn Plugin>;

/// Installable plugin types
#[derive(Default, Clone)]
pub struct PluginRegistry {
    factories: BTreeMap<&'static str, PluginFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in plugin type
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(JustTextPlugin::TYPE_NAME, JustTextPlugin::create);
        registry.register(IconTextPlugin::TYPE_NAME, IconTextPlugin::create);
        registry.register(IconTextLampPlugin::TYPE_NAME, IconTextLampPlugin::create);
        registry.register(DateTimePlugin::TYPE_NAME, DateTimePlugin::create);
        registry
    }

    /// Add a type; false if the name is already taken
    pub fn register(&mut self, type_name: &'static str, factory: PluginFactory) -> bool {
        if self.factories.contains_key(type_name) {
            log::warn!("plugin type {} registered twice", type_name);
            return false;
        }
        self.factories.insert(type_name, factory);
        true
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    pub fn create(&self, type_name: &str, uid: u16) -> Result<Arc<dyn Plugin>, PluginError> {
        self.factories
            .get(type_name)
            .map(|factory| factory(uid))
            .ok_or_else(|| PluginError::NotFound(type_name.to_string()))
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_create_with_uid() {
        let registry = PluginRegistry::with_builtins();
        assert!(registry.contains("JustTextPlugin"));
        let plugin = registry.create("IconTextPlugin", 1234).unwrap();
        assert_eq!(plugin.uid(), 1234);
        assert_eq!(plugin.type_name(), "IconTextPlugin");
    }

    #[test]
    fn test_unknown_type() {
        let registry = PluginRegistry::with_builtins();
        assert!(matches!(registry.create("FlappyPlugin", 1), Err(PluginError::NotFound(_))));
    }

    #[test]
    fn test_duplicate_register_rejected() {
        let mut registry = PluginRegistry::new();
        assert!(registry.register("JustTextPlugin", JustTextPlugin::create));
        assert!(!registry.register("JustTextPlugin", IconTextPlugin::create));
        assert_eq!(registry.type_names(), vec!["JustTextPlugin"]);
    }
}
