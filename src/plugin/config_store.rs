/*
 *  plugin/config_store.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Plugin configuration files keyed by plugin uid
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

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::PluginError;
use crate::fs::{FileSystem, FsError};

pub const CONFIG_DIR: &str = "/configuration";

/// Configuration file path of a plugin instance
pub fn config_path(uid: u16) -> String {
    format!("{}/{}.json", CONFIG_DIR, uid)
}

/// Load the configuration, creating and storing the default if absent
///
/// An existing file is always reused, so repeated starts see the values of
/// the first one. An unreadable file is replaced by the default.
pub fn load_or_create<T>(fs: &dyn FileSystem, uid: u16) -> Result<T, PluginError>
where
    T: Serialize + DeserializeOwned + Default,
{
    let path = config_path(uid);
    match fs.read(&path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(cfg) => Ok(cfg),
            Err(e) => {
                warn!("{} is malformed ({}), restoring default", path, e);
                let cfg = T::default();
                save(fs, uid, &cfg)?;
                Ok(cfg)
            }
        },
        Err(FsError::NotFound(_)) => {
            info!("{} not found, creating default", path);
            let cfg = T::default();
            save(fs, uid, &cfg)?;
            Ok(cfg)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn save<T: Serialize>(fs: &dyn FileSystem, uid: u16, cfg: &T) -> Result<(), PluginError> {
    if !fs.exists(CONFIG_DIR) {
        fs.mkdir(CONFIG_DIR)?;
    }
    let json = serde_json::to_vec_pretty(cfg)?;
    fs.write(&config_path(uid), &json)?;
    Ok(())
}

/// Delete the configuration; a missing file is not an error
pub fn remove(fs: &dyn FileSystem, uid: u16) -> Result<(), PluginError> {
    match fs.remove(&config_path(uid)) {
        Ok(()) | Err(FsError::NotFound(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemFs;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Cfg {
        text: String,
        count: u32,
    }

    #[test]
    fn test_default_created_once() {
        let fs = MemFs::new();
        let cfg: Cfg = load_or_create(&fs, 42).unwrap();
        assert_eq!(cfg, Cfg::default());
        assert!(fs.exists("/configuration/42.json"));

        let changed = Cfg { text: "kept".into(), count: 3 };
        save(&fs, 42, &changed).unwrap();
        let again: Cfg = load_or_create(&fs, 42).unwrap();
        assert_eq!(again, changed);
    }

    #[test]
    fn test_malformed_is_replaced() {
        let fs = MemFs::new();
        fs.mkdir(CONFIG_DIR).unwrap();
        fs.write("/configuration/7.json", b"{oops").unwrap();
        let cfg: Cfg = load_or_create(&fs, 7).unwrap();
        assert_eq!(cfg, Cfg::default());
        let stored: Cfg = serde_json::from_slice(&fs.read("/configuration/7.json").unwrap()).unwrap();
        assert_eq!(stored, Cfg::default());
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let fs = MemFs::new();
        assert!(remove(&fs, 1).is_ok());
    }
}
