/*
 *  settings.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Device settings on top of an opaque key/value store
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
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use log::warn;

use crate::fs::{FileSystem, FsError};

/// Store key of the device settings document
pub const KEY_SETTINGS: &str = "settings";

/// Store key of the plugin install list
pub const KEY_PLUGIN_INSTALL: &str = "plugin_install";

#[derive(Debug, Error)]
pub enum SettingsError {
    /// Rejected value, the message is user facing
    #[error("{0}")]
    Invalid(String),

    #[error("Unknown key {0}.")]
    UnknownKey(String),

    #[error("store failure: {0}")]
    Store(String),

    #[error("settings encoding: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<FsError> for SettingsError {
    fn from(e: FsError) -> Self {
        SettingsError::Store(e.to_string())
    }
}

/// Opaque persistent key/value capability
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;
    fn remove(&self, key: &str) -> Result<(), SettingsError>;
}

/// Volatile store, used in tests and as fallback
#[derive(Default)]
pub struct MemStore {
    map: Mutex<BTreeMap<String, String>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.map.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SettingsError> {
        self.map.lock().remove(key);
        Ok(())
    }
}

/// One file per key below `/settings`
pub struct FsStore {
    fs: Arc<dyn FileSystem>,
}

impl FsStore {
    const DIR: &'static str = "/settings";

    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    fn path(key: &str) -> String {
        format!("{}/{}", Self::DIR, key)
    }
}

impl KeyValueStore for FsStore {
    fn get(&self, key: &str) -> Option<String> {
        let bytes = self.fs.read(&Self::path(key)).ok()?;
        String::from_utf8(bytes).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        if !self.fs.exists(Self::DIR) {
            self.fs.mkdir(Self::DIR)?;
        }
        self.fs.write(&Self::path(key), value.as_bytes())?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SettingsError> {
        match self.fs.remove(&Self::path(key)) {
            Ok(()) | Err(FsError::NotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Persistent device settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub hostname: String,
    pub wifi_ssid: String,
    pub wifi_passphrase: String,
    pub ap_ssid: String,
    pub ap_passphrase: String,
    pub max_slots: u8,
    /// Text scroll pause in ms
    pub scroll_pause: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hostname: "pixslot".to_string(),
            wifi_ssid: String::new(),
            wifi_passphrase: String::new(),
            ap_ssid: "pixslot".to_string(),
            ap_passphrase: "worththesqueeze".to_string(),
            max_slots: 6,
            scroll_pause: 80,
        }
    }
}

const HOSTNAME_LEN: (usize, usize) = (1, 63);
const SSID_LEN: (usize, usize) = (1, 32);
const PASSPHRASE_LEN: (usize, usize) = (8, 63);
pub const SLOTS_RANGE: (u8, u8) = (1, 16);
const SCROLL_PAUSE_RANGE: (u32, u32) = (20, 10_000);

impl Settings {
    /// Keys accepted by [`Settings::apply`]
    pub const KEYS: [&'static str; 7] = [
        "hostname",
        "wifi_ssid",
        "wifi_passphrase",
        "ap_ssid",
        "ap_passphrase",
        "max_slots",
        "scroll_pause",
    ];

    /// Load from the store, defaults if missing or unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let Some(raw) = store.get(KEY_SETTINGS) else {
            return Self::default();
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("stored settings unreadable, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), SettingsError> {
        store.set(KEY_SETTINGS, &serde_json::to_string(self)?)
    }

    /// Validate and set a single value given as text
    ///
    /// Nothing is changed if the value is rejected.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        match key {
            "hostname" => {
                check_len(value, HOSTNAME_LEN)?;
                if !is_valid_hostname(value) {
                    return Err(SettingsError::Invalid("Invalid hostname.".to_string()));
                }
                self.hostname = value.to_string();
            }
            "wifi_ssid" => {
                check_len(value, SSID_LEN)?;
                self.wifi_ssid = value.to_string();
            }
            "wifi_passphrase" => {
                check_passphrase(value)?;
                self.wifi_passphrase = value.to_string();
            }
            "ap_ssid" => {
                check_len(value, SSID_LEN)?;
                self.ap_ssid = value.to_string();
            }
            "ap_passphrase" => {
                check_len(value, PASSPHRASE_LEN)?;
                self.ap_passphrase = value.to_string();
            }
            "max_slots" => {
                self.max_slots = parse_in_range(value, SLOTS_RANGE)?;
            }
            "scroll_pause" => {
                self.scroll_pause = parse_in_range(value, SCROLL_PAUSE_RANGE)?;
            }
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Value of a key as text, None for unknown keys
    pub fn value(&self, key: &str) -> Option<String> {
        let value = match key {
            "hostname" => self.hostname.clone(),
            "wifi_ssid" => self.wifi_ssid.clone(),
            "wifi_passphrase" => self.wifi_passphrase.clone(),
            "ap_ssid" => self.ap_ssid.clone(),
            "ap_passphrase" => self.ap_passphrase.clone(),
            "max_slots" => self.max_slots.to_string(),
            "scroll_pause" => self.scroll_pause.to_string(),
            _ => return None,
        };
        Some(value)
    }

    pub fn has_wifi_credentials(&self) -> bool {
        !self.wifi_ssid.is_empty()
    }
}

/// Hostname check per RFC 952
///
/// Letters, digits and '-' only; must start with a letter and must not end
/// with '-'.
pub fn is_valid_hostname(hostname: &str) -> bool {
    let bytes = hostname.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    bytes.len() <= HOSTNAME_LEN.1
        && first.is_ascii_alphabetic()
        && *last != b'-'
        && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
}

fn check_len(value: &str, (min, max): (usize, usize)) -> Result<(), SettingsError> {
    if value.len() < min {
        Err(SettingsError::Invalid(format!("String length lower than {}.", min)))
    } else if value.len() > max {
        Err(SettingsError::Invalid(format!("String length greater than {}.", max)))
    } else {
        Ok(())
    }
}

/// An empty passphrase selects an open network
fn check_passphrase(value: &str) -> Result<(), SettingsError> {
    if value.is_empty() {
        Ok(())
    } else {
        check_len(value, PASSPHRASE_LEN)
    }
}

fn parse_in_range<T>(value: &str, (min, max): (T, T)) -> Result<T, SettingsError>
where
    T: std::str::FromStr + PartialOrd + std::fmt::Display,
{
    let parsed: T = value
        .trim()
        .parse()
        .map_err(|_| SettingsError::Invalid("Invalid value.".to_string()))?;
    if parsed < min {
        Err(SettingsError::Invalid(format!("Value lower than {}.", min)))
    } else if parsed > max {
        Err(SettingsError::Invalid(format!("Value greater than {}.", max)))
    } else {
        Ok(parsed)
    }
}
