/*
 *  services.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Service objects handed to the state machine and the web handlers
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
use thiserror::Error;

use crate::display::{DisplayMgr, LedMatrix, MockMatrix, SchedulerConfig};
use crate::fs::{FileSystem, MemFs};
use crate::hal::{Board, Button, MockBoard, MockButton, MockWifi, Wifi};
use crate::plugin::{PluginMgr, PluginRegistry};
use crate::queue::DEFAULT_TIMEOUT;
use crate::settings::{KeyValueStore, MemStore, Settings};
use crate::update::{MockUpdater, UpdateMgr, Updater};
use crate::web::{DeferredSurface, RecordingSink, SocketSink};

pub type Surface = Arc<DeferredSurface<Services>>;

/// Default queue depth of each surface
pub const DEFAULT_QUEUE_CAPACITY: usize = 20;

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error("{0} queue: {1}")]
    Queue(&'static str, String),
}

/// One queue per network surface
#[derive(Clone)]
pub struct WebSurfaces {
    pub pages: Surface,
    pub socket: Surface,
    pub captive: Surface,
}

impl WebSurfaces {
    pub fn new(capacity: usize, timeout: Duration) -> Result<Self, ServicesError> {
        let surface = |name: &'static str| {
            DeferredSurface::new(name, capacity, timeout)
                .map(Arc::new)
                .map_err(|e| ServicesError::Queue(name, e.to_string()))
        };
        Ok(Self { pages: surface("pages")?, socket: surface("websocket")?, captive: surface("captive")? })
    }
}

/// Everything the main loop owns
///
/// Built once at startup and passed by reference; there are no global
/// accessors. Web handlers receive it mutably when the main loop executes
/// them.
pub struct Services {
    pub display: DisplayMgr,
    pub plugins: PluginMgr,
    pub store: Arc<dyn KeyValueStore>,
    pub settings: Settings,
    pub fs: Arc<dyn FileSystem>,
    pub update: UpdateMgr,
    pub wifi: Box<dyn Wifi>,
    pub button: Box<dyn Button>,
    pub board: Box<dyn Board>,
    pub web: WebSurfaces,
    pub socket_out: Arc<dyn SocketSink>,
}

/// Assembles [`Services`]; every collaborator not given is an in-memory fake
pub struct ServicesBuilder {
    matrix: Box<dyn LedMatrix>,
    scheduler: SchedulerConfig,
    registry: PluginRegistry,
    fs: Arc<dyn FileSystem>,
    store: Arc<dyn KeyValueStore>,
    updater: Box<dyn Updater>,
    wifi: Box<dyn Wifi>,
    button: Box<dyn Button>,
    board: Box<dyn Board>,
    socket_out: Arc<dyn SocketSink>,
    queue_capacity: usize,
    queue_timeout: Duration,
}

impl Default for ServicesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServicesBuilder {
    pub fn new() -> Self {
        Self {
            matrix: Box::new(MockMatrix::new(32, 8)),
            scheduler: SchedulerConfig::default(),
            registry: PluginRegistry::with_builtins(),
            fs: Arc::new(MemFs::new()),
            store: Arc::new(MemStore::new()),
            updater: Box::new(MockUpdater::new()),
            wifi: Box::new(MockWifi::new(true)),
            button: Box::new(MockButton::default()),
            board: Box::new(MockBoard::new()),
            socket_out: Arc::new(RecordingSink::new()),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            queue_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn matrix(mut self, matrix: Box<dyn LedMatrix>) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = store;
        self
    }

    pub fn updater(mut self, updater: Box<dyn Updater>) -> Self {
        self.updater = updater;
        self
    }

    pub fn wifi(mut self, wifi: Box<dyn Wifi>) -> Self {
        self.wifi = wifi;
        self
    }

    pub fn button(mut self, button: Box<dyn Button>) -> Self {
        self.button = button;
        self
    }

    pub fn board(mut self, board: Box<dyn Board>) -> Self {
        self.board = board;
        self
    }

    pub fn socket_out(mut self, sink: Arc<dyn SocketSink>) -> Self {
        self.socket_out = sink;
        self
    }

    pub fn queue(mut self, capacity: usize, timeout: Duration) -> Self {
        self.queue_capacity = capacity;
        self.queue_timeout = timeout;
        self
    }

    /// Stored settings are loaded here; the stored slot count wins over
    /// the scheduler configuration when present.
    pub fn build(mut self) -> Result<Services, ServicesError> {
        let settings = Settings::load(self.store.as_ref());
        if self.store.get(crate::settings::KEY_SETTINGS).is_some() {
            self.scheduler.slots = settings.max_slots as usize;
        }
        let web = WebSurfaces::new(self.queue_capacity, self.queue_timeout)?;
        let mut services = Services {
            display: DisplayMgr::new(self.matrix, &self.scheduler),
            plugins: PluginMgr::new(self.registry, Arc::clone(&self.fs), Arc::clone(&self.store)),
            store: self.store,
            settings,
            fs: self.fs,
            update: UpdateMgr::new(self.updater),
            wifi: self.wifi,
            button: self.button,
            board: self.board,
            web,
            socket_out: self.socket_out,
        };
        services.apply_scroll_pause();
        Ok(services)
    }
}

impl Services {
    /// Push the stored scroll pause to every text scrolling plugin
    pub fn apply_scroll_pause(&mut self) {
        let pause = Duration::from_millis(u64::from(self.settings.scroll_pause));
        self.plugins.set_scroll_pause(pause);
        self.display.set_scroll_pause(pause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            ServicesBuilder::new().queue(0, DEFAULT_TIMEOUT).build(),
            Err(ServicesError::Queue("pages", _))
        ));
    }

    #[test]
    fn test_stored_slot_count_wins() {
        let store = Arc::new(MemStore::new());
        let settings = Settings { max_slots: 3, ..Settings::default() };
        assert!(settings.save(store.as_ref()).is_ok());
        let Ok(services) = ServicesBuilder::new().store(store).build() else {
            panic!("build failed");
        };
        assert_eq!(services.display.slot_count(), 3);
    }

    #[test]
    fn test_stored_scroll_pause_reaches_plugins() {
        let store = Arc::new(MemStore::new());
        let settings = Settings { scroll_pause: 250, ..Settings::default() };
        assert!(settings.save(store.as_ref()).is_ok());
        let Ok(services) = ServicesBuilder::new().store(store).build() else {
            panic!("build failed");
        };
        assert_eq!(services.plugins.scroll_pause(), Duration::from_millis(250));
    }
}
