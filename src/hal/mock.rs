/*
 *  hal/mock.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Scriptable board collaborators for tests
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

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use parking_lot::Mutex;

use super::{Board, Button, ButtonState, HalError, Wifi};

#[derive(Debug, Default)]
pub struct MockWifiState {
    pub connected: bool,
    /// Connect succeeds immediately when set
    pub auto_connect: bool,
    pub connect_calls: usize,
    pub ap_ssid: Option<String>,
    pub sta_ssid: Option<String>,
    pub hostname: String,
}

#[derive(Clone, Default)]
pub struct MockWifi {
    state: Arc<Mutex<MockWifiState>>,
}

impl MockWifi {
    pub fn new(auto_connect: bool) -> Self {
        let wifi = Self::default();
        wifi.state.lock().auto_connect = auto_connect;
        wifi
    }

    pub fn state(&self) -> Arc<Mutex<MockWifiState>> {
        Arc::clone(&self.state)
    }
}

impl Wifi for MockWifi {
    fn start_ap(&mut self, ssid: &str, _passphrase: &str) -> Result<(), HalError> {
        self.state.lock().ap_ssid = Some(ssid.to_string());
        Ok(())
    }

    fn connect(&mut self, ssid: &str, _passphrase: &str) -> Result<(), HalError> {
        let mut state = self.state.lock();
        state.connect_calls += 1;
        state.sta_ssid = Some(ssid.to_string());
        if state.auto_connect {
            state.connected = true;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn disconnect(&mut self) {
        self.state.lock().connected = false;
    }

    fn set_hostname(&mut self, hostname: &str) {
        self.state.lock().hostname = hostname.to_string();
    }

    fn hostname(&self) -> String {
        self.state.lock().hostname.clone()
    }

    fn ip(&self) -> Option<IpAddr> {
        let state = self.state.lock();
        if state.connected {
            Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 42)))
        } else if state.ap_ssid.is_some() {
            Some(IpAddr::V4(Ipv4Addr::new(192, 168, 4, 1)))
        } else {
            None
        }
    }

    fn mac(&self) -> Option<String> {
        Some("02:00:00:00:00:01".to_string())
    }
}

/// Replays a script of states, then stays at the last one
#[derive(Clone, Default)]
pub struct MockButton {
    script: Arc<Mutex<VecDeque<ButtonState>>>,
}

impl MockButton {
    pub fn new(states: &[ButtonState]) -> Self {
        Self { script: Arc::new(Mutex::new(states.iter().copied().collect())) }
    }

    pub fn push(&self, state: ButtonState) {
        self.script.lock().push_back(state);
    }
}

impl Button for MockButton {
    fn state(&mut self) -> ButtonState {
        let mut script = self.script.lock();
        if script.len() > 1 {
            script.pop_front().unwrap_or(ButtonState::Released)
        } else {
            script.front().copied().unwrap_or(ButtonState::Released)
        }
    }
}

#[derive(Debug, Default)]
pub struct MockBoardState {
    pub init_calls: usize,
    pub restarts: usize,
    pub fail_init: bool,
}

#[derive(Clone, Default)]
pub struct MockBoard {
    state: Arc<Mutex<MockBoardState>>,
}

impl MockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let board = Self::default();
        board.state.lock().fail_init = true;
        board
    }

    pub fn state(&self) -> Arc<Mutex<MockBoardState>> {
        Arc::clone(&self.state)
    }
}

impl Board for MockBoard {
    fn init_peripherals(&mut self) -> Result<(), HalError> {
        let mut state = self.state.lock();
        state.init_calls += 1;
        if state.fail_init {
            return Err(HalError::Peripheral("simulated failure".to_string()));
        }
        Ok(())
    }

    fn restart(&mut self) {
        self.state.lock().restarts += 1;
    }

    fn restart_requested(&self) -> bool {
        self.state.lock().restarts > 0
    }
}
