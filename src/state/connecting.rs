/*
 *  state/connecting.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Joining the configured Wi-Fi network
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

use std::time::{Duration, Instant};
use log::{info, warn};

use super::{State, StateId, Transition};
use crate::services::Services;

/// Pause between two connection attempts
pub const STA_RETRY: Duration = Duration::from_secs(30);

pub struct ConnectingStaState {
    retry: Duration,
    last_attempt: Option<Instant>,
}

impl ConnectingStaState {
    pub fn new(retry: Duration) -> Self {
        Self { retry, last_attempt: None }
    }

    fn connect(&mut self, svc: &mut Services) {
        self.last_attempt = Some(Instant::now());
        let (ssid, passphrase) = (svc.settings.wifi_ssid.clone(), svc.settings.wifi_passphrase.clone());
        if let Err(e) = svc.wifi.connect(&ssid, &passphrase) {
            warn!("{}", e);
        }
        svc.display.show_sys_msg("Connecting...");
    }
}

impl State for ConnectingStaState {
    fn id(&self) -> StateId {
        StateId::ConnectingSta
    }

    fn entry(&mut self, svc: &mut Services, tr: &mut Transition) {
        if !svc.settings.has_wifi_credentials() {
            info!("no wifi credentials");
            tr.set(StateId::ProvisionAp);
            return;
        }
        self.connect(svc);
    }

    fn process(&mut self, svc: &mut Services, tr: &mut Transition) {
        if svc.wifi.is_connected() {
            tr.set(StateId::Running);
            return;
        }
        if self.last_attempt.is_none_or(|at| at.elapsed() >= self.retry) {
            info!("connection attempt timed out, retry");
            svc.wifi.disconnect();
            self.connect(svc);
        }
    }

    fn exit(&mut self, svc: &mut Services) {
        svc.display.clear_sys_msg();
    }
}
