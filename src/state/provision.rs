/*
 *  state/provision.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Access point with the captive portal
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
use log::error;

use super::{State, StateId, Transition};
use crate::services::Services;

pub struct ProvisionApState;

impl State for ProvisionApState {
    fn id(&self) -> StateId {
        StateId::ProvisionAp
    }

    fn entry(&mut self, svc: &mut Services, tr: &mut Transition) {
        let (ssid, passphrase) = (svc.settings.ap_ssid.clone(), svc.settings.ap_passphrase.clone());
        if let Err(e) = svc.wifi.start_ap(&ssid, &passphrase) {
            error!("{}", e);
            tr.set(StateId::Error);
            return;
        }
        let ip = svc.wifi.ip().map(|ip| ip.to_string()).unwrap_or_default();
        svc.display.show_sys_msg_for(&format!("AP: {} IP: {}", ssid, ip), Duration::from_secs(3600));
    }

    fn process(&mut self, svc: &mut Services, _tr: &mut Transition) {
        let captive = Arc::clone(&svc.web.captive);
        captive.process(svc);
    }
}
