/*
 *  state/running.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Normal operation
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

use log::warn;

use super::{State, StateId, Transition};
use crate::hal::ButtonState;
use crate::services::Services;

/// Serves the web surfaces and lets the button rotate the slots
pub struct RunningState;

impl State for RunningState {
    fn id(&self) -> StateId {
        StateId::Running
    }

    fn entry(&mut self, svc: &mut Services, _tr: &mut Transition) {
        let ip = svc.wifi.ip().map(|ip| ip.to_string()).unwrap_or_else(|| "-".to_string());
        let msg = format!("Hostname: {} IP: {}", svc.wifi.hostname(), ip);
        svc.display.show_sys_msg(&msg);
    }

    fn process(&mut self, svc: &mut Services, tr: &mut Transition) {
        if !svc.wifi.is_connected() {
            warn!("wifi connection lost");
            tr.set(StateId::ConnectingSta);
            return;
        }

        // three Arcs, cloned so the handlers can borrow the services
        let web = svc.web.clone();
        web.pages.process(svc);
        web.socket.process(svc);

        if svc.button.state() == ButtonState::Triggered {
            svc.display.activate_next_slot();
        }

        if svc.update.is_running() {
            tr.set(StateId::Updating);
        }
    }
}

