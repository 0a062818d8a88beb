/*
 *  state/init.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Boot state
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

use log::error;

use super::{State, StateId, Transition};
use crate::build_info::PKG_VERSION;
use crate::hal::ButtonState;
use crate::services::Services;

/// Brings up the peripherals and the installed plugins
pub struct InitState;

impl State for InitState {
    fn id(&self) -> StateId {
        StateId::Init
    }

    fn entry(&mut self, svc: &mut Services, tr: &mut Transition) {
        if let Err(e) = svc.board.init_peripherals() {
            error!("{}", e);
            tr.set(StateId::Error);
            return;
        }
        if let Err(e) = svc.display.init() {
            error!("{}", e);
            tr.set(StateId::Error);
            return;
        }
        svc.display.show_sys_msg(&format!("pixslot v{}", PKG_VERSION));
        let hostname = svc.settings.hostname.clone();
        svc.wifi.set_hostname(&hostname);
        svc.plugins.load(&mut svc.display);
    }

    fn process(&mut self, svc: &mut Services, tr: &mut Transition) {
        let provision = matches!(svc.button.state(), ButtonState::Held | ButtonState::Pressed);
        if provision || !svc.settings.has_wifi_credentials() {
            tr.set(StateId::ProvisionAp);
        } else {
            tr.set(StateId::ConnectingSta);
        }
    }
}
