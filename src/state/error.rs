/*
 *  state/error.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Fatal error, waits for a manual reset
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

use std::time::Duration;

use super::{State, StateId, Transition};
use crate::services::Services;

pub struct ErrorState;

impl State for ErrorState {
    fn id(&self) -> StateId {
        StateId::Error
    }

    fn entry(&mut self, svc: &mut Services, _tr: &mut Transition) {
        svc.display.show_sys_msg_for("Error", Duration::from_secs(365 * 24 * 3600));
    }

    fn process(&mut self, _svc: &mut Services, _tr: &mut Transition) {}
}
