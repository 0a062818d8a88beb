/*
 *  state/updating.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Firmware or filesystem update in progress
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
use log::{info, warn};

use super::{State, StateId, Transition};
use crate::services::Services;

/// Only the upload keeps flowing; the board restarts once it is done
pub struct UpdatingState;

impl State for UpdatingState {
    fn id(&self) -> StateId {
        StateId::Updating
    }

    fn entry(&mut self, _svc: &mut Services, _tr: &mut Transition) {
        info!("update running");
    }

    fn process(&mut self, svc: &mut Services, tr: &mut Transition) {
        let pages = Arc::clone(&svc.web.pages);
        pages.process(svc);
        // the upload page answer follows the last chunk on the same queue
        if !svc.update.is_running() && !svc.update.restart_pending() && pages.pending() == 0 {
            warn!("update ended without restart");
            tr.set(StateId::Running);
        }
    }
}
