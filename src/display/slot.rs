/*
 *  display/slot.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display slot - one canvas, at most one plugin
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
use serde::Serialize;

use crate::gfx::Canvas;
use crate::plugin::Plugin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    Empty,
    Inactive,
    Active,
}

pub struct Slot {
    /// System widgets drawn on top of the plugin, e.g. the update progress
    pub(crate) canvas: Canvas,
    pub(crate) plugin: Option<Arc<dyn Plugin>>,
    pub(crate) state: SlotState,
    /// Overrides the scheduler default when set
    pub(crate) duration: Option<Duration>,
}

impl Slot {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self { canvas: Canvas::new(width, height, 0, 0), plugin: None, state: SlotState::Empty, duration: None }
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn plugin(&self) -> Option<&Arc<dyn Plugin>> {
        self.plugin.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.plugin.is_none()
    }
}

/// Snapshot of one slot, as reported over the websocket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotInfo {
    pub index: usize,
    pub state: SlotState,
    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<u16>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub alias: String,
    pub duration_secs: Option<u64>,
}
