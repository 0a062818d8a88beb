/*
 *  lib.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  LED matrix appliance core
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

//! pixslot - an LED matrix appliance rotating plugin screens through slots
//!
//! The main loop owns the [`services::Services`]; network producers hand
//! their work over through [`web::DeferredSurface`] queues, and the
//! [`state::StateMachine`] decides what runs in each phase.

pub mod config;
pub mod display;
pub mod fs;
pub mod gfx;
pub mod hal;
pub mod pacer;
pub mod plugin;
pub mod queue;
pub mod services;
pub mod settings;
pub mod state;
pub mod update;
pub mod web;
pub mod widget;

/// Version and build date, generated by build.rs
pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/build_info.rs"));
}
