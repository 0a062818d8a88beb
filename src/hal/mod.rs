/*
 *  hal/mod.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Board collaborators - Wi-Fi, user button and the board itself
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

//! Hardware the state machine talks to
//!
//! The appliance core never touches radios or GPIOs directly. The host build
//! wires in [`host`] implementations, tests use the [`mock`] ones.

pub mod host;
pub mod mock;

use std::net::IpAddr;
use thiserror::Error;

pub use host::{HostBoard, HostWifi, VirtualButton};
pub use mock::{MockBoard, MockButton, MockWifi};

#[derive(Debug, Error)]
pub enum HalError {
    #[error("wifi: {0}")]
    Wifi(String),

    #[error("peripheral initialization failed: {0}")]
    Peripheral(String),
}

pub trait Wifi: Send {
    /// Open an access point for provisioning
    fn start_ap(&mut self, ssid: &str, passphrase: &str) -> Result<(), HalError>;

    /// Start joining a network, completion is seen via `is_connected`
    fn connect(&mut self, ssid: &str, passphrase: &str) -> Result<(), HalError>;

    fn is_connected(&self) -> bool;

    fn disconnect(&mut self);

    fn set_hostname(&mut self, hostname: &str);

    fn hostname(&self) -> String;

    /// Station or access point address
    fn ip(&self) -> Option<IpAddr>;

    /// Hardware address, "aa:bb:cc:dd:ee:ff"
    fn mac(&self) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Released,
    Pressed,
    /// Short press completed, reported once
    Triggered,
    /// Pressed for longer than the hold time
    Held,
}

pub trait Button: Send {
    fn state(&mut self) -> ButtonState;
}

pub trait Board: Send {
    /// Bring up the peripherals the core needs, fatal on failure
    fn init_peripherals(&mut self) -> Result<(), HalError>;

    fn restart(&mut self);

    fn restart_requested(&self) -> bool;
}
