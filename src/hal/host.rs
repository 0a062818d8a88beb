/*
 *  hal/host.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Host implementations of the board collaborators
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

use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use log::{info, warn};

use super::{Board, Button, ButtonState, HalError, Wifi};

/// Access point address, as on the device
const AP_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);

/// The host is always "connected" to whatever network it has
pub struct HostWifi {
    hostname: String,
    ssid: Option<String>,
    ap: bool,
}

impl HostWifi {
    pub fn new(hostname: &str) -> Self {
        Self { hostname: hostname.to_string(), ssid: None, ap: false }
    }
}

impl Wifi for HostWifi {
    fn start_ap(&mut self, ssid: &str, _passphrase: &str) -> Result<(), HalError> {
        info!("access point {} up at {}", ssid, AP_ADDRESS);
        self.ap = true;
        self.ssid = None;
        Ok(())
    }

    fn connect(&mut self, ssid: &str, _passphrase: &str) -> Result<(), HalError> {
        if ssid.is_empty() {
            return Err(HalError::Wifi("no ssid".to_string()));
        }
        info!("joining {}", ssid);
        self.ap = false;
        self.ssid = Some(ssid.to_string());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.ssid.is_some() && local_ip_address::local_ip().is_ok()
    }

    fn disconnect(&mut self) {
        self.ssid = None;
    }

    fn set_hostname(&mut self, hostname: &str) {
        self.hostname = hostname.to_string();
    }

    fn hostname(&self) -> String {
        self.hostname.clone()
    }

    fn ip(&self) -> Option<IpAddr> {
        if self.ap {
            return Some(IpAddr::V4(AP_ADDRESS));
        }
        match local_ip_address::local_ip() {
            Ok(ip) => Some(ip),
            Err(e) => {
                warn!("no local address: {}", e);
                None
            }
        }
    }

    fn mac(&self) -> Option<String> {
        match mac_address::get_mac_address() {
            Ok(Some(mac)) => Some(mac.to_string().to_ascii_lowercase()),
            Ok(None) => None,
            Err(e) => {
                warn!("mac address unavailable: {}", e);
                None
            }
        }
    }
}

/// Button driven from software, e.g. the console
///
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct VirtualButton {
    state: Arc<AtomicU8>,
}

impl VirtualButton {
    const RELEASED: u8 = 0;
    const PRESSED: u8 = 1;
    const TRIGGERED: u8 = 2;
    const HELD: u8 = 3;

    pub fn new() -> Self {
        Self::default()
    }

    /// Short press, reported once
    pub fn trigger(&self) {
        self.state.store(Self::TRIGGERED, Ordering::SeqCst);
    }

    pub fn hold(&self, held: bool) {
        let value = if held { Self::HELD } else { Self::RELEASED };
        self.state.store(value, Ordering::SeqCst);
    }
}

impl Button for VirtualButton {
    fn state(&mut self) -> ButtonState {
        match self.state.load(Ordering::SeqCst) {
            Self::PRESSED => ButtonState::Pressed,
            Self::TRIGGERED => {
                // a trigger is consumed by reading it
                let _ = self.state.compare_exchange(Self::TRIGGERED, Self::RELEASED, Ordering::SeqCst, Ordering::SeqCst);
                ButtonState::Triggered
            }
            Self::HELD => ButtonState::Held,
            _ => ButtonState::Released,
        }
    }
}

/// Restart means leaving the main loop
#[derive(Clone, Default)]
pub struct HostBoard {
    restart: Arc<AtomicBool>,
}

impl HostBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag shared with the runtime
    pub fn restart_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.restart)
    }
}

impl Board for HostBoard {
    fn init_peripherals(&mut self) -> Result<(), HalError> {
        Ok(())
    }

    fn restart(&mut self) {
        info!("restart requested");
        self.restart.store(true, Ordering::SeqCst);
    }

    fn restart_requested(&self) -> bool {
        self.restart.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_is_reported_once() {
        let button = VirtualButton::new();
        let mut reader = button.clone();
        button.trigger();
        assert_eq!(reader.state(), ButtonState::Triggered);
        assert_eq!(reader.state(), ButtonState::Released);
        button.hold(true);
        assert_eq!(reader.state(), ButtonState::Held);
    }

    #[test]
    fn test_ap_address() {
        let mut wifi = HostWifi::new("pixslot");
        assert!(wifi.start_ap("pixslot", "worththesqueeze").is_ok());
        assert_eq!(wifi.ip(), Some(IpAddr::V4(AP_ADDRESS)));
        assert!(!wifi.is_connected());
    }
}
