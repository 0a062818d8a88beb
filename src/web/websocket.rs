/*
 *  web/websocket.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Websocket command protocol
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
use log::{debug, warn};
use parking_lot::Mutex;

use super::deferred::SocketHandler;
use super::surface::DeferredSurface;
use crate::services::Services;
use crate::update::SYS_MSG_WAIT;

/// Outgoing side of the websocket server
pub trait SocketSink: Send + Sync {
    fn text(&self, conn: u32, msg: &str);
}

/// Keeps every message sent, for tests
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(u32, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(u32, String)> {
        self.sent.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.sent.lock().last().map(|(_, msg)| msg.clone())
    }
}

impl SocketSink for RecordingSink {
    fn text(&self, conn: u32, msg: &str) {
        self.sent.lock().push((conn, msg.to_string()));
    }
}

/// Queue a received text frame
pub fn dispatch_message(surface: &DeferredSurface<Services>, conn: u32, data: &[u8]) -> bool {
    let handler: SocketHandler<Services> = Arc::new(handle_message);
    surface.safe_socket_message(conn, data, handler)
}

type Reply = Result<Vec<String>, &'static str>;

fn quoted(value: impl std::fmt::Display) -> String {
    format!("\"{}\"", value)
}

fn param<'a>(params: &[&'a str], idx: usize) -> Result<&'a str, &'static str> {
    params.get(idx).copied().ok_or("Parameter missing.")
}

fn uid_param(params: &[&str], idx: usize) -> Result<u16, &'static str> {
    param(params, idx)?.trim().parse().map_err(|_| "Invalid uid.")
}

/// Execute `CMD;PAR1;PAR2..` and answer `ACK;..` or `NACK;"reason"`
pub fn handle_message(svc: &mut Services, conn: u32, data: &[u8]) {
    let text = String::from_utf8_lossy(data);
    let msg = text.trim_start_matches([' ', '\t']).trim_end_matches(['\r', '\n']);
    let (cmd, params): (&str, Vec<&str>) = match msg.split_once(';') {
        Some((cmd, rest)) => (cmd, rest.split(';').collect()),
        None => (msg, Vec::new()),
    };
    debug!("ws #{}: {} {:?}", conn, cmd, params);

    let reply = match cmd {
        "SLOTS" => slots(svc),
        "PLUGINS" => Ok(svc.plugins.registry().type_names().into_iter().map(quoted).collect()),
        "INSTALL" => install(svc, &params),
        "UNINSTALL" => uninstall(svc, &params),
        "NEXT" => {
            if svc.display.activate_next_slot() {
                Ok(Vec::new())
            } else {
                Err("No other slot.")
            }
        }
        "TEXT" => set_text(svc, &params),
        "ALIAS" => alias(svc, &params),
        "RESET" => {
            svc.update.request_restart(SYS_MSG_WAIT);
            Ok(Vec::new())
        }
        _ => Err("Command unknown."),
    };

    let out = match reply {
        Ok(values) if values.is_empty() => "ACK".to_string(),
        Ok(values) => format!("ACK;{}", values.join(";")),
        Err(reason) => {
            warn!("ws #{}: {} rejected, {}", conn, cmd, reason);
            format!("NACK;{}", quoted(reason))
        }
    };
    svc.socket_out.text(conn, &out);
}

fn slots(svc: &Services) -> Reply {
    let json = serde_json::to_string(&svc.display.slot_states()).map_err(|_| "Internal error.")?;
    Ok(vec![json])
}

fn install(svc: &mut Services, params: &[&str]) -> Reply {
    let name = param(params, 0)?;
    let slot = match params.get(1) {
        Some(slot) => Some(slot.trim().parse::<usize>().map_err(|_| "Invalid slot.")?),
        None => None,
    };
    match svc.plugins.install(&mut svc.display, name, slot) {
        Ok(uid) => Ok(vec![quoted(uid)]),
        Err(crate::plugin::PluginError::NotFound(_)) => Err("Plugin not found."),
        Err(_) => Err("Slot not available."),
    }
}

fn uninstall(svc: &mut Services, params: &[&str]) -> Reply {
    let uid = uid_param(params, 0)?;
    svc.plugins.uninstall(&mut svc.display, uid).map_err(|_| "Plugin not found.")?;
    Ok(Vec::new())
}

fn set_text(svc: &mut Services, params: &[&str]) -> Reply {
    let uid = uid_param(params, 0)?;
    param(params, 1)?;
    let plugin = svc.plugins.find(uid).ok_or("Plugin not found.")?;
    let target = plugin.as_text().ok_or("Plugin does not support text.")?;
    target.set_text(&params[1..].join(";"));
    Ok(Vec::new())
}

fn alias(svc: &mut Services, params: &[&str]) -> Reply {
    let uid = uid_param(params, 0)?;
    let name = param(params, 1)?;
    svc.plugins.set_alias(uid, name).map_err(|_| "Plugin not found.")?;
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::plugins::JustTextPlugin;
    use crate::services::ServicesBuilder;

    fn services() -> (Services, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        match ServicesBuilder::new().socket_out(sink.clone()).build() {
            Ok(svc) => (svc, sink),
            Err(e) => panic!("{}", e),
        }
    }

    #[test]
    fn test_unknown_command() {
        let (mut svc, sink) = services();
        handle_message(&mut svc, 3, b"  FOO;1");
        assert_eq!(sink.sent(), vec![(3, "NACK;\"Command unknown.\"".to_string())]);
    }

    #[test]
    fn test_install_text_uninstall() {
        let (mut svc, sink) = services();
        handle_message(&mut svc, 1, b"INSTALL;JustTextPlugin;2");
        let Some(ack) = sink.last() else { panic!("no reply") };
        let uid: u16 = ack.trim_start_matches("ACK;").trim_matches('"').parse().unwrap_or(0);
        assert!(svc.plugins.find(uid).is_some());
        assert_eq!(svc.display.slot_of(uid), Some(2));

        handle_message(&mut svc, 1, format!("TEXT;{};Hi;there", uid).as_bytes());
        assert_eq!(sink.last().as_deref(), Some("ACK"));
        let text = svc.plugins.find(uid).and_then(|p| p.as_text().map(|t| t.text()));
        assert_eq!(text.as_deref(), Some("Hi;there"));

        handle_message(&mut svc, 1, format!("UNINSTALL;{}", uid).as_bytes());
        assert_eq!(sink.last().as_deref(), Some("ACK"));
        assert!(svc.plugins.find(uid).is_none());
    }

    #[test]
    fn test_install_errors() {
        let (mut svc, sink) = services();
        handle_message(&mut svc, 1, b"INSTALL;Nope");
        assert_eq!(sink.last().as_deref(), Some("NACK;\"Plugin not found.\""));
        handle_message(&mut svc, 1, b"INSTALL;JustTextPlugin;x");
        assert_eq!(sink.last().as_deref(), Some("NACK;\"Invalid slot.\""));
        handle_message(&mut svc, 1, b"INSTALL");
        assert_eq!(sink.last().as_deref(), Some("NACK;\"Parameter missing.\""));
    }

    #[test]
    fn test_plugins_and_slots() {
        let (mut svc, sink) = services();
        handle_message(&mut svc, 1, b"PLUGINS");
        assert!(sink.last().is_some_and(|m| m.contains(&quoted(JustTextPlugin::TYPE_NAME))));
        handle_message(&mut svc, 1, b"SLOTS");
        assert!(sink.last().is_some_and(|m| m.starts_with("ACK;[{\"index\":0,\"state\":\"empty\"")));
    }

    #[test]
    fn test_queued_message_runs_on_process() {
        let (mut svc, sink) = services();
        let socket = Arc::clone(&svc.web.socket);
        assert!(dispatch_message(&socket, 9, b"NEXT"));
        assert!(sink.sent().is_empty());
        assert!(socket.process(&mut svc));
        assert_eq!(sink.last().as_deref(), Some("NACK;\"No other slot.\""));
    }
}
