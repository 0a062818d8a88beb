/*
 *  web/pages.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Web page and REST handlers of the main web server
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
use log::{error, info, warn};
use serde_json::json;

use super::deferred::{PageHandler, UploadChunk, UploadHandler};
use super::request::{rest_error, rest_ok, send_json, status, Method, RequestRef, WebRequest};
use super::surface::DeferredSurface;
use crate::services::Services;
use crate::settings::Settings;
use crate::update::SYS_MSG_WAIT;

/// Firmware and filesystem upload page
pub const UPLOAD_URI: &str = "/upload";
pub const SETTINGS_URI: &str = "/settings";
pub const SLOTS_URI: &str = "/rest/api/v1/display/slots";
pub const PLUGINS_URI: &str = "/rest/api/v1/plugins";
/// Followed by `<uid>/<route>`
pub const PLUGIN_URI_PREFIX: &str = "/rest/api/v1/display/uid/";

/// Header carrying the announced upload size
pub const FILE_SIZE_HEADER: &str = "X-File-Size";

/// Route a request and queue its handler; unknown pages are answered at once
pub fn dispatch_request(surface: &DeferredSurface<Services>, req: RequestRef) -> bool {
    let handler: PageHandler<Services> = match (req.method(), req.uri()) {
        (_, SETTINGS_URI) => Arc::new(settings_page),
        (Method::Post, UPLOAD_URI) => Arc::new(upload_page),
        (Method::Get, SLOTS_URI) => Arc::new(slots_page),
        (Method::Get, PLUGINS_URI) => Arc::new(plugins_page),
        (_, uri) if uri.starts_with(PLUGIN_URI_PREFIX) => Arc::new(plugin_page),
        _ => {
            req.send(status::NOT_FOUND, "text/plain", "Not found.");
            return false;
        }
    };
    surface.safe_page_request(req, handler)
}

/// Route an upload chunk and queue its handler
pub fn dispatch_upload(
    surface: &DeferredSurface<Services>,
    req: RequestRef,
    filename: &str,
    index: usize,
    data: &[u8],
    is_final: bool,
) -> bool {
    let handler: UploadHandler<Services> = match req.uri() {
        UPLOAD_URI => Arc::new(firmware_upload),
        uri if uri.starts_with(PLUGIN_URI_PREFIX) => Arc::new(plugin_upload),
        _ => {
            req.send(status::NOT_FOUND, "text/plain", "Not found.");
            return false;
        }
    };
    surface.safe_upload_request(req, filename, index, data, is_final, handler)
}

/// Split `<prefix><uid>/<route>`
fn plugin_target(uri: &str) -> Option<(u16, &str)> {
    let rest = uri.strip_prefix(PLUGIN_URI_PREFIX)?;
    let (uid, route) = rest.split_once('/')?;
    Some((uid.parse().ok()?, route))
}

fn settings_page(svc: &mut Services, req: &dyn WebRequest) {
    match req.method() {
        Method::Get => {
            let mut data = serde_json::Map::new();
            for key in Settings::KEYS {
                // passphrases are write only
                if key.ends_with("passphrase") {
                    continue;
                }
                if let Some(value) = svc.settings.value(key) {
                    data.insert(key.to_string(), json!(value));
                }
            }
            send_json(req, status::OK, &rest_ok(serde_json::Value::Object(data)));
        }
        Method::Post => {
            let mut updated = svc.settings.clone();
            for key in Settings::KEYS {
                let Some(value) = req.arg(key) else {
                    continue;
                };
                if let Err(e) = updated.apply(key, &value) {
                    warn!("setting {} rejected: {}", key, e);
                    send_json(req, status::BAD_REQUEST, &rest_error(&e.to_string()));
                    return;
                }
            }
            if let Err(e) = updated.save(svc.store.as_ref()) {
                error!("settings not saved: {}", e);
                send_json(req, status::INTERNAL_SERVER_ERROR, &rest_error("Saving failed."));
                return;
            }
            svc.settings = updated;
            svc.apply_scroll_pause();
            info!("settings saved");
            send_json(req, status::OK, &rest_ok(json!({})));
        }
        _ => send_json(req, status::METHOD_NOT_ALLOWED, &rest_error("HTTP method not supported.")),
    }
}

fn slots_page(svc: &mut Services, req: &dyn WebRequest) {
    match serde_json::to_value(svc.display.slot_states()) {
        Ok(slots) => send_json(req, status::OK, &rest_ok(json!({ "slots": slots }))),
        Err(e) => send_json(req, status::INTERNAL_SERVER_ERROR, &rest_error(&e.to_string())),
    }
}

fn plugins_page(svc: &mut Services, req: &dyn WebRequest) {
    let names = svc.plugins.registry().type_names();
    send_json(req, status::OK, &rest_ok(json!({ "plugins": names })));
}

fn plugin_page(svc: &mut Services, req: &dyn WebRequest) {
    let Some((uid, route)) = plugin_target(req.uri()) else {
        send_json(req, status::BAD_REQUEST, &rest_error("Invalid plugin route."));
        return;
    };
    let Some(plugin) = svc.plugins.find(uid) else {
        send_json(req, status::NOT_FOUND, &rest_error("Plugin not found."));
        return;
    };
    if !plugin.web_request(route, req, svc.fs.as_ref()) {
        send_json(req, status::NOT_FOUND, &rest_error("Route not supported."));
    }
}

fn plugin_upload(svc: &mut Services, req: &dyn WebRequest, chunk: &UploadChunk) {
    let Some((uid, route)) = plugin_target(req.uri()) else {
        warn!("upload to invalid plugin route {}", req.uri());
        return;
    };
    match svc.plugins.find(uid) {
        Some(plugin) => {
            if let Err(e) = plugin.web_upload(route, chunk, svc.fs.as_ref()) {
                warn!("upload of {} to plugin {} failed: {}", chunk.filename, uid, e);
            }
        }
        None => warn!("upload to unknown plugin {}", uid),
    }
}

/// Firmware/filesystem image, written chunk by chunk
fn firmware_upload(svc: &mut Services, req: &dyn WebRequest, chunk: &UploadChunk) {
    if chunk.index == 0 {
        let size = req.header(FILE_SIZE_HEADER).and_then(|s| s.trim().parse::<usize>().ok());
        if svc.update.begin_upload(&mut svc.display, svc.fs.as_ref(), &chunk.filename, size).is_err() {
            abort_upload(svc, req);
            return;
        }
    } else if svc.update.upload_error() || !svc.update.is_running() {
        // already answered
        return;
    }

    if !chunk.data.is_empty() {
        if let Err(e) = svc.update.write_chunk(&mut svc.display, &chunk.data) {
            error!("{}", e);
            abort_upload(svc, req);
            return;
        }
    }

    if chunk.is_final {
        if let Err(e) = svc.update.finish(&mut svc.display) {
            error!("{}", e);
            abort_upload(svc, req);
        }
    }
}

fn abort_upload(svc: &mut Services, req: &dyn WebRequest) {
    svc.update.abort(&mut svc.display, svc.fs.as_ref());
    req.send(status::PAYLOAD_TOO_LARGE, "text/plain", "Upload aborted.");
}

/// Runs after the last chunk; restarts into the new image
fn upload_page(svc: &mut Services, req: &dyn WebRequest) {
    if svc.update.upload_error() {
        return;
    }
    req.send(status::OK, "text/plain", "Ok.");
    svc.update.request_restart(SYS_MSG_WAIT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServicesBuilder;
    use crate::web::request::MemRequest;

    fn services() -> Services {
        match ServicesBuilder::new().build() {
            Ok(services) => services,
            Err(e) => panic!("{}", e),
        }
    }

    fn run(svc: &mut Services) {
        let pages = Arc::clone(&svc.web.pages);
        while pages.process(svc) {}
    }

    #[test]
    fn test_plugin_target() {
        assert_eq!(plugin_target("/rest/api/v1/display/uid/42/text"), Some((42, "text")));
        assert_eq!(plugin_target("/rest/api/v1/display/uid/x/text"), None);
        assert_eq!(plugin_target("/rest/api/v1/display/uid/42"), None);
    }

    #[test]
    fn test_unknown_page_answered_immediately() {
        let svc = services();
        let req = Arc::new(MemRequest::new(Method::Get, "/nope"));
        assert!(!dispatch_request(&svc.web.pages, req.clone()));
        assert_eq!(req.last_reply().map(|r| r.status), Some(404));
        assert_eq!(svc.web.pages.pending(), 0);
    }

    #[test]
    fn test_settings_rejects_bad_hostname() {
        let mut svc = services();
        let req = Arc::new(MemRequest::new(Method::Post, SETTINGS_URI).with_arg("hostname", "-bad"));
        assert!(dispatch_request(&svc.web.pages, req.clone()));
        run(&mut svc);
        let Some(reply) = req.last_reply() else {
            panic!("no reply");
        };
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body, r#"{"error":{"msg":"Invalid hostname."},"status":1}"#);
        assert_eq!(svc.settings.hostname, "pixslot");
    }

    #[test]
    fn test_settings_roundtrip() {
        let mut svc = services();
        let post = Arc::new(
            MemRequest::new(Method::Post, SETTINGS_URI)
                .with_arg("hostname", "kitchen")
                .with_arg("scroll_pause", "120"),
        );
        dispatch_request(&svc.web.pages, post.clone());
        run(&mut svc);
        assert_eq!(post.last_reply().map(|r| r.status), Some(200));
        assert_eq!(Settings::load(svc.store.as_ref()).hostname, "kitchen");
        assert_eq!(svc.plugins.scroll_pause(), std::time::Duration::from_millis(120));

        let get = Arc::new(MemRequest::new(Method::Get, SETTINGS_URI));
        dispatch_request(&svc.web.pages, get.clone());
        run(&mut svc);
        let body = get.last_reply().map(|r| r.body).unwrap_or_default();
        assert!(body.contains("\"hostname\":\"kitchen\""));
        assert!(!body.contains("passphrase"));
    }

    #[test]
    fn test_firmware_upload_abort_reports_413() {
        let mut svc = services();
        let mem = Arc::new(MemRequest::new(Method::Post, UPLOAD_URI));
        // updater refuses to start
        let updater = crate::update::MockUpdater::new();
        updater.state().lock().fail_begin = true;
        svc.update = crate::update::UpdateMgr::new(Box::new(updater));
        assert!(dispatch_upload(&svc.web.pages, mem.clone(), "firmware.bin", 0, b"abc", true));
        run(&mut svc);
        assert_eq!(mem.last_reply().map(|r| r.status), Some(413));
        // the page handler stays silent after an aborted upload
        dispatch_request(&svc.web.pages, mem.clone());
        run(&mut svc);
        assert_eq!(mem.replies().len(), 1);
        assert!(!svc.update.restart_pending());
    }
}
