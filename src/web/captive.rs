/*
 *  web/captive.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Captive portal - Wi-Fi provisioning page
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
use serde_json::json;

use super::deferred::PageHandler;
use super::request::{rest_error, rest_ok, send_json, status, Method, RequestRef, WebRequest};
use super::surface::DeferredSurface;
use crate::services::Services;
use crate::update::SYS_MSG_WAIT;

const FORM: &str = r#"<!DOCTYPE html>
<html><head><title>pixslot</title></head><body>
<h1>Wi-Fi setup</h1>
<form method="post">
<p>SSID <input name="ssid" value="{ssid}"></p>
<p>Passphrase <input name="passphrase" type="password"></p>
<p><input type="submit" value="Save"></p>
</form></body></html>"#;

/// Every request on the access point lands on the provisioning page
pub fn dispatch_request(surface: &DeferredSurface<Services>, req: RequestRef) -> bool {
    let handler: PageHandler<Services> = Arc::new(captive_page);
    surface.safe_page_request(req, handler)
}

/// Escape text placed inside an HTML attribute value
fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn captive_page(svc: &mut Services, req: &dyn WebRequest) {
    match req.method() {
        Method::Get => {
            let page = FORM.replace("{ssid}", &html_escape(&svc.settings.wifi_ssid));
            req.send(status::OK, "text/html", &page);
        }
        Method::Post => {
            let Some(ssid) = req.arg("ssid") else {
                send_json(req, status::BAD_REQUEST, &rest_error("SSID is missing."));
                return;
            };
            let passphrase = req.arg("passphrase").unwrap_or_default();
            let mut updated = svc.settings.clone();
            let result = updated
                .apply("wifi_ssid", &ssid)
                .and_then(|_| updated.apply("wifi_passphrase", &passphrase))
                .and_then(|_| updated.save(svc.store.as_ref()));
            match result {
                Ok(()) => {
                    svc.settings = updated;
                    info!("credentials for {} stored", ssid);
                    send_json(req, status::OK, &rest_ok(json!({})));
                    svc.display.show_sys_msg("Restart...");
                    svc.update.request_restart(SYS_MSG_WAIT);
                }
                Err(e) => {
                    warn!("credentials rejected: {}", e);
                    send_json(req, status::BAD_REQUEST, &rest_error(&e.to_string()));
                }
            }
        }
        _ => send_json(req, status::METHOD_NOT_ALLOWED, &rest_error("HTTP method not supported.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServicesBuilder;
    use crate::settings::Settings;
    use crate::web::request::MemRequest;

    #[test]
    fn test_credentials_stored_and_restart_requested() {
        let Ok(mut svc) = ServicesBuilder::new().build() else { panic!("build failed") };
        let req = Arc::new(
            MemRequest::new(Method::Post, "/")
                .with_arg("ssid", "home")
                .with_arg("passphrase", "secret-passphrase"),
        );
        let captive = Arc::clone(&svc.web.captive);
        assert!(dispatch_request(&captive, req.clone()));
        assert!(captive.process(&mut svc));
        assert_eq!(req.last_reply().map(|r| r.status), Some(200));
        assert_eq!(Settings::load(svc.store.as_ref()).wifi_ssid, "home");
        assert!(svc.update.restart_pending());
    }

    #[test]
    fn test_short_passphrase_rejected() {
        let Ok(mut svc) = ServicesBuilder::new().build() else { panic!("build failed") };
        let req = Arc::new(MemRequest::new(Method::Post, "/").with_arg("ssid", "home").with_arg("passphrase", "short"));
        let captive = Arc::clone(&svc.web.captive);
        dispatch_request(&captive, req.clone());
        captive.process(&mut svc);
        assert_eq!(req.last_reply().map(|r| r.status), Some(400));
        assert!(svc.settings.wifi_ssid.is_empty());
        assert!(!svc.update.restart_pending());
    }

    #[test]
    fn test_form_escapes_stored_ssid() {
        let Ok(mut svc) = ServicesBuilder::new().build() else { panic!("build failed") };
        svc.settings.wifi_ssid = r#"a"><script>&"#.to_string();
        let req = Arc::new(MemRequest::new(Method::Get, "/"));
        let captive = Arc::clone(&svc.web.captive);
        dispatch_request(&captive, req.clone());
        captive.process(&mut svc);
        let body = req.last_reply().map(|r| r.body).unwrap_or_default();
        assert!(body.contains("a&quot;&gt;&lt;script&gt;&amp;"));
        assert!(!body.contains("<script>"));
    }
}
