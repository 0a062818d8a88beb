/*
 *  plugin/plugins/text_route.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  REST text route shared by the text showing plugins
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

use serde_json::json;

use crate::plugin::TextPlugin;
use crate::web::{rest_error, rest_ok, send_json, status, Method, WebRequest};

/// GET returns the text, POST `?show=<text>` replaces it
pub(super) fn serve(plugin: &dyn TextPlugin, req: &dyn WebRequest) {
    match req.method() {
        Method::Get => send_json(req, status::OK, &rest_ok(json!({ "text": plugin.text() }))),
        Method::Post => match req.arg("show") {
            Some(text) => {
                plugin.set_text(&text);
                send_json(req, status::OK, &rest_ok(json!({})));
            }
            None => send_json(req, status::NOT_FOUND, &rest_error("Show is missing.")),
        },
        _ => send_json(req, status::NOT_FOUND, &rest_error("HTTP method not supported.")),
    }
}
