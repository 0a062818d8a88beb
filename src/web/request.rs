/*
 *  web/request.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Web request capability and REST reply helpers
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

use std::collections::BTreeMap;
use std::sync::Arc;
use parking_lot::Mutex;
use serde_json::{json, Value};

/// HTTP status codes used by the appliance
pub mod status {
    pub const OK: u16 = 200;
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const METHOD_NOT_ALLOWED: u16 = 405;
    pub const PAYLOAD_TOO_LARGE: u16 = 413;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
    pub const INSUFFICIENT_STORAGE: u16 = 507;
}

/// Status field of a REST JSON reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RestStatus {
    Ok = 0,
    NotFound = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Other,
}

impl Method {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            _ => Method::Other,
        }
    }
}

/// Already authenticated, already parsed request owned by the network stack
///
/// The handle stays valid until a reply is sent, so deferred requests keep a
/// reference to it instead of a copy.
pub trait WebRequest: Send + Sync {
    fn method(&self) -> Method;
    fn uri(&self) -> &str;
    fn arg(&self, name: &str) -> Option<String>;
    fn header(&self, name: &str) -> Option<String>;
    fn send(&self, status: u16, content_type: &str, body: &str);

    fn has_arg(&self, name: &str) -> bool {
        self.arg(name).is_some()
    }
}

/// Shared request handle
pub type RequestRef = Arc<dyn WebRequest>;

/// `{"status":0,"data":{..}}`
pub fn rest_ok(data: Value) -> String {
    json!({ "status": RestStatus::Ok as u8, "data": data }).to_string()
}

/// `{"status":1,"error":{"msg":".."}}`
pub fn rest_error(msg: &str) -> String {
    json!({ "status": RestStatus::NotFound as u8, "error": { "msg": msg } }).to_string()
}

pub fn send_json(req: &dyn WebRequest, status: u16, body: &str) {
    req.send(status, "application/json", body);
}

/// Recorded reply of a [`MemRequest`]
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

/// Request built in memory; records every reply
///
/// Used by the console front end and by tests.
#[derive(Debug)]
pub struct MemRequest {
    method: Method,
    uri: String,
    args: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    replies: Mutex<Vec<Reply>>,
}

impl MemRequest {
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            args: BTreeMap::new(),
            headers: BTreeMap::new(),
            replies: Mutex::new(Vec::new()),
        }
    }

    /// Build from `<uri>?a=1&b=2`
    pub fn parse(method: Method, target: &str) -> Self {
        let (uri, query) = target.split_once('?').unwrap_or((target, ""));
        let mut req = Self::new(method, uri);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            req.args.insert(k.to_string(), v.replace('+', " "));
        }
        req
    }

    pub fn with_arg(mut self, name: &str, value: &str) -> Self {
        self.args.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn replies(&self) -> Vec<Reply> {
        self.replies.lock().clone()
    }

    pub fn last_reply(&self) -> Option<Reply> {
        self.replies.lock().last().cloned()
    }
}

impl WebRequest for MemRequest {
    fn method(&self) -> Method {
        self.method
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn arg(&self, name: &str) -> Option<String> {
        self.args.get(name).cloned()
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers.get(&name.to_ascii_lowercase()).cloned()
    }

    fn send(&self, status: u16, content_type: &str, body: &str) {
        log::debug!("{} -> {} {}", self.uri, status, body);
        self.replies.lock().push(Reply {
            status,
            content_type: content_type.to_string(),
            body: body.to_string(),
        });
    }
}
