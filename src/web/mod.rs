/*
 *  web/mod.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Deferred web surfaces
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

//! Network front of the appliance
//!
//! The network stack runs on its own tasks. It never touches plugins
//! directly: every request is captured as a [`DeferredRequest`] and queued on
//! the [`DeferredSurface`] it arrived on. The main loop drains the surfaces
//! and runs the handlers against the [`Services`](crate::services::Services).

pub mod captive;
pub mod deferred;
pub mod pages;
pub mod request;
pub mod surface;
pub mod websocket;

pub use deferred::{DeferredRequest, PageHandler, SocketHandler, UploadChunk, UploadHandler};
pub use request::{rest_error, rest_ok, send_json, status, MemRequest, Method, Reply, RequestRef, RestStatus, WebRequest};
pub use surface::{process_shared, DeferredSurface};
pub use websocket::{RecordingSink, SocketSink};
