/*
 *  web/surface.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Deferred surface - one request queue per network front end
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
use log::{error, trace, warn};

use super::deferred::{DeferredRequest, PageHandler, SocketHandler, UploadHandler};
use super::request::{status, RequestRef};
use crate::queue::{QueueError, TaskDecoupler};

/// Queue front for one network surface
///
/// The producing side (`safe_*`) is called from network tasks; `process`
/// runs on the main loop. Each surface owns its queue so a flood on one
/// surface never starves another.
pub struct DeferredSurface<C> {
    name: &'static str,
    queue: TaskDecoupler<DeferredRequest<C>>,
}

impl<C> DeferredSurface<C> {
    pub fn new(name: &'static str, capacity: usize, timeout: Duration) -> Result<Self, QueueError<DeferredRequest<C>>> {
        let queue = TaskDecoupler::with_timeout(timeout);
        queue.init(capacity)?;
        Ok(Self { name, queue })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queue a page request; replies 507 if it cannot be queued
    pub fn safe_page_request(&self, request: RequestRef, handler: PageHandler<C>) -> bool {
        self.enqueue(DeferredRequest::page(request, handler))
    }

    /// Queue an upload chunk; replies 507 if it cannot be queued
    pub fn safe_upload_request(
        &self,
        request: RequestRef,
        filename: &str,
        index: usize,
        data: &[u8],
        is_final: bool,
        handler: UploadHandler<C>,
    ) -> bool {
        self.enqueue(DeferredRequest::upload(request, filename, index, data, is_final, handler))
    }

    /// Queue a websocket message; dropped with an error log if it cannot be queued
    pub fn safe_socket_message(&self, conn: u32, data: &[u8], handler: SocketHandler<C>) -> bool {
        if data.is_empty() {
            warn!("{}: empty message from #{} ignored", self.name, conn);
            return false;
        }
        self.enqueue(DeferredRequest::socket_message(conn, data, handler))
    }

    fn enqueue(&self, item: DeferredRequest<C>) -> bool {
        trace!("{}: enqueue {:?}", self.name, item);
        match self.queue.add_item(item) {
            Ok(()) => true,
            Err(e) => {
                error!("{}: request rejected, {}", self.name, e);
                if let Some(item) = e.into_inner() {
                    if let Some(request) = item.request() {
                        request.send(status::INSUFFICIENT_STORAGE, "text/plain", "Insufficient Storage");
                    }
                }
                false
            }
        }
    }

    /// Execute at most one pending request; true if one ran
    pub fn process(&self, ctx: &mut C) -> bool {
        match self.queue.try_get_item() {
            Some(item) => {
                trace!("{}: execute {:?}", self.name, item);
                item.execute(ctx);
                true
            }
            None => false,
        }
    }
}

/// Execute one request of a shared surface against a context that owns it
///
/// The surface handle is cloned first so the context can be borrowed
/// mutably while the surface is drained.
pub fn process_shared<C>(surface: &Arc<DeferredSurface<C>>, ctx: &mut C) -> bool {
    let surface = Arc::clone(surface);
    surface.process(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::request::{MemRequest, Method};

    #[test]
    fn test_overflow_replies_507() {
        let surface: DeferredSurface<Vec<String>> =
            DeferredSurface::new("pages", 1, Duration::from_millis(5)).unwrap();
        let handler: PageHandler<Vec<String>> = Arc::new(|log, req| log.push(req.uri().to_string()));
        let first = Arc::new(MemRequest::new(Method::Get, "/a"));
        let second = Arc::new(MemRequest::new(Method::Get, "/b"));
        assert!(surface.safe_page_request(first.clone(), handler.clone()));
        assert!(!surface.safe_page_request(second.clone(), handler));
        assert_eq!(second.last_reply().map(|r| r.status), Some(507));
        assert!(first.replies().is_empty());

        let mut log = Vec::new();
        assert!(surface.process(&mut log));
        assert!(!surface.process(&mut log));
        assert_eq!(log, vec!["/a".to_string()]);
    }

    #[test]
    fn test_empty_socket_message_ignored() {
        let surface: DeferredSurface<u32> = DeferredSurface::new("ws", 2, Duration::from_millis(5)).unwrap();
        let handler: SocketHandler<u32> = Arc::new(|n, _, _| *n += 1);
        assert!(!surface.safe_socket_message(1, b"", handler.clone()));
        assert!(surface.safe_socket_message(1, b"NEXT", handler));
        let mut n = 0;
        assert!(surface.process(&mut n));
        assert_eq!(n, 1);
    }
}
