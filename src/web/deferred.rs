/*
 *  web/deferred.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Deferred request variants - captured network work for the main loop
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

use std::fmt;
use std::sync::Arc;

use super::request::{RequestRef, WebRequest};

/// Handler for a complete page request
pub type PageHandler<C> = Arc<dyn Fn(&mut C, &dyn WebRequest) + Send + Sync>;

/// Handler for one chunk of a file upload
pub type UploadHandler<C> = Arc<dyn Fn(&mut C, &dyn WebRequest, &UploadChunk) + Send + Sync>;

/// Handler for one websocket text message
pub type SocketHandler<C> = Arc<dyn Fn(&mut C, u32, &[u8]) + Send + Sync>;

/// One piece of an uploaded file, copied out of the network buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadChunk {
    pub filename: String,
    /// Offset of `data` inside the file
    pub index: usize,
    pub data: Vec<u8>,
    pub is_final: bool,
}

/// Captured network operation, executed exactly once on the main loop
///
/// The request handle is referenced because the server keeps it alive until
/// it is answered. Payload bytes are copied at construction since the
/// producer reuses its buffers as soon as its callback returns.
pub enum DeferredRequest<C> {
    Page {
        request: RequestRef,
        handler: PageHandler<C>,
    },
    Upload {
        request: RequestRef,
        chunk: UploadChunk,
        handler: UploadHandler<C>,
    },
    SocketMessage {
        conn: u32,
        data: Vec<u8>,
        handler: SocketHandler<C>,
    },
}

impl<C> DeferredRequest<C> {
    pub fn page(request: RequestRef, handler: PageHandler<C>) -> Self {
        DeferredRequest::Page { request, handler }
    }

    pub fn upload(
        request: RequestRef,
        filename: &str,
        index: usize,
        data: &[u8],
        is_final: bool,
        handler: UploadHandler<C>,
    ) -> Self {
        DeferredRequest::Upload {
            request,
            chunk: UploadChunk {
                filename: filename.to_string(),
                index,
                data: data.to_vec(),
                is_final,
            },
            handler,
        }
    }

    pub fn socket_message(conn: u32, data: &[u8], handler: SocketHandler<C>) -> Self {
        DeferredRequest::SocketMessage { conn, data: data.to_vec(), handler }
    }

    /// Run the handler; the request is consumed whatever the outcome
    pub fn execute(self, ctx: &mut C) {
        match self {
            DeferredRequest::Page { request, handler } => handler(ctx, request.as_ref()),
            DeferredRequest::Upload { request, chunk, handler } => handler(ctx, request.as_ref(), &chunk),
            DeferredRequest::SocketMessage { conn, data, handler } => handler(ctx, conn, &data),
        }
    }

    /// Request handle for replying, None for websocket messages
    pub fn request(&self) -> Option<&RequestRef> {
        match self {
            DeferredRequest::Page { request, .. } | DeferredRequest::Upload { request, .. } => Some(request),
            DeferredRequest::SocketMessage { .. } => None,
        }
    }
}

impl<C> fmt::Debug for DeferredRequest<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeferredRequest::Page { request, .. } => write!(f, "Page({})", request.uri()),
            DeferredRequest::Upload { request, chunk, .. } => write!(
                f,
                "Upload({}, {} @ {}, {} bytes{})",
                request.uri(),
                chunk.filename,
                chunk.index,
                chunk.data.len(),
                if chunk.is_final { ", final" } else { "" }
            ),
            DeferredRequest::SocketMessage { conn, data, .. } => {
                write!(f, "SocketMessage(#{}, {} bytes)", conn, data.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::request::{MemRequest, Method};

    #[derive(Default)]
    struct Ctx {
        bytes: Vec<u8>,
        pages: Vec<String>,
    }

    #[test]
    fn test_upload_copies_payload() {
        let handler: UploadHandler<Ctx> = Arc::new(|ctx, _req, chunk| ctx.bytes.extend_from_slice(&chunk.data));
        let req: RequestRef = Arc::new(MemRequest::new(Method::Post, "/upload"));
        let mut buffer = vec![1u8, 2, 3];
        let deferred = DeferredRequest::upload(Arc::clone(&req), "fw.bin", 0, &buffer, false, handler);
        // producer reuses its buffer
        buffer.fill(0);
        let mut ctx = Ctx::default();
        deferred.execute(&mut ctx);
        assert_eq!(ctx.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_page_runs_handler_with_request() {
        let handler: PageHandler<Ctx> = Arc::new(|ctx, req| {
            ctx.pages.push(req.uri().to_string());
            req.send(200, "text/plain", "ok");
        });
        let mem = Arc::new(MemRequest::new(Method::Get, "/settings"));
        let req: RequestRef = mem.clone();
        let deferred = DeferredRequest::page(req, handler);
        assert_eq!(format!("{:?}", deferred), "Page(/settings)");
        let mut ctx = Ctx::default();
        deferred.execute(&mut ctx);
        assert_eq!(ctx.pages, vec!["/settings".to_string()]);
        assert_eq!(mem.last_reply().map(|r| r.status), Some(200));
    }
}
