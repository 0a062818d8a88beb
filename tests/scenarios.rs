/*
 *  tests/scenarios.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Request decoupling and plugin lifecycle scenarios
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
use std::thread;
use std::time::Duration;

use pixslot::fs::{FileSystem, MemFs};
use pixslot::plugin::plugins::JustTextPlugin;
use pixslot::plugin::{config_store, Plugin, PluginError, PluginLock, PluginRegistry};
use pixslot::queue::{QueueError, TaskDecoupler};
use pixslot::web::{
    status, DeferredSurface, MemRequest, Method, PageHandler, RequestRef, SocketHandler, UploadHandler,
};

const SHORT: Duration = Duration::from_millis(20);

#[derive(Default)]
struct Received {
    chunks: Vec<(usize, Vec<u8>, bool)>,
}

#[test]
fn test_queue_holds_two_then_rejects() {
    let queue: TaskDecoupler<u8> = TaskDecoupler::with_timeout(SHORT);
    assert!(queue.init(2).is_ok());
    assert!(queue.add_item(1).is_ok());
    assert!(queue.add_item(2).is_ok());

    match queue.add_item(3) {
        Err(QueueError::Full(item)) => assert_eq!(item, 3),
        other => panic!("expected full queue, got {:?}", other),
    }
    assert_eq!(queue.get_item().ok(), Some(1));
    assert_eq!(queue.get_item().ok(), Some(2));
    assert!(matches!(queue.get_item(), Err(QueueError::Empty)));
}

#[test]
fn test_queue_uninitialized_and_zero_capacity() {
    let queue: TaskDecoupler<u8> = TaskDecoupler::with_timeout(SHORT);
    assert!(matches!(queue.add_item(1), Err(QueueError::Uninitialized(1))));
    assert!(matches!(queue.get_item(), Err(QueueError::Empty)));
    assert!(matches!(queue.init(0), Err(QueueError::Capacity)));
    assert!(!queue.is_initialized());
}

#[test]
fn test_full_surface_answers_507() {
    let surface: DeferredSurface<Received> = DeferredSurface::new("pages", 1, SHORT).unwrap();
    let handler: PageHandler<Received> = Arc::new(|_, req| req.send(status::OK, "text/plain", "Ok."));

    let first = Arc::new(MemRequest::new(Method::Get, "/a"));
    let second = Arc::new(MemRequest::new(Method::Get, "/b"));
    assert!(surface.safe_page_request(first.clone(), handler.clone()));
    assert!(!surface.safe_page_request(second.clone(), handler));
    assert_eq!(second.last_reply().map(|r| r.status), Some(status::INSUFFICIENT_STORAGE));

    let mut ctx = Received::default();
    assert!(surface.process(&mut ctx));
    assert_eq!(first.last_reply().map(|r| r.status), Some(status::OK));
    assert!(!surface.process(&mut ctx));
}

#[test]
fn test_upload_chunks_arrive_in_order_with_copied_payload() {
    let surface: DeferredSurface<Received> = DeferredSurface::new("upload", 4, SHORT).unwrap();
    let handler: UploadHandler<Received> = Arc::new(|ctx, _req, chunk| {
        ctx.chunks.push((chunk.index, chunk.data.clone(), chunk.is_final));
    });
    let request: RequestRef = Arc::new(MemRequest::new(Method::Post, "/upload"));

    // the producer reuses one buffer for both chunks
    let mut buffer = vec![0xAAu8; 100];
    assert!(surface.safe_upload_request(Arc::clone(&request), "firmware.bin", 0, &buffer, false, handler.clone()));
    buffer.fill(0xBB);
    assert!(surface.safe_upload_request(request, "firmware.bin", 100, &buffer, true, handler));
    buffer.fill(0);

    let mut ctx = Received::default();
    while surface.process(&mut ctx) {}

    assert_eq!(ctx.chunks.len(), 2);
    assert_eq!(ctx.chunks[0].0, 0);
    assert!(ctx.chunks[0].1.iter().all(|b| *b == 0xAA));
    assert!(!ctx.chunks[0].2);
    assert_eq!(ctx.chunks[1].0, 100);
    assert!(ctx.chunks[1].1.iter().all(|b| *b == 0xBB));
    assert!(ctx.chunks[1].2);
    assert_eq!(ctx.chunks.iter().map(|c| c.1.len()).sum::<usize>(), 200);
}

#[test]
fn test_messages_from_network_thread_keep_order() {
    let surface: Arc<DeferredSurface<Received>> = Arc::new(DeferredSurface::new("socket", 8, SHORT).unwrap());
    let handler: SocketHandler<Received> = Arc::new(|ctx, conn, data| {
        ctx.chunks.push((conn as usize, data.to_vec(), false));
    });

    let producer = {
        let surface = Arc::clone(&surface);
        thread::spawn(move || {
            for conn in 0..5u32 {
                assert!(surface.safe_socket_message(conn, b"NEXT", handler.clone()));
            }
        })
    };
    producer.join().unwrap();

    let mut ctx = Received::default();
    while surface.process(&mut ctx) {}
    let order: Vec<usize> = ctx.chunks.iter().map(|c| c.0).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_restart_reuses_stored_configuration() {
    let fs: Arc<dyn FileSystem> = Arc::new(MemFs::new());

    let first = JustTextPlugin::new(42);
    first.start(&fs);
    let path = config_store::config_path(42);
    let created = fs.read(&path).unwrap();
    first.start(&fs);
    assert_eq!(fs.read(&path).unwrap(), created);

    first.as_text().unwrap().set_text("Kept");
    let second = JustTextPlugin::new(42);
    second.start(&fs);
    assert_eq!(second.as_text().unwrap().text(), "Kept");

    second.stop(fs.as_ref());
    assert!(!fs.exists(&path));
}

#[test]
fn test_unknown_plugin_type() {
    let registry = PluginRegistry::with_builtins();
    assert!(matches!(registry.create("NoSuchPlugin", 1), Err(PluginError::NotFound(name)) if name == "NoSuchPlugin"));
    assert!(registry.type_names().contains(&"DateTimePlugin"));
}

#[test]
fn test_plugin_lock_is_reentrant() {
    let lock = Arc::new(PluginLock::new(0u32));
    let outer = lock.lock();
    lock.with(|v| *v += 1);
    lock.with(|v| *v += 1);
    drop(outer);

    let other = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || lock.with(|v| *v += 10))
    };
    other.join().unwrap();
    assert_eq!(lock.read(|v| *v), 12);
}
