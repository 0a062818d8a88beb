/*
 *  main.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Host runtime - main loop, console producer and signal handling
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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use anyhow::Context;
use env_logger::Env;
use log::{error, info, warn};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};

#[cfg(unix)] // Only compile this block on Unix-like systems
use tokio::signal::unix::{signal, SignalKind}; // Import specific Unix signals

use pixslot::build_info::{BUILD_DATE, PKG_VERSION};
use pixslot::config::{self, Config};
use pixslot::display::{LedMatrix, MockMatrix};
use pixslot::fs::{FileSystem, HostFs};
use pixslot::hal::{Board, HostBoard, HostWifi, VirtualButton};
use pixslot::pacer::Pacer;
use pixslot::services::{Services, ServicesBuilder, WebSurfaces};
use pixslot::settings::{FsStore, Settings};
use pixslot::state::StateMachine;
use pixslot::update::HostUpdater;
use pixslot::web::{pages, websocket, MemRequest, Method, SocketSink, WebRequest};

/// Size of the chunks a console upload is cut into
const UPLOAD_CHUNK: usize = 4096;

/// Console requests below this path go to the captive portal
const CAPTIVE_PREFIX: &str = "/wifi";

/// Websocket replies go to stdout
struct ConsoleSink;

impl SocketSink for ConsoleSink {
    fn text(&self, conn: u32, msg: &str) {
        println!("ws #{} < {}", conn, msg);
    }
}

/// Console request, prints the reply
struct ConsoleRequest(MemRequest);

impl WebRequest for ConsoleRequest {
    fn method(&self) -> Method {
        self.0.method()
    }

    fn uri(&self) -> &str {
        self.0.uri()
    }

    fn arg(&self, name: &str) -> Option<String> {
        self.0.arg(name)
    }

    fn header(&self, name: &str) -> Option<String> {
        self.0.header(name)
    }

    fn send(&self, status: u16, content_type: &str, body: &str) {
        println!("{} {} [{}] {}", self.0.uri(), status, content_type, body);
    }
}

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
#[cfg(unix)]
async fn signal_handler() -> anyhow::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
async fn signal_handler() -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received. Initiating graceful shutdown.");
    Ok(())
}

fn create_matrix(cfg: &Config) -> Box<dyn LedMatrix> {
    let (width, height) = cfg.matrix_size();
    #[cfg(feature = "ansi-matrix")]
    if cfg.ansi() {
        return Box::new(pixslot::display::AnsiMatrix::new(width, height));
    }
    Box::new(MockMatrix::new(width, height))
}

fn build_services(cfg: &Config, button: &VirtualButton, board: &HostBoard) -> anyhow::Result<Services> {
    let data_dir = cfg.data_dir();
    let fs = Arc::new(HostFs::new(data_dir.join("flash")));
    fs.mount().context("data directory not usable")?;
    let store = Arc::new(FsStore::new(fs.clone()));
    let hostname = Settings::load(store.as_ref()).hostname;

    let services = ServicesBuilder::new()
        .matrix(create_matrix(cfg))
        .scheduler(cfg.scheduler())
        .fs(fs)
        .store(store)
        .updater(Box::new(HostUpdater::new(data_dir.join("update"))))
        .wifi(Box::new(HostWifi::new(&hostname)))
        .button(Box::new(button.clone()))
        .board(Box::new(board.clone()))
        .socket_out(Arc::new(ConsoleSink))
        .queue(cfg.queue_capacity(), cfg.queue_timeout())
        .build()?;
    Ok(services)
}

/// Cooperative main loop, runs until shutdown or a board restart
fn run_main_loop(mut services: Services, fps: u32, running: Arc<AtomicBool>) {
    let mut machine = StateMachine::new();
    let mut pacer = Pacer::new(fps);
    while running.load(Ordering::SeqCst) && !services.board.restart_requested() {
        pacer.wait();
        machine.tick(&mut services);
        services.display.process();
        services.update.process(services.board.as_mut());
    }
    info!("main loop left in state {:?}", machine.current());
}

fn upload(surfaces: &WebSurfaces, path: &str) {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            error!("{}: {}", path, e);
            return;
        }
    };
    let filename = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let req = Arc::new(ConsoleRequest(
        MemRequest::new(Method::Post, pages::UPLOAD_URI).with_header(pages::FILE_SIZE_HEADER, &data.len().to_string()),
    ));
    let chunks: Vec<&[u8]> = if data.is_empty() { vec![&[][..]] } else { data.chunks(UPLOAD_CHUNK).collect() };
    let last = chunks.len() - 1;
    for (i, chunk) in chunks.iter().enumerate() {
        if !pages::dispatch_upload(&surfaces.pages, req.clone(), &filename, i * UPLOAD_CHUNK, chunk, i == last) {
            return;
        }
    }
    pages::dispatch_request(&surfaces.pages, req);
}

/// Stand-in network producer reading commands from stdin
async fn console(surfaces: Arc<Mutex<Option<WebSurfaces>>>, button: VirtualButton) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("stdin: {}", e);
                break;
            }
        };
        let line = line.trim();
        let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
        let Some(web) = surfaces.lock().clone() else {
            continue;
        };
        match cmd {
            "" => {}
            "next" => button.trigger(),
            "ws" => {
                websocket::dispatch_message(&web.socket, 0, arg.as_bytes());
            }
            "get" | "post" => {
                let method = Method::parse(cmd);
                let req = Arc::new(ConsoleRequest(MemRequest::parse(method, arg)));
                if arg.starts_with(CAPTIVE_PREFIX) {
                    pixslot::web::captive::dispatch_request(&web.captive, req);
                } else {
                    pages::dispatch_request(&web.pages, req);
                }
            }
            "upload" => upload(&web, arg),
            _ => println!("commands: next | ws <CMD;..> | get <uri> | post <uri?k=v> | upload <file> (/wifi.. for the portal)"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load()?;

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_level())).init();
    info!("pixslot v{} built {}", PKG_VERSION, BUILD_DATE);

    let button = VirtualButton::new();
    if cfg.provision_hold() {
        button.hold(true);
    }
    let surfaces: Arc<Mutex<Option<WebSurfaces>>> = Arc::new(Mutex::new(None));
    tokio::spawn(console(surfaces.clone(), button.clone()));

    loop {
        let board = HostBoard::new();
        let services = build_services(&cfg, &button, &board)?;
        *surfaces.lock() = Some(services.web.clone());

        let running = Arc::new(AtomicBool::new(true));
        let loop_running = running.clone();
        let fps = cfg.fps();
        let mut main_loop = tokio::task::spawn_blocking(move || run_main_loop(services, fps, loop_running));

        let signalled = tokio::select! {
            result = signal_handler() => {
                if let Err(e) = result {
                    error!("signal handler: {}", e);
                }
                true
            }
            result = &mut main_loop => {
                result.context("main loop panicked")?;
                false
            }
        };

        if signalled {
            running.store(false, Ordering::SeqCst);
            main_loop.await.context("main loop panicked")?;
            break;
        }
        // the provisioning button is only read at boot
        button.hold(false);
        info!("restarting");
    }

    info!("pixslot stopped");
    Ok(())
}
