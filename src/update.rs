/*
 *  update.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Firmware and filesystem update over the web upload
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

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use log::{error, info, warn};
use parking_lot::Mutex;
use thiserror::Error;

use crate::display::DisplayMgr;
use crate::fs::FileSystem;
use crate::hal::Board;

/// Upload with this name replaces the filesystem image
pub const FILESYSTEM_FILENAME: &str = "filesystem.bin";

/// How long a status message stays before the restart
pub const SYS_MSG_WAIT: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTarget {
    Firmware,
    Filesystem,
}

impl UpdateTarget {
    pub fn from_filename(filename: &str) -> Self {
        if filename == FILESYSTEM_FILENAME {
            UpdateTarget::Filesystem
        } else {
            UpdateTarget::Firmware
        }
    }

    fn message(&self) -> &'static str {
        match self {
            UpdateTarget::Firmware => "Update sketch.",
            UpdateTarget::Filesystem => "Update filesystem.",
        }
    }
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("OTA - Begin error.")]
    Begin,
    #[error("OTA - Receive error.")]
    Receive,
    #[error("OTA - End error.")]
    End,
    #[error("OTA - Unknown error.")]
    Unknown,
    #[error("no update running")]
    NotRunning,
    #[error("update I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Image writer, flash partition on the device
pub trait Updater: Send {
    /// `size` as announced by the client, if any
    fn begin(&mut self, size: Option<usize>, target: UpdateTarget) -> Result<(), UpdateError>;
    /// Returns the number of bytes taken
    fn write(&mut self, data: &[u8]) -> Result<usize, UpdateError>;
    fn end(&mut self) -> Result<(), UpdateError>;
    fn abort(&mut self);
    fn is_running(&self) -> bool;
}

/// Writes the received image below a directory
pub struct HostUpdater {
    dir: PathBuf,
    file: Option<(BufWriter<File>, PathBuf)>,
    size: Option<usize>,
    written: usize,
}

impl HostUpdater {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), file: None, size: None, written: 0 }
    }
}

impl Updater for HostUpdater {
    fn begin(&mut self, size: Option<usize>, target: UpdateTarget) -> Result<(), UpdateError> {
        if self.file.is_some() {
            return Err(UpdateError::Begin);
        }
        fs::create_dir_all(&self.dir)?;
        let name = match target {
            UpdateTarget::Firmware => "firmware.bin",
            UpdateTarget::Filesystem => FILESYSTEM_FILENAME,
        };
        let path = self.dir.join(name);
        let file = File::create(&path)?;
        self.file = Some((BufWriter::new(file), path));
        self.size = size;
        self.written = 0;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, UpdateError> {
        let (file, _) = self.file.as_mut().ok_or(UpdateError::NotRunning)?;
        file.write_all(data).map_err(|_| UpdateError::Receive)?;
        self.written += data.len();
        Ok(data.len())
    }

    fn end(&mut self) -> Result<(), UpdateError> {
        let (mut file, path) = self.file.take().ok_or(UpdateError::NotRunning)?;
        file.flush()?;
        if self.size.is_some_and(|size| size != self.written) {
            if let Err(e) = fs::remove_file(&path) {
                warn!("short image {} not removed: {}", path.display(), e);
            }
            return Err(UpdateError::End);
        }
        info!("update image {} written, {} bytes", path.display(), self.written);
        Ok(())
    }

    fn abort(&mut self) {
        if let Some((file, path)) = self.file.take() {
            drop(file);
            if let Err(e) = fs::remove_file(&path) {
                warn!("partial image {} not removed: {}", path.display(), e);
            }
        }
    }

    fn is_running(&self) -> bool {
        self.file.is_some()
    }
}

/// Records the image in memory; state is shared for inspection
#[derive(Debug, Default)]
pub struct MockUpdaterState {
    pub data: Vec<u8>,
    pub target: Option<UpdateTarget>,
    pub running: bool,
    pub ended: bool,
    pub aborted: bool,
    pub fail_begin: bool,
    pub fail_write: bool,
}

#[derive(Clone, Default)]
pub struct MockUpdater {
    state: Arc<Mutex<MockUpdaterState>>,
}

impl MockUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Arc<Mutex<MockUpdaterState>> {
        Arc::clone(&self.state)
    }
}

impl Updater for MockUpdater {
    fn begin(&mut self, _size: Option<usize>, target: UpdateTarget) -> Result<(), UpdateError> {
        let mut state = self.state.lock();
        if state.fail_begin || state.running {
            return Err(UpdateError::Begin);
        }
        state.data.clear();
        state.target = Some(target);
        state.running = true;
        state.ended = false;
        state.aborted = false;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, UpdateError> {
        let mut state = self.state.lock();
        if !state.running {
            return Err(UpdateError::NotRunning);
        }
        if state.fail_write {
            return Err(UpdateError::Receive);
        }
        state.data.extend_from_slice(data);
        Ok(data.len())
    }

    fn end(&mut self) -> Result<(), UpdateError> {
        let mut state = self.state.lock();
        if !state.running {
            return Err(UpdateError::NotRunning);
        }
        state.running = false;
        state.ended = true;
        Ok(())
    }

    fn abort(&mut self) {
        let mut state = self.state.lock();
        state.running = false;
        state.aborted = true;
    }

    fn is_running(&self) -> bool {
        self.state.lock().running
    }
}

/// Drives an update: status messages, progress bar and the restart
pub struct UpdateMgr {
    updater: Box<dyn Updater>,
    target: UpdateTarget,
    size: Option<usize>,
    written: usize,
    upload_error: bool,
    restart_at: Option<Instant>,
}

impl UpdateMgr {
    pub fn new(updater: Box<dyn Updater>) -> Self {
        Self {
            updater,
            target: UpdateTarget::Firmware,
            size: None,
            written: 0,
            upload_error: false,
            restart_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.updater.is_running()
    }

    /// Set once an upload failed, cleared by the next begin
    pub fn upload_error(&self) -> bool {
        self.upload_error
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Start an update; a filesystem image unmounts the filesystem first
    pub fn begin_upload(
        &mut self,
        display: &mut DisplayMgr,
        fs: &dyn FileSystem,
        filename: &str,
        size: Option<usize>,
    ) -> Result<(), UpdateError> {
        let target = UpdateTarget::from_filename(filename);
        self.upload_error = false;
        if target == UpdateTarget::Filesystem {
            fs.unmount();
        }
        if let Err(e) = self.updater.begin(size, target) {
            error!("{}", e);
            return Err(e);
        }
        info!("{} {} ({} bytes announced)", target.message(), filename, size.unwrap_or(0));
        self.target = target;
        self.size = size;
        self.written = 0;
        display.show_sys_msg_for(target.message(), Duration::from_secs(3600));
        display.begin_progress();
        Ok(())
    }

    pub fn write_chunk(&mut self, display: &mut DisplayMgr, data: &[u8]) -> Result<(), UpdateError> {
        let taken = self.updater.write(data)?;
        if taken != data.len() {
            return Err(UpdateError::Receive);
        }
        self.written += taken;
        if let Some(size) = self.size.filter(|&size| size > 0) {
            let percent = (self.written * 100 / size).min(100) as u8;
            display.update_progress(percent);
        }
        Ok(())
    }

    pub fn finish(&mut self, display: &mut DisplayMgr) -> Result<(), UpdateError> {
        self.updater.end()?;
        display.update_progress(100);
        display.end_progress();
        display.show_sys_msg_for("Update successful finished.", SYS_MSG_WAIT);
        info!("update finished, {} bytes", self.written);
        Ok(())
    }

    /// Give up an update and bring the filesystem back
    pub fn abort(&mut self, display: &mut DisplayMgr, fs: &dyn FileSystem) {
        self.updater.abort();
        self.upload_error = true;
        if !fs.is_mounted() {
            if let Err(e) = fs.mount() {
                error!("filesystem remount failed: {}", e);
            }
        }
        display.end_progress();
        display.show_sys_msg_for("Upload aborted.", SYS_MSG_WAIT);
        warn!("update aborted after {} bytes", self.written);
    }

    pub fn request_restart(&mut self, delay: Duration) {
        info!("restart in {} ms", delay.as_millis());
        self.restart_at = Some(Instant::now() + delay);
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_at.is_some()
    }

    pub fn restart_due(&self) -> bool {
        self.restart_at.is_some_and(|at| Instant::now() >= at)
    }

    /// Restart the board once a requested restart is due
    pub fn process(&mut self, board: &mut dyn Board) {
        if self.restart_due() {
            self.restart_at = None;
            board.restart();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{MockMatrix, SchedulerConfig};
    use crate::fs::MemFs;
    use crate::hal::MockBoard;

    fn display() -> DisplayMgr {
        DisplayMgr::new(Box::new(MockMatrix::new(32, 8)), &SchedulerConfig::default())
    }

    #[test]
    fn test_update_progress_and_finish() {
        let updater = MockUpdater::new();
        let state = updater.state();
        let mut mgr = UpdateMgr::new(Box::new(updater));
        let mut display = display();
        let fs = MemFs::new();
        assert!(mgr.begin_upload(&mut display, &fs, "firmware.bin", Some(200)).is_ok());
        assert_eq!(display.sys_msg(), "Update sketch.");
        assert!(mgr.write_chunk(&mut display, &[1u8; 100]).is_ok());
        assert_eq!(display.progress(), Some(50));
        assert!(mgr.write_chunk(&mut display, &[2u8; 100]).is_ok());
        assert!(mgr.finish(&mut display).is_ok());
        assert_eq!(display.progress(), None);
        assert_eq!(state.lock().data.len(), 200);
        assert!(state.lock().ended);
    }

    #[test]
    fn test_filesystem_abort_remounts() {
        let updater = MockUpdater::new();
        updater.state().lock().fail_write = true;
        let mut mgr = UpdateMgr::new(Box::new(updater));
        let mut display = display();
        let fs = MemFs::new();
        assert!(mgr.begin_upload(&mut display, &fs, FILESYSTEM_FILENAME, None).is_ok());
        assert!(!fs.is_mounted());
        assert!(mgr.write_chunk(&mut display, b"abc").is_err());
        mgr.abort(&mut display, &fs);
        assert!(fs.is_mounted());
        assert!(mgr.upload_error());
        assert_eq!(display.sys_msg(), "Upload aborted.");
    }

    #[test]
    fn test_restart_when_due() {
        let mut mgr = UpdateMgr::new(Box::new(MockUpdater::new()));
        let mut board = MockBoard::new();
        mgr.request_restart(Duration::ZERO);
        mgr.process(&mut board);
        assert_eq!(board.state().lock().restarts, 1);
        mgr.process(&mut board);
        assert_eq!(board.state().lock().restarts, 1);
    }

    #[test]
    fn test_host_updater_checks_size() {
        let Ok(dir) = tempfile::tempdir() else { return };
        let mut updater = HostUpdater::new(dir.path());
        assert!(updater.begin(Some(4), UpdateTarget::Firmware).is_ok());
        assert!(updater.write(b"abc").is_ok());
        assert!(matches!(updater.end(), Err(UpdateError::End)));
        assert!(!dir.path().join("firmware.bin").exists());
    }

    #[test]
    fn test_host_updater_short_image_already_gone() {
        let Ok(dir) = tempfile::tempdir() else { return };
        let mut updater = HostUpdater::new(dir.path());
        assert!(updater.begin(Some(4), UpdateTarget::Firmware).is_ok());
        assert!(updater.write(b"abc").is_ok());
        assert!(fs::remove_file(dir.path().join("firmware.bin")).is_ok());
        assert!(matches!(updater.end(), Err(UpdateError::End)));
        assert!(!updater.is_running());
    }
}
