/*
 *  fs.rs
 *
 *  pixslot - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Filesystem capability used for plugin configuration and images
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

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("filesystem is not mounted")]
    Unmounted,
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Storage capability
///
/// Paths are absolute, '/' separated, as on the device flash filesystem.
/// Implementations synchronize internally; callers that need a consistent
/// read-modify-write sequence hold their own plugin lock around it.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &str) -> bool;
    fn read(&self, path: &str) -> Result<Vec<u8>, FsError>;
    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError>;
    fn remove(&self, path: &str) -> Result<(), FsError>;
    fn mkdir(&self, path: &str) -> Result<(), FsError>;

    /// Append to a file, creating it if missing
    fn append(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let mut content = match self.read(path) {
            Ok(content) => content,
            Err(FsError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        content.extend_from_slice(data);
        self.write(path, &content)
    }

    /// Mount again after [`FileSystem::unmount`]
    fn mount(&self) -> Result<(), FsError> {
        Ok(())
    }

    /// Release the filesystem, e.g. before its image gets overwritten
    fn unmount(&self) {}

    fn is_mounted(&self) -> bool {
        true
    }
}

/// Parent directory of an absolute path, "/" for top level entries
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

/// Host filesystem rooted at a data directory
pub struct HostFs {
    root: PathBuf,
    mounted: AtomicBool,
}

impl HostFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), mounted: AtomicBool::new(true) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FsError> {
        if !self.is_mounted() {
            return Err(FsError::Unmounted);
        }
        let rel = Path::new(path.trim_start_matches('/'));
        if rel.components().any(|c| !matches!(c, Component::Normal(_))) && !rel.as_os_str().is_empty() {
            return Err(FsError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(rel))
    }

    fn io(path: &str, source: std::io::Error) -> FsError {
        if source.kind() == std::io::ErrorKind::NotFound {
            FsError::NotFound(path.to_string())
        } else {
            FsError::Io { path: path.to_string(), source }
        }
    }
}

impl FileSystem for HostFs {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let p = self.resolve(path)?;
        std::fs::read(&p).map_err(|e| Self::io(path, e))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let p = self.resolve(path)?;
        std::fs::write(&p, data).map_err(|e| Self::io(path, e))
    }

    fn remove(&self, path: &str) -> Result<(), FsError> {
        let p = self.resolve(path)?;
        std::fs::remove_file(&p).map_err(|e| Self::io(path, e))
    }

    fn mkdir(&self, path: &str) -> Result<(), FsError> {
        let p = self.resolve(path)?;
        std::fs::create_dir_all(&p).map_err(|e| Self::io(path, e))
    }

    fn mount(&self) -> Result<(), FsError> {
        std::fs::create_dir_all(&self.root).map_err(|e| FsError::Io {
            path: self.root.display().to_string(),
            source: e,
        })?;
        self.mounted.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct MemFsInner {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

/// In-memory filesystem, a file can only be written into an existing directory
pub struct MemFs {
    inner: Mutex<MemFsInner>,
    mounted: AtomicBool,
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemFs {
    pub fn new() -> Self {
        let mut inner = MemFsInner::default();
        inner.dirs.insert("/".to_string());
        Self { inner: Mutex::new(inner), mounted: AtomicBool::new(true) }
    }

    /// Number of stored files
    pub fn file_count(&self) -> usize {
        self.inner.lock().files.len()
    }

    fn check(&self, path: &str) -> Result<(), FsError> {
        if !self.is_mounted() {
            return Err(FsError::Unmounted);
        }
        if !path.starts_with('/') || path.split('/').any(|c| c == "..") {
            return Err(FsError::InvalidPath(path.to_string()));
        }
        Ok(())
    }
}

impl FileSystem for MemFs {
    fn exists(&self, path: &str) -> bool {
        if self.check(path).is_err() {
            return false;
        }
        let inner = self.inner.lock();
        inner.files.contains_key(path) || inner.dirs.contains(path)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, FsError> {
        self.check(path)?;
        self.inner.lock().files.get(path).cloned().ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        self.check(path)?;
        let mut inner = self.inner.lock();
        if !inner.dirs.contains(parent_dir(path)) {
            return Err(FsError::NotFound(parent_dir(path).to_string()));
        }
        inner.files.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<(), FsError> {
        self.check(path)?;
        self.inner
            .lock()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    fn mkdir(&self, path: &str) -> Result<(), FsError> {
        self.check(path)?;
        self.inner.lock().dirs.insert(path.trim_end_matches('/').to_string());
        Ok(())
    }

    fn mount(&self) -> Result<(), FsError> {
        self.mounted.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("/a.json"), "/");
        assert_eq!(parent_dir("/configuration/1.json"), "/configuration");
    }

    #[test]
    fn test_memfs_needs_directory() {
        let fs = MemFs::new();
        assert!(matches!(fs.write("/cfg/x.json", b"{}"), Err(FsError::NotFound(_))));
        fs.mkdir("/cfg").ok();
        assert!(fs.write("/cfg/x.json", b"{}").is_ok());
        assert_eq!(fs.read("/cfg/x.json").ok(), Some(b"{}".to_vec()));
        assert!(fs.remove("/cfg/x.json").is_ok());
        assert!(!fs.exists("/cfg/x.json"));
    }

    #[test]
    fn test_memfs_unmounted_rejects() {
        let fs = MemFs::new();
        fs.unmount();
        assert!(matches!(fs.read("/x"), Err(FsError::Unmounted)));
        assert!(fs.mount().is_ok());
        assert!(matches!(fs.read("/x"), Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_hostfs_roundtrip_and_escape() {
        let dir = tempfile::tempdir().ok();
        let Some(dir) = dir else { return };
        let fs = HostFs::new(dir.path());
        assert!(fs.mkdir("/configuration").is_ok());
        assert!(fs.write("/configuration/7.json", b"{\"a\":1}").is_ok());
        assert!(fs.exists("/configuration/7.json"));
        assert!(matches!(fs.read("/../etc/passwd"), Err(FsError::InvalidPath(_))));
        assert!(matches!(fs.read("/missing"), Err(FsError::NotFound(_))));
    }
}
