//! File system seam for the state store.
//!
//! [`OsFileSystem`] is the real thing. [`MemoryFileSystem`] keeps files in a
//! shared map so tests and embedders can run without touching disk.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// The file operations the store needs.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn read_text(&self, path: &Path) -> io::Result<String>;
    /// Create or truncate `path` and write `text`.
    fn write_text(&self, path: &Path, text: &str) -> io::Result<()>;
    /// Remove a file. Fails with `NotFound` when it is absent.
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    /// Create `path` and all missing parents. Succeeds if it already exists.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    /// Replace `to` with `from`.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// Direct passthrough to `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
        std::fs::write(path, text)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
}

impl MemoryInner {
    /// The root and the empty path always exist.
    fn has_dir(&self, dir: &Path) -> bool {
        dir.as_os_str().is_empty() || dir.parent().is_none() || self.dirs.contains(dir)
    }

    fn check_parent(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !self.has_dir(parent) => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory {} does not exist", parent.display()),
            )),
            _ => Ok(()),
        }
    }
}

/// In-memory file system. Clones share the same files.
///
/// Writes require the parent directory to exist, like a real disk, so
/// directory creation is exercised by tests that use it.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating its parent directories.
    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        let path = path.into();
        let mut inner = self.inner.write().expect("memory fs lock");
        if let Some(parent) = path.parent() {
            inner.dirs.extend(parent.ancestors().map(Path::to_path_buf));
        }
        inner.files.insert(path, text.into());
    }

    /// Current contents of a file, if present.
    pub fn contents(&self, path: &Path) -> Option<String> {
        let inner = self.inner.read().expect("memory fs lock");
        inner.files.get(path).cloned()
    }

    pub fn has_dir(&self, path: &Path) -> bool {
        let inner = self.inner.read().expect("memory fs lock");
        inner.has_dir(path)
    }

    /// Paths of all stored files, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        let inner = self.inner.read().expect("memory fs lock");
        inner.files.keys().cloned().collect()
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let inner = self.inner.read().expect("memory fs lock");
        inner.files.contains_key(path)
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        self.contents(path).ok_or_else(|| not_found(path))
    }

    fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
        let mut inner = self.inner.write().expect("memory fs lock");
        inner.check_parent(path)?;
        inner.files.insert(path.to_path_buf(), text.to_string());
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.write().expect("memory fs lock");
        inner.files.remove(path).map(drop).ok_or_else(|| not_found(path))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.write().expect("memory fs lock");
        inner.dirs.extend(path.ancestors().map(Path::to_path_buf));
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut inner = self.inner.write().expect("memory fs lock");
        inner.check_parent(to)?;
        let text = inner.files.remove(from).ok_or_else(|| not_found(from))?;
        inner.files.insert(to.to_path_buf(), text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_write_requires_parent_dir() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("/state/app/state.json");

        let err = fs.write_text(path, "{}").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        fs.create_dir_all(Path::new("/state/app")).unwrap();
        fs.write_text(path, "{}").unwrap();
        assert!(fs.exists(path));
        assert_eq!(fs.read_text(path).unwrap(), "{}");
        assert!(fs.has_dir(Path::new("/state")));
    }

    #[test]
    fn memory_remove_missing_fails() {
        let fs = MemoryFileSystem::new();
        fs.insert("/s.json", "{}");
        fs.remove_file(Path::new("/s.json")).unwrap();
        let err = fs.remove_file(Path::new("/s.json")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn memory_rename_replaces_target() {
        let fs = MemoryFileSystem::new();
        fs.insert("/d/a.tmp", "new");
        fs.insert("/d/a", "old");
        fs.rename(Path::new("/d/a.tmp"), Path::new("/d/a")).unwrap();
        assert_eq!(fs.contents(Path::new("/d/a")).as_deref(), Some("new"));
        assert_eq!(fs.files(), vec![PathBuf::from("/d/a")]);
    }

    #[test]
    fn memory_clones_share_files() {
        let fs = MemoryFileSystem::new();
        let other = fs.clone();
        fs.insert("relative.json", "1");
        assert_eq!(other.contents(Path::new("relative.json")).as_deref(), Some("1"));
    }

    #[test]
    fn os_roundtrip_in_tempdir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let file = nested.join("state.json");

        OsFileSystem.create_dir_all(&nested).unwrap();
        OsFileSystem.create_dir_all(&nested).unwrap();
        OsFileSystem.write_text(&file, "hello").unwrap();
        assert!(OsFileSystem.exists(&file));
        assert!(!OsFileSystem.exists(&nested));
        assert_eq!(OsFileSystem.read_text(&file).unwrap(), "hello");

        OsFileSystem.remove_file(&file).unwrap();
        assert_eq!(
            OsFileSystem.remove_file(&file).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
