//! Injectable file-system abstraction.
//!
//! Mirrors the teacher's `interpreter::FileSystem` trait: a small,
//! synchronous surface (this engine is single-threaded and cooperative, so
//! there is no async trait here, unlike the teacher's own `fs::FileSystem`)
//! used by `FromFilePath` sourcing and by any action that touches disk, so
//! tests can swap in an in-memory double instead of touching real paths.

use std::collections::HashMap;
use std::sync::RwLock;

pub trait Fs: Send + Sync {
    fn read_file(&self, path: &str) -> std::io::Result<String>;
    fn write_file(&self, path: &str, contents: &str) -> std::io::Result<()>;
    fn exists(&self, path: &str) -> bool;
    fn is_dir(&self, path: &str) -> bool;
    fn is_file(&self, path: &str) -> bool;
}

/// The default `Fs` backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl Fs for RealFs {
    fn read_file(&self, path: &str) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_file(&self, path: &str, contents: &str) -> std::io::Result<()> {
        std::fs::write(path, contents)
    }

    fn exists(&self, path: &str) -> bool {
        std::path::Path::new(path).exists()
    }

    fn is_dir(&self, path: &str) -> bool {
        std::path::Path::new(path).is_dir()
    }

    fn is_file(&self, path: &str) -> bool {
        std::path::Path::new(path).is_file()
    }
}

/// A test double holding file contents in memory, grounded on the
/// teacher's `fs::in_memory_fs::InMemoryFs`.
#[derive(Debug, Default)]
pub struct InMemoryFs {
    files: RwLock<HashMap<String, String>>,
}

impl InMemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.files.write().unwrap().insert(path.into(), contents.into());
        self
    }
}

impl Fs for InMemoryFs {
    fn read_file(&self, path: &str) -> std::io::Result<String> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))
    }

    fn write_file(&self, path: &str, contents: &str) -> std::io::Result<()> {
        self.files.write().unwrap().insert(path.to_string(), contents.to_string());
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.files.read().unwrap().contains_key(path)
    }

    fn is_dir(&self, _path: &str) -> bool {
        false
    }

    fn is_file(&self, path: &str) -> bool {
        self.exists(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_fs_roundtrip() {
        let fs = InMemoryFs::new().with_file("/etc/app.conf", "key=value");
        assert!(fs.is_file("/etc/app.conf"));
        assert_eq!(fs.read_file("/etc/app.conf").unwrap(), "key=value");
        assert!(fs.read_file("/missing").is_err());
    }
}
