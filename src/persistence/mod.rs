use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Storage collaborator for the editor's JSON artifacts. Paths are relative.
pub trait FileAccess: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn read_file(&self, path: &Path) -> PersistenceResult<String>;
    fn write_file(&self, path: &Path, contents: &str) -> PersistenceResult<()>;
}

/// Files under a root directory on the local disk.
#[derive(Debug, Clone)]
pub struct LocalFileAccess {
    root: PathBuf,
}

impl LocalFileAccess {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl FileAccess for LocalFileAccess {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn read_file(&self, path: &Path) -> PersistenceResult<String> {
        let full = self.resolve(path);
        match std::fs::read_to_string(&full) {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(PersistenceError::NotFound(path.to_path_buf()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn write_file(&self, path: &Path, contents: &str) -> PersistenceResult<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full, contents)?;
        trace!(path = %full.display(), bytes = contents.len(), "wrote file");
        Ok(())
    }
}

/// In-memory store. Can be told to fail upcoming writes.
#[derive(Debug, Default)]
pub struct MemoryFileAccess {
    files: Mutex<HashMap<PathBuf, String>>,
    failing_writes: Mutex<u32>,
    write_count: Mutex<u32>,
}

impl MemoryFileAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.lock().insert(path.into(), contents.into());
        self
    }

    /// The next `count` writes return an io error.
    pub fn fail_next_writes(&self, count: u32) {
        *self.failing_writes.lock() = count;
    }

    /// Writes attempted so far, failed ones included.
    pub fn write_count(&self) -> u32 {
        *self.write_count.lock()
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().get(path.as_ref()).cloned()
    }
}

impl FileAccess for MemoryFileAccess {
    fn exists(&self, path: &Path) -> bool {
        self.files.lock().contains_key(path)
    }

    fn read_file(&self, path: &Path) -> PersistenceResult<String> {
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(path.to_path_buf()))
    }

    fn write_file(&self, path: &Path, contents: &str) -> PersistenceResult<()> {
        *self.write_count.lock() += 1;
        {
            let mut failing = self.failing_writes.lock();
            if *failing > 0 {
                *failing -= 1;
                return Err(io::Error::other("simulated write failure").into());
            }
        }
        self.files
            .lock()
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}

pub mod file;
pub mod saver;

pub use file::{
    ProfileLoad, load_profile, load_today_config, profile_to_json, today_config_to_json,
};
pub use saver::{DebouncedSaver, RetrySaver, SaveTask};
