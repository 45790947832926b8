//! Directory-backed key-value backend.
//!
//! DESIGN
//! ======
//! Each key maps to `<dir>/<key>.json`. A `set` writes a sibling temp file
//! and renames it over the target, so a reader sees either the old blob or
//! the new one, never a torn write. There is no locking: two processes
//! writing the same key race and the last rename wins.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{KvError, KvStore};

pub struct FileKv {
    dir: PathBuf,
}

impl FileKv {
    /// Open a store rooted at `dir`. The directory is created lazily on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, KvError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn validate_key(key: &str) -> Result<(), KvError> {
    let valid_chars = key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '_' | '-' | '.'));
    if key.is_empty() || key.starts_with('.') || !valid_chars {
        return Err(KvError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn io_err(key: &str, source: std::io::Error) -> KvError {
    KvError::Io { key: key.to_string(), source }
}

#[async_trait::async_trait]
impl KvStore for FileKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(key, e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_err(key, e))?;

        let tmp = self.dir.join(format!(".{key}.tmp"));
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| io_err(key, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_err(key, e))
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(key, e)),
        }
    }
}

#[cfg(test)]
#[path = "file_test.rs"]
mod tests;
