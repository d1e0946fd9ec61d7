use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Lock artifact enforcing at most one running instance.
///
/// Existence of the file is the only signal checked; the content records the
/// owning process id for the operator. Removing the file externally is the
/// supported way to stop the bot between cycles.
pub struct RunningFile {
    path: PathBuf,
}

impl RunningFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn create(&self) -> Result<()> {
        fs::write(&self.path, std::process::id().to_string())
            .with_context(|| format!("Failed to create running file {}", self.path.display()))
    }

    pub fn remove(&self) -> Result<()> {
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove running file {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_lock() -> RunningFile {
        RunningFile::new(std::env::temp_dir().join(format!("randombot-test-{}.running", Uuid::new_v4())))
    }

    #[test]
    fn test_create_exists_remove_round_trip() {
        let lock = temp_lock();
        assert!(!lock.exists());

        lock.create().unwrap();
        assert!(lock.exists());

        lock.remove().unwrap();
        assert!(!lock.exists());
    }

    #[test]
    fn test_content_is_the_process_id() {
        let lock = temp_lock();
        lock.create().unwrap();

        let content = fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content, std::process::id().to_string());

        lock.remove().unwrap();
    }

    #[test]
    fn test_remove_missing_file_is_an_error() {
        let lock = temp_lock();
        assert!(lock.remove().is_err());
    }
}
