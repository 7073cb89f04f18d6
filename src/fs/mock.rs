// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

type SharedBytes = Arc<Mutex<Vec<u8>>>;

#[derive(Debug, Default)]
struct MockState {
    files: HashMap<PathBuf, SharedBytes>,
    /// Paths whose `create` fails (e.g. unwritable location).
    denied: HashSet<PathBuf>,
    /// Per-path byte budget after which writes fail.
    write_budgets: HashMap<PathBuf, usize>,
}

/// In-memory filesystem for tests.
///
/// Writers handed out by [`FileSystem::create`] append into a shared buffer,
/// so a test can inspect exactly what has reached the "disk" at any point.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only means another test thread panicked mid-write.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut state = self.lock();
        state.files.insert(
            path.as_ref().to_path_buf(),
            Arc::new(Mutex::new(content.into())),
        );
    }

    /// Make `create` fail for this path.
    pub fn deny(&self, path: impl AsRef<Path>) {
        self.lock().denied.insert(path.as_ref().to_path_buf());
    }

    /// Let writes to this path succeed for the first `bytes` bytes only.
    pub fn fail_writes_after(&self, path: impl AsRef<Path>, bytes: usize) {
        self.lock()
            .write_budgets
            .insert(path.as_ref().to_path_buf(), bytes);
    }

    /// Current contents of a file, if it exists.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let state = self.lock();
        let bytes = state.files.get(path.as_ref())?;
        let guard = bytes.lock().unwrap_or_else(|e| e.into_inner());
        Some(guard.clone())
    }

    pub fn contents_string(&self, path: impl AsRef<Path>) -> Option<String> {
        self.contents(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self
            .contents(path)
            .ok_or_else(|| anyhow!("File not found: {:?}", path))?;
        String::from_utf8(bytes).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn create(&self, path: &Path) -> Result<Box<dyn Write + Send>> {
        let mut state = self.lock();
        if state.denied.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        let buffer: SharedBytes = Arc::new(Mutex::new(Vec::new()));
        state.files.insert(path.to_path_buf(), Arc::clone(&buffer));
        let budget = state.write_budgets.get(path).copied();
        Ok(Box::new(MockWriter { buffer, budget }))
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().files.contains_key(path)
    }
}

struct MockWriter {
    buffer: SharedBytes,
    budget: Option<usize>,
}

impl Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(budget) = self.budget {
            if guard.len() + buf.len() > budget {
                return Err(io::Error::new(io::ErrorKind::StorageFull, "mock disk full"));
            }
        }
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_visible_before_the_writer_is_dropped() {
        let fs = MockFileSystem::new();
        let mut w = fs.create(Path::new("t.json")).unwrap();
        w.write_all(b"abc").unwrap();
        assert_eq!(fs.contents_string("t.json").as_deref(), Some("abc"));
    }

    #[test]
    fn denied_paths_cannot_be_created() {
        let fs = MockFileSystem::new();
        fs.deny("locked.json");
        assert!(fs.create(Path::new("locked.json")).is_err());
        assert!(!fs.exists(Path::new("locked.json")));
    }

    #[test]
    fn write_budget_is_enforced() {
        let fs = MockFileSystem::new();
        fs.fail_writes_after("small.json", 4);
        let mut w = fs.create(Path::new("small.json")).unwrap();
        w.write_all(b"1234").unwrap();
        assert!(w.write_all(b"5").is_err());
        assert_eq!(fs.contents_string("small.json").as_deref(), Some("1234"));
    }
}
