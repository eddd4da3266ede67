// Profile persistence backends
//
// The store persists the whole collection at once. Two backends exist:
// - JsonFileBackend: a JSON array on disk, replaced atomically via rename
// - MemoryBackend: in-process storage for tests, with failure injection

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::store::collection::NamedProfile;

/// Load/save contract for the persisted profile list
pub trait ProfileBackend: Send + Sync {
    /// Read the persisted list; an absent store reads as empty
    fn load(&self) -> Result<Vec<NamedProfile>, StoreError>;

    /// Replace the persisted list
    fn save(&self, entries: &[NamedProfile]) -> Result<(), StoreError>;
}

/// Profiles stored as a JSON array in a single file
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ProfileBackend for JsonFileBackend {
    fn load(&self) -> Result<Vec<NamedProfile>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("[ProfileStore] No profile file at {:?}", self.path);
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, entries: &[NamedProfile]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

/// In-memory backend
///
/// `fail_saves` and `fail_loads` make the next operations report the store as
/// unavailable.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<Vec<NamedProfile>>,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-filled with `entries`
    pub fn with_entries(entries: Vec<NamedProfile>) -> Self {
        Self {
            entries: Mutex::new(entries),
            ..Self::default()
        }
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Currently persisted entries
    pub fn entries(&self) -> Result<Vec<NamedProfile>, StoreError> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .map_err(|_| StoreError::StatePoisoned)
    }
}

impl ProfileBackend for MemoryBackend {
    fn load(&self) -> Result<Vec<NamedProfile>, StoreError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StoreError::StoreUnavailable {
                reason: "memory backend configured to fail loads".to_string(),
            });
        }
        self.entries()
    }

    fn save(&self, entries: &[NamedProfile]) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::StoreUnavailable {
                reason: "memory backend configured to fail saves".to_string(),
            });
        }
        let mut guard = self.entries.lock().map_err(|_| StoreError::StatePoisoned)?;
        *guard = entries.to_vec();
        Ok(())
    }
}
