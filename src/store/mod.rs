// Profile store - named whistle profiles persisted as one collection
//
// Readers get an `Arc` snapshot of the whole collection. Writers build a new
// collection, persist it through the backend, and only then swap it in, so a
// failed write leaves the in-memory view unchanged.

mod backend;
mod collection;

pub use backend::{JsonFileBackend, MemoryBackend, ProfileBackend};
pub use collection::{NamedProfile, ProfileCollection, SaveOutcome};

use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use crate::calibration::WhistleProfile;
use crate::error::{log_store_error, StoreError};

/// Named profile storage over a persistence backend
pub struct ProfileStore {
    backend: Box<dyn ProfileBackend>,
    profiles: RwLock<Arc<ProfileCollection>>,
    /// Serialises writers so concurrent puts cannot lose updates
    write_lock: Mutex<()>,
    load_error: Option<StoreError>,
}

impl ProfileStore {
    /// Open a store over `backend`
    ///
    /// A backend that cannot be read opens as an empty store; the read error
    /// stays available through [`ProfileStore::load_error`].
    pub fn open(backend: Box<dyn ProfileBackend>) -> Self {
        let (collection, load_error) = match backend.load() {
            Ok(entries) => {
                log::info!("[ProfileStore] Loaded {} saved profiles", entries.len());
                (ProfileCollection::from_entries(entries), None)
            }
            Err(err) => {
                log_store_error(&err, "open");
                (ProfileCollection::new(), Some(err))
            }
        };

        Self {
            backend,
            profiles: RwLock::new(Arc::new(collection)),
            write_lock: Mutex::new(()),
            load_error,
        }
    }

    /// Open a store backed by a JSON file
    pub fn open_file<P: AsRef<Path>>(path: P) -> Self {
        Self::open(Box::new(JsonFileBackend::new(path)))
    }

    /// Open an empty in-memory store
    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryBackend::new()))
    }

    /// Error hit while reading the backend at open time, if any
    pub fn load_error(&self) -> Option<&StoreError> {
        self.load_error.as_ref()
    }

    /// Snapshot of the current collection
    pub fn snapshot(&self) -> Result<Arc<ProfileCollection>, StoreError> {
        self.profiles
            .read()
            .map(|guard| Arc::clone(&*guard))
            .map_err(|_| StoreError::StatePoisoned)
    }

    /// Saved profiles in listing order
    pub fn list(&self) -> Result<Vec<NamedProfile>, StoreError> {
        Ok(self.snapshot()?.to_entries())
    }

    /// Saved profile names in listing order
    pub fn names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.snapshot()?.names())
    }

    /// Look up a profile by name, ignoring case
    ///
    /// # Errors
    /// * `StoreError::ProfileNameRequired` - Blank name
    pub fn get(&self, name: &str) -> Result<Option<NamedProfile>, StoreError> {
        require_name(name)?;
        Ok(self.snapshot()?.get(name).cloned())
    }

    /// Save `profile` under `name`, replacing any entry with the same name
    ///
    /// # Errors
    /// * `StoreError::ProfileNameRequired` - Blank name
    /// * `StoreError::StoreUnavailable` - Backend write failed; nothing changed
    pub fn put(&self, name: &str, profile: WhistleProfile) -> Result<SaveOutcome, StoreError> {
        let name = require_name(name)?;

        let _writer = self.write_lock.lock().map_err(|_| StoreError::StatePoisoned)?;
        let mut next = (*self.snapshot()?).clone();
        let outcome = next.insert(name, profile);
        self.commit(next, "put")?;

        log::info!("[ProfileStore] Profile \"{}\" saved ({:?})", name, outcome);
        Ok(outcome)
    }

    /// Delete the profile saved under `name`
    ///
    /// # Returns
    /// * `Ok(true)` - Profile deleted
    /// * `Ok(false)` - No such profile
    /// * `Err(StoreError::ProfileNameRequired)` - Blank name
    pub fn delete(&self, name: &str) -> Result<bool, StoreError> {
        require_name(name)?;
        let _writer = self.write_lock.lock().map_err(|_| StoreError::StatePoisoned)?;
        let mut next = (*self.snapshot()?).clone();
        if next.remove(name).is_none() {
            return Ok(false);
        }
        self.commit(next, "delete")?;

        log::info!("[ProfileStore] Profile \"{}\" deleted", name.trim());
        Ok(true)
    }

    fn commit(&self, next: ProfileCollection, context: &str) -> Result<(), StoreError> {
        self.backend
            .save(&next.to_entries())
            .inspect_err(|err| log_store_error(err, context))?;

        let mut guard = self.profiles.write().map_err(|_| StoreError::StatePoisoned)?;
        *guard = Arc::new(next);
        Ok(())
    }
}

/// Trimmed `name`, or `ProfileNameRequired` when nothing is left
fn require_name(name: &str) -> Result<&str, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::ProfileNameRequired);
    }
    Ok(name)
}
