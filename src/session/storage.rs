use directories::ProjectDirs;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::constants::{APP_NAME, TOKEN_SLOT, USER_SLOT};
use crate::utils::StorageError;

/// The two durable slots a session is persisted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Token,
    User,
}

impl Slot {
    pub fn key(self) -> &'static str {
        match self {
            Slot::Token => TOKEN_SLOT,
            Slot::User => USER_SLOT,
        }
    }

    fn file_name(self) -> String {
        match self {
            Slot::Token => self.key().to_string(),
            Slot::User => format!("{}.json", self.key()),
        }
    }
}

/// Durable key/value storage for the session slots
#[cfg_attr(test, mockall::automock)]
pub trait SessionStorage: Send + Sync {
    fn read(&self, slot: Slot) -> Result<Option<String>, StorageError>;

    fn write(&self, slot: Slot, value: &str) -> Result<(), StorageError>;

    /// Removing a slot that does not exist is not an error
    fn remove(&self, slot: Slot) -> Result<(), StorageError>;
}

/// One file per slot inside a directory
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Platform data directory, e.g. ~/.local/share/pantrypal on Linux
    pub fn default_location() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("", "", APP_NAME)
            .ok_or_else(|| StorageError::Unavailable("could not determine home directory".into()))?;
        Self::new(dirs.data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, slot: Slot) -> PathBuf {
        self.dir.join(slot.file_name())
    }
}

impl SessionStorage for FileStorage {
    fn read(&self, slot: Slot) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(slot)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, slot: Slot, value: &str) -> Result<(), StorageError> {
        let path = self.path(slot);
        fs::write(&path, value)?;

        // The token is a credential
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn remove(&self, slot: Slot) -> Result<(), StorageError> {
        match fs::remove_file(self.path(slot)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<Slot, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self, slot: Slot) -> Result<Option<String>, StorageError> {
        Ok(self.slots.lock().get(&slot).cloned())
    }

    fn write(&self, slot: Slot, value: &str) -> Result<(), StorageError> {
        self.slots.lock().insert(slot, value.to_string());
        Ok(())
    }

    fn remove(&self, slot: Slot) -> Result<(), StorageError> {
        self.slots.lock().remove(&slot);
        Ok(())
    }
}
