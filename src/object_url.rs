//! Scoped local references to media files and downloaded blobs.
//!
//! An [`ObjectUrl`] is registered in an [`ObjectUrls`] registry when created
//! and revoked when dropped, so every exit path releases it.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, SubGeniusError};

const SCHEME: &str = "blob:subgenius/";

#[derive(Debug, Clone)]
pub enum ObjectSource {
    File(PathBuf),
    Blob(Arc<Vec<u8>>),
}

#[derive(Debug, Clone, Default)]
pub struct ObjectUrls {
    entries: Arc<Mutex<HashMap<Uuid, ObjectSource>>>,
}

impl ObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_for_file(&self, path: impl Into<PathBuf>) -> ObjectUrl {
        self.register(ObjectSource::File(path.into()))
    }

    pub fn create_for_blob(&self, bytes: Vec<u8>) -> ObjectUrl {
        self.register(ObjectSource::Blob(Arc::new(bytes)))
    }

    pub fn resolve(&self, url: &ObjectUrl) -> Result<ObjectSource> {
        self.lock()
            .get(&url.id)
            .cloned()
            .ok_or_else(|| SubGeniusError::InvalidState(format!("{} was revoked", url)))
    }

    /// Number of URLs not yet revoked.
    pub fn live(&self) -> usize {
        self.lock().len()
    }

    fn register(&self, source: ObjectSource) -> ObjectUrl {
        let id = Uuid::new_v4();
        self.lock().insert(id, source);
        debug!("Created object URL {}{}", SCHEME, id);
        ObjectUrl {
            id,
            registry: self.clone(),
        }
    }

    fn revoke(&self, id: &Uuid) {
        if self.lock().remove(id).is_some() {
            debug!("Revoked object URL {}{}", SCHEME, id);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, ObjectSource>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct ObjectUrl {
    id: Uuid,
    registry: ObjectUrls,
}

impl ObjectUrl {
    pub fn as_string(&self) -> String {
        format!("{}{}", SCHEME, self.id)
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", SCHEME, self.id)
    }
}

impl fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectUrl").field(&self.as_string()).finish()
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.registry.revoke(&self.id);
    }
}
