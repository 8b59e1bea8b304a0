//! Durable per-user storage for the cached state object.
//!
//! One document per user, last writer wins.  The platform serializes a
//! user's turns, so no locking or versioning is attempted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use bc_domain::error::{Error, Result};
use bc_domain::CachedState;

#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// The user's saved state, or `None` for a first-time user.
    async fn load(&self, user_id: &str) -> Result<Option<CachedState>>;

    async fn save(&self, user_id: &str, state: &CachedState) -> Result<()>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// JSON file store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Stores each user's state in `state_path/users/<user>.json`.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (creating if needed) the store under `state_path`.
    pub fn new(state_path: &Path) -> Result<Self> {
        let dir = state_path.join("users");
        std::fs::create_dir_all(&dir).map_err(Error::Io)?;
        tracing::info!(path = %dir.display(), "state store ready");
        Ok(Self { dir })
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(user_id)))
    }
}

/// Percent-encodes the user ID so distinct IDs never share a file and no
/// separator survives into the path.
fn file_stem(user_id: &str) -> String {
    urlencoding::encode(user_id).into_owned()
}

#[async_trait]
impl PersistenceStore for JsonFileStore {
    async fn load(&self, user_id: &str) -> Result<Option<CachedState>> {
        let path = self.path_for(user_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };
        let state = serde_json::from_str(&raw)?;
        Ok(Some(state))
    }

    async fn save(&self, user_id: &str, state: &CachedState) -> Result<()> {
        let path = self.path_for(user_id);
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| Error::Other(format!("serializing state: {e}")))?;
        // Write-then-rename so a crash never leaves a torn document.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!(path = %path.display(), "state saved");
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
pub struct MemoryStore {
    states: RwLock<HashMap<String, CachedState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn load(&self, user_id: &str) -> Result<Option<CachedState>> {
        Ok(self.states.read().get(user_id).cloned())
    }

    async fn save(&self, user_id: &str, state: &CachedState) -> Result<()> {
        self.states
            .write()
            .insert(user_id.to_owned(), state.clone());
        Ok(())
    }
}
