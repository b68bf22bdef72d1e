use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

use crate::error::SessionError;

pub const PERSIST_KEY: &str = "persist";

/// Durable "trust this device" preference. Reads never fail: a missing or
/// unreadable value means `false`.
#[async_trait]
pub trait PersistStore: Send + Sync {
    async fn load(&self) -> bool;
    async fn save(&self, persist: bool) -> Result<(), SessionError>;
}

pub struct FilePersistStore {
    dir: PathBuf,
}

impl FilePersistStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(PERSIST_KEY)
    }
}

#[async_trait]
impl PersistStore for FilePersistStore {
    async fn load(&self) -> bool {
        let path = self.path();
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<bool>(raw.trim()) {
                Ok(value) => value,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unparsable persist flag");
                    false
                }
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No persist flag stored");
                false
            }
        }
    }

    async fn save(&self, persist: bool) -> Result<(), SessionError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let raw = serde_json::to_string(&persist).map_err(std::io::Error::other)?;
        tokio::fs::write(self.path(), raw).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPersistStore {
    value: AtomicBool,
}

impl MemoryPersistStore {
    pub fn new(persist: bool) -> Self {
        Self {
            value: AtomicBool::new(persist),
        }
    }
}

#[async_trait]
impl PersistStore for MemoryPersistStore {
    async fn load(&self) -> bool {
        self.value.load(Ordering::SeqCst)
    }

    async fn save(&self, persist: bool) -> Result<(), SessionError> {
        self.value.store(persist, Ordering::SeqCst);
        Ok(())
    }
}
