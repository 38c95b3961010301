use crate::CoreResult;
use parking_lot::{Mutex, RwLock};
use roam_shared::Secret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// What survives between runs for an authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub token: Option<Secret<String>>,
}

/// Persistence backend for a session.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> CoreResult<Option<SessionData>>;
    fn save(&self, data: &SessionData) -> CoreResult<()>;
    fn clear(&self) -> CoreResult<()>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    data: Mutex<Option<SessionData>>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> CoreResult<Option<SessionData>> {
        Ok(self.data.lock().clone())
    }

    fn save(&self, data: &SessionData) -> CoreResult<()> {
        *self.data.lock() = Some(data.clone());
        Ok(())
    }

    fn clear(&self) -> CoreResult<()> {
        *self.data.lock() = None;
        Ok(())
    }
}

/// Explicit session handle passed to whatever needs the auth token.
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    current: RwLock<SessionData>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store, current: RwLock::new(SessionData::default()) }
    }

    /// Replace the in-memory session with whatever the store holds.
    pub fn load(&self) -> CoreResult<()> {
        let data = self.store.load()?.unwrap_or_default();
        *self.current.write() = data;
        Ok(())
    }

    pub fn save_token(&self, token: impl Into<String>) -> CoreResult<()> {
        let data = SessionData { token: Some(Secret::new(token.into())) };
        self.store.save(&data)?;
        *self.current.write() = data;
        info!("session saved");
        Ok(())
    }

    pub fn clear(&self) -> CoreResult<()> {
        self.store.clear()?;
        *self.current.write() = SessionData::default();
        info!("session cleared");
        Ok(())
    }

    pub fn token(&self) -> Option<Secret<String>> {
        self.current.read().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().token.is_some()
    }
}
