use roam_core::{CoreError, CoreResult, SessionData, SessionStore};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Session persisted as a small JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn store_error(path: &Path, e: impl std::fmt::Display) -> CoreError {
    CoreError::SessionError(format!("{}: {}", path.display(), e))
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> CoreResult<Option<SessionData>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(store_error(&self.path, e)),
        };
        let data = serde_json::from_str(&raw).map_err(|e| store_error(&self.path, e))?;
        debug!(path = %self.path.display(), "session loaded");
        Ok(Some(data))
    }

    fn save(&self, data: &SessionData) -> CoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| store_error(parent, e))?;
        }
        let raw = serde_json::to_string_pretty(data).map_err(|e| store_error(&self.path, e))?;
        fs::write(&self.path, raw).map_err(|e| store_error(&self.path, e))
    }

    fn clear(&self) -> CoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(store_error(&self.path, e)),
        }
    }
}
