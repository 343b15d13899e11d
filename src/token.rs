//! Bearer-token storage behind the gateway.
//!
//! The rest of the crate only ever talks to [`TokenStore`]; whether the token
//! lives in memory or on disk is an assembly-time choice. Stores are
//! infallible: persistence problems degrade to a session that does not
//! survive restart, which the client already handles.

use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

/// Shared access to the single bearer token of the current session.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str);
    fn clear(&self);
}

/// Process-local store, used by tests and ephemeral invocations.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set(&self, token: &str) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// Store backed by a plain file, so `login` in one invocation carries over to
/// the next.
///
/// Reads go through an in-memory cache loaded once at construction; writes go
/// through to disk best-effort. A failed write is logged and the session
/// continues in memory only.
pub struct FileTokenStore {
    path: PathBuf,
    cache: RwLock<Option<String>>,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        let cached = match fs::read_to_string(&path) {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "could not read stored token");
                None
            }
        };
        Self {
            path,
            cache: RwLock::new(cached),
        }
    }

    fn persist(&self, token: &str) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                tracing::warn!(path = %self.path.display(), error = %err, "could not create token directory");
                return;
            }
        }
        if let Err(err) = fs::write(&self.path, token) {
            tracing::warn!(path = %self.path.display(), error = %err, "could not persist token");
            return;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(err) = fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)) {
                tracing::warn!(path = %self.path.display(), error = %err, "could not restrict token permissions");
            }
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set(&self, token: &str) {
        *self.cache.write().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        self.persist(token);
    }

    fn clear(&self) {
        *self.cache.write().unwrap_or_else(|e| e.into_inner()) = None;
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "could not remove stored token");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_set_get_clear() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get(), None);
        store.set("tok1");
        assert_eq!(store.get().as_deref(), Some("tok1"));
        store.set("tok2");
        assert_eq!(store.get().as_deref(), Some("tok2"));
        store.clear();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials");

        let store = FileTokenStore::new(path.clone());
        assert_eq!(store.get(), None);
        store.set("tok1");
        drop(store);

        let reopened = FileTokenStore::new(path);
        assert_eq!(reopened.get().as_deref(), Some("tok1"));
    }

    #[test]
    fn file_store_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials");

        let store = FileTokenStore::new(path.clone());
        store.set("tok1");
        assert!(path.exists());
        store.clear();
        assert!(!path.exists());
        assert_eq!(store.get(), None);

        // Clearing again is a no-op, not an error.
        store.clear();
    }

    #[test]
    fn file_store_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("credentials");

        let store = FileTokenStore::new(path.clone());
        store.set("tok1");
        assert_eq!(fs::read_to_string(&path).unwrap(), "tok1");
    }

    #[test]
    fn file_store_ignores_whitespace_only_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials");
        fs::write(&path, "  \n").unwrap();

        let store = FileTokenStore::new(path);
        assert_eq!(store.get(), None);
    }

    #[cfg(unix)]
    #[test]
    fn file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials");
        let store = FileTokenStore::new(path.clone());
        store.set("tok1");

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
