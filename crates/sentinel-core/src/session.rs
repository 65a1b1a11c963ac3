//! Session manager and durable session stores
//!
//! The session is persisted as a single JSON record
//! `{"isAuthenticated": bool, "user": User | null}` under the key
//! [`SESSION_KEY`]. It is read once at startup, written on login and user
//! updates, and erased on logout.

use crate::error::{EngineError, SessionError};
use chrono::Utc;
use parking_lot::Mutex;
use sentinel_state::{Action, Store, User, UserId, UserPatch, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use ulid::Ulid;

/// Key of the persisted session record
pub const SESSION_KEY: &str = "auth";

/// Persisted session record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub is_authenticated: bool,
    pub user: Option<User>,
}

/// Durable key-value persistence
pub trait SessionStore: Send + Sync + Debug {
    /// Read the value stored under `key`
    fn load(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Store `value` under `key`, replacing any previous value
    fn save(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Erase `key`; erasing a missing key succeeds
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    #[inline]
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing `key`
    #[inline]
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SessionError {
    SessionError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, key: &str) -> Result<Option<String>, SessionError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), SessionError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, value).map_err(|e| io_error(&staging, e))?;
        std::fs::rename(&staging, &path).map_err(|e| io_error(&path, e))
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

/// In-memory store; clones share entries, so a clone handed to a second
/// engine observes what the first one persisted.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySessionStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Login form input
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

impl Credentials {
    #[inline]
    #[must_use]
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }

    /// # Errors
    /// - `ValidationError::MissingField` for an empty identifier or password
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.identifier.trim().is_empty() {
            return Err(ValidationError::MissingField("identifier"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("password"));
        }
        Ok(())
    }
}

/// Signup form input
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub identifier: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    /// # Errors
    /// - `ValidationError::MissingField` for any empty field
    /// - `ValidationError::PasswordMismatch` if the confirmation differs
    pub fn validate(&self) -> Result<(), ValidationError> {
        Credentials::new(self.identifier.clone(), self.password.clone()).validate()?;
        if self.confirm_password.is_empty() {
            return Err(ValidationError::MissingField("confirm_password"));
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }
}

/// Login, logout and profile updates with durable persistence
#[derive(Debug)]
pub struct SessionManager {
    store: Store,
    backend: Arc<dyn SessionStore>,
    restored: AtomicBool,
}

impl SessionManager {
    /// Create new session manager
    #[inline]
    #[must_use]
    pub fn new(store: Store, backend: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            backend,
            restored: AtomicBool::new(false),
        }
    }

    /// Restore a persisted session into the store
    ///
    /// Runs at most once per manager; later calls return `Ok(false)`. An
    /// unreadable record is discarded.
    ///
    /// # Returns
    /// Whether a session was restored
    ///
    /// # Errors
    /// - `SessionError::Io` if the backend cannot be read
    pub fn restore(&self) -> Result<bool, SessionError> {
        if self.restored.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        let Some(raw) = self.backend.load(SESSION_KEY)? else {
            return Ok(false);
        };
        let record: PersistedSession = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable session record");
                self.backend.remove(SESSION_KEY)?;
                return Ok(false);
            }
        };
        match record {
            PersistedSession {
                is_authenticated: true,
                user: Some(user),
            } => {
                tracing::info!(user_id = %user.id, "session restored");
                self.store.dispatch(Action::Login(user));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Log `user` in and persist the session
    ///
    /// # Errors
    /// Persistence failures; the in-memory session is established regardless.
    pub fn login(&self, user: User) -> Result<(), SessionError> {
        tracing::info!(user_id = %user.id, "login");
        self.store.dispatch(Action::Login(user.clone()));
        self.persist(&user)
    }

    /// Validate `credentials` and log the resulting user in
    ///
    /// # Errors
    /// - `EngineError::Validation` for incomplete input (state untouched)
    /// - `EngineError::Session` if persistence fails
    pub fn login_with_credentials(&self, credentials: &Credentials) -> Result<User, EngineError> {
        credentials.validate()?;
        let user = new_user(credentials.identifier.trim());
        self.login(user.clone())?;
        Ok(user)
    }

    /// Validate `form`, create a user and log it in
    ///
    /// # Errors
    /// - `EngineError::Validation` for incomplete or mismatched input
    /// - `EngineError::Session` if persistence fails
    pub fn signup(&self, form: &SignupForm) -> Result<User, EngineError> {
        form.validate()?;
        let user = new_user(form.identifier.trim());
        self.login(user.clone())?;
        Ok(user)
    }

    /// Clear the session and erase the persisted record
    ///
    /// # Errors
    /// Persistence failures; the in-memory session is cleared regardless.
    pub fn logout(&self) -> Result<(), SessionError> {
        tracing::info!("logout");
        self.store.dispatch(Action::Logout);
        self.backend.remove(SESSION_KEY)
    }

    /// Merge `patch` into the current user and re-persist the merged user
    ///
    /// # Returns
    /// The merged user, or `None` if nobody is logged in
    ///
    /// # Errors
    /// Persistence failures
    pub fn update_user(&self, patch: UserPatch) -> Result<Option<User>, SessionError> {
        let merged = self.store.transact(|state| match &state.user {
            Some(user) => {
                let merged = patch.merged(user);
                (vec![Action::UpdateUser(patch)], Some(merged))
            }
            None => (Vec::new(), None),
        });
        if let Some(user) = &merged {
            self.persist(user)?;
        }
        Ok(merged)
    }

    fn persist(&self, user: &User) -> Result<(), SessionError> {
        let record = PersistedSession {
            is_authenticated: true,
            user: Some(user.clone()),
        };
        let raw = serde_json::to_string(&record)?;
        self.backend.save(SESSION_KEY, &raw).map_err(|e| {
            tracing::warn!(error = %e, "failed to persist session");
            e
        })
    }
}

fn new_user(identifier: &str) -> User {
    User::from_identifier(UserId::new(Ulid::new().to_string()), identifier, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_test_utils::{fresh_store, sample_user};

    fn manager() -> (Store, MemorySessionStore, SessionManager) {
        let store = fresh_store();
        let backend = MemorySessionStore::new();
        let manager = SessionManager::new(store.clone(), Arc::new(backend.clone()));
        (store, backend, manager)
    }

    #[test]
    fn login_persists_record() {
        let (store, backend, manager) = manager();
        let user = manager
            .login_with_credentials(&Credentials::new("a@b.io", "pw"))
            .unwrap();

        assert!(store.snapshot().is_authenticated);
        let raw = backend.load(SESSION_KEY).unwrap().unwrap();
        let record: PersistedSession = serde_json::from_str(&raw).unwrap();
        assert!(record.is_authenticated);
        assert_eq!(record.user, Some(user));
    }

    #[test]
    fn invalid_credentials_leave_state_untouched() {
        let (store, backend, manager) = manager();
        let err = manager
            .login_with_credentials(&Credentials::new("", "pw"))
            .unwrap_err();
        assert_eq!(err.user_message().as_deref(), Some("Please fill in all fields"));
        assert_eq!(store.revision(), 0);
        assert!(backend.load(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn signup_rejects_mismatched_passwords() {
        let (_store, _backend, manager) = manager();
        let form = SignupForm {
            identifier: "+15550100".into(),
            password: "a".into(),
            confirm_password: "b".into(),
        };
        assert!(matches!(
            manager.signup(&form),
            Err(EngineError::Validation(ValidationError::PasswordMismatch))
        ));
    }

    #[test]
    fn update_user_persists_merged_user() {
        let (_store, backend, manager) = manager();
        manager
            .login_with_credentials(&Credentials::new("a@b.io", "pw"))
            .unwrap();

        let merged = manager
            .update_user(UserPatch::new().with_avatar(Some("https://img/a.png".into())))
            .unwrap()
            .unwrap();

        let raw = backend.load(SESSION_KEY).unwrap().unwrap();
        let record: PersistedSession = serde_json::from_str(&raw).unwrap();
        assert_eq!(record.user, Some(merged.clone()));
        assert_eq!(merged.avatar_url.as_deref(), Some("https://img/a.png"));
    }

    #[test]
    fn update_user_without_session_is_no_op() {
        let (_store, backend, manager) = manager();
        assert!(manager.update_user(UserPatch::new().with_email("x@y")).unwrap().is_none());
        assert!(backend.load(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn restore_runs_once() {
        let (_store, backend, manager) = manager();
        manager
            .login_with_credentials(&Credentials::new("a@b.io", "pw"))
            .unwrap();

        let store = fresh_store();
        let restarted = SessionManager::new(store.clone(), Arc::new(backend));
        assert!(restarted.restore().unwrap());
        assert!(!restarted.restore().unwrap());
        assert!(store.snapshot().is_authenticated);
    }

    #[test]
    fn logout_erases_persisted_record() {
        let (store, backend, manager) = manager();
        let user = sample_user("+15550100");
        manager.login(user.clone()).unwrap();
        assert_eq!(store.snapshot().user.as_ref().map(User::display_name), Some("+15550100"));

        manager.logout().unwrap();
        assert!(!store.snapshot().is_authenticated);
        assert!(store.snapshot().user.is_none());
        assert!(backend.load(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn corrupt_record_is_discarded() {
        let (store, backend, manager) = manager();
        backend.save(SESSION_KEY, "{not json").unwrap();
        assert!(!manager.restore().unwrap());
        assert!(!store.snapshot().is_authenticated);
        assert!(backend.load(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileSessionStore::new(dir.path().join("session"));
        assert!(files.load(SESSION_KEY).unwrap().is_none());

        files.save(SESSION_KEY, "{}").unwrap();
        assert_eq!(files.load(SESSION_KEY).unwrap().as_deref(), Some("{}"));
        assert!(files.path_for(SESSION_KEY).exists());

        files.remove(SESSION_KEY).unwrap();
        files.remove(SESSION_KEY).unwrap();
        assert!(files.load(SESSION_KEY).unwrap().is_none());
    }
}
