//! Session storage and retrieval.
//!
//! Stores the bearer token and user identity in `<base>/session.json` with
//! restricted permissions (0600). Tokens are never logged or displayed in full.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config;

/// Client-held authentication state.
///
/// Keys match the persisted layout: `token`, `userId`, `name`, `email`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Session {
    /// Returns true if a non-empty token is present.
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Successful login/registration outcome, written verbatim into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    pub token: String,
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl From<AuthResult> for Session {
    fn from(result: AuthResult) -> Self {
        Self {
            token: Some(result.token),
            user_id: result.user_id,
            display_name: result.display_name,
            email: result.email,
        }
    }
}

/// Owner of the process-wide session.
///
/// The in-memory copy is loaded lazily from disk on first access. Writers
/// hold the lock across persist + swap, so readers see either the old or the
/// new session, never a mix.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    /// `None` until first access.
    state: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Creates a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(None),
        }
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current session, reading durable storage on first access.
    ///
    /// An unreadable or corrupt file is treated as an empty session.
    pub fn get(&self) -> Session {
        {
            let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(session) = guard.as_ref() {
                return session.clone();
            }
        }

        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard
            .get_or_insert_with(|| match load_from(&self.path) {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), "ignoring unreadable session: {e:#}");
                    Session::default()
                }
            })
            .clone()
    }

    /// Overwrites the whole session and persists it.
    ///
    /// On a write failure the previous session stays in place.
    ///
    /// # Errors
    /// Returns an error if the session file cannot be written.
    pub fn set(&self, result: AuthResult) -> Result<()> {
        let session = Session::from(result);
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        save_to(&self.path, &session)?;
        tracing::debug!(
            user_id = session.user_id.as_deref().unwrap_or("-"),
            "session stored"
        );
        *guard = Some(session);
        Ok(())
    }

    /// Removes the session from memory and durable storage.
    ///
    /// Returns whether a session existed.
    ///
    /// # Errors
    /// Returns an error if the session file exists but cannot be removed.
    pub fn clear(&self) -> Result<bool> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let had_memory = guard.as_ref().is_some_and(Session::is_authenticated);

        let had_file = match fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to remove session file {}", self.path.display())
                });
            }
        };

        *guard = Some(Session::default());
        tracing::debug!("session cleared");
        Ok(had_memory || had_file)
    }

    /// Returns true iff a non-empty token is present.
    pub fn is_authenticated(&self) -> bool {
        self.get().is_authenticated()
    }

    /// Returns the bearer token, if authenticated.
    pub fn token(&self) -> Option<String> {
        self.get().token.filter(|t| !t.is_empty())
    }
}

/// Loads a session file. Returns an empty session if the file doesn't exist.
fn load_from(path: &Path) -> Result<Session> {
    if !path.exists() {
        return Ok(Session::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session from {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(Session::default());
    }

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse session from {}", path.display()))
}

/// Writes a session file atomically with 0600 permissions.
fn save_to(path: &Path, session: &Session) -> Result<()> {
    let contents = serde_json::to_string_pretty(session).context("Failed to serialize session")?;
    config::write_atomic(path, contents.as_bytes())
        .with_context(|| format!("Failed to save session to {}", path.display()))
}

/// Returns a masked version of a token for display.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "***".to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn sample_result() -> AuthResult {
        AuthResult {
            token: "abc".to_string(),
            user_id: Some("1".to_string()),
            display_name: Some("U".to_string()),
            email: Some("u@x.com".to_string()),
        }
    }

    #[test]
    fn test_set_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        store.set(sample_result()).unwrap();

        let session = store.get();
        assert_eq!(session.token.as_deref(), Some("abc"));
        assert_eq!(session.user_id.as_deref(), Some("1"));
        assert_eq!(session.display_name.as_deref(), Some("U"));
        assert_eq!(session.email.as_deref(), Some("u@x.com"));
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_clear_then_unauthenticated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(&path);
        store.set(sample_result()).unwrap();

        assert!(store.clear().unwrap());

        assert!(!store.is_authenticated());
        assert_eq!(store.get(), Session::default());
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_without_session_reports_false() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        assert!(!store.clear().unwrap());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_session_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        SessionStore::new(&path).set(sample_result()).unwrap();

        let reopened = SessionStore::new(&path);
        assert!(reopened.is_authenticated());
        assert_eq!(reopened.token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_persisted_layout_uses_fixed_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        SessionStore::new(&path).set(sample_result()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["token"], "abc");
        assert_eq!(json["userId"], "1");
        assert_eq!(json["name"], "U");
        assert_eq!(json["email"], "u@x.com");
    }

    #[test]
    fn test_token_only_session_is_authenticated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"token":"only-token"}"#).unwrap();

        let store = SessionStore::new(&path);
        let session = store.get();
        assert!(session.is_authenticated());
        assert_eq!(session.user_id, None);
        assert_eq!(session.display_name, None);
    }

    #[test]
    fn test_empty_token_is_not_authenticated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"token":"","userId":"7"}"#).unwrap();

        let store = SessionStore::new(&path);
        assert!(!store.is_authenticated());
        assert_eq!(store.token(), None);
    }

    #[test]
    fn test_corrupt_file_reads_as_empty_session() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let store = SessionStore::new(&path);
        assert_eq!(store.get(), Session::default());
    }

    #[test]
    fn test_set_overwrites_previous_fields() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.set(sample_result()).unwrap();

        store
            .set(AuthResult {
                token: "xyz".to_string(),
                user_id: None,
                display_name: None,
                email: Some("other@x.com".to_string()),
            })
            .unwrap();

        let session = store.get();
        assert_eq!(session.token.as_deref(), Some("xyz"));
        assert_eq!(session.user_id, None);
        assert_eq!(session.display_name, None);
        assert_eq!(session.email.as_deref(), Some("other@x.com"));
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_has_restricted_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        SessionStore::new(&path).set(sample_result()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "***");
        assert_eq!(
            mask_token("eyJhbGciOiJIUzI1NiJ9.payload.signature"),
            "eyJhbG...ture"
        );
    }
}
