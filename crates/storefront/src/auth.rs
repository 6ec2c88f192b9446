//! Signed-in identity.
//!
//! The backend's login endpoint yields a `{token, user}` pair. It is kept in
//! the `auth` slot of the session storage so a reload stays signed in, and
//! removed on sign-out.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use shopfront_core::UserId;

use crate::persistence::{PersistenceError, SessionStorage, load_json, save_json};

/// Session slot holding the signed-in identity.
pub const AUTH_SLOT: &str = "auth";

/// The signed-in user as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Backend user ID.
    pub id: UserId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Backend role (e.g. `admin`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A bearer token and the user it belongs to.
///
/// Implements `Debug` via `SecretString`, which redacts the token.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "AuthPayload")]
pub struct AuthSession {
    /// Bearer token sent with every backend call.
    pub token: SecretString,
    /// The signed-in user.
    pub user: SessionUser,
}

/// Login response and persisted shape.
#[derive(Deserialize)]
struct AuthPayload {
    token: String,
    user: SessionUser,
}

impl From<AuthPayload> for AuthSession {
    fn from(payload: AuthPayload) -> Self {
        Self::new(payload.token, payload.user)
    }
}

/// Borrowed form written to the slot; `SecretString` does not serialize.
#[derive(Serialize)]
struct StoredAuth<'a> {
    token: &'a str,
    user: &'a SessionUser,
}

impl AuthSession {
    /// Create a session from a token and user.
    #[must_use]
    pub fn new(token: impl Into<String>, user: SessionUser) -> Self {
        Self {
            token: SecretString::from(token.into()),
            user,
        }
    }

    /// Load the persisted session, if any.
    pub fn load(storage: &impl SessionStorage) -> Option<Self> {
        load_json(storage, AUTH_SLOT).value()
    }

    /// Persist the session. Best-effort, like every slot write.
    pub fn save(&self, storage: &impl SessionStorage) -> bool {
        let stored = StoredAuth {
            token: self.token.expose_secret(),
            user: &self.user,
        };
        save_json(storage, AUTH_SLOT, &stored)
    }

    /// Remove the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be removed.
    pub fn forget(storage: &impl SessionStorage) -> Result<(), PersistenceError> {
        storage.remove_item(AUTH_SLOT)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::persistence::MemoryStorage;

    use super::*;

    fn user() -> SessionUser {
        SessionUser {
            id: UserId::new("u1"),
            name: "Ada".to_string(),
            email: Some("ada@example.com".to_string()),
            role: None,
        }
    }

    #[test]
    fn test_save_load_forget() {
        let storage = MemoryStorage::new();
        assert!(AuthSession::load(&storage).is_none());

        AuthSession::new("tok-123", user()).save(&storage);
        let loaded = AuthSession::load(&storage).unwrap();
        assert_eq!(loaded.token.expose_secret(), "tok-123");
        assert_eq!(loaded.user, user());

        AuthSession::forget(&storage).unwrap();
        assert!(AuthSession::load(&storage).is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = AuthSession::new("tok-123", user());
        let debug = format!("{session:?}");
        assert!(!debug.contains("tok-123"));
        assert!(debug.contains("Ada"));
    }

    #[test]
    fn test_deserialize_login_response() {
        let json = r#"{"token":"jwt.abc","user":{"id":"u7","name":"Grace","role":"admin"}}"#;
        let session: AuthSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.user.id, UserId::new("u7"));
        assert_eq!(session.user.role.as_deref(), Some("admin"));
        assert!(session.user.email.is_none());
    }
}
