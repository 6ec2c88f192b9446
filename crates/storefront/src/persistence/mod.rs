//! Session-scoped persistence for store state.
//!
//! # Architecture
//!
//! - [`SessionStorage`] is a named-slot string store scoped to one browsing
//!   session: [`MemoryStorage`] lives as long as the process, [`FileStorage`]
//!   as long as its session directory.
//! - [`load_json`] and [`save_json`] are the only way stores touch a slot.
//!   Both are best-effort: a missing or unreadable slot loads as `None`, a
//!   failed write is logged and dropped. Persistence never fails a store
//!   operation.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors that can occur reading or writing a storage slot.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Slot content could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Slot names may only contain ASCII letters, digits, `-` and `_`.
    #[error("Invalid slot name: {0:?}")]
    InvalidSlot(String),
}

/// A key-value area holding serialized state for the current session.
///
/// All methods take `&self`; implementations use interior mutability so one
/// storage area can be shared (via [`Rc`]) between several stores.
pub trait SessionStorage {
    /// Read a slot. Returns `Ok(None)` if the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot name is invalid or the read fails.
    fn get_item(&self, slot: &str) -> Result<Option<String>, PersistenceError>;

    /// Write a slot, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot name is invalid or the write fails.
    fn set_item(&self, slot: &str, value: &str) -> Result<(), PersistenceError>;

    /// Remove a slot. Removing an empty slot succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot name is invalid or the removal fails.
    fn remove_item(&self, slot: &str) -> Result<(), PersistenceError>;

    /// Remove every slot in this session.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be cleared.
    fn clear(&self) -> Result<(), PersistenceError>;
}

impl<S: SessionStorage + ?Sized> SessionStorage for Rc<S> {
    fn get_item(&self, slot: &str) -> Result<Option<String>, PersistenceError> {
        (**self).get_item(slot)
    }

    fn set_item(&self, slot: &str, value: &str) -> Result<(), PersistenceError> {
        (**self).set_item(slot, value)
    }

    fn remove_item(&self, slot: &str) -> Result<(), PersistenceError> {
        (**self).remove_item(slot)
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        (**self).clear()
    }
}

impl<S: SessionStorage + ?Sized> SessionStorage for &S {
    fn get_item(&self, slot: &str) -> Result<Option<String>, PersistenceError> {
        (**self).get_item(slot)
    }

    fn set_item(&self, slot: &str, value: &str) -> Result<(), PersistenceError> {
        (**self).set_item(slot, value)
    }

    fn remove_item(&self, slot: &str) -> Result<(), PersistenceError> {
        (**self).remove_item(slot)
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        (**self).clear()
    }
}

/// Outcome of reading a slot with [`load_json`].
#[derive(Debug)]
pub enum Loaded<T> {
    /// The slot held a valid value.
    Value(T),
    /// The slot was empty.
    Missing,
    /// The slot could not be read or parsed; its content was ignored.
    Unreadable(PersistenceError),
}

impl<T> Loaded<T> {
    /// The loaded value, if any.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Missing | Self::Unreadable(_) => None,
        }
    }
}

/// Read and deserialize a slot.
///
/// Never fails: unreadable content is reported as [`Loaded::Unreadable`]
/// and logged at `warn`.
pub fn load_json<T: DeserializeOwned>(storage: &impl SessionStorage, slot: &str) -> Loaded<T> {
    let raw = match storage.get_item(slot) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Loaded::Missing,
        Err(e) => {
            tracing::warn!(slot, error = %e, "Failed to read session slot");
            return Loaded::Unreadable(e);
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Loaded::Value(value),
        Err(e) => {
            tracing::warn!(slot, error = %e, "Discarding unparseable session slot");
            Loaded::Unreadable(e.into())
        }
    }
}

/// Serialize a value into a slot.
///
/// Best-effort: failures are logged at `warn` and reported as `false`, never
/// propagated.
pub fn save_json<T: Serialize>(storage: &impl SessionStorage, slot: &str, value: &T) -> bool {
    let result = serde_json::to_string(value)
        .map_err(PersistenceError::from)
        .and_then(|raw| storage.set_item(slot, &raw));

    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(slot, error = %e, "Failed to persist session slot");
            false
        }
    }
}

/// Validate a slot name.
pub(crate) fn check_slot(slot: &str) -> Result<(), PersistenceError> {
    let valid = !slot.is_empty()
        && slot
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::InvalidSlot(slot.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        name: String,
        count: u32,
    }

    /// Storage whose writes always fail.
    struct ReadOnly;

    impl SessionStorage for ReadOnly {
        fn get_item(&self, _slot: &str) -> Result<Option<String>, PersistenceError> {
            Ok(None)
        }

        fn set_item(&self, _slot: &str, _value: &str) -> Result<(), PersistenceError> {
            Err(std::io::Error::other("quota exceeded").into())
        }

        fn remove_item(&self, _slot: &str) -> Result<(), PersistenceError> {
            Ok(())
        }

        fn clear(&self) -> Result<(), PersistenceError> {
            Ok(())
        }
    }

    #[test]
    fn test_check_slot() {
        assert!(check_slot("cart").is_ok());
        assert!(check_slot("cart_v2-a").is_ok());
        assert!(matches!(check_slot(""), Err(PersistenceError::InvalidSlot(_))));
        assert!(matches!(
            check_slot("../etc/passwd"),
            Err(PersistenceError::InvalidSlot(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let storage = MemoryStorage::default();
        let snapshot = Snapshot {
            name: "shirt".to_string(),
            count: 2,
        };

        assert!(save_json(&storage, "snap", &snapshot));
        let loaded: Option<Snapshot> = load_json(&storage, "snap").value();
        assert_eq!(loaded, Some(snapshot));
    }

    #[test]
    fn test_load_missing() {
        let storage = MemoryStorage::default();
        assert!(matches!(
            load_json::<Snapshot>(&storage, "snap"),
            Loaded::Missing
        ));
    }

    #[test]
    fn test_load_garbage_is_unreadable() {
        let storage = MemoryStorage::default();
        storage.set_item("snap", "{not json").unwrap();
        assert!(matches!(
            load_json::<Snapshot>(&storage, "snap"),
            Loaded::Unreadable(PersistenceError::Json(_))
        ));
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let snapshot = Snapshot {
            name: "shirt".to_string(),
            count: 1,
        };
        assert!(!save_json(&ReadOnly, "snap", &snapshot));
    }

    #[test]
    fn test_rc_shares_storage() {
        let storage = Rc::new(MemoryStorage::default());
        let other = Rc::clone(&storage);

        storage.set_item("a", "1").unwrap();
        assert_eq!(other.get_item("a").unwrap().as_deref(), Some("1"));
    }
}
