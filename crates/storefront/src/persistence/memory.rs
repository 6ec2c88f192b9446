//! In-process session storage.

use std::cell::RefCell;
use std::collections::HashMap;

use super::{PersistenceError, SessionStorage, check_slot};

/// Session storage held in memory.
///
/// Content lives exactly as long as the value, which makes it the natural
/// backing for tests and for embedding the stores in a long-lived process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty storage area.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Whether no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, slot: &str) -> Result<Option<String>, PersistenceError> {
        check_slot(slot)?;
        Ok(self.slots.borrow().get(slot).cloned())
    }

    fn set_item(&self, slot: &str, value: &str) -> Result<(), PersistenceError> {
        check_slot(slot)?;
        self.slots
            .borrow_mut()
            .insert(slot.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, slot: &str) -> Result<(), PersistenceError> {
        check_slot(slot)?;
        self.slots.borrow_mut().remove(slot);
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        self.slots.borrow_mut().clear();
        Ok(())
    }
}
