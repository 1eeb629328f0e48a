//! crates/bookstore_core/src/token.rs
//!
//! The single slot holding the current bearer token.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared handle to the bearer token. Clones point at the same slot.
#[derive(Clone, Default)]
pub struct TokenStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn get(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear(&self) {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    pub fn is_set(&self) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

// Never print the token itself.
impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_token", &self.is_set())
            .finish()
    }
}
