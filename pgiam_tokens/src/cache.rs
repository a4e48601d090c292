//! A single-slot, lock-free token cache

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use pgiam_clock::UnixTime;

use crate::Token;

/// Holds at most one current token
///
/// Readers never block writers and never see a partially constructed token:
/// the slot is an atomically swapped reference to an immutable [`Token`].
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: ArcSwapOption<Token>,
}

impl TokenCache {
    /// Constructs an empty cache
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    /// Loads the current token, if any
    #[inline]
    pub fn load(&self) -> Option<Arc<Token>> {
        self.slot.load_full()
    }

    /// Loads the current token if it has not expired as of `now`
    pub fn load_valid_at(&self, now: UnixTime) -> Option<Arc<Token>> {
        self.load().filter(|token| !token.is_expired_at(now))
    }

    /// Replaces the current token, returning the newly stored value
    pub fn store(&self, token: Token) -> Arc<Token> {
        let token = Arc::new(token);
        self.slot.store(Some(Arc::clone(&token)));
        token
    }

    /// Empties the cache
    pub fn clear(&self) {
        self.slot.store(None);
    }

    /// Whether the cache currently holds no token
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slot.load().is_none()
    }
}
