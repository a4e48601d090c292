//! Facilities for caching and background renewal of database authentication tokens
//!
//! IAM database tokens are short-lived: they are typically accepted for fifteen
//! minutes after they are issued. A connection pool that opens connections
//! throughout its lifetime therefore needs a token that is always current, but
//! issuing one for every connection attempt would put a network round-trip on
//! the connection path.
//!
//! This crate provides the pieces to avoid that:
//!
//! * [`Token`], an immutable token value with its issue time and expiry.
//! * [`TokenCache`], a single-slot cache that readers access without locking.
//! * [`RefreshLoop`], a background task which re-issues the token on a fixed
//!   period from a [`TokenSource`] and publishes it into the cache. It is
//!   stopped through its [`RefreshHandle`], after which it clears the cache.
//!
//! ```
//! use std::{sync::Arc, time::Duration};
//!
//! use pgiam_clock::{Clock, DurationSecs, System};
//! use pgiam_tokens::{AuthToken, RefreshLoop, Token, TokenCache, TokenSource};
//!
//! #[derive(Debug)]
//! struct Static;
//!
//! #[async_trait::async_trait]
//! impl TokenSource for Static {
//!     type Error = std::io::Error;
//!
//!     async fn request_token(&self) -> Result<Token, Self::Error> {
//!         Ok(Token::new(AuthToken::from_static("token"), System.now(), DurationSecs(900)))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")] async fn main() {
//! let cache = Arc::new(TokenCache::new());
//! cache.store(Static.request_token().await.unwrap());
//!
//! let refresh = RefreshLoop::new(Static, Arc::clone(&cache), Duration::from_secs(600));
//! let handle = refresh.handle();
//! refresh.spawn();
//!
//! assert_eq!(cache.load().unwrap().auth_token().as_str(), "token");
//!
//! handle.stop();
//! handle.finished().await;
//! assert!(cache.is_empty());
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod braids;
mod cache;
mod refresh;
mod sources;
mod tokens;

pub use braids::*;
pub use cache::TokenCache;
pub use refresh::{RefreshHandle, RefreshLoop};
pub use sources::TokenSource;
pub use tokens::{Token, TokenStatus};
