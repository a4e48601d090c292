//! Token sources

use crate::Token;
use async_trait::async_trait;
use std::{error, sync::Arc};

/// An asynchronous source for tokens
///
/// The refresh loop holds a source for its whole lifetime and calls it once per
/// tick, so implementations capture whatever parameters they need up front.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// The error type returned in the event that issuing a token fails
    type Error: error::Error + Send + Sync + 'static;

    /// Requests a fresh token from the source
    async fn request_token(&self) -> Result<Token, Self::Error>;
}

#[async_trait]
impl<S> TokenSource for Arc<S>
where
    S: TokenSource + ?Sized,
{
    type Error = S::Error;

    async fn request_token(&self) -> Result<Token, Self::Error> {
        (**self).request_token().await
    }
}
