//! The token issuance interface and its error type

use async_trait::async_trait;
use aws_credential_types::provider::{error::CredentialsError, SharedCredentialsProvider};
use pgiam_clock::{DurationSecs, UnixTime};
use pgiam_tokens::Token;
use thiserror::Error;

use crate::Endpoint;

/// An error while issuing an authentication token
#[derive(Debug, Error)]
pub enum AuthorizeError {
    /// The host does not belong to any supported endpoint family
    #[error("unsupported endpoint `{host}`: not an RDS or Aurora DSQL host")]
    UnsupportedEndpoint {
        /// The host that failed to match
        host: String,
    },
    /// No AWS credentials provider has been configured
    #[error("no AWS credentials provider configured")]
    MissingCredentials,
    /// The credentials provider failed to produce credentials
    #[error("unable to load AWS credentials")]
    Credentials(#[from] CredentialsError),
    /// The token could not be signed
    #[error("unable to sign authentication token: {0}")]
    Signing(String),
}

/// Everything needed to issue a single token
#[derive(Debug)]
pub struct AuthRequest<'a> {
    /// The database endpoint
    pub endpoint: &'a Endpoint,
    /// The database user the token is for
    pub user: &'a str,
    /// The AWS region of the database
    pub region: &'a str,
    /// The source of the AWS credentials used to sign the token
    pub credentials: &'a SharedCredentialsProvider,
    /// The time the token is issued at
    pub issued: UnixTime,
    /// How long the token should be accepted for
    pub lifetime: DurationSecs,
}

/// A strategy for issuing database authentication tokens
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Issues a token for the requested endpoint and user
    async fn authorize(&self, request: &AuthRequest<'_>) -> Result<Token, AuthorizeError>;
}

#[async_trait]
impl<A> Authorizer for std::sync::Arc<A>
where
    A: Authorizer + ?Sized,
{
    async fn authorize(&self, request: &AuthRequest<'_>) -> Result<Token, AuthorizeError> {
        (**self).authorize(request).await
    }
}
