//! IAM authentication for PostgreSQL connection pools on AWS
//!
//! Amazon RDS, Aurora, and Aurora DSQL accept short-lived, SigV4-presigned
//! authentication tokens in place of a database password. The [`Connector`]
//! supplies those tokens to a connection pool: call
//! [`before_connect()`][Connector::before_connect()] from the pool's
//! pre-connect hook and the attempt's password will be set to a current token.
//!
//! The first attempt issues a token and starts a background loop that
//! re-issues it on a fixed interval, so later attempts read the cached token
//! without locking or touching the network. The token format is chosen from
//! the host: `*.rds.*` hosts receive RDS tokens and `*.dsql.*` hosts receive
//! Aurora DSQL tokens.
//!
//! ```no_run
//! use pgiam::{ConnectionAttempt, Connector};
//!
//! # #[tokio::main(flavor = "current_thread")] async fn main() -> Result<(), pgiam::ConnectError> {
//! let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
//! let connector = Connector::builder()
//!     .with_sdk_config(&sdk_config)
//!     .with_region("us-east-1")
//!     .build();
//!
//! let mut attempt = ConnectionAttempt::new("mycluster.dsql.us-east-1.on.aws", 5432, "admin");
//! connector.before_connect(&mut attempt).await?;
//!
//! // hand `attempt.password()` to the driver
//!
//! connector.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! Pools that cannot hold on to a connector can use the stateless
//! [`before_connect()`] function instead, which signs a new RDS token for
//! every attempt carrying an [`aws_region`][REGION_PARAM] runtime parameter.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod attempt;
mod authorizer;
pub mod authorizers;
mod connector;
mod hook;
mod options;

pub use attempt::{ConnectionAttempt, Endpoint, DEFAULT_PORT};
pub use authorizer::{AuthRequest, AuthorizeError, Authorizer};
pub use authorizers::{DsqlAuthorizer, EndpointAuthorizer, EndpointFamily, RdsAuthorizer};
pub use connector::{ConnectError, Connector, ConnectorBuilder};
pub use hook::{before_connect, REGION_PARAM};
pub use options::{ConnectorOptions, DEFAULT_REFRESH_INTERVAL, DEFAULT_TOKEN_LIFETIME};
pub use pgiam_tokens::{AuthToken, AuthTokenRef, Token, TokenStatus};
