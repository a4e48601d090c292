//! A stateless hook for pools that do not keep a connector around

use aws_config::BehaviorVersion;
use aws_credential_types::provider::SharedCredentialsProvider;
use pgiam_clock::{Clock, System, UnixTime};

use crate::{
    AuthRequest, AuthorizeError, Authorizer, ConnectionAttempt, RdsAuthorizer,
    DEFAULT_TOKEN_LIFETIME,
};

/// The runtime parameter carrying the AWS region of the database
///
/// Set it in the connection string, e.g.
/// `postgres://app_user@db.cluster.us-east-1.rds.amazonaws.com:5432/app?aws_region=us-east-1`.
pub const REGION_PARAM: &str = "aws_region";

/// Issues a fresh RDS token for a single connection attempt
///
/// Nothing is cached: the ambient AWS configuration is loaded and a token is
/// signed on every call. Attempts without a user or without a non-empty
/// [`aws_region`][REGION_PARAM] runtime parameter are left untouched. The
/// region parameter is removed once used, so it is never sent to the server.
///
/// # Errors
///
/// Returns an error if no credentials are available or the token cannot be
/// signed.
pub async fn before_connect(attempt: &mut ConnectionAttempt) -> Result<(), AuthorizeError> {
    if !wants_token(attempt) {
        return Ok(());
    }

    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let credentials = sdk_config
        .credentials_provider()
        .ok_or(AuthorizeError::MissingCredentials)?;

    authorize_attempt(attempt, &credentials, System.now()).await
}

fn wants_token(attempt: &ConnectionAttempt) -> bool {
    !attempt.user().is_empty()
        && attempt
            .runtime_param(REGION_PARAM)
            .map_or(false, |region| !region.is_empty())
}

async fn authorize_attempt(
    attempt: &mut ConnectionAttempt,
    credentials: &SharedCredentialsProvider,
    issued: UnixTime,
) -> Result<(), AuthorizeError> {
    let region = match attempt.runtime_param(REGION_PARAM) {
        Some(region) if !region.is_empty() => region.to_owned(),
        _ => return Ok(()),
    };

    let endpoint = attempt.endpoint();
    let request = AuthRequest {
        endpoint: &endpoint,
        user: attempt.user(),
        region: &region,
        credentials,
        issued,
        lifetime: DEFAULT_TOKEN_LIFETIME,
    };

    let token = RdsAuthorizer.authorize(&request).await?;
    attempt.set_password(token.auth_token().as_str());
    attempt.remove_runtime_param(REGION_PARAM);

    Ok(())
}
