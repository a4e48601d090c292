use async_trait::async_trait;
use pgiam_tokens::Token;

use super::{encode, presign, SCHEME};
use crate::{AuthRequest, Authorizer, AuthorizeError};

const SERVICE: &str = "rds-db";

/// Issues IAM authentication tokens for Amazon RDS and Aurora endpoints
///
/// The signed URL embeds the endpoint as `host:port` along with the database
/// user, so a token is only valid for that exact combination.
#[derive(Clone, Copy, Debug, Default)]
pub struct RdsAuthorizer;

#[async_trait]
impl Authorizer for RdsAuthorizer {
    #[tracing::instrument(skip_all, fields(endpoint = %request.endpoint, user = request.user))]
    async fn authorize(&self, request: &AuthRequest<'_>) -> Result<Token, AuthorizeError> {
        let url = format!(
            "{}{}/?Action=connect&DBUser={}",
            SCHEME,
            request.endpoint,
            encode(request.user)
        );

        tracing::debug!("issuing RDS authentication token");
        presign(&url, SERVICE, request).await
    }
}
