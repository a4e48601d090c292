use async_trait::async_trait;
use pgiam_tokens::Token;

use super::{presign, SCHEME};
use crate::{AuthRequest, Authorizer, AuthorizeError};

const SERVICE: &str = "dsql";

/// The database user that receives admin tokens
pub const ADMIN_USER: &str = "admin";

/// Issues IAM authentication tokens for Amazon Aurora DSQL clusters
///
/// DSQL signs the bare cluster host; the port is not part of the token. The
/// `admin` user needs a `DbConnectAdmin` token, every other role a
/// `DbConnect` token.
#[derive(Clone, Copy, Debug, Default)]
pub struct DsqlAuthorizer;

impl DsqlAuthorizer {
    /// The action to sign for the given user
    pub fn action_for(user: &str) -> &'static str {
        if user == ADMIN_USER {
            "DbConnectAdmin"
        } else {
            "DbConnect"
        }
    }
}

#[async_trait]
impl Authorizer for DsqlAuthorizer {
    #[tracing::instrument(skip_all, fields(endpoint = %request.endpoint, user = request.user))]
    async fn authorize(&self, request: &AuthRequest<'_>) -> Result<Token, AuthorizeError> {
        let action = Self::action_for(request.user);
        let url = format!(
            "{}{}/?Action={}",
            SCHEME,
            request.endpoint.host(),
            action
        );

        tracing::debug!(action, "issuing Aurora DSQL authentication token");
        presign(&url, SERVICE, request).await
    }
}
