use std::fmt;

use async_trait::async_trait;
use pgiam_tokens::Token;

use super::{DsqlAuthorizer, RdsAuthorizer};
use crate::{AuthRequest, Authorizer, AuthorizeError};

/// A family of managed database endpoints sharing a token format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointFamily {
    /// Amazon RDS and Aurora, e.g. `db.cluster.us-east-1.rds.amazonaws.com`
    Rds,
    /// Amazon Aurora DSQL, e.g. `mycluster.dsql.us-east-1.on.aws`
    Dsql,
}

/// Host fragments identifying each family, checked in order
const PATTERNS: [(&str, EndpointFamily); 2] = [
    (".rds.", EndpointFamily::Rds),
    (".dsql.", EndpointFamily::Dsql),
];

impl EndpointFamily {
    /// Determines the family of `host`
    ///
    /// The first matching pattern wins.
    pub fn detect(host: &str) -> Result<Self, AuthorizeError> {
        PATTERNS
            .iter()
            .find(|(pattern, _)| host.contains(pattern))
            .map(|&(_, family)| family)
            .ok_or_else(|| AuthorizeError::UnsupportedEndpoint {
                host: host.to_owned(),
            })
    }
}

impl fmt::Display for EndpointFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rds => f.write_str("rds"),
            Self::Dsql => f.write_str("dsql"),
        }
    }
}

/// Issues tokens using the strategy matching the endpoint's host
///
/// This is the default authorizer used by the connector.
#[derive(Clone, Copy, Debug, Default)]
pub struct EndpointAuthorizer {
    rds: RdsAuthorizer,
    dsql: DsqlAuthorizer,
}

#[async_trait]
impl Authorizer for EndpointAuthorizer {
    async fn authorize(&self, request: &AuthRequest<'_>) -> Result<Token, AuthorizeError> {
        let family = EndpointFamily::detect(request.endpoint.host())?;
        tracing::trace!(%family, host = request.endpoint.host(), "matched endpoint family");

        match family {
            EndpointFamily::Rds => self.rds.authorize(request).await,
            EndpointFamily::Dsql => self.dsql.authorize(request).await,
        }
    }
}
