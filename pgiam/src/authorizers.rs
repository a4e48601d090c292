//! Token issuance strategies for AWS managed databases
//!
//! Both RDS and Aurora DSQL tokens are SigV4 presigned `GET` URLs with the
//! `https://` scheme removed. They differ only in the URL being signed and in
//! the service name used for signing.

use std::time::SystemTime;

use aws_credential_types::provider::ProvideCredentials;
use aws_sigv4::{
    http_request::{sign, SignableBody, SignableRequest, SignatureLocation, SigningSettings},
    sign::v4,
};
use aws_smithy_runtime_api::client::identity::Identity;
use pgiam_tokens::{AuthToken, Token};
use url::form_urlencoded;

use crate::{AuthRequest, AuthorizeError};

mod dsql;
mod family;
mod rds;

pub use dsql::{DsqlAuthorizer, ADMIN_USER};
pub use family::{EndpointAuthorizer, EndpointFamily};
pub use rds::RdsAuthorizer;

const SCHEME: &str = "https://";

/// Presigns `url` for `service` and turns the result into a token
async fn presign(
    url: &str,
    service: &str,
    request: &AuthRequest<'_>,
) -> Result<Token, AuthorizeError> {
    let credentials = request.credentials.provide_credentials().await?;
    let expiry = credentials.expiry();
    let identity = Identity::new(credentials, expiry);

    let mut settings = SigningSettings::default();
    settings.signature_location = SignatureLocation::QueryParams;
    settings.expires_in = Some(request.lifetime.into());

    let signing_params = v4::SigningParams::builder()
        .identity(&identity)
        .region(request.region)
        .name(service)
        .time(SystemTime::from(request.issued))
        .settings(settings)
        .build()
        .map_err(|e| AuthorizeError::Signing(e.to_string()))?;

    let signable_request = SignableRequest::new(
        "GET",
        url,
        std::iter::empty::<(&str, &str)>(),
        SignableBody::Bytes(&[]),
    )
    .map_err(|e| AuthorizeError::Signing(e.to_string()))?;

    let (signing_instructions, _) = sign(signable_request, &signing_params.into())
        .map_err(|e| AuthorizeError::Signing(e.to_string()))?
        .into_parts();

    let mut query = form_urlencoded::Serializer::new(String::new());
    for (name, value) in signing_instructions.params() {
        query.append_pair(name, value);
    }

    let unsigned = url.strip_prefix(SCHEME).unwrap_or(url);
    let token = format!("{}&{}", unsigned, query.finish());

    Ok(Token::new(
        AuthToken::new(token),
        request.issued,
        request.lifetime,
    ))
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
