//! The credential-refreshing connector

use std::{
    error,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use pgiam_clock::{Clock, DurationSecs, System};
use pgiam_tokens::{RefreshHandle, RefreshLoop, Token, TokenCache, TokenSource};
use thiserror::Error;

use crate::{
    AuthRequest, AuthorizeError, Authorizer, ConnectionAttempt, ConnectorOptions, Endpoint,
    EndpointAuthorizer,
};

/// An error while preparing a connection attempt
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The connector has been closed and no longer issues tokens
    #[error("connector has been closed")]
    Closed,
    /// A token was needed but could not be issued
    #[error("unable to issue database authentication token")]
    Authorize(#[from] AuthorizeError),
}

#[derive(Debug)]
struct Inner<A, C> {
    cache: Arc<TokenCache>,
    refresh: ArcSwapOption<RefreshHandle>,
    closed: AtomicBool,
    authorizer: Arc<A>,
    region: Option<String>,
    credentials: Option<SharedCredentialsProvider>,
    refresh_interval: Duration,
    token_lifetime: DurationSecs,
    clock: C,
}

/// Supplies IAM authentication tokens to a connection pool
///
/// Construct one connector per pool and call
/// [`before_connect()`][Self::before_connect()] before every new physical
/// connection. The first call issues a token and starts a background loop
/// that re-issues it every refresh interval; later calls use the cached token
/// unless it has expired.
///
/// Clones share the same cache and refresh loop. The loop stops when
/// [`close()`][Self::close()] or [`shutdown()`][Self::shutdown()] is called,
/// or when the last clone is dropped.
///
/// ```no_run
/// # #[tokio::main(flavor = "current_thread")] async fn main() -> Result<(), pgiam::ConnectError> {
/// use pgiam::{ConnectionAttempt, Connector};
///
/// let connector = Connector::from_env().await;
///
/// let mut attempt =
///     ConnectionAttempt::new("db.cluster.us-east-1.rds.amazonaws.com", 5432, "app_user");
/// connector.before_connect(&mut attempt).await?;
/// assert!(attempt.password().is_some());
///
/// connector.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Connector<A = EndpointAuthorizer, C = System> {
    inner: Arc<Inner<A, C>>,
}

impl<A, C> Clone for Connector<A, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Connector {
    /// Starts building a connector
    pub fn builder() -> ConnectorBuilder {
        ConnectorBuilder::new()
    }

    /// Constructs a connector from the ambient AWS configuration
    ///
    /// Region and credentials are resolved the same way the AWS SDK resolves
    /// them: environment, shared config files, then instance metadata.
    pub async fn from_env() -> Self {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::from_sdk_config(&sdk_config)
    }

    /// Constructs a connector from a loaded AWS configuration
    pub fn from_sdk_config(sdk_config: &SdkConfig) -> Self {
        ConnectorBuilder::new().with_sdk_config(sdk_config).build()
    }
}

impl<A, C> Connector<A, C> {
    /// Stops the refresh loop and rejects any further connection attempts
    ///
    /// Closing is idempotent. The loop clears the cached token once it has
    /// observed the signal; use [`shutdown()`][Self::shutdown()] to wait for
    /// that.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("closing connector");
        }

        if let Some(handle) = self.inner.refresh.load_full() {
            handle.stop();
        }
    }

    /// Closes the connector and waits for the refresh loop to exit
    pub async fn shutdown(&self) {
        self.close();

        if let Some(handle) = self.inner.refresh.load_full() {
            handle.finished().await;
        }

        tracing::info!("connector shut down");
    }

    /// Whether the connector has been closed
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Whether a refresh loop is currently running
    pub fn is_refreshing(&self) -> bool {
        self.inner
            .refresh
            .load_full()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// The currently cached token, if any
    pub fn cached_token(&self) -> Option<Arc<Token>> {
        self.inner.cache.load()
    }
}

impl<A, C> Connector<A, C>
where
    A: Authorizer + 'static,
    C: Clock + Clone + Send + Sync + 'static,
{
    /// Fills in the password of a connection attempt with a current token
    ///
    /// Attempts without a user, or made while no region is configured, are
    /// left untouched so that pools mixing IAM and password authentication
    /// keep working.
    ///
    /// When no valid token is cached, one is issued before returning, so the
    /// call waits for at most one issuance. Concurrent callers that all find
    /// the cache empty each issue a token and the last one stored wins.
    /// A token re-issued here does not reset the refresh loop's schedule, so
    /// the next background refresh may follow shortly after.
    ///
    /// # Errors
    ///
    /// Returns an error if the connector is closed, including when it is
    /// closed while a token is being issued, or if a token was needed and
    /// could not be issued. No retries are made.
    #[tracing::instrument(
        skip_all,
        fields(db.host = attempt.host(), db.port = attempt.port(), db.user = attempt.user())
    )]
    pub async fn before_connect(&self, attempt: &mut ConnectionAttempt) -> Result<(), ConnectError> {
        let inner = &*self.inner;

        if inner.closed.load(Ordering::SeqCst) {
            return Err(ConnectError::Closed);
        }

        if attempt.user().is_empty() {
            tracing::debug!("no user set, leaving password untouched");
            return Ok(());
        }

        let region = match inner.region.as_deref() {
            Some(region) if !region.is_empty() => region,
            _ => {
                tracing::debug!("no region set, leaving password untouched");
                return Ok(());
            }
        };

        let token = match inner.cache.load_valid_at(inner.clock.now()) {
            Some(token) => {
                tracing::trace!(expiry = token.expiry().0, "using cached token");
                token
            }
            None => self.issue(attempt, region).await?,
        };

        attempt.set_password(token.auth_token().as_str());
        Ok(())
    }

    async fn issue(
        &self,
        attempt: &ConnectionAttempt,
        region: &str,
    ) -> Result<Arc<Token>, ConnectError> {
        let inner = &*self.inner;

        let credentials = inner
            .credentials
            .clone()
            .ok_or(AuthorizeError::MissingCredentials)?;

        let source = AttemptTokenSource {
            authorizer: Arc::clone(&inner.authorizer),
            credentials,
            endpoint: attempt.endpoint(),
            user: attempt.user().to_owned(),
            region: region.to_owned(),
            lifetime: inner.token_lifetime,
            clock: inner.clock.clone(),
        };

        let token = match source.request_token().await {
            Ok(token) => token,
            Err(error) => {
                tracing::debug!(
                    error = (&error as &dyn error::Error),
                    "unable to issue token"
                );
                return Err(error.into());
            }
        };

        tracing::debug!(expiry = token.expiry().0, "issued new token");
        let token = inner.cache.store(token);

        // A shutdown that finished while the token was being issued has
        // already cleared the cache
        if inner.closed.load(Ordering::SeqCst) {
            inner.cache.clear();
            tracing::debug!("connector closed during issuance, discarding token");
            return Err(ConnectError::Closed);
        }

        self.ensure_refreshing(source);

        Ok(token)
    }

    /// Starts the refresh loop unless one has already been started
    fn ensure_refreshing(&self, source: AttemptTokenSource<A, C>) {
        let inner = &*self.inner;

        if inner.refresh.load().is_some() {
            return;
        }

        let refresh = RefreshLoop::new(source, Arc::clone(&inner.cache), inner.refresh_interval);
        let handle = Arc::new(refresh.handle());

        let empty: Option<Arc<RefreshHandle>> = None;
        let previous = inner
            .refresh
            .compare_and_swap(&empty, Some(Arc::clone(&handle)));

        if previous.is_some() {
            tracing::trace!("refresh loop started by a concurrent attempt");
            return;
        }

        refresh.spawn();
        tracing::debug!("started token refresh loop");

        // A close that raced the swap above may have missed this handle
        if inner.closed.load(Ordering::SeqCst) {
            handle.stop();
        }
    }
}

/// Issues tokens with the parameters of the attempt that started the loop
#[derive(Debug)]
struct AttemptTokenSource<A, C> {
    authorizer: Arc<A>,
    credentials: SharedCredentialsProvider,
    endpoint: Endpoint,
    user: String,
    region: String,
    lifetime: DurationSecs,
    clock: C,
}

#[async_trait]
impl<A, C> TokenSource for AttemptTokenSource<A, C>
where
    A: Authorizer,
    C: Clock + Send + Sync,
{
    type Error = AuthorizeError;

    async fn request_token(&self) -> Result<Token, Self::Error> {
        let request = AuthRequest {
            endpoint: &self.endpoint,
            user: &self.user,
            region: &self.region,
            credentials: &self.credentials,
            issued: self.clock.now(),
            lifetime: self.lifetime,
        };

        self.authorizer.authorize(&request).await
    }
}

/// Builder for a [`Connector`]
#[derive(Debug)]
#[must_use]
pub struct ConnectorBuilder<A = EndpointAuthorizer, C = System> {
    authorizer: A,
    region: Option<String>,
    credentials: Option<SharedCredentialsProvider>,
    options: ConnectorOptions,
    clock: C,
}

impl Default for ConnectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectorBuilder {
    /// Starts a builder with no region or credentials, dispatching on the
    /// endpoint host and using the system clock
    pub fn new() -> Self {
        Self {
            authorizer: EndpointAuthorizer::default(),
            region: None,
            credentials: None,
            options: ConnectorOptions::default(),
            clock: System,
        }
    }
}

impl<A, C> ConnectorBuilder<A, C> {
    /// Uses the region and credentials of a loaded AWS configuration
    ///
    /// Values missing from the configuration leave the builder unchanged.
    pub fn with_sdk_config(mut self, sdk_config: &SdkConfig) -> Self {
        if let Some(region) = sdk_config.region() {
            self.region = Some(region.to_string());
        }

        if let Some(credentials) = sdk_config.credentials_provider() {
            self.credentials = Some(credentials);
        }

        self
    }

    /// Sets the AWS region of the database
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets the source of the AWS credentials used to sign tokens
    pub fn with_credentials_provider(
        mut self,
        provider: impl ProvideCredentials + 'static,
    ) -> Self {
        self.credentials = Some(SharedCredentialsProvider::new(provider));
        self
    }

    /// Applies settings from a configuration file
    ///
    /// A region in the options takes precedence over any set previously.
    pub fn with_options(mut self, options: ConnectorOptions) -> Self {
        if let Some(region) = options.region.clone() {
            self.region = Some(region);
        }

        self.options = options;
        self
    }

    /// Sets how often the background loop re-issues the token
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.options.refresh_interval = interval.into();
        self
    }

    /// Sets how long each issued token is accepted for
    pub fn with_token_lifetime(mut self, lifetime: DurationSecs) -> Self {
        self.options.token_lifetime = lifetime;
        self
    }

    /// Replaces the token issuance strategy
    pub fn with_authorizer<B>(self, authorizer: B) -> ConnectorBuilder<B, C> {
        ConnectorBuilder {
            authorizer,
            region: self.region,
            credentials: self.credentials,
            options: self.options,
            clock: self.clock,
        }
    }

    /// Sets a custom clock to be used
    ///
    /// Useful for testing purposes
    pub fn with_clock<D>(self, clock: D) -> ConnectorBuilder<A, D> {
        ConnectorBuilder {
            authorizer: self.authorizer,
            region: self.region,
            credentials: self.credentials,
            options: self.options,
            clock,
        }
    }

    /// Builds the connector
    pub fn build(self) -> Connector<A, C> {
        if !self.options.refreshes_before_expiry() {
            tracing::warn!(
                refresh_interval = self.options.refresh_interval.0,
                token_lifetime = self.options.token_lifetime.0,
                "refresh interval is not shorter than the token lifetime, tokens will expire between refreshes"
            );
        }

        Connector {
            inner: Arc::new(Inner {
                cache: Arc::new(TokenCache::new()),
                refresh: ArcSwapOption::empty(),
                closed: AtomicBool::new(false),
                authorizer: Arc::new(self.authorizer),
                region: self.region,
                credentials: self.credentials,
                refresh_interval: self.options.refresh_period(),
                token_lifetime: self.options.token_lifetime,
                clock: self.clock,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use pgiam_clock::{TestClock, UnixTime};
    use pgiam_tokens::AuthToken;
    use tokio::time;

    use super::*;
    use crate::authorizers::test_support::static_credentials;

    const RDS_HOST: &str = "db.cluster.us-east-1.rds.amazonaws.com";
    const PERIOD: Duration = Duration::from_secs(600);
    const LIFETIME_SECS: u64 = crate::DEFAULT_TOKEN_LIFETIME.0;

    #[derive(Debug, Default)]
    struct CountingAuthorizer {
        calls: AtomicUsize,
        failing: AtomicBool,
        delay: Option<Duration>,
    }

    impl CountingAuthorizer {
        fn delayed(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn fail(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Authorizer for CountingAuthorizer {
        async fn authorize(&self, request: &AuthRequest<'_>) -> Result<Token, AuthorizeError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

            if let Some(delay) = self.delay {
                time::sleep(delay).await;
            }

            if self.failing.load(Ordering::SeqCst) {
                return Err(AuthorizeError::Signing("token service unavailable".into()));
            }

            Ok(Token::new(
                AuthToken::new(format!(
                    "{}/{}@{}#{}",
                    request.endpoint, request.user, request.region, n
                )),
                request.issued,
                request.lifetime,
            ))
        }
    }

    fn connector(
        authorizer: &Arc<CountingAuthorizer>,
        clock: &TestClock,
    ) -> Connector<Arc<CountingAuthorizer>, TestClock> {
        Connector::builder()
            .with_region("us-east-1")
            .with_credentials_provider(static_credentials())
            .with_refresh_interval(PERIOD)
            .with_authorizer(Arc::clone(authorizer))
            .with_clock(clock.clone())
            .build()
    }

    fn attempt() -> ConnectionAttempt {
        ConnectionAttempt::new(RDS_HOST, 5432, "app_user")
    }

    fn clock() -> TestClock {
        TestClock::new(UnixTime(1_700_000_000))
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_issues_and_starts_refreshing() {
        let authorizer = Arc::new(CountingAuthorizer::default());
        let connector = connector(&authorizer, &clock());

        let mut attempt = attempt();
        connector.before_connect(&mut attempt).await.unwrap();

        assert_eq!(
            attempt.password(),
            Some("db.cluster.us-east-1.rds.amazonaws.com:5432/app_user@us-east-1#1")
        );
        assert_eq!(authorizer.calls(), 1);
        assert!(connector.is_refreshing());

        connector.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn valid_cached_token_is_reused() {
        let authorizer = Arc::new(CountingAuthorizer::default());
        let connector = connector(&authorizer, &clock());

        let mut first = attempt();
        let mut second = attempt();
        connector.before_connect(&mut first).await.unwrap();
        connector.before_connect(&mut second).await.unwrap();

        assert_eq!(authorizer.calls(), 1);
        assert_eq!(first.password(), second.password());

        connector.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn expired_token_is_reissued_synchronously() {
        let authorizer = Arc::new(CountingAuthorizer::default());
        let clock = clock();
        let connector = connector(&authorizer, &clock);

        let mut attempt = attempt();
        connector.before_connect(&mut attempt).await.unwrap();
        assert_eq!(authorizer.calls(), 1);

        clock.inc(LIFETIME_SECS);
        assert!(connector
            .cached_token()
            .unwrap()
            .is_expired_at(clock.now()));

        let mut attempt = self::attempt();
        connector.before_connect(&mut attempt).await.unwrap();

        assert_eq!(authorizer.calls(), 2);
        assert!(attempt.password().unwrap().ends_with("#2"));
        assert!(!connector
            .cached_token()
            .unwrap()
            .is_expired_at(clock.now()));

        connector.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn missing_user_or_region_is_skipped() {
        let authorizer = Arc::new(CountingAuthorizer::default());
        let connector = connector(&authorizer, &clock());

        let mut no_user = ConnectionAttempt::new(RDS_HOST, 5432, "").with_password("static");
        connector.before_connect(&mut no_user).await.unwrap();
        assert_eq!(no_user.password(), Some("static"));

        let no_region = Connector::builder()
            .with_credentials_provider(static_credentials())
            .with_authorizer(Arc::clone(&authorizer))
            .build();
        let mut attempt = attempt();
        no_region.before_connect(&mut attempt).await.unwrap();
        assert_eq!(attempt.password(), None);

        assert_eq!(authorizer.calls(), 0);
        assert!(!connector.is_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn issuance_failure_reaches_the_caller() {
        let authorizer = Arc::new(CountingAuthorizer::default());
        authorizer.fail(true);
        let connector = connector(&authorizer, &clock());

        let mut attempt = attempt();
        let err = connector.before_connect(&mut attempt).await.unwrap_err();

        assert!(matches!(
            err,
            ConnectError::Authorize(AuthorizeError::Signing(_))
        ));
        assert_eq!(attempt.password(), None);
        assert!(connector.cached_token().is_none());
        assert!(!connector.is_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_credentials_are_reported() {
        let connector = Connector::builder().with_region("us-east-1").build();

        let mut attempt = attempt();
        let err = connector.before_connect(&mut attempt).await.unwrap_err();

        assert!(matches!(
            err,
            ConnectError::Authorize(AuthorizeError::MissingCredentials)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unsupported_endpoint_is_reported() {
        let connector = Connector::builder()
            .with_region("us-east-1")
            .with_credentials_provider(static_credentials())
            .build();

        let mut attempt = ConnectionAttempt::new("example.com", 5432, "app_user");
        let err = connector.before_connect(&mut attempt).await.unwrap_err();

        assert!(matches!(
            err,
            ConnectError::Authorize(AuthorizeError::UnsupportedEndpoint { .. })
        ));
        assert_eq!(attempt.password(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn default_connector_issues_rds_tokens() {
        let connector = Connector::builder()
            .with_region("us-east-1")
            .with_credentials_provider(static_credentials())
            .build();

        let mut attempt = attempt();
        connector.before_connect(&mut attempt).await.unwrap();

        assert!(attempt
            .password()
            .unwrap()
            .starts_with("db.cluster.us-east-1.rds.amazonaws.com:5432/?Action=connect&DBUser=app_user&"));

        connector.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_first_attempts_start_a_single_loop() {
        let authorizer = Arc::new(CountingAuthorizer::delayed(Duration::from_secs(1)));
        let connector = connector(&authorizer, &clock());

        let tasks = (0..16)
            .map(|_| {
                let connector = connector.clone();
                tokio::spawn(async move {
                    let mut attempt = attempt();
                    connector.before_connect(&mut attempt).await.map(|()| attempt)
                })
            })
            .collect::<Vec<_>>();

        for task in tasks {
            let attempt = task.await.unwrap().unwrap();
            let password = attempt.password().unwrap();
            assert!(password.starts_with("db.cluster.us-east-1.rds.amazonaws.com:5432/app_user@"));
        }

        let issued = authorizer.calls();
        assert!((1..=16).contains(&issued));

        time::sleep(PERIOD + PERIOD / 2).await;
        assert_eq!(authorizer.calls(), issued + 1);

        connector.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_replaces_the_cached_token() {
        let authorizer = Arc::new(CountingAuthorizer::default());
        let connector = connector(&authorizer, &clock());

        let mut attempt = attempt();
        connector.before_connect(&mut attempt).await.unwrap();

        time::sleep(PERIOD + PERIOD / 2).await;
        assert_eq!(authorizer.calls(), 2);

        let mut attempt = self::attempt();
        connector.before_connect(&mut attempt).await.unwrap();
        assert!(attempt.password().unwrap().ends_with("#2"));
        assert_eq!(authorizer.calls(), 2);

        connector.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_the_working_token() {
        let authorizer = Arc::new(CountingAuthorizer::default());
        let connector = connector(&authorizer, &clock());

        let mut attempt = attempt();
        connector.before_connect(&mut attempt).await.unwrap();

        authorizer.fail(true);
        time::sleep(PERIOD + PERIOD / 2).await;
        assert_eq!(authorizer.calls(), 2);

        let cached = connector.cached_token().unwrap();
        assert!(cached.auth_token().as_str().ends_with("#1"));

        let mut attempt = self::attempt();
        connector.before_connect(&mut attempt).await.unwrap();
        assert!(attempt.password().unwrap().ends_with("#1"));
        assert_eq!(authorizer.calls(), 2);

        connector.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_refreshing_and_clears_the_cache() {
        let authorizer = Arc::new(CountingAuthorizer::default());
        let connector = connector(&authorizer, &clock());

        let mut attempt = attempt();
        connector.before_connect(&mut attempt).await.unwrap();

        connector.shutdown().await;
        assert!(connector.is_closed());
        assert!(!connector.is_refreshing());
        assert!(connector.cached_token().is_none());

        time::sleep(PERIOD * 5).await;
        assert_eq!(authorizer.calls(), 1);

        let mut attempt = self::attempt();
        let err = connector.before_connect(&mut attempt).await.unwrap_err();
        assert!(matches!(err, ConnectError::Closed));
        assert_eq!(attempt.password(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_during_issuance_discards_the_token() {
        let authorizer = Arc::new(CountingAuthorizer::delayed(Duration::from_secs(1)));
        let clock = clock();
        let connector = connector(&authorizer, &clock);

        let mut attempt = attempt();
        connector.before_connect(&mut attempt).await.unwrap();
        clock.inc(LIFETIME_SECS);

        let in_flight = {
            let connector = connector.clone();
            tokio::spawn(async move {
                let mut attempt = self::attempt();
                let result = connector.before_connect(&mut attempt).await;
                (result, attempt)
            })
        };

        time::sleep(Duration::from_millis(100)).await;
        connector.shutdown().await;

        let (result, attempt) = in_flight.await.unwrap();
        assert!(matches!(result, Err(ConnectError::Closed)));
        assert_eq!(attempt.password(), None);
        assert_eq!(authorizer.calls(), 2);
        assert!(connector.cached_token().is_none());
        assert!(!connector.is_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_refresh_interval_still_shuts_down_cleanly() {
        let authorizer = Arc::new(CountingAuthorizer::default());
        let options: ConnectorOptions =
            serde_json::from_str(r#"{ "refresh_interval": 18446744073709551615 }"#).unwrap();
        let connector = Connector::builder()
            .with_region("us-east-1")
            .with_credentials_provider(static_credentials())
            .with_options(options)
            .with_authorizer(Arc::clone(&authorizer))
            .with_clock(clock())
            .build();

        let mut attempt = attempt();
        connector.before_connect(&mut attempt).await.unwrap();

        time::sleep(PERIOD).await;
        assert!(connector.is_refreshing());
        assert_eq!(authorizer.calls(), 1);

        connector.shutdown().await;
        assert!(!connector.is_refreshing());
        assert!(connector.cached_token().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_without_a_token_is_harmless() {
        let authorizer = Arc::new(CountingAuthorizer::default());
        let connector = connector(&authorizer, &clock());

        connector.shutdown().await;
        connector.close();

        assert!(connector.is_closed());
        assert_eq!(authorizer.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_last_clone_stops_refreshing() {
        let authorizer = Arc::new(CountingAuthorizer::default());
        let connector = connector(&authorizer, &clock());
        let other = connector.clone();

        let mut attempt = attempt();
        connector.before_connect(&mut attempt).await.unwrap();

        drop(connector);
        time::sleep(PERIOD + PERIOD / 2).await;
        assert_eq!(authorizer.calls(), 2);

        drop(other);
        time::sleep(PERIOD * 5).await;
        assert_eq!(authorizer.calls(), 2);
    }
}
