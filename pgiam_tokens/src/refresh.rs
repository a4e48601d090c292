//! Background refresh of a cached token

use std::{error, sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{sources::TokenSource, TokenCache};

/// The shortest period accepted for a refresh loop
const MIN_PERIOD: Duration = Duration::from_secs(1);

/// The longest period accepted for a refresh loop
const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// A refresh loop which has not been started yet
///
/// Every `period`, the loop requests a new token from its source and publishes
/// it into the cache. A failed request is logged and the previous token is
/// left in place. When stopped, the loop clears the cache and exits, so that
/// nobody keeps using a token that is no longer being maintained.
#[derive(Debug)]
pub struct RefreshLoop<S> {
    source: S,
    cache: Arc<TokenCache>,
    period: Duration,
    cancel: CancellationToken,
    finished: CancellationToken,
}

/// A handle used to stop a refresh loop
///
/// Dropping the handle also stops the loop.
#[derive(Debug)]
pub struct RefreshHandle {
    cancel: CancellationToken,
    finished: CancellationToken,
}

impl RefreshHandle {
    /// Signals the loop to stop
    ///
    /// Stopping is idempotent. The loop observes the signal at the next tick
    /// boundary or while waiting on its source, whichever comes first.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the loop has been asked to stop
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the loop has exited and cleared its cache
    pub fn is_finished(&self) -> bool {
        self.finished.is_cancelled()
    }

    /// Waits until the loop has exited and cleared its cache
    pub async fn finished(&self) {
        self.finished.cancelled().await
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<S> RefreshLoop<S>
where
    S: TokenSource + 'static,
{
    /// Prepares a loop that refreshes `cache` from `source` every `period`
    ///
    /// Periods shorter than one second are raised to one second, and periods
    /// longer than a year are lowered to a year.
    pub fn new(source: S, cache: Arc<TokenCache>, period: Duration) -> Self {
        Self {
            source,
            cache,
            period: period.clamp(MIN_PERIOD, MAX_PERIOD),
            cancel: CancellationToken::new(),
            finished: CancellationToken::new(),
        }
    }

    /// Creates a handle that can stop this loop
    pub fn handle(&self) -> RefreshHandle {
        RefreshHandle {
            cancel: self.cancel.clone(),
            finished: self.finished.clone(),
        }
    }

    /// Spawns the loop onto the current tokio runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs the loop until it is stopped
    ///
    /// The first refresh happens one full period after the loop starts, since
    /// the loop is started right after a token has been issued.
    #[tracing::instrument(name = "token_refresh", skip_all)]
    pub async fn run(self) {
        let _finished = self.finished.clone().drop_guard();
        tracing::debug!(period_secs = self.period.as_secs(), "token refresh started");

        let mut timer = time::interval_at(Instant::now() + self.period, self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = timer.tick() => {}
            }

            tracing::debug!("requesting new token");
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = self.source.request_token() => result,
            };

            match result {
                Ok(token) => {
                    tracing::debug!(
                        issued = token.issued().0,
                        expiry = token.expiry().0,
                        "token refreshed"
                    );
                    self.cache.store(token);
                }
                Err(error) => {
                    tracing::warn!(
                        error = (&error as &dyn error::Error),
                        "error refreshing token, keeping previous token until next tick"
                    );
                }
            }
        }

        self.cache.clear();
        tracing::info!("token refresh stopped, cache cleared");
    }
}
