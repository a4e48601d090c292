use std::time::Duration;

use pgiam_clock::DurationSecs;
use serde::{Deserialize, Serialize};

/// How often the background loop re-issues the token, by default
pub const DEFAULT_REFRESH_INTERVAL: DurationSecs = DurationSecs(10 * 60);

/// How long an issued token is accepted for, by default
///
/// This is the longest lifetime RDS accepts.
pub const DEFAULT_TOKEN_LIFETIME: DurationSecs = DurationSecs(15 * 60);

/// Connector settings that can be kept in a configuration file
///
/// ```
/// let options: pgiam::ConnectorOptions = serde_json::from_str(
///     r#"{ "region": "eu-west-1", "refresh_interval": 300 }"#,
/// ).unwrap();
///
/// assert_eq!(options.token_lifetime, pgiam::DEFAULT_TOKEN_LIFETIME);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectorOptions {
    /// The AWS region, overriding the ambient configuration
    pub region: Option<String>,
    /// Seconds between background refreshes
    pub refresh_interval: DurationSecs,
    /// Seconds each token is accepted for
    pub token_lifetime: DurationSecs,
}

impl Default for ConnectorOptions {
    fn default() -> Self {
        Self {
            region: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            token_lifetime: DEFAULT_TOKEN_LIFETIME,
        }
    }
}

impl ConnectorOptions {
    /// The refresh interval as a [`Duration`]
    pub fn refresh_period(&self) -> Duration {
        self.refresh_interval.into()
    }

    /// Whether tokens would be refreshed before they expire
    pub fn refreshes_before_expiry(&self) -> bool {
        self.refresh_interval < self.token_lifetime
    }
}
