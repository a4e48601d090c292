use pgiam_clock::{Clock, DurationSecs, System, UnixTime};

use super::{AuthToken, AuthTokenRef};

/// An authentication token together with its lifetime information
///
/// Tokens are immutable. A refresh produces a new token which replaces the
/// previous one in the cache.
#[derive(Debug)]
pub struct Token {
    auth_token: AuthToken,
    issued: UnixTime,
    expiry: UnixTime,
    can_expire: bool,
}

/// A token's lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
    /// The token may still be presented to the database
    Valid,
    /// The token is no longer accepted and must be re-issued
    Expired,
}

impl Token {
    /// Constructs a token issued at `issued` which is valid for `lifetime`
    pub fn new(auth_token: AuthToken, issued: UnixTime, lifetime: DurationSecs) -> Self {
        Self {
            auth_token,
            issued,
            expiry: issued + lifetime,
            can_expire: true,
        }
    }

    /// Constructs a token that is never considered expired
    pub fn non_expiring(auth_token: AuthToken, issued: UnixTime) -> Self {
        Self {
            auth_token,
            issued,
            expiry: UnixTime(u64::MAX),
            can_expire: false,
        }
    }

    /// Gets the token value
    #[inline]
    pub fn auth_token(&self) -> &AuthTokenRef {
        &self.auth_token
    }

    /// Gets the time that the token was issued
    #[inline]
    pub fn issued(&self) -> UnixTime {
        self.issued
    }

    /// Gets the time that the token will expire
    #[inline]
    pub fn expiry(&self) -> UnixTime {
        self.expiry
    }

    /// Whether the token carries an expiry at all
    #[inline]
    pub fn can_expire(&self) -> bool {
        self.can_expire
    }

    /// Gets the token's lifetime
    #[inline]
    pub fn lifetime(&self) -> DurationSecs {
        self.expiry - self.issued
    }

    /// Gets the token's current lifetime status
    #[inline]
    pub fn token_status(&self) -> TokenStatus {
        self.token_status_with_clock(&System)
    }

    /// Gets the token's lifetime status based on the current time
    /// as reported by the provided clock
    #[inline]
    pub fn token_status_with_clock<C: Clock>(&self, clock: &C) -> TokenStatus {
        self.token_status_at(clock.now())
    }

    /// Gets the token's lifetime status as of the provided time
    ///
    /// A token is expired from the instant of its expiry onward.
    #[inline]
    pub fn token_status_at(&self, time: UnixTime) -> TokenStatus {
        if self.can_expire && time >= self.expiry {
            TokenStatus::Expired
        } else {
            TokenStatus::Valid
        }
    }

    /// Whether the token is expired as of the provided time
    #[inline]
    pub fn is_expired_at(&self, time: UnixTime) -> bool {
        self.token_status_at(time) == TokenStatus::Expired
    }

    /// Gets a duration for how much longer the token would be valid as of the
    /// provided time
    #[inline]
    pub fn until_expired_at(&self, time: UnixTime) -> DurationSecs {
        self.expiry - time
    }
}
