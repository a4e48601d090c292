use std::{collections::BTreeMap, fmt};

/// The default PostgreSQL port
pub const DEFAULT_PORT: u16 = 5432;

/// A database endpoint
///
/// Renders as `host:port`, which is the form embedded in RDS tokens.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Constructs an endpoint
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The endpoint's host name
    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The endpoint's port
    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// The parameters of a single physical connection attempt
///
/// A pool constructs one of these for every connection it is about to open and
/// passes it to a hook before connecting. Hooks read the endpoint and user and
/// fill in the password.
#[derive(Clone, Default)]
pub struct ConnectionAttempt {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    runtime_params: BTreeMap<String, String>,
}

impl ConnectionAttempt {
    /// Constructs an attempt for `user` against `host:port`
    pub fn new(host: impl Into<String>, port: u16, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: None,
            runtime_params: BTreeMap::new(),
        }
    }

    /// Adds a runtime parameter to be sent at connection start-up
    pub fn with_runtime_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.runtime_params.insert(name.into(), value.into());
        self
    }

    /// Sets a static password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// The target host
    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The target port
    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The target endpoint
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    /// The database user
    #[inline]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The password to present, if one has been set
    #[inline]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Sets the password to present
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = Some(password.into());
    }

    /// All runtime parameters
    pub fn runtime_params(&self) -> &BTreeMap<String, String> {
        &self.runtime_params
    }

    /// Looks up a runtime parameter
    pub fn runtime_param(&self, name: &str) -> Option<&str> {
        self.runtime_params.get(name).map(String::as_str)
    }

    /// Removes a runtime parameter, returning its value
    pub fn remove_runtime_param(&mut self, name: &str) -> Option<String> {
        self.runtime_params.remove(name)
    }
}

impl fmt::Debug for ConnectionAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionAttempt")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("runtime_params", &self.runtime_params)
            .finish()
    }
}
