//! CouchDB connection configuration.

use std::env;
use std::fmt;
use std::time::Duration;

use typed_builder::TypedBuilder;

/// Default CouchDB endpoint when `COUCHDB_ENDPOINT` is unset.
pub const DEFAULT_COUCHDB_ENDPOINT: &str = "127.0.0.1:5984";

/// Location and credentials of the backing CouchDB.
///
/// Built once at startup and never mutated afterwards. The password is
/// redacted from the `Debug` output.
///
/// # Examples
///
/// ```
/// use docgate_couchdb::CouchDbConfig;
///
/// let config = CouchDbConfig::builder()
///     .endpoint("couchdb:5984")
///     .username("admin")
///     .password("secret")
///     .build();
/// assert_eq!(config.base_url(), "http://couchdb:5984");
/// assert!(!format!("{config:?}").contains("secret"));
/// ```
#[derive(Clone, TypedBuilder)]
pub struct CouchDbConfig {
    /// `host:port`, or a full URL including the scheme.
    #[builder(default = String::from(DEFAULT_COUCHDB_ENDPOINT), setter(into))]
    pub endpoint: String,

    /// Scheme used when `endpoint` carries none.
    #[builder(default = String::from("http"), setter(into))]
    pub scheme: String,

    /// Basic-auth user; an empty user disables authentication.
    #[builder(default, setter(into))]
    pub username: String,

    /// Basic-auth password.
    #[builder(default, setter(into))]
    pub password: String,

    /// Path of the store's liveness endpoint.
    #[builder(default = String::from("_up"), setter(into))]
    pub health_path: String,

    /// Per-call timeout applied to every store request.
    #[builder(default = Duration::from_secs(10))]
    pub timeout: Duration,
}

impl CouchDbConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads `COUCHDB_USER`, `COUCHDB_PASSWORD`, `COUCHDB_ENDPOINT`,
    /// `COUCHDB_SCHEME`, `COUCHDB_HEALTH_PATH` and `COUCHDB_TIMEOUT_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: env_non_empty("COUCHDB_ENDPOINT").unwrap_or(defaults.endpoint),
            scheme: env_non_empty("COUCHDB_SCHEME").unwrap_or(defaults.scheme),
            username: env::var("COUCHDB_USER").unwrap_or_default(),
            password: env::var("COUCHDB_PASSWORD").unwrap_or_default(),
            health_path: env_non_empty("COUCHDB_HEALTH_PATH").unwrap_or(defaults.health_path),
            timeout: env_non_empty("COUCHDB_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .map_or(defaults.timeout, Duration::from_secs),
        }
    }

    /// Base URL of the store, without a trailing slash and without credentials.
    #[must_use]
    pub fn base_url(&self) -> String {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        if endpoint.contains("://") {
            endpoint.to_owned()
        } else {
            format!("{}://{endpoint}", self.scheme)
        }
    }

    /// Credentials for basic auth, when a user is configured.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        (!self.username.is_empty()).then_some((self.username.as_str(), self.password.as_str()))
    }
}

impl Default for CouchDbConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for CouchDbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CouchDbConfig")
            .field("endpoint", &self.endpoint)
            .field("scheme", &self.scheme)
            .field("username", &self.username)
            .field("password", &"***")
            .field("health_path", &self.health_path)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
