// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are layered with figment: built-in defaults, then the TOML file,
//! then `WARDEN_*` environment variables (`__` separates sections), then the
//! legacy deployment variables `JWT_SECRET`, `AUTH_SERVICE_URL` and
//! `USER_PROFILE_SERVICE_URL`.
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file read when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "warden.toml";

/// Prefix of structured environment overrides
pub const ENV_PREFIX: &str = "WARDEN_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Legacy variable name → route whose upstream it overrides
const LEGACY_UPSTREAM_VARS: [(&str, &str); 2] = [
    ("AUTH_SERVICE_URL", "auth"),
    ("USER_PROFILE_SERVICE_URL", "users"),
];

/// Fatal configuration problems. Any of these aborts startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("signing key is not configured (set JWT_SECRET or auth.jwt_secret)")]
    MissingSigningKey,

    #[error("signing key is too weak: {len} bytes, at least {min} required")]
    WeakSigningKey { len: usize, min: usize },

    #[error("route `{route}` has an invalid prefix `{prefix}`: {reason}")]
    InvalidPrefix {
        route: String,
        prefix: String,
        reason: String,
    },

    #[error("route `{route}` has an invalid upstream `{url}`: {reason}")]
    InvalidUpstream {
        route: String,
        url: String,
        reason: String,
    },

    #[error("prefix `{0}` is registered more than once")]
    DuplicatePrefix(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Load(err.to_string())
    }
}

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub auth: AuthSettings,
    pub gateway: GatewaySettings,
    pub logging: LoggingSettings,
}

/// Auth service settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Listen address of the auth service
    pub bind_addr: SocketAddr,
    /// HMAC secret used to sign tokens
    pub jwt_secret: Option<String>,
    /// Argon2 cost parameters for new hashes
    pub hash: HashSettings,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: None,
            hash: HashSettings::default(),
        }
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("hash", &self.hash)
            .finish()
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashSettings {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashSettings {
    fn default() -> Self {
        // argon2 crate defaults (OWASP minimum for Argon2id)
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Listen address of the gateway
    pub bind_addr: SocketAddr,
    /// Bound on establishing the upstream TCP connection
    pub connect_timeout_secs: u64,
    /// Bound on receiving the upstream response head
    pub upstream_timeout_secs: u64,
    /// Route name → prefix and upstream
    pub routes: BTreeMap<String, RouteSettings>,
}

impl GatewaySettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        let mut routes = BTreeMap::new();
        routes.insert(
            "auth".to_string(),
            RouteSettings::new("/auth", "http://auth-service:8080"),
        );
        routes.insert(
            "users".to_string(),
            RouteSettings::new("/users", "http://user-profile-service:8080"),
        );

        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            connect_timeout_secs: 5,
            upstream_timeout_secs: 30,
            routes,
        }
    }
}

/// One gateway route as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSettings {
    pub prefix: String,
    pub upstream: String,
}

impl RouteSettings {
    pub fn new(prefix: impl Into<String>, upstream: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            upstream: upstream.into(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter level; `RUST_LOG` takes precedence when set
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Settings {
    /// Provider stack used by [`Settings::load`]
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load settings from the file at `path` (missing file is fine) and the environment
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut settings: Settings = Self::figment(path).extract()?;
        settings.apply_legacy_env();
        Ok(settings)
    }

    /// Read the plain variable names used by existing deployments.
    ///
    /// These are read verbatim instead of through figment so that a secret
    /// made of digits is not reinterpreted as a number.
    fn apply_legacy_env(&mut self) {
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }

        for (var, route) in LEGACY_UPSTREAM_VARS {
            if let Ok(url) = std::env::var(var) {
                if let Some(entry) = self.gateway.routes.get_mut(route) {
                    entry.upstream = url;
                }
            }
        }
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid {
                field: "logging.level",
                reason: format!("unknown level `{}`", self.logging.level),
            });
        }

        if self.gateway.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "gateway.connect_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.gateway.upstream_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "gateway.upstream_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.gateway.routes.is_empty() {
            return Err(ConfigError::Invalid {
                field: "gateway.routes",
                reason: "at least one route is required".to_string(),
            });
        }

        let hash = &self.auth.hash;
        if hash.memory_kib == 0 || hash.iterations == 0 || hash.parallelism == 0 {
            return Err(ConfigError::Invalid {
                field: "auth.hash",
                reason: "cost parameters must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}
