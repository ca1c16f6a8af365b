//! Settings structures for the company search service

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration problem; always fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("missing required secret `{0}`")]
    MissingSecret(&'static str),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub credentials: LoginCredentials,
    pub serper: ProviderSettings,
    pub exa: ProviderSettings,
    pub newsapi: ProviderSettings,
    pub outgoing: OutgoingSettings,
    pub cache: CacheSettings,
    pub auth: AuthSettings,
    pub sessions: SessionSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Merge with process environment variables
    pub fn merge_env(&mut self) {
        self.merge_env_from(|key| std::env::var(key).ok());
    }

    /// Merge with variables from an arbitrary lookup
    pub fn merge_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("COMPANY_SEARCH_USERNAME") {
            self.credentials.username = val;
        }
        if let Some(val) = lookup("COMPANY_SEARCH_PASSWORD") {
            self.credentials.password = val;
        }
        if let Some(val) = lookup("SERPER_API_KEY") {
            self.serper.api_key = val;
        }
        if let Some(val) = lookup("EXA_API_KEY") {
            self.exa.api_key = val;
        }
        if let Some(val) = lookup("NEWSAPI_API_KEY") {
            self.newsapi.api_key = val;
        }
        if let Some(val) = lookup("COMPANY_SEARCH_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = lookup("COMPANY_SEARCH_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
    }

    /// Check that every secret is present and limits are sane
    pub fn validate(&self) -> Result<(), ConfigError> {
        let secrets = [
            ("credentials.username", &self.credentials.username),
            ("credentials.password", &self.credentials.password),
            ("serper.api_key", &self.serper.api_key),
            ("exa.api_key", &self.exa.api_key),
            ("newsapi.api_key", &self.newsapi.api_key),
        ];
        for (name, value) in secrets {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingSecret(name));
            }
        }

        if self.cache.ttl_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "cache.ttl_seconds",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.auth.max_attempts_per_minute == 0 {
            return Err(ConfigError::Invalid {
                field: "auth.max_attempts_per_minute",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.sessions.idle_timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "sessions.idle_timeout_seconds",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.sessions.max_sessions == 0 {
            return Err(ConfigError::Invalid {
                field: "sessions.max_sessions",
                reason: "must be greater than zero".to_string(),
            });
        }
        let timeouts = [
            ("outgoing.request_timeout", Some(self.outgoing.request_timeout)),
            ("outgoing.max_request_timeout", self.outgoing.max_request_timeout),
            ("serper.timeout", self.serper.timeout),
            ("exa.timeout", self.exa.timeout),
            ("newsapi.timeout", self.newsapi.timeout),
        ];
        for (field, value) in timeouts {
            if let Some(secs) = value {
                if !secs.is_finite() || secs <= 0.0 {
                    return Err(ConfigError::Invalid {
                        field,
                        reason: format!("must be a positive number of seconds, got {}", secs),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8501,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Login secrets checked by the credential gate
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings of one external provider
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// API key sent with every request
    pub api_key: String,
    /// Override of the provider's public endpoint
    pub base_url: Option<String>,
    /// Custom timeout for this provider, in seconds
    pub timeout: Option<f64>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Maximum request timeout
    pub max_request_timeout: Option<f64>,
    /// Pool max size
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: crate::DEFAULT_TIMEOUT as f64,
            max_request_timeout: Some(crate::MAX_TIMEOUT as f64),
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Freshness window in seconds
    pub ttl_seconds: u64,
    /// Maximum entries per session
    pub max_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: crate::DEFAULT_CACHE_TTL,
            max_capacity: 1000,
        }
    }
}

/// Login throttling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Login attempts allowed per username per minute
    pub max_attempts_per_minute: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            max_attempts_per_minute: 5,
        }
    }
}

/// Session lifetime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Seconds without a request before a session is dropped
    pub idle_timeout_seconds: u64,
    /// Live sessions kept at most; the longest idle one is evicted first
    pub max_sessions: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: 8 * 3600,
            max_sessions: 1000,
        }
    }
}
