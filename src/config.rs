//! Configuration for the image repository.
//!
//! Loaded from `imgrepo.toml`. Every section is optional and falls back to
//! the defaults in [`crate::constants`]:
//!
//! - [`ServerConfig`] - bind address, transport limits, observability
//! - [`QueryConfig`] - image query page sizes
//! - [`AuthConfig`] - session cookie and token signing
//! - [`StorageConfig`] - record and blob store location

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::access::QueryLimits;
use crate::constants;
use crate::paths;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Root of `imgrepo.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub query: QueryConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
    /// Expose Prometheus metrics on `/metrics`.
    pub metrics: bool,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: constants::DEFAULT_HOST.to_string(),
            port: constants::DEFAULT_PORT,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            max_upload_bytes: constants::MAX_UPLOAD_BYTES,
            metrics: true,
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: constants::DEFAULT_IMAGE_LIMIT,
            max_limit: constants::MAX_IMAGE_LIMIT,
        }
    }
}

impl QueryConfig {
    #[must_use]
    pub fn limits(&self) -> QueryLimits {
        QueryLimits {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub token_ttl_secs: u64,
    /// HMAC key for session tokens. Overridden by `IMGREPO_JWT_KEY`.
    pub jwt_secret: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: constants::DEFAULT_COOKIE_NAME.to_string(),
            token_ttl_secs: constants::DEFAULT_TOKEN_TTL_SECS,
            jwt_secret: None,
        }
    }
}

impl AuthConfig {
    /// Signing key, preferring the environment over the file.
    ///
    /// # Errors
    ///
    /// Returns an error if neither source provides a key.
    pub fn secret(&self) -> Result<String> {
        if let Ok(key) = std::env::var(constants::JWT_KEY_ENV)
            && !key.is_empty()
        {
            return Ok(key);
        }
        self.jwt_secret.clone().filter(|s| !s.is_empty()).with_context(|| {
            format!(
                "No JWT secret configured\n\n\
                 Set auth.jwt_secret in {} or the {} environment variable",
                constants::CONFIG_FILE_NAME,
                constants::JWT_KEY_ENV
            )
        })
    }

    #[must_use]
    pub fn token_ttl(&self) -> chrono::Duration {
        let secs = self.token_ttl_secs.min(constants::MAX_TOKEN_TTL_SECS);
        i64::try_from(secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

/// Where records and blobs live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// redb database plus a blob directory under `data_dir`.
    #[default]
    File,
    /// In-process maps; contents are lost on exit.
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Defaults to the imgrepo home directory.
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolved data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is configured and the home directory
    /// cannot be determined.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(paths::expand_home(dir)),
            None => paths::get_imgrepo_dir(),
        }
    }
}

impl Config {
    /// Load configuration from `imgrepo.toml` in the imgrepo home directory,
    /// or defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = paths::get_config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Load configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax
    /// - Fields have invalid types or unknown enum values
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` when given, otherwise from the default location.
    ///
    /// # Errors
    ///
    /// See [`Config::load`] and [`Config::load_from`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        }
    }

    /// Validate configuration with comprehensive checks.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings. The
    /// JWT secret is not checked here because the environment may supply it.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails with one or more errors:
    /// - Port 0
    /// - Zero query limits, or a default above the maximum
    /// - Empty cookie name, a token lifetime of zero or over ten years, or an
    ///   empty configured secret
    /// - Zero upload size or request timeout
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Server
        if self.server.port == 0 {
            errors.push(
                "Server port cannot be 0. Use a valid port number (1-65535)\n  \
                 Common ports: 3000 (default), 8080, 8000"
                    .to_string(),
            );
        }

        if self.server.port < 1024 && self.server.port > 0 {
            warnings.push(format!(
                "Server port {} is a system/privileged port (< 1024)\n  \
                 Recommendation: Use ports >= 1024 (e.g., 3000, 8080) to avoid permission issues",
                self.server.port
            ));
        }

        if self.server.request_timeout_secs == 0 {
            errors.push("server.request_timeout_secs cannot be 0".to_string());
        }

        if self.server.max_upload_bytes == 0 {
            errors.push("server.max_upload_bytes cannot be 0".to_string());
        }

        // 2. Query limits
        if self.query.default_limit == 0 {
            errors.push("query.default_limit cannot be 0".to_string());
        }
        if self.query.max_limit == 0 {
            errors.push("query.max_limit cannot be 0".to_string());
        }
        if self.query.default_limit > self.query.max_limit {
            errors.push(format!(
                "query.default_limit ({}) cannot exceed query.max_limit ({})",
                self.query.default_limit, self.query.max_limit
            ));
        }
        if self.query.max_limit > 1000 {
            warnings.push(format!(
                "query.max_limit {} is very high (> 1000)\n  \
                 Large pages load every matching record into memory",
                self.query.max_limit
            ));
        }

        // 3. Auth
        if self.auth.cookie_name.trim().is_empty() {
            errors.push("auth.cookie_name cannot be empty".to_string());
        }
        if self.auth.token_ttl_secs == 0 {
            errors.push("auth.token_ttl_secs cannot be 0".to_string());
        }
        if self.auth.token_ttl_secs > constants::MAX_TOKEN_TTL_SECS {
            errors.push(format!(
                "auth.token_ttl_secs ({}) cannot exceed {} (ten years)",
                self.auth.token_ttl_secs,
                constants::MAX_TOKEN_TTL_SECS
            ));
        }
        if self.auth.jwt_secret.as_deref() == Some("") {
            errors.push(format!(
                "auth.jwt_secret cannot be empty\n  \
                 Remove it to use {} instead",
                constants::JWT_KEY_ENV
            ));
        }

        // 4. Storage
        if self.storage.backend == StorageBackend::Memory {
            warnings.push(
                "storage.backend is \"memory\": images and users are lost on restart".to_string(),
            );
        }

        if !errors.is_empty() {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }

        Ok(ValidationResult { warnings })
    }
}
