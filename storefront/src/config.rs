//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: STOREFRONT_, nested keys split on `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/storefront/{service_name}/config.toml
//! 4. System directory: /etc/storefront/{service_name}/config.toml
//! 5. Default values

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const ENV_PREFIX: &str = "STOREFRONT_";
const XDG_PREFIX: &str = "storefront";
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,

    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Password hashing cost
    #[serde(default)]
    pub password: PasswordConfig,

    /// Role policy
    #[serde(default)]
    pub access: AccessConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl ServiceConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Verification key: PEM public key for RS*/ES*, raw secret for HS*
    pub key_path: PathBuf,

    /// Algorithm (HS256, HS384, HS512, RS256, RS384, RS512, ES256, ES384)
    #[serde(default = "default_jwt_algorithm")]
    pub algorithm: String,

    /// Expected issuer
    #[serde(default)]
    pub issuer: Option<String>,

    /// Expected audience
    #[serde(default)]
    pub audience: Option<String>,
}

/// Middleware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Request body size limit in MB
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,

    /// Enable panic recovery middleware
    #[serde(default = "default_true")]
    pub catch_panic: bool,

    /// Enable compression
    #[serde(default = "default_true")]
    pub compression: bool,

    /// CORS configuration (permissive, restrictive, disabled)
    #[serde(default = "default_cors_mode")]
    pub cors_mode: String,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            body_limit_mb: default_body_limit_mb(),
            catch_panic: true,
            compression: true,
            cors_mode: default_cors_mode(),
        }
    }
}

impl MiddlewareConfig {
    /// Get body limit in bytes
    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb * 1024 * 1024
    }
}

/// Document store backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store; contents are lost on shutdown
    #[default]
    Memory,
    /// SurrealDB (requires the `surrealdb` feature)
    Surrealdb,
}

/// Document store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which backend to use
    #[serde(default)]
    pub backend: StoreBackend,

    /// SurrealDB connection settings, required when `backend = "surrealdb"`
    #[serde(default)]
    pub surrealdb: Option<SurrealDbConfig>,
}

/// SurrealDB connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurrealDbConfig {
    /// Connection URL (ws://, wss://, http://, https://, mem://)
    pub url: String,

    /// Namespace
    #[serde(default = "default_surreal_namespace")]
    pub namespace: String,

    /// Database
    #[serde(default = "default_surreal_database")]
    pub database: String,

    /// Root username (optional)
    #[serde(default)]
    pub username: Option<String>,

    /// Root password (optional)
    #[serde(default)]
    pub password: Option<String>,

    /// Maximum connection retries at startup
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retries in seconds, doubled per attempt
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

/// Argon2id cost parameters
///
/// Defaults match the OWASP baseline (19 MiB, 2 passes, 1 lane).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordConfig {
    #[serde(default = "default_memory_cost")]
    pub memory_cost_kib: u32,

    #[serde(default = "default_time_cost")]
    pub time_cost: u32,

    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost_kib: default_memory_cost(),
            time_cost: default_time_cost(),
            parallelism: default_parallelism(),
        }
    }
}

/// Role policy: the permissions each role grants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default = "default_roles")]
    pub roles: HashMap<String, Vec<String>>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            roles: default_roles(),
        }
    }
}

impl Config {
    /// Load configuration from all sources
    ///
    /// The service name is inferred from the binary name.
    pub fn load() -> Result<Self> {
        let service_name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| XDG_PREFIX.to_string());

        Self::load_for_service(&service_name)
    }

    /// Load configuration for a specific service name
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let config_paths = Self::find_config_paths(service_name);

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Lowest priority first so higher priority files override
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Bypasses the XDG and system directories; environment variables still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.service.name.trim().is_empty() {
            return Err(invalid("service.name must not be empty"));
        }
        if self.service.port == 0 {
            return Err(invalid("service.port must be non-zero"));
        }
        if !LOG_LEVELS.contains(&self.service.log_level.to_lowercase().as_str()) {
            return Err(invalid(format!(
                "service.log_level '{}' is not one of {}",
                self.service.log_level,
                LOG_LEVELS.join(", ")
            )));
        }
        if self.store.backend == StoreBackend::Surrealdb && self.store.surrealdb.is_none() {
            return Err(invalid(
                "store.surrealdb must be set when store.backend is \"surrealdb\"",
            ));
        }
        Ok(())
    }

    /// Config file paths in priority order (highest first)
    fn find_config_paths(service_name: &str) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(XDG_PREFIX);
        let config_file_path = Path::new(service_name).join("config.toml");
        if let Some(path) = xdg_dirs.find_config_file(&config_file_path) {
            paths.push(path);
        }

        paths.push(
            PathBuf::from("/etc")
                .join(XDG_PREFIX)
                .join(service_name)
                .join("config.toml"),
        );

        paths
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::Config(Box::new(figment::Error::from(message.into())))
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}

fn default_true() -> bool {
    true
}

fn default_body_limit_mb() -> usize {
    10
}

fn default_cors_mode() -> String {
    "permissive".to_string()
}

fn default_surreal_namespace() -> String {
    "storefront".to_string()
}

fn default_surreal_database() -> String {
    "storefront".to_string()
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    2
}

fn default_memory_cost() -> u32 {
    19 * 1024
}

fn default_time_cost() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

fn default_roles() -> HashMap<String, Vec<String>> {
    let admin = [
        "getProducts",
        "manageProducts",
        "getOrders",
        "manageOrders",
        "getUsers",
        "manageUsers",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect();

    HashMap::from([("admin".to_string(), admin), ("user".to_string(), Vec::new())])
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: XDG_PREFIX.to_string(),
                port: default_port(),
                log_level: default_log_level(),
                timeout_secs: default_timeout(),
                environment: default_environment(),
            },
            jwt: JwtConfig {
                key_path: PathBuf::from("./keys/jwt-secret"),
                algorithm: default_jwt_algorithm(),
                issuer: None,
                audience: None,
            },
            middleware: MiddlewareConfig::default(),
            store: StoreConfig::default(),
            password: PasswordConfig::default(),
            access: AccessConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.port, 8080);
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.service.timeout(), Duration::from_secs(30));
        assert_eq!(config.middleware.body_limit_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.password.memory_cost_kib, 19456);
        assert_eq!(config.access.roles["admin"].len(), 6);
        assert!(config.access.roles["user"].is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[service]
name = "catalog"
port = 9090
log_level = "debug"

[jwt]
key_path = "/run/secrets/jwt"
algorithm = "HS512"
issuer = "storefront-auth"

[store]
backend = "surrealdb"

[store.surrealdb]
url = "mem://"

[access.roles]
clerk = ["getProducts", "getOrders"]
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.service.name, "catalog");
        assert_eq!(config.service.port, 9090);
        assert_eq!(config.service.timeout_secs, 30);
        assert_eq!(config.jwt.algorithm, "HS512");
        assert_eq!(config.jwt.issuer.as_deref(), Some("storefront-auth"));
        assert_eq!(config.store.backend, StoreBackend::Surrealdb);

        let surreal = config.store.surrealdb.unwrap();
        assert_eq!(surreal.namespace, "storefront");
        assert_eq!(surreal.max_retries, 5);

        assert_eq!(config.access.roles["clerk"], vec!["getProducts", "getOrders"]);
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = Config::default();
        config.service.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.service.log_level = "loud".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.service.name = "  ".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.store.backend = StoreBackend::Surrealdb;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
