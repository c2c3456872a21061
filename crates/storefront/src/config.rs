//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COMMERCE_API_URL` - Base URL of the commerce backend routes (e.g., `https://api.meeple.example`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (default: `http://localhost:3000`)
//! - `COMMERCE_API_TOKEN` - Bearer token sent to the commerce backend
//! - `STORE_NAME` - Store display name (default: Meeple & Co.)
//! - `STORE_TAGLINE` - Home page tagline
//! - `STORE_EMAIL` - Contact email shown on the help page
//! - `STORE_PHONE` - Contact phone shown on the help page
//! - `STORE_COUNTRY` - Country we ship within
//! - `STANDARD_SHIPPING` - Flat shipping charge added to every cart (default: 5.99)
//! - `PROCESSING_TIME` - Order processing time (default: 1-2 business days)
//! - `DELIVERY_TIME` - Standard delivery time (default: 3-7 business days)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Commerce backend configuration
    pub commerce: CommerceConfig,
    /// Store profile shown across pages
    pub store: StoreProfile,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Commerce backend configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct CommerceConfig {
    /// Base URL of the backend routes
    pub api_url: Url,
    /// Optional bearer token (server-side only)
    pub api_token: Option<SecretString>,
}

impl std::fmt::Debug for CommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceConfig")
            .field("api_url", &self.api_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Store details and policies interpolated into pages.
#[derive(Debug, Clone)]
pub struct StoreProfile {
    /// Store display name
    pub name: String,
    /// Home page tagline
    pub tagline: String,
    /// Contact email
    pub email: String,
    /// Contact phone, formatted for display
    pub phone: String,
    /// Country we ship within
    pub country: String,
    /// Flat shipping charge added to every cart
    pub standard_shipping: Decimal,
    /// Order processing time (e.g., "1-2 business days")
    pub processing_time: String,
    /// Standard delivery time (e.g., "3-7 business days")
    pub delivery_time: String,
}

impl Default for StoreProfile {
    fn default() -> Self {
        Self {
            name: "Meeple & Co.".to_string(),
            tagline: "Hand-picked board games for every table".to_string(),
            email: "hello@meeple.example".to_string(),
            phone: "(555) 010-4242".to_string(),
            country: "United States".to_string(),
            standard_shipping: Decimal::new(599, 2),
            processing_time: "1-2 business days".to_string(),
            delivery_time: "3-7 business days".to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");

        Ok(Self {
            host,
            port,
            base_url,
            commerce: CommerceConfig::from_env()?,
            store: StoreProfile::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl CommerceConfig {
    /// Load the commerce backend configuration from environment variables.
    ///
    /// Shared with the CLI, which talks to the same backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `COMMERCE_API_URL` is missing or not an
    /// http(s) URL, or if the token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_required_env("COMMERCE_API_URL")?;
        let api_url = parse_api_url(&raw_url)
            .map_err(|msg| ConfigError::InvalidEnvVar("COMMERCE_API_URL".to_string(), msg))?;

        let api_token = match get_optional_env("COMMERCE_API_TOKEN") {
            Some(token) => {
                validate_secret_strength(&token, "COMMERCE_API_TOKEN")?;
                Some(SecretString::from(token))
            }
            None => None,
        };

        Ok(Self { api_url, api_token })
    }

    /// Configuration pointing at a backend URL without a token.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is not an http(s) URL.
    pub fn with_url(url: &str) -> Result<Self, ConfigError> {
        let api_url = parse_api_url(url)
            .map_err(|msg| ConfigError::InvalidEnvVar("COMMERCE_API_URL".to_string(), msg))?;
        Ok(Self {
            api_url,
            api_token: None,
        })
    }
}

impl StoreProfile {
    /// Load the store profile from environment variables, falling back to
    /// the defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `STANDARD_SHIPPING` is not a non-negative
    /// decimal.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let standard_shipping = match get_optional_env("STANDARD_SHIPPING") {
            Some(raw) => parse_shipping(&raw).map_err(|msg| {
                ConfigError::InvalidEnvVar("STANDARD_SHIPPING".to_string(), msg)
            })?,
            None => defaults.standard_shipping,
        };

        Ok(Self {
            name: get_optional_env("STORE_NAME").unwrap_or(defaults.name),
            tagline: get_optional_env("STORE_TAGLINE").unwrap_or(defaults.tagline),
            email: get_optional_env("STORE_EMAIL").unwrap_or(defaults.email),
            phone: get_optional_env("STORE_PHONE").unwrap_or(defaults.phone),
            country: get_optional_env("STORE_COUNTRY").unwrap_or(defaults.country),
            standard_shipping,
            processing_time: get_optional_env("PROCESSING_TIME")
                .unwrap_or(defaults.processing_time),
            delivery_time: get_optional_env("DELIVERY_TIME").unwrap_or(defaults.delivery_time),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse and check the backend base URL.
fn parse_api_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{other}', expected http or https")),
    }
}

/// Parse a non-negative shipping charge.
fn parse_shipping(raw: &str) -> Result<Decimal, String> {
    let amount = Decimal::from_str(raw.trim()).map_err(|e| e.to_string())?;
    if amount.is_sign_negative() {
        return Err("shipping charge cannot be negative".to_string());
    }
    Ok(amount)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API tokens have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
