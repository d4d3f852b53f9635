//! Configuration management for the image server.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `OG_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Commands
//!
//! - `serve` - Run the HTTP server
//! - `sign` - Mint a token (and optionally a full image URL) for a title/description
//!
//! # Environment Variables
//!
//! - `OG_HOST` - Server bind address (default: 0.0.0.0)
//! - `OG_PORT` - Server port (default: 3000)
//! - `OG_TOKEN_SECRET` - Shared HMAC secret for tokens (required)
//! - `OG_TOKEN_LEEWAY` - Clock tolerance for `exp`/`nbf` in seconds (default: 0)
//! - `OG_PAGE_URL` - Card page to render (required)
//! - `OG_BROWSER_WS_URL` - Chrome DevTools endpoint (required)
//! - `OG_RENDER_TIMEOUT` - Seconds per render attempt (default: 30)
//! - `OG_RENDER_ATTEMPTS` - Render attempts per request (default: 1)
//! - `OG_S3_BUCKET` - S3 bucket for the image cache (default: in-memory cache)
//! - `OG_S3_PREFIX` - Key prefix inside the bucket
//! - `OG_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `OG_S3_REGION` - AWS region (default: us-east-1)
//! - `OG_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 14400)
//! - `OG_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)

use clap::{Args, Parser, Subcommand, ValueEnum};
use url::Url;

use crate::render::{DEFAULT_RENDER_ATTEMPTS, DEFAULT_RENDER_TIMEOUT};
use crate::server::DEFAULT_CACHE_MAX_AGE;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

// =============================================================================
// CLI
// =============================================================================

/// OG Image Server - Open Graph card images from signed tokens.
///
/// Verifies a JWT in the request path, serves the matching PNG from the
/// cache, or renders it with headless Chrome and caches it.
#[derive(Parser, Debug, Clone)]
#[command(name = "og-image-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeConfig),

    /// Mint a signed token for a card
    Sign(SignConfig),
}

// =============================================================================
// Serve
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "OG_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "OG_PORT")]
    pub port: u16,

    // =========================================================================
    // Token Configuration
    // =========================================================================
    /// Shared secret used to verify token signatures.
    #[arg(long, env = "OG_TOKEN_SECRET", hide_env_values = true)]
    pub token_secret: String,

    /// Clock tolerance in seconds for token `exp` and `nbf` claims.
    #[arg(long, default_value_t = 0, env = "OG_TOKEN_LEEWAY")]
    pub token_leeway: u64,

    // =========================================================================
    // Render Configuration
    // =========================================================================
    /// URL of the card page. Claims are appended as `title` and
    /// `description` query parameters.
    #[arg(long, env = "OG_PAGE_URL")]
    pub page_url: String,

    /// Chrome DevTools endpoint (ws://… or http://host:9222).
    #[arg(long, env = "OG_BROWSER_WS_URL")]
    pub browser_ws_url: String,

    /// Time budget in seconds for one render attempt.
    #[arg(long, default_value_t = DEFAULT_RENDER_TIMEOUT.as_secs(), env = "OG_RENDER_TIMEOUT")]
    pub render_timeout: u64,

    /// Render attempts per request (1 = no retry).
    #[arg(long, default_value_t = DEFAULT_RENDER_ATTEMPTS, env = "OG_RENDER_ATTEMPTS")]
    pub render_attempts: u32,

    // =========================================================================
    // S3 Configuration
    // =========================================================================
    /// S3 bucket for rendered images.
    ///
    /// If not specified, images are cached in memory (development only).
    #[arg(long, env = "OG_S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Key prefix for rendered images inside the bucket.
    #[arg(long, env = "OG_S3_PREFIX")]
    pub s3_prefix: Option<String>,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    #[arg(long, env = "OG_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "OG_S3_REGION")]
    pub s3_region: String,

    // =========================================================================
    // HTTP Configuration
    // =========================================================================
    /// HTTP Cache-Control max-age in seconds for images.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "OG_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "OG_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.token_secret.is_empty() {
            return Err(
                "Token secret is required. Set --token-secret or OG_TOKEN_SECRET".to_string(),
            );
        }

        self.page_url()?;

        let browser_url = Url::parse(&self.browser_ws_url)
            .map_err(|e| format!("Invalid browser endpoint '{}': {}", self.browser_ws_url, e))?;
        if !matches!(browser_url.scheme(), "ws" | "wss" | "http" | "https") {
            return Err(format!(
                "Browser endpoint must be a ws://, wss://, http:// or https:// URL, got '{}'",
                self.browser_ws_url
            ));
        }

        if self.render_timeout == 0 {
            return Err("render_timeout must be greater than 0".to_string());
        }
        if self.render_attempts == 0 {
            return Err("render_attempts must be greater than 0".to_string());
        }

        if let Some(bucket) = &self.s3_bucket {
            if bucket.is_empty() {
                return Err("S3 bucket name must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Parse the card page URL.
    pub fn page_url(&self) -> Result<Url, String> {
        let url = Url::parse(&self.page_url)
            .map_err(|e| format!("Invalid page URL '{}': {}", self.page_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "Page URL must be an http:// or https:// URL, got '{}'",
                self.page_url
            ));
        }
        Ok(url)
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Sign
// =============================================================================

/// Output format for the `sign` command.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutputFormat {
    /// Just the token
    Token,
    /// The full image URL (requires --base-url)
    Url,
    /// JSON with token, cache key, expiry and URL
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct SignConfig {
    /// Shared secret used to sign the token.
    #[arg(long, env = "OG_TOKEN_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Card title.
    #[arg(long)]
    pub title: String,

    /// Card description.
    #[arg(long)]
    pub description: Option<String>,

    /// Token lifetime in seconds. Tokens without a TTL never expire.
    #[arg(long)]
    pub ttl: Option<u64>,

    /// Base URL of the server, e.g. https://og.example.com
    #[arg(long)]
    pub base_url: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = SignOutputFormat::Token)]
    pub format: SignOutputFormat,
}

impl SignConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.secret.is_empty() {
            return Err("Secret is required. Set --secret or OG_TOKEN_SECRET".to_string());
        }
        if self.title.is_empty() {
            return Err("Title must not be empty".to_string());
        }
        if self.ttl == Some(0) {
            return Err("ttl must be greater than 0".to_string());
        }
        if self.format == SignOutputFormat::Url && self.base_url.is_none() {
            return Err("--format url requires --base-url".to_string());
        }
        if let Some(base_url) = &self.base_url {
            Url::parse(base_url).map_err(|e| format!("Invalid base URL '{}': {}", base_url, e))?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
