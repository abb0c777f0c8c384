//! Gateway configuration.
//!
//! This module provides configuration for the request pipeline, supporting
//! both programmatic configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_PORT` | 8080 | Server port |
//! | `GATEWAY_HOST` | 127.0.0.1 | Host to bind |
//! | `GATEWAY_LOG_LEVEL` | info | Log level |
//! | `GATEWAY_ENVIRONMENT` | development | Deployment environment name |
//! | `GATEWAY_MAX_BODY_SIZE` | 1048576 | Max JSON body (bytes) |
//! | `GATEWAY_MAX_UPLOAD_SIZE` | 52428800 | Max multipart upload (bytes) |
//! | `GATEWAY_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `GATEWAY_ENABLE_CORS` | true | Enable CORS |
//! | `GATEWAY_CORS_ORIGINS` | * | Allowed origins |
//! | `GATEWAY_WORKER_SECRET` | (unset) | Shared secret for worker signatures |
//! | `GATEWAY_PAYMENT_API_KEY` | (unset) | Payment-processor API key |
//!
//! # Example
//!
//! ```rust
//! use atelier_gateway::GatewayConfig;
//!
//! // Create from environment
//! let config = GatewayConfig::from_env();
//!
//! // Or create programmatically
//! let config = GatewayConfig {
//!     port: 3000,
//!     environment: "production".to_string(),
//!     ..Default::default()
//! };
//! ```

use clap::Parser;

/// Configuration for the request pipeline and its HTTP layer.
///
/// Construct from environment variables with [`GatewayConfig::from_env`],
/// from command line arguments using [`GatewayConfig::parse`], or
/// programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "atelier-gateway")]
#[command(about = "Atelier platform API gateway")]
pub struct GatewayConfig {
    /// Port to listen on.
    #[arg(short, long, env = "GATEWAY_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "GATEWAY_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "GATEWAY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Deployment environment name, passed to domain service constructors.
    #[arg(long, env = "GATEWAY_ENVIRONMENT", default_value = "development")]
    pub environment: String,

    /// Maximum JSON request body size in bytes.
    #[arg(long, env = "GATEWAY_MAX_BODY_SIZE", default_value = "1048576")]
    pub max_body_size: usize,

    /// Maximum multipart upload size in bytes (per request).
    #[arg(long, env = "GATEWAY_MAX_UPLOAD_SIZE", default_value = "52428800")]
    pub max_upload_size: usize,

    /// Request timeout in seconds.
    #[arg(long, env = "GATEWAY_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "GATEWAY_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "GATEWAY_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Shared secret used to verify worker callback signatures.
    #[arg(long, env = "GATEWAY_WORKER_SECRET")]
    pub worker_secret: Option<String>,

    /// Payment-processor API key.
    ///
    /// Absence is not a startup error: services that need it fail at first
    /// access instead.
    #[arg(long, env = "GATEWAY_PAYMENT_API_KEY")]
    pub payment_api_key: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            environment: "development".to_string(),
            max_body_size: 1024 * 1024, // 1MB
            max_upload_size: 50 * 1024 * 1024, // 50MB
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            worker_secret: None,
            payment_api_key: None,
        }
    }
}

impl GatewayConfig {
    /// Creates a new GatewayConfig from environment variables.
    ///
    /// This is a convenience method that parses environment variables
    /// without requiring command line arguments.
    pub fn from_env() -> Self {
        Self::try_parse().unwrap_or_default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.max_body_size == 0 {
            errors.push("Max body size cannot be 0".to_string());
        }

        if self.max_upload_size < self.max_body_size {
            errors.push("Max upload size cannot be below max body size".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.environment.is_empty() {
            errors.push("Environment name cannot be empty".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Creates a configuration suitable for testing.
    pub fn for_testing() -> Self {
        Self {
            port: 0, // Let OS assign port
            host: "127.0.0.1".to_string(),
            log_level: "debug".to_string(),
            environment: "test".to_string(),
            max_body_size: 1024 * 1024,
            max_upload_size: 4 * 1024 * 1024,
            request_timeout: 5, // Shorter timeout for tests
            enable_cors: false,
            cors_origins: "*".to_string(),
            worker_secret: Some("test-worker-secret".to_string()),
            payment_api_key: None,
        }
    }
}
