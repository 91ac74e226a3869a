//! Configuration for ratesvc
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// ratesvc - stars and comments for catalog items
#[derive(Parser, Debug, Clone)]
#[command(name = "ratesvc")]
#[command(about = "Star and comment engagement service for catalog items")]
pub struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "BIND_ADDRESS", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// MongoDB host (host:port)
    #[arg(long, env = "MONGO_HOST", default_value = "localhost:27017")]
    pub mongo_host: String,

    /// MongoDB database name
    #[arg(long, env = "MONGO_DATABASE", default_value = "ratesvc")]
    pub mongo_database: String,

    /// Full MongoDB connection URI, overrides --mongo-host
    #[arg(long, env = "MONGODB_URI")]
    pub mongo_uri: Option<String>,

    /// HMAC key used to verify session tokens
    /// Without it every write is rejected as unauthenticated
    #[arg(long, env = "JWT_KEY", hide_env_values = true)]
    pub jwt_key: Option<String>,

    /// Name of the cookie carrying the session token
    #[arg(long, env = "AUTH_COOKIE", default_value = "ka_auth")]
    pub auth_cookie: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Enable development mode (falls back to an in-memory store when
    /// MongoDB is unreachable)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,
}

impl Args {
    /// Socket address the server binds
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Effective MongoDB URI
    pub fn mongodb_uri(&self) -> String {
        match self.mongo_uri {
            Some(ref uri) => uri.clone(),
            None => format!("mongodb://{}", self.mongo_host),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if matches!(self.jwt_key.as_deref(), Some(key) if key.is_empty()) {
            return Err("JWT_KEY must not be empty when set".to_string());
        }

        let cookie = self.auth_cookie.trim();
        if cookie.is_empty() || cookie.contains(['=', ';', ' ']) {
            return Err("AUTH_COOKIE must be a plain cookie name".to_string());
        }

        Ok(())
    }
}
