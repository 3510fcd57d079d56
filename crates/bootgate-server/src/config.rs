// ABOUTME: Configuration loading and validation for the bootgate server.
// ABOUTME: Reads BOOTGATE_* and SETUP_PASSWORD once at startup and guards remote exposure.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:18789";
pub const DEFAULT_RESTART_DELAY_MS: u64 = 1000;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOOTGATE_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("BOOTGATE_RESTART_DELAY_MS is not a number of milliseconds: {0}")]
    InvalidRestartDelay(String),

    #[error("bind address {0} is not loopback; set BOOTGATE_ALLOW_REMOTE=true to listen remotely")]
    RemoteNotAllowed(SocketAddr),

    #[error("gateway is unconfigured and reachable remotely but SETUP_PASSWORD is not set; refusing to start an open setup wizard")]
    UnprotectedRemoteSetup,
}

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct ServerConfig {
    pub state_dir: PathBuf,
    pub bind: SocketAddr,
    pub allow_remote: bool,
    pub setup_password: Option<String>,
    pub restart_delay: Duration,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("state_dir", &self.state_dir)
            .field("bind", &self.bind)
            .field("allow_remote", &self.allow_remote)
            .field("setup_password", &self.setup_password.as_ref().map(|_| "<redacted>"))
            .field("restart_delay", &self.restart_delay)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - BOOTGATE_STATE_DIR: state directory (default: ~/.bootgate)
    /// - BOOTGATE_BIND: socket address to bind (default: 127.0.0.1:18789)
    /// - BOOTGATE_ALLOW_REMOTE: allow non-loopback binds (default: false)
    /// - BOOTGATE_RESTART_DELAY_MS: delay before the post-setup restart (default: 1000)
    /// - SETUP_PASSWORD: secret protecting the setup wizard (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let state_dir = std::env::var("BOOTGATE_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                std::env::var("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("/tmp"))
                    .join(".bootgate")
            });

        let bind_str = std::env::var("BOOTGATE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind = parse_bind(&bind_str)?;

        let allow_remote = std::env::var("BOOTGATE_ALLOW_REMOTE")
            .map(|v| v == "true" || v == "1" || v == "yes")
            .unwrap_or(false);

        let restart_delay = match std::env::var("BOOTGATE_RESTART_DELAY_MS") {
            Ok(ms) => ms
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidRestartDelay(ms))?,
            Err(_) => Duration::from_millis(DEFAULT_RESTART_DELAY_MS),
        };

        let setup_password = std::env::var("SETUP_PASSWORD").ok().filter(|p| !p.is_empty());

        Ok(Self {
            state_dir,
            bind,
            allow_remote,
            setup_password,
            restart_delay,
        })
    }

    /// Refuse binds that would expose the server, and an open wizard to the network.
    pub fn check_exposure(&self, configured: bool) -> Result<(), ConfigError> {
        if self.bind.ip().is_loopback() {
            return Ok(());
        }
        if !self.allow_remote {
            return Err(ConfigError::RemoteNotAllowed(self.bind));
        }
        if !configured && self.setup_password.is_none() {
            return Err(ConfigError::UnprotectedRemoteSetup);
        }
        Ok(())
    }
}

pub fn parse_bind(value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidBind(value.to_string()))
}
