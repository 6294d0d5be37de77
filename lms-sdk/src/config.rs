//! Connection configuration
//!
//! Defaults target a server on the local machine at the standard CLI port.

use std::time::Duration;

use lms_protocol::DEFAULT_MAX_LINE_LENGTH;

use crate::{Result, SdkError};

/// Standard port of the server's command-line interface
pub const DEFAULT_PORT: u16 = 9090;

/// Environment variable naming the server host
pub const HOST_ENV: &str = "LMS_HOST";

/// Environment variable naming the server CLI port
pub const PORT_ENV: &str = "LMS_PORT";

/// Settings for the single CLI connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Server host name or address
    /// Default: "127.0.0.1"
    pub host: String,

    /// CLI port
    /// Default: 9090
    pub port: u16,

    /// Longest inbound line accepted before the connection is dropped
    /// Default: 64 KiB
    pub max_line_length: usize,

    /// Size of each socket read
    /// Default: 4096
    pub read_buffer_size: usize,

    /// How long to wait for the TCP connection to open
    /// Default: 5 seconds
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            read_buffer_size: 4096,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl ConnectionConfig {
    /// Connect to `host` on the default port
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Settings for a server with many players or long names
    pub fn large_server() -> Self {
        Self {
            max_line_length: 1024 * 1024,
            read_buffer_size: 64 * 1024,
            ..Default::default()
        }
    }

    /// Read `LMS_HOST` and `LMS_PORT` over the defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup(HOST_ENV) {
            config.host = host;
        }

        if let Some(port) = lookup(PORT_ENV) {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| SdkError::Config(format!("{PORT_ENV}={port} is not a port")))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// `host:port` for the socket
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check the configuration for values that can never work
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(SdkError::Config("Host must not be empty".to_string()));
        }

        if self.port == 0 {
            return Err(SdkError::Config("Port must be greater than 0".to_string()));
        }

        if self.max_line_length == 0 {
            return Err(SdkError::Config(
                "Max line length must be greater than 0".to_string(),
            ));
        }

        if self.read_buffer_size == 0 {
            return Err(SdkError::Config(
                "Read buffer size must be greater than 0".to_string(),
            ));
        }

        if self.connect_timeout == Duration::ZERO {
            return Err(SdkError::Config(
                "Connect timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_max_line_length(mut self, limit: usize) -> Self {
        self.max_line_length = limit;
        self
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
