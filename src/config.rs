use crate::error::{ServerError, ServerResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    // Network configuration
    pub listen_address: String,
    pub port: u16,
    pub backlog_size: u32,

    // Filesystem configuration
    pub root_dir: PathBuf,

    // Rate limiting
    pub rate_limit_window: Duration,
    pub rate_limit_max_requests: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".to_string(),
            port: 8080,
            backlog_size: 1024,

            root_dir: PathBuf::from("."),

            rate_limit_window: Duration::from_secs(1),
            rate_limit_max_requests: 5,
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address and port to listen on
    pub fn with_address(mut self, address: &str, port: u16) -> Self {
        self.listen_address = address.to_string();
        self.port = port;
        self
    }

    /// Set the port to listen on
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the directory to serve files from
    pub fn with_root_dir<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.root_dir = root.into();
        self
    }

    /// Set the rate-limit window and the request quota per window
    pub fn with_rate_limit(mut self, window: Duration, max_requests: usize) -> Self {
        self.rate_limit_window = window;
        self.rate_limit_max_requests = max_requests;
        self
    }

    /// Get the full address string (address:port)
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.listen_address, self.port)
    }

    /// Check that the served root exists and is a directory
    pub fn validate(&self) -> ServerResult<()> {
        if !self.root_dir.is_dir() {
            return Err(ServerError::Config(format!(
                "{} is not a directory",
                self.root_dir.display()
            )));
        }
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ServerResult<Self> {
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_json_file<P: AsRef<Path>>(&self, path: P) -> ServerResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
