use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::cli::ServeArgs;
use crate::holder::RetryConfig;

pub const CONFIG_FILENAME: &str = "query-aggregator.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Seconds allowed for each holder request.
    pub holder_timeout_secs: u64,
    /// Attempts per holder fetch; 1 disables retries.
    pub holder_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            holder_timeout_secs: 10,
            holder_attempts: 1,
            retry_delay_ms: 500,
        }
    }
}

impl Config {
    /// Load the explicit file if given, else `CONFIG_FILENAME` when present,
    /// else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => load_config_from_path(path),
            None if Path::new(CONFIG_FILENAME).exists() => load_config_from_path(CONFIG_FILENAME),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Command-line and environment values take precedence over the file.
    pub fn apply_args(&mut self, args: &ServeArgs) {
        if let Some(host) = &args.host {
            self.host = host.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(secs) = args.holder_timeout_secs {
            self.holder_timeout_secs = secs;
        }
        if let Some(attempts) = args.holder_attempts {
            self.holder_attempts = attempts;
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.host.is_empty(), "host must not be empty");
        ensure!(
            self.holder_timeout_secs > 0,
            "holder_timeout_secs must be greater than zero"
        );
        ensure!(
            self.holder_attempts > 0,
            "holder_attempts must be at least 1"
        );
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn holder_timeout(&self) -> Duration {
        Duration::from_secs(self.holder_timeout_secs)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::fixed(self.holder_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    /// Deadline for a whole session: every attempt plus the delays between them.
    pub fn session_timeout(&self) -> Duration {
        self.retry_config().session_budget(self.holder_timeout())
    }
}

pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.as_ref().display()))?;
    Ok(config)
}
