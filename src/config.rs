//! Configuration management
//!
//! Settings are layered: built-in defaults, then the first TOML file found,
//! then `HG659_`-prefixed environment variables. Command-line flags are
//! applied on top by `main`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// Router connection and credentials
    #[serde(default)]
    pub device: DeviceConfig,

    /// Local JSON proxy settings
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    /// Hostname or IP of the router
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            username: default_username(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProxyConfig {
    /// Interface to bind
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds between keep-alive requests; 0 disables the keeper
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            heartbeat_interval: default_heartbeat_interval(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "192.168.1.1".to_string()
}

fn default_username() -> String {
    "user".to_string()
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8659
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_timeout() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from `explicit` if given, else from the first
    /// well-known path that exists, then apply environment overrides
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        match explicit {
            Some(path) => {
                tracing::debug!("Loading config from: {}", path);
                builder = builder.add_source(::config::File::from(PathBuf::from(path)).required(true));
            }
            None => {
                if let Some(path) = Self::search_paths().into_iter().find(|p| p.exists()) {
                    tracing::debug!("Loading config from: {}", path.display());
                    builder = builder.add_source(::config::File::from(path).required(true));
                } else {
                    tracing::debug!("No config file found, using defaults");
                }
            }
        }

        let cfg: Config = builder
            .add_source(
                ::config::Environment::with_prefix("HG659")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        Ok(cfg)
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("hg659.toml"),
            PathBuf::from("/etc/hg659/config.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("hg659/config.toml"));
        }
        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.device.host.trim().is_empty() {
            bail!("device.host must not be empty");
        }
        if self.proxy.port == 0 {
            bail!("proxy.port must not be 0");
        }
        Ok(())
    }

    /// Address the proxy listens on
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.proxy.bind, self.proxy.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.device.host, "192.168.1.1");
        assert_eq!(cfg.device.username, "user");
        assert!(cfg.device.password.is_empty());
        assert_eq!(cfg.listen_addr(), "127.0.0.1:8659");
        assert_eq!(cfg.http.timeout, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let path = std::env::temp_dir().join(format!("hg659-test-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[device]\nhost = \"10.0.0.138\"\npassword = \"secret\"\n\n[proxy]\nport = 9000"
        )
        .unwrap();
        drop(file);

        let cfg = Config::load(path.to_str()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(cfg.device.host, "10.0.0.138");
        assert_eq!(cfg.device.username, "user");
        assert_eq!(cfg.device.password, "secret");
        assert_eq!(cfg.proxy.port, 9000);
        assert_eq!(cfg.proxy.bind, "127.0.0.1");
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        let mut cfg = Config::default();
        cfg.device.host = "  ".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.proxy.port = 0;
        assert!(cfg.validate().is_err());
    }
}
