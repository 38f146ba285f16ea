use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::Deserialize;

/// Environment variable naming the YAML config file.
pub const CONFIG_ENV: &str = "EXPRESSO_CONFIG";
/// Environment override for `host:port`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub tls: Option<TlsConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Sent in the `Server` header of every response
    pub name: String,
    /// Serve more than one request per connection
    pub reuse_connections: bool,
    /// How many times one connection may be reused before it is closed
    pub max_reuse: u32,
    /// Bytes requested from the socket per read
    pub read_buffer_size: usize,
    /// Largest request (head plus body) accepted, in bytes
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            name: "expresso".to_string(),
            reuse_connections: true,
            max_reuse: 1000,
            read_buffer_size: 8192,
            max_request_size: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Seconds between wholesale invalidations; 0 disables invalidation
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TlsConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Config {
    /// Loads the file named by `EXPRESSO_CONFIG` (defaults when unset), then
    /// applies a `LISTEN=host:port` override.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Ok(listen) = std::env::var(LISTEN_ENV) {
            cfg.apply_listen(&listen)?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("failed to load config file {}", path.display()))
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Self = serde_yaml::from_str(raw).context("invalid YAML config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Replaces host and port from a `host:port` string.
    pub fn apply_listen(&mut self, listen: &str) -> anyhow::Result<()> {
        let (host, port) = listen
            .rsplit_once(':')
            .with_context(|| format!("{LISTEN_ENV} must be host:port, got {listen:?}"))?;
        self.server.port = port
            .parse()
            .with_context(|| format!("invalid port in {LISTEN_ENV}: {port:?}"))?;
        self.server.host = host.to_string();
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.read_buffer_size == 0 {
            bail!("server.read_buffer_size must be greater than zero");
        }
        if self.server.max_request_size < self.server.read_buffer_size {
            bail!(
                "server.max_request_size ({}) must be at least server.read_buffer_size ({})",
                self.server.max_request_size,
                self.server.read_buffer_size
            );
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
