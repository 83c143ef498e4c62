use std::fmt;
use std::net::{Ipv6Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use goyagi_core::error::{GoyagiError, Result};

/// Sentinel database URL selecting the in-process store.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub version: u32,

    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub statsd: StatsdSection,

    #[serde(default)]
    pub database: DatabaseSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            environment: Environment::default(),
            server: ServerSection::default(),
            statsd: StatsdSection::default(),
            database: DatabaseSection::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GoyagiError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.statsd.validate()?;
        self.database.validate()?;

        Ok(())
    }

    /// Database URL, falling back to a per-environment default.
    pub fn database_url(&self) -> &str {
        match (&self.database.url, self.environment) {
            (Some(url), _) => url.as_str(),
            (None, Environment::Test) => "sqlite::memory:",
            (None, _) => "sqlite://goyagi.db?mode=rwc",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = GoyagiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "development" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(GoyagiError::Config(format!("unknown environment: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(1..=120000).contains(&self.shutdown_timeout_ms) {
            return Err(GoyagiError::Config(
                "server.shutdown_timeout_ms must be between 1 and 120000".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            GoyagiError::Config(format!("server.listen must be a valid SocketAddr: {e}"))
        })
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_shutdown_timeout_ms() -> u64 {
    10000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatsdSection {
    #[serde(default = "default_statsd_host")]
    pub host: String,

    #[serde(default = "default_statsd_port")]
    pub port: u16,
}

impl Default for StatsdSection {
    fn default() -> Self {
        Self {
            host: default_statsd_host(),
            port: default_statsd_port(),
        }
    }
}

impl StatsdSection {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(GoyagiError::Config("statsd.host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(GoyagiError::Config("statsd.port must not be 0".into()));
        }
        Ok(())
    }

    /// `host:port`, with IPv6 literals bracketed (`[::1]:8125`).
    pub fn address(&self) -> String {
        match self.host.parse::<Ipv6Addr>() {
            Ok(_) => format!("[{}]:{}", self.host, self.port),
            Err(_) => format!("{}:{}", self.host, self.port),
        }
    }
}

fn default_statsd_host() -> String {
    "127.0.0.1".into()
}
fn default_statsd_port() -> u16 {
    8125
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSection {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=64).contains(&self.max_connections) {
            return Err(GoyagiError::Config(
                "database.max_connections must be between 1 and 64".into(),
            ));
        }
        if matches!(&self.url, Some(u) if u.trim().is_empty()) {
            return Err(GoyagiError::Config("database.url must not be empty".into()));
        }
        Ok(())
    }
}

fn default_max_connections() -> u32 {
    5
}
