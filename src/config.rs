//! Process configuration read from the environment

use thiserror::Error;

/// Environment variable holding the bind host
pub const HOST_VAR: &str = "LEDGER_HOST";

/// Environment variable holding the bind port
pub const PORT_VAR: &str = "LEDGER_PORT";

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Where the HTTP server listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Reads `LEDGER_HOST` and `LEDGER_PORT`, falling back to `0.0.0.0:5000`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_VAR)
            .filter(|host| !host.trim().is_empty())
            .unwrap_or_else(default_host);

        let port = match lookup(PORT_VAR) {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: PORT_VAR,
                    value,
                })?,
            None => default_port(),
        };

        Ok(Self { host, port })
    }

    /// Address pair accepted by `HttpServer::bind`
    pub fn bind_address(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}
