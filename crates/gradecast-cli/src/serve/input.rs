use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use gradecast_classifiers::pipeline::DEFAULT_MODEL_PATH;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// Environment variable consulted when `--port` is not given.
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServeConfig {
    pub model_path: String,
    pub host: String,
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        ServeConfig {
            model_path: String::from(DEFAULT_MODEL_PATH),
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
        }
    }
}

impl ServeConfig {
    pub fn from_arguments(matches: &ArgMatches) -> Result<Self> {
        let mut config = ServeConfig::default();
        if let Some(model_path) = matches.get_one::<String>("model_path") {
            config.model_path = model_path.clone();
        }
        if let Some(host) = matches.get_one::<String>("host") {
            config.host = host.clone();
        }
        config.port = resolve_port(
            matches.get_one::<u16>("port").copied(),
            std::env::var(PORT_ENV).ok().as_deref(),
        )?;
        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

/// `--port` wins, then the `PORT` environment value, then [`DEFAULT_PORT`].
pub fn resolve_port(cli: Option<u16>, env: Option<&str>) -> Result<u16> {
    if let Some(port) = cli {
        return Ok(port);
    }
    match env.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value
            .parse::<u16>()
            .with_context(|| format!("{} must be a port number, got {:?}", PORT_ENV, value)),
        None => Ok(DEFAULT_PORT),
    }
}
