//! Configuration loading and validation for the virtual service

use clap::ValueEnum;
use ipvs::{Destination, ForwardingMethod, Protocol, Scheduler, Service};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found in search paths")]
    FileNotFound,

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(#[from] ValidationErrors),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub service: ServiceSpec,

    #[serde(default)]
    pub backends: Vec<BackendSpec>,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// The virtual service clients connect to
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ServiceSpec {
    pub vip: IpAddr,

    #[validate(range(min = 1))]
    pub port: u16,

    #[serde(default)]
    pub protocol: Protocol,

    #[serde(default)]
    pub scheduler: Scheduler,
}

/// A real server behind the virtual service
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BackendSpec {
    pub ip: IpAddr,

    /// Defaults to the virtual service port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1))]
    pub port: Option<u16>,

    #[serde(default = "default_weight")]
    #[validate(range(max = 65535))]
    pub weight: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarding: Option<ForwardingMethod>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

fn default_weight() -> u32 {
    1
}

impl BackendSpec {
    /// Socket address of this backend once the port default is applied.
    pub fn endpoint(&self, service_port: u16) -> SocketAddr {
        SocketAddr::new(self.ip, self.port.unwrap_or(service_port))
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.service.validate()?;
        for backend in &self.backends {
            backend.validate()?;
        }

        let mut errors = ValidationErrors::new();
        let vip = self.service.vip;

        if let Some(backend) = self.backends.iter().find(|b| b.ip.is_ipv4() != vip.is_ipv4()) {
            errors.add(
                "backends",
                with_message(
                    "address_family_mismatch",
                    format!("backend {} is not in the same address family as {}", backend.ip, vip),
                ),
            );
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self
            .backends
            .iter()
            .map(|b| b.endpoint(self.service.port))
            .find(|ep| !seen.insert(*ep))
        {
            errors.add(
                "backends",
                with_message("duplicate_backend", format!("backend {} listed twice", dup)),
            );
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn with_message(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

// Configuration loading implementation

impl Config {
    /// Load configuration from default search paths
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_first_of(&Self::search_paths())
    }

    /// Load the first existing file among `candidates`
    fn load_first_of(candidates: &[PathBuf]) -> Result<Self, ConfigError> {
        let path = Self::find_config_file_in(candidates).ok_or(ConfigError::FileNotFound)?;
        tracing::info!("Loading configuration from: {}", path.display());
        Self::load_from_file(&path)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate configuration from a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Standard locations, most specific last
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/ipvs-proxy/config.yaml")];

        if let Some(home_path) = Self::home_config_path() {
            paths.push(home_path);
        }

        paths.push(PathBuf::from("./config.yaml"));
        paths
    }

    /// Find the first configuration file that exists
    fn find_config_file_in(candidates: &[PathBuf]) -> Option<PathBuf> {
        candidates.iter().find(|p| p.is_file()).cloned()
    }

    /// Get home directory config path
    fn home_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/ipvs-proxy/config.yaml"))
    }

    /// The virtual service in the `ipvs` crate model
    pub fn service(&self) -> Service {
        Service {
            address: self.service.vip,
            port: self.service.port,
            protocol: self.service.protocol,
            scheduler: self.service.scheduler.clone(),
        }
    }

    /// Backends in configuration order, with port defaults applied
    pub fn destinations(&self) -> Vec<Destination> {
        self.backends
            .iter()
            .map(|b| Destination {
                address: b.ip,
                port: b.port.unwrap_or(self.service.port),
                weight: b.weight,
                forwarding: b.forwarding,
            })
            .collect()
    }
}
