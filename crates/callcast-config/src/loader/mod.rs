//! Layered configuration loading.
//!
//! Layers are read from low to high precedence (system, user, working
//! directory, explicit runtime files), checked individually, merged, and
//! finally decoded into a [`CallcastConfig`]. `HOST`/`PORT` from the process
//! environment are applied on top when enabled.

mod merge;
mod schema;
mod sources;


use crate::{CallcastConfig, ConfigError};
use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub use sources::CONFIG_FILE_NAME;

const ENV_HOST: &str = "HOST";
const ENV_PORT: &str = "PORT";

/// Merged config and the layers it was built from.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: CallcastConfig,
    /// Applied layers, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

/// Where a config layer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    System,
    User,
    Cwd,
    /// Files passed explicitly at startup.
    Runtime,
    /// `HOST`/`PORT` environment variables.
    Env,
}

/// One applied layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    /// `None` for the environment layer.
    pub path: Option<PathBuf>,
}

/// Controls which layers are looked up.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Directory searched for `callcast.json5`.
    pub cwd: PathBuf,
    pub system_config_path: Option<PathBuf>,
    pub user_config_path: Option<PathBuf>,
    /// Required files applied after the discovered layers, in order.
    pub runtime_paths: Vec<PathBuf>,
    /// Apply `HOST`/`PORT` from the process environment.
    pub read_env: bool,
}

impl LayeredConfigOptions {
    /// System, user and cwd layers plus environment overrides.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            system_config_path: sources::system_path(),
            user_config_path: sources::user_path(),
            runtime_paths: Vec::new(),
            read_env: true,
        }
    }

    /// Only the cwd layer and runtime files; the environment is ignored.
    pub fn isolated(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            system_config_path: None,
            user_config_path: None,
            runtime_paths: Vec::new(),
            read_env: false,
        }
    }

    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl CallcastConfig {
    /// Load one file without layering or environment overrides.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config file (path={})", path.display());
        Self::load_from_str(&fs::read_to_string(path)?)
    }

    /// Parse JSON5 text without layering or environment overrides.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("parsing config text (len={})", contents.len());
        decode(json5::from_str(contents)?, "config")
    }

    /// Load every default layer relative to `cwd`.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load the layers described by `options`.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = options
            .cwd
            .canonicalize()
            .unwrap_or_else(|_| options.cwd.clone());
        let discovered = [
            (ConfigLayerSource::System, options.system_config_path.clone()),
            (ConfigLayerSource::User, options.user_config_path.clone()),
            (
                ConfigLayerSource::Cwd,
                Some(cwd.join(sources::CONFIG_FILE_NAME)),
            ),
        ];

        let mut merged = Value::Object(Map::new());
        let mut layers = Vec::new();
        let mut seen = HashSet::new();
        for (source, path) in discovered {
            let Some(path) = path else { continue };
            if !seen.insert(sources::identity(&path)) {
                debug!("config layer already read (source={:?}, path={})", source, path.display());
                continue;
            }
            if let Some(file) = sources::read_if_present(source, &path)? {
                merge::overlay(&mut merged, &file.value);
                layers.push(file.layer);
            }
        }
        for path in &options.runtime_paths {
            let file = sources::read(ConfigLayerSource::Runtime, path)?;
            merge::overlay(&mut merged, &file.value);
            layers.push(file.layer);
        }

        let mut config = decode(merged, "effective")?;
        if options.read_env && config.apply_env_overrides_with(|name| std::env::var(name).ok())? {
            config.validate()?;
            layers.push(ConfigLayer {
                source: ConfigLayerSource::Env,
                path: None,
            });
        }
        info!(
            "config loaded (layers={}, host={}, port={})",
            layers.len(),
            config.server.host,
            config.server.port
        );
        Ok(LayeredConfig { config, layers })
    }

    /// Apply `HOST` and `PORT` as returned by `lookup`.
    ///
    /// Returns whether anything changed. An empty `HOST` is ignored; an
    /// unparsable `PORT` is an error.
    pub fn apply_env_overrides_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<bool, ConfigError> {
        let host = lookup(ENV_HOST).filter(|host| !host.trim().is_empty());
        let port = match lookup(ENV_PORT) {
            Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| {
                ConfigError::EnvOverride {
                    name: ENV_PORT.to_string(),
                    value: raw.clone(),
                }
            })?),
            None => None,
        };

        let applied = host.is_some() || port.is_some();
        if let Some(host) = host {
            debug!("environment override (name={}, value={})", ENV_HOST, host);
            self.server.host = host;
        }
        if let Some(port) = port {
            debug!("environment override (name={}, value={})", ENV_PORT, port);
            self.server.port = port;
        }
        Ok(applied)
    }

    /// Checks that span fields or depend on values rather than types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::invalid("server.host", "must not be empty"));
        }
        if self.hub.transcript_capacity == 0 {
            return Err(ConfigError::invalid(
                "hub.transcript_capacity",
                "must be at least 1",
            ));
        }
        if self.hub.subscriber_buffer == 0 {
            return Err(ConfigError::invalid(
                "hub.subscriber_buffer",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn decode(value: Value, label: &str) -> Result<CallcastConfig, ConfigError> {
    schema::check(&value, label)?;
    let config: CallcastConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
