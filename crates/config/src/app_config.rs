// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::chain_config::ChainConfig;
use crate::disclosure_config::DisclosureConfig;
use crate::load_config::{find_in_parent, resolve_config_path, DEFAULT_CONFIG_NAME};
use anyhow::{anyhow, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, env, fs, io, path::PathBuf};
use tracing::debug;

/// Application configuration handed to every component at construction
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Chains this client talks to, each with its own decryption network endpoint
    pub chains: Vec<ChainConfig>,
    pub disclosure: DisclosureConfig,
    /// OTLP collector endpoint, tracing is exported when set
    pub otel: Option<String>,
    pub log_level: String,
    /// File the configuration was read from
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chains: vec![],
            disclosure: DisclosureConfig::default(),
            otel: None,
            log_level: "info".to_string(),
            config_file: None,
        }
    }
}

impl AppConfig {
    pub fn chain(&self, chain_id: u64) -> Result<&ChainConfig> {
        self.chains
            .iter()
            .find(|c| c.chain_id == chain_id)
            .ok_or_else(|| anyhow!("No chain configured with id {chain_id}"))
    }

    pub fn chain_by_name(&self, name: &str) -> Result<&ChainConfig> {
        self.chains
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| anyhow!("No chain configured with name '{name}'"))
    }

    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for chain in &self.chains {
            if !ids.insert(chain.chain_id) {
                return Err(anyhow!("Chain id {} is configured twice", chain.chain_id));
            }
            chain.validate()?;
        }
        Ok(())
    }
}

pub struct OsDirs;
impl OsDirs {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir().unwrap_or_default().join("cv")
    }
}

/// Load the configuration.
///
/// Layers, lowest priority first: built in defaults, the YAML file (with `${VAR}` references
/// expanded from the environment), then `CV_` prefixed environment variables where `__`
/// separates nested keys, eg. `CV_DISCLOSURE__MAX_ATTEMPTS=6`.
///
/// A missing file is only an error when `config_file` names it explicitly.
pub fn load_config(config_file: Option<&str>) -> Result<AppConfig> {
    let explicit = config_file.map(PathBuf::from);
    let resolved = resolve_config_path(
        find_in_parent,
        env::current_dir()?,
        OsDirs::config_dir(),
        DEFAULT_CONFIG_NAME,
        explicit.clone(),
    );

    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
    match fs::read_to_string(&resolved) {
        Ok(raw) => {
            let expanded = shellexpand::env(&raw)
                .with_context(|| format!("Could not expand variables in {}", resolved.display()))?;
            figment = figment.merge(Yaml::string(&expanded));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound && explicit.is_none() => {
            debug!("No configuration at {}, using defaults", resolved.display());
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Configuration file not found at {}", resolved.display())
            })
        }
    }

    let mut config: AppConfig = figment
        .merge(Env::prefixed("CV_").split("__"))
        .extract()
        .context("Could not parse configuration")?;
    config.config_file = Some(resolved);
    config.validate()?;
    Ok(config)
}
