use std::path::PathBuf;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use crate::guard::GuardConfig;
use crate::identity::ProviderConfig;
use crate::session::SessionConfig;

/// Environment variable naming the YAML file to load.
pub const CONFIG_PATH_ENV: &str = "SESSIONGATE_CONFIG";
/// Prefix for environment overrides, e.g. `SESSIONGATE_GUARD__LOGIN_PATH`.
pub const ENV_PREFIX: &str = "SESSIONGATE_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

fn default_bind_address() -> String {
    "localhost:4000".to_string()
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct ConfigV1 {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub guard: GuardConfig,
    pub site: SiteConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The built single-page application served behind the guard.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct SiteConfig {
    pub root: PathBuf,
    /// Served for page paths with no matching file.
    #[serde(default = "default_index")]
    pub index: String,
    /// Paths under these prefixes are served without consulting the guard,
    /// whether or not a file exists. Existing files under `root` are always
    /// served directly.
    #[serde(default)]
    pub asset_prefixes: Vec<String>,
}

fn default_index() -> String {
    "index.html".to_string()
}

/// Builds the figment for a YAML file with `SESSIONGATE_` environment
/// overrides layered on top.
pub fn figment_for(path: &str) -> Figment {
    Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__"))
}

pub fn extract_config(figment: &Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Load config from `$SESSIONGATE_CONFIG`, or "config.yaml" in the current
/// directory.
pub fn load_config() -> ConfigV1 {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "./config.yaml".to_string());
    match extract_config(&figment_for(&path)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration from '{}': {}", path, e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
