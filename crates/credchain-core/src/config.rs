//! Core configuration, loaded once per process.
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::CREDCHAIN_CONFIG;

lazy_static! {
    /// Lazy static reference to core configuration, loaded from the file
    /// named by the `CREDCHAIN_CONFIG` environment variable when set and
    /// falling back to defaults otherwise.
    pub static ref CORE_CONFIG: CoreConfig = load_config();
}

fn load_config() -> CoreConfig {
    match std::env::var(CREDCHAIN_CONFIG) {
        Ok(path) => parse_toml(
            &fs::read_to_string(&path).expect("Error reading credchain configuration file"),
        ),
        Err(_) => CoreConfig::default(),
    }
}

/// Parses and returns core configuration.
fn parse_toml(toml_str: &str) -> CoreConfig {
    toml::from_str::<Config>(toml_str)
        .expect("Error parsing credchain configuration file")
        .core
}

/// Gets `credchain-core` configuration variables.
pub fn core_config() -> &'static CoreConfig {
    &CORE_CONFIG
}

/// Configuration variables for the `credchain-core` crate.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct CoreConfig {
    /// Whether status-carrying credentials must be checked for revocation
    /// even when no revocation service was supplied (fail closed).
    #[serde(default = "default_force_revocation_check")]
    pub force_revocation_check: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            force_revocation_check: default_force_revocation_check(),
        }
    }
}

fn default_force_revocation_check() -> bool {
    true
}

/// Wrapper struct for parsing the `core` table.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug)]
struct Config {
    /// Core configuration data.
    core: CoreConfig,
}
