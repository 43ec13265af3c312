//! Client configuration.
//!
//! Two pieces of environment-derived state: the backend origin and the
//! directory holding durable client state (the remembered role).
//!
//! The origin comes from `HOMEMATCH_API_BASE_URL` and falls back to the
//! local development server.

use std::path::PathBuf;

use anyhow::Result;

/// Application name used for the state directory path
const APP_NAME: &str = "homematch";

/// Environment variable overriding the backend origin
const API_BASE_URL_VAR: &str = "HOMEMATCH_API_BASE_URL";

/// Default backend origin (local development server)
const DEFAULT_API_BASE_URL: &str = "http://localhost:33333";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub state_dir: PathBuf,
}

impl Config {
    /// Build a config from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let api_base_url = std::env::var(API_BASE_URL_VAR)
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let state_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join(APP_NAME);

        Ok(Self {
            api_base_url,
            state_dir,
        })
    }
}
