//! Persistent settings in `<config dir>/lamctl/config.yaml`
//!
//! Lookup order for profile and region: command line, then environment,
//! then this file, then the built-in default.

use crate::operation::Impact;
use crate::output::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub output: OutputFormat,
    /// Operations at or above this impact ask before running
    pub confirm_threshold: Impact,
    pub readonly: bool,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: None,
            region: None,
            endpoint_url: None,
            output: OutputFormat::default(),
            confirm_threshold: Impact::High,
            readonly: false,
            path: None,
        }
    }
}

impl Config {
    /// Load from the default location. Missing or unreadable files give defaults.
    pub fn load() -> Self {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(path) {
            Ok(text) => serde_yaml::from_str::<Config>(&text).unwrap_or_else(|e| {
                warn!("Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        config.path = Some(path.to_path_buf());
        config
    }

    pub fn save(&self) -> Result<()> {
        let path = self
            .path
            .clone()
            .or_else(config_path)
            .context("no configuration directory available")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let text = serde_yaml::to_string(self)?;
        std::fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn set_profile(&mut self, profile: &str) -> Result<()> {
        self.profile = Some(profile.to_string());
        self.save()
    }

    pub fn set_region(&mut self, region: &str) -> Result<()> {
        self.region = Some(region.to_string());
        self.save()
    }

    pub fn effective_profile(&self) -> String {
        self.effective_profile_with(|key| std::env::var(key).ok())
    }

    pub fn effective_region(&self) -> String {
        self.effective_region_with(|key| std::env::var(key).ok())
    }

    pub fn effective_endpoint_url(&self) -> Option<String> {
        first_set(&|key: &str| std::env::var(key).ok(), &["AWS_ENDPOINT_URL"]).or_else(|| self.endpoint_url.clone())
    }

    fn effective_profile_with(&self, env: impl Fn(&str) -> Option<String>) -> String {
        first_set(&env, &["AWS_PROFILE"])
            .or_else(|| self.profile.clone())
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
    }

    fn effective_region_with(&self, env: impl Fn(&str) -> Option<String>) -> String {
        first_set(&env, &["AWS_REGION", "AWS_DEFAULT_REGION"])
            .or_else(|| self.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }
}

fn first_set(env: &dyn Fn(&str) -> Option<String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| env(key))
        .find(|value| !value.trim().is_empty())
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("lamctl"))
        .or_else(|| dirs::home_dir().map(|home| home.join(".lamctl")))
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}
