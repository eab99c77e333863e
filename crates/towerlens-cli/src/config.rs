//! `towerlens.toml` loading
//!
//! Every key is optional. Command-line flags and their `TOWERLENS_*`
//! environment variables win over file values.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use towerlens_core::{LayoutError, Layouts, ReportPolicy, TrackerLayout};
use towerlens_llm::WatsonxConfig;

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "towerlens.toml";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Day of the month from which a tracker counts as the current snapshot
    pub cutoff_day: u32,
    pub store: StoreConfig,
    pub llm: WatsonxConfig,
    pub policy: Policies,
    /// Extra or replacement structure layouts
    pub layout: Vec<TrackerLayout>,
    /// Extra or replacement layouts of any kind
    pub layouts: Layouts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cutoff_day: 10,
            store: StoreConfig::default(),
            llm: WatsonxConfig::default(),
            policy: Policies::default(),
            layout: Vec::new(),
            layouts: Layouts::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory standing in for the bucket
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("bucket"),
        }
    }
}

/// Classification and rounding per report kind
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policies {
    pub structure: ReportPolicy,
    pub slab: ReportPolicy,
    pub overall: ReportPolicy,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        if !(1..=31).contains(&config.cutoff_day) {
            bail!("cutoff_day must be between 1 and 31, got {}", config.cutoff_day);
        }
        Ok(config)
    }

    /// Read `path`, or `towerlens.toml` in the working directory when it
    /// exists, or fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Built-in layouts with the configured ones merged over them
    pub fn layouts(&self) -> Result<Layouts, LayoutError> {
        let extra = Layouts {
            structure: self.layout.clone(),
            ..Layouts::default()
        };
        let layouts = Layouts::builtin()
            .merge(self.layouts.clone())
            .merge(extra);
        layouts.validate()?;
        Ok(layouts)
    }
}
