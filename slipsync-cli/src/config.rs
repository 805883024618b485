use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use slipsync_core::MatchPolicy;
use slipsync_core::time::DEFAULT_TIMEZONE;
use std::fs;
use std::path::Path;

/// Optional policy file. Credentials never live here; they come from flags
/// or the environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// IANA zone the notification `date`/`time` fields are written in
    pub timezone: String,
    pub matching: MatchPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            matching: MatchPolicy::default(),
        }
    }
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config")
}

/// No path means built-in defaults; a path that cannot be read is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(p) = path else {
        return Ok(Config::default());
    };
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("in {}", p.display()))
}
