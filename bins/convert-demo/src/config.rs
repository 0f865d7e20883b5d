use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use convert_engine::CacheConfig;

use crate::error::DemoError;

#[derive(Parser)]
#[command(name = "convert-demo", about = "Person → view conversion through a cached converter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a JSON array of people and print the views
    Convert(ConvertArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ConvertArgs {
    /// Path to the TOML config file (defaults apply when omitted)
    #[arg(long, env = "CONVERT_DEMO_CONFIG")]
    pub config: Option<String>,
    /// Path to a JSON array of people
    #[arg(long)]
    pub input: String,
    /// Name separator, overrides `separator` from the config
    #[arg(long)]
    pub separator: Option<String>,
}

// ---- TOML Config ----

#[derive(Debug, Deserialize)]
pub struct DemoConfig {
    /// Separator placed into every conversion context.
    #[serde(default)]
    pub separator: Option<String>,
    /// Number of blocking workers converting in parallel.
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_workers() -> usize {
    4
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            separator: None,
            workers: default_workers(),
            cache: CacheConfig::default(),
        }
    }
}

impl DemoConfig {
    pub fn load(path: &str) -> Result<Self, DemoError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DemoError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        toml::from_str(&content)
            .map_err(|e| DemoError::Config { context: "parse", detail: format!("'{path}': {e}") })
    }
}
