use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Analyzer configuration, loaded from a YAML file:
///
/// ```yaml
/// api_key: "YOUR_KEY"
/// api_base: "http://localhost:5001/v1"
/// model: "qwen3_30b_a3"
/// ```
///
/// Tuning knobs all have defaults and can be omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VibesConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_single_call_threshold")]
    pub single_call_threshold: usize,
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_batch_size() -> usize {
    40
}

fn default_single_call_threshold() -> usize {
    50
}

/// Matches the in-flight batch width the pipeline was tuned with.
fn default_max_in_flight() -> usize {
    12
}

pub fn load_config(path: &str) -> Result<VibesConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Reading config file {}", path))?;
    let cfg: VibesConfig =
        serde_yaml::from_str(&raw).with_context(|| format!("Parsing config file {}", path))?;
    Ok(cfg)
}
