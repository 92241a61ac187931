use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Reference cap on indexed characters per document field.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 20_000;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub root: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
    #[serde(default = "default_title_boost")]
    pub title_boost: f64,
    #[serde(default = "default_body_boost")]
    pub body_boost: f64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            title_boost: default_title_boost(),
            body_boost: default_body_boost(),
        }
    }
}

fn default_max_text_chars() -> usize {
    DEFAULT_MAX_TEXT_CHARS
}
fn default_title_boost() -> f64 {
    2.0
}
fn default_body_boost() -> f64 {
    1.0
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummaryConfig {
    #[serde(default = "default_sentences")]
    pub sentences: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            sentences: default_sentences(),
        }
    }
}

fn default_sentences() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

impl Config {
    /// Config rooted at `root` with every other section defaulted.
    pub fn for_store(root: impl Into<PathBuf>) -> Self {
        Self {
            store: StoreConfig { root: root.into() },
            index: IndexConfig::default(),
            summary: SummaryConfig::default(),
            server: ServerConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.index.max_text_chars == 0 {
            anyhow::bail!("index.max_text_chars must be finite and > 0");
        }
        if !self.index.title_boost.is_finite() || self.index.title_boost <= 0.0 {
            anyhow::bail!("index.title_boost must be finite and > 0");
        }
        if !self.index.body_boost.is_finite() || self.index.body_boost <= 0.0 {
            anyhow::bail!("index.body_boost must be finite and > 0");
        }
        if self.summary.sentences == 0 {
            anyhow::bail!("summary.sentences must be >= 1");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}
