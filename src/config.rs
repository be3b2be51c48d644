use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use docseek_core::{IndexOptions, SearchOptions, SnippetOptions};

use crate::extract::image::ImageLimits;

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub snippets: SnippetConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_text_boost")]
    pub text_boost: f64,
    #[serde(default = "default_fuzzy")]
    pub fuzzy: f64,
    #[serde(default = "default_max_fuzzy")]
    pub max_fuzzy: usize,
    #[serde(default = "default_prefix")]
    pub prefix: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            text_boost: default_text_boost(),
            fuzzy: default_fuzzy(),
            max_fuzzy: default_max_fuzzy(),
            prefix: default_prefix(),
        }
    }
}

fn default_limit() -> usize {
    20
}
fn default_text_boost() -> f64 {
    2.0
}
fn default_fuzzy() -> f64 {
    0.2
}
fn default_max_fuzzy() -> usize {
    6
}
fn default_prefix() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SnippetConfig {
    #[serde(default = "default_radius")]
    pub radius: usize,
    #[serde(default = "default_max_snippets")]
    pub max_snippets: usize,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            max_snippets: default_max_snippets(),
        }
    }
}

fn default_radius() -> usize {
    50
}
fn default_max_snippets() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ExtractConfig {
    #[serde(default = "default_ocr_timeout_secs")]
    pub ocr_timeout_secs: u64,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: u32,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            ocr_timeout_secs: default_ocr_timeout_secs(),
            max_image_bytes: default_max_image_bytes(),
            max_image_dimension: default_max_image_dimension(),
        }
    }
}

fn default_ocr_timeout_secs() -> u64 {
    30
}
fn default_max_image_bytes() -> u64 {
    50 * 1024 * 1024
}
fn default_max_image_dimension() -> u32 {
    10_000
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IngestConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    1
}

impl Config {
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            text_boost: self.search.text_boost,
            fuzzy: self.search.fuzzy,
            max_fuzzy: self.search.max_fuzzy,
            prefix: self.search.prefix,
        }
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            default_limit: self.search.default_limit,
        }
    }

    pub fn snippet_options(&self) -> SnippetOptions {
        SnippetOptions {
            radius: self.snippets.radius,
            max_snippets: self.snippets.max_snippets,
        }
    }

    pub fn image_limits(&self) -> ImageLimits {
        ImageLimits {
            max_bytes: self.extract.max_image_bytes,
            max_dimension: self.extract.max_image_dimension,
            ocr_timeout: Duration::from_secs(self.extract.ocr_timeout_secs),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Parse and validate a TOML config document.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.search.default_limit < 1 {
        anyhow::bail!("search.default_limit must be >= 1");
    }
    if config.search.text_boost.is_nan() || config.search.text_boost <= 0.0 {
        anyhow::bail!("search.text_boost must be > 0");
    }
    if !(0.0..=1.0).contains(&config.search.fuzzy) {
        anyhow::bail!("search.fuzzy must be in [0.0, 1.0]");
    }

    if config.snippets.max_snippets == 0 {
        anyhow::bail!("snippets.max_snippets must be > 0");
    }

    if config.extract.ocr_timeout_secs == 0 {
        anyhow::bail!("extract.ocr_timeout_secs must be > 0");
    }
    if config.extract.max_image_bytes == 0 || config.extract.max_image_dimension == 0 {
        anyhow::bail!("extract image limits must be > 0");
    }

    if config.ingest.concurrency < 1 {
        anyhow::bail!("ingest.concurrency must be >= 1");
    }

    Ok(config)
}
