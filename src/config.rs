/// Configuration module for the corpus tools.
///
/// Handles loading, validating, and providing default configuration values.
/// Everything tied to the external converter page (selectors, polling
/// thresholds) lives here so it can change without touching code.
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::extract::keywords::TRANSLATION_KEYWORDS;
use crate::extract::pairing::DEFAULT_MAX_CANDIDATES;

pub const DEFAULT_CONFIG_PATH: &str = "vbcs.json";

// ── Default value functions ──────────────────────────────────────────

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_translation_keywords() -> Vec<String> {
    TRANSLATION_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_max_pair_candidates() -> usize {
    DEFAULT_MAX_CANDIDATES
}

fn default_true() -> bool {
    true
}

fn default_converter_url() -> String {
    "https://icsharpcode.github.io/CodeConverter/".to_string()
}

fn default_browser_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_input_selectors() -> Vec<String> {
    vec![
        "textarea.inputarea.monaco-mouse-cursor-text".to_string(),
        "textarea[aria-label*='Editor content']".to_string(),
        "textarea[role='textbox']".to_string(),
        "textarea".to_string(),
    ]
}

fn default_input_container_selector() -> String {
    "div.monaco-editor[data-uri='inmemory://model/1']".to_string()
}

fn default_output_container_selector() -> String {
    "div.monaco-editor[data-uri='inmemory://model/2']".to_string()
}

fn default_output_selectors() -> Vec<String> {
    vec![
        "div.monaco-editor[data-uri='inmemory://model/2'] textarea.inputarea".to_string(),
        "div.monaco-editor[data-uri*='model/2'] textarea".to_string(),
        "div.monaco-editor:nth-child(2) textarea".to_string(),
    ]
}

fn default_convert_selectors() -> Vec<String> {
    vec![
        "#convert-button".to_string(),
        "button#convert-button".to_string(),
        "button.btn.btn-default.horizontal-spaced".to_string(),
        "button[class*='btn'][class*='horizontal-spaced']".to_string(),
    ]
}

fn default_convert_button_texts() -> Vec<String> {
    vec![
        "convert code".to_string(),
        "convert".to_string(),
        "transform".to_string(),
    ]
}

fn default_selector_timeout_ms() -> u64 {
    3000
}

fn default_settle_ms() -> u64 {
    2000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_poll_timeout_secs() -> u64 {
    15
}

fn default_required_stable_polls() -> u32 {
    3
}

fn default_min_output_chars() -> usize {
    100
}

fn default_input_slack() -> f64 {
    0.8
}

fn default_max_code_chars() -> usize {
    40_000
}

fn default_max_file_bytes() -> u64 {
    50_000
}

fn default_preview_chars() -> usize {
    80
}

fn default_preview_lines() -> usize {
    3
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,

    #[serde(default)]
    pub converter: ConverterConfig,

    #[serde(default)]
    pub curation: CurationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CrawlConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause between consecutive URLs.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    #[serde(default = "default_translation_keywords")]
    pub translation_keywords: Vec<String>,

    /// Upper bound on VB.NET x C# candidates tried by the pairing fallback.
    #[serde(default = "default_max_pair_candidates")]
    pub max_pair_candidates: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConverterConfig {
    #[serde(default = "default_converter_url")]
    pub url: String,

    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_browser_user_agent")]
    pub user_agent: String,

    /// Tried in order until one resolves.
    #[serde(default = "default_input_selectors")]
    pub input_selectors: Vec<String>,

    #[serde(default = "default_input_container_selector")]
    pub input_container_selector: String,

    #[serde(default = "default_output_container_selector")]
    pub output_container_selector: String,

    /// Last-resort reads of the output editor, tried in order.
    #[serde(default = "default_output_selectors")]
    pub output_selectors: Vec<String>,

    #[serde(default = "default_convert_selectors")]
    pub convert_selectors: Vec<String>,

    /// Lower-case button labels accepted as the convert action.
    #[serde(default = "default_convert_button_texts")]
    pub convert_button_texts: Vec<String>,

    #[serde(default = "default_selector_timeout_ms")]
    pub selector_timeout_ms: u64,

    /// Pause after navigation before touching the page.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Consecutive unchanged reads before the output counts as final.
    #[serde(default = "default_required_stable_polls")]
    pub required_stable_polls: u32,

    #[serde(default = "default_min_output_chars")]
    pub min_output_chars: usize,

    /// Fraction of the source length that must read back from the editor.
    #[serde(default = "default_input_slack")]
    pub input_slack: f64,

    #[serde(default = "default_max_code_chars")]
    pub max_code_chars: usize,

    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Fail on mismatched braces or leftover VB.NET block terminators.
    #[serde(default = "default_true")]
    pub strict_output: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CurationConfig {
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    #[serde(default = "default_preview_lines")]
    pub preview_lines: usize,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            delay_ms: default_delay_ms(),
            translation_keywords: default_translation_keywords(),
            max_pair_candidates: default_max_pair_candidates(),
        }
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            url: default_converter_url(),
            headless: default_true(),
            user_agent: default_browser_user_agent(),
            input_selectors: default_input_selectors(),
            input_container_selector: default_input_container_selector(),
            output_container_selector: default_output_container_selector(),
            output_selectors: default_output_selectors(),
            convert_selectors: default_convert_selectors(),
            convert_button_texts: default_convert_button_texts(),
            selector_timeout_ms: default_selector_timeout_ms(),
            settle_ms: default_settle_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_timeout_secs: default_poll_timeout_secs(),
            required_stable_polls: default_required_stable_polls(),
            min_output_chars: default_min_output_chars(),
            input_slack: default_input_slack(),
            max_code_chars: default_max_code_chars(),
            max_file_bytes: default_max_file_bytes(),
            strict_output: default_true(),
        }
    }
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            preview_chars: default_preview_chars(),
            preview_lines: default_preview_lines(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl CrawlConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl ConverterConfig {
    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to [`DEFAULT_CONFIG_PATH`], and a
    /// missing default file yields the default configuration. An explicit
    /// path that does not exist is an error. Invalid JSON yields defaults.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            DEFAULT_CONFIG_PATH
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            anyhow::ensure!(config_path.is_empty(), "config file not found: {path}");
            info!("{path} not found, using defaults");
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.crawl.timeout_secs > 0, "crawl.timeout_secs must be positive");
        anyhow::ensure!(
            !self.crawl.translation_keywords.is_empty(),
            "crawl.translation_keywords must not be empty"
        );

        let conv = &self.converter;
        anyhow::ensure!(!conv.url.is_empty(), "converter.url must be set");
        anyhow::ensure!(
            !conv.input_selectors.is_empty(),
            "at least one converter.input_selectors entry is required"
        );
        anyhow::ensure!(conv.poll_interval_ms > 0, "converter.poll_interval_ms must be positive");
        anyhow::ensure!(
            conv.poll_timeout_secs > 0,
            "converter.poll_timeout_secs must be positive"
        );
        anyhow::ensure!(
            conv.input_slack > 0.0 && conv.input_slack <= 1.0,
            "converter.input_slack must be in (0, 1]"
        );
        anyhow::ensure!(conv.max_code_chars > 0, "converter.max_code_chars must be positive");

        anyhow::ensure!(
            self.curation.preview_lines > 0,
            "curation.preview_lines must be positive"
        );
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.crawl.delay_ms, 1000);
        assert_eq!(config.crawl.max_pair_candidates, 10_000);
        assert_eq!(config.converter.required_stable_polls, 3);
        assert_eq!(config.converter.max_code_chars, 40_000);
        assert_eq!(config.converter.max_file_bytes, 50_000);
        assert!(config.converter.headless);
        assert!(config.converter.strict_output);
        assert_eq!(config.curation.preview_chars, 80);
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"crawl": {"delay_ms": 250}, "converter": {"poll_timeout_secs": 30}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.crawl.delay_ms, 250);
        assert_eq!(config.converter.poll_timeout_secs, 30);
        // Other fields should have defaults
        assert_eq!(config.crawl.timeout_secs, 30);
        assert_eq!(config.converter.input_selectors.len(), 4);
    }

    #[test]
    fn test_validate_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_slack() {
        let mut config = Config::default();
        config.converter.input_slack = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_selectors() {
        let mut config = Config::default();
        config.converter.input_selectors = vec![];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_missing_and_invalid() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("none.json");
        let err = Config::load(missing.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("config file not found"));

        let bad = temp.path().join("bad.json");
        std::fs::write(&bad, "{ nope").unwrap();
        let cfg = Config::load(bad.to_str().unwrap()).unwrap();
        assert_eq!(cfg.converter.poll_interval_ms, 1000);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("vbcs.json");
        let path = path.to_str().unwrap();

        let mut config = Config::default();
        config.crawl.delay_ms = 5;
        config.converter.url = "http://localhost:9000/".to_string();
        config.save(path).unwrap();

        let parsed = Config::load(path).unwrap();
        assert_eq!(parsed.crawl.delay_ms, 5);
        assert_eq!(parsed.converter.url, "http://localhost:9000/");
    }
}
