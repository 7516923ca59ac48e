use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::schema::Target;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub mock: MockConfig,
    #[serde(default = "default_targets")]
    pub targets: Vec<Target>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_listing_url")]
    pub listing_url: String,
    #[serde(default = "default_report_url")]
    pub report_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_code_suffix")]
    pub code_suffix: char,
    #[serde(default = "default_query_type")]
    pub query_type: String,
    #[serde(default = "default_aggregate_label")]
    pub aggregate_label: String,
    #[serde(default = "default_report_markers")]
    pub report_markers: Vec<String>,
    #[serde(default = "default_no_data_marker")]
    pub no_data_marker: String,
    /// Tried in order; values may use `{code}`, `{query_type}` and `{date}`.
    #[serde(default = "default_payload_variants")]
    pub payload_variants: Vec<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MockConfig {
    #[serde(default = "default_false")]
    pub enabled: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;
        let config: Config = toml::from_str(&content)
            .context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.exchange.listing_url)
            .with_context(|| format!("Invalid listing_url: {}", self.exchange.listing_url))?;
        url::Url::parse(&self.exchange.report_url)
            .with_context(|| format!("Invalid report_url: {}", self.exchange.report_url))?;

        if self.targets.is_empty() {
            anyhow::bail!("At least one [[targets]] entry is required");
        }
        let mut seen = HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.ticker.as_str()) {
                anyhow::bail!("Duplicate target ticker: {}", target.ticker);
            }
        }

        if self.exchange.payload_variants.is_empty() {
            anyhow::bail!("exchange.payload_variants must not be empty");
        }
        if self.exchange.aggregate_label.trim().is_empty() {
            anyhow::bail!("exchange.aggregate_label must not be empty");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            politeness_delay_ms: default_politeness_delay_ms(),
            utc_offset_hours: default_utc_offset_hours(),
            exchange: ExchangeConfig::default(),
            mock: MockConfig::default(),
            targets: default_targets(),
        }
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            report_url: default_report_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            code_suffix: default_code_suffix(),
            query_type: default_query_type(),
            aggregate_label: default_aggregate_label(),
            report_markers: default_report_markers(),
            no_data_marker: default_no_data_marker(),
            payload_variants: default_payload_variants(),
        }
    }
}

fn default_output_path() -> String {
    "docs/futures_data.json".to_string()
}

fn default_politeness_delay_ms() -> u64 {
    2000
}

fn default_utc_offset_hours() -> i32 {
    8
}

fn default_listing_url() -> String {
    "https://www.taifex.com.tw/cht/2/stockMargining".to_string()
}

fn default_report_url() -> String {
    "https://www.taifex.com.tw/cht/3/largeTraderFutQry".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

fn default_code_suffix() -> char {
    'F'
}

fn default_query_type() -> String {
    "1".to_string()
}

fn default_aggregate_label() -> String {
    "所有契約".to_string()
}

fn default_report_markers() -> Vec<String> {
    vec!["所有契約".to_string(), "契約".to_string()]
}

fn default_no_data_marker() -> String {
    "查無資料".to_string()
}

fn variant(fields: &[(&str, &str)]) -> BTreeMap<String, String> {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn default_payload_variants() -> Vec<BTreeMap<String, String>> {
    vec![
        variant(&[("queryType", "{query_type}"), ("commodity_id", "{code}")]),
        variant(&[("queryType", "{query_type}"), ("commodityId", "{code}")]),
        // Superset; the server ignores fields it does not know.
        variant(&[
            ("queryType", "{query_type}"),
            ("commodity_id", "{code}"),
            ("commodityId", "{code}"),
            ("goDay", ""),
            ("dateaddcnt", "0"),
            ("queryDate", ""),
        ]),
        variant(&[
            ("queryType", "{query_type}"),
            ("commodity_id2", "{code}"),
            ("commodity_id", "{code}"),
        ]),
    ]
}

fn default_targets() -> Vec<Target> {
    [
        ("2330", "台積電期貨"),
        ("2317", "鴻海期貨"),
        ("3231", "緯創期貨"),
        ("2382", "廣達期貨"),
    ]
    .iter()
    .map(|(ticker, name)| Target::new(ticker, name))
    .collect()
}

fn default_false() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_load() {
        let config = Config::load("../../config/oi_concentration.toml").unwrap();
        assert_eq!(config.output_path, "docs/futures_data.json");
        assert_eq!(config.targets.len(), 4);
        assert_eq!(config.targets[0].ticker, "2330");
    }

    #[test]
    fn test_config_defaults() {
        let toml_str = r#"
[[targets]]
ticker = "2454"
name = "聯發科期貨"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.politeness_delay_ms, 2000);
        assert_eq!(config.utc_offset_hours, 8);
        assert_eq!(config.exchange.code_suffix, 'F');
        assert_eq!(config.exchange.payload_variants.len(), 4);
        assert_eq!(config.targets.len(), 1);
        assert!(!config.mock.enabled);
        config.validate().unwrap();
    }

    #[test]
    fn test_config_rejects_duplicate_tickers() {
        let mut config = Config::default();
        config.targets.push(Target::new("2330", "dup"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("2330"));
    }

    #[test]
    fn test_config_rejects_bad_url() {
        let mut config = Config::default();
        config.exchange.report_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
